/// Crate-level error types for pageref diagnostics.
use std::path::PathBuf;

/// Errors that stop a generation run. Unresolvable references are not errors:
/// they degrade to plain text or page placeholders instead.
/// Each variant names the file, option, or reason for failure.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A config file given explicitly does not exist on disk.
    #[error("config not found: {}", path.display())]
    ConfigNotFound {
        /// Path to the missing config file.
        path: PathBuf,
    },

    /// The document to render does not exist on disk.
    #[error("document not found: {}", path.display())]
    DocumentNotFound {
        /// Path to the missing document.
        path: PathBuf,
    },

    /// A destination is defined more than once, so its page would be ambiguous.
    #[error("duplicate destination: `{name}` is defined more than once")]
    DuplicateDestination {
        /// Destination name defined twice.
        name: String,
    },

    /// A config value is out of range.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// Which value was rejected and why.
        reason: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// No output dialect registered under this name.
    #[error("unknown dialect: `{name}`")]
    UnknownDialect {
        /// Dialect name from config or the command line.
        name: String,
    },
}
