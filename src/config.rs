use std::num::NonZeroU32;
use std::path::Path;

use crate::dialect;
use crate::driver::DEFAULT_MAX_PASSES;
use crate::error::Error;
use crate::formatter::FormatterOptions;
use crate::render::Layout;

/// Name of the project config file looked up in the working directory.
pub const CONFIG_FILE: &str = ".pageref.toml";

/// Validated configuration for one generation run, loaded from `.pageref.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Output dialect name, checked against `dialect::by_name`.
    pub dialect: String,
    /// Reference formatting policy.
    pub formatter: FormatterOptions,
    /// Added to every definition's heading level.
    pub heading_level_offset: u8,
    /// Page geometry for the paginator.
    pub layout: Layout,
    /// Safety cap on render passes.
    pub max_passes: NonZeroU32,
}

/// Raw `[convergence]` table.
#[derive(serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConvergenceTable {
    /// Safety cap on render passes.
    max_passes: u32,
}

/// Raw `[format]` table.
#[derive(serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FormatTable {
    /// Output dialect name.
    dialect: String,
    /// Heading level offset.
    heading_level_offset: u8,
    /// Permissive reference recognition.
    hyperlink_all: bool,
    /// Keep `#` on method labels.
    show_hash: bool,
    /// Annotate links with page numbers.
    show_pages: bool,
}

/// Raw `[layout]` table.
#[derive(serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LayoutTable {
    /// Visible characters per line.
    line_width: usize,
    /// Lines per page.
    lines_per_page: usize,
}

/// Raw TOML structure for `.pageref.toml`.
#[derive(Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PagerefTomlConfig {
    /// `[convergence]`
    convergence: ConvergenceTable,
    /// `[format]`
    format: FormatTable,
    /// `[layout]`
    layout: LayoutTable,
}

impl Default for ConvergenceTable {
    fn default() -> Self {
        return Self { max_passes: DEFAULT_MAX_PASSES.get() };
    }
}

impl Default for FormatTable {
    fn default() -> Self {
        return Self {
            dialect: "latex".to_string(),
            heading_level_offset: 0,
            hyperlink_all: false,
            show_hash: false,
            show_pages: true,
        };
    }
}

impl Default for LayoutTable {
    fn default() -> Self {
        let layout = Layout::default();
        return Self {
            line_width: layout.line_width,
            lines_per_page: layout.lines_per_page,
        };
    }
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            dialect: "latex".to_string(),
            formatter: FormatterOptions { hyperlink_all: false, show_hash: false, show_pages: true },
            heading_level_offset: 0,
            layout: Layout::default(),
            max_passes: DEFAULT_MAX_PASSES,
        };
    }
}

impl Config {
    /// Validate raw TOML values.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` for zero geometry or pass cap, and
    /// `Error::UnknownDialect` for an unrecognised dialect.
    fn from_raw(raw: PagerefTomlConfig) -> Result<Self, Error> {
        let Some(max_passes) = NonZeroU32::new(raw.convergence.max_passes) else {
            return Err(Error::InvalidConfig {
                reason: "convergence.max_passes must be at least 1".to_string(),
            });
        };
        if raw.layout.line_width == 0 || raw.layout.lines_per_page == 0 {
            return Err(Error::InvalidConfig {
                reason: "layout.line_width and layout.lines_per_page must be at least 1".to_string(),
            });
        }
        dialect::by_name(&raw.format.dialect)?;

        return Ok(Self {
            dialect: raw.format.dialect,
            formatter: FormatterOptions {
                hyperlink_all: raw.format.hyperlink_all,
                show_hash: raw.format.show_hash,
                show_pages: raw.format.show_pages,
            },
            heading_level_offset: raw.format.heading_level_offset,
            layout: Layout {
                line_width: raw.layout.line_width,
                lines_per_page: raw.layout.lines_per_page,
            },
            max_passes,
        });
    }

    /// Load config from `.pageref.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed; never silently
    /// falls back to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// `Error::TomlDe` if the TOML is malformed, or a validation error.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Load config from an explicitly named file, which must exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigNotFound` if the file is missing, otherwise as `Config::parse`.
    pub fn load_file(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Parse and validate config TOML.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` for malformed TOML or a validation error.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: PagerefTomlConfig = toml::from_str(content)?;
        return Self::from_raw(raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.formatter.show_pages);
        assert!(!config.formatter.hyperlink_all);
        assert_eq!(config.max_passes, DEFAULT_MAX_PASSES);
        assert_eq!(config.dialect, "latex");
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::parse(
            r#"
[format]
dialect = "pdf"
show_hash = true
show_pages = false
hyperlink_all = true
heading_level_offset = 2

[layout]
line_width = 60
lines_per_page = 50

[convergence]
max_passes = 3
"#,
        )
        .unwrap();
        assert_eq!(config.dialect, "pdf");
        assert_eq!(
            config.formatter,
            FormatterOptions { hyperlink_all: true, show_hash: true, show_pages: false }
        );
        assert_eq!(config.heading_level_offset, 2);
        assert_eq!(config.layout, Layout { line_width: 60, lines_per_page: 50 });
        assert_eq!(config.max_passes.get(), 3);
    }

    #[test]
    fn zero_passes_rejected() {
        let err = Config::parse("[convergence]\nmax_passes = 0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn zero_geometry_rejected() {
        let err = Config::parse("[layout]\nline_width = 0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn unknown_dialect_rejected() {
        let err = Config::parse("[format]\ndialect = \"html\"\n").unwrap_err();
        assert!(matches!(err, Error::UnknownDialect { .. }));
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(matches!(Config::parse("[format]\nshow_page = true\n"), Err(Error::TomlDe(_))));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = Config::load_file(Path::new("no/such/.pageref.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }
}
