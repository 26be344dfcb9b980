/// Core domain types for destinations, pages, and resolution outcomes.
use std::fmt;

/// A documented entity the oracle recognised. The destination name is the
/// anchor every link to this entity targets; it is stable across passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Anchor name registered when the entity is laid out; the entity's
    /// fully qualified name, such as `Foo::Bar#baz`.
    pub destination: String,
}

/// A 1-based page number assigned by a render pass.
/// Newtype prevents mixing with line counts and pass counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageNumber(
    /// The 1-based page index.
    pub u32,
);

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}", self.0);
    }
}

/// Oracle answer for one textual name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The name is a documented entity.
    Entity(Entity),
    /// The name is not any kind of documented entity.
    PlainString,
}

/// Outcome of resolving one textual mention against the oracle and registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceResolutionResult {
    /// No matching entity; render the original text unchanged.
    NotAReference(String),
    /// A documented entity. `page` is present iff the registry knew the
    /// destination at lookup time.
    Resolved {
        /// Anchor the link points at.
        destination: String,
        /// Label shown for the link.
        display: String,
        /// Page of the destination, if already placed.
        page: Option<PageNumber>,
    },
}
