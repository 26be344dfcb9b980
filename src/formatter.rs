//! Cross-reference formatting: one resolution algorithm shared by every output dialect.

use crate::dialect::{self, Dialect};
use crate::markup::{Segment, Tokenizer};
use crate::oracle::ReferenceOracle;
use crate::registry::DestinationRegistry;
use crate::types::{ReferenceResolutionResult, Resolution};

/// Prefix that marks an instance-method mention such as `#initialize`.
const METHOD_PREFIX: char = '#';

/// How a mention is classified before the registry is consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The oracle recognised a documented entity.
    Entity {
        /// Anchor the link points at.
        destination: String,
        /// Label shown for the link.
        display: String,
    },
    /// The oracle found nothing; the text renders unchanged.
    NotAReference(String),
    /// Plain lowercase word skipped without consulting the oracle.
    Skipped(String),
}

/// Output markup plus the visible width it occupies once laid out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formatted {
    /// Dialect-specific markup.
    pub markup: String,
    /// Visible characters, used by the paginator for line wrapping.
    pub width: usize,
}

impl Formatted {
    /// Append markup whose visible form is `visible`.
    fn push(&mut self, markup: &str, visible: &str) {
        self.markup.push_str(markup);
        self.width = self.width.saturating_add(visible.chars().count());
    }

    /// Append another formatted run.
    fn extend(&mut self, other: &Self) {
        self.markup.push_str(&other.markup);
        self.width = self.width.saturating_add(other.width);
    }
}

/// Policy options for reference formatting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatterOptions {
    /// Use the permissive tokenizer pattern and link lowercase words too.
    pub hyperlink_all: bool,
    /// Keep the leading `#` on method labels.
    pub show_hash: bool,
    /// Annotate every resolved link with its page, or a placeholder.
    pub show_pages: bool,
}

/// Turns reference candidates into links, consulting the oracle and the
/// destination registry, and emits through a `Dialect`.
pub struct CrossReferenceFormatter<'a> {
    /// Output syntax.
    dialect: &'a dyn Dialect,
    /// Name resolution.
    oracle: &'a dyn ReferenceOracle,
    /// Formatting policy.
    options: FormatterOptions,
    /// Candidate recognizer matching `options.hyperlink_all`.
    tokenizer: Tokenizer,
}

impl<'a> CrossReferenceFormatter<'a> {
    /// Classify a tokenized candidate without touching the registry.
    pub fn classify_candidate(&self, raw_name: &str) -> Classification {
        if !self.options.hyperlink_all && is_plain_lowercase_word(raw_name) {
            return Classification::Skipped(raw_name.to_string());
        }
        return self.classify_with_display(raw_name, &self.display_name(raw_name));
    }

    /// Classify an explicit `rdoc-ref:` target. The target is used verbatim
    /// and the lowercase-word heuristic does not apply.
    pub fn classify_explicit(&self, target: &str, label: Option<&str>, original: &str) -> Classification {
        if target.is_empty() {
            return Classification::NotAReference(label.unwrap_or(original).to_string());
        }
        return self.classify_with_display(target, label.unwrap_or(target));
    }

    /// Consult the oracle with an already computed label.
    fn classify_with_display(&self, raw_name: &str, display: &str) -> Classification {
        return match self.oracle.resolve(raw_name, display) {
            Resolution::PlainString => Classification::NotAReference(display.to_string()),
            Resolution::Entity(entity) => Classification::Entity {
                destination: entity.destination,
                display: display.to_string(),
            },
        };
    }

    /// Label for a candidate: one leading method prefix is dropped unless `show_hash`.
    pub fn display_name(&self, raw_name: &str) -> String {
        if !self.options.show_hash
            && let Some(stripped) = raw_name.strip_prefix(METHOD_PREFIX)
        {
            return stripped.to_string();
        }
        return raw_name.to_string();
    }

    /// Format a run of documentation text, resolving every reference in it.
    pub fn format_text(&self, text: &str, registry: &mut DestinationRegistry) -> Formatted {
        let mut out = Formatted::default();
        for segment in self.tokenizer.segments(text) {
            let part = match segment {
                Segment::Text(t) => self.render_plain(t),
                Segment::Candidate(raw) => self.resolve_reference(raw, registry),
                Segment::Explicit { label, original, target } => {
                    let classification = self.classify_explicit(target, label, original);
                    self.render(&resolve_classification(classification, registry))
                },
            };
            out.extend(&part);
        }
        return out;
    }

    /// Build a formatter over the given dialect and oracle.
    pub fn new(dialect: &'a dyn Dialect, oracle: &'a dyn ReferenceOracle, options: FormatterOptions) -> Self {
        return Self {
            dialect,
            oracle,
            options,
            tokenizer: Tokenizer::new(options.hyperlink_all),
        };
    }

    /// Render a resolution result in the formatter's dialect.
    pub fn render(&self, result: &ReferenceResolutionResult) -> Formatted {
        let (destination, display, page) = match result {
            ReferenceResolutionResult::NotAReference(text) => return self.render_plain(text),
            ReferenceResolutionResult::Resolved { destination, display, page } => (destination, display, page),
        };

        let mut out = Formatted::default();
        out.push(&self.dialect.emit_link(destination, display), display);
        if !self.options.show_pages {
            return out;
        }
        match page {
            Some(page) => out.push(
                &self.dialect.emit_page_reference(destination, *page),
                &dialect::page_reference_text(*page),
            ),
            None => out.push(&self.dialect.emit_page_placeholder(), dialect::PAGE_PLACEHOLDER_TEXT),
        }
        return out;
    }

    /// Unlinked text in the formatter's dialect.
    fn render_plain(&self, text: &str) -> Formatted {
        let mut out = Formatted::default();
        out.push(&self.dialect.emit_plain_text(text), text);
        return out;
    }

    /// Resolve one tokenized candidate, marking a registry miss for unplaced
    /// entities, and render it.
    pub fn resolve_reference(&self, raw_name: &str, registry: &mut DestinationRegistry) -> Formatted {
        let classification = self.classify_candidate(raw_name);
        return self.render(&resolve_classification(classification, registry));
    }
}

/// Whether `text` is a bare lowercase word such as `new`.
fn is_plain_lowercase_word(text: &str) -> bool {
    return !text.is_empty() && text.chars().all(|c| return c.is_ascii_lowercase());
}

/// Look up an entity's destination, recording a miss when it has no page yet.
pub fn resolve_classification(
    classification: Classification,
    registry: &mut DestinationRegistry,
) -> ReferenceResolutionResult {
    return match classification {
        Classification::Skipped(text) | Classification::NotAReference(text) => {
            ReferenceResolutionResult::NotAReference(text)
        },
        Classification::Entity { destination, display } => {
            let page = registry.lookup_and_mark(&destination);
            ReferenceResolutionResult::Resolved { destination, display, page }
        },
    };
}
