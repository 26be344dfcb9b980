//! Markup tokenizer: splits documentation text into plain runs and candidate references.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Explicit link syntax: `{label}[rdoc-ref:Target]` or bare `rdoc-ref:Target`.
const EXPLICIT: &str = r"\{(?P<label>[^}]*)\}\[rdoc-ref:(?P<labelled>[^\]]*)\]|rdoc-ref:(?P<target>(?:[^\s,;()\[\]]*[^\s,;()\[\].])?)";

/// Capitalised or prefixed identifiers only: `Foo`, `::Foo::Bar`, `Foo#bar?`, `#bar`.
const CONSERVATIVE: &str = r"(?P<name>(?:::)?[A-Z]\w*(?:::[A-Z]\w*)*(?:(?:\#|::|\.)[a-z_]\w*[!?=]?)?|\#[A-Za-z_]\w*[!?=]?)";

/// Anything identifier-shaped, lowercase words included.
const PERMISSIVE: &str = r"(?P<name>(?:::)?[A-Za-z_]\w*(?:::[A-Za-z_]\w*)*(?:(?:\#|\.)[A-Za-z_]\w*[!?=]?)?|\#[A-Za-z_]\w*[!?=]?)";

/// Compiled conservative pattern.
static CONSERVATIVE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(&format!("{EXPLICIT}|{CONSERVATIVE}")).expect("valid regex"));

/// Compiled permissive pattern.
static PERMISSIVE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(&format!("{EXPLICIT}|{PERMISSIVE}")).expect("valid regex"));

/// One run of tokenized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'t> {
    /// A name the recognizer thinks may be a reference.
    Candidate(&'t str),
    /// Explicit `rdoc-ref:` link. The target is passed to resolution verbatim.
    Explicit {
        /// Label from the `{label}[rdoc-ref:...]` form.
        label: Option<&'t str>,
        /// The full matched text.
        original: &'t str,
        /// Target after `rdoc-ref:`; may be empty when malformed.
        target: &'t str,
    },
    /// Ordinary prose.
    Text(&'t str),
}

/// Recognizes reference candidates in documentation text.
///
/// `hyperlink_all` selects the permissive pattern. A candidate preceded by a
/// backslash is emitted as text with the backslash removed.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    /// Pattern set selected at construction.
    pattern: &'static Regex,
}

impl Tokenizer {
    /// Tokenizer for the conservative or permissive pattern set.
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded reference regex is invalid (compile-time invariant).
    pub fn new(hyperlink_all: bool) -> Self {
        let pattern = if hyperlink_all { &*PERMISSIVE_REGEX } else { &*CONSERVATIVE_REGEX };
        return Self { pattern };
    }

    /// Split `text` into segments covering every byte in order.
    pub fn segments<'t>(&self, text: &'t str) -> Vec<Segment<'t>> {
        let mut segments = Vec::new();
        let mut cursor = 0_usize;

        for cap in self.pattern.captures_iter(text) {
            let Some(whole) = cap.get(0) else { continue };
            let preceding = text.get(..whole.start()).and_then(|t| return t.chars().next_back());

            if preceding.is_some_and(|c| return c.is_alphanumeric() || c == '_' || c == ':') {
                continue;
            }

            if preceding == Some('\\') {
                let before_escape = whole.start().saturating_sub(1);
                push_text(&mut segments, text.get(cursor..before_escape));
                push_text(&mut segments, Some(whole.as_str()));
                cursor = whole.end();
                continue;
            }

            push_text(&mut segments, text.get(cursor..whole.start()));
            segments.push(segment_from_capture(&cap, whole.as_str()));
            cursor = whole.end();
        }

        push_text(&mut segments, text.get(cursor..));
        return segments;
    }
}

/// Append a non-empty text run.
fn push_text<'t>(segments: &mut Vec<Segment<'t>>, text: Option<&'t str>) {
    if let Some(t) = text.filter(|t| return !t.is_empty()) {
        segments.push(Segment::Text(t));
    }
}

/// Classify one regex match.
fn segment_from_capture<'t>(cap: &Captures<'t>, original: &'t str) -> Segment<'t> {
    if let Some(labelled) = cap.name("labelled") {
        return Segment::Explicit {
            label: cap.name("label").map(|m| return m.as_str()),
            original,
            target: labelled.as_str(),
        };
    }
    if let Some(target) = cap.name("target") {
        return Segment::Explicit {
            label: None,
            original,
            target: target.as_str(),
        };
    }
    return Segment::Candidate(original);
}
