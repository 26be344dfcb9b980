//! Output dialects: the concrete syntax for links, anchors, page annotations, and escaping.
//!
//! Both dialects share one resolution algorithm (see `formatter`); they differ only
//! in what they emit.

use std::fmt::Write as _;

use crate::error::Error;
use crate::types::PageNumber;

/// Capability set the formatter and paginator emit through.
///
/// Labels and text are passed raw; each dialect escapes them itself.
pub trait Dialect {
    /// Anchor marking a destination at the current position.
    fn emit_anchor(&self, destination: &str) -> String;

    /// Section heading at an absolute `level` (1 is the outermost).
    fn emit_heading(&self, level: u8, title: &str) -> String;

    /// Hyperlink to `destination` labelled `label`.
    fn emit_link(&self, destination: &str, label: &str) -> String;

    /// Forced page break between blocks.
    fn emit_page_break(&self) -> String;

    /// Annotation used when the destination's page is not yet known.
    fn emit_page_placeholder(&self) -> String;

    /// Page annotation whose number is itself a link to `destination`.
    fn emit_page_reference(&self, destination: &str, page: PageNumber) -> String;

    /// Unlinked text.
    fn emit_plain_text(&self, text: &str) -> String;

    /// Escape `text` for this dialect, allowing line breaks after `::`.
    fn escape(&self, text: &str) -> String;

    /// Short name used in configuration and diagnostics.
    fn name(&self) -> &'static str;
}

/// LaTeX with `hyperref`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Latex;

/// Inline markup for a PDF writer: `<link anchor="...">` tags with XML-style escaping.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfInline;

/// Visible text of a page annotation, for width accounting.
pub fn page_reference_text(page: PageNumber) -> String {
    return format!(" (p. {page})");
}

/// Visible text of the page placeholder, for width accounting.
pub const PAGE_PLACEHOLDER_TEXT: &str = " (p. ???)";

/// Pick a dialect by its configured name.
///
/// # Errors
///
/// Returns `Error::UnknownDialect` for names other than `latex` and `pdf`.
pub fn by_name(name: &str) -> Result<Box<dyn Dialect>, Error> {
    return match name {
        "latex" => Ok(Box::new(Latex)),
        "pdf" => Ok(Box::new(PdfInline)),
        _ => Err(Error::UnknownDialect { name: name.to_string() }),
    };
}

/// Anchor identifier safe for both dialects: ASCII alphanumerics pass through,
/// every other character becomes `-xx` with its hex code point.
pub fn anchor_id(destination: &str) -> String {
    let mut out = String::with_capacity(destination.len());
    for c in destination.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            let _ = write!(out, "-{:x}", u32::from(c));
        }
    }
    return out;
}

impl Dialect for Latex {
    fn emit_anchor(&self, destination: &str) -> String {
        return format!("\\hypertarget{{{}}}{{}}", anchor_id(destination));
    }

    fn emit_heading(&self, level: u8, title: &str) -> String {
        let command = match level {
            0 | 1 => "section",
            2 => "subsection",
            3 => "subsubsection",
            4 => "paragraph",
            _ => "subparagraph",
        };
        return format!("\\{command}{{{}}}", self.escape(title));
    }

    fn emit_link(&self, destination: &str, label: &str) -> String {
        return format!("\\hyperlink{{{}}}{{{}}}", anchor_id(destination), self.escape(label));
    }

    fn emit_page_break(&self) -> String {
        return "\\newpage".to_string();
    }

    fn emit_page_placeholder(&self) -> String {
        return " (p.~???)".to_string();
    }

    fn emit_page_reference(&self, destination: &str, page: PageNumber) -> String {
        return format!(" (p.~{})", self.emit_link(destination, &page.to_string()));
    }

    fn emit_plain_text(&self, text: &str) -> String {
        return self.escape(text);
    }

    fn escape(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '\\' => out.push_str("\\textbackslash{}"),
                '{' | '}' | '$' | '&' | '#' | '%' | '_' => {
                    out.push('\\');
                    out.push(c);
                },
                '^' => out.push_str("\\^{}"),
                '~' => out.push_str("\\~{}"),
                _ => out.push(c),
            }
        }
        return out.replace("::", "::\\allowbreak{}");
    }

    fn name(&self) -> &'static str {
        return "latex";
    }
}

impl Dialect for PdfInline {
    fn emit_anchor(&self, destination: &str) -> String {
        return format!("<dest name=\"{}\"/>", anchor_id(destination));
    }

    fn emit_heading(&self, level: u8, title: &str) -> String {
        let size = 24_u8.saturating_sub(level.saturating_sub(1).saturating_mul(4)).max(10);
        return format!("<font size=\"{size}\"><b>{}</b></font>", self.escape(title));
    }

    fn emit_link(&self, destination: &str, label: &str) -> String {
        return format!("<link anchor=\"{}\">{}</link>", anchor_id(destination), self.escape(label));
    }

    fn emit_page_break(&self) -> String {
        return "<page_break/>".to_string();
    }

    fn emit_page_placeholder(&self) -> String {
        return PAGE_PLACEHOLDER_TEXT.to_string();
    }

    fn emit_page_reference(&self, destination: &str, page: PageNumber) -> String {
        return format!(" (p. {})", self.emit_link(destination, &page.to_string()));
    }

    fn emit_plain_text(&self, text: &str) -> String {
        return self.escape(text);
    }

    fn escape(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                _ => out.push(c),
            }
        }
        // Zero-width space lets the line breaker split long namespaces.
        return out.replace("::", "::\u{200b}");
    }

    fn name(&self) -> &'static str {
        return "pdf";
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_id_is_alphanumeric() {
        assert_eq!(anchor_id("Foo::Bar#baz"), "Foo-3a-3aBar-23baz");
        assert_eq!(anchor_id("Bbb"), "Bbb");
    }

    #[test]
    fn latex_escapes_specials_and_breaks_namespaces() {
        assert_eq!(Latex.escape("a_b & 100%"), "a\\_b \\& 100\\%");
        assert_eq!(Latex.escape("Foo::Bar"), "Foo::\\allowbreak{}Bar");
        assert_eq!(Latex.escape("#initialize"), "\\#initialize");
    }

    #[test]
    fn latex_links_and_pages() {
        assert_eq!(Latex.emit_link("Bbb", "Bbb"), "\\hyperlink{Bbb}{Bbb}");
        assert_eq!(
            Latex.emit_page_reference("Bbb", PageNumber(5)),
            " (p.~\\hyperlink{Bbb}{5})"
        );
        assert_eq!(Latex.emit_heading(2, "Bbb"), "\\subsection{Bbb}");
    }

    #[test]
    fn pdf_escapes_and_links() {
        assert_eq!(PdfInline.escape("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(
            PdfInline.emit_link("Bbb", "Bbb"),
            "<link anchor=\"Bbb\">Bbb</link>"
        );
        assert_eq!(
            PdfInline.emit_page_reference("Bbb", PageNumber(5)),
            " (p. <link anchor=\"Bbb\">5</link>)"
        );
        assert_eq!(PdfInline.emit_page_placeholder(), " (p. ???)");
    }

    #[test]
    fn pdf_heading_sizes_shrink_with_level() {
        assert_eq!(PdfInline.emit_heading(1, "A"), "<font size=\"24\"><b>A</b></font>");
        assert_eq!(PdfInline.emit_heading(9, "A"), "<font size=\"10\"><b>A</b></font>");
    }

    #[test]
    fn unknown_dialect_is_an_error() {
        assert!(matches!(by_name("html"), Err(Error::UnknownDialect { .. })));
        assert_eq!(by_name("pdf").map(|d| d.name()).ok(), Some("pdf"));
    }
}
