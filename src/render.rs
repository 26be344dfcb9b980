//! Rendering passes: lays out a document page by page, registering destinations
//! as they are placed and formatting references through the shared formatter.

use crate::dialect::Dialect;
use crate::document::{Block, Document};
use crate::error::Error;
use crate::formatter::{CrossReferenceFormatter, Formatted};
use crate::registry::DestinationRegistry;
use crate::types::PageNumber;

/// One full rendering of a document from start to finish.
///
/// Implementations register every destination they place and resolve every
/// reference they meet against the same registry.
pub trait RenderPass {
    /// Render the whole document once and return the output markup.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures of the rendering backend itself.
    fn render_pass(&mut self, registry: &mut DestinationRegistry) -> Result<String, Error>;
}

/// Page geometry for the line-based paginator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Visible characters per line before wrapping.
    pub line_width: usize,
    /// Lines per page.
    pub lines_per_page: usize,
}

impl Default for Layout {
    fn default() -> Self {
        return Self { line_width: 72, lines_per_page: 40 };
    }
}

/// Position of the next free line.
#[derive(Debug, Clone, Copy)]
struct PageCursor {
    /// Geometry being filled.
    layout: Layout,
    /// Zero-based index of the next free line across the whole document.
    line: usize,
}

impl PageCursor {
    /// Consume lines for content of the given visible width plus a separator line.
    fn advance(&mut self, width: usize) {
        let line_width = self.layout.line_width.max(1);
        let lines = width.div_ceil(line_width).max(1);
        self.line = self.line.saturating_add(lines).saturating_add(1);
    }

    /// Move to the first line of the next page. A no-op at the top of a page.
    fn break_page(&mut self) {
        if self.line % self.lines_per_page() == 0 {
            return;
        }
        let page_index = self.line / self.lines_per_page();
        self.line = page_index.saturating_add(1).saturating_mul(self.lines_per_page());
    }

    /// Lines per page, never zero.
    fn lines_per_page(&self) -> usize {
        return self.layout.lines_per_page.max(1);
    }

    /// Page the next line lands on.
    fn page(&self) -> PageNumber {
        let index = self.line / self.lines_per_page();
        let page = u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1);
        return PageNumber(page);
    }
}

/// Record that `name` was placed on `page`.
pub fn emit_destination(registry: &mut DestinationRegistry, name: &str, page: PageNumber) {
    tracing::trace!(destination = name, %page, "destination placed");
    registry.register(name, page);
}

/// Lays out a `Document` in fixed-size pages of wrapped lines.
///
/// Visible widths come from the formatter, so adding or removing a page
/// annotation can move later content onto another page.
pub struct Paginator<'a> {
    /// Output syntax for headings, anchors, and page breaks.
    dialect: &'a dyn Dialect,
    /// Content to lay out.
    document: &'a Document,
    /// Reference formatter sharing `dialect`.
    formatter: CrossReferenceFormatter<'a>,
    /// Added to every definition's level.
    heading_level_offset: u8,
    /// Page geometry.
    layout: Layout,
}

impl<'a> Paginator<'a> {
    /// Build a paginator. `formatter` should emit through the same `dialect`.
    pub const fn new(
        document: &'a Document,
        dialect: &'a dyn Dialect,
        formatter: CrossReferenceFormatter<'a>,
        layout: Layout,
        heading_level_offset: u8,
    ) -> Self {
        return Self {
            dialect,
            document,
            formatter,
            heading_level_offset,
            layout,
        };
    }

    /// Lay out a definition: anchor and heading, then its body.
    fn place_definition(
        &self,
        cursor: &mut PageCursor,
        registry: &mut DestinationRegistry,
        name: &str,
        title: &str,
        level: u8,
        body: &str,
    ) -> String {
        emit_destination(registry, name, cursor.page());

        let level = level.saturating_add(self.heading_level_offset);
        let mut markup = self.dialect.emit_anchor(name);
        markup.push_str(&self.dialect.emit_heading(level, title));
        cursor.advance(title.chars().count());

        if !body.is_empty() {
            let formatted = self.formatter.format_text(body, registry);
            cursor.advance(formatted.width);
            markup.push_str("\n\n");
            markup.push_str(&formatted.markup);
        }
        return markup;
    }
}

impl RenderPass for Paginator<'_> {
    fn render_pass(&mut self, registry: &mut DestinationRegistry) -> Result<String, Error> {
        let mut cursor = PageCursor { layout: self.layout, line: 0 };
        let mut blocks: Vec<String> = Vec::with_capacity(self.document.blocks.len());
        // Page the most recent output block started on.
        let mut emitted_page = cursor.page();

        for block in &self.document.blocks {
            if !matches!(block, Block::PageBreak) && cursor.page() > emitted_page {
                blocks.push(self.dialect.emit_page_break());
                emitted_page = cursor.page();
            }

            let markup = match block {
                Block::Definition { body, level, name, title } => {
                    let title = title.as_deref().unwrap_or(name);
                    self.place_definition(&mut cursor, registry, name, title, *level, body)
                },
                Block::PageBreak => {
                    cursor.break_page();
                    continue;
                },
                Block::Text { text } => {
                    let Formatted { markup, width } = self.formatter.format_text(text, registry);
                    cursor.advance(width);
                    markup
                },
            };
            blocks.push(markup);
        }

        tracing::trace!(pages = cursor.page().0, "layout finished");
        return Ok(blocks.join("\n\n"));
    }
}
