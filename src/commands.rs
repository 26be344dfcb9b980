//! Core CLI commands for pageref: render, check, refs.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde::Serialize;

use crate::config::Config;
use crate::diagnostics;
use crate::dialect;
use crate::document::{Block, Document};
use crate::driver::{Convergence, ConvergenceDriver, Outcome};
use crate::error;
use crate::formatter::{Classification, CrossReferenceFormatter};
use crate::markup::{Segment, Tokenizer};
use crate::registry::DestinationRegistry;
use crate::render::Paginator;

/// Command-line flags that override `.pageref.toml`.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    /// Explicit config file instead of `.pageref.toml`.
    pub config: Option<PathBuf>,
    /// Output dialect name.
    pub dialect: Option<String>,
    /// Turn page annotations off.
    pub hide_pages: bool,
    /// Use the permissive reference pattern.
    pub hyperlink_all: bool,
    /// Keep `#` on method labels.
    pub show_hash: bool,
}

/// One candidate reference as listed by `refs`.
#[derive(Debug, Serialize)]
struct RefListing {
    /// Destination for linked references.
    #[serde(skip_serializing_if = "Option::is_none")]
    destination: Option<String>,
    /// `link`, `plain`, or `skip`.
    kind: &'static str,
    /// Text as written in the document.
    text: String,
}

/// Converge the document and report whether every reference got a page.
/// Exits 1 when placeholders remain.
///
/// # Errors
///
/// Returns errors from config or document loading.
pub fn check(document: &Path, overrides: &Overrides) -> Result<ExitCode, error::Error> {
    let config = load_config(overrides)?;
    let document = Document::load(document)?;
    let convergence = converge(&document, &config)?;
    let passes = convergence.passes();

    if let Outcome::Converged = convergence.outcome {
        println!("All references page-annotated after {passes} passes");
        return Ok(ExitCode::SUCCESS);
    }

    for name in convergence.residual() {
        println!("UNRESOLVED  {name}");
    }
    println!();
    println!("{} unresolved after {passes} passes", convergence.residual().len());
    diagnostics::print_stall(&convergence);
    return Ok(ExitCode::from(1));
}

/// Run render passes to a terminal state over a fresh registry.
///
/// # Errors
///
/// Returns `Error::UnknownDialect` or any renderer error.
fn converge(document: &Document, config: &Config) -> Result<Convergence, error::Error> {
    let dialect = dialect::by_name(&config.dialect)?;
    let oracle = document.symbol_table();
    tracing::debug!(entities = oracle.len(), dialect = dialect.name(), "symbol table built");
    let formatter = CrossReferenceFormatter::new(dialect.as_ref(), &oracle, config.formatter);
    let mut paginator = Paginator::new(
        document,
        dialect.as_ref(),
        formatter,
        config.layout,
        config.heading_level_offset,
    );

    let mut registry = DestinationRegistry::new();
    let mut driver = ConvergenceDriver::new(config.max_passes);
    return driver.run(&mut paginator, &mut registry);
}

/// Classify every segment of one text run for the `refs` listing.
fn list_text(formatter: &CrossReferenceFormatter<'_>, tokenizer: Tokenizer, text: &str, out: &mut Vec<RefListing>) {
    for segment in tokenizer.segments(text) {
        let (written, classification) = match segment {
            Segment::Text(_) => continue,
            Segment::Candidate(raw) => (raw, formatter.classify_candidate(raw)),
            Segment::Explicit { label, original, target } => {
                (original, formatter.classify_explicit(target, label, original))
            },
        };
        let (kind, destination) = match classification {
            Classification::Entity { destination, .. } => ("link", Some(destination)),
            Classification::NotAReference(_) => ("plain", None),
            Classification::Skipped(_) => ("skip", None),
        };
        out.push(RefListing { destination, kind, text: written.to_string() });
    }
}

/// Load `.pageref.toml` (or `--config`) and apply command-line overrides.
///
/// # Errors
///
/// Returns config loading or validation errors.
fn load_config(overrides: &Overrides) -> Result<Config, error::Error> {
    let mut config = match &overrides.config {
        Some(path) => Config::load_file(path)?,
        None => Config::load(Path::new("."))?,
    };

    if let Some(name) = &overrides.dialect {
        dialect::by_name(name)?;
        config.dialect.clone_from(name);
    }
    if overrides.hide_pages {
        config.formatter.show_pages = false;
    }
    if overrides.hyperlink_all {
        config.formatter.hyperlink_all = true;
    }
    if overrides.show_hash {
        config.formatter.show_hash = true;
    }
    return Ok(config);
}

/// List every candidate reference and how the oracle classifies it.
///
/// # Errors
///
/// Returns errors from config or document loading, or JSON serialization.
pub fn refs(document: &Path, json: bool, overrides: &Overrides) -> Result<(), error::Error> {
    let config = load_config(overrides)?;
    let document = Document::load(document)?;
    let dialect = dialect::by_name(&config.dialect)?;
    let oracle = document.symbol_table();
    let formatter = CrossReferenceFormatter::new(dialect.as_ref(), &oracle, config.formatter);
    let tokenizer = Tokenizer::new(config.formatter.hyperlink_all);

    let mut listings = Vec::new();
    for block in &document.blocks {
        match block {
            Block::Definition { body, .. } => list_text(&formatter, tokenizer, body, &mut listings),
            Block::PageBreak => {},
            Block::Text { text } => list_text(&formatter, tokenizer, text, &mut listings),
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }

    for listing in &listings {
        let label = listing.kind.to_uppercase();
        match &listing.destination {
            Some(destination) => println!("{label:<6}{} -> {destination}", listing.text),
            None => println!("{label:<6}{}", listing.text),
        }
    }
    return Ok(());
}

/// Converge the document and write the final markup to `output` or stdout.
/// A stall is reported on stderr but is not a failure.
///
/// # Errors
///
/// Returns errors from config or document loading, rendering, or writing output.
pub fn render(document: &Path, output: Option<&Path>, overrides: &Overrides) -> Result<(), error::Error> {
    let config = load_config(overrides)?;
    let document = Document::load(document)?;
    let convergence = converge(&document, &config)?;

    diagnostics::print_stall(&convergence);

    match output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", convergence.output))?;
            eprintln!("Wrote {} after {} passes", path.display(), convergence.passes());
        },
        None => println!("{}", convergence.output),
    }
    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;

    const STALLING: &str = r#"
known = ["Hidden"]

[[block]]
kind = "text"
text = "See Hidden and Bbb."

[[block]]
kind = "definition"
name = "Bbb"
"#;

    #[test]
    fn unplaced_known_entity_stalls_with_placeholder() {
        let document = Document::parse(STALLING).unwrap();
        let convergence = converge(&document, &Config::default()).unwrap();
        assert_eq!(convergence.unresolved_per_pass, vec![2, 1, 1]);
        assert_eq!(convergence.residual(), ["Hidden".to_string()]);
        assert!(convergence.output.contains("\\hyperlink{Hidden}{Hidden} (p.~???)"));
        assert!(convergence.output.contains("\\hyperlink{Bbb}{Bbb} (p.~\\hyperlink{Bbb}{1})"));
    }

    #[test]
    fn overrides_apply_on_top_of_config() {
        let overrides = Overrides {
            config: None,
            dialect: Some("pdf".to_string()),
            hide_pages: true,
            hyperlink_all: true,
            show_hash: true,
        };
        let config = load_config(&overrides).unwrap();
        assert_eq!(config.dialect, "pdf");
        assert!(!config.formatter.show_pages);
        assert!(config.formatter.hyperlink_all);
        assert!(config.formatter.show_hash);
    }

    #[test]
    fn listing_classifies_candidates() {
        let document = Document::parse(STALLING).unwrap();
        let oracle = document.symbol_table();
        let formatter = CrossReferenceFormatter::new(&dialect::Latex, &oracle, Default::default());
        let mut listings = Vec::new();
        list_text(&formatter, Tokenizer::new(false), "See Hidden and Bbb.", &mut listings);
        let kinds: Vec<(&str, &str)> = listings.iter().map(|l| (l.kind, l.text.as_str())).collect();
        assert_eq!(kinds, vec![("plain", "See"), ("link", "Hidden"), ("link", "Bbb")]);
    }
}
