//! Input document model: an ordered list of blocks loaded from TOML.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::Error;
use crate::oracle::SymbolTable;

/// One unit of document content, laid out in order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    /// A referenceable entity: heading plus optional body text.
    Definition {
        /// Body text; may contain references.
        #[serde(default)]
        body: String,
        /// Nesting level before the configured heading offset.
        #[serde(default = "default_level")]
        level: u8,
        /// Fully qualified entity name; doubles as the destination name.
        name: String,
        /// Heading text; defaults to `name`.
        #[serde(default)]
        title: Option<String>,
    },
    /// Forced break to the start of the next page.
    PageBreak,
    /// Prose that may contain references.
    Text {
        /// The paragraph text.
        text: String,
    },
}

/// A document to render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Document {
    /// Content blocks in reading order.
    #[serde(default, rename = "block")]
    pub blocks: Vec<Block>,
    /// Entities the oracle knows about that this document does not lay out.
    #[serde(default)]
    pub known: Vec<String>,
}

/// Definitions without an explicit level are top-level.
const fn default_level() -> u8 {
    return 1;
}

impl Document {
    /// Names of every definition, in document order.
    pub fn definition_names(&self) -> impl Iterator<Item = &str> {
        return self.blocks.iter().filter_map(|b| {
            return match b {
                Block::Definition { name, .. } => Some(name.as_str()),
                Block::PageBreak | Block::Text { .. } => None,
            };
        });
    }

    /// Read and parse a document from disk.
    ///
    /// # Errors
    ///
    /// Returns `Error::DocumentNotFound` if the file doesn't exist,
    /// `Error::Io` for other read failures, or the errors of `Document::parse`.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::DocumentNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Parse a document from TOML content and check that every destination is
    /// defined at most once.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` for invalid TOML, or
    /// `Error::DuplicateDestination` if a name is defined twice.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let document: Self = toml::from_str(content)?;
        document.enforce_unique_destinations()?;
        return Ok(document);
    }

    /// Oracle over every definition plus the `known` list.
    pub fn symbol_table(&self) -> SymbolTable {
        return self
            .definition_names()
            .map(String::from)
            .chain(self.known.iter().cloned())
            .collect();
    }

    /// Reject documents that emit the same destination twice per pass.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateDestination` naming the first repeated definition.
    fn enforce_unique_destinations(&self) -> Result<(), Error> {
        let mut seen = HashSet::new();
        for name in self.definition_names() {
            if !seen.insert(name) {
                return Err(Error::DuplicateDestination { name: name.to_string() });
            }
        }
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_block_kinds() {
        let doc = Document::parse(
            r#"
known = ["Hidden"]

[[block]]
kind = "text"
text = "See Bbb for details."

[[block]]
kind = "page_break"

[[block]]
kind = "definition"
name = "Bbb"
level = 2
body = "Defined here."
"#,
        )
        .unwrap();

        assert_eq!(doc.blocks.len(), 3);
        assert_eq!(doc.blocks.get(1), Some(&Block::PageBreak));
        assert_eq!(
            doc.blocks.get(2),
            Some(&Block::Definition {
                body: "Defined here.".to_string(),
                level: 2,
                name: "Bbb".to_string(),
                title: None,
            })
        );
        assert_eq!(doc.symbol_table().len(), 2);
    }

    #[test]
    fn duplicate_definition_is_rejected() {
        let err = Document::parse(
            r#"
[[block]]
kind = "definition"
name = "Bbb"

[[block]]
kind = "definition"
name = "Bbb"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateDestination { name } if name == "Bbb"));
    }

    #[test]
    fn missing_document_is_reported() {
        let err = Document::load(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, Error::DocumentNotFound { .. }));
    }
}
