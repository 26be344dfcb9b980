//! Destination registry: cumulative name-to-page knowledge for one generation
//! run, plus the pass-scoped set of names that were looked up and missed.

use std::collections::{BTreeSet, HashMap};

use crate::types::PageNumber;

/// Maps destination names to the page they were last placed on.
///
/// The page map survives across passes; only the unresolved set is reset
/// between passes. A fresh generation run starts from `DestinationRegistry::new()`.
#[derive(Debug, Default)]
pub struct DestinationRegistry {
    /// Destination name to page, never cleared within a run.
    pages: HashMap<String, PageNumber>,
    /// Names missed during the current pass. Sorted for stable reporting.
    unresolved: BTreeSet<String>,
}

impl DestinationRegistry {
    /// Number of destinations known so far in this run.
    pub fn len(&self) -> usize {
        return self.pages.len();
    }

    /// Pure read of the page for `name`.
    pub fn lookup(&self, name: &str) -> Option<PageNumber> {
        return self.pages.get(name).copied();
    }

    /// Read the page for `name`, recording a miss in the current pass's
    /// unresolved set when the destination is not yet placed.
    pub fn lookup_and_mark(&mut self, name: &str) -> Option<PageNumber> {
        let page = self.lookup(name);
        if page.is_none() && self.unresolved.insert(name.to_string()) {
            tracing::debug!(destination = name, "destination not yet placed");
        }
        return page;
    }

    /// Empty registry for a new generation run.
    pub fn new() -> Self {
        return Self::default();
    }

    /// Set or overwrite the page for `name`.
    pub fn register(&mut self, name: &str, page: PageNumber) {
        self.pages.insert(name.to_string(), page);
    }

    /// Clear the unresolved set. Known pages are kept for the next pass.
    pub fn reset_pass_state(&mut self) {
        self.unresolved.clear();
    }

    /// Size of the unresolved set for the current pass.
    pub fn unresolved_count(&self) -> usize {
        return self.unresolved.len();
    }

    /// Names missed during the current pass, in sorted order.
    pub fn unresolved_names(&self) -> Vec<String> {
        return self.unresolved.iter().cloned().collect();
    }
}
