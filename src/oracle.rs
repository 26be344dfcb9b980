//! Name resolution: maps textual mentions such as `Foo::Bar#baz` to documented entities.

use std::collections::HashMap;

use crate::types::{Entity, Resolution};

/// Decides whether a textual name denotes a documented entity.
///
/// `PlainString` means "not any kind of documented entity", which is distinct
/// from an entity whose page is not known yet.
pub trait ReferenceOracle {
    /// Resolve `raw_name`. `display_name` is the label the caller intends to show.
    fn resolve(&self, raw_name: &str, display_name: &str) -> Resolution;
}

/// Oracle backed by the fully qualified names of every documented entity.
///
/// Lookup order: exact name, `Foo::meth` as `Foo#meth` then `Foo.meth`,
/// a bare `#meth`/`.meth` against method names, and finally a bare constant
/// against the last `::` segment. Ambiguous bare matches pick the first entity
/// in insertion order.
#[derive(Debug, Default)]
pub struct SymbolTable {
    /// Full name to insertion index.
    by_name: HashMap<String, usize>,
    /// Full names in insertion (document) order.
    names: Vec<String>,
}

impl SymbolTable {
    /// Add a documented entity. Re-inserting an existing name is a no-op.
    pub fn insert(&mut self, full_name: &str) {
        if self.by_name.contains_key(full_name) {
            return;
        }
        self.by_name.insert(full_name.to_string(), self.names.len());
        self.names.push(full_name.to_string());
    }

    /// Number of documented entities.
    pub fn len(&self) -> usize {
        return self.names.len();
    }

    /// Find the full name a mention refers to, if any.
    fn lookup(&self, raw_name: &str) -> Option<&str> {
        let name = raw_name.trim().trim_start_matches("::");
        if name.is_empty() {
            return None;
        }

        if let Some(index) = self.by_name.get(name) {
            return self.names.get(*index).map(|n| return n.as_str());
        }

        if let Some(method) = name.strip_prefix('#').or_else(|| return name.strip_prefix('.')) {
            return self.first_where(|full| return method_part(full) == Some(method));
        }

        if let Some((namespace, last)) = name.rsplit_once("::")
            && last.starts_with(|c: char| return c.is_lowercase() || c == '_')
        {
            for separator in ['#', '.'] {
                let candidate = format!("{namespace}{separator}{last}");
                if let Some(index) = self.by_name.get(&candidate) {
                    return self.names.get(*index).map(|n| return n.as_str());
                }
            }
            return None;
        }

        if name.contains(['#', '.']) {
            return None;
        }
        return self.first_where(|full| {
            return method_part(full).is_none() && full.rsplit("::").next() == Some(name);
        });
    }

    /// First entity in insertion order satisfying `predicate`.
    fn first_where(&self, predicate: impl Fn(&str) -> bool) -> Option<&str> {
        return self
            .names
            .iter()
            .map(|n| return n.as_str())
            .find(|n| return predicate(n));
    }
}

impl FromIterator<String> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut table = Self::default();
        for name in iter {
            table.insert(&name);
        }
        return table;
    }
}

impl ReferenceOracle for SymbolTable {
    fn resolve(&self, raw_name: &str, _display_name: &str) -> Resolution {
        return match self.lookup(raw_name) {
            None => Resolution::PlainString,
            Some(full_name) => Resolution::Entity(Entity { destination: full_name.to_string() }),
        };
    }
}

/// Method name of a `Foo#bar` or `Foo.bar` entity, `None` for namespaces.
fn method_part(full_name: &str) -> Option<&str> {
    let tail = full_name.rsplit("::").next().unwrap_or(full_name);
    return tail.rsplit_once(['#', '.']).map(|(_, method)| return method);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SymbolTable {
        return ["Foo", "Foo::Bar", "Foo::Bar#baz", "Foo::Bar.create", "Bbb"]
            .into_iter()
            .map(String::from)
            .collect();
    }

    fn destination(table: &SymbolTable, raw: &str) -> Option<String> {
        return match table.resolve(raw, raw) {
            Resolution::Entity(entity) => Some(entity.destination),
            Resolution::PlainString => None,
        };
    }

    #[test]
    fn exact_name() {
        assert_eq!(destination(&table(), "Foo::Bar#baz").as_deref(), Some("Foo::Bar#baz"));
        assert_eq!(destination(&table(), "::Foo").as_deref(), Some("Foo"));
    }

    #[test]
    fn bare_method() {
        assert_eq!(destination(&table(), "#baz").as_deref(), Some("Foo::Bar#baz"));
        assert_eq!(destination(&table(), ".create").as_deref(), Some("Foo::Bar.create"));
        assert_eq!(destination(&table(), "#missing"), None);
    }

    #[test]
    fn double_colon_method() {
        assert_eq!(destination(&table(), "Foo::Bar::baz").as_deref(), Some("Foo::Bar#baz"));
        assert_eq!(destination(&table(), "Foo::Bar::create").as_deref(), Some("Foo::Bar.create"));
    }

    #[test]
    fn bare_constant_matches_last_segment() {
        assert_eq!(destination(&table(), "Bar").as_deref(), Some("Foo::Bar"));
    }

    #[test]
    fn unknown_is_plain() {
        assert_eq!(table().resolve("Nope", "Nope"), Resolution::PlainString);
        assert_eq!(table().resolve("", ""), Resolution::PlainString);
    }

    #[test]
    fn duplicate_insert_is_ignored() {
        let mut table = table();
        table.insert("Bbb");
        assert_eq!(table.len(), 5);
    }
}
