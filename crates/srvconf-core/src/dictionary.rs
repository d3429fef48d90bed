//! Identifier dictionary.

use std::collections::HashMap;

use crate::entry::IdentifierEntry;
use crate::matcher::{self, MatchMode};

/// An immutable mapping from identifier name to metadata.
///
/// Entries keep their declaration order, which is the canonical order
/// used for ranking. Exact lookups go through a name index; the
/// case-insensitive index keeps the first declaration of each folded name.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: Vec<IdentifierEntry>,
    by_name: HashMap<String, usize>,
    by_folded_name: HashMap<String, usize>,
}

impl Dictionary {
    /// Build a dictionary from entries in declaration order.
    ///
    /// A duplicate name replaces the earlier entry in place, keeping the
    /// earlier position.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = IdentifierEntry>,
    {
        let mut dict = Self::default();
        for entry in entries {
            if let Some(&index) = dict.by_name.get(&entry.name) {
                dict.entries[index] = entry;
                continue;
            }
            let index = dict.entries.len();
            dict.by_name.insert(entry.name.clone(), index);
            dict.by_folded_name
                .entry(entry.name.to_lowercase())
                .or_insert(index);
            dict.entries.push(entry);
        }
        dict
    }

    /// Exact, case-sensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<&IdentifierEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// Case-insensitive lookup.
    pub fn lookup_ignore_case(&self, name: &str) -> Option<&IdentifierEntry> {
        self.lookup(name).or_else(|| {
            self.by_folded_name
                .get(&name.to_lowercase())
                .map(|&i| &self.entries[i])
        })
    }

    /// Lazily search entries by fragment, in declaration order.
    pub fn search<'a>(
        &'a self,
        fragment: &str,
        mode: MatchMode,
    ) -> impl Iterator<Item = &'a IdentifierEntry> + 'a {
        matcher::filter(fragment, self.entries.iter(), mode)
    }

    /// All entries in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, IdentifierEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<IdentifierEntry> for Dictionary {
    fn from_iter<I: IntoIterator<Item = IdentifierEntry>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = &'a IdentifierEntry;
    type IntoIter = std::slice::Iter<'a, IdentifierEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logging_dictionary() -> Dictionary {
        Dictionary::from_entries([
            IdentifierEntry::new("com.ibm.ws.logging.console.format", "Console format")
                .with_allowed_values(["DEV", "SIMPLE", "JSON"]),
            IdentifierEntry::new("com.ibm.ws.logging.console.log.level", "Console level"),
            IdentifierEntry::new("com.ibm.ws.logging.trace.format", "Trace format"),
            IdentifierEntry::new("websphere.log.provider", "Log provider"),
        ])
    }

    #[test]
    fn test_lookup() {
        let dict = logging_dictionary();
        assert!(dict.lookup("websphere.log.provider").is_some());
        assert!(dict.lookup("WEBSPHERE.log.provider").is_none());
        assert!(dict.lookup_ignore_case("WEBSPHERE.log.provider").is_some());
        assert!(dict.lookup("missing").is_none());
    }

    #[test]
    fn test_search_keeps_declaration_order() {
        let dict = logging_dictionary();
        let names: Vec<_> = dict
            .search("com.ibm.ws.logging.", MatchMode::Prefix)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "com.ibm.ws.logging.console.format",
                "com.ibm.ws.logging.console.log.level",
                "com.ibm.ws.logging.trace.format",
            ]
        );

        let names: Vec<_> = dict
            .search("FORMAT", MatchMode::Substring)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_duplicate_replaces_in_place() {
        let dict = Dictionary::from_entries([
            IdentifierEntry::new("a", "first"),
            IdentifierEntry::new("b", ""),
            IdentifierEntry::new("a", "second"),
        ]);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.iter().next().unwrap().description, "second");
    }

    #[test]
    fn test_empty() {
        let dict = Dictionary::default();
        assert!(dict.is_empty());
        assert_eq!(dict.search("", MatchMode::Prefix).count(), 0);
    }
}
