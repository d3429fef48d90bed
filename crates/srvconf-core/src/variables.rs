//! Workspace variable store.
//!
//! Variables are grouped by the source file that declared them. Every
//! mutation builds a complete new [`VariableSnapshot`] and swaps it in
//! under a write lock, so a reader holding a snapshot always sees either
//! the old or the new entry set of a source, never a mix.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::matcher::{self, MatchMode};

/// Identifies the file (or other origin) that declared a set of variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(Arc<str>);

impl SourceId {
    /// Create a source id from any string-like value (usually a path).
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A declared variable and the source it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableEntry {
    /// Variable name, as referenced inside `${...}`.
    pub name: String,
    /// Resolved value.
    pub value: String,
    /// The declaring source.
    pub source: SourceId,
}

/// Entries declared by one source, in declaration order.
#[derive(Debug, Clone)]
struct SourceEntries {
    id: SourceId,
    entries: Arc<[VariableEntry]>,
}

/// An immutable view of every live variable.
#[derive(Debug, Default)]
pub struct VariableSnapshot {
    /// Sources in registration order (lowest precedence first).
    sources: Vec<SourceEntries>,
    /// Winning entry per name.
    live: HashMap<String, VariableEntry>,
    /// Live names sorted case-insensitively.
    sorted: Vec<String>,
}

impl VariableSnapshot {
    fn from_sources(sources: Vec<SourceEntries>) -> Self {
        let mut live: HashMap<String, VariableEntry> = HashMap::new();
        // Later sources, and later entries within a source, win.
        for source in &sources {
            for entry in source.entries.iter() {
                live.insert(entry.name.clone(), entry.clone());
            }
        }

        let mut sorted: Vec<String> = live.keys().cloned().collect();
        sorted.sort_by(|a, b| {
            a.to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b))
        });

        Self {
            sources,
            live,
            sorted,
        }
    }

    /// Resolve a variable name (case-sensitive, exact).
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.live.get(name).map(|entry| entry.value.as_str())
    }

    /// The winning entry for a name, including its source.
    pub fn entry(&self, name: &str) -> Option<&VariableEntry> {
        self.live.get(name)
    }

    /// Live entries whose name contains `fragment` (case-insensitive),
    /// ordered case-insensitively by name.
    pub fn search_by_fragment<'a>(
        &'a self,
        fragment: &str,
    ) -> impl Iterator<Item = &'a VariableEntry> + 'a {
        let ordered = self.sorted.iter().filter_map(|name| self.live.get(name));
        matcher::filter(fragment, ordered, MatchMode::Substring)
    }

    /// All live entries, ordered case-insensitively by name.
    pub fn iter(&self) -> impl Iterator<Item = &VariableEntry> {
        self.sorted.iter().filter_map(|name| self.live.get(name))
    }

    /// Number of live variables.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no variable is defined.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Registered sources, lowest precedence first.
    pub fn sources(&self) -> impl Iterator<Item = &SourceId> {
        self.sources.iter().map(|s| &s.id)
    }

    /// Entries declared by one source, in declaration order.
    pub fn source_entries(&self, source: &SourceId) -> Option<&[VariableEntry]> {
        self.sources
            .iter()
            .find(|s| &s.id == source)
            .map(|s| &*s.entries)
    }
}

fn collect_entries<I, K, V>(source: &SourceId, entries: I) -> Arc<[VariableEntry]>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    entries
        .into_iter()
        .map(|(name, value)| VariableEntry {
            name: name.into(),
            value: value.into(),
            source: source.clone(),
        })
        .collect()
}

/// Shared, read-mostly store of workspace variables.
#[derive(Debug, Default)]
pub struct VariableStore {
    current: RwLock<Arc<VariableSnapshot>>,
}

impl VariableStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a consistent snapshot for a whole request.
    pub fn snapshot(&self) -> Arc<VariableSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Resolve a variable name against the current snapshot.
    pub fn resolve(&self, name: &str) -> Option<String> {
        self.snapshot().resolve(name).map(ToString::to_string)
    }

    /// `(name, value)` pairs whose name contains `fragment`, ordered
    /// case-insensitively by name.
    pub fn search_by_fragment(&self, fragment: &str) -> Vec<(String, String)> {
        self.snapshot()
            .search_by_fragment(fragment)
            .map(|e| (e.name.clone(), e.value.clone()))
            .collect()
    }

    /// Atomically replace every entry attributed to `source`.
    ///
    /// A source that was already registered keeps its precedence slot;
    /// a new source is appended with the highest precedence.
    pub fn replace_source_entries<I, K, V>(&self, source: SourceId, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.upsert(source, entries, <[SourceEntries]>::len);
    }

    /// Like [`replace_source_entries`](Self::replace_source_entries), but a
    /// new source is inserted by `key`: after every registered source whose
    /// key is not greater than its own.
    pub fn replace_source_entries_ranked<I, K, V, R, F>(
        &self,
        source: SourceId,
        entries: I,
        key: F,
    ) where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
        R: Ord,
        F: Fn(&SourceId) -> R,
    {
        let own = key(&source);
        self.upsert(source, entries, |sources| {
            sources.partition_point(|s| key(&s.id) <= own)
        });
    }

    fn upsert<I, K, V, P>(&self, source: SourceId, entries: I, position: P)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
        P: FnOnce(&[SourceEntries]) -> usize,
    {
        let entries = collect_entries(&source, entries);

        tracing::debug!("Replacing {} variables from {}", entries.len(), source);

        let mut current = self.current.write();
        let mut sources = current.sources.clone();
        match sources.iter_mut().find(|s| s.id == source) {
            Some(existing) => existing.entries = entries,
            None => {
                let at = position(&sources);
                sources.insert(
                    at,
                    SourceEntries {
                        id: source,
                        entries,
                    },
                );
            }
        }
        *current = Arc::new(VariableSnapshot::from_sources(sources));
    }

    /// Atomically replace every source at once, lowest precedence first.
    ///
    /// Readers see either the previous sources or all of the new ones.
    pub fn replace_all<I, E, K, V>(&self, sources: I)
    where
        I: IntoIterator<Item = (SourceId, E)>,
        E: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let sources: Vec<SourceEntries> = sources
            .into_iter()
            .map(|(id, entries)| SourceEntries {
                entries: collect_entries(&id, entries),
                id,
            })
            .collect();
        let snapshot = Arc::new(VariableSnapshot::from_sources(sources));
        *self.current.write() = snapshot;
    }

    /// Drop every entry attributed to `source`.
    pub fn remove_source(&self, source: &SourceId) {
        let mut current = self.current.write();
        if !current.sources.iter().any(|s| &s.id == source) {
            return;
        }
        let sources = current
            .sources
            .iter()
            .filter(|s| &s.id != source)
            .cloned()
            .collect();
        *current = Arc::new(VariableSnapshot::from_sources(sources));
    }

    /// Drop every source.
    pub fn clear(&self) {
        *self.current.write() = Arc::new(VariableSnapshot::default());
    }
}
