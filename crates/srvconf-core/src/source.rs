//! Collaborator interfaces: where schema data and variables come from.

use std::path::Path;

use crate::document::DocumentKind;
use crate::entry::IdentifierEntry;
use crate::schema::Schema;
use crate::variables::SourceId;

/// Supplies identifier metadata.
pub trait SchemaSource {
    /// Look up one identifier for a document kind.
    fn identifier_entry(&self, kind: DocumentKind, name: &str) -> Option<IdentifierEntry>;

    /// Every identifier for a document kind, in canonical order.
    fn identifier_entries(&self, kind: DocumentKind) -> Vec<IdentifierEntry>;

    /// Materialize a [`Schema`] from this source.
    fn to_schema(&self) -> Schema {
        Schema {
            properties: self
                .identifier_entries(DocumentKind::BootstrapProperties)
                .into_iter()
                .collect(),
            environment: self
                .identifier_entries(DocumentKind::ServerEnv)
                .into_iter()
                .collect(),
        }
    }
}

impl SchemaSource for Schema {
    fn identifier_entry(&self, kind: DocumentKind, name: &str) -> Option<IdentifierEntry> {
        self.dictionary_for(kind)?.lookup(name).cloned()
    }

    fn identifier_entries(&self, kind: DocumentKind) -> Vec<IdentifierEntry> {
        self.dictionary_for(kind)
            .map(|dict| dict.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn to_schema(&self) -> Schema {
        self.clone()
    }
}

/// Variables declared by one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredSource {
    /// The declaring file.
    pub id: SourceId,
    /// `(name, value)` pairs in declaration order.
    pub entries: Vec<(String, String)>,
}

impl DiscoveredSource {
    /// Create a discovered source.
    pub fn new(id: SourceId, entries: Vec<(String, String)>) -> Self {
        Self { id, entries }
    }
}

/// Finds variable declarations under a workspace root.
pub trait VariableDiscovery {
    /// All variable sources under `root`, lowest precedence first.
    fn variable_sources(&self, root: &Path) -> Vec<DiscoveredSource>;
}

impl<F> VariableDiscovery for F
where
    F: Fn(&Path) -> Vec<DiscoveredSource>,
{
    fn variable_sources(&self, root: &Path) -> Vec<DiscoveredSource> {
        self(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaData;

    #[test]
    fn test_schema_is_a_source() {
        let schema = Schema::from_data(SchemaData {
            properties: vec![IdentifierEntry::new("a", "A"), IdentifierEntry::new("b", "B")],
            environment: Vec::new(),
        });
        assert_eq!(
            schema
                .identifier_entry(DocumentKind::BootstrapProperties, "b")
                .map(|e| e.description),
            Some("B".to_string())
        );
        assert!(schema
            .identifier_entry(DocumentKind::ServerXml, "a")
            .is_none());
        assert_eq!(
            schema
                .identifier_entries(DocumentKind::BootstrapProperties)
                .len(),
            2
        );
    }

    #[test]
    fn test_closure_discovery() {
        let discovery = |_: &Path| {
            vec![DiscoveredSource::new(
                SourceId::new("server.env"),
                vec![("A".into(), "1".into())],
            )]
        };
        let sources = discovery.variable_sources(Path::new("."));
        assert_eq!(sources.len(), 1);
    }
}
