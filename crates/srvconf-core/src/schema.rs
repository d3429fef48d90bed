//! Schema: the dictionaries for every document kind.

use serde::Deserialize;

use crate::dictionary::Dictionary;
use crate::document::DocumentKind;
use crate::entry::IdentifierEntry;

/// Known identifiers for every document kind.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Keys accepted in `bootstrap.properties`.
    pub properties: Dictionary,
    /// Keys accepted in `server.env`.
    pub environment: Dictionary,
}

/// Serialized schema layout.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaData {
    /// Bootstrap property entries, in canonical order.
    #[serde(default)]
    pub properties: Vec<IdentifierEntry>,
    /// Environment variable entries, in canonical order.
    #[serde(default)]
    pub environment: Vec<IdentifierEntry>,
}

impl Schema {
    /// Build the dictionaries from serialized data.
    pub fn from_data(data: SchemaData) -> Self {
        Self {
            properties: Dictionary::from_entries(data.properties),
            environment: Dictionary::from_entries(data.environment),
        }
    }

    /// The key dictionary for a document kind.
    ///
    /// XML documents have no key dictionary.
    pub const fn dictionary_for(&self, kind: DocumentKind) -> Option<&Dictionary> {
        match kind {
            DocumentKind::BootstrapProperties => Some(&self.properties),
            DocumentKind::ServerEnv => Some(&self.environment),
            DocumentKind::ServerXml => None,
        }
    }
}

impl From<SchemaData> for Schema {
    fn from(data: SchemaData) -> Self {
        Self::from_data(data)
    }
}
