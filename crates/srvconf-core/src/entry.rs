//! Identifier metadata loaded from schema data.

use serde::{Deserialize, Serialize};

/// Metadata describing one known configuration identifier.
///
/// The same shape backs property keys, environment keys and their
/// enumerated values. Entries are immutable once a [`Dictionary`] has been
/// built from them.
///
/// [`Dictionary`]: crate::Dictionary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierEntry {
    /// Exact identifier name.
    pub name: String,
    /// Markdown description shown on hover and completion.
    #[serde(default)]
    pub description: String,
    /// Documented default value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Allowed values in canonical order. Empty means free-form.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
    /// Whether the value is a comma-separated list of allowed values.
    #[serde(default, rename = "allowsMultipleCommaSeparated")]
    pub allows_multiple: bool,
}

impl IdentifierEntry {
    /// Create a free-form entry with a description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            default_value: None,
            allowed_values: Vec::new(),
            allows_multiple: false,
        }
    }

    /// Set the documented default value.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Set the allowed values, in canonical order.
    #[must_use]
    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the value as a comma-separated list.
    #[must_use]
    pub const fn with_multiple_values(mut self) -> Self {
        self.allows_multiple = true;
        self
    }

    /// Whether any value is accepted.
    pub fn is_free_form(&self) -> bool {
        self.allowed_values.is_empty()
    }

    /// Check a single (already split) value against the allowed set.
    ///
    /// Free-form entries accept everything. Enumerated values compare
    /// case-insensitively after trimming.
    pub fn allows_value(&self, value: &str) -> bool {
        if self.is_free_form() {
            return true;
        }
        let value = value.trim().to_lowercase();
        self.allowed_values
            .iter()
            .any(|allowed| allowed.to_lowercase() == value)
    }

    /// The canonical default for completion: the first allowed value.
    pub fn canonical_default(&self) -> Option<&str> {
        self.allowed_values.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_form_accepts_anything() {
        let entry = IdentifierEntry::new("com.example.dir", "A directory");
        assert!(entry.is_free_form());
        assert!(entry.allows_value("/tmp/anything"));
        assert!(entry.allows_value(""));
    }

    #[test]
    fn test_allowed_values_case_insensitive() {
        let entry = IdentifierEntry::new("format", "Log format")
            .with_allowed_values(["DEV", "SIMPLE", "JSON"]);
        assert!(entry.allows_value("DEV"));
        assert!(entry.allows_value("json"));
        assert!(entry.allows_value("  Simple "));
        assert!(!entry.allows_value("DEVd"));
        assert_eq!(entry.canonical_default(), Some("DEV"));
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "name": "com.ibm.ws.logging.console.source",
            "description": "Sources sent to the console.",
            "defaultValue": "message",
            "allowedValues": ["message", "trace"],
            "allowsMultipleCommaSeparated": true
        }"#;
        let entry: IdentifierEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.default_value.as_deref(), Some("message"));
        assert_eq!(entry.allowed_values, vec!["message", "trace"]);
        assert!(entry.allows_multiple);
    }

    #[test]
    fn test_deserialize_minimal() {
        let entry: IdentifierEntry = serde_json::from_str(r#"{"name": "x"}"#).unwrap();
        assert_eq!(entry.name, "x");
        assert!(entry.description.is_empty());
        assert!(entry.is_free_form());
        assert!(!entry.allows_multiple);
    }
}
