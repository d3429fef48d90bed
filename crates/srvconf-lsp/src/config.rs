//! Server configuration from `initializationOptions`.

use std::path::PathBuf;

use serde::Deserialize;
use srvconf_validate::ValidationOptions;

/// Client-supplied server settings.
///
/// ```json
/// { "unknownKeyDiagnostics": true, "schemaPath": "/opt/schema.json" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Report keys missing from the dictionary.
    pub unknown_key_diagnostics: bool,
    /// Schema JSON replacing the built-in schema.
    pub schema_path: Option<PathBuf>,
}

impl ServerConfig {
    /// Read the options sent with `initialize`. Invalid options fall back to
    /// the defaults.
    pub fn from_initialization_options(options: Option<serde_json::Value>) -> Self {
        match options {
            None | Some(serde_json::Value::Null) => Self::default(),
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid initialization options: {}", e);
                Self::default()
            }),
        }
    }

    /// Validation options implied by this configuration.
    pub const fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            unknown_keys: self.unknown_key_diagnostics,
        }
    }
}
