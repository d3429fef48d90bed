//! Schema loading.

use std::fs;
use std::path::Path;

use srvconf_core::{Schema, SchemaData};

use crate::LoadError;

const BUILTIN_SCHEMA: &str = include_str!("../data/schema.json");

/// Parse schema JSON.
///
/// `origin` names the data in error messages.
pub fn parse_schema(json: &str, origin: &Path) -> Result<Schema, LoadError> {
    let data: SchemaData = serde_json::from_str(json).map_err(|e| LoadError::Json {
        path: origin.to_path_buf(),
        source: e,
    })?;
    Ok(Schema::from_data(data))
}

/// Read and parse a schema file.
pub fn load_schema(path: &Path) -> Result<Schema, LoadError> {
    let json = fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let schema = parse_schema(&json, path)?;
    tracing::info!(
        "Loaded schema from {}: {} properties, {} environment keys",
        path.display(),
        schema.properties.len(),
        schema.environment.len()
    );
    Ok(schema)
}

/// The schema embedded in this crate.
pub fn builtin_schema() -> Schema {
    parse_schema(BUILTIN_SCHEMA, Path::new("<builtin>")).unwrap_or_else(|e| {
        tracing::error!("Built-in schema is invalid: {e}");
        Schema::default()
    })
}

/// Load `path` if given, falling back to the built-in schema.
pub fn load_schema_or_builtin(path: Option<&Path>) -> Result<Schema, LoadError> {
    path.map_or_else(|| Ok(builtin_schema()), load_schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use srvconf_core::DocumentKind;

    #[test]
    fn test_builtin_schema_parses() {
        let schema = parse_schema(BUILTIN_SCHEMA, Path::new("<builtin>")).unwrap();
        assert!(!schema.properties.is_empty());
        assert!(!schema.environment.is_empty());

        let source = schema
            .properties
            .lookup("com.ibm.ws.logging.console.source")
            .unwrap();
        assert!(source.allows_multiple);
        assert_eq!(
            source.allowed_values,
            vec!["accessLog", "message", "ffdc", "audit", "trace"]
        );

        let env = schema.dictionary_for(DocumentKind::ServerEnv).unwrap();
        assert!(env.lookup("WLP_LOGGING_CONSOLE_FORMAT").is_some());
    }

    #[test]
    fn test_invalid_json_reports_origin() {
        let err = parse_schema("{ nope", Path::new("custom.json")).unwrap_err();
        assert!(err.to_string().contains("custom.json"));
    }
}
