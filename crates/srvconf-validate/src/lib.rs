//! Server configuration validation rules.
//!
//! This crate walks every token of a document and reports the identifiers
//! that do not resolve:
//!
//! - `${name}` references to variables the workspace does not declare
//! - Values outside the allowed set of their key
//! - Unknown keys (opt-in)
//!
//! # Diagnostic Codes
//!
//! | Code | Description |
//! |------|-------------|
//! | `incorrect_variable` | Variable reference does not resolve |
//! | `unknown_property_value` | Value not in the key's allowed values |
//! | `unknown_property` | Key not in the dictionary |

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use srvconf_core::{DocumentKind, VariableSnapshot, Workspace};
use srvconf_parser::{ConfigDocument, Span, Token, TokenKind, VariableForm};
use thiserror::Error;

/// Diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// A key that is not in the dictionary.
    UnknownKey,
    /// A value outside the allowed values of its key.
    UnknownValue,
    /// A `${name}` reference to an undeclared variable.
    UnknownVariable,
}

impl DiagnosticCode {
    /// The stable wire string for this code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnknownKey => "unknown_property",
            Self::UnknownValue => "unknown_property_value",
            Self::UnknownVariable => "incorrect_variable",
        }
    }

    /// Parse a wire string back into a code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        [Self::UnknownKey, Self::UnknownValue, Self::UnknownVariable]
            .into_iter()
            .find(|c| c.code() == code)
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// An unresolved identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{code}] {message}")]
pub struct Diagnostic {
    /// Diagnostic code.
    pub code: DiagnosticCode,
    /// Human-readable message.
    pub message: String,
    /// Exact range of the offending identifier (`${name}` for variables).
    pub span: Span,
    /// The offending identifier: the bare variable name, the value or the key.
    pub payload: String,
    /// The key owning an unknown value.
    pub owner_key: Option<String>,
}

impl Diagnostic {
    /// An undeclared variable; `span` covers the whole `${name}`.
    #[must_use]
    pub fn unknown_variable(name: &str, span: Span) -> Self {
        Self {
            code: DiagnosticCode::UnknownVariable,
            message: format!("ERROR: The variable \"{name}\" does not exist."),
            span,
            payload: name.to_string(),
            owner_key: None,
        }
    }

    /// A value not allowed for `key`.
    #[must_use]
    pub fn unknown_value(kind: DocumentKind, key: &str, value: &str, span: Span) -> Self {
        Self {
            code: DiagnosticCode::UnknownValue,
            message: format!(
                "The value `{value}` is not valid for the {} `{key}`.",
                kind.key_noun()
            ),
            span,
            payload: value.to_string(),
            owner_key: Some(key.to_string()),
        }
    }

    /// A key missing from the dictionary.
    #[must_use]
    pub fn unknown_key(kind: DocumentKind, key: &str, span: Span) -> Self {
        Self {
            code: DiagnosticCode::UnknownKey,
            message: format!("The {} `{key}` is not recognized.", kind.key_noun()),
            span,
            payload: key.to_string(),
            owner_key: None,
        }
    }
}

/// Validation options.
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    /// Whether keys missing from the dictionary are reported.
    pub unknown_keys: bool,
}

/// Check one token.
fn check_token(
    doc: &ConfigDocument<'_>,
    token: &Token<'_>,
    variables: &VariableSnapshot,
    options: &ValidationOptions,
) -> Option<Diagnostic> {
    match token.kind {
        TokenKind::Variable(VariableForm::Delimited) => variables
            .resolve(token.raw_text)
            .is_none()
            .then(|| Diagnostic::unknown_variable(token.raw_text, token.span)),
        TokenKind::Variable(_) => None,
        TokenKind::Key => {
            let dictionary = doc.dictionary()?;
            (options.unknown_keys && dictionary.lookup(token.raw_text).is_none())
                .then(|| Diagnostic::unknown_key(doc.kind(), token.raw_text, token.span))
        }
        TokenKind::Value => {
            if token.raw_text.is_empty() {
                return None;
            }
            let key = token.owner_key?;
            let entry = doc.entry(key)?;
            (!entry.allows_value(token.raw_text))
                .then(|| Diagnostic::unknown_value(doc.kind(), key, token.raw_text, token.span))
        }
    }
}

/// Validate a document against a variable snapshot.
///
/// Diagnostics come out in document order.
pub fn validate(
    doc: &ConfigDocument<'_>,
    variables: &VariableSnapshot,
    options: &ValidationOptions,
) -> Vec<Diagnostic> {
    doc.tokens()
        .filter_map(|token| check_token(doc, &token, variables, options))
        .collect()
}

/// Validate document text against a workspace.
pub fn validate_source(
    source: &str,
    kind: DocumentKind,
    workspace: &Workspace,
    options: &ValidationOptions,
) -> Vec<Diagnostic> {
    let doc = ConfigDocument::new(source, kind, workspace.dictionary(kind));
    let variables = workspace.variables().snapshot();
    let diagnostics = validate(&doc, &variables, options);
    tracing::debug!("{} diagnostics for {} document", diagnostics.len(), kind);
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use srvconf_core::{IdentifierEntry, Schema, SchemaData, SourceId};

    fn workspace() -> Workspace {
        let schema = Schema::from_data(SchemaData {
            properties: vec![
                IdentifierEntry::new("com.ibm.ws.logging.console.format", "Console format")
                    .with_allowed_values(["DEV", "SIMPLE", "JSON"]),
                IdentifierEntry::new("com.ibm.ws.logging.console.source", "Console sources")
                    .with_allowed_values(["message", "trace", "accessLog", "ffdc", "audit"])
                    .with_multiple_values(),
                IdentifierEntry::new("com.ibm.ws.logging.log.directory", "Log directory"),
            ],
            environment: vec![IdentifierEntry::new("WLP_LOGGING_CONSOLE_FORMAT", "Format")
                .with_allowed_values(["DEV", "SIMPLE", "JSON"])],
        });
        let workspace = Workspace::new(schema);
        workspace.variables().replace_source_entries(
            SourceId::new("defaults.xml"),
            [("default.http.port", "9080"), ("default.https.port", "9443")],
        );
        workspace
    }

    #[test]
    fn test_unknown_variable() {
        let ws = workspace();
        let source = r#"<httpEndpoint httpPort="${default.http.port}" httpsPort="${default.https}"/>"#;
        let diags = validate_source(source, DocumentKind::ServerXml, &ws, &Default::default());
        assert_eq!(diags.len(), 1);
        let diag = &diags[0];
        assert_eq!(diag.code, DiagnosticCode::UnknownVariable);
        assert_eq!(diag.payload, "default.https");
        assert_eq!(diag.span.text(source), "${default.https}");
        assert_eq!(
            diag.message,
            "ERROR: The variable \"default.https\" does not exist."
        );
    }

    #[test]
    fn test_unknown_value_case_insensitive() {
        let ws = workspace();
        let source = "com.ibm.ws.logging.console.format=json\ncom.ibm.ws.logging.console.format=DEVd\n";
        let diags = validate_source(
            source,
            DocumentKind::BootstrapProperties,
            &ws,
            &Default::default(),
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::UnknownValue);
        assert_eq!(diags[0].span.text(source), "DEVd");
        assert_eq!(
            diags[0].message,
            "The value `DEVd` is not valid for the property `com.ibm.ws.logging.console.format`."
        );
        assert_eq!(
            diags[0].owner_key.as_deref(),
            Some("com.ibm.ws.logging.console.format")
        );
    }

    #[test]
    fn test_server_env_message_says_variable() {
        let ws = workspace();
        let source = "WLP_LOGGING_CONSOLE_FORMAT=TBASICX";
        let diags = validate_source(source, DocumentKind::ServerEnv, &ws, &Default::default());
        assert_eq!(
            diags[0].message,
            "The value `TBASICX` is not valid for the variable `WLP_LOGGING_CONSOLE_FORMAT`."
        );
    }

    #[test]
    fn test_multi_value_segments_checked_independently() {
        let ws = workspace();
        let source = "com.ibm.ws.logging.console.source=trace, bogus ,trace,";
        let diags = validate_source(
            source,
            DocumentKind::BootstrapProperties,
            &ws,
            &Default::default(),
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].payload, "bogus");
        assert_eq!(diags[0].span.text(source), "bogus");
    }

    #[test]
    fn test_free_form_and_empty_values() {
        let ws = workspace();
        let source = "com.ibm.ws.logging.log.directory=/anything\ncom.ibm.ws.logging.console.format=\n";
        let diags = validate_source(
            source,
            DocumentKind::BootstrapProperties,
            &ws,
            &Default::default(),
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn test_unknown_keys_opt_in() {
        let ws = workspace();
        let source = "not.a.key=1\n";
        let kind = DocumentKind::BootstrapProperties;
        assert!(validate_source(source, kind, &ws, &Default::default()).is_empty());

        let options = ValidationOptions { unknown_keys: true };
        let diags = validate_source(source, kind, &ws, &options);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::UnknownKey);
        assert_eq!(diags[0].message, "The property `not.a.key` is not recognized.");
    }

    #[test]
    fn test_code_round_trip() {
        for code in [
            DiagnosticCode::UnknownKey,
            DiagnosticCode::UnknownValue,
            DiagnosticCode::UnknownVariable,
        ] {
            assert_eq!(DiagnosticCode::from_code(code.code()), Some(code));
        }
        assert_eq!(DiagnosticCode::from_code("nope"), None);
    }

    #[test]
    fn test_document_order() {
        let ws = workspace();
        let source = r#"<a x="${b}"/><a x="${a}"/>"#;
        let diags = validate_source(source, DocumentKind::ServerXml, &ws, &Default::default());
        let payloads: Vec<_> = diags.iter().map(|d| d.payload.as_str()).collect();
        assert_eq!(payloads, vec!["b", "a"]);
    }
}
