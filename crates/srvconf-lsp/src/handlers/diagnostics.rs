//! Diagnostics handler for publishing unresolved identifiers.

use lsp_types::{DiagnosticSeverity, NumberOrString};
use serde_json::{json, Value};
use srvconf_core::{DocumentKind, VariableSnapshot, Workspace};
use srvconf_parser::ConfigDocument;
use srvconf_validate::{validate, Diagnostic, DiagnosticCode, ValidationOptions};

use super::guarded;
use super::utils::LineIndex;

/// The `source` field of every published diagnostic.
pub const DIAGNOSTIC_SOURCE: &str = "srvconf";

/// Compute every diagnostic of a document, in document order.
pub fn compute_diagnostics(
    doc: &ConfigDocument<'_>,
    variables: &VariableSnapshot,
    options: &ValidationOptions,
) -> Vec<Diagnostic> {
    guarded("diagnostics", || validate(doc, variables, options))
}

/// Validate document text and convert the result to protocol diagnostics.
pub fn document_diagnostics(
    source: &str,
    kind: DocumentKind,
    workspace: &Workspace,
    options: &ValidationOptions,
) -> Vec<lsp_types::Diagnostic> {
    let doc = ConfigDocument::new(source, kind, workspace.dictionary(kind));
    let diagnostics = compute_diagnostics(&doc, &workspace.variables().snapshot(), options);
    let index = LineIndex::new(source);
    diagnostics
        .iter()
        .map(|d| to_lsp_diagnostic(d, &index))
        .collect()
}

/// The `data` payload carried to the quick-fix request.
fn payload(diagnostic: &Diagnostic) -> Value {
    match (diagnostic.code, &diagnostic.owner_key) {
        (DiagnosticCode::UnknownValue, Some(key)) => json!({
            "key": key,
            "value": diagnostic.payload,
        }),
        _ => Value::String(diagnostic.payload.clone()),
    }
}

/// Convert a diagnostic to its protocol form.
pub fn to_lsp_diagnostic(diagnostic: &Diagnostic, index: &LineIndex<'_>) -> lsp_types::Diagnostic {
    lsp_types::Diagnostic {
        range: index.range(diagnostic.span),
        severity: Some(DiagnosticSeverity::ERROR),
        code: Some(NumberOrString::String(diagnostic.code.code().to_string())),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: diagnostic.message.clone(),
        related_information: None,
        tags: None,
        code_description: None,
        data: Some(payload(diagnostic)),
    }
}

/// Rebuild a diagnostic from its protocol form.
///
/// Returns `None` for diagnostics this server did not publish.
pub fn from_lsp_diagnostic(
    diagnostic: &lsp_types::Diagnostic,
    index: &LineIndex<'_>,
) -> Option<Diagnostic> {
    let NumberOrString::String(code) = diagnostic.code.as_ref()? else {
        return None;
    };
    let code = DiagnosticCode::from_code(code)?;
    let span = index.span(diagnostic.range)?;
    let data = diagnostic.data.as_ref()?;

    let (payload, owner_key) = match data {
        Value::String(name) => (name.clone(), None),
        Value::Object(fields) => (
            fields.get("value")?.as_str()?.to_string(),
            fields
                .get("key")
                .and_then(Value::as_str)
                .map(ToString::to_string),
        ),
        _ => return None,
    };

    Some(Diagnostic {
        code,
        message: diagnostic.message.clone(),
        span,
        payload,
        owner_key,
    })
}
