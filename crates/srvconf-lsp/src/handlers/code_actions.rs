//! Code actions handler for quick fixes.
//!
//! Offers replacements for:
//! - `${name}` references to undeclared variables
//! - Values outside the allowed set of their key
//!
//! Candidates are found by substring match on the offending identifier. A
//! value with no such match falls back to the allowed values it contains,
//! then to every allowed value in schema order.

use std::collections::HashMap;

use lsp_types::{
    CodeAction, CodeActionKind, CodeActionOrCommand, CodeActionParams, CodeActionResponse,
    TextEdit, Uri, WorkspaceEdit,
};
use srvconf_core::{DocumentKind, MatchMode, Ranker, VariableSnapshot, Workspace};
use srvconf_parser::{ConfigDocument, Span};
use srvconf_validate::{Diagnostic, DiagnosticCode};

use super::diagnostics::from_lsp_diagnostic;
use super::guarded;
use super::utils::LineIndex;

/// A proposed replacement for a diagnostic's range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickFix {
    /// Title shown to the user.
    pub title: String,
    /// Replacement text.
    pub replacement: String,
    /// The replaced region (the diagnostic's range).
    pub span: Span,
}

/// Compute quick fixes for one diagnostic.
///
/// No match is a normal outcome and yields an empty list.
pub fn compute_quick_fixes(
    doc: &ConfigDocument<'_>,
    diagnostic: &Diagnostic,
    variables: &VariableSnapshot,
) -> Vec<QuickFix> {
    guarded("quick fix", || quick_fixes(doc, diagnostic, variables))
}

fn quick_fixes(
    doc: &ConfigDocument<'_>,
    diagnostic: &Diagnostic,
    variables: &VariableSnapshot,
) -> Vec<QuickFix> {
    match diagnostic.code {
        DiagnosticCode::UnknownVariable => variables
            .search_by_fragment(&diagnostic.payload)
            .map(|var| QuickFix {
                title: format!("Replace with ${{{}}} (value = {})", var.name, var.value),
                replacement: format!("${{{}}}", var.name),
                span: diagnostic.span,
            })
            .collect(),
        DiagnosticCode::UnknownValue => {
            let Some(entry) = diagnostic.owner_key.as_deref().and_then(|key| doc.entry(key))
            else {
                return Vec::new();
            };
            value_candidates(diagnostic.payload.trim(), &entry.allowed_values)
                .into_iter()
                .map(|candidate| QuickFix {
                    title: format!("Replace with {candidate}"),
                    replacement: candidate.clone(),
                    span: diagnostic.span,
                })
                .collect()
        }
        DiagnosticCode::UnknownKey => Vec::new(),
    }
}

/// Allowed values offered in place of `value`.
fn value_candidates<'a>(value: &str, allowed: &'a [String]) -> Vec<&'a String> {
    let matched: Vec<&String> = Ranker::new(MatchMode::Substring)
        .rank(value, allowed.iter())
        .into_iter()
        .map(|ranked| ranked.candidate)
        .collect();
    if !matched.is_empty() {
        return matched;
    }

    let folded = value.to_lowercase();
    let contained: Vec<&String> = allowed
        .iter()
        .filter(|candidate| folded.contains(&candidate.to_lowercase()))
        .collect();
    if !contained.is_empty() {
        return contained;
    }

    allowed.iter().collect()
}

/// Handle a code action request.
#[allow(clippy::mutable_key_type)] // Uri is required as key by LSP WorkspaceEdit API
pub fn handle_code_actions(
    params: &CodeActionParams,
    source: &str,
    kind: DocumentKind,
    workspace: &Workspace,
) -> Option<CodeActionResponse> {
    let uri = &params.text_document.uri;
    let index = LineIndex::new(source);
    let doc = ConfigDocument::new(source, kind, workspace.dictionary(kind));
    let variables = workspace.variables().snapshot();

    let mut actions = Vec::new();
    for lsp_diagnostic in &params.context.diagnostics {
        let Some(diagnostic) = from_lsp_diagnostic(lsp_diagnostic, &index) else {
            continue;
        };
        for fix in compute_quick_fixes(&doc, &diagnostic, &variables) {
            actions.push(CodeActionOrCommand::CodeAction(to_code_action(
                uri,
                fix,
                lsp_diagnostic,
                &index,
            )));
        }
    }

    tracing::debug!("{} quick fixes for {}", actions.len(), uri.as_str());

    (!actions.is_empty()).then_some(actions)
}

#[allow(clippy::mutable_key_type)]
fn to_code_action(
    uri: &Uri,
    fix: QuickFix,
    diagnostic: &lsp_types::Diagnostic,
    index: &LineIndex<'_>,
) -> CodeAction {
    let edit = TextEdit::new(index.range(fix.span), fix.replacement);
    let mut changes = HashMap::new();
    changes.insert(uri.clone(), vec![edit]);

    CodeAction {
        title: fix.title,
        kind: Some(CodeActionKind::QUICKFIX),
        diagnostics: Some(vec![diagnostic.clone()]),
        edit: Some(WorkspaceEdit {
            changes: Some(changes),
            document_changes: None,
            change_annotations: None,
        }),
        command: None,
        is_preferred: None,
        disabled: None,
        data: None,
    }
}
