//! Hover handler for displaying information about identifiers.
//!
//! Provides hover information for:
//! - Keys: description and documented default
//! - Values: the owning key's description
//! - `${name}` references: the resolved value

use lsp_types::{Hover, HoverContents, HoverParams, MarkupContent, MarkupKind};
use srvconf_core::{DocumentKind, VariableSnapshot, Workspace};
use srvconf_parser::{ConfigDocument, Span, TokenKind, VariableForm};

use super::guarded;
use super::utils::LineIndex;

/// Hover text and the span it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverInfo {
    /// Markdown content.
    pub contents: String,
    /// The identifier the content describes.
    pub span: Span,
}

/// Compute hover information for the cursor at byte `offset`.
pub fn compute_hover(
    doc: &ConfigDocument<'_>,
    offset: usize,
    variables: &VariableSnapshot,
) -> Option<HoverInfo> {
    guarded("hover", || hover_at(doc, offset, variables))
}

fn hover_at(
    doc: &ConfigDocument<'_>,
    offset: usize,
    variables: &VariableSnapshot,
) -> Option<HoverInfo> {
    let token = doc.token_at(offset)?;

    let contents = match token.kind {
        TokenKind::Key => {
            let entry = doc.entry(token.raw_text)?;
            let mut contents = entry.description.clone();
            if let Some(default) = &entry.default_value {
                if !contents.is_empty() {
                    contents.push_str("\n\n");
                }
                contents.push_str(&format!("Default: {default}"));
            }
            contents
        }
        TokenKind::Value => {
            if token.raw_text.is_empty() {
                return None;
            }
            doc.entry(token.owner_key?)?.description.clone()
        }
        TokenKind::Variable(VariableForm::Delimited) => {
            let value = variables.resolve(token.raw_text)?;
            format!("{} = {}", token.raw_text, value)
        }
        TokenKind::Variable(_) => return None,
    };

    (!contents.is_empty()).then_some(HoverInfo {
        contents,
        span: token.span,
    })
}

/// Handle a hover request.
pub fn handle_hover(
    params: &HoverParams,
    source: &str,
    kind: DocumentKind,
    workspace: &Workspace,
) -> Option<Hover> {
    let position = params.text_document_position_params.position;
    let index = LineIndex::new(source);
    let offset = index.position_to_offset(position)?;

    let doc = ConfigDocument::new(source, kind, workspace.dictionary(kind));
    let info = compute_hover(&doc, offset, &workspace.variables().snapshot())?;

    tracing::debug!("Hover at {:?}: {:?}", position, info.contents);

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: info.contents,
        }),
        range: Some(index.range(info.span)),
    })
}
