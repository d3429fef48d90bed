//! Completion handler for autocompletion.
//!
//! Provides context-aware completions for:
//! - Keys of `bootstrap.properties` and `server.env` (prefix match)
//! - Enumerated values, including comma-separated continuation (prefix match)
//! - `${name}` variable references (substring match)

use lsp_types::{
    CompletionItem, CompletionItemKind, CompletionParams, CompletionResponse, CompletionTextEdit,
    Documentation, MarkupContent, MarkupKind, TextEdit,
};
use srvconf_core::{DocumentKind, IdentifierEntry, MatchMode, Ranker, VariableSnapshot, Workspace};
use srvconf_parser::properties::ValueSegment;
use srvconf_parser::{ConfigDocument, Span, Token, TokenKind};

use super::guarded;
use super::utils::LineIndex;

/// What a completion candidate inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// A property or environment key.
    Key,
    /// An allowed value.
    Value,
    /// A `${name}` variable reference.
    Variable,
}

/// One completion suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCandidate {
    /// Text shown in the list.
    pub label: String,
    /// Text replacing `span`.
    pub insert_text: String,
    /// Markdown documentation.
    pub documentation: Option<String>,
    /// The region the insert text replaces.
    pub span: Span,
    /// Whether this is the default choice.
    pub preselect: bool,
    /// Candidate kind.
    pub kind: CandidateKind,
}

/// Compute completions for the cursor at byte `offset`.
///
/// Results are ordered; at most one value candidate is preselected.
pub fn compute_completions(
    doc: &ConfigDocument<'_>,
    offset: usize,
    variables: &VariableSnapshot,
) -> Vec<CompletionCandidate> {
    guarded("completion", || completions_at(doc, offset, variables))
}

fn completions_at(
    doc: &ConfigDocument<'_>,
    offset: usize,
    variables: &VariableSnapshot,
) -> Vec<CompletionCandidate> {
    let Some(token) = doc.token_at(offset) else {
        return Vec::new();
    };
    let fragment = fragment_before(doc.source(), &token, offset);

    tracing::debug!("Completion for {:?} with fragment {:?}", token.kind, fragment);

    match token.kind {
        TokenKind::Key => complete_key(doc, &token, fragment),
        TokenKind::Value => complete_value(doc, &token, offset, fragment),
        TokenKind::Variable(_) => complete_variable(&token, fragment, variables),
    }
}

/// The typed text of a token up to the cursor, trimmed.
fn fragment_before<'a>(source: &'a str, token: &Token<'_>, offset: usize) -> &'a str {
    let start = token.text_span.start;
    let end = offset.clamp(start, token.text_span.end);
    source[start..end].trim()
}

fn describe(entry: &IdentifierEntry) -> Option<String> {
    (!entry.description.is_empty()).then(|| entry.description.clone())
}

fn complete_key(
    doc: &ConfigDocument<'_>,
    token: &Token<'_>,
    fragment: &str,
) -> Vec<CompletionCandidate> {
    let Some(dictionary) = doc.dictionary() else {
        return Vec::new();
    };

    Ranker::new(MatchMode::Prefix)
        .rank(fragment, dictionary.iter())
        .into_iter()
        .map(|ranked| CompletionCandidate {
            label: ranked.candidate.name.clone(),
            insert_text: ranked.candidate.name.clone(),
            documentation: describe(ranked.candidate),
            span: token.span,
            preselect: false,
            kind: CandidateKind::Key,
        })
        .collect()
}

fn complete_value(
    doc: &ConfigDocument<'_>,
    token: &Token<'_>,
    offset: usize,
    fragment: &str,
) -> Vec<CompletionCandidate> {
    let Some(entry) = token.owner_key.and_then(|key| doc.entry(key)) else {
        return Vec::new();
    };
    if entry.is_free_form() {
        return Vec::new();
    }
    let documentation = describe(entry);

    if !entry.allows_multiple {
        return Ranker::new(MatchMode::Prefix)
            .preselecting_default()
            .rank(fragment, entry.allowed_values.iter())
            .into_iter()
            .map(|ranked| CompletionCandidate {
                label: ranked.candidate.clone(),
                insert_text: ranked.candidate.clone(),
                documentation: documentation.clone(),
                span: token.span,
                preselect: ranked.preselect,
                kind: CandidateKind::Value,
            })
            .collect();
    }

    let Some(line) = doc.property_line_at(offset) else {
        return Vec::new();
    };
    let segments: Vec<ValueSegment> = line.segments().collect();
    let Some(current) = segments.iter().position(|s| s.raw.touches(offset)) else {
        return Vec::new();
    };

    let source = doc.source();
    let text = |segment: &ValueSegment| segment.span.text(source);
    if let Some(invalid) = segments[..current]
        .iter()
        .map(text)
        .find(|value| !value.is_empty() && !entry.allows_value(value))
    {
        tracing::debug!("No value completion after invalid value {:?}", invalid);
        return Vec::new();
    }

    let segment = segments[current];
    let field_start = line
        .value_span()
        .map_or(segment.raw.start, |span| span.start.min(segment.raw.start));
    let typed = &source[field_start..segment.raw.start];
    let replace = Span::new(field_start, segment.span.end.max(offset));

    let others = segments
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != current)
        .map(|(_, s)| text(s));

    Ranker::new(MatchMode::Prefix)
        .excluding(others)
        .preselecting_default()
        .rank(fragment, entry.allowed_values.iter())
        .into_iter()
        .map(|ranked| {
            let rendered = format!("{typed}{}", ranked.candidate);
            CompletionCandidate {
                label: rendered.clone(),
                insert_text: rendered,
                documentation: documentation.clone(),
                span: replace,
                preselect: ranked.preselect,
                kind: CandidateKind::Value,
            }
        })
        .collect()
}

fn complete_variable(
    token: &Token<'_>,
    fragment: &str,
    variables: &VariableSnapshot,
) -> Vec<CompletionCandidate> {
    variables
        .search_by_fragment(fragment)
        .map(|var| {
            let reference = format!("${{{}}}", var.name);
            CompletionCandidate {
                label: reference.clone(),
                insert_text: reference,
                documentation: Some(format!("{} = {}", var.name, var.value)),
                span: token.span,
                preselect: false,
                kind: CandidateKind::Variable,
            }
        })
        .collect()
}

/// Handle a completion request.
pub fn handle_completion(
    params: &CompletionParams,
    source: &str,
    kind: DocumentKind,
    workspace: &Workspace,
) -> Option<CompletionResponse> {
    let position = params.text_document_position.position;
    let index = LineIndex::new(source);
    let offset = index.position_to_offset(position)?;

    let doc = ConfigDocument::new(source, kind, workspace.dictionary(kind));
    let variables = workspace.variables().snapshot();
    let candidates = compute_completions(&doc, offset, &variables);

    tracing::debug!("{} completions at {:?}", candidates.len(), position);

    if candidates.is_empty() {
        return None;
    }
    let items = candidates
        .into_iter()
        .enumerate()
        .map(|(rank, candidate)| to_completion_item(rank, candidate, &index))
        .collect();
    Some(CompletionResponse::Array(items))
}

fn to_completion_item(
    rank: usize,
    candidate: CompletionCandidate,
    index: &LineIndex<'_>,
) -> CompletionItem {
    let kind = match candidate.kind {
        CandidateKind::Key => CompletionItemKind::PROPERTY,
        CandidateKind::Value => CompletionItemKind::TEXT,
        CandidateKind::Variable => CompletionItemKind::VALUE,
    };
    CompletionItem {
        label: candidate.label,
        kind: Some(kind),
        documentation: candidate.documentation.map(|value| {
            Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value,
            })
        }),
        preselect: candidate.preselect.then_some(true),
        // Clients sort by label otherwise.
        sort_text: Some(format!("{rank:04}")),
        text_edit: Some(CompletionTextEdit::Edit(TextEdit::new(
            index.range(candidate.span),
            candidate.insert_text,
        ))),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use srvconf_core::{Dictionary, SourceId, VariableStore};

    fn dictionary() -> Dictionary {
        Dictionary::from_entries([
            IdentifierEntry::new("com.ibm.ws.logging.console.format", "Console format")
                .with_allowed_values(["DEV", "SIMPLE", "JSON"]),
            IdentifierEntry::new("com.ibm.ws.logging.console.log.level", "Console level")
                .with_allowed_values(["AUDIT", "INFO", "WARNING", "ERROR", "OFF"]),
            IdentifierEntry::new("com.ibm.ws.logging.console.source", "Console sources")
                .with_allowed_values(["accessLog", "message", "ffdc", "audit", "trace"])
                .with_multiple_values(),
            IdentifierEntry::new("com.ibm.ws.logging.log.directory", "Log directory"),
        ])
    }

    fn variables() -> VariableStore {
        let store = VariableStore::new();
        store.replace_source_entries(
            SourceId::new("server.xml"),
            [
                ("default.http.port", "9080"),
                ("default.https.port", "9443"),
                ("app.context.root", "/app"),
            ],
        );
        store
    }

    fn complete(source: &str, kind: DocumentKind) -> Vec<CompletionCandidate> {
        let dict = dictionary();
        let offset = source.find('|').unwrap();
        let text = source.replacen('|', "", 1);
        let doc = ConfigDocument::new(&text, kind, Some(&dict));
        compute_completions(&doc, offset, &variables().snapshot())
    }

    fn labels(items: &[CompletionCandidate]) -> Vec<&str> {
        items.iter().map(|c| c.label.as_str()).collect()
    }

    #[test]
    fn test_key_prefix() {
        let items = complete("com.ibm.ws.logging.console.|", DocumentKind::BootstrapProperties);
        assert_eq!(
            labels(&items),
            vec![
                "com.ibm.ws.logging.console.format",
                "com.ibm.ws.logging.console.log.level",
                "com.ibm.ws.logging.console.source",
            ]
        );
        assert!(items.iter().all(|c| c.kind == CandidateKind::Key && !c.preselect));
        assert_eq!(items[0].span, Span::new(0, 27));
    }

    #[test]
    fn test_empty_line_offers_every_key() {
        let items = complete("|", DocumentKind::BootstrapProperties);
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].span, Span::empty(0));
    }

    #[test]
    fn test_value_preselects_canonical_first() {
        let items = complete(
            "com.ibm.ws.logging.console.log.level=|",
            DocumentKind::BootstrapProperties,
        );
        assert_eq!(labels(&items), vec!["AUDIT", "INFO", "WARNING", "ERROR", "OFF"]);
        assert_eq!(items.iter().filter(|c| c.preselect).count(), 1);
        assert!(items[0].preselect);
        assert_eq!(items[0].documentation.as_deref(), Some("Console level"));
    }

    #[test]
    fn test_value_prefix_filters() {
        let items = complete(
            "com.ibm.ws.logging.console.format=s|",
            DocumentKind::BootstrapProperties,
        );
        assert_eq!(labels(&items), vec!["SIMPLE"]);
        assert!(items[0].preselect);
        assert_eq!(items[0].span, Span::new(34, 35));
    }

    #[test]
    fn test_free_form_value_has_no_completions() {
        let items = complete(
            "com.ibm.ws.logging.log.directory=|",
            DocumentKind::BootstrapProperties,
        );
        assert!(items.is_empty());
    }

    #[test]
    fn test_multi_value_continuation() {
        let source = "com.ibm.ws.logging.console.source=trace,|";
        let items = complete(source, DocumentKind::BootstrapProperties);
        assert_eq!(
            labels(&items),
            vec![
                "trace,accessLog",
                "trace,message",
                "trace,ffdc",
                "trace,audit"
            ]
        );
        assert!(items[0].preselect);
        assert_eq!(items.iter().filter(|c| c.preselect).count(), 1);
        // Replaces the whole field typed so far.
        assert_eq!(items[0].span, Span::new(34, 40));
    }

    #[test]
    fn test_multi_value_excludes_case_insensitively() {
        let items = complete(
            "com.ibm.ws.logging.console.source=ACCESSLOG, message ,|",
            DocumentKind::BootstrapProperties,
        );
        assert_eq!(
            labels(&items),
            vec![
                "ACCESSLOG, message ,ffdc",
                "ACCESSLOG, message ,audit",
                "ACCESSLOG, message ,trace"
            ]
        );
    }

    #[test]
    fn test_multi_value_stops_after_invalid_value() {
        let items = complete(
            "com.ibm.ws.logging.console.source=bogus,|",
            DocumentKind::BootstrapProperties,
        );
        assert!(items.is_empty());
    }

    #[test]
    fn test_multi_value_first_segment() {
        let items = complete(
            "com.ibm.ws.logging.console.source=a|,trace",
            DocumentKind::BootstrapProperties,
        );
        assert_eq!(labels(&items), vec!["accessLog", "audit"]);
        assert!(items[0].preselect);
    }

    #[test]
    fn test_first_segment_excludes_later_values() {
        let items = complete(
            "com.ibm.ws.logging.console.source=|,trace",
            DocumentKind::BootstrapProperties,
        );
        assert_eq!(labels(&items), vec!["accessLog", "message", "ffdc", "audit"]);
        assert_eq!(items[0].span, Span::new(34, 34));
        assert!(items[0].preselect);

        let items = complete(
            "com.ibm.ws.logging.console.source=t|,trace",
            DocumentKind::BootstrapProperties,
        );
        assert!(items.is_empty());
    }

    #[test]
    fn test_variable_substring() {
        let items = complete(r#"<e port="${http|}"/>"#, DocumentKind::ServerXml);
        assert_eq!(
            labels(&items),
            vec!["${default.http.port}", "${default.https.port}"]
        );
        assert_eq!(
            items[0].documentation.as_deref(),
            Some("default.http.port = 9080")
        );
        assert!(items.iter().all(|c| c.kind == CandidateKind::Variable));
        assert_eq!(items[0].span, Span::new(9, 16));
    }

    #[test]
    fn test_unterminated_variable_ends_at_cursor() {
        let items = complete(r#"<e port="${app|"/>"#, DocumentKind::ServerXml);
        assert_eq!(labels(&items), vec!["${app.context.root}"]);
        assert_eq!(items[0].span, Span::new(9, 14));
    }

    #[test]
    fn test_bare_attribute_value() {
        let items = complete(r#"<e port="default|"/>"#, DocumentKind::ServerXml);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].insert_text, "${default.http.port}");
        assert_eq!(items[0].span, Span::new(9, 16));
    }

    #[test]
    fn test_completions_are_idempotent() {
        let source = "com.ibm.ws.logging.console.source=trace,|";
        let first = complete(source, DocumentKind::BootstrapProperties);
        let second = complete(source, DocumentKind::BootstrapProperties);
        assert_eq!(first, second);
    }
}
