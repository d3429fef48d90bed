//! Document-level diagnostic tests.

use proptest::prelude::*;
use srvconf_core::{DocumentKind, Schema, SourceId, Workspace};
use srvconf_validate::{validate_source, DiagnosticCode, ValidationOptions};

fn workspace_with(vars: &[(&str, &str)]) -> Workspace {
    let workspace = Workspace::new(Schema::default());
    workspace.variables().replace_source_entries(
        SourceId::new("server.xml"),
        vars.iter().map(|(k, v)| (*k, *v)),
    );
    workspace
}

#[test]
fn test_two_unknown_variables_one_per_occurrence() {
    let workspace = workspace_with(&[("default.http.port", "9080"), ("default.https.port", "9443")]);
    let source = r#"<server>
    <httpEndpoint id="defaultHttpEndpoint"
                  httpPort="${default.httpsl.port}"
                  httpsPort="${default.httpsj.port}" />
</server>"#;

    let diags = validate_source(
        source,
        DocumentKind::ServerXml,
        &workspace,
        &ValidationOptions::default(),
    );

    assert_eq!(diags.len(), 2);
    assert!(diags
        .iter()
        .all(|d| d.code == DiagnosticCode::UnknownVariable));
    assert_eq!(diags[0].payload, "default.httpsl.port");
    assert_eq!(
        diags[0].message,
        "ERROR: The variable \"default.httpsl.port\" does not exist."
    );
    assert_eq!(diags[1].payload, "default.httpsj.port");
    assert_eq!(
        diags[1].message,
        "ERROR: The variable \"default.httpsj.port\" does not exist."
    );
}

#[test]
fn test_validation_follows_store_updates() {
    let workspace = workspace_with(&[]);
    let source = r#"<a p="${late.var}"/>"#;
    let options = ValidationOptions::default();

    assert_eq!(
        validate_source(source, DocumentKind::ServerXml, &workspace, &options).len(),
        1
    );
    workspace
        .variables()
        .replace_source_entries(SourceId::new("server.env"), [("late.var", "1")]);
    assert!(validate_source(source, DocumentKind::ServerXml, &workspace, &options).is_empty());
}

proptest! {
    #[test]
    fn variable_ranges_cover_the_reference(
        names in prop::collection::vec("[a-z]{1,6}(\\.[a-z]{1,6}){0,2}", 1..6),
    ) {
        let source: String = names
            .iter()
            .map(|n| format!("<v a=\"x ${{{n}}} y\"/>\n"))
            .collect();
        let workspace = workspace_with(&[]);
        let diags = validate_source(
            &source,
            DocumentKind::ServerXml,
            &workspace,
            &ValidationOptions::default(),
        );
        prop_assert_eq!(diags.len(), names.len());
        for diag in &diags {
            prop_assert!(diag.span.start <= diag.span.end);
            prop_assert_eq!(diag.span.text(&source), format!("${{{}}}", diag.payload));
        }
    }
}
