//! Integration tests for schema loading and variable discovery.

use std::fs;
use std::path::Path;

use srvconf_core::{SourceId, VariableDiscovery, Workspace};
use srvconf_loader::{builtin_schema, load_schema, read_source, source_id, LoadError, WorkspaceScanner};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn liberty_layout() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "src/main/liberty/config/server.xml",
        r#"<server>
    <variable name="default.http.port" defaultValue="9080"/>
    <variable name="app.name" value="from-server-xml"/>
</server>"#,
    );
    write(
        root,
        "src/main/liberty/config/configDropins/defaults/ports.xml",
        r#"<server><variable name="default.https.port" value="9443"/></server>"#,
    );
    write(
        root,
        "src/main/liberty/config/configDropins/overrides/app.xml",
        r#"<server><variable name="app.name" value="from-override"/></server>"#,
    );
    write(
        root,
        "src/main/liberty/config/bootstrap.properties",
        "app.name=from-bootstrap\ntrace.level=fine\n",
    );
    write(
        root,
        "src/main/liberty/config/server.env",
        "WLP_DEBUG_ADDRESS=7778\n",
    );
    write(root, ".git/server.xml", r#"<server><variable name="hidden" value="x"/></server>"#);
    write(root, "pom.xml", r#"<project><variable name="ignored" value="x"/></project>"#);
    dir
}

#[test]
fn test_scan_orders_sources_by_precedence() {
    let dir = liberty_layout();
    let sources = WorkspaceScanner::new().scan(dir.path()).unwrap();

    let names: Vec<String> = sources
        .iter()
        .map(|s| {
            Path::new(s.id.as_str())
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    assert_eq!(
        names,
        vec![
            "ports.xml",
            "server.env",
            "bootstrap.properties",
            "server.xml",
            "app.xml"
        ]
    );
}

#[test]
fn test_workspace_init_applies_overrides() {
    let dir = liberty_layout();
    let workspace = Workspace::new(builtin_schema());
    workspace.init(dir.path(), &WorkspaceScanner::new());

    let store = workspace.variables();
    assert_eq!(store.resolve("default.http.port").as_deref(), Some("9080"));
    assert_eq!(store.resolve("default.https.port").as_deref(), Some("9443"));
    assert_eq!(store.resolve("app.name").as_deref(), Some("from-override"));
    assert_eq!(store.resolve("trace.level").as_deref(), Some("fine"));
    assert_eq!(store.resolve("env.WLP_DEBUG_ADDRESS").as_deref(), Some("7778"));
    assert_eq!(store.resolve("hidden"), None);
    assert_eq!(store.resolve("ignored"), None);
}

#[test]
fn test_refresh_single_source_after_edit() {
    let dir = liberty_layout();
    let workspace = Workspace::new(builtin_schema());
    workspace.init(dir.path(), &WorkspaceScanner::new());

    let server_xml = dir.path().join("src/main/liberty/config/server.xml");
    fs::write(
        &server_xml,
        r#"<server><variable name="default.http.port" value="9181"/></server>"#,
    )
    .unwrap();
    let source = read_source(&server_xml).unwrap().unwrap();
    workspace.refresh_source(source);

    let store = workspace.variables();
    assert_eq!(store.resolve("default.http.port").as_deref(), Some("9181"));
    // The override dropin still outranks the edited server.xml.
    assert_eq!(store.resolve("app.name").as_deref(), Some("from-override"));
}

#[test]
fn test_removed_source_drops_its_variables() {
    let dir = liberty_layout();
    let workspace = Workspace::new(builtin_schema());
    workspace.init(dir.path(), &WorkspaceScanner::new());

    let dropin = dir
        .path()
        .join("src/main/liberty/config/configDropins/defaults/ports.xml");
    workspace.remove_source(&source_id(&dropin));
    assert_eq!(workspace.variables().resolve("default.https.port"), None);
}

#[test]
fn test_included_fragments_declare_variables() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "config/server.xml",
        r#"<server>
    <include location="includes/db.xml"/>
    <variable name="db.user" value="from-server-xml"/>
</server>"#,
    );
    write(
        root,
        "config/includes/db.xml",
        r#"<server>
    <variable name="db.port" defaultValue="50000"/>
    <variable name="db.user" value="from-fragment"/>
</server>"#,
    );
    write(root, "build.xml", r#"<project><variable name="ant.only" value="x"/></project>"#);
    write(
        root,
        "target/liberty/wlp/usr/servers/app/server.xml",
        r#"<server><variable name="db.port" value="1"/></server>"#,
    );

    let files = WorkspaceScanner::new().source_files(root).unwrap();
    assert_eq!(
        files,
        vec![
            root.join("config/includes/db.xml"),
            root.join("config/server.xml")
        ]
    );

    let workspace = Workspace::new(builtin_schema());
    workspace.init(root, &WorkspaceScanner::new());
    let store = workspace.variables();
    assert_eq!(store.resolve("db.port").as_deref(), Some("50000"));
    assert_eq!(store.resolve("db.user").as_deref(), Some("from-server-xml"));
    assert_eq!(store.resolve("ant.only"), None);

    let fragment = read_source(&root.join("config/includes/db.xml")).unwrap();
    assert!(fragment.is_some());
}

#[test]
fn test_read_source_ignores_unrelated_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "notes.txt", "a=b\n");
    write(dir.path(), "pom.xml", "<project/>");
    assert!(read_source(&dir.path().join("notes.txt")).unwrap().is_none());
    assert!(read_source(&dir.path().join("pom.xml")).unwrap().is_none());
}

#[test]
fn test_missing_root_yields_no_sources() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    assert!(matches!(
        WorkspaceScanner::new().scan(&missing),
        Err(LoadError::Walk(_))
    ));
    assert!(WorkspaceScanner::new().variable_sources(&missing).is_empty());
}

#[test]
fn test_load_schema_file() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "schema.json",
        r#"{
  "properties": [
    { "name": "custom.level", "description": "Level.", "allowedValues": ["low", "high"] }
  ]
}"#,
    );
    let schema = load_schema(&dir.path().join("schema.json")).unwrap();
    assert_eq!(schema.properties.len(), 1);
    assert!(schema.environment.is_empty());
    assert!(schema.properties.lookup("custom.level").is_some());

    let err = load_schema(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

#[test]
fn test_source_ids_are_stable() {
    let path = Path::new("/ws/server.xml");
    assert_eq!(source_id(path), SourceId::new("/ws/server.xml"));
}
