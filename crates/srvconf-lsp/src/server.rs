//! Main LSP server implementation.

use std::path::PathBuf;
use std::sync::Arc;

use lsp_server::Connection;
use lsp_types::{
    CodeActionKind, CodeActionOptions, CodeActionProviderCapability, CompletionOptions,
    HoverProviderCapability, InitializeParams, InitializeResult, SaveOptions, ServerCapabilities,
    ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind, TextDocumentSyncOptions,
    TextDocumentSyncSaveOptions,
};
use srvconf_core::Workspace;
use srvconf_loader::{builtin_schema, load_schema, WorkspaceScanner};

use crate::config::ServerConfig;
use crate::handlers::utils::uri_to_path;
use crate::main_loop::run_main_loop;

/// The LSP server.
pub struct Server {
    /// Connection to the LSP client.
    connection: Connection,
    /// Initialize parameters from client.
    init_params: InitializeParams,
}

impl Server {
    /// Create a new LSP server from a connection.
    pub fn new(connection: Connection, init_params: InitializeParams) -> Self {
        Self {
            connection,
            init_params,
        }
    }

    /// Load the workspace and run the main loop until `exit`.
    ///
    /// Returns whether the client shut the server down cleanly.
    pub fn run(self) -> bool {
        tracing::info!("Starting srvconf language server v{}", crate::VERSION);

        let options = self.init_params.initialization_options.clone();
        let config = ServerConfig::from_initialization_options(options);
        let workspace = Arc::new(build_workspace(&self.init_params, &config));

        let clean = run_main_loop(
            &self.connection.receiver,
            self.connection.sender,
            workspace,
            config,
        );

        tracing::info!("Server shutdown complete");
        clean
    }
}

/// The workspace root announced by the client.
pub fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    if let Some(folder) = params.workspace_folders.as_ref().and_then(|f| f.first()) {
        return uri_to_path(&folder.uri);
    }
    #[allow(deprecated)]
    let root_uri = params.root_uri.as_ref();
    root_uri.and_then(uri_to_path)
}

/// Load the schema and scan the workspace root for variables.
pub fn build_workspace(params: &InitializeParams, config: &ServerConfig) -> Workspace {
    let schema = match &config.schema_path {
        Some(path) => load_schema(path).unwrap_or_else(|e| {
            tracing::warn!("{}, using the built-in schema", e);
            builtin_schema()
        }),
        None => builtin_schema(),
    };

    let workspace = Workspace::new(schema);
    match workspace_root(params) {
        Some(root) => workspace.init(&root, &WorkspaceScanner::new()),
        None => tracing::info!("No workspace root, variables are unavailable"),
    }
    workspace
}

/// Capabilities advertised in the `initialize` response.
pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                    include_text: Some(false),
                })),
                ..Default::default()
            },
        )),
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(vec![
                "$".to_string(), // Variable start
                "{".to_string(), // Inside ${
                "=".to_string(), // Property value
                ",".to_string(), // Next comma-separated value
                ".".to_string(), // Dotted names
            ]),
            ..Default::default()
        }),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        code_action_provider: Some(CodeActionProviderCapability::Options(CodeActionOptions {
            code_action_kinds: Some(vec![CodeActionKind::QUICKFIX]),
            ..Default::default()
        })),
        ..Default::default()
    }
}

/// Start the LSP server using stdio transport.
///
/// Returns whether the client shut the server down cleanly.
pub fn start_stdio() -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
    tracing::info!("Starting LSP server on stdio");

    let (connection, io_threads) = Connection::stdio();

    let (id, params) = connection.initialize_start()?;
    let init_params: InitializeParams = serde_json::from_value(params)?;

    let init_result = InitializeResult {
        capabilities: server_capabilities(),
        server_info: Some(ServerInfo {
            name: "srvconf-lsp".to_string(),
            version: Some(crate::VERSION.to_string()),
        }),
    };

    connection.initialize_finish(id, serde_json::to_value(init_result)?)?;

    tracing::info!("LSP initialized successfully");

    let clean = Server::new(connection, init_params).run();

    io_threads.join()?;

    Ok(clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::{Uri, WorkspaceFolder};

    #[test]
    fn test_workspace_root_prefers_folders() {
        let uri: Uri = "file:///ws/app".parse().unwrap();
        let params = InitializeParams {
            workspace_folders: Some(vec![WorkspaceFolder {
                uri,
                name: "app".to_string(),
            }]),
            ..Default::default()
        };
        assert_eq!(workspace_root(&params), Some(PathBuf::from("/ws/app")));
        assert_eq!(workspace_root(&InitializeParams::default()), None);
    }

    #[test]
    fn test_capabilities() {
        let caps = server_capabilities();
        assert!(caps.completion_provider.is_some());
        assert!(caps.hover_provider.is_some());
        assert!(caps.code_action_provider.is_some());
    }
}
