//! Main event loop for the LSP server.
//!
//! - Notifications are handled synchronously, in order
//! - Requests are answered from the current document and variable state
//! - Revalidating every open document after a variable source changes runs
//!   in the background and stops as soon as a newer edit arrives

use std::path::Path;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use lsp_types::notification::{
    DidChangeTextDocument, DidChangeWatchedFiles, DidCloseTextDocument, DidOpenTextDocument,
    DidSaveTextDocument, Exit, Initialized, Notification, PublishDiagnostics,
};
use lsp_types::request::{
    CodeActionRequest, Completion, HoverRequest, RegisterCapability, Request, Shutdown,
};
use lsp_types::{
    CodeActionParams, CompletionParams, DidChangeTextDocumentParams,
    DidChangeWatchedFilesParams, DidChangeWatchedFilesRegistrationOptions,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, DidSaveTextDocumentParams,
    FileChangeType, FileSystemWatcher, GlobPattern, HoverParams, PublishDiagnosticsParams,
    Registration, RegistrationParams, Uri, WatchKind,
};
use parking_lot::RwLock;
use srvconf_core::{DiscoveredSource, DocumentKind, Workspace};
use srvconf_loader::{
    is_variable_source, precedence_key, read_source, source_id, variables_from_text,
    WorkspaceScanner,
};
use srvconf_validate::ValidationOptions;

use crate::config::ServerConfig;
use crate::handlers::code_actions::handle_code_actions;
use crate::handlers::completion::handle_completion;
use crate::handlers::diagnostics::document_diagnostics;
use crate::handlers::hover::handle_hover;
use crate::handlers::utils::uri_to_path;
use crate::snapshot::{Revision, Snapshot};
use crate::vfs::Vfs;

/// Files that declare workspace variables.
const WATCHED_GLOBS: &[&str] = &["**/*.xml", "**/server.env", "**/bootstrap.properties"];

/// State managed by the main loop.
pub struct MainLoopState {
    /// Virtual file system for open documents.
    pub vfs: Arc<RwLock<Vfs>>,
    /// Schema and variables of the workspace.
    pub workspace: Arc<Workspace>,
    /// Client-supplied settings.
    pub config: ServerConfig,
    /// Sender for outgoing LSP messages.
    pub sender: Sender<lsp_server::Message>,
    /// Bumped on every document or variable change.
    pub revision: Revision,
    /// Whether shutdown was requested.
    pub shutdown_requested: bool,
    exit_requested: bool,
    scanner: WorkspaceScanner,
}

impl MainLoopState {
    /// Create a new main loop state.
    pub fn new(
        sender: Sender<lsp_server::Message>,
        workspace: Arc<Workspace>,
        config: ServerConfig,
    ) -> Self {
        Self {
            vfs: Arc::new(RwLock::new(Vfs::new())),
            workspace,
            config,
            sender,
            revision: Revision::new(),
            shutdown_requested: false,
            exit_requested: false,
            scanner: WorkspaceScanner::new(),
        }
    }

    fn validation_options(&self) -> ValidationOptions {
        self.config.validation_options()
    }

    /// Text and kind of an open, recognized document.
    fn document_data(&self, uri: &Uri) -> Option<(String, DocumentKind)> {
        self.vfs.read().document_data(uri)
    }

    /// Handle an LSP message.
    pub fn handle_message(&mut self, msg: lsp_server::Message) {
        match msg {
            lsp_server::Message::Request(req) => self.handle_request(req),
            lsp_server::Message::Notification(notif) => self.handle_notification(notif),
            lsp_server::Message::Response(resp) => {
                if let Some(err) = resp.error {
                    tracing::warn!("Client rejected request {}: {}", resp.id, err.message);
                }
            }
        }
    }

    /// Handle an LSP request (expects response).
    fn handle_request(&mut self, req: lsp_server::Request) {
        let id = req.id.clone();

        let result = match req.method.as_str() {
            Shutdown::METHOD => {
                self.shutdown_requested = true;
                Ok(serde_json::Value::Null)
            }
            Completion::METHOD => self.handle_completion_request(req),
            HoverRequest::METHOD => self.handle_hover_request(req),
            CodeActionRequest::METHOD => self.handle_code_action_request(req),
            _ => {
                tracing::warn!("Unhandled request: {}", req.method);
                Err(format!("Unhandled request: {}", req.method))
            }
        };

        let response = match result {
            Ok(value) => lsp_server::Response::new_ok(id, value),
            Err(msg) => {
                // MethodNotFound only for unknown methods, InternalError for handler failures
                let error_code = if msg.starts_with("Unhandled request") {
                    lsp_server::ErrorCode::MethodNotFound
                } else {
                    lsp_server::ErrorCode::InternalError
                };
                lsp_server::Response::new_err(id, error_code as i32, msg)
            }
        };

        self.send(lsp_server::Message::Response(response));
    }

    /// Handle the textDocument/completion request.
    fn handle_completion_request(
        &self,
        req: lsp_server::Request,
    ) -> Result<serde_json::Value, String> {
        let params: CompletionParams =
            serde_json::from_value(req.params).map_err(|e| e.to_string())?;

        let uri = &params.text_document_position.text_document.uri;
        let Some((text, kind)) = self.document_data(uri) else {
            return Ok(serde_json::Value::Null);
        };

        let response = handle_completion(&params, &text, kind, &self.workspace);

        serde_json::to_value(response).map_err(|e| e.to_string())
    }

    /// Handle the textDocument/hover request.
    fn handle_hover_request(&self, req: lsp_server::Request) -> Result<serde_json::Value, String> {
        let params: HoverParams = serde_json::from_value(req.params).map_err(|e| e.to_string())?;

        let uri = &params.text_document_position_params.text_document.uri;
        let Some((text, kind)) = self.document_data(uri) else {
            return Ok(serde_json::Value::Null);
        };

        let response = handle_hover(&params, &text, kind, &self.workspace);

        serde_json::to_value(response).map_err(|e| e.to_string())
    }

    /// Handle the textDocument/codeAction request.
    fn handle_code_action_request(
        &self,
        req: lsp_server::Request,
    ) -> Result<serde_json::Value, String> {
        let params: CodeActionParams =
            serde_json::from_value(req.params).map_err(|e| e.to_string())?;

        let uri = &params.text_document.uri;
        let Some((text, kind)) = self.document_data(uri) else {
            return Ok(serde_json::Value::Null);
        };

        let response = handle_code_actions(&params, &text, kind, &self.workspace);

        serde_json::to_value(response).map_err(|e| e.to_string())
    }

    /// Handle an LSP notification (no response expected).
    fn handle_notification(&mut self, notif: lsp_server::Notification) {
        match notif.method.as_str() {
            DidOpenTextDocument::METHOD => {
                if let Ok(params) =
                    serde_json::from_value::<DidOpenTextDocumentParams>(notif.params)
                {
                    self.on_did_open(params);
                }
            }
            DidChangeTextDocument::METHOD => {
                if let Ok(params) =
                    serde_json::from_value::<DidChangeTextDocumentParams>(notif.params)
                {
                    self.on_did_change(params);
                }
            }
            DidSaveTextDocument::METHOD => {
                if let Ok(params) =
                    serde_json::from_value::<DidSaveTextDocumentParams>(notif.params)
                {
                    self.on_did_save(params);
                }
            }
            DidCloseTextDocument::METHOD => {
                if let Ok(params) =
                    serde_json::from_value::<DidCloseTextDocumentParams>(notif.params)
                {
                    self.on_did_close(params);
                }
            }
            DidChangeWatchedFiles::METHOD => {
                if let Ok(params) =
                    serde_json::from_value::<DidChangeWatchedFilesParams>(notif.params)
                {
                    self.on_did_change_watched_files(params);
                }
            }
            Initialized::METHOD => {
                tracing::info!("Client initialized");
                self.register_file_watchers();
            }
            Exit::METHOD => {
                tracing::info!("Exit notification received");
                self.exit_requested = true;
            }
            _ => {
                tracing::debug!("Unhandled notification: {}", notif.method);
            }
        }
    }

    /// Handle textDocument/didOpen notification.
    fn on_did_open(&mut self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let text = params.text_document.text;

        tracing::info!("Document opened: {}", uri.as_str());

        self.vfs
            .write()
            .open(uri.clone(), &text, params.text_document.version);
        self.revision.bump();

        self.publish_diagnostics(&uri);
    }

    /// Handle textDocument/didChange notification.
    fn on_did_change(&mut self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;

        // Full sync: the last change holds the whole content
        if let Some(change) = params.content_changes.into_iter().last() {
            tracing::debug!("Document changed: {}", uri.as_str());

            self.vfs
                .write()
                .update(&uri, &change.text, params.text_document.version);
            self.revision.bump();

            self.publish_diagnostics(&uri);
        }
    }

    /// Handle textDocument/didSave notification.
    ///
    /// Saving a file that declares variables refreshes its source.
    fn on_did_save(&mut self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        let Some(path) = uri_to_path(&uri) else {
            return;
        };
        if !is_variable_source(&path) {
            return;
        }
        let Some((text, kind)) = self.document_data(&uri) else {
            return;
        };

        tracing::info!("Variable source saved: {}", path.display());

        self.workspace.refresh_source_ranked(
            DiscoveredSource::new(source_id(&path), variables_from_text(&text, kind)),
            precedence_key,
        );
        self.revalidate_open_documents();
    }

    /// Handle textDocument/didClose notification.
    fn on_did_close(&mut self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;

        tracing::info!("Document closed: {}", uri.as_str());

        self.vfs.write().close(&uri);
        self.revision.bump();

        self.send_diagnostics(&uri, Vec::new());
    }

    /// Handle workspace/didChangeWatchedFiles notification.
    ///
    /// A changed file is rescanned alone; a created or deleted file
    /// triggers a full rescan of the workspace.
    fn on_did_change_watched_files(&mut self, params: DidChangeWatchedFilesParams) {
        tracing::info!("Watched files changed: {} files", params.changes.len());

        let mut refreshed = false;
        let mut rescan = false;
        for change in params.changes {
            let Some(path) = uri_to_path(&change.uri) else {
                continue;
            };
            if !is_variable_source(&path) {
                continue;
            }
            tracing::debug!("File {}: {:?}", path.display(), change.typ);

            if change.typ == FileChangeType::CHANGED {
                refreshed |= self.refresh_file(&path);
            } else {
                rescan = true;
            }
        }

        if rescan {
            match self.workspace.root() {
                Some(root) => {
                    self.workspace.init(&root, &self.scanner);
                    refreshed = true;
                }
                None => tracing::debug!("No workspace root, skipping rescan"),
            }
        }

        if refreshed {
            self.revalidate_open_documents();
        }
    }

    /// Reread one variable source from disk.
    fn refresh_file(&self, path: &Path) -> bool {
        match read_source(path) {
            Ok(Some(source)) => {
                self.workspace.refresh_source_ranked(source, precedence_key);
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("{}", e);
                false
            }
        }
    }

    /// Revalidate every open document in the background.
    ///
    /// The work is abandoned when a newer change arrives.
    fn revalidate_open_documents(&mut self) {
        self.revision.bump();
        let documents: Vec<(Uri, String, DocumentKind)> = self
            .vfs
            .read()
            .iter()
            .map(|(uri, text, kind)| (uri.clone(), text, kind))
            .collect();
        if documents.is_empty() {
            return;
        }

        let snapshot = self.revision.snapshot();
        let workspace = Arc::clone(&self.workspace);
        let options = self.validation_options();
        let sender = self.sender.clone();

        std::thread::spawn(move || {
            revalidate(&documents, &workspace, &options, &snapshot, &sender);
        });
    }

    /// Register file watchers with the client.
    fn register_file_watchers(&self) {
        let watchers = WATCHED_GLOBS
            .iter()
            .map(|glob| FileSystemWatcher {
                glob_pattern: GlobPattern::String((*glob).to_string()),
                kind: Some(WatchKind::all()),
            })
            .collect();

        let registration = Registration {
            id: "srvconf-file-watcher".to_string(),
            method: DidChangeWatchedFiles::METHOD.to_string(),
            register_options: Some(
                serde_json::to_value(DidChangeWatchedFilesRegistrationOptions { watchers })
                    .unwrap_or_default(),
            ),
        };

        let request = lsp_server::Request::new(
            lsp_server::RequestId::from("register-file-watchers".to_string()),
            RegisterCapability::METHOD.to_string(),
            RegistrationParams {
                registrations: vec![registration],
            },
        );

        self.send(lsp_server::Message::Request(request));
        tracing::info!("Registered file watchers for variable sources");
    }

    /// Validate an open document and publish its diagnostics.
    fn publish_diagnostics(&self, uri: &Uri) {
        let Some((text, kind)) = self.document_data(uri) else {
            return;
        };
        let diagnostics =
            document_diagnostics(&text, kind, &self.workspace, &self.validation_options());

        tracing::debug!(
            "Publishing {} diagnostics for {}",
            diagnostics.len(),
            uri.as_str()
        );

        self.send_diagnostics(uri, diagnostics);
    }

    fn send_diagnostics(&self, uri: &Uri, diagnostics: Vec<lsp_types::Diagnostic>) {
        send_diagnostics(&self.sender, uri, diagnostics);
    }

    /// Send a message to the client.
    fn send(&self, msg: lsp_server::Message) {
        if let Err(e) = self.sender.send(msg) {
            tracing::error!("Failed to send message: {}", e);
        }
    }
}

fn revalidate(
    documents: &[(Uri, String, DocumentKind)],
    workspace: &Workspace,
    options: &ValidationOptions,
    snapshot: &Snapshot,
    sender: &Sender<lsp_server::Message>,
) {
    for (uri, text, kind) in documents {
        if snapshot.is_cancelled() {
            tracing::debug!("Revalidation at revision {} superseded", snapshot.revision());
            return;
        }
        tracing::debug!("Revalidating: {}", uri.as_str());
        let diagnostics = document_diagnostics(text, *kind, workspace, options);
        if snapshot.is_current() {
            send_diagnostics(sender, uri, diagnostics);
        }
    }
}

fn send_diagnostics(
    sender: &Sender<lsp_server::Message>,
    uri: &Uri,
    diagnostics: Vec<lsp_types::Diagnostic>,
) {
    let params = PublishDiagnosticsParams {
        uri: uri.clone(),
        diagnostics,
        version: None,
    };
    let notif = lsp_server::Notification::new(PublishDiagnostics::METHOD.to_string(), params);

    if let Err(e) = sender.send(lsp_server::Message::Notification(notif)) {
        tracing::error!("Failed to send diagnostics: {}", e);
    }
}

/// Run the main event loop until the client sends `exit`.
///
/// Returns whether the client asked for shutdown first.
pub fn run_main_loop(
    receiver: &Receiver<lsp_server::Message>,
    sender: Sender<lsp_server::Message>,
    workspace: Arc<Workspace>,
    config: ServerConfig,
) -> bool {
    let mut state = MainLoopState::new(sender, workspace, config);

    tracing::info!("Main loop started");

    for msg in receiver {
        state.handle_message(msg);
        if state.exit_requested {
            break;
        }
    }

    tracing::info!("Main loop ended");
    state.shutdown_requested
}
