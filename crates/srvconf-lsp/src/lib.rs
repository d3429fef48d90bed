//! Language Server Protocol implementation for server configuration files.
//!
//! This crate provides an LSP server for `server.xml`, `bootstrap.properties`
//! and `server.env`, enabling IDE features like:
//! - Diagnostics for undeclared `${variables}` and invalid values
//! - Completion of keys, allowed values and variable references
//! - Hover descriptions and resolved variable values
//! - Quick fixes replacing near-miss identifiers
//!
//! # Architecture
//!
//! - **Engines**: `compute_*` functions in [`handlers`] turn a document, a
//!   byte offset and the workspace state into completions, hovers,
//!   diagnostics and quick fixes
//! - **Main loop**: Handles LSP messages, keeps the VFS and the variable
//!   store current, dispatches requests
//!
//! # Example
//!
//! ```
//! use srvconf_core::{DocumentKind, Schema, SourceId, Workspace};
//! use srvconf_lsp::handlers::hover::compute_hover;
//! use srvconf_parser::ConfigDocument;
//!
//! let workspace = Workspace::new(Schema::default());
//! workspace
//!     .variables()
//!     .replace_source_entries(SourceId::new("server.xml"), [("default.http.port", "9080")]);
//!
//! let source = r#"<httpEndpoint httpPort="${default.http.port}"/>"#;
//! let doc = ConfigDocument::new(source, DocumentKind::ServerXml, None);
//! let hover = compute_hover(&doc, 30, &workspace.variables().snapshot()).unwrap();
//! assert_eq!(hover.contents, "default.http.port = 9080");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod handlers;
pub mod main_loop;

mod server;
mod snapshot;
mod vfs;

pub use config::ServerConfig;
pub use handlers::code_actions::{compute_quick_fixes, QuickFix};
pub use handlers::completion::{compute_completions, CandidateKind, CompletionCandidate};
pub use handlers::diagnostics::compute_diagnostics;
pub use handlers::hover::{compute_hover, HoverInfo};
pub use main_loop::run_main_loop;
pub use server::{build_workspace, server_capabilities, start_stdio, workspace_root, Server};
pub use snapshot::{Revision, Snapshot};
pub use vfs::Vfs;

/// LSP server version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
