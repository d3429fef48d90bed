//! Schema loading and workspace variable discovery.
//!
//! This crate does the file I/O the engines stay away from:
//!
//! - Reading schema JSON (or using the built-in schema)
//! - Walking a workspace for `server.xml` (and the XML it includes),
//!   `server.env`, `bootstrap.properties` and `configDropins` files and
//!   extracting the variables they declare
//!
//! # Example
//!
//! ```no_run
//! use srvconf_core::Workspace;
//! use srvconf_loader::{builtin_schema, WorkspaceScanner};
//! use std::path::Path;
//!
//! let workspace = Workspace::new(builtin_schema());
//! workspace.init(Path::new("src/main/liberty/config"), &WorkspaceScanner::new());
//! println!("{} variables", workspace.variables().snapshot().len());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod discovery;
mod schema;

pub use discovery::{
    is_variable_source, precedence_key, read_source, source_id, variables_from_properties, variables_from_text,
    variables_from_xml, SourceRank, WorkspaceScanner,
};
pub use schema::{builtin_schema, load_schema, load_schema_or_builtin, parse_schema};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during loading.
#[derive(Debug, Error)]
pub enum LoadError {
    /// IO error reading a file.
    #[error("failed to read file {path}: {source}")]
    Io {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Schema file is not valid JSON or has the wrong shape.
    #[error("invalid schema {path}: {source}")]
    Json {
        /// The schema file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The workspace root could not be walked.
    #[error("failed to walk workspace: {0}")]
    Walk(#[from] walkdir::Error),
}
