//! Core types for srvconf
//!
//! This crate holds the knowledge base the editor engines work against:
//!
//! - [`IdentifierEntry`] - Metadata for one known key or value set
//! - [`Dictionary`] - Immutable name to entry mapping in canonical order
//! - [`VariableStore`] - Workspace variables with copy-and-swap snapshots
//! - [`Ranker`] - Prefix and substring matching with exclusion and preselection
//! - [`Workspace`] - Schema plus variable store for one workspace root
//!
//! # Example
//!
//! ```
//! use srvconf_core::{Dictionary, IdentifierEntry, MatchMode, Ranker};
//!
//! let dict = Dictionary::from_entries([
//!     IdentifierEntry::new("com.ibm.ws.logging.console.format", "Console format")
//!         .with_allowed_values(["DEV", "SIMPLE", "JSON"]),
//! ]);
//!
//! let entry = dict.lookup("com.ibm.ws.logging.console.format").unwrap();
//! let ranked = Ranker::new(MatchMode::Prefix)
//!     .preselecting_default()
//!     .rank("", entry.allowed_values.iter());
//!
//! assert_eq!(ranked.len(), 3);
//! assert!(ranked[0].preselect);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dictionary;
pub mod document;
pub mod entry;
pub mod matcher;
pub mod schema;
pub mod source;
pub mod variables;
pub mod workspace;

pub use dictionary::Dictionary;
pub use document::DocumentKind;
pub use entry::IdentifierEntry;
pub use matcher::{Candidate, MatchMode, Ranked, Ranker};
pub use schema::{Schema, SchemaData};
pub use source::{DiscoveredSource, SchemaSource, VariableDiscovery};
pub use variables::{SourceId, VariableEntry, VariableSnapshot, VariableStore};
pub use workspace::Workspace;
