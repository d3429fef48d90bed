//! Token extraction for server configuration documents.
//!
//! This crate turns document text into positioned [`Token`]s:
//!
//! - `bootstrap.properties` / `server.env`: one `key=value` per line, with
//!   comma-separated values split into segments when the key allows it
//! - `server.xml`: `${name}` references in attribute values and element
//!   text, found by a Logos-based scanner that skips comments and CDATA
//!
//! Extraction works in two modes: a whole-document scan ([`ConfigDocument::tokens`])
//! used for diagnostics, and a cursor lookup ([`ConfigDocument::token_at`])
//! used for completion, hover and quick fixes.
//!
//! # Example
//!
//! ```
//! use srvconf_core::DocumentKind;
//! use srvconf_parser::ConfigDocument;
//!
//! let source = r#"<httpEndpoint httpPort="${default.http.port}"/>"#;
//! let doc = ConfigDocument::new(source, DocumentKind::ServerXml, None);
//!
//! let token = doc.tokens().next().unwrap();
//! assert_eq!(token.raw_text, "default.http.port");
//! assert_eq!(token.span.text(source), "${default.http.port}");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod document;
pub mod properties;
mod span;
mod token;
pub mod xml;

pub use document::ConfigDocument;
pub use span::Span;
pub use token::{Token, TokenKind, VariableForm};
