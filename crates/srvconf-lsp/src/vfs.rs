//! Virtual File System for document management.
//!
//! The VFS holds the editor's view of every open document, which may
//! differ from what is on disk.

use std::collections::HashMap;

use lsp_types::Uri;
use ropey::Rope;
use srvconf_core::DocumentKind;

use crate::handlers::utils::document_kind;

/// An open document.
#[derive(Debug)]
pub struct Document {
    content: Rope,
    version: i32,
    kind: Option<DocumentKind>,
}

impl Document {
    /// Create a document; its kind comes from the URI's file name.
    pub fn new(uri: &Uri, content: &str, version: i32) -> Self {
        Self {
            content: Rope::from_str(content),
            version,
            kind: document_kind(uri),
        }
    }

    /// The document content.
    pub fn text(&self) -> String {
        self.content.to_string()
    }

    /// The document version.
    pub const fn version(&self) -> i32 {
        self.version
    }

    /// The document kind, if the file is a recognized configuration file.
    pub const fn kind(&self) -> Option<DocumentKind> {
        self.kind
    }

    /// Replace the content.
    pub fn update(&mut self, content: &str, version: i32) {
        self.content = Rope::from_str(content);
        self.version = version;
    }
}

/// Open documents by URI.
#[derive(Debug, Default)]
#[allow(clippy::mutable_key_type)]
pub struct Vfs {
    documents: HashMap<Uri, Document>,
}

#[allow(clippy::mutable_key_type)]
impl Vfs {
    /// Create an empty VFS.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document.
    pub fn open(&mut self, uri: Uri, content: &str, version: i32) {
        let document = Document::new(&uri, content, version);
        self.documents.insert(uri, document);
    }

    /// Close a document.
    pub fn close(&mut self, uri: &Uri) {
        self.documents.remove(uri);
    }

    /// Get a document.
    pub fn get(&self, uri: &Uri) -> Option<&Document> {
        self.documents.get(uri)
    }

    /// Update a document's content. Unknown URIs are ignored.
    pub fn update(&mut self, uri: &Uri, content: &str, version: i32) {
        if let Some(doc) = self.documents.get_mut(uri) {
            doc.update(content, version);
        }
    }

    /// Text and kind of a recognized document.
    pub fn document_data(&self, uri: &Uri) -> Option<(String, DocumentKind)> {
        let doc = self.documents.get(uri)?;
        Some((doc.text(), doc.kind?))
    }

    /// Every open, recognized document.
    pub fn iter(&self) -> impl Iterator<Item = (&Uri, String, DocumentKind)> {
        self.documents
            .iter()
            .filter_map(|(uri, doc)| Some((uri, doc.text(), doc.kind?)))
    }

    /// Number of open documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no document is open.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
