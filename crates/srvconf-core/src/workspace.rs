//! Per-workspace state handed to every engine operation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::dictionary::Dictionary;
use crate::document::DocumentKind;
use crate::schema::Schema;
use crate::source::{DiscoveredSource, VariableDiscovery};
use crate::variables::{SourceId, VariableStore};

/// The schema and variable store of one workspace.
///
/// The schema is fixed for the lifetime of the value. The variable store is
/// filled by [`Workspace::init`] and kept current with
/// [`Workspace::refresh_source`].
#[derive(Debug, Default)]
pub struct Workspace {
    root: RwLock<Option<PathBuf>>,
    schema: Arc<Schema>,
    variables: VariableStore,
}

impl Workspace {
    /// Create an empty workspace with the given schema.
    pub fn new(schema: Schema) -> Self {
        Self {
            root: RwLock::new(None),
            schema: Arc::new(schema),
            variables: VariableStore::new(),
        }
    }

    /// Load every source found under `root`, replacing the previous ones.
    ///
    /// Discovery runs before the store is touched; readers keep seeing the
    /// previous sources until the new set is swapped in whole.
    pub fn init(&self, root: &Path, discovery: &dyn VariableDiscovery) {
        tracing::info!("Initializing workspace at {}", root.display());

        let sources = discovery.variable_sources(root);
        let count = sources.len();
        self.variables
            .replace_all(sources.into_iter().map(|source| (source.id, source.entries)));
        *self.root.write() = Some(root.to_path_buf());

        tracing::info!(
            "Loaded {} variables from {} sources",
            self.variables.snapshot().len(),
            count
        );
    }

    /// Forget the root and every variable.
    pub fn reset(&self) {
        *self.root.write() = None;
        self.variables.clear();
    }

    /// Swap in the entries of one source.
    pub fn refresh_source(&self, source: DiscoveredSource) {
        self.variables
            .replace_source_entries(source.id, source.entries);
    }

    /// Swap in the entries of one source; a new source is placed by `key`
    /// among the registered ones.
    pub fn refresh_source_ranked<R, F>(&self, source: DiscoveredSource, key: F)
    where
        R: Ord,
        F: Fn(&SourceId) -> R,
    {
        self.variables
            .replace_source_entries_ranked(source.id, source.entries, key);
    }

    /// Drop one source, e.g. after its file was deleted.
    pub fn remove_source(&self, id: &SourceId) {
        self.variables.remove_source(id);
    }

    /// The workspace root, if initialized.
    pub fn root(&self) -> Option<PathBuf> {
        self.root.read().clone()
    }

    /// The schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The key dictionary for a document kind.
    pub fn dictionary(&self, kind: DocumentKind) -> Option<&Dictionary> {
        self.schema.dictionary_for(kind)
    }

    /// The variable store.
    pub const fn variables(&self) -> &VariableStore {
        &self.variables
    }
}
