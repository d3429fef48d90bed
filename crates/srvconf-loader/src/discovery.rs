//! Workspace variable discovery.
//!
//! Variables come from four kinds of files. Sources are returned lowest
//! precedence first, so later sources override earlier ones:
//!
//! 1. `configDropins/defaults/*.xml`
//! 2. `server.env`
//! 3. `bootstrap.properties`
//! 4. `server.xml` and the XML fragments it includes
//! 5. `configDropins/overrides/*.xml`
//!
//! Build descriptors such as `pom.xml` and build output directories such as
//! `target/` are not variable sources.
//!
//! Within an XML file every `defaultValue` is registered before any
//! `value`, so an explicit value always wins over a default.

use std::fs;
use std::path::{Path, PathBuf};

use srvconf_core::{DiscoveredSource, DocumentKind, SourceId, VariableDiscovery};
use srvconf_parser::properties;
use srvconf_parser::xml;
use walkdir::{DirEntry, WalkDir};

use crate::LoadError;

/// XML files that belong to the build rather than the server.
const BUILD_DESCRIPTORS: &[&str] = &["pom.xml", "build.xml", "ivy.xml", "settings.xml"];

/// Directories holding build output, skipped while walking.
const SKIPPED_DIRS: &[&str] = &["target", "build", "node_modules"];

/// Where a variable source sits in the precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceRank {
    /// `configDropins/defaults/*.xml`.
    Defaults,
    /// `server.env`.
    ServerEnv,
    /// `bootstrap.properties`.
    Bootstrap,
    /// `server.xml` and any other server XML, such as included fragments.
    ServerXml,
    /// `configDropins/overrides/*.xml`.
    Overrides,
}

impl SourceRank {
    /// Classify a path, or `None` if it cannot declare variables.
    pub fn of(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let parent = path.parent().and_then(Path::file_name).and_then(|n| n.to_str());
        let grandparent = path
            .parent()
            .and_then(Path::parent)
            .and_then(Path::file_name)
            .and_then(|n| n.to_str());

        let is_xml = name.to_ascii_lowercase().ends_with(".xml");
        match (grandparent, parent) {
            (Some("configDropins"), Some("defaults")) if is_xml => Some(Self::Defaults),
            (Some("configDropins"), Some("overrides")) if is_xml => Some(Self::Overrides),
            _ => match name {
                "server.env" => Some(Self::ServerEnv),
                "bootstrap.properties" => Some(Self::Bootstrap),
                _ if is_xml && !BUILD_DESCRIPTORS.contains(&name) => Some(Self::ServerXml),
                _ => None,
            },
        }
    }
}

/// Whether a path is a file that can declare variables.
pub fn is_variable_source(path: &Path) -> bool {
    SourceRank::of(path).is_some()
}

/// `<variable>` declarations of an XML document, defaults first.
pub fn variables_from_xml(source: &str) -> Vec<(String, String)> {
    let elements = xml::elements(source);
    let declared = || {
        elements
            .iter()
            .filter(|element| element.name == "variable")
            .filter_map(|element| element.attribute("name").map(|name| (name, element)))
    };

    let defaults = declared().filter_map(|(name, element)| {
        element
            .attribute("defaultValue")
            .map(|value| (name.to_string(), value.to_string()))
    });
    let values = declared().filter_map(|(name, element)| {
        element
            .attribute("value")
            .map(|value| (name.to_string(), value.to_string()))
    });
    defaults.chain(values).collect()
}

/// `key=value` declarations of a properties or env file.
///
/// Entries of `server.env` are also reachable as `env.<KEY>`.
pub fn variables_from_properties(source: &str, kind: DocumentKind) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    for line in properties::property_lines(source) {
        if line.key.is_empty() {
            continue;
        }
        let value = line.value().unwrap_or_default().to_string();
        if kind == DocumentKind::ServerEnv {
            entries.push((format!("env.{}", line.key), value.clone()));
        }
        entries.push((line.key.to_string(), value));
    }
    entries
}

/// Variables declared by document text, according to its kind.
pub fn variables_from_text(source: &str, kind: DocumentKind) -> Vec<(String, String)> {
    match kind {
        DocumentKind::ServerXml => variables_from_xml(source),
        DocumentKind::BootstrapProperties | DocumentKind::ServerEnv => {
            variables_from_properties(source, kind)
        }
    }
}

/// The source id used for a file.
pub fn source_id(path: &Path) -> SourceId {
    SourceId::new(path.to_string_lossy())
}

/// Read the variables declared by one file.
///
/// Returns `Ok(None)` for files that cannot declare variables.
pub fn read_source(path: &Path) -> Result<Option<DiscoveredSource>, LoadError> {
    if !is_variable_source(path) {
        return Ok(None);
    }
    let Some(kind) = DocumentKind::from_path(path) else {
        return Ok(None);
    };
    let text = fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Some(DiscoveredSource::new(
        source_id(path),
        variables_from_text(&text, kind),
    )))
}

fn is_skipped(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };
    name.starts_with('.') || (entry.file_type().is_dir() && SKIPPED_DIRS.contains(&name))
}

/// Sort key placing a source where the workspace scan would put it.
///
/// Sources that are not variable files sort first.
pub fn precedence_key(id: &SourceId) -> (Option<SourceRank>, PathBuf) {
    let path = PathBuf::from(id.as_str());
    (SourceRank::of(&path), path)
}

/// Finds variable sources by walking the workspace.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceScanner {
    max_depth: Option<usize>,
}

impl WorkspaceScanner {
    /// Create a scanner with no depth limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit how deep the walk descends below the root.
    #[must_use]
    pub const fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Paths of every variable source file under `root`, lowest precedence
    /// first.
    ///
    /// Unreadable entries below the root are logged and skipped.
    pub fn source_files(&self, root: &Path) -> Result<Vec<PathBuf>, LoadError> {
        let mut walker = WalkDir::new(root).follow_links(false);
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        let mut found = Vec::new();
        for entry in walker.into_iter().filter_entry(|e| !is_skipped(e)) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(LoadError::Walk(e)),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(rank) = SourceRank::of(entry.path()) {
                found.push((rank, entry.into_path()));
            }
        }
        found.sort();
        Ok(found.into_iter().map(|(_, path)| path).collect())
    }

    /// Every variable source under `root`, lowest precedence first.
    ///
    /// Files that fail to read are logged and skipped.
    pub fn scan(&self, root: &Path) -> Result<Vec<DiscoveredSource>, LoadError> {
        let found = self.source_files(root)?;
        let mut sources = Vec::with_capacity(found.len());
        for path in found {
            match read_source(&path) {
                Ok(Some(source)) => {
                    tracing::debug!(
                        "Found {} variables in {}",
                        source.entries.len(),
                        path.display()
                    );
                    sources.push(source);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("{e}"),
            }
        }
        Ok(sources)
    }
}

impl VariableDiscovery for WorkspaceScanner {
    fn variable_sources(&self, root: &Path) -> Vec<DiscoveredSource> {
        self.scan(root).unwrap_or_else(|e| {
            tracing::warn!("Variable discovery failed: {e}");
            Vec::new()
        })
    }
}
