//! Document classification.

use std::fmt;
use std::path::Path;

/// The configuration dialect of a document, derived from its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// `server.xml` and other XML configuration (including `configDropins`).
    ServerXml,
    /// `bootstrap.properties` and other `.properties` files.
    BootstrapProperties,
    /// `server.env` and other `.env` files.
    ServerEnv,
}

impl DocumentKind {
    /// Classify a bare file name. Matching on extensions is case-insensitive.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".xml") {
            Some(Self::ServerXml)
        } else if lower.ends_with(".properties") {
            Some(Self::BootstrapProperties)
        } else if lower.ends_with(".env") {
            Some(Self::ServerEnv)
        } else {
            None
        }
    }

    /// Classify a path by its final component.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(Self::from_file_name)
    }

    /// Whether documents of this kind are `key=value` line files.
    pub const fn is_properties(self) -> bool {
        matches!(self, Self::BootstrapProperties | Self::ServerEnv)
    }

    /// The noun used for keys in user-facing messages.
    pub const fn key_noun(self) -> &'static str {
        match self {
            Self::ServerEnv => "variable",
            Self::ServerXml | Self::BootstrapProperties => "property",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerXml => write!(f, "server.xml"),
            Self::BootstrapProperties => write!(f, "bootstrap.properties"),
            Self::ServerEnv => write!(f, "server.env"),
        }
    }
}
