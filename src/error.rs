//! Error types for the live view host.
//!
//! Nothing in the presentation core is fatal; these errors only surface from
//! setup paths (config, catalog, theme, feed, outbox) and are either logged
//! and replaced by defaults or returned from `main`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A result type using `ViewError`.
pub type Result<T> = std::result::Result<T, ViewError>;

#[derive(Debug, Error)]
pub enum ViewError {
    /// A file could not be read or written.
    #[error("i/o error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A TOML document (config or theme) did not parse.
    #[error("invalid toml in '{path}': {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A JSON document (catalog, feed line, outbox entry) did not parse.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    /// The command catalog was reachable but unusable.
    #[error("catalog unavailable: {0}")]
    Catalog(String),
}

impl ViewError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn toml(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::Toml {
            path: path.into(),
            source,
        }
    }
}
