//! Catalog loading error types

use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading the reference catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A catalog page could not be read
    #[error("failed to read catalog page {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A catalog page is not a valid page document
    #[error("failed to parse catalog page {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Every configured source failed
    #[error("no usable catalog source ({attempted} attempted)")]
    NoUsableSources { attempted: usize },
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
