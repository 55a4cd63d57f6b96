//! Catalog error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by catalog loading
///
/// Per-entry problems (undecodable bundles, unreadable paths, partial clones)
/// never reach callers; they are logged where they happen.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The shared catalog already holds charts
    #[error("collection is not empty")]
    AlreadyInitialized,

    /// The walk finished without finding a single chart
    #[error("unable to find any charts in search path {}", path.display())]
    NoChartsFound { path: PathBuf },
}
