//! Process-wide chart registry
//!
//! The registry owns a single catalog with a one-shot load: loading is
//! serialized by a mutex and publishes the finished catalog exactly once.
//! After that the catalog is immutable, and snapshots are handed out
//! without locking.

use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tracing::info;

use super::{Catalog, CatalogError, DirectoryLoader};
use crate::config::LoaderConfig;

static GLOBAL: ChartRegistry = ChartRegistry::new();

/// Holder of a catalog that is loaded once and read afterwards
pub struct ChartRegistry {
    load_lock: Mutex<()>,
    published: OnceCell<Catalog>,
}

impl Default for ChartRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRegistry {
    /// Create an empty registry
    pub const fn new() -> Self {
        Self {
            load_lock: Mutex::new(()),
            published: OnceCell::new(),
        }
    }

    /// The process-wide registry
    pub fn global() -> &'static ChartRegistry {
        &GLOBAL
    }

    /// Populate the registry from `path` using the default file patterns
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(), CatalogError> {
        self.load_with(DirectoryLoader::new(path.as_ref()))
    }

    /// Populate the registry with a configured loader
    ///
    /// Fails with [`CatalogError::AlreadyInitialized`] once a load has
    /// succeeded. A failed load leaves the registry empty.
    pub fn load_with(&self, loader: DirectoryLoader) -> Result<(), CatalogError> {
        let _guard = self
            .load_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.published.get().is_some_and(|catalog| !catalog.is_empty()) {
            return Err(CatalogError::AlreadyInitialized);
        }

        let mut catalog = Catalog::new();
        loader.load_into(&mut catalog)?;

        info!(
            "Loaded {} charts from {}",
            catalog.len(),
            loader.root().display()
        );

        self.published
            .set(catalog)
            .map_err(|_| CatalogError::AlreadyInitialized)
    }

    /// A by-value view of the loaded catalog
    ///
    /// The charts are shared with the registry and cannot be borrowed
    /// mutably; use [`Catalog::query`] to obtain editable copies.
    pub fn snapshot(&self) -> Catalog {
        self.published.get().cloned().unwrap_or_default()
    }

    /// True once a load has succeeded
    pub fn is_loaded(&self) -> bool {
        self.published.get().is_some()
    }
}

/// Load charts under `path` into the process-wide registry
///
/// Call this once when the process initializes.
pub fn load_charts(path: impl AsRef<Path>) -> Result<(), CatalogError> {
    ChartRegistry::global().load(path)
}

/// Load charts into the process-wide registry as described by `config`
pub fn load_charts_with(config: &LoaderConfig) -> Result<(), CatalogError> {
    ChartRegistry::global().load_with(config.loader())
}

/// Snapshot of the process-wide catalog
///
/// Do not change the content of this collection directly.
pub fn charts() -> Catalog {
    ChartRegistry::global().snapshot()
}
