//! Chart Catalog - discovery and querying of packaged charts
//!
//! This module keeps an in-memory, insertion-ordered collection of charts
//! loaded once from a directory tree, and answers queries over it.
//!
//! # Overview
//!
//! - [`Catalog`] is the ordered, identity-unique collection. `(name, version)`
//!   is the identity; duplicates and charts without metadata are dropped on
//!   append.
//! - [`Criterion`] values describe which charts a query selects. They compose
//!   with [`all`], [`any`] and [`none`].
//! - [`Catalog::query`] returns a fresh catalog of deep clones, so callers can
//!   edit values and dependencies without touching the shared collection.
//! - [`DirectoryLoader`] walks a root path and decodes chart directories and
//!   packaged archives into a catalog.
//! - [`ChartRegistry`] holds the process-wide catalog: loaded exactly once,
//!   read-only afterwards.
//!
//! # Architecture
//!
//! ```text
//! charts dir
//!     │
//!     ├── foo-1.0.tgz        ← packaged chart (matched by file pattern)
//!     └── bar/               ← unpacked chart (Chart.yaml), subtree skipped
//!            │
//!            ▼
//!     DirectoryLoader ──► Catalog (shared, published once by ChartRegistry)
//!                            │
//!                            ▼ query(criteria)
//!                         Catalog of clones (owned by the caller)
//! ```

mod collection;
mod criteria;
mod error;
mod loader;
mod query;
mod registry;

pub use collection::Catalog;
pub use criteria::{
    all, any, matching_version, none, with_app_version, with_name, with_version, Criterion, Field,
};
pub use error::CatalogError;
pub use loader::{DirectoryLoader, DEFAULT_PATTERNS};
pub use registry::{charts, load_charts, load_charts_with, ChartRegistry};
