//! Chart value object
//!
//! A chart is a packaged application bundle: metadata from `Chart.yaml`,
//! a default values tree from `values.yaml`, and the subcharts it ships
//! under `charts/`. Once a chart enters a catalog it is never mutated in
//! place; independent copies are made with [`deep_clone`].

mod clone;
mod decode;

pub use clone::{deep_clone, CloneError, PartialClone, MAX_DEPENDENCY_DEPTH, MAX_VALUES_DEPTH};
pub use decode::{
    load, load_archive, load_dir, ChartDecoder, DecodeError, PackageDecoder, MAX_ARCHIVE_SIZE,
};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default configuration tree of a chart (`values.yaml`)
pub type Values = serde_json::Map<String, serde_json::Value>;

/// Chart metadata (Chart.yaml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Chart API version ("v1" or "v2")
    #[serde(default)]
    pub api_version: String,

    /// Chart name
    #[serde(default)]
    pub name: String,

    /// Chart version
    #[serde(default)]
    pub version: String,

    /// Version of the application the chart deploys
    #[serde(default)]
    pub app_version: String,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Chart type ("application" or "library")
    #[serde(default, rename = "type")]
    pub chart_type: Option<String>,

    /// Searchable keywords
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Project homepage
    #[serde(default)]
    pub home: Option<String>,

    /// Source repositories
    #[serde(default)]
    pub sources: Vec<String>,

    /// Maintainer information
    #[serde(default)]
    pub maintainers: Vec<Maintainer>,

    /// Whether this chart is deprecated
    #[serde(default)]
    pub deprecated: bool,
}

/// Maintainer information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maintainer {
    /// Maintainer name
    pub name: String,

    /// Email address
    #[serde(default)]
    pub email: Option<String>,

    /// Website URL
    #[serde(default)]
    pub url: Option<String>,
}

/// A file carried by a chart, addressed by its path relative to the chart root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartFile {
    pub name: String,
    pub data: Vec<u8>,
}

/// A decoded chart
///
/// Templates, plain files and the values schema are read-only artifacts and
/// are shared between a chart and its clones. Values and dependencies are
/// owned per chart.
#[derive(Debug, Default)]
pub struct Chart {
    metadata: Option<Metadata>,
    values: Values,
    dependencies: Vec<Chart>,
    templates: Arc<Vec<ChartFile>>,
    files: Arc<Vec<ChartFile>>,
    schema: Option<Arc<serde_json::Value>>,
    digest: Option<String>,
}

impl Chart {
    /// Create a chart with the given metadata and nothing else
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata: Some(metadata),
            ..Self::default()
        }
    }

    pub fn with_values(mut self, values: Values) -> Self {
        self.values = values;
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<Chart>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_templates(mut self, templates: Vec<ChartFile>) -> Self {
        self.templates = Arc::new(templates);
        self
    }

    pub fn with_files(mut self, files: Vec<ChartFile>) -> Self {
        self.files = Arc::new(files);
        self
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Chart name, or "" when the chart has no metadata
    pub fn name(&self) -> &str {
        self.metadata.as_ref().map_or("", |m| m.name.as_str())
    }

    /// Chart version, or "" when the chart has no metadata
    pub fn version(&self) -> &str {
        self.metadata.as_ref().map_or("", |m| m.version.as_str())
    }

    /// Application version, or "" when the chart has no metadata
    pub fn app_version(&self) -> &str {
        self.metadata.as_ref().map_or("", |m| m.app_version.as_str())
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut Values {
        &mut self.values
    }

    pub fn dependencies(&self) -> &[Chart] {
        &self.dependencies
    }

    pub fn dependencies_mut(&mut self) -> &mut Vec<Chart> {
        &mut self.dependencies
    }

    /// Replace the dependency list as a unit
    pub fn set_dependencies(&mut self, dependencies: Vec<Chart>) {
        self.dependencies = dependencies;
    }

    pub fn templates(&self) -> &[ChartFile] {
        &self.templates
    }

    pub fn files(&self) -> &[ChartFile] {
        &self.files
    }

    pub fn schema(&self) -> Option<&serde_json::Value> {
        self.schema.as_deref()
    }

    /// `sha256:<hex>` digest of the archive the chart was decoded from
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }
}
