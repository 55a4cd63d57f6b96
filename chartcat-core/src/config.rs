//! Loader configuration
//!
//! Describes where charts live and which file names are treated as packaged
//! charts. Usually read from a small YAML file:
//!
//! ```yaml
//! chartsDir: /opt/charts
//! patterns:
//!   - "*.tgz"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::{DirectoryLoader, DEFAULT_PATTERNS};

/// Chart discovery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderConfig {
    /// Root directory searched for charts
    pub charts_dir: PathBuf,

    /// File name patterns recognized as packaged charts
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
}

fn default_patterns() -> Vec<String> {
    DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect()
}

impl LoaderConfig {
    /// Configuration for `charts_dir` with the default patterns
    pub fn new(charts_dir: impl Into<PathBuf>) -> Self {
        Self {
            charts_dir: charts_dir.into(),
            patterns: default_patterns(),
        }
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read loader config: {}", path.display()))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse loader config: {}", path.display()))
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(content).context("Invalid loader config YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration contents
    pub fn validate(&self) -> Result<()> {
        if self.charts_dir.as_os_str().is_empty() {
            anyhow::bail!("chartsDir is required");
        }

        if self.patterns.is_empty() {
            anyhow::bail!("At least one file pattern must be specified");
        }

        for pattern in &self.patterns {
            glob::Pattern::new(pattern)
                .with_context(|| format!("Invalid file pattern '{pattern}'"))?;
        }

        Ok(())
    }

    /// Build a directory loader from this configuration
    pub fn loader(&self) -> DirectoryLoader {
        DirectoryLoader::new(&self.charts_dir).with_patterns(&self.patterns)
    }
}
