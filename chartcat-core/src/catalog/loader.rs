//! Directory loader
//!
//! Walks a root path in lexical pre-order and feeds every chart it can
//! decode into a catalog:
//!
//! - a directory that decodes as a chart is added and its subtree is not
//!   visited, so a packaged copy stored inside an unpacked chart is never
//!   ingested twice;
//! - a file whose name matches one of the patterns is decoded as a package.
//!
//! Entries that cannot be read or decoded are logged and skipped.

use glob::Pattern;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use super::{Catalog, CatalogError};
use crate::chart::{ChartDecoder, PackageDecoder};

/// File name patterns recognized as packaged charts by default
pub const DEFAULT_PATTERNS: &[&str] = &["*.tgz"];

/// Discovers charts under a root path
pub struct DirectoryLoader {
    root: PathBuf,
    patterns: Vec<Pattern>,
    decoder: Arc<dyn ChartDecoder>,
}

impl DirectoryLoader {
    /// Create a loader for `root` with the default patterns and decoder
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            patterns: compile_patterns(DEFAULT_PATTERNS),
            decoder: Arc::new(PackageDecoder),
        }
    }

    /// Replace the file name patterns
    ///
    /// Invalid patterns are logged and left out.
    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.patterns = compile_patterns(patterns);
        self
    }

    /// Replace the decoder used for directories and matching files
    pub fn with_decoder(mut self, decoder: Arc<dyn ChartDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the root and append every decoded chart to `catalog`
    ///
    /// Fails when the catalog is still empty after the walk.
    pub fn load_into(&self, catalog: &mut Catalog) -> Result<(), CatalogError> {
        let span = tracing::info_span!("chart_loader", root = %self.root.display());
        let _enter = span.enter();

        let mut walker = WalkDir::new(&self.root).sort_by_file_name().into_iter();

        loop {
            let entry = match walker.next() {
                None => break,
                Some(Ok(entry)) => entry,
                Some(Err(e)) => {
                    let path = e.path().unwrap_or(self.root.as_path()).display().to_string();
                    warn!("Error occurred while searching {}: {}", path, e);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                if self.try_entry_as_chart(entry.path(), true, catalog) {
                    walker.skip_current_dir();
                }
            } else if self.matches_pattern(entry.path()) {
                debug!("Found a matching file: {}", entry.path().display());
                self.try_entry_as_chart(entry.path(), false, catalog);
            }
        }

        if catalog.is_empty() {
            return Err(CatalogError::NoChartsFound {
                path: self.root.clone(),
            });
        }

        Ok(())
    }

    fn matches_pattern(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        self.patterns.iter().any(|pattern| pattern.matches(name))
    }

    /// Returns true when the entry decoded as a chart
    fn try_entry_as_chart(&self, path: &Path, is_dir: bool, catalog: &mut Catalog) -> bool {
        debug!(
            "Trying entry as chart: {} (directory: {})",
            path.display(),
            is_dir
        );

        match self.decoder.decode(path) {
            Ok(chart) => {
                let name = chart.name().to_string();
                let version = chart.version().to_string();

                if catalog.append(chart) {
                    info!("Chart {} {} added to the collection", name, version);
                } else {
                    debug!(
                        "Chart {} {} from {} is already in the collection",
                        name,
                        version,
                        path.display()
                    );
                }
                true
            }
            Err(e) => {
                debug!(
                    "Entry {} does not contain a chart: {}",
                    path.display(),
                    error_chain(&e)
                );
                false
            }
        }
    }
}

fn compile_patterns<I, S>(patterns: I) -> Vec<Pattern>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns
        .into_iter()
        .filter_map(|pattern| match Pattern::new(pattern.as_ref()) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                error!("Ignoring invalid file pattern '{}': {}", pattern.as_ref(), e);
                None
            }
        })
        .collect()
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
