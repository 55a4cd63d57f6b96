//! Ordered, identity-unique chart collection

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::chart::Chart;

/// An ordered collection of charts with unique `(name, version)` pairs
///
/// Charts are held behind `Arc`, so cloning a catalog copies only the
/// sequence, not the charts. Mutable access is granted only to charts the
/// catalog owns exclusively; see [`Catalog::first_mut`].
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    charts: Vec<Arc<Chart>>,
}

impl Catalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chart to the end of the catalog
    ///
    /// Charts without metadata or without a name are ignored, as are charts
    /// whose name and version are already present. Returns whether the chart
    /// was added.
    pub fn append(&mut self, chart: Chart) -> bool {
        let Some(metadata) = chart.metadata() else {
            return false;
        };

        if metadata.name.is_empty() || self.get(&metadata.name, &metadata.version).is_some() {
            return false;
        }

        self.charts.push(Arc::new(chart));
        true
    }

    /// True when the catalog holds no charts
    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    /// The first chart in insertion order
    pub fn first(&self) -> Option<&Chart> {
        self.charts.first().map(Arc::as_ref)
    }

    /// Mutable access to the first chart
    ///
    /// Returns `None` when the catalog is empty or when the chart is shared
    /// with another catalog (such as a registry snapshot). Query results own
    /// their charts exclusively.
    pub fn first_mut(&mut self) -> Option<&mut Chart> {
        self.charts.first_mut().and_then(Arc::get_mut)
    }

    /// Iterate over the charts in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Chart> + '_ {
        self.charts.iter().map(Arc::as_ref)
    }

    /// Iterate mutably over the charts this catalog owns exclusively
    ///
    /// Charts shared with another catalog are skipped.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Chart> + '_ {
        self.charts.iter_mut().filter_map(Arc::get_mut)
    }

    /// Find the chart with the given name and version
    pub fn get(&self, name: &str, version: &str) -> Option<&Chart> {
        self.iter()
            .find(|chart| chart.name() == name && chart.version() == version)
    }

    /// Distinct chart names in this catalog
    pub fn names(&self) -> Vec<String> {
        self.collect(|chart| chart.name())
    }

    /// Distinct versions of the named chart in this catalog
    pub fn versions(&self, name: &str) -> Vec<String> {
        self.collect(|chart| {
            if chart.name() == name {
                chart.version()
            } else {
                ""
            }
        })
    }

    fn collect<'a>(&'a self, operator: impl Fn(&'a Chart) -> &'a str) -> Vec<String> {
        self.iter()
            .map(operator)
            .filter(|out| !out.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

impl IntoIterator for Catalog {
    type Item = Arc<Chart>;
    type IntoIter = std::vec::IntoIter<Arc<Chart>>;

    fn into_iter(self) -> Self::IntoIter {
        self.charts.into_iter()
    }
}
