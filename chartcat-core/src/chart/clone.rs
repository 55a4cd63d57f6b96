//! Deep copies of charts
//!
//! A clone owns fresh copies of the values tree and of every dependency,
//! recursively. Templates, files and the schema stay shared.

use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use super::{Chart, Values};

/// Deepest nesting of mappings and sequences copied from a values tree
pub const MAX_VALUES_DEPTH: usize = 128;

/// Deepest dependency chain copied from a chart
pub const MAX_DEPENDENCY_DEPTH: usize = 32;

/// Reason a chart could not be copied completely
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CloneError {
    #[error("values of chart '{chart}' nest deeper than {limit} levels")]
    ValuesTooDeep { chart: String, limit: usize },

    #[error("dependencies of chart '{chart}' nest deeper than {limit} levels")]
    DependenciesTooDeep { chart: String, limit: usize },
}

/// A best-effort copy together with the first error hit while producing it
///
/// The truncated parts of `chart` are `null` values and missing
/// dependencies. Callers must not treat it as equivalent to the source.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct PartialClone {
    pub chart: Chart,
    #[source]
    pub error: CloneError,
}

/// Produce an independent copy of `chart`
pub fn deep_clone(chart: &Chart) -> Result<Chart, PartialClone> {
    let mut cloner = Cloner::default();
    let copy = cloner.chart(chart, 0);

    match cloner.error {
        None => Ok(copy),
        Some(error) => Err(PartialClone { chart: copy, error }),
    }
}

#[derive(Default)]
struct Cloner {
    error: Option<CloneError>,
}

impl Cloner {
    fn fail(&mut self, error: CloneError) {
        self.error.get_or_insert(error);
    }

    fn chart(&mut self, chart: &Chart, depth: usize) -> Chart {
        let values = self.mapping(chart.name(), &chart.values, 1);

        let dependencies = if depth >= MAX_DEPENDENCY_DEPTH && !chart.dependencies.is_empty() {
            self.fail(CloneError::DependenciesTooDeep {
                chart: chart.name().to_string(),
                limit: MAX_DEPENDENCY_DEPTH,
            });
            Vec::new()
        } else {
            chart
                .dependencies
                .iter()
                .map(|dependency| self.chart(dependency, depth + 1))
                .collect()
        };

        Chart {
            metadata: chart.metadata.clone(),
            values,
            dependencies,
            templates: Arc::clone(&chart.templates),
            files: Arc::clone(&chart.files),
            schema: chart.schema.clone(),
            digest: chart.digest.clone(),
        }
    }

    fn mapping(&mut self, chart: &str, map: &Values, depth: usize) -> Values {
        map.iter()
            .map(|(key, value)| (key.clone(), self.value(chart, value, depth)))
            .collect()
    }

    fn value(&mut self, chart: &str, value: &Value, depth: usize) -> Value {
        match value {
            Value::Object(map) if depth < MAX_VALUES_DEPTH => {
                Value::Object(self.mapping(chart, map, depth + 1))
            }
            Value::Array(items) if depth < MAX_VALUES_DEPTH => Value::Array(
                items
                    .iter()
                    .map(|item| self.value(chart, item, depth + 1))
                    .collect(),
            ),
            Value::Object(_) | Value::Array(_) => {
                self.fail(CloneError::ValuesTooDeep {
                    chart: chart.to_string(),
                    limit: MAX_VALUES_DEPTH,
                });
                Value::Null
            }
            Value::String(s) => Value::String(s.clone()),
            Value::Number(n) => Value::Number(n.clone()),
            Value::Bool(b) => Value::Bool(*b),
            Value::Null => Value::Null,
        }
    }
}
