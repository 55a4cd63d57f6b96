//! Query engine
//!
//! Selects the charts matching every supplied criterion and hands back deep
//! clones, so results can be edited without touching the source catalog.

use tracing::warn;

use super::{Catalog, Criterion};
use crate::chart::deep_clone;

impl Catalog {
    /// Select every chart that matches all of the criteria
    ///
    /// An empty criteria list selects nothing. Matches keep their source
    /// order. A chart that cannot be cloned completely is logged and its
    /// partial clone is still returned.
    pub fn query(&self, criteria: &[Criterion]) -> Catalog {
        let mut result = Catalog::new();

        if criteria.is_empty() {
            return result;
        }

        for chart in self.iter() {
            if !criteria.iter().all(|criterion| criterion.matches(chart)) {
                continue;
            }

            let copy = match deep_clone(chart) {
                Ok(copy) => copy,
                Err(partial) => {
                    warn!(
                        "Chart catalog is unable to clone {} {}: {}",
                        chart.name(),
                        chart.version(),
                        partial.error
                    );
                    partial.chart
                }
            };

            result.append(copy);
        }

        result
    }
}
