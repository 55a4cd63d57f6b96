//! Query criteria over chart metadata
//!
//! A criterion is a pure predicate over a single chart. Atoms compare one
//! metadata field; [`all`], [`any`] and [`none`] combine criteria to any
//! depth.

use crate::chart::{Chart, Metadata};

/// Chart metadata field compared by an atomic criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Version,
    AppVersion,
}

impl Field {
    fn extract(self, metadata: &Metadata) -> &str {
        match self {
            Field::Name => &metadata.name,
            Field::Version => &metadata.version,
            Field::AppVersion => &metadata.app_version,
        }
    }
}

/// A single criterion for querying a chart catalog
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// The field equals the value
    Equals(Field, String),

    /// The chart version parses as semver and satisfies the requirement
    Satisfies(semver::VersionReq),

    /// Every criterion matches (vacuously true when empty)
    All(Vec<Criterion>),

    /// At least one criterion matches (false when empty)
    Any(Vec<Criterion>),

    /// No criterion matches (vacuously true when empty)
    NoneOf(Vec<Criterion>),
}

impl Criterion {
    /// Returns true if the chart satisfies this criterion
    pub fn matches(&self, chart: &Chart) -> bool {
        match self {
            Criterion::Equals(field, expected) => chart
                .metadata()
                .is_some_and(|metadata| field.extract(metadata) == expected),
            Criterion::Satisfies(requirement) => semver::Version::parse(chart.version())
                .is_ok_and(|version| requirement.matches(&version)),
            Criterion::All(criteria) => criteria.iter().all(|c| c.matches(chart)),
            Criterion::Any(criteria) => criteria.iter().any(|c| c.matches(chart)),
            Criterion::NoneOf(criteria) => !criteria.iter().any(|c| c.matches(chart)),
        }
    }
}

/// Matches the chart name
pub fn with_name(name: impl Into<String>) -> Criterion {
    Criterion::Equals(Field::Name, name.into())
}

/// Matches the chart version
pub fn with_version(version: impl Into<String>) -> Criterion {
    Criterion::Equals(Field::Version, version.into())
}

/// Matches the chart appVersion
pub fn with_app_version(app_version: impl Into<String>) -> Criterion {
    Criterion::Equals(Field::AppVersion, app_version.into())
}

/// Matches charts whose version satisfies a semver requirement such as
/// `^1.2` or `>=2.0, <3`
pub fn matching_version(requirement: &str) -> Result<Criterion, semver::Error> {
    semver::VersionReq::parse(requirement).map(Criterion::Satisfies)
}

/// Succeeds when all of the criteria match
pub fn all(criteria: impl IntoIterator<Item = Criterion>) -> Criterion {
    Criterion::All(criteria.into_iter().collect())
}

/// Succeeds when any of the criteria match
pub fn any(criteria: impl IntoIterator<Item = Criterion>) -> Criterion {
    Criterion::Any(criteria.into_iter().collect())
}

/// Succeeds when none of the criteria match
pub fn none(criteria: impl IntoIterator<Item = Criterion>) -> Criterion {
    Criterion::NoneOf(criteria.into_iter().collect())
}
