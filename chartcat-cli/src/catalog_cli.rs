//! Catalog CLI commands
//!
//! Listing, querying and inspecting the charts held by the loaded catalog.

use anyhow::{Context, Result};
use clap::Subcommand;
use std::cmp::Ordering;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use chartcat_core::catalog::{
    matching_version, none, with_app_version, with_name, with_version, Catalog, Criterion,
};
use chartcat_core::chart::Chart;

#[derive(Subcommand, Debug)]
pub enum CatalogSubcommand {
    /// List every chart in the catalog
    List {
        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// List the available versions of a chart, newest first
    Versions {
        /// Chart name
        name: String,
    },

    /// Select charts matching all of the given filters
    Query {
        /// Exact chart name
        #[clap(long)]
        name: Option<String>,

        /// Exact chart version
        #[clap(long)]
        version: Option<String>,

        /// Exact application version
        #[clap(long)]
        app_version: Option<String>,

        /// Semantic version requirement (e.g. "^1.2", ">=2.0, <3.0")
        #[clap(long)]
        version_req: Option<String>,

        /// Exclude charts with this name (repeatable)
        #[clap(long)]
        exclude_name: Vec<String>,

        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Show detailed information about a chart
    Show {
        /// Chart name
        name: String,

        /// Chart version (defaults to the newest)
        #[clap(long)]
        version: Option<String>,
    },
}

impl CatalogSubcommand {
    pub fn execute(self, catalog: &Catalog) -> Result<()> {
        match self {
            CatalogSubcommand::List { json } => execute_list(catalog, json),
            CatalogSubcommand::Versions { name } => execute_versions(catalog, &name),
            CatalogSubcommand::Query {
                name,
                version,
                app_version,
                version_req,
                exclude_name,
                json,
            } => {
                let criteria = build_criteria(
                    name,
                    version,
                    app_version,
                    version_req.as_deref(),
                    exclude_name,
                )?;
                execute_query(catalog, &criteria, json)
            }
            CatalogSubcommand::Show { name, version } => {
                execute_show(catalog, &name, version.as_deref())
            }
        }
    }
}

/// Table row for chart listings
#[derive(Tabled)]
struct ChartRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "App Version")]
    app_version: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl ChartRow {
    fn from_chart(chart: &Chart) -> Self {
        let desc = chart
            .metadata()
            .map(|m| m.description.as_str())
            .unwrap_or_default();
        let truncated_desc = if desc.chars().count() > 50 {
            format!("{}...", desc.chars().take(47).collect::<String>())
        } else {
            desc.to_string()
        };

        ChartRow {
            name: chart.name().to_string(),
            version: chart.version().to_string(),
            app_version: chart.app_version().to_string(),
            description: truncated_desc,
        }
    }
}

/// Newest first; versions that are not semver sort after those that are
fn compare_versions_desc(a: &str, b: &str) -> Ordering {
    match (semver::Version::parse(a), semver::Version::parse(b)) {
        (Ok(a), Ok(b)) => b.cmp(&a),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => b.cmp(a),
    }
}

/// Charts ordered by name, then newest version first
fn sorted_charts(catalog: &Catalog) -> Vec<&Chart> {
    let mut charts: Vec<&Chart> = catalog.iter().collect();
    charts.sort_by(|a, b| {
        a.name()
            .cmp(b.name())
            .then_with(|| compare_versions_desc(a.version(), b.version()))
    });
    charts
}

fn sorted_versions(catalog: &Catalog, name: &str) -> Vec<String> {
    let mut versions = catalog.versions(name);
    versions.sort_by(|a, b| compare_versions_desc(a, b));
    versions
}

fn build_criteria(
    name: Option<String>,
    version: Option<String>,
    app_version: Option<String>,
    version_req: Option<&str>,
    exclude_name: Vec<String>,
) -> Result<Vec<Criterion>> {
    let mut criteria = Vec::new();

    if let Some(name) = name {
        criteria.push(with_name(name));
    }
    if let Some(version) = version {
        criteria.push(with_version(version));
    }
    if let Some(app_version) = app_version {
        criteria.push(with_app_version(app_version));
    }
    if let Some(req) = version_req {
        criteria.push(
            matching_version(req).with_context(|| format!("Invalid version requirement '{req}'"))?,
        );
    }
    if !exclude_name.is_empty() {
        criteria.push(none(exclude_name.into_iter().map(with_name)));
    }

    Ok(criteria)
}

fn chart_summary_json(chart: &Chart) -> serde_json::Value {
    let metadata = chart.metadata();
    serde_json::json!({
        "name": chart.name(),
        "version": chart.version(),
        "appVersion": chart.app_version(),
        "description": metadata.map(|m| m.description.as_str()).unwrap_or_default(),
        "deprecated": metadata.map(|m| m.deprecated).unwrap_or_default(),
        "digest": chart.digest(),
    })
}

fn render_table(charts: &[&Chart]) -> String {
    let rows: Vec<ChartRow> = charts.iter().map(|c| ChartRow::from_chart(c)).collect();

    Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string()
}

fn render_charts(charts: &[&Chart], json_output: bool) -> Result<String> {
    if json_output {
        let json_results: Vec<serde_json::Value> =
            charts.iter().map(|c| chart_summary_json(c)).collect();
        Ok(serde_json::to_string_pretty(&json_results)?)
    } else if charts.is_empty() {
        Ok(String::new())
    } else {
        Ok(render_table(charts))
    }
}

fn print_charts(charts: &[&Chart], json_output: bool) -> Result<()> {
    let output = render_charts(charts, json_output)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

fn execute_list(catalog: &Catalog, json_output: bool) -> Result<()> {
    print_charts(&sorted_charts(catalog), json_output)
}

fn execute_versions(catalog: &Catalog, name: &str) -> Result<()> {
    let versions = sorted_versions(catalog, name);
    if versions.is_empty() {
        anyhow::bail!("Chart '{}' not found in catalog", name);
    }

    for version in versions {
        println!("{version}");
    }
    Ok(())
}

/// Query output lists matches in catalog order, unlike `list`
fn render_query(catalog: &Catalog, criteria: &[Criterion], json_output: bool) -> Result<String> {
    let results = catalog.query(criteria);
    let charts: Vec<&Chart> = results.iter().collect();
    render_charts(&charts, json_output)
}

fn execute_query(catalog: &Catalog, criteria: &[Criterion], json_output: bool) -> Result<()> {
    let output = render_query(catalog, criteria, json_output)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

/// Pick the requested version of `name`, or its newest one
fn select_chart<'a>(catalog: &'a Catalog, name: &str, version: Option<&str>) -> Result<&'a Chart> {
    match version {
        Some(version) => catalog
            .get(name, version)
            .with_context(|| format!("Chart '{name}' version '{version}' not found in catalog")),
        None => {
            let newest = sorted_versions(catalog, name)
                .into_iter()
                .next()
                .with_context(|| format!("Chart '{name}' not found in catalog"))?;
            catalog
                .get(name, &newest)
                .with_context(|| format!("Chart '{name}' not found in catalog"))
        }
    }
}

fn render_show(chart: &Chart) -> Result<String> {
    let mut out = String::new();
    out.push_str(&format!("Chart:       {}\n", chart.name()));
    out.push_str(&format!("Version:     {}\n", chart.version()));

    if !chart.app_version().is_empty() {
        out.push_str(&format!("App Version: {}\n", chart.app_version()));
    }
    if let Some(digest) = chart.digest() {
        out.push_str(&format!("Digest:      {digest}\n"));
    }

    if let Some(metadata) = chart.metadata() {
        if let Some(ref chart_type) = metadata.chart_type {
            out.push_str(&format!("Type:        {chart_type}\n"));
        }
        if let Some(ref home) = metadata.home {
            out.push_str(&format!("Home:        {home}\n"));
        }
        if !metadata.keywords.is_empty() {
            out.push_str(&format!("Keywords:    {}\n", metadata.keywords.join(", ")));
        }
        if metadata.deprecated {
            out.push_str("\nWARNING: This chart is deprecated!\n");
        }
        if !metadata.description.is_empty() {
            out.push_str("\nDescription:\n");
            for line in metadata.description.lines() {
                out.push_str(&format!("  {line}\n"));
            }
        }
    }

    if !chart.dependencies().is_empty() {
        out.push_str("\nDependencies:\n");
        for dep in chart.dependencies() {
            out.push_str(&format!("  {} {}\n", dep.name(), dep.version()));
        }
    }

    out.push_str("\nDefault values:\n");
    if chart.values().is_empty() {
        out.push_str("  {}\n");
    } else {
        let yaml = serde_yaml_ng::to_string(chart.values())
            .context("Failed to render chart values as YAML")?;
        for line in yaml.lines() {
            out.push_str(&format!("  {line}\n"));
        }
    }

    Ok(out)
}

fn execute_show(catalog: &Catalog, name: &str, version: Option<&str>) -> Result<()> {
    let chart = select_chart(catalog, name, version)?;
    print!("{}", render_show(chart)?);
    Ok(())
}
