//! chartcat - browse and query a local Helm chart catalog
//!
//! Loads every chart under a charts directory once, then answers listing
//! and query commands against the loaded catalog.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use chartcat_core::catalog::{self, Catalog};
use chartcat_core::config::LoaderConfig;

mod catalog_cli;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "chartcat",
    about = "Browse and query a local catalog of Helm charts",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: catalog_cli::CatalogSubcommand,

    /// Directory searched for charts (overrides chartsDir from --config)
    #[clap(long, env = "CHARTCAT_CHARTS_DIR", global = true)]
    charts_dir: Option<PathBuf>,

    /// Loader configuration file (YAML)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,
}

/// Initialize tracing with CLI flags
fn initialize_tracing(log_level: &LogLevel) {
    // Logs go to stderr so command output stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level.to_filter_directive()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve the loader configuration from --config and --charts-dir
fn resolve_config(config: Option<PathBuf>, charts_dir: Option<PathBuf>) -> Result<LoaderConfig> {
    let mut resolved = match config {
        Some(path) => LoaderConfig::from_file(&path)?,
        None => LoaderConfig::new(charts_dir.clone().unwrap_or_else(|| PathBuf::from("./charts"))),
    };

    if let Some(dir) = charts_dir {
        resolved.charts_dir = dir;
    }

    resolved.validate()?;
    Ok(resolved)
}

/// Load the process-wide catalog and hand back a snapshot of it
fn load_catalog(config: &LoaderConfig) -> Result<Catalog> {
    debug!("Loading charts from: {:?}", config.charts_dir);

    catalog::load_charts_with(config).with_context(|| {
        format!(
            "Failed to load charts from {}",
            config.charts_dir.display()
        )
    })?;

    Ok(catalog::charts())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level);

    let config = resolve_config(cli.config, cli.charts_dir)?;
    let charts = load_catalog(&config)?;

    cli.command.execute(&charts)
}
