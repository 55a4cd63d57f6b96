//! Test helper functions for integration tests
//!
//! Shared across the test files using the tests/common/ pattern.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;

static INIT: Once = Once::new();

/// Initialize logging for tests (only once per test run)
pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Write an unpacked chart into `dir`
pub fn write_chart(dir: &Path, name: &str, version: &str) {
    fs::create_dir_all(dir.join("templates")).unwrap();
    fs::write(
        dir.join("Chart.yaml"),
        format!("apiVersion: v2\nname: {name}\nversion: \"{version}\"\nappVersion: \"1.0.0\"\n"),
    )
    .unwrap();
    fs::write(
        dir.join("values.yaml"),
        "replicaCount: 1\npersistence:\n  enabled: true\n",
    )
    .unwrap();
    fs::write(dir.join("templates/deployment.yaml"), "kind: Deployment\n").unwrap();
}

/// Package a chart as `<dir>/<file_name>`, laid out the way `helm package`
/// does it
pub fn write_package_as(dir: &Path, file_name: &str, name: &str, version: &str) -> PathBuf {
    let staging = TempDir::new().unwrap();
    write_chart(staging.path(), name, version);

    let path = dir.join(file_name);
    let file = fs::File::create(&path).unwrap();
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(name, staging.path()).unwrap();
    builder.into_inner().unwrap().finish().unwrap();
    path
}

/// Package a chart as `<dir>/<name>-<version>.tgz`
pub fn write_package(dir: &Path, name: &str, version: &str) -> PathBuf {
    write_package_as(dir, &format!("{name}-{version}.tgz"), name, version)
}

/// A charts directory holding foo-1.0, bar-0.1 and foo-2.0
pub fn sample_charts_dir() -> TempDir {
    let root = TempDir::new().unwrap();
    write_package(root.path(), "foo", "1.0");
    write_package(root.path(), "bar", "0.1");
    write_package(root.path(), "foo", "2.0");
    root
}
