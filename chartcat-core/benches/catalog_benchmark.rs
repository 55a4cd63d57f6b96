//! Performance benchmarks for catalog loading and queries

use chartcat_core::catalog::{any, matching_version, none, with_name, Catalog, DirectoryLoader};
use chartcat_core::chart::{Chart, Metadata};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

const CHART_NAMES: usize = 50;
const VERSIONS_PER_CHART: usize = 6;

fn create_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    for n in 0..CHART_NAMES {
        for v in 0..VERSIONS_PER_CHART {
            let values = json!({
                "replicaCount": v,
                "image": { "repository": format!("example/app-{n}"), "tag": format!("{v}.0") },
                "resources": { "limits": { "cpu": "500m", "memory": "256Mi" } },
                "extraEnv": [{ "name": "MODE", "value": "bench" }],
            });
            let chart = Chart::new(Metadata {
                name: format!("app-{n}"),
                version: format!("{v}.0.0"),
                app_version: format!("{n}.{v}"),
                ..Metadata::default()
            });
            catalog.append(chart.with_values(values.as_object().cloned().unwrap_or_default()));
        }
    }
    catalog
}

fn create_charts_dir() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for n in 0..CHART_NAMES {
        let dir = temp_dir.path().join(format!("app-{n}"));
        fs::create_dir_all(dir.join("templates")).unwrap();
        fs::write(
            dir.join("Chart.yaml"),
            format!("apiVersion: v2\nname: app-{n}\nversion: 1.0.0\n"),
        )
        .unwrap();
        fs::write(dir.join("values.yaml"), "replicaCount: 1\n").unwrap();
        fs::write(dir.join("templates/deployment.yaml"), "kind: Deployment\n").unwrap();
    }
    temp_dir
}

fn benchmark_queries(c: &mut Criterion) {
    let catalog = create_catalog();

    c.bench_function("query_by_name", |b| {
        let criteria = [with_name("app-25")];
        b.iter(|| catalog.query(black_box(&criteria)));
    });

    c.bench_function("query_version_range", |b| {
        let criteria = [matching_version(">=2.0.0, <4.0.0").unwrap()];
        b.iter(|| catalog.query(black_box(&criteria)));
    });

    c.bench_function("query_composite", |b| {
        let criteria = [
            any([with_name("app-1"), with_name("app-2"), with_name("app-3")]),
            none([with_name("app-2")]),
        ];
        b.iter(|| catalog.query(black_box(&criteria)));
    });
}

fn benchmark_load(c: &mut Criterion) {
    c.bench_function("load_unpacked_charts", |b| {
        let temp_dir = create_charts_dir();
        let loader = DirectoryLoader::new(temp_dir.path());

        b.iter(|| {
            let mut catalog = Catalog::new();
            loader.load_into(&mut catalog).unwrap();
            black_box(catalog)
        });
    });
}

criterion_group!(benches, benchmark_queries, benchmark_load);
criterion_main!(benches);
