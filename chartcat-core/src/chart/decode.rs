//! Package decoding
//!
//! Turns an unpacked chart directory or a packaged chart archive
//! (`<name>/Chart.yaml`, `<name>/values.yaml`, ... inside a gzipped tar)
//! into a [`Chart`]. Subcharts under `charts/` are decoded recursively,
//! whether they are unpacked directories or nested archives.

use base64::Engine as _;
use flate2::read::GzDecoder;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use super::{Chart, ChartFile, Metadata, Values};

/// Largest amount of chart content read from a single package
pub const MAX_ARCHIVE_SIZE: u64 = 20 * 1024 * 1024;

const CHART_FILE: &str = "Chart.yaml";
const VALUES_FILE: &str = "values.yaml";
const SCHEMA_FILE: &str = "values.schema.json";
const TEMPLATES_DIR: &str = "templates/";
const CHARTS_DIR: &str = "charts/";
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Errors produced while decoding a chart
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Chart.yaml file is missing")]
    MissingChartYaml,

    #[error("invalid Chart.yaml")]
    InvalidChartYaml(#[source] serde_yaml_ng::Error),

    #[error("invalid values file {file}")]
    InvalidValues {
        file: String,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("values file {file} must contain a mapping at the top level")]
    ValuesNotMapping { file: String },

    #[error("invalid values.schema.json")]
    InvalidSchema(#[source] serde_json::Error),

    #[error("not a valid chart archive")]
    InvalidArchive(#[source] std::io::Error),

    #[error("chart metadata is invalid: {0}")]
    Invalid(String),

    #[error("archive entry '{0}' escapes the chart root")]
    UnsafePath(String),

    #[error("chart content exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("dependency '{name}' could not be decoded")]
    Dependency {
        name: String,
        #[source]
        source: Box<DecodeError>,
    },
}

/// Decodes the entry at a path into a chart
pub trait ChartDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<Chart, DecodeError>;
}

/// Decoder for unpacked chart directories and packaged chart archives
#[derive(Debug, Default, Clone, Copy)]
pub struct PackageDecoder;

impl ChartDecoder for PackageDecoder {
    fn decode(&self, path: &Path) -> Result<Chart, DecodeError> {
        load(path)
    }
}

/// Load a chart from a directory or an archive file
pub fn load(path: &Path) -> Result<Chart, DecodeError> {
    if path.is_dir() {
        load_dir(path)
    } else {
        let bytes = std::fs::read(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        load_archive(&bytes)
    }
}

/// Load a chart from an unpacked chart directory
pub fn load_dir(dir: &Path) -> Result<Chart, DecodeError> {
    if !dir.join(CHART_FILE).is_file() {
        return Err(DecodeError::MissingChartYaml);
    }

    let mut files = BTreeMap::new();
    let mut total: u64 = 0;

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            DecodeError::Io {
                path,
                source: e.into(),
            }
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(dir).unwrap_or(path);

        let size = entry
            .metadata()
            .map_err(|e| DecodeError::Io {
                path: path.to_path_buf(),
                source: e.into(),
            })?
            .len();
        if total + size > MAX_ARCHIVE_SIZE {
            return Err(DecodeError::TooLarge {
                limit: MAX_ARCHIVE_SIZE,
            });
        }

        let data = std::fs::read(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        total += data.len() as u64;
        if total > MAX_ARCHIVE_SIZE {
            return Err(DecodeError::TooLarge {
                limit: MAX_ARCHIVE_SIZE,
            });
        }

        files.insert(slash_path(relative), data);
    }

    from_files(files)
}

/// Load a chart from packaged archive bytes
///
/// Accepts a gzipped tar, or the base64 encoding of one. The chart digest is
/// computed over the gzipped bytes.
pub fn load_archive(bytes: &[u8]) -> Result<Chart, DecodeError> {
    if bytes.starts_with(&GZIP_MAGIC) {
        return load_gzip(bytes);
    }

    let text: Vec<u8> = bytes
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    match base64::engine::general_purpose::STANDARD.decode(&text) {
        Ok(decoded) if decoded.starts_with(&GZIP_MAGIC) => load_gzip(&decoded),
        _ => Err(DecodeError::InvalidArchive(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "content is neither gzip nor base64-encoded gzip",
        ))),
    }
}

fn load_gzip(bytes: &[u8]) -> Result<Chart, DecodeError> {
    let digest = format!("sha256:{:x}", Sha256::digest(bytes));
    let files = unpack(bytes)?;
    Ok(from_files(files)?.with_digest(digest))
}

/// Read every regular file of a gzipped tar into memory, stripping the
/// top-level directory of each entry path
fn unpack(bytes: &[u8]) -> Result<BTreeMap<String, Vec<u8>>, DecodeError> {
    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    let mut files = BTreeMap::new();
    let mut total: u64 = 0;

    for entry in archive.entries().map_err(DecodeError::InvalidArchive)? {
        let mut entry = entry.map_err(DecodeError::InvalidArchive)?;

        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path().map_err(DecodeError::InvalidArchive)?.into_owned();
        let Some(relative) = strip_top_level(&path)? else {
            continue;
        };

        total += entry.size();
        if total > MAX_ARCHIVE_SIZE {
            return Err(DecodeError::TooLarge {
                limit: MAX_ARCHIVE_SIZE,
            });
        }

        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(DecodeError::InvalidArchive)?;
        files.insert(relative, data);
    }

    Ok(files)
}

/// `mychart/templates/svc.yaml` -> `templates/svc.yaml`
fn strip_top_level(path: &Path) -> Result<Option<String>, DecodeError> {
    let mut parts = Vec::new();

    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return Err(DecodeError::UnsafePath(path.display().to_string())),
        }
    }

    if parts.len() < 2 {
        return Ok(None);
    }

    Ok(Some(parts[1..].join("/")))
}

fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

enum Subchart {
    Dir(BTreeMap<String, Vec<u8>>),
    Archive(Vec<u8>),
}

/// Assemble a chart from its files, keyed by slash-separated relative path
fn from_files(mut files: BTreeMap<String, Vec<u8>>) -> Result<Chart, DecodeError> {
    let chart_yaml = files.remove(CHART_FILE).ok_or(DecodeError::MissingChartYaml)?;
    let metadata: Metadata =
        serde_yaml_ng::from_slice(&chart_yaml).map_err(DecodeError::InvalidChartYaml)?;
    validate_metadata(&metadata)?;

    let values = match files.remove(VALUES_FILE) {
        Some(data) => parse_values(VALUES_FILE, &data)?,
        None => Values::new(),
    };

    let schema = files
        .remove(SCHEMA_FILE)
        .map(|data| serde_json::from_slice::<serde_json::Value>(&data))
        .transpose()
        .map_err(DecodeError::InvalidSchema)?;

    let mut templates = Vec::new();
    let mut plain = Vec::new();
    let mut subcharts: BTreeMap<String, Subchart> = BTreeMap::new();

    for (name, data) in files {
        if name.starts_with(TEMPLATES_DIR) {
            templates.push(ChartFile { name, data });
        } else if let Some(rest) = name.strip_prefix(CHARTS_DIR) {
            match rest.split_once('/') {
                Some((dir, inner)) => {
                    if let Subchart::Dir(sub) = subcharts
                        .entry(dir.to_string())
                        .or_insert_with(|| Subchart::Dir(BTreeMap::new()))
                    {
                        sub.insert(inner.to_string(), data);
                    }
                }
                None if is_archive_name(rest) => {
                    subcharts.insert(rest.to_string(), Subchart::Archive(data));
                }
                None => plain.push(ChartFile { name, data }),
            }
        } else {
            plain.push(ChartFile { name, data });
        }
    }

    let mut dependencies = Vec::with_capacity(subcharts.len());
    for (name, subchart) in subcharts {
        let decoded = match subchart {
            Subchart::Dir(sub) => from_files(sub),
            Subchart::Archive(data) => load_archive(&data),
        };
        dependencies.push(decoded.map_err(|e| DecodeError::Dependency {
            name,
            source: Box::new(e),
        })?);
    }

    let mut chart = Chart::new(metadata)
        .with_values(values)
        .with_dependencies(dependencies)
        .with_templates(templates)
        .with_files(plain);
    if let Some(schema) = schema {
        chart = chart.with_schema(schema);
    }

    Ok(chart)
}

fn validate_metadata(metadata: &Metadata) -> Result<(), DecodeError> {
    if metadata.name.trim().is_empty() {
        return Err(DecodeError::Invalid("chart name is required".to_string()));
    }

    if metadata.name.contains(['/', '\\']) {
        return Err(DecodeError::Invalid(format!(
            "chart name '{}' cannot contain path separators",
            metadata.name
        )));
    }

    if metadata.version.trim().is_empty() {
        return Err(DecodeError::Invalid(format!(
            "chart '{}' has no version",
            metadata.name
        )));
    }

    Ok(())
}

fn parse_values(file: &str, data: &[u8]) -> Result<Values, DecodeError> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(Values::new());
    }

    let invalid = |source: serde_yaml_ng::Error| DecodeError::InvalidValues {
        file: file.to_string(),
        source,
    };

    // merge keys (`<<: *anchor`) are resolved before the tree is converted
    let mut yaml: serde_yaml_ng::Value = serde_yaml_ng::from_slice(data).map_err(invalid)?;
    yaml.apply_merge().map_err(invalid)?;
    let value = serde_json::Value::deserialize(yaml).map_err(invalid)?;

    match value {
        serde_json::Value::Object(map) => Ok(map),
        serde_json::Value::Null => Ok(Values::new()),
        _ => Err(DecodeError::ValuesNotMapping {
            file: file.to_string(),
        }),
    }
}

fn is_archive_name(name: &str) -> bool {
    name.ends_with(".tgz") || name.ends_with(".tar.gz")
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write_chart_dir(dir: &Path, name: &str, version: &str) {
        fs::create_dir_all(dir.join("templates")).unwrap();
        fs::write(
            dir.join("Chart.yaml"),
            format!("apiVersion: v2\nname: {name}\nversion: \"{version}\"\nappVersion: \"2.0\"\n"),
        )
        .unwrap();
        fs::write(
            dir.join("values.yaml"),
            "replicaCount: 1\nimage:\n  repository: minio/minio\n  tag: latest\n",
        )
        .unwrap();
        fs::write(
            dir.join("templates/deployment.yaml"),
            "kind: Deployment\n",
        )
        .unwrap();
        fs::write(dir.join("README.md"), "# chart\n").unwrap();
    }

    /// Package a chart directory the way `helm package` lays it out
    fn package(dir: &Path, name: &str) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let encoder = GzEncoder::new(&mut bytes, Compression::default());
            let mut builder = tar::Builder::new(encoder);
            builder.append_dir_all(name, dir).unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }
        bytes
    }

    #[test]
    fn test_load_dir() {
        let temp = TempDir::new().unwrap();
        write_chart_dir(temp.path(), "minio", "5.0.0");

        let chart = load_dir(temp.path()).unwrap();

        assert_eq!(chart.name(), "minio");
        assert_eq!(chart.version(), "5.0.0");
        assert_eq!(chart.app_version(), "2.0");
        assert_eq!(chart.values()["replicaCount"], json!(1));
        assert_eq!(chart.values()["image"]["repository"], json!("minio/minio"));
        assert_eq!(chart.templates().len(), 1);
        assert_eq!(chart.templates()[0].name, "templates/deployment.yaml");
        assert_eq!(chart.files().len(), 1);
        assert_eq!(chart.files()[0].name, "README.md");
        assert!(chart.digest().is_none());
    }

    #[test]
    fn test_load_dir_without_chart_yaml() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("values.yaml"), "a: 1\n").unwrap();

        assert!(matches!(
            load_dir(temp.path()),
            Err(DecodeError::MissingChartYaml)
        ));
    }

    #[test]
    fn test_load_archive() {
        let temp = TempDir::new().unwrap();
        let chart_dir = temp.path().join("src");
        write_chart_dir(&chart_dir, "minio", "5.0.0");
        let bytes = package(&chart_dir, "minio");

        let chart = load_archive(&bytes).unwrap();

        assert_eq!(chart.name(), "minio");
        assert_eq!(chart.values()["image"]["tag"], json!("latest"));
        assert_eq!(chart.templates().len(), 1);
        let expected = format!("sha256:{:x}", Sha256::digest(&bytes));
        assert_eq!(chart.digest(), Some(expected.as_str()));
    }

    #[test]
    fn test_load_base64_archive() {
        let temp = TempDir::new().unwrap();
        let chart_dir = temp.path().join("src");
        write_chart_dir(&chart_dir, "minio", "5.0.0");
        let bytes = package(&chart_dir, "minio");
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);

        let path = temp.path().join("minio.tgz");
        fs::write(&path, format!("{encoded}\n")).unwrap();

        let chart = load(&path).unwrap();
        assert_eq!(chart.name(), "minio");
    }

    #[test]
    fn test_load_garbage_file() {
        let result = load_archive(b"definitely not a chart");
        assert!(matches!(result, Err(DecodeError::InvalidArchive(_))));
    }

    #[test]
    fn test_subcharts_from_dirs_and_archives() {
        let temp = TempDir::new().unwrap();
        let parent = temp.path().join("parent");
        write_chart_dir(&parent, "parent", "1.0.0");

        write_chart_dir(&parent.join("charts/redis"), "redis", "17.0.0");

        let packaged_src = temp.path().join("mysql-src");
        write_chart_dir(&packaged_src, "mysql", "9.0.0");
        fs::write(
            parent.join("charts/mysql-9.0.0.tgz"),
            package(&packaged_src, "mysql"),
        )
        .unwrap();

        let chart = load_dir(&parent).unwrap();

        let names: Vec<&str> = chart.dependencies().iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["mysql", "redis"]);
        assert!(chart.dependencies()[0].digest().is_some());
        assert_eq!(chart.templates().len(), 1);
    }

    #[test]
    fn test_broken_subchart_fails_parent() {
        let temp = TempDir::new().unwrap();
        let parent = temp.path().join("parent");
        write_chart_dir(&parent, "parent", "1.0.0");
        fs::create_dir_all(parent.join("charts/broken")).unwrap();
        fs::write(parent.join("charts/broken/values.yaml"), "a: 1\n").unwrap();

        match load_dir(&parent) {
            Err(DecodeError::Dependency { name, source }) => {
                assert_eq!(name, "broken");
                assert!(matches!(*source, DecodeError::MissingChartYaml));
            }
            other => panic!("expected dependency error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_name_is_invalid() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Chart.yaml"), "version: \"1.0\"\n").unwrap();

        assert!(matches!(load_dir(temp.path()), Err(DecodeError::Invalid(_))));
    }

    #[test]
    fn test_values_must_be_mapping() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("Chart.yaml"),
            "name: list\nversion: \"1.0\"\n",
        )
        .unwrap();
        fs::write(temp.path().join("values.yaml"), "- a\n- b\n").unwrap();

        assert!(matches!(
            load_dir(temp.path()),
            Err(DecodeError::ValuesNotMapping { .. })
        ));
    }

    #[test]
    fn test_empty_values_file() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("Chart.yaml"),
            "name: empty\nversion: \"1.0\"\n",
        )
        .unwrap();
        fs::write(temp.path().join("values.yaml"), "\n").unwrap();

        let chart = load_dir(temp.path()).unwrap();
        assert!(chart.values().is_empty());
    }

    #[test]
    fn test_values_merge_keys_are_applied() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("Chart.yaml"),
            "name: anchors\nversion: \"1.0\"\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("values.yaml"),
            "base: &b {port: 80}\nsvc: {<<: *b, name: x}\n",
        )
        .unwrap();

        let chart = load_dir(temp.path()).unwrap();

        assert_eq!(chart.values()["svc"], json!({ "port": 80, "name": "x" }));
        assert_eq!(chart.values()["base"], json!({ "port": 80 }));
    }

    #[test]
    fn test_merge_key_does_not_override_explicit_values() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("Chart.yaml"),
            "name: anchors\nversion: \"1.0\"\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("values.yaml"),
            "defaults: &defaults\n  port: 80\n  replicas: 1\napi:\n  <<: *defaults\n  port: 8080\n",
        )
        .unwrap();

        let chart = load_dir(temp.path()).unwrap();

        assert_eq!(
            chart.values()["api"],
            json!({ "port": 8080, "replicas": 1 })
        );
    }

    #[test]
    fn test_oversized_file_in_dir_is_rejected() {
        let temp = TempDir::new().unwrap();
        write_chart_dir(temp.path(), "big", "1.0.0");
        let blob = fs::File::create(temp.path().join("blob.bin")).unwrap();
        blob.set_len(MAX_ARCHIVE_SIZE + 1).unwrap();

        assert!(matches!(
            load_dir(temp.path()),
            Err(DecodeError::TooLarge {
                limit: MAX_ARCHIVE_SIZE
            })
        ));
    }

    #[test]
    fn test_schema_is_decoded() {
        let temp = TempDir::new().unwrap();
        write_chart_dir(temp.path(), "schema", "1.0.0");
        fs::write(
            temp.path().join("values.schema.json"),
            r#"{"type": "object", "required": ["replicaCount"]}"#,
        )
        .unwrap();

        let chart = load_dir(temp.path()).unwrap();
        assert_eq!(chart.schema().unwrap()["type"], json!("object"));
    }

    #[test]
    fn test_strip_top_level_rejects_parent_components() {
        assert!(matches!(
            strip_top_level(Path::new("chart/../../etc/passwd")),
            Err(DecodeError::UnsafePath(_))
        ));
        assert_eq!(
            strip_top_level(Path::new("chart/templates/svc.yaml")).unwrap(),
            Some("templates/svc.yaml".to_string())
        );
        assert_eq!(strip_top_level(Path::new("chart")).unwrap(), None);
    }
}
