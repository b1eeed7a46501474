// Table sources: where a snapshot's sheets come from

use std::path::PathBuf;
use std::time::Duration;

use ctrlboard_config::{SourceConfig, SourceKind};
use ctrlboard_core::RawTable;

use crate::error::LoadError;
use crate::http::HttpCsvSource;

/// A provider of named sheets.
///
/// `fetch` returns `Ok(None)` when the sheet does not exist at the source,
/// so callers decide whether that is fatal.
pub trait TableSource {
    /// Human-readable location, used in logs and CLI output.
    fn describe(&self) -> String;

    fn fetch(&self, sheet: &str) -> Result<Option<RawTable>, LoadError>;
}

/// Folder of `<sheet>.csv` or `<sheet>.json` exports. CSV wins when both exist.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TableSource for DirectorySource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn fetch(&self, sheet: &str) -> Result<Option<RawTable>, LoadError> {
        let csv_path = self.root.join(format!("{sheet}.csv"));
        if csv_path.is_file() {
            log::debug!("reading {}", csv_path.display());
            return crate::csv::import(&csv_path, sheet).map(Some);
        }
        let json_path = self.root.join(format!("{sheet}.json"));
        if json_path.is_file() {
            log::debug!("reading {}", json_path.display());
            return crate::json::import(&json_path, sheet).map(Some);
        }
        Ok(None)
    }
}

/// Build the source described by the config.
pub fn open_source(config: &SourceConfig) -> Result<Box<dyn TableSource>, LoadError> {
    match config.kind {
        SourceKind::Directory => {
            let root = config.path.clone().unwrap_or_else(|| PathBuf::from("."));
            if !root.is_dir() {
                return Err(LoadError::Io {
                    path: root,
                    message: "not a directory".into(),
                });
            }
            Ok(Box::new(DirectorySource::new(root)))
        }
        SourceKind::Http => {
            let template = config.url_template.clone().ok_or_else(|| LoadError::Network {
                url: String::new(),
                message: "no url_template configured".into(),
            })?;
            let source = HttpCsvSource::new(template, Duration::from_secs(config.timeout_secs))?
                .with_max_retries(config.max_retries);
            Ok(Box::new(source))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn csv_then_json() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("PTAR.csv"), "Institución,Año\nA,2025\n").unwrap();
        fs::write(dir.path().join("PTCI.json"), r#"[{"Institución":"A","Año":2025}]"#).unwrap();
        let src = DirectorySource::new(dir.path());

        assert_eq!(src.fetch("PTAR").unwrap().unwrap().rows.len(), 1);
        assert_eq!(src.fetch("PTCI").unwrap().unwrap().rows.len(), 1);
        assert!(src.fetch("AMTRI").unwrap().is_none());
    }

    #[test]
    fn csv_preferred_over_json() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("X.csv"), "a\n1\n2\n").unwrap();
        fs::write(dir.path().join("X.json"), r#"[{"a":1}]"#).unwrap();
        let t = DirectorySource::new(dir.path()).fetch("X").unwrap().unwrap();
        assert_eq!(t.rows.len(), 2);
    }

    #[test]
    fn open_directory_source() {
        let dir = tempdir().unwrap();
        let config = SourceConfig {
            path: Some(dir.path().to_path_buf()),
            ..SourceConfig::default()
        };
        let src = open_source(&config).unwrap();
        assert_eq!(src.describe(), dir.path().display().to_string());
    }

    #[test]
    fn open_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let config = SourceConfig {
            path: Some(dir.path().join("absent")),
            ..SourceConfig::default()
        };
        assert!(matches!(open_source(&config), Err(LoadError::Io { .. })));
    }

    #[test]
    fn open_http_source() {
        let config = SourceConfig {
            kind: SourceKind::Http,
            url_template: Some("http://127.0.0.1:9/{sheet}.csv".into()),
            ..SourceConfig::default()
        };
        let src = open_source(&config).unwrap();
        assert_eq!(src.describe(), "http://127.0.0.1:9/{sheet}.csv");
    }
}
