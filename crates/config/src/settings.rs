// Dashboard settings
// Loaded from --config or ~/.config/ctrlboard/config.toml

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use ctrlboard_core::ColumnNames;

use crate::error::ConfigError;

/// Replaced by the sheet name in `source.url_template`.
pub const SHEET_PLACEHOLDER: &str = "{sheet}";

/// Where tables come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Local directory of `<sheet>.csv` / `<sheet>.json` exports (default)
    #[default]
    Directory,
    /// Published CSV export per sheet, fetched over HTTP
    Http,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub kind: SourceKind,

    /// Directory source: folder holding the exports.
    pub path: Option<PathBuf>,

    /// HTTP source: URL with a `{sheet}` placeholder.
    pub url_template: Option<String>,

    /// HTTP source: per-request timeout.
    pub timeout_secs: u64,

    /// HTTP source: retries on 429/5xx before giving up.
    pub max_retries: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Directory,
            path: None,
            url_template: None,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

/// Sheet (table) names in the upstream workbook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetNames {
    pub plan: String,
    pub action_detail: String,
    pub improvement_plan: String,
    pub improvement_detail: String,
    /// Optional name crosswalk; absent means no audit.
    pub crosswalk: Option<String>,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            plan: "PTAR".into(),
            action_detail: "ACTRI".into(),
            improvement_plan: "PTCI".into(),
            improvement_detail: "AMTRI".into(),
            crosswalk: None,
        }
    }
}

impl SheetNames {
    /// Every configured sheet name, required ones first.
    pub fn all(&self) -> Vec<&str> {
        let mut names = vec![
            self.plan.as_str(),
            self.action_detail.as_str(),
            self.improvement_plan.as_str(),
            self.improvement_detail.as_str(),
        ];
        names.extend(self.crosswalk.as_deref());
        names
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Snapshot lifetime before the next access refetches.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 3600 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub source: SourceConfig,
    pub sheets: SheetNames,
    pub cache: CacheConfig,
    pub columns: ColumnNames,
}

impl Settings {
    /// Default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ctrlboard")
            .join("config.toml")
    }

    /// Parse and validate TOML text. Relative paths are left as written.
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate a config file. A relative `source.path` resolves
    /// against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = Self::read(path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Like [`Settings::load`] without validation, for callers that still
    /// apply command-line overrides.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut settings: Settings =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;

        if let (Some(data), Some(base)) = (settings.source.path.as_ref(), path.parent()) {
            if data.is_relative() {
                settings.source.path = Some(base.join(data));
            }
        }

        log::debug!("loaded config from {}", path.display());
        Ok(settings)
    }

    /// Read the default config file if present, otherwise defaults.
    ///
    /// Not validated: the caller usually fills in the data source from the
    /// command line first.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::read(&path)
        } else {
            log::debug!("no config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.source.kind {
            SourceKind::Directory => {
                if self.source.path.is_none() {
                    return Err(ConfigError::Validation(
                        "directory source requires source.path".into(),
                    ));
                }
            }
            SourceKind::Http => match &self.source.url_template {
                None => {
                    return Err(ConfigError::Validation(
                        "http source requires source.url_template".into(),
                    ))
                }
                Some(t) if !t.contains(SHEET_PLACEHOLDER) => {
                    return Err(ConfigError::Validation(format!(
                        "source.url_template must contain {SHEET_PLACEHOLDER}"
                    )))
                }
                Some(_) => {}
            },
        }

        let names = self.sheets.all();
        if let Some(blank) = names.iter().find(|n| n.trim().is_empty()) {
            return Err(ConfigError::Validation(format!("sheet name '{blank}' is empty")));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = names.iter().find(|n| !seen.insert(**n)) {
            return Err(ConfigError::Validation(format!("sheet '{dup}' is used for two tables")));
        }

        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::Validation("cache.ttl_secs must be > 0".into()));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
