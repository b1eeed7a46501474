//! Resolved settings, the table source they describe, and the snapshot cache.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ctrlboard_config::{Settings, SourceKind};
use ctrlboard_core::ColumnNames;
use ctrlboard_io::{load_snapshot, open_source, SnapshotCache, TableSource};
use ctrlboard_recon::Snapshot;

use crate::CliError;

pub struct Workspace {
    pub settings: Settings,
    source: Box<dyn TableSource>,
    cache: SnapshotCache,
}

impl Workspace {
    /// Settings from `--config` (or the default file), with `--data`
    /// switching the source to that directory.
    pub fn open(config: Option<&Path>, data: Option<&Path>) -> Result<Self, CliError> {
        let mut settings = match config {
            Some(path) => Settings::read(path),
            None => Settings::load_or_default(),
        }
        .map_err(CliError::config)?;

        if let Some(dir) = data {
            settings.source.kind = SourceKind::Directory;
            settings.source.path = Some(dir.to_path_buf());
        }
        settings.validate().map_err(CliError::config)?;

        let source = open_source(&settings.source).map_err(CliError::load)?;
        let cache = SnapshotCache::new(Duration::from_secs(settings.cache.ttl_secs));
        Ok(Self { settings, source, cache })
    }

    pub fn columns(&self) -> &ColumnNames {
        &self.settings.columns
    }

    pub fn describe_source(&self) -> String {
        self.source.describe()
    }

    pub fn snapshot(&self) -> Result<Arc<Snapshot>, CliError> {
        self.cache
            .get_or_refresh(|| load_snapshot(self.source.as_ref(), &self.settings.sheets, &self.settings.columns))
            .map_err(CliError::load)
    }
}
