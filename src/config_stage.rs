use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use tokio::fs;
use tracing::{info, warn};

use crate::{acquire_file_path, acquire_path, path_exists, FlowError, OrchestratorConfig};

/// Appended to the active config file name to get the backup path
pub const BACKUP_SUFFIX: &str = ".bak";

/// What [ConfigStager::stage] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The source is the active config file itself, nothing was copied
    AlreadyActive,
    /// The active location was empty and the source was copied there
    Copied,
    /// The previous active config was copied to `backup` and then replaced
    Replaced { backup: PathBuf },
}

/// Stages user supplied config files into the single active location that
/// the image build expects.
///
/// The active config is never overwritten unless the location was empty, or
/// `force` was given and a backup was written first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStager {
    active: PathBuf,
}

impl ConfigStager {
    pub fn new(work_dir: impl AsRef<Path>, config_name: impl AsRef<Path>) -> Self {
        Self {
            active: work_dir.as_ref().join(config_name),
        }
    }

    pub fn from_config(config: &OrchestratorConfig) -> Self {
        Self::new(&config.work_dir, &config.config_name)
    }

    /// The active config location
    pub fn active_path(&self) -> &Path {
        &self.active
    }

    /// The active location with [BACKUP_SUFFIX] appended
    pub fn backup_path(&self) -> PathBuf {
        let mut backup = OsString::from(self.active.as_os_str());
        backup.push(BACKUP_SUFFIX);
        PathBuf::from(backup)
    }

    /// Copies `source` to the active location.
    ///
    /// - `FlowError::ConfigMissing` if `source` does not exist
    /// - `FlowError::OverwriteRefused` if the active location is occupied by
    ///   another file and `force` is not set. Nothing is modified in this case.
    /// - With `force`, the occupant is copied to [ConfigStager::backup_path]
    ///   (replacing any older backup) before being overwritten.
    pub async fn stage(
        &self,
        source: impl AsRef<Path>,
        force: bool,
    ) -> Result<StageOutcome, FlowError> {
        let source = source.as_ref();
        if !path_exists(source).await? {
            return Err(FlowError::ConfigMissing(source.to_owned()))
        }
        let source_canonical = acquire_file_path(source).await?;
        let active = &self.active;

        if !path_exists(active).await? {
            info!("No existing {active:?} that would get overwritten");
            info!("... Copying {source:?} -> {active:?}");
            copy_file(source, active).await?;
            return Ok(StageOutcome::Copied)
        }

        if acquire_path(active).await? == source_canonical {
            info!("{source:?} is already the active config");
            return Ok(StageOutcome::AlreadyActive)
        }

        if !force {
            warn!("A file {active:?} exists already and would be overwritten");
            warn!("... `--force` flag not set so not proceeding");
            return Err(FlowError::OverwriteRefused(active.clone()))
        }

        warn!("A file {active:?} exists already and will be overwritten");
        let backup = self.backup_path();
        info!("... Making backup of {active:?} -> {backup:?}");
        copy_file(active, &backup).await?;
        info!("... Copying {source:?} -> {active:?}");
        copy_file(source, active).await?;
        Ok(StageOutcome::Replaced { backup })
    }

    /// Checks that a config file occupies the active location, returning
    /// `FlowError::ConfigMissing` with the active path otherwise
    pub async fn require_active(&self) -> Result<PathBuf, FlowError> {
        if path_exists(&self.active).await? {
            acquire_file_path(&self.active).await
        } else {
            Err(FlowError::ConfigMissing(self.active.clone()))
        }
    }
}

async fn copy_file(from: &Path, to: &Path) -> Result<(), FlowError> {
    fs::copy(from, to)
        .await
        .map(|_| ())
        .map_err(|e| FlowError::io(format!("failed to copy {from:?} -> {to:?}"), e))
}
