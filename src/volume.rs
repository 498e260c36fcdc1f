use std::path::{Path, PathBuf};

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{ctrlc_issued, ensure_parent_dir, ContainerEngine, FlowError, OrchestratorConfig};

/// Everything needed to move one artifact out of a producer container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    /// Image used for both the anchor and the producer container
    pub tag: String,
    /// The producer program and its arguments, run inside the container
    pub producer: Vec<String>,
    /// The anchor container is named with this prefix and a UUID
    pub volume_prefix: String,
    /// Mount point of the transfer volume inside containers
    pub data_mount: String,
    /// Where the producer leaves the artifact, inside `data_mount`
    pub container_artifact_path: String,
    /// Where the artifact ends up on the host
    pub host_output_path: PathBuf,
}

impl TransferPlan {
    /// The JSON building plan: runs `{producer} --output={artifact path}` and
    /// extracts the result to `host_output_path`
    pub fn build_json(config: &OrchestratorConfig, host_output_path: impl AsRef<Path>) -> Self {
        let container_artifact_path = config.container_artifact_path();
        Self {
            tag: config.tag.clone(),
            producer: vec![
                config.producer.clone(),
                format!("--output={container_artifact_path}"),
            ],
            volume_prefix: config.volume_prefix.clone(),
            data_mount: config.data_mount.clone(),
            container_artifact_path,
            host_output_path: host_output_path.as_ref().to_owned(),
        }
    }
}

/// A shared volume anchored by a throwaway container. The volume lives until
/// [DataVolume::destroy] removes the anchor container together with its
/// volumes.
///
/// # Note
///
/// There is no async drop, so `destroy` has to be called explicitly on every
/// path. A `DataVolume` dropped without it logs a warning with the name that
/// needs manual `docker rm -v`.
#[must_use]
#[derive(Debug)]
pub struct DataVolume {
    engine: ContainerEngine,
    name: String,
    destroyed: bool,
}

impl Drop for DataVolume {
    fn drop(&mut self) {
        if !self.destroyed && (!std::thread::panicking()) {
            warn!(
                "A `DataVolume` was dropped without being destroyed, the anchor container {} \
                 and its volume are leaked",
                self.name
            )
        }
    }
}

impl DataVolume {
    /// `{prefix}-{uuid}`, distinct for concurrent pipeline runs
    pub fn unique_name(prefix: &str) -> String {
        format!("{prefix}-{}", Uuid::new_v4().simple())
    }

    /// Creates the anchor container `name` from image `tag` with a volume at
    /// `mount`
    pub async fn create(
        engine: &ContainerEngine,
        name: &str,
        mount: &str,
        tag: &str,
    ) -> Result<Self, FlowError> {
        engine
            .create_anchor(name, mount, tag)
            .run_to_completion()
            .await?;
        info!("created transfer volume {name}");
        Ok(Self {
            engine: engine.clone(),
            name: name.to_owned(),
            destroyed: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Removes the anchor container and its volume
    pub async fn destroy(mut self) -> Result<(), FlowError> {
        // even if removal fails, there is nothing more this handle can do
        self.destroyed = true;
        self.engine
            .remove_with_volumes(&self.name)
            .run_to_completion()
            .await?;
        info!("removed transfer volume {}", self.name);
        Ok(())
    }
}

fn check_interrupt() -> Result<(), FlowError> {
    if ctrlc_issued() {
        Err(FlowError::Interrupted)
    } else {
        Ok(())
    }
}

/// Runs the producer against a fresh transfer volume and copies the artifact
/// to the host.
///
/// 1. create the anchor container and its volume
/// 2. run the producer in a fresh container with the volume mounted
/// 3. ensure the host output directory exists
/// 4. copy the artifact out through the anchor container
/// 5. remove the anchor container and volume
///
/// Step 4 only starts after the producer process has exited successfully.
/// Step 5 runs whenever step 1 succeeded, no matter how steps 2-4 went. If
/// both a data step and the cleanup fail, the data step's error is returned
/// and the cleanup error is logged.
pub async fn transfer(engine: &ContainerEngine, plan: &TransferPlan) -> Result<(), FlowError> {
    let name = DataVolume::unique_name(&plan.volume_prefix);
    let volume = DataVolume::create(engine, &name, &plan.data_mount, &plan.tag).await?;

    let res = produce_and_extract(engine, &volume, plan).await;
    let cleanup = volume.destroy().await;

    match (res, cleanup) {
        (Ok(()), cleanup) => cleanup,
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup_err)) => {
            error!(
                "failed to remove transfer volume {name} after an earlier failure: {cleanup_err}"
            );
            Err(e)
        }
    }
}

async fn produce_and_extract(
    engine: &ContainerEngine,
    volume: &DataVolume,
    plan: &TransferPlan,
) -> Result<(), FlowError> {
    check_interrupt()?;
    engine
        .run(["--volumes-from", volume.name()], &plan.tag, &plan.producer)
        .run_to_completion()
        .await?;

    check_interrupt()?;
    ensure_parent_dir(&plan.host_output_path).await?;
    engine
        .copy_out(
            volume.name(),
            &plan.container_artifact_path,
            &plan.host_output_path,
        )
        .run_to_completion()
        .await?;
    info!(
        "extracted {} -> {:?}",
        plan.container_artifact_path, plan.host_output_path
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_names_differ() {
        let a = DataVolume::unique_name("json-output-data");
        let b = DataVolume::unique_name("json-output-data");
        assert!(a.starts_with("json-output-data-"));
        assert_ne!(a, b);
    }

    #[test]
    fn build_json_plan() {
        let config = OrchestratorConfig::default();
        let plan = TransferPlan::build_json(&config, "output/movies.json");
        assert_eq!(plan.producer, ["build_json.py", "--output=/data/movies.json"]);
        assert_eq!(plan.container_artifact_path, "/data/movies.json");
        assert_eq!(plan.host_output_path, Path::new("output/movies.json"));
    }
}
