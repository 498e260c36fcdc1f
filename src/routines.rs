use std::path::{Path, PathBuf};

use clap::Subcommand;
use stacked_errors::{Result, StackableErr};
use tracing::{info, warn};

use crate::{
    acquire_file_path, path_exists, transfer, ConfigStager, FlowError, OrchestratorConfig,
    TransferPlan, DEFAULT_OUTPUT_PATH,
};

/// The orchestration routines, one per subcommand
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Routine {
    /// Build the docker image, staging a config file first if one is given
    #[command(name = "docker_build")]
    DockerBuild {
        /// Path to the config.py to use
        #[arg(long)]
        config: Option<PathBuf>,
        /// Use the `--config` file even if a config.py exists already (a backup
        /// will be created)
        #[arg(long)]
        force: bool,
    },
    /// Build the DoesTheDogDie JSON file
    #[command(name = "build_json")]
    BuildJson {
        /// Path to write the file to
        #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
        output: PathBuf,
    },
    /// Write the JSON update data to Plex
    #[command(name = "write_to_plex")]
    WriteToPlex {
        /// Path to the JSON file containing movie update data
        #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
        json_path: PathBuf,
    },
}

impl Routine {
    /// Runs the routine. Every routine is a straight sequence of stages, the
    /// first failing stage aborts it.
    pub async fn dispatch(&self, config: &OrchestratorConfig) -> Result<()> {
        match self {
            Routine::DockerBuild { config: source, force } => {
                docker_build(config, source.as_deref(), *force).await
            }
            Routine::BuildJson { output } => build_json(config, output).await,
            Routine::WriteToPlex { json_path } => write_to_plex(config, json_path).await,
        }
    }
}

/// Stages `config_source` (if any), requires an active config, and builds the
/// image tagged `config.tag` from `config.work_dir`
pub async fn docker_build(
    config: &OrchestratorConfig,
    config_source: Option<&Path>,
    force: bool,
) -> Result<()> {
    let stager = ConfigStager::from_config(config);
    if let Some(source) = config_source {
        stager
            .stage(source, force)
            .await
            .stack_err_locationless("docker_build -> could not stage the config file")?;
    } else {
        warn!(
            "`--config` not specified, assuming a {:?} exists in {:?}",
            config.config_name, config.work_dir
        );
    }
    stager
        .require_active()
        .await
        .stack_err_locationless("docker_build -> the image needs a config file")?;

    config
        .container_engine()
        .build(&config.tag, &config.work_dir)
        .run_to_completion()
        .await
        .stack_err_locationless("docker_build -> image build failed")?;
    info!("built image {}", config.tag);
    Ok(())
}

/// Produces the JSON artifact in a container and extracts it to `output`
/// (relative to `config.work_dir`)
pub async fn build_json(config: &OrchestratorConfig, output: &Path) -> Result<()> {
    ConfigStager::from_config(config)
        .require_active()
        .await
        .stack_err_locationless("build_json")?;

    let output = config.resolve(output);
    let plan = TransferPlan::build_json(config, &output);
    transfer(&config.container_engine(), &plan)
        .await
        .stack_err_with_locationless(|| format!("build_json -> transfer to {output:?} failed"))?;
    info!("JSON written to {output:?}");
    Ok(())
}

/// Runs the consumer in a container with the artifact at `json_path`
/// (relative to `config.work_dir`) mounted read only
pub async fn write_to_plex(config: &OrchestratorConfig, json_path: &Path) -> Result<()> {
    ConfigStager::from_config(config)
        .require_active()
        .await
        .stack_err_locationless("write_to_plex")?;

    let json_path = config.resolve(json_path);
    if !path_exists(&json_path).await.stack()? {
        return Err(FlowError::ArtifactMissing(json_path))
            .stack_err_locationless("write_to_plex -> run `build_json` first")
    }
    let host_path = acquire_file_path(&json_path).await.stack()?;
    let container_path = config.container_artifact_path();
    let mount = format!("{}:{container_path}:ro", host_path.display());

    config
        .container_engine()
        .run(
            ["-v", mount.as_str()],
            &config.tag,
            [
                config.consumer.clone(),
                format!("--json-path={container_path}"),
            ],
        )
        .run_to_completion()
        .await
        .stack_err_locationless("write_to_plex -> writing to Plex failed")?;
    info!("All done!");
    Ok(())
}
