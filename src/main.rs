use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use dtdd_orchestrator::{
    ctrlc_issued, install_ctrlc_handler, OrchestratorConfig, Routine, DEFAULT_CONFIG_NAME,
    DEFAULT_ENGINE, DEFAULT_TAG,
};
use stacked_errors::{Result, StackableErr};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dtdd", about)]
struct Args {
    /// Docker image name/tag to use
    #[arg(long, env = "DTDD_TAG", default_value = DEFAULT_TAG, global = true)]
    tag: String,
    /// Container engine program
    #[arg(long, env = "DTDD_ENGINE", default_value = DEFAULT_ENGINE, global = true)]
    engine: String,
    /// Directory holding the build context and the active config file
    #[arg(long, env = "DTDD_WORK_DIR", default_value = ".", global = true)]
    work_dir: PathBuf,
    /// File name of the active config file inside the work directory
    #[arg(long, default_value = DEFAULT_CONFIG_NAME, global = true)]
    config_name: String,
    #[command(subcommand)]
    routine: Option<Routine>,
}

impl Args {
    fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            config_name: self.config_name.clone(),
            ..OrchestratorConfig::default()
        }
        .engine(&self.engine)
        .tag(&self.tag)
        .work_dir(&self.work_dir)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let Some(routine) = args.routine.as_ref() else {
        Args::command().print_help().stack()?;
        return Ok(())
    };

    if let Err(e) = install_ctrlc_handler() {
        warn!("could not install the Ctrl-C handler, interrupts will skip cleanup: {e}");
    }

    let config = args.orchestrator_config();
    let res = routine.dispatch(&config).await;
    if res.is_err() && ctrlc_issued() {
        error!("interrupted");
    }
    res
}
