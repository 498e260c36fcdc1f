#![cfg(unix)]

mod common;

use common::FakeEngine;
use dtdd_orchestrator::{Command, FlowError};
use stacked_errors::{ensure, ensure_eq, Result, StackableErr};

fn dtdd(engine: &FakeEngine) -> Command {
    Command::new_os_str(env!("CARGO_BIN_EXE_dtdd"))
        .arg("--engine")
        .arg(engine.script("docker"))
        .arg("--work-dir")
        .arg(engine.work_dir())
        .env("RUST_LOG", "info")
}

#[tokio::test]
async fn missing_artifact_exits_nonzero() -> Result<()> {
    let engine = FakeEngine::new().with_active_config();
    let err = dtdd(&engine)
        .args(["write_to_plex", "--json-path", "nope.json"])
        .run_to_completion()
        .await
        .unwrap_err();
    ensure_eq!(err.exit_code(), Some(1));
    ensure!(engine.invocations().is_empty());
    ensure!(engine.consumed().is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_config_exits_nonzero() -> Result<()> {
    let engine = FakeEngine::new();
    for routine in ["build_json", "write_to_plex", "docker_build"] {
        let err = dtdd(&engine)
            .arg(routine)
            .run_to_completion()
            .await
            .unwrap_err();
        ensure!(matches!(err, FlowError::ProcessFailure { code: Some(1), .. }));
    }
    ensure!(engine.invocations().is_empty());
    Ok(())
}

#[tokio::test]
async fn no_subcommand_prints_help() -> Result<()> {
    let engine = FakeEngine::new();
    let res = dtdd(&engine).run_to_completion().await.stack()?;
    ensure!(res.successful());
    ensure!(res.lines.iter().any(|l| l.starts_with("Usage: dtdd")));
    ensure!(engine.invocations().is_empty());
    Ok(())
}
