#![cfg(unix)]

//! Kept in its own test binary, `CTRLC_ISSUED` is process global

mod common;

use std::sync::atomic::Ordering;

use common::FakeEngine;
use dtdd_orchestrator::{transfer, FlowError, TransferPlan, CTRLC_ISSUED};
use stacked_errors::{ensure, ensure_eq, Result, StackableErr};

#[tokio::test]
async fn interrupt_still_destroys_volume() -> Result<()> {
    let engine = FakeEngine::new().with_active_config();
    let config = engine.config();
    let output = engine.work_dir().join("output/movies.json");
    let plan = TransferPlan::build_json(&config, &output);

    CTRLC_ISSUED.store(true, Ordering::SeqCst);
    let err = transfer(&config.container_engine(), &plan)
        .await
        .unwrap_err();
    ensure!(matches!(err, FlowError::Interrupted));
    ensure!(!output.exists());

    let invocations = engine.invocations();
    ensure_eq!(invocations.len(), 2);
    ensure!(invocations[0].starts_with("create -v /data --name json-output-data-"));
    ensure!(invocations.last().stack()?.starts_with("rm -v json-output-data-"));
    ensure!(engine.leftover_volumes().is_empty());
    Ok(())
}
