//! `run` and `cycle` commands.

use anyhow::{Result, bail};
use std::sync::Arc;

use super::Env;
use crate::core::ThreadSleeper;
use crate::cycle::{CycleStatus, Orchestrator};
use crate::log;
use crate::publish::{GitCli, UreqTransport};
use crate::scheduler::Scheduler;

fn orchestrator(env: &Env) -> Orchestrator {
    let runtime = &env.config.runtime;
    Orchestrator::new(
        env.store.clone(),
        env.sink.clone(),
        Arc::new(GitCli::new(&runtime.base_path, runtime.timeout())),
        Arc::new(UreqTransport::new(runtime.timeout())),
        Arc::new(ThreadSleeper),
    )
}

/// Run a single cycle; an `error` cycle fails the command.
pub fn run_once(env: &Env) -> Result<()> {
    let summary = orchestrator(env).run();
    if summary.status == CycleStatus::Error {
        bail!(
            "cycle failed: {}",
            summary.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

/// Schedule cycles until Ctrl+C.
pub fn run_forever(env: &Env) -> Result<()> {
    log!("scheduler"; "started with config {}", env.store.path().display());
    let scheduler = Scheduler::new(
        Arc::new(orchestrator(env)),
        env.store.clone(),
        Arc::new(ThreadSleeper),
        env.sink.clone(),
    );
    scheduler.run();
    Ok(())
}
