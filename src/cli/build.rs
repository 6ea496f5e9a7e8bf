//! One-shot builds: `assetline build` and `assetline sprites`.

use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::asset::PipelineRunner;
use crate::config::PipelineConfig;
use crate::core::{Phase, set_phase};
use crate::task::{BuildReport, GraphError, TaskGraph, TaskId, TaskOutcome, execute};
use crate::{debug, log};

/// Run `graph` once and fail if any task failed.
pub fn run_once(config: Arc<PipelineConfig>, graph: &TaskGraph) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to create runtime")?;

    set_phase(Phase::Building);
    let runner = Arc::new(PipelineRunner::new(Arc::clone(&config)));
    let report = runtime.block_on(execute(graph, runner));
    set_phase(Phase::Idle);

    log_report(&report, &config);
    let failed = report.failures().count();
    if failed > 0 {
        bail!("{failed} of {} tasks failed", graph.len());
    }
    Ok(())
}

/// Graph for the `sprites` command.
pub fn sprites_graph() -> Result<TaskGraph, GraphError> {
    Ok(TaskGraph::pipeline()?.subset(&[TaskId::Sprites]))
}

/// Log every task outcome of a build, in completion order.
pub fn log_report(report: &BuildReport, config: &PipelineConfig) {
    for (task, outcome) in report.outcomes() {
        match outcome {
            TaskOutcome::Succeeded(done) => match done.written.as_slice() {
                [] => log!(task.name(); "nothing to write"),
                [only] => log!(task.name(); "{}", config.root_relative(only).display()),
                [first, rest @ ..] => log!(
                    task.name();
                    "{} (+{} more)",
                    config.root_relative(first).display(),
                    rest.len()
                ),
            },
            TaskOutcome::Failed(err) => log!("error"; "{task}: {err}"),
            TaskOutcome::Skipped => log!("warning"; "{task} skipped, a required task failed"),
        }
    }
    debug!("build"; "finished in {:.0?}", report.elapsed());
}
