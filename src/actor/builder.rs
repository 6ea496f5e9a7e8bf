//! Builder Actor
//!
//! Reruns the pipelines affected by a change batch, then the cache-buster,
//! then asks the WsActor for a reload.
//!
//! A running build is never cancelled. Batches arriving meanwhile wait in
//! the channel and are merged into a single follow-up build.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;

use super::fs::ChangeScope;
use super::messages::{BuildMsg, FsMsg, WsMsg};
use crate::core::{Phase, set_phase};
use crate::logger;
use crate::task::{BuildReport, TaskGraph, TaskId, TaskRunner, execute};

pub struct BuilderActor<R: TaskRunner> {
    rx: mpsc::Receiver<BuildMsg>,
    fs_tx: mpsc::Sender<FsMsg>,
    /// Absent when live reload is disabled
    ws_tx: Option<mpsc::Sender<WsMsg>>,
    /// Full graph; each rebuild runs a subset of it
    graph: TaskGraph,
    runner: Arc<R>,
}

impl<R: TaskRunner> BuilderActor<R> {
    pub fn new(
        rx: mpsc::Receiver<BuildMsg>,
        fs_tx: mpsc::Sender<FsMsg>,
        ws_tx: Option<mpsc::Sender<WsMsg>>,
        graph: TaskGraph,
        runner: Arc<R>,
    ) -> Self {
        Self {
            rx,
            fs_tx,
            ws_tx,
            graph,
            runner,
        }
    }

    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            let BuildMsg::Changed(mut scope) = msg else {
                break;
            };

            // whatever queued up during the previous build joins this one
            let mut shutdown = false;
            while let Ok(queued) = self.rx.try_recv() {
                match queued {
                    BuildMsg::Changed(more) => scope.merge(more),
                    BuildMsg::Shutdown => {
                        shutdown = true;
                        break;
                    }
                }
            }

            self.rebuild(scope).await;
            if shutdown {
                break;
            }
        }
        crate::debug!("build"; "stopped");
    }

    async fn rebuild(&self, scope: ChangeScope) {
        let tasks = scope.tasks();
        let mut reload = scope.templates;

        if tasks.is_empty() {
            logger::status_success(&format!("changed {}", scope.describe()));
        } else {
            set_phase(Phase::Building);
            let graph = self.graph.subset(&tasks);
            let report = execute(&graph, Arc::clone(&self.runner)).await;

            let written: Vec<PathBuf> = report.written().map(Path::to_path_buf).collect();
            if !written.is_empty() {
                let _ = self.fs_tx.send(FsMsg::Suppress(written)).await;
            }

            report_status(&scope, &report);
            // nothing new to show if every rebuilt pipeline failed
            reload |= tasks
                .iter()
                .any(|&id| id != TaskId::CacheBust && report.succeeded(id));
        }

        if reload && let Some(ws_tx) = &self.ws_tx {
            set_phase(Phase::Reloading);
            let reason = scope.describe();
            let _ = ws_tx.send(WsMsg::Reload { reason }).await;
        }
        set_phase(Phase::Watching);
    }
}

/// Overwrite the watch status line with the outcome of a rebuild.
fn report_status(scope: &ChangeScope, report: &BuildReport) {
    let failures: Vec<_> = report.failures().collect();
    if failures.is_empty() {
        logger::status_success(&format!(
            "rebuilt {} in {:.0?}",
            scope.describe(),
            report.elapsed()
        ));
        return;
    }

    let names: Vec<&str> = failures.iter().map(|(id, _)| id.name()).collect();
    let detail = failures
        .iter()
        .map(|(_, err)| err.to_string())
        .collect::<Vec<_>>()
        .join("\n");
    logger::status_error(&format!("{} failed", names.join(", ")), &detail);
}
