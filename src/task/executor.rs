//! Graph executor.
//!
//! Runs every task of a [`TaskGraph`] on the blocking pool as soon as its
//! dependencies have finished. Tasks without an edge between them run
//! concurrently; completion order among siblings is unspecified.
//!
//! A panicking task fails on its own while the rest of the graph keeps
//! going. That relies on unwinding: with `panic = "abort"` (the release
//! profile) a panic still ends the process.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tokio::task::{self, JoinSet};

use super::{Edge, ErrorClass, TaskError, TaskGraph, TaskId};
use crate::{debug, log};

/// Performs the work behind each [`TaskId`].
pub trait TaskRunner: Send + Sync + 'static {
    fn run(&self, task: TaskId) -> Result<TaskReport, TaskError>;
}

/// What a successful task produced.
#[derive(Debug, Default, Clone)]
pub struct TaskReport {
    /// Files the task wrote.
    pub written: Vec<PathBuf>,
}

impl TaskReport {
    pub fn wrote(written: Vec<PathBuf>) -> Self {
        Self { written }
    }
}

#[derive(Debug)]
pub enum TaskOutcome {
    Succeeded(TaskReport),
    Failed(TaskError),
    /// A required dependency did not succeed.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl State {
    fn is_finished(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Skipped)
    }
}

/// Outcomes of one graph execution, in completion order.
#[derive(Debug, Default)]
pub struct BuildReport {
    outcomes: Vec<(TaskId, TaskOutcome)>,
    elapsed: Duration,
}

impl BuildReport {
    pub fn outcomes(&self) -> &[(TaskId, TaskOutcome)] {
        &self.outcomes
    }

    pub fn outcome(&self, id: TaskId) -> Option<&TaskOutcome> {
        self.outcomes
            .iter()
            .find(|(task, _)| *task == id)
            .map(|(_, outcome)| outcome)
    }

    pub fn succeeded(&self, id: TaskId) -> bool {
        matches!(self.outcome(id), Some(TaskOutcome::Succeeded(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (TaskId, &TaskError)> {
        self.outcomes.iter().filter_map(|(id, outcome)| match outcome {
            TaskOutcome::Failed(err) => Some((*id, err)),
            _ => None,
        })
    }

    /// Every file written by a successful task.
    pub fn written(&self) -> impl Iterator<Item = &Path> {
        self.outcomes
            .iter()
            .filter_map(|(_, outcome)| match outcome {
                TaskOutcome::Succeeded(report) => Some(report.written.iter()),
                _ => None,
            })
            .flatten()
            .map(PathBuf::as_path)
    }

    /// First failure that must abort startup: any configuration error, or a
    /// failed sprite build.
    pub fn fatal(&self) -> Option<(TaskId, &TaskError)> {
        self.failures()
            .find(|(id, err)| *id == TaskId::Sprites || err.class() == ErrorClass::Configuration)
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Execute `graph`, running each task through `runner`.
pub async fn execute<R: TaskRunner>(graph: &TaskGraph, runner: Arc<R>) -> BuildReport {
    let start = Instant::now();
    if graph.is_empty() {
        return BuildReport::default();
    }
    let mut states: FxHashMap<TaskId, State> =
        graph.ids().map(|id| (id, State::Pending)).collect();
    let mut report = BuildReport::default();
    let mut running = Running::default();

    loop {
        schedule(graph, &mut states, &mut report, &mut running, &runner);

        let Some(joined) = running.set.join_next_with_id().await else {
            break;
        };
        let (id, result) = match joined {
            Ok((handle, result)) => (running.task_of(handle), result),
            Err(err) => {
                log!("error"; "task join failed: {err}");
                (running.task_of(err.id()), Err(TaskError::Panic(err.to_string())))
            }
        };
        let Some(id) = id else {
            continue;
        };

        let outcome = match result {
            Ok(task_report) => {
                states.insert(id, State::Succeeded);
                TaskOutcome::Succeeded(task_report)
            }
            Err(err) => {
                states.insert(id, State::Failed);
                TaskOutcome::Failed(err)
            }
        };
        report.outcomes.push((id, outcome));
    }

    report.elapsed = start.elapsed();
    report
}

/// Tasks on the blocking pool, keyed back to the graph node they run.
#[derive(Default)]
struct Running {
    set: JoinSet<Result<TaskReport, TaskError>>,
    ids: FxHashMap<task::Id, TaskId>,
}

impl Running {
    fn task_of(&mut self, handle: task::Id) -> Option<TaskId> {
        self.ids.remove(&handle)
    }
}

/// Start or skip every pending task whose dependencies have finished.
///
/// Nodes are in topological order, so one pass propagates skips forward.
fn schedule<R: TaskRunner>(
    graph: &TaskGraph,
    states: &mut FxHashMap<TaskId, State>,
    report: &mut BuildReport,
    running: &mut Running,
    runner: &Arc<R>,
) {
    for node in graph.nodes() {
        if states[&node.id] != State::Pending {
            continue;
        }
        if !node.deps.iter().all(|(dep, _)| states[dep].is_finished()) {
            continue;
        }

        let blocked = node
            .deps
            .iter()
            .find(|(dep, edge)| *edge == Edge::Requires && states[dep] != State::Succeeded);
        if let Some((dep, _)) = blocked {
            debug!("build"; "skipping {} because {} did not succeed", node.id, dep);
            states.insert(node.id, State::Skipped);
            report.outcomes.push((node.id, TaskOutcome::Skipped));
            continue;
        }

        states.insert(node.id, State::Running);
        let id = node.id;
        let runner = Arc::clone(runner);
        let handle = running
            .set
            .spawn_blocking(move || run_guarded(runner.as_ref(), id));
        running.ids.insert(handle.id(), id);
    }
}

/// Run one task, turning a panic into a task failure.
fn run_guarded<R: TaskRunner>(runner: &R, id: TaskId) -> Result<TaskReport, TaskError> {
    let start = Instant::now();
    let result = catch_unwind(AssertUnwindSafe(|| runner.run(id))).unwrap_or_else(|panic| {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(TaskError::Panic(message))
    });
    debug!("build"; "{} finished in {:?}", id, start.elapsed());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Records start order; fails the listed tasks.
    #[derive(Default)]
    struct FakeRunner {
        fail: Vec<TaskId>,
        started: Mutex<Vec<TaskId>>,
    }

    impl FakeRunner {
        fn failing(fail: &[TaskId]) -> Arc<Self> {
            Arc::new(Self {
                fail: fail.to_vec(),
                ..Default::default()
            })
        }
    }

    fn pipeline() -> TaskGraph {
        TaskGraph::pipeline().unwrap()
    }

    impl TaskRunner for FakeRunner {
        fn run(&self, task: TaskId) -> Result<TaskReport, TaskError> {
            self.started.lock().push(task);
            if self.fail.contains(&task) {
                return Err(TaskError::compile(format!("{task}.src"), "boom"));
            }
            Ok(TaskReport::wrote(vec![PathBuf::from(format!("out/{task}"))]))
        }
    }

    #[tokio::test]
    async fn test_full_graph_runs_every_task_in_dependency_order() {
        let runner = FakeRunner::failing(&[]);
        let report = execute(&pipeline(), Arc::clone(&runner)).await;

        assert_eq!(report.failures().count(), 0);
        assert_eq!(report.outcomes().len(), 4);

        let started = runner.started.lock().clone();
        assert_eq!(started.first(), Some(&TaskId::Sprites));
        assert_eq!(started.last(), Some(&TaskId::CacheBust));
        assert_eq!(report.written().count(), 4);
    }

    #[tokio::test]
    async fn test_required_failure_skips_dependents() {
        let runner = FakeRunner::failing(&[TaskId::Sprites]);
        let report = execute(&pipeline(), Arc::clone(&runner)).await;

        assert!(matches!(report.outcome(TaskId::Styles), Some(TaskOutcome::Skipped)));
        assert!(matches!(report.outcome(TaskId::Scripts), Some(TaskOutcome::Skipped)));
        assert!(!runner.started.lock().contains(&TaskId::Styles));

        // The join only waits for its upstreams to finish.
        assert!(report.succeeded(TaskId::CacheBust));
        assert_eq!(report.fatal().map(|(id, _)| id), Some(TaskId::Sprites));
    }

    #[tokio::test]
    async fn test_after_failure_still_runs_join() {
        let runner = FakeRunner::failing(&[TaskId::Styles]);
        let report = execute(&pipeline(), runner).await;

        assert!(matches!(report.outcome(TaskId::Styles), Some(TaskOutcome::Failed(_))));
        assert!(report.succeeded(TaskId::Scripts));
        assert!(report.succeeded(TaskId::CacheBust));
        // Compile errors are not fatal.
        assert!(report.fatal().is_none());
        assert_eq!(report.failures().count(), 1);
    }

    #[tokio::test]
    async fn test_subset_ignores_dropped_dependencies() {
        let graph = pipeline().subset(&[TaskId::Scripts, TaskId::CacheBust]);
        let runner = FakeRunner::failing(&[]);
        let report = execute(&graph, Arc::clone(&runner)).await;

        assert_eq!(
            runner.started.lock().as_slice(),
            [TaskId::Scripts, TaskId::CacheBust]
        );
        assert!(report.outcome(TaskId::Sprites).is_none());
        assert!(report.succeeded(TaskId::Scripts));
        assert!(report.succeeded(TaskId::CacheBust));
    }

    #[tokio::test]
    async fn test_configuration_error_is_fatal() {
        struct MissingTemplate;
        impl TaskRunner for MissingTemplate {
            fn run(&self, task: TaskId) -> Result<TaskReport, TaskError> {
                match task {
                    TaskId::CacheBust => Err(TaskError::Configuration("template missing".into())),
                    _ => Ok(TaskReport::default()),
                }
            }
        }

        let report = execute(&pipeline(), Arc::new(MissingTemplate)).await;
        assert_eq!(report.fatal().map(|(id, _)| id), Some(TaskId::CacheBust));
    }

    #[tokio::test]
    async fn test_panicking_task_fails() {
        struct Panics;
        impl TaskRunner for Panics {
            fn run(&self, task: TaskId) -> Result<TaskReport, TaskError> {
                if task == TaskId::Scripts {
                    panic!("minifier exploded");
                }
                Ok(TaskReport::default())
            }
        }

        let graph = pipeline().subset(&[TaskId::Scripts]);
        let report = execute(&graph, Arc::new(Panics)).await;
        assert!(matches!(
            report.outcome(TaskId::Scripts),
            Some(TaskOutcome::Failed(TaskError::Panic(msg))) if msg == "minifier exploded"
        ));
    }

    #[tokio::test]
    async fn test_panicking_dependency_skips_dependents() {
        struct SpritesPanic;
        impl TaskRunner for SpritesPanic {
            fn run(&self, task: TaskId) -> Result<TaskReport, TaskError> {
                if task == TaskId::Sprites {
                    panic!("bad png");
                }
                Ok(TaskReport::default())
            }
        }

        let report = execute(&pipeline(), Arc::new(SpritesPanic)).await;
        assert!(matches!(report.outcome(TaskId::Sprites), Some(TaskOutcome::Failed(_))));
        assert!(matches!(report.outcome(TaskId::Styles), Some(TaskOutcome::Skipped)));
        assert!(report.succeeded(TaskId::CacheBust));
        assert_eq!(report.outcomes().len(), 4);
    }

    #[tokio::test]
    async fn test_join_error_maps_back_to_task() {
        let mut running = Running::default();
        let handle = running.set.spawn_blocking(|| -> Result<TaskReport, TaskError> {
            panic!("escaped the guard")
        });
        running.ids.insert(handle.id(), TaskId::Styles);

        let err = running.set.join_next_with_id().await.unwrap().unwrap_err();
        assert!(err.is_panic());
        assert_eq!(running.task_of(err.id()), Some(TaskId::Styles));
        assert!(running.ids.is_empty());
    }

    #[tokio::test]
    async fn test_empty_graph() {
        let report = execute(&TaskGraph::new(), FakeRunner::failing(&[])).await;
        assert!(report.outcomes().is_empty());
        assert_eq!(report.written().count(), 0);
    }
}
