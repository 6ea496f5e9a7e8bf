//! FileSystem Actor
//!
//! Watches the input globs and sends debounced, classified change batches to
//! the BuilderActor. The watcher is created before the initial build, so
//! edits made while it runs are buffered rather than lost.
//!
//! ```text
//! Watcher → Debouncer (timing) → SelfWrites (own outputs) → Classifier (scope) → BuildMsg
//! ```

use std::time::Duration;

use notify::{PollWatcher, Watcher};
use tokio::sync::mpsc;

use super::messages::{BuildMsg, FsMsg};
use crate::config::PipelineConfig;

// Scope classification (raw changes -> ChangeScope).
mod classifier;
// Pure timing and deduplication.
mod debouncer;
// Suppression of events caused by our own writes.
mod suppress;
// Shared fs event types.
mod types;
// Watch root attach/re-attach lifecycle.
mod watch_roots;

#[cfg(test)]
mod tests;

pub use classifier::ChangeScope;

use classifier::ScopeClassifier;
use debouncer::Debouncer;
use suppress::SelfWrites;
use watch_roots::WatchRoots;

/// Longest wait before missing watch roots are checked again.
const MAINTAIN_INTERVAL: Duration = Duration::from_secs(1);

type NotifyResult = notify::Result<notify::Event>;

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<NotifyResult>,
    /// Watcher handle (must be kept alive)
    watcher: Box<dyn Watcher + Send>,
    watch_roots: WatchRoots,
    classifier: ScopeClassifier,
    debouncer: Debouncer,
    self_writes: SelfWrites,
    rx: mpsc::Receiver<FsMsg>,
    build_tx: mpsc::Sender<BuildMsg>,
}

impl FsActor {
    /// Start watching immediately; events buffer until [`FsActor::run`].
    pub fn new(
        config: &PipelineConfig,
        rx: mpsc::Receiver<FsMsg>,
        build_tx: mpsc::Sender<BuildMsg>,
    ) -> anyhow::Result<Self> {
        let classifier = ScopeClassifier::new(config)?;
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let handler = move |res: NotifyResult| {
            let _ = notify_tx.send(res);
        };

        let mut watcher: Box<dyn Watcher + Send> = if config.watch.poll {
            let options = notify::Config::default().with_poll_interval(config.watch.interval());
            Box::new(PollWatcher::new(handler, options)?)
        } else {
            Box::new(notify::recommended_watcher(handler)?)
        };

        let mut watch_roots = WatchRoots::new(classifier.roots());
        watch_roots.attach_existing(watcher.as_mut())?;
        for root in watch_roots.desired() {
            crate::debug!("watch"; "root {}", root.display());
        }

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots,
            classifier,
            debouncer: Debouncer::new(config.watch.debounce()),
            self_writes: SelfWrites::default(),
            rx,
            build_tx,
        })
    }

    /// Run the actor event loop
    pub async fn run(self) {
        let Self {
            notify_rx,
            mut watcher,
            mut watch_roots,
            classifier,
            mut debouncer,
            mut self_writes,
            mut rx,
            build_tx,
        } = self;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // notify delivers on its own thread through a sync channel
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            let wait = debouncer.sleep_duration().min(MAINTAIN_INTERVAL);
            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Some(FsMsg::Suppress(paths)) => self_writes.record(paths),
                    Some(FsMsg::Shutdown) | None => break,
                },
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(wait) => {
                    watch_roots.maintain(watcher.as_mut());
                    let Some(scope) = take_scope(&mut debouncer, &mut self_writes, &classifier) else {
                        continue;
                    };
                    crate::debug!("watch"; "changed: {}", scope.describe());
                    if build_tx.send(BuildMsg::Changed(scope)).await.is_err() {
                        break;
                    }
                }
            }
        }
        crate::debug!("watch"; "stopped");
    }
}

/// Turn a ready debounced batch into a scope, dropping our own writes.
fn take_scope(
    debouncer: &mut Debouncer,
    self_writes: &mut SelfWrites,
    classifier: &ScopeClassifier,
) -> Option<ChangeScope> {
    let mut changes = debouncer.take_if_ready()?;
    self_writes.filter(&mut changes);
    if changes.is_empty() {
        return None;
    }
    classifier.classify(changes)
}
