use std::path::PathBuf;

use notify::{RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

/// Keeps the configured watch roots attached to the watcher.
///
/// Roots missing at startup (or deleted later) are attached as soon as
/// they (re)appear.
pub(super) struct WatchRoots {
    desired: Vec<PathBuf>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    pub(super) fn new(mut paths: Vec<PathBuf>) -> Self {
        paths.sort();
        paths.dedup();
        // a root inside another root is already covered recursively
        let roots: Vec<PathBuf> = paths
            .iter()
            .filter(|p| !paths.iter().any(|q| q != *p && p.starts_with(q)))
            .cloned()
            .collect();
        Self {
            desired: roots,
            attached: FxHashSet::default(),
        }
    }

    pub(super) fn desired(&self) -> &[PathBuf] {
        &self.desired
    }

    pub(super) fn attach_existing(&mut self, watcher: &mut dyn Watcher) -> notify::Result<()> {
        for path in &self.desired {
            if !path.exists() {
                crate::debug!("watch"; "not yet present: {}", path.display());
                continue;
            }
            watcher.watch(path, RecursiveMode::Recursive)?;
            self.attached.insert(path.clone());
        }
        Ok(())
    }

    pub(super) fn maintain(&mut self, watcher: &mut dyn Watcher) {
        self.attached.retain(|path| path.exists());

        for path in &self.desired {
            if self.attached.contains(path) || !path.exists() {
                continue;
            }
            if watcher.watch(path, RecursiveMode::Recursive).is_ok() {
                self.attached.insert(path.clone());
                crate::debug!("watch"; "re-attached watch: {}", path.display());
            }
        }
    }
}
