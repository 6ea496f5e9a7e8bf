use std::path::{Path, PathBuf};
use std::time::SystemTime;

use rustc_hash::FxHashMap;

use super::types::ChangeKind;
use crate::utils::path::normalize_path;

/// Files the builder wrote, keyed by the mtime it left behind.
///
/// A change event for such a file is dropped while its mtime is still the
/// recorded one. A later edit moves the mtime and is seen normally.
#[derive(Default)]
pub(super) struct SelfWrites {
    written: FxHashMap<PathBuf, Option<SystemTime>>,
}

impl SelfWrites {
    pub(super) fn record(&mut self, paths: Vec<PathBuf>) {
        for path in paths {
            let path = normalize_path(&path);
            let mtime = modified(&path);
            self.written.insert(path, mtime);
        }
    }

    /// Drop events caused by our own writes. Each record is used once.
    pub(super) fn filter(&mut self, changes: &mut FxHashMap<PathBuf, ChangeKind>) {
        if self.written.is_empty() {
            return;
        }
        changes.retain(|path, kind| {
            let Some(recorded) = self.written.remove(path) else {
                return true;
            };
            let own = *kind != ChangeKind::Removed && modified(path) == recorded;
            if own {
                crate::debug!("watch"; "ignore self-write: {}", path.display());
            }
            !own
        });
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}
