use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::types::ChangeKind;
use crate::utils::path::normalize_path;

/// Sleep used while nothing is pending.
const IDLE: Duration = Duration::from_secs(86400);

/// Pure debouncer: only handles timing and event deduplication.
pub(super) struct Debouncer {
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
    quiet: Duration,
}

impl Debouncer {
    pub(super) fn new(quiet: Duration) -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
            quiet,
        }
    }

    /// Add a notify event, applying dedup rules:
    /// - Remove + Create/Modify → Create/Modify (file was restored)
    /// - Modify + Remove → Remove (file was deleted)
    /// - Create + Remove → nothing (file came and went)
    /// - otherwise the first event wins
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;
        use notify::event::{MetadataKind, ModifyKind};

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            // the poll watcher reports content edits as write-time changes
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)) => {
                ChangeKind::Modified
            }
            // chmod/atime noise
            EventKind::Modify(ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => ChangeKind::Modified,
            _ => return,
        };

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            let path = normalize_path(path);
            self.insert(path, kind);
        }
    }

    fn insert(&mut self, path: PathBuf, kind: ChangeKind) {
        match self.changes.get(&path).copied() {
            None => {
                crate::debug!("watch"; "event {}: {}", kind.label(), path.display());
                self.changes.insert(path, kind);
            }
            Some(ChangeKind::Removed) if kind != ChangeKind::Removed => {
                crate::debug!("watch"; "restore removed->{}: {}", kind.label(), path.display());
                self.changes.insert(path, kind);
            }
            Some(ChangeKind::Modified) if kind == ChangeKind::Removed => {
                crate::debug!("watch"; "upgrade modified->removed: {}", path.display());
                self.changes.insert(path, ChangeKind::Removed);
            }
            Some(ChangeKind::Created) if kind == ChangeKind::Removed => {
                crate::debug!("watch"; "discard created+removed: {}", path.display());
                self.changes.remove(&path);
            }
            Some(_) => return,
        }
        self.last_event = Some(Instant::now());
    }

    /// Take the pending batch once the quiet period has elapsed.
    pub(super) fn take_if_ready(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        if self.last_event?.elapsed() < self.quiet {
            return None;
        }
        self.last_event = None;
        let changes = std::mem::take(&mut self.changes);
        (!changes.is_empty()).then_some(changes)
    }

    /// Precise sleep duration until the batch can be ready.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return IDLE;
        };
        self.quiet
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Check if path is a temp/backup file (editor artifacts).
pub(super) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
