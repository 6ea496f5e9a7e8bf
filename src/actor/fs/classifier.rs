use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use rustc_hash::FxHashMap;

use super::types::ChangeKind;
use crate::config::PipelineConfig;
use crate::task::TaskId;

const MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Which pipelines a batch of changes affects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeScope {
    pub styles: bool,
    pub scripts: bool,
    pub templates: bool,
    /// Changed files, for logging
    pub paths: Vec<PathBuf>,
}

impl ChangeScope {
    pub fn is_empty(&self) -> bool {
        !(self.styles || self.scripts || self.templates)
    }

    /// Union of two scopes.
    pub fn merge(&mut self, other: ChangeScope) {
        self.styles |= other.styles;
        self.scripts |= other.scripts;
        self.templates |= other.templates;
        for path in other.paths {
            if !self.paths.contains(&path) {
                self.paths.push(path);
            }
        }
    }

    /// Pipelines to rerun. Template-only changes need no build.
    pub fn tasks(&self) -> Vec<TaskId> {
        let mut tasks = Vec::new();
        if self.styles {
            tasks.push(TaskId::Styles);
        }
        if self.scripts {
            tasks.push(TaskId::Scripts);
        }
        if !tasks.is_empty() {
            tasks.push(TaskId::CacheBust);
        }
        tasks
    }

    /// Short human summary, e.g. `styles, scripts (3 files)`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.styles {
            parts.push("styles");
        }
        if self.scripts {
            parts.push("scripts");
        }
        if self.templates {
            parts.push("templates");
        }
        let mut out = parts.join(", ");
        match self.paths.len() {
            0 => {}
            1 => {
                let name = self.paths[0]
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_default();
                let _ = write!(out, " ({name})");
            }
            n => {
                let _ = write!(out, " ({n} files)");
            }
        }
        out
    }
}

/// Maps debounced file events onto a [`ChangeScope`].
pub(crate) struct ScopeClassifier {
    styles: Pattern,
    scripts: Pattern,
    templates: Pattern,
    /// Build outputs; changes under them are never inputs
    ignored: Vec<PathBuf>,
}

impl ScopeClassifier {
    pub(crate) fn new(config: &PipelineConfig) -> Result<Self, glob::PatternError> {
        Ok(Self {
            styles: Pattern::new(&config.styles.watch)?,
            scripts: Pattern::new(&config.scripts.input)?,
            templates: Pattern::new(&config.cachebust.watch)?,
            ignored: vec![
                config.styles.output_dir.clone(),
                config.scripts.output_dir.clone(),
                config.sprites.image.clone(),
            ],
        })
    }

    /// Directories the watcher has to observe.
    pub(crate) fn roots(&self) -> Vec<PathBuf> {
        [&self.styles, &self.scripts, &self.templates]
            .into_iter()
            .map(|p| crate::utils::path::pattern_base(p.as_str()))
            .collect()
    }

    /// Classify one debounced batch. `None` if nothing relevant changed.
    pub(super) fn classify(
        &self,
        mut changes: FxHashMap<PathBuf, ChangeKind>,
    ) -> Option<ChangeScope> {
        correct_by_existence(&mut changes);
        filter_actionable(&mut changes);

        let mut paths: Vec<PathBuf> = changes.into_keys().collect();
        paths.sort();

        let mut scope = ChangeScope::default();
        for path in paths {
            if self.is_ignored(&path) {
                continue;
            }
            let styles = self.styles.matches_path_with(&path, MATCH);
            let scripts = self.scripts.matches_path_with(&path, MATCH);
            let templates = self.templates.matches_path_with(&path, MATCH);
            if !(styles || scripts || templates) {
                crate::debug!("watch"; "unrelated: {}", path.display());
                continue;
            }
            scope.styles |= styles;
            scope.scripts |= scripts;
            scope.templates |= templates;
            scope.paths.push(path);
        }

        (!scope.is_empty()).then_some(scope)
    }

    fn is_ignored(&self, path: &Path) -> bool {
        self.ignored.iter().any(|out| path.starts_with(out))
    }
}

/// Reconcile event kinds with actual filesystem state.
///
/// Atomic saves report Removed for a file that exists again, and short-lived
/// files report Created after they are gone.
fn correct_by_existence(changes: &mut FxHashMap<PathBuf, ChangeKind>) {
    changes.retain(|path, kind| {
        let exists = path.exists();
        match *kind {
            ChangeKind::Created if !exists => {
                crate::debug!("watch"; "discard created (gone): {}", path.display());
                return false;
            }
            ChangeKind::Modified if !exists => *kind = ChangeKind::Removed,
            ChangeKind::Removed if exists => *kind = ChangeKind::Modified,
            _ => {}
        }
        true
    });
}

/// Created/Modified must be files; a removal always counts.
fn filter_actionable(changes: &mut FxHashMap<PathBuf, ChangeKind>) {
    changes.retain(|path, kind| match kind {
        ChangeKind::Created | ChangeKind::Modified => path.is_file(),
        ChangeKind::Removed => true,
    });
}
