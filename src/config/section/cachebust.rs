//! `[cachebust]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [cachebust]
//! templates = ["../resources/views/welcome.blade.php"]  # ?v=<digits> rewritten in place
//! watch = "../resources/views/**/*"                      # Changes here only reload
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::path::{normalize_path, resolve_pattern};

/// Cache-busting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheBustConfig {
    pub templates: Vec<PathBuf>,
    pub watch: String,
}

impl CacheBustConfig {
    pub const WATCH: FieldPath = FieldPath::new("cachebust.watch");

    pub(crate) fn normalize(&mut self, root: &Path) {
        self.templates = self
            .templates
            .iter()
            .map(|p| normalize_path(&root.join(p)))
            .collect();
        self.watch = resolve_pattern(root, &self.watch);
    }

    pub(crate) fn validate(&self, diag: &mut ConfigDiagnostics) {
        if let Err(e) = glob::Pattern::new(&self.watch) {
            diag.error(Self::WATCH, format!("invalid glob pattern: {e}"));
        }
    }
}

impl Default for CacheBustConfig {
    fn default() -> Self {
        Self {
            templates: vec!["../resources/views/welcome.blade.php".into()],
            watch: "../resources/views/**/*".into(),
        }
    }
}
