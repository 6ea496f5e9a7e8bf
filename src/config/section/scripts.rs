//! `[scripts]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [scripts]
//! input = "dev/js/**/*.js"    # Every match is bundled, in sorted path order
//! output_dir = "build/js"
//! filename = "build.js"
//! target = "es2015"           # Syntax level the bundle is lowered to
//! source_map = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::styles::validate_filename;
use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::path::{normalize_path, resolve_pattern};

/// Script pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Recursive glob of script sources. Also the watch pattern.
    pub input: String,
    pub output_dir: PathBuf,
    pub filename: String,
    /// Lowering target (`es2015` ... `es2024`, `esnext`).
    pub target: String,
    pub source_map: bool,
}

impl ScriptsConfig {
    pub const INPUT: FieldPath = FieldPath::new("scripts.input");
    pub const FILENAME: FieldPath = FieldPath::new("scripts.filename");
    pub const TARGET: FieldPath = FieldPath::new("scripts.target");

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.filename)
    }

    pub(crate) fn normalize(&mut self, root: &Path) {
        self.input = resolve_pattern(root, &self.input);
        self.output_dir = normalize_path(&root.join(&self.output_dir));
    }

    pub(crate) fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_filename(&self.filename, Self::FILENAME, diag);

        if let Err(e) = glob::Pattern::new(&self.input) {
            diag.error(Self::INPUT, format!("invalid glob pattern: {e}"));
        }

        if let Err(e) = crate::asset::script::transform_options(&self.target) {
            diag.error_with_hint(
                Self::TARGET,
                format!("unsupported target `{}`: {e}", self.target),
                "use one of es2015 ... es2024 or esnext",
            );
        }
    }
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            input: "dev/js/**/*.js".into(),
            output_dir: "build/js".into(),
            filename: "build.js".into(),
            target: "es2015".into(),
            source_map: true,
        }
    }
}
