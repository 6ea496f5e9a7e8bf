//! `[styles]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [styles]
//! entry = "dev/scss/main.scss"      # Entry stylesheet (imports resolved from its dir)
//! watch = "dev/scss/**/*.scss"      # Changes here rebuild styles
//! output_dir = "build/css"
//! filename = "build.css"            # Output name, whatever the entry is called
//! browsers = ["defaults"]           # browserslist queries for vendor prefixes
//! source_map = true
//!
//! [[styles.inline]]                 # Inline small PNGs as data URIs
//! extensions = ["png"]
//! max_size = 20480
//! exclude = ["sprites"]
//!
//! [[styles.inline]]                 # ...and small WOFF2 fonts
//! extensions = ["woff2"]
//! max_size = 40960
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::path::{normalize_path, resolve_pattern};

/// Style pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StylesConfig {
    /// Entry SCSS file.
    pub entry: PathBuf,
    /// Glob of files whose changes rebuild the styles.
    pub watch: String,
    /// Directory receiving the CSS file and its source map.
    pub output_dir: PathBuf,
    /// Fixed output filename.
    pub filename: String,
    /// Extra import roots besides the entry directory.
    pub load_paths: Vec<PathBuf>,
    /// browserslist queries used for vendor prefixing.
    pub browsers: Vec<String>,
    /// Write `<filename>.map` next to the output.
    pub source_map: bool,
    /// Asset inlining rules, applied in order.
    pub inline: Vec<InlineRule>,
}

impl StylesConfig {
    pub const WATCH: FieldPath = FieldPath::new("styles.watch");
    pub const FILENAME: FieldPath = FieldPath::new("styles.filename");
    pub const BROWSERS: FieldPath = FieldPath::new("styles.browsers");
    pub const INLINE: FieldPath = FieldPath::new("styles.inline");

    /// Directory imports and relative `url()` references resolve against.
    pub fn entry_dir(&self) -> &Path {
        self.entry.parent().unwrap_or(Path::new("."))
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.filename)
    }

    pub(crate) fn normalize(&mut self, root: &Path) {
        self.entry = normalize_path(&root.join(&self.entry));
        self.watch = resolve_pattern(root, &self.watch);
        self.output_dir = normalize_path(&root.join(&self.output_dir));
        self.load_paths = self
            .load_paths
            .iter()
            .map(|p| normalize_path(&root.join(p)))
            .collect();
    }

    pub(crate) fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_filename(&self.filename, Self::FILENAME, diag);

        if let Err(e) = glob::Pattern::new(&self.watch) {
            diag.error(Self::WATCH, format!("invalid glob pattern: {e}"));
        }

        if let Err(e) = crate::asset::style::resolve_targets(&self.browsers) {
            diag.error_with_hint(
                Self::BROWSERS,
                format!("invalid browserslist query: {e}"),
                "see https://browsersl.ist for the query syntax",
            );
        }

        for (i, rule) in self.inline.iter().enumerate() {
            if rule.extensions.is_empty() {
                diag.error(Self::INLINE, format!("rule #{} has no extensions", i + 1));
            }
            if rule.max_size == 0 {
                diag.error_with_hint(
                    Self::INLINE,
                    format!("rule #{} has max_size = 0", i + 1),
                    "remove the rule to disable inlining",
                );
            }
        }
    }
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            entry: "dev/scss/main.scss".into(),
            watch: "dev/scss/**/*.scss".into(),
            output_dir: "build/css".into(),
            filename: "build.css".into(),
            load_paths: Vec::new(),
            browsers: vec!["defaults".into()],
            source_map: true,
            inline: vec![
                InlineRule {
                    extensions: vec!["png".into()],
                    max_size: 20 * 1024,
                    exclude: vec!["sprites".into()],
                },
                InlineRule {
                    extensions: vec!["woff2".into()],
                    max_size: 40 * 1024,
                    exclude: Vec::new(),
                },
            ],
        }
    }
}

/// One inlining rule: which `url()` references become data URIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineRule {
    /// Allowed extensions, without the dot (case-insensitive).
    pub extensions: Vec<String>,
    /// Largest inlined file, in bytes (inclusive).
    pub max_size: u64,
    /// References containing any of these substrings are never inlined.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Output filenames must be a bare, non-empty file name.
pub(super) fn validate_filename(name: &str, field: FieldPath, diag: &mut ConfigDiagnostics) {
    if name.trim().is_empty() {
        diag.error(field, "must not be empty");
    } else if name.contains('/') || name.contains('\\') {
        diag.error_with_hint(
            field,
            format!("`{name}` is not a plain file name"),
            "put directories in output_dir",
        );
    }
}
