//! Pipeline configuration management for `assetline.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── styles     # [styles]
//! │   ├── scripts    # [scripts]
//! │   ├── sprites    # [sprites]
//! │   ├── cachebust  # [cachebust]
//! │   ├── serve      # [serve]
//! │   └── watch      # [watch]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! └── mod.rs         # PipelineConfig (this file)
//! ```
//!
//! The configuration is loaded once, resolved against the project root and
//! then shared read-only (`Arc<PipelineConfig>`) by every component.
//! Without a config file the defaults reproduce the classic layout:
//! `dev/scss/main.scss`, `dev/js/**/*.js`, `dev/sprite_images/*.png`,
//! outputs under `build/`.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    CacheBustConfig, InlineRule, ScriptsConfig, ServeConfig, SpritesConfig, StylesConfig,
    WatchConfig,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{cli::Cli, debug, log};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing assetline.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Absolute path to the config file, empty when running on defaults
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file, or cwd
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub styles: StylesConfig,

    #[serde(default)]
    pub scripts: ScriptsConfig,

    #[serde(default)]
    pub sprites: SpritesConfig,

    #[serde(default)]
    pub cachebust: CacheBustConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

impl PipelineConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. The project root is the
    /// config file's directory; without a config file, the defaults are used
    /// with cwd as root.
    pub fn load(cli: &Cli) -> Result<Self> {
        let (mut config, root) = match find_config_file(&cli.config) {
            Some(path) => {
                let path = crate::utils::path::normalize_path(&path);
                let mut config = Self::from_path(&path)?;
                let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
                config.config_path = path;
                (config, root)
            }
            None => {
                let cwd =
                    std::env::current_dir().context("Failed to get current working directory")?;
                debug!("config"; "{} not found, using defaults", cli.config.display());
                (Self::default(), cwd)
            }
        };

        config.finalize(&root);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {} are ignored:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Resolve every configured path against `root`.
    pub fn finalize(&mut self, root: &Path) {
        let root = crate::utils::path::normalize_path(root);

        self.styles.normalize(&root);
        self.scripts.normalize(&root);
        self.sprites.normalize(&root);
        self.cachebust.normalize(&root);
        self.root = root;
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Get path relative to the project root, for display
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.styles.validate(&mut diag);
        self.scripts.validate(&mut diag);
        self.sprites.validate(&mut diag);
        self.cachebust.validate(&mut diag);
        self.serve.validate(&mut diag);
        self.watch.validate(&mut diag);

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config without resolving paths.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PipelineConfig {
    let (parsed, ignored) = PipelineConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// Default config rooted at `root`, with every path resolved.
#[cfg(test)]
pub fn test_config_at(root: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.finalize(root);
    config
}

// ============================================================================
// tests
// ============================================================================
