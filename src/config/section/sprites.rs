//! `[sprites]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [sprites]
//! input = "dev/sprite_images/*.png"
//! image = "build/sprites/sprites.png"        # Packed sheet
//! stylesheet = "dev/scss/sprites.scss"       # Generated fragment, import it from the entry
//! image_url = "/build/sprites/sprites.png"   # URL written into the fragment
//! selector_prefix = "icon-"
//! padding = 0
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::path::{normalize_path, resolve_pattern};

/// Sprite sheet settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpritesConfig {
    pub input: String,
    pub image: PathBuf,
    pub stylesheet: PathBuf,
    pub image_url: String,
    pub selector_prefix: String,
    /// Transparent gap between packed images, in pixels.
    pub padding: u32,
}

impl SpritesConfig {
    pub const INPUT: FieldPath = FieldPath::new("sprites.input");
    pub const IMAGE_URL: FieldPath = FieldPath::new("sprites.image_url");

    pub(crate) fn normalize(&mut self, root: &Path) {
        self.input = resolve_pattern(root, &self.input);
        self.image = normalize_path(&root.join(&self.image));
        self.stylesheet = normalize_path(&root.join(&self.stylesheet));
    }

    pub(crate) fn validate(&self, diag: &mut ConfigDiagnostics) {
        if let Err(e) = glob::Pattern::new(&self.input) {
            diag.error(Self::INPUT, format!("invalid glob pattern: {e}"));
        }
        if self.image_url.contains('\'') {
            diag.error(Self::IMAGE_URL, "must not contain a single quote");
        }
    }
}

impl Default for SpritesConfig {
    fn default() -> Self {
        Self {
            input: "dev/sprite_images/*.png".into(),
            image: "build/sprites/sprites.png".into(),
            stylesheet: "dev/scss/sprites.scss".into(),
            image_url: "/build/sprites/sprites.png".into(),
            selector_prefix: "icon-".into(),
            padding: 0,
        }
    }
}
