//! Sprite sheet builder.
//!
//! Decodes every image matching `sprites.input`, packs them into one PNG and
//! writes an SCSS fragment with a variable list and a rule per image.
//!
//! Runs once at startup (and for `assetline sprites`), never on watch: the
//! fragment lives next to the style sources, so rewriting it would retrigger
//! the style pipeline.

mod pack;
mod stylesheet;

pub use pack::{SpriteInput, pack};
pub use stylesheet::render;

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use super::scan::discover_files;
use crate::config::SpritesConfig;
use crate::task::TaskError;
use crate::{debug, log};

/// Selector for an image: `prefix` + file stem reduced to `[A-Za-z0-9_-]`.
pub fn selector(prefix: &str, path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("{prefix}{sanitized}")
}

/// Build the sprite sheet and its stylesheet. Returns the files written.
pub fn build(config: &SpritesConfig) -> Result<Vec<PathBuf>, TaskError> {
    let files = discover_files(&config.input)?;

    if files.is_empty() {
        log!("warning"; "no sprite images match {}", config.input);
        write_file(&config.stylesheet, stylesheet::HEADER.as_bytes())?;
        return Ok(vec![config.stylesheet.clone()]);
    }

    let sprites = load_sprites(&files, &config.selector_prefix)?;
    let sheet = pack(&sprites, config.padding);
    debug!(
        "sprites";
        "packed {} images into {}x{}",
        sheet.frames.len(),
        sheet.width(),
        sheet.height()
    );

    if let Some(parent) = config.image.parent() {
        fs::create_dir_all(parent).map_err(TaskError::io(parent))?;
    }
    sheet
        .image
        .save_with_format(&config.image, image::ImageFormat::Png)
        .map_err(|source| TaskError::Image {
            path: config.image.clone(),
            source,
        })?;

    write_file(
        &config.stylesheet,
        render(&sheet, &config.image_url).as_bytes(),
    )?;

    Ok(vec![config.image.clone(), config.stylesheet.clone()])
}

/// Decode `files` in parallel and assign unique selectors.
fn load_sprites(files: &[PathBuf], prefix: &str) -> Result<Vec<SpriteInput>, TaskError> {
    let mut owners: FxHashMap<String, &Path> = FxHashMap::default();
    for path in files {
        let name = selector(prefix, path);
        if let Some(first) = owners.insert(name.clone(), path.as_path()) {
            return Err(TaskError::Configuration(format!(
                "sprite selector `.{name}` is produced by both `{}` and `{}`",
                first.display(),
                path.display()
            )));
        }
    }

    files
        .par_iter()
        .map(|path| -> Result<SpriteInput, TaskError> {
            let image = image::open(path)
                .map_err(|source| TaskError::Image {
                    path: path.clone(),
                    source,
                })?
                .into_rgba8();
            Ok(SpriteInput {
                name: selector(prefix, path),
                image,
            })
        })
        .collect()
}

fn write_file(path: &Path, content: &[u8]) -> Result<(), TaskError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(TaskError::io(parent))?;
    }
    fs::write(path, content).map_err(TaskError::io(path))
}
