//! Script pipeline.
//!
//! Every file matching `scripts.input` is lowered and minified on its own,
//! then the units are concatenated in sorted path order:
//!
//! ```text
//! dev/js/a/b.js ─▶ lower ─▶ minify ─┐
//! dev/js/a.js   ─▶ lower ─▶ minify ─┼─▶ build.js + build.js.map (index map)
//! dev/js/main.js ─▶ lower ─▶ minify ─┘
//! ```
//!
//! Lowering per file keeps each mapping anchored to a real source, and the
//! concatenation keeps classic-script semantics (shared globals, file order).

mod bundle;
mod transpile;

pub use bundle::{Bundle, concat};
pub use transpile::{CompiledUnit, transpile};

use std::fs;
use std::path::PathBuf;

use oxc::transformer::{EngineTargets, TransformOptions};
use rayon::prelude::*;

use super::scan::discover_files;
use crate::config::ScriptsConfig;
use crate::log;
use crate::task::TaskError;
use crate::utils::path::relative_path;

/// Transformer options lowering to `target` (`es2015` ... `esnext`).
pub fn transform_options(target: &str) -> Result<TransformOptions, String> {
    TransformOptions::from_target(target)
}

/// Engines the compressor must keep the output runnable on.
pub fn engine_targets(target: &str) -> Result<EngineTargets, String> {
    EngineTargets::from_target(target)
}

/// Run the whole script pipeline. Returns the files written.
pub fn build(scripts: &ScriptsConfig) -> Result<Vec<PathBuf>, TaskError> {
    let files = discover_files(&scripts.input)?;
    if files.is_empty() {
        log!("warning"; "no scripts match {}, writing an empty bundle", scripts.input);
    }

    let units = files
        .par_iter()
        .map(|path| {
            let source = fs::read_to_string(path).map_err(TaskError::io(path))?;
            let map_source = scripts
                .source_map
                .then(|| relative_path(&scripts.output_dir, path));
            transpile(path, &source, &scripts.target, map_source.as_deref())
        })
        .collect::<Result<Vec<_>, _>>()?;

    let map_name = format!("{}.map", scripts.filename);
    let Bundle { code, map } = concat(
        &units,
        &scripts.filename,
        scripts.source_map.then_some(map_name.as_str()),
    );

    fs::create_dir_all(&scripts.output_dir).map_err(TaskError::io(&scripts.output_dir))?;
    let js_path = scripts.output_path();
    fs::write(&js_path, code).map_err(TaskError::io(&js_path))?;

    let mut written = vec![js_path];
    if let Some(map) = map {
        let map_path = scripts.output_dir.join(&map_name);
        fs::write(&map_path, map).map_err(TaskError::io(&map_path))?;
        written.push(map_path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests;
