//! Style pipeline.
//!
//! ```text
//! main.scss ─▶ compile (grass) ─▶ inline url() ─▶ prefix + minify (lightningcss)
//!           ─▶ build.css + build.css.map
//! ```
//!
//! Outputs are written only after every stage succeeded, so a broken source
//! leaves the previous build in place.

mod compile;
mod inline;
mod process;

pub use compile::compile;
pub use inline::{InlineContext, inline_assets};
pub use process::{Processed, process};

use std::fs;
use std::path::PathBuf;

use lightningcss::targets::{Browsers, Targets};

use crate::config::PipelineConfig;
use crate::task::TaskError;

/// Resolve browserslist queries into lightningcss targets.
pub fn resolve_targets(queries: &[String]) -> Result<Targets, String> {
    let browsers = Browsers::from_browserslist(queries.iter().map(String::as_str))
        .map_err(|e| e.to_string())?;
    Ok(Targets {
        browsers,
        ..Targets::default()
    })
}

/// Run the whole style pipeline. Returns the files written.
pub fn build(config: &PipelineConfig) -> Result<Vec<PathBuf>, TaskError> {
    let styles = &config.styles;

    let css = compile(styles)?;
    let css = inline_assets(
        &css,
        &InlineContext {
            base_dir: styles.entry_dir(),
            root: config.get_root(),
            rules: &styles.inline,
        },
    );

    let targets = resolve_targets(&styles.browsers).map_err(TaskError::Configuration)?;
    let map_name = format!("{}.map", styles.filename);
    let source_name = styles
        .entry
        .with_extension("css")
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "style.css".to_string());

    let Processed { code, map } = process(
        &css,
        &styles.entry,
        &source_name,
        targets,
        styles.source_map.then_some(map_name.as_str()),
    )?;

    fs::create_dir_all(&styles.output_dir).map_err(TaskError::io(&styles.output_dir))?;
    let css_path = styles.output_path();
    fs::write(&css_path, code).map_err(TaskError::io(&css_path))?;

    let mut written = vec![css_path];
    if let Some(map) = map {
        let map_path = styles.output_dir.join(&map_name);
        fs::write(&map_path, map).map_err(TaskError::io(&map_path))?;
        written.push(map_path);
    }
    Ok(written)
}
