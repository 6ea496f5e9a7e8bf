//! SCSS compilation.

use std::fs;

use crate::config::StylesConfig;
use crate::task::TaskError;

/// Compile the entry stylesheet to expanded CSS.
///
/// Imports resolve relative to the importing file, then the entry directory,
/// then each of `load_paths` in order.
pub fn compile(styles: &StylesConfig) -> Result<String, TaskError> {
    fs::metadata(&styles.entry).map_err(TaskError::io(&styles.entry))?;

    let options = styles
        .load_paths
        .iter()
        .fold(grass::Options::default().load_path(styles.entry_dir()), |options, path| {
            options.load_path(path)
        });

    grass::from_path(&styles.entry, &options)
        .map_err(|err| TaskError::compile(&styles.entry, err.to_string()))
}
