//! Source discovery.

use std::path::PathBuf;

use crate::log;
use crate::task::TaskError;

/// Every regular file matching the absolute glob `pattern`, sorted by path.
///
/// `Path` ordering compares component-wise, so `a/b.js` sorts before `a.js`
/// and `lib/z.js` before `lib2/a.js`. This order is the bundle order.
pub fn discover_files(pattern: &str) -> Result<Vec<PathBuf>, TaskError> {
    let paths = glob::glob(pattern).map_err(|e| {
        TaskError::Configuration(format!("invalid glob pattern `{pattern}`: {e}"))
    })?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => log!("warning"; "skipping unreadable path: {e}"),
        }
    }

    files.sort();
    Ok(files)
}
