//! Cache-busting version markers.
//!
//! Templates reference built assets as `build.css?v=1712345678901`. After a
//! rebuild every marker's digit run is replaced with a fresh millisecond
//! token, forcing browsers to re-fetch. Everything else in the template is
//! preserved byte for byte.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use regex::{NoExpand, Regex};

use crate::debug;
use crate::task::TaskError;

/// `?v=` followed by one or more ASCII digits.
static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?v=([0-9]+)").expect("marker pattern is valid"));

/// Last token handed out by this process.
static LAST_TOKEN: AtomicU64 = AtomicU64::new(0);

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Next version token: `max(now_ms, floor + 1, previous + 1)`.
///
/// Strictly increasing for the lifetime of the process, even when the wall
/// clock stalls or steps backwards.
pub fn next_token(floor: u64) -> u64 {
    let now = now_ms().max(floor.saturating_add(1));
    let mut last = LAST_TOKEN.load(Ordering::Relaxed);
    loop {
        let next = now.max(last.saturating_add(1));
        match LAST_TOKEN.compare_exchange_weak(last, next, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Replace every marker's digits with `token`.
///
/// Returns `None` when `content` has no marker.
pub fn rewrite_markers(content: &str, token: u64) -> Option<String> {
    if !MARKER.is_match(content) {
        return None;
    }
    let replacement = format!("?v={token}");
    Some(MARKER.replace_all(content, NoExpand(&replacement)).into_owned())
}

/// Largest marker value already present, so new tokens never go backwards.
fn max_marker(content: &str) -> u64 {
    MARKER
        .captures_iter(content)
        .filter_map(|caps| caps[1].parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

/// Rewrite the markers of every template with one shared token.
///
/// Returns the templates actually written. A template without markers is
/// left untouched; a missing template is a configuration error.
pub fn bust(templates: &[PathBuf]) -> Result<Vec<PathBuf>, TaskError> {
    let mut sources = Vec::with_capacity(templates.len());
    for path in templates {
        let content = fs::read_to_string(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => TaskError::Configuration(format!(
                "cache-bust template `{}` does not exist",
                path.display()
            )),
            _ => TaskError::io(path)(err),
        })?;
        sources.push((path, content));
    }

    let floor = sources
        .iter()
        .map(|(_, content)| max_marker(content))
        .max()
        .unwrap_or(0);
    let token = next_token(floor);

    let mut written = Vec::new();
    for (path, content) in sources {
        let Some(updated) = rewrite_markers(&content, token) else {
            debug!("cachebust"; "no version markers in {}", path.display());
            continue;
        };
        fs::write(path, updated).map_err(TaskError::io(path))?;
        written.push(path.clone());
    }
    Ok(written)
}
