//! Glob patterns anchored at the project root.
//!
//! Patterns in the config are written relative to the project root
//! (`dev/js/**/*.js`, `../resources/views/**/*`). They are resolved once into
//! absolute patterns so the watcher can match absolute event paths directly.

use std::path::{Path, PathBuf};

use super::fs::clean_path;

/// Characters that make a path component a glob.
const GLOB_CHARS: &[char] = &['*', '?', '[', ']', '{', '}'];

/// Anchor a root-relative pattern at `root`, resolving `.` and `..` lexically.
pub fn resolve_pattern(root: &Path, pattern: &str) -> String {
    let joined = root.join(pattern);
    clean_path(&joined).to_string_lossy().into_owned()
}

/// Longest leading directory of a pattern that contains no glob characters.
///
/// This is the directory a watcher has to observe to see every match:
/// `/app/dev/js/**/*.js` → `/app/dev/js`, `/app/dev/scss/main.scss` → `/app/dev/scss`.
pub fn pattern_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    let path = Path::new(pattern);
    let mut components = path.components().peekable();

    while let Some(comp) = components.next() {
        let text = comp.as_os_str().to_string_lossy();
        // the final component is a file name (or glob) either way
        if components.peek().is_none() || text.contains(GLOB_CHARS) {
            break;
        }
        base.push(comp.as_os_str());
    }
    base
}
