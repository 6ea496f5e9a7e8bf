//! Path normalization utilities.
//!
//! - `normalize_path` - file system paths (canonicalize + lexical fallback)
//! - `clean_path` - lexical `.`/`..` resolution
//! - `relative_path` - path of one file as seen from a directory

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// For paths that do not exist yet (outputs, templates outside the project),
/// falls back to joining with the current directory and resolving `.`/`..`
/// lexically.
///
/// # Example
/// ```ignore
/// let abs = normalize_path(Path::new("./build/css"));
/// ```
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        };
        clean_path(&absolute)
    })
}

/// Resolve `.` and `..` components without touching the filesystem.
///
/// `..` at the root stays at the root.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                let at_root = matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir | Component::Prefix(_))
                );
                if !at_root {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Express `to` relative to the directory `from_dir`.
///
/// Both paths must be absolute (or both relative to the same base).
/// `relative_path("/app/build/js", "/app/dev/js/app.js")` is `../../dev/js/app.js`.
pub fn relative_path(from_dir: &Path, to: &Path) -> PathBuf {
    let from: Vec<_> = from_dir.components().collect();
    let target: Vec<_> = to.components().collect();
    let common = from
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..from.len() {
        out.push("..");
    }
    for comp in &target[common..] {
        out.push(comp.as_os_str());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_absolute() {
        let path = Path::new("/absolute/path/file.txt");
        let normalized = normalize_path(path);
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_path_relative() {
        let path = Path::new("relative/path/file.txt");
        let normalized = normalize_path(path);
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_missing_path_resolves_parent_dirs() {
        let normalized = normalize_path(Path::new("/no-such-root/app/../resources/./views"));
        assert_eq!(normalized, PathBuf::from("/no-such-root/resources/views"));
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path(Path::new("/a/b/../c")), PathBuf::from("/a/c"));
        assert_eq!(clean_path(Path::new("/a/./b/")), PathBuf::from("/a/b"));
        assert_eq!(clean_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(clean_path(Path::new("a/../../b")), PathBuf::from("b"));
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/app/build/js"), Path::new("/app/dev/js/app.js")),
            PathBuf::from("../../dev/js/app.js")
        );
        assert_eq!(
            relative_path(Path::new("/app"), Path::new("/app/dev/a.js")),
            PathBuf::from("dev/a.js")
        );
    }
}
