//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from current directory
///
/// Starts from cwd and walks up parent directories until finding `config_name`
/// Returns the absolute path to the config file if found
///
/// # Example
/// ```text
/// /home/user/app/dev/scss/     ← cwd
/// /home/user/app/assetline.toml ← found!
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_file_from(&cwd, config_name)
}

/// Same as [`find_config_file`], starting from `start` instead of cwd.
pub fn find_config_file_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None, // Reached filesystem root
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_in_ancestor() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("dev/scss/partials");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("assetline.toml"), "").unwrap();

        let found = find_config_file_from(&nested, Path::new("assetline.toml"));
        assert_eq!(found, Some(dir.path().join("assetline.toml")));
    }

    #[test]
    fn test_find_config_missing() {
        let dir = TempDir::new().unwrap();
        let found = find_config_file_from(dir.path(), Path::new("no-such-config-file.toml"));
        assert_eq!(found, None);
    }

    #[test]
    fn test_find_config_absolute() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        assert_eq!(find_config_file_from(Path::new("/"), &path), None);

        fs::write(&path, "").unwrap();
        assert_eq!(find_config_file_from(Path::new("/"), &path), Some(path));
    }
}
