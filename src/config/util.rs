//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from `start`
///
/// Walks up parent directories until a file named `config_name` exists.
///
/// # Example
/// ```text
/// /home/user/site/public/posts/  ← start
/// /home/user/site/liveserve.toml ← found!
/// ```
pub fn find_config_file(start: &Path, config_name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.is_file())
}

/// Make `path` absolute against `base` and canonicalize it when it exists.
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    joined.canonicalize().unwrap_or(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_file_walks_up() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("public/posts");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("liveserve.toml"), "").unwrap();

        let found = find_config_file(&nested, "liveserve.toml").unwrap();
        assert_eq!(found, dir.path().join("liveserve.toml"));
    }

    #[test]
    fn test_find_config_file_nearest_wins() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("inner");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("liveserve.toml"), "").unwrap();
        fs::write(nested.join("liveserve.toml"), "").unwrap();

        assert_eq!(
            find_config_file(&nested, "liveserve.toml").unwrap(),
            nested.join("liveserve.toml")
        );
    }

    #[test]
    fn test_find_config_file_ignores_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("liveserve.toml")).unwrap();
        // May still find a real file further up; it must not be the directory.
        assert_ne!(
            find_config_file(dir.path(), "liveserve.toml"),
            Some(dir.path().join("liveserve.toml"))
        );
    }

    #[test]
    fn test_resolve_against() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("public")).unwrap();
        let base = dir.path().canonicalize().unwrap();

        assert_eq!(resolve_against(&base, Path::new("public")), base.join("public"));
        assert_eq!(resolve_against(&base, Path::new("missing")), base.join("missing"));
        assert_eq!(resolve_against(&base, &base.join("public")), base.join("public"));
    }
}
