//! Absolute path handling for roots, config files and worker source names.

use std::path::{Path, PathBuf};

/// Make `path` absolute, resolving symlinks when it exists.
///
/// Paths that cannot be canonicalized (usually because they do not exist
/// yet) are joined onto the current directory instead.
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Resolve a user-typed path: cwd-relative if it exists there, otherwise
/// relative to `root`.
pub fn resolve_path(path: &Path, root: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else if path.exists() {
        normalize_path(path)
    } else {
        normalize_path(&root.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_missing_relative_path_is_absolute() {
        let normalized = normalize_path(Path::new("no/such/dir/main.sk"));
        assert!(normalized.is_absolute());
        assert!(normalized.ends_with("no/such/dir/main.sk"));
    }

    #[test]
    fn test_normalize_resolves_dot_segments() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("src")).unwrap();

        let normalized = normalize_path(&temp.path().join("src/../src"));
        assert_eq!(normalized, temp.path().canonicalize().unwrap().join("src"));
    }

    #[test]
    fn test_resolve_absolute_is_untouched() {
        let resolved = resolve_path(Path::new("/p/a.sk"), Path::new("/root"));
        assert_eq!(resolved, PathBuf::from("/p/a.sk"));
    }

    #[test]
    fn test_resolve_missing_falls_back_to_root() {
        let resolved = resolve_path(Path::new("kiln-missing/a.sk"), Path::new("/root"));
        assert_eq!(resolved, PathBuf::from("/root/kiln-missing/a.sk"));
    }
}
