//! Path utilities for tests that touch the filesystem.

use std::path::PathBuf;

use tempfile::TempDir;

/// Returns the workspace root directory.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// A fresh temporary directory for a file-backed cache.
///
/// Removed when the returned guard is dropped.
pub fn temp_cache_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("powder-cache-")
        .tempdir()
        .expect("create temp cache dir")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_has_manifest() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }

    #[test]
    fn test_temp_cache_dir_is_removed() {
        let dir = temp_cache_dir();
        let path = dir.path().to_path_buf();
        assert!(path.exists());
        drop(dir);
        assert!(!path.exists());
    }
}
