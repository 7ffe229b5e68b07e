// src/storage/dirs.rs
// =============================================================================
// Directory creation for the output tree.
//
// create_dir_all already treats "exists" as success and tolerates another
// task creating the same folder at the same moment, so ensure_dir can be
// called concurrently for overlapping paths.
// =============================================================================

use std::io;
use std::path::Path;

use tracing::debug;

use crate::config::ResolvedPaths;

/// Creates `path` and any missing parents. No-op if it already exists.
pub async fn ensure_dir(path: &Path) -> io::Result<()> {
    tokio::fs::create_dir_all(path).await?;
    debug!(dir = %path.display(), "directory ready");
    Ok(())
}

/// Creates the temp and reports folders a run writes into.
pub async fn prepare_output_dirs(paths: &ResolvedPaths) -> io::Result<()> {
    ensure_dir(&paths.temp_dir).await?;
    ensure_dir(&paths.reports_dir).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_ensure_dir_creates_parents() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("a").join("b").join("c");

        ensure_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn test_ensure_dir_is_idempotent() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("reports");

        ensure_dir(&dir).await.unwrap();
        ensure_dir(&dir).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(root.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_concurrent_overlapping_paths() {
        let root = TempDir::new().unwrap();
        let base = root.path().join("shared");
        let paths: Vec<PathBuf> = (0..8).map(|i| base.join(format!("child-{}", i % 3))).collect();

        let results = futures::future::join_all(paths.iter().map(|p| ensure_dir(p))).await;
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(std::fs::read_dir(&base).unwrap().count(), 3);
    }

    #[tokio::test]
    async fn test_fails_when_a_file_is_in_the_way() {
        let root = TempDir::new().unwrap();
        let blocker = root.path().join("blocker");
        std::fs::write(&blocker, b"not a dir").unwrap();

        assert!(ensure_dir(&blocker.join("child")).await.is_err());
    }

    #[tokio::test]
    async fn test_prepare_output_dirs() {
        let root = TempDir::new().unwrap();
        let paths = ResolvedPaths {
            project_dir: root.path().to_path_buf(),
            temp_dir: root.path().join("temp"),
            reports_dir: root.path().join("temp").join("reports"),
            artifacts_dir: root.path().join("temp").join("artifacts"),
        };

        prepare_output_dirs(&paths).await.unwrap();
        assert!(paths.reports_dir.is_dir());
        assert!(!paths.artifacts_dir.exists());
    }
}
