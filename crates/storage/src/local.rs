//! Local filesystem operations used while filling the cache.
//!
//! Cache entries are write-once: a reader that sees a path must be able to
//! trust its contents. [`publish`] therefore stages data in a sibling
//! temporary file and renames it into place, and [`staging_dir`] gives each
//! fill a private directory for intermediate files that disappears on drop.

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir};
use tokio::fs;
use tracing::instrument;

/// Size of the entry at `path`, or `None` if nothing exists there.
pub async fn entry_size(path: &Path) -> Result<Option<u64>> {
    match fs::metadata(path).await {
        Ok(metadata) => Ok(Some(metadata.len())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => exn::bail!(ErrorKind::from_io(e, path)),
    }
}

/// Recursively create `dir` and all of its parents.
pub async fn create_dir_all(dir: &Path) -> Result<()> {
    Ok(fs::create_dir_all(dir).await.map_err(|e| ErrorKind::from_io(e, dir))?)
}

/// Create a uniquely named, hidden directory inside `parent` for the
/// intermediate files of a single fill. Removed (recursively) when the
/// returned [`TempDir`] is dropped, or explicitly with [`remove_staging`].
pub async fn staging_dir(parent: &Path) -> Result<TempDir> {
    let parent = parent.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<TempDir> {
        Ok(Builder::new().prefix(".fetch-").tempdir_in(&parent).map_err(|e| ErrorKind::from_io(e, &parent))?)
    })
    .await
    .or_raise(|| ErrorKind::Task)?
}

/// Recursively remove a staging directory and everything left inside it.
pub async fn remove_staging(staging: TempDir) -> Result<()> {
    let path = staging.path().to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<()> { Ok(staging.close().map_err(|e| ErrorKind::from_io(e, &path))?) })
        .await
        .or_raise(|| ErrorKind::Task)?
}

/// Atomically write `data` to `target`, returning the number of bytes written.
///
/// The data is written and synced to a temporary file in the same directory,
/// then renamed over `target`. On any failure the temporary file is removed
/// and `target` is left untouched.
#[instrument(skip(data), fields(path = %target.display(), bytes = data.len()))]
pub async fn publish(target: PathBuf, data: Vec<u8>) -> Result<u64> {
    tokio::task::spawn_blocking(move || publish_blocking(&target, &data)).await.or_raise(|| ErrorKind::Task)?
}

fn publish_blocking(target: &Path, data: &[u8]) -> Result<u64> {
    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_raise(|| ErrorKind::InvalidPath(target.to_path_buf()))?;
    let mut staged =
        Builder::new().prefix(".staged-").suffix(".part").tempfile_in(parent).map_err(|e| ErrorKind::from_io(e, parent))?;
    staged.write_all(data).map_err(ErrorKind::Io)?;
    staged.as_file().sync_all().map_err(ErrorKind::Io)?;
    staged.persist(target).map_err(|e| ErrorKind::from_io(e.error, target))?;
    tracing::debug!("Cache entry published");
    Ok(data.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<PathBuf> {
        let mut entries: Vec<_> = std::fs::read_dir(dir).unwrap().map(|e| e.unwrap().path()).collect();
        entries.sort();
        entries
    }

    #[tokio::test]
    async fn test_publish_writes_exact_bytes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let target = temp_dir.path().join("entry.pcm");
        let written = publish(target.clone(), vec![1, 2, 3, 4]).await.unwrap();
        assert_eq!(written, 4);
        assert_eq!(std::fs::read(&target).unwrap(), [1, 2, 3, 4]);
        // Nothing but the entry itself is left behind.
        assert_eq!(entries(temp_dir.path()), vec![target]);
    }

    #[tokio::test]
    async fn test_publish_replaces_existing_entry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let target = temp_dir.path().join("entry.pcm");
        std::fs::write(&target, b"old").unwrap();
        publish(target.clone(), b"new".to_vec()).await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_publish_into_missing_directory_fails_cleanly() {
        let temp_dir = tempfile::tempdir().unwrap();
        let target = temp_dir.path().join("missing/entry.pcm");
        assert!(publish(target.clone(), vec![0; 16]).await.is_err());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_publish_without_parent_is_invalid() {
        let err = publish(PathBuf::from("entry.pcm"), vec![0]).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_entry_size() {
        let temp_dir = tempfile::tempdir().unwrap();
        let entry = temp_dir.path().join("entry.pcm");
        assert_eq!(entry_size(&entry).await.unwrap(), None);
        std::fs::write(&entry, [0u8; 12]).unwrap();
        assert_eq!(entry_size(&entry).await.unwrap(), Some(12));
    }

    #[tokio::test]
    async fn test_create_dir_all() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("a/b/c");
        create_dir_all(&nested).await.unwrap();
        assert!(nested.is_dir());
        // Creating again is a no-op.
        create_dir_all(&nested).await.unwrap();
    }

    #[tokio::test]
    async fn test_staging_dir_is_removed_on_drop() {
        let temp_dir = tempfile::tempdir().unwrap();
        let staging = staging_dir(temp_dir.path()).await.unwrap();
        let staged_path = staging.path().to_path_buf();
        std::fs::write(staged_path.join("Song1.opus"), b"OggS").unwrap();
        assert!(staged_path.starts_with(temp_dir.path()));
        drop(staging);
        assert!(!staged_path.exists());
        assert!(entries(temp_dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_remove_staging() {
        let temp_dir = tempfile::tempdir().unwrap();
        let staging = staging_dir(temp_dir.path()).await.unwrap();
        std::fs::write(staging.path().join("Song1.opus"), b"OggS").unwrap();
        remove_staging(staging).await.unwrap();
        assert!(entries(temp_dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_remove_staging_already_gone() {
        let temp_dir = tempfile::tempdir().unwrap();
        let staging = staging_dir(temp_dir.path()).await.unwrap();
        std::fs::remove_dir_all(staging.path()).unwrap();
        assert!(remove_staging(staging).await.is_err());
    }

    #[tokio::test]
    async fn test_staging_dir_in_missing_parent() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(staging_dir(&temp_dir.path().join("missing")).await.is_err());
    }

    #[tokio::test]
    async fn test_staging_dirs_are_unique() {
        let temp_dir = tempfile::tempdir().unwrap();
        let a = staging_dir(temp_dir.path()).await.unwrap();
        let b = staging_dir(temp_dir.path()).await.unwrap();
        assert_ne!(a.path(), b.path());
    }
}
