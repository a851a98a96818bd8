use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{IoResultExt, Result};

/// write a file in place, creating parent directories, and sync it to disk
pub fn write_file_synced(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_path(parent)?;
    }

    let mut file = File::create(path).with_path(path)?;
    file.write_all(data).with_path(path)?;
    file.sync_all().with_path(path)?;
    Ok(())
}

/// replace a file atomically: sibling temp file, fsync, rename, fsync parent
pub fn write_file_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).with_path(&parent)?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(format!(".{}.tmp", uuid::Uuid::new_v4()));
    let tmp_path = PathBuf::from(tmp_name);

    {
        let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
        tmp_file.write_all(data).with_path(&tmp_path)?;
        tmp_file.sync_all().with_path(&tmp_path)?;
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e).with_path(path);
    }

    fsync_dir(&parent)
}

/// remove a file, reporting whether it was there
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_path(path),
    }
}

/// sync a file to disk
pub fn fsync_file(path: &Path) -> Result<()> {
    let file = File::open(path).with_path(path)?;
    file.sync_all().with_path(path)?;
    Ok(())
}

/// sync a directory to disk
pub fn fsync_dir(path: &Path) -> Result<()> {
    let dir = File::open(path).with_path(path)?;
    dir.sync_all().with_path(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_file_synced_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a/b/c.txt");

        write_file_synced(&path, b"hello").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello");

        write_file_synced(&path, b"bye").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"bye");
    }

    #[test]
    fn test_write_file_atomic_leaves_no_temp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        write_file_atomic(&path, b"one").unwrap();
        write_file_atomic(&path, b"two").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"two");
        let count = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_remove_file_if_exists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x");

        assert!(!remove_file_if_exists(&path).unwrap());
        fs::write(&path, b"x").unwrap();
        assert!(remove_file_if_exists(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_fsync() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f");
        fs::write(&path, b"data").unwrap();

        fsync_file(&path).unwrap();
        fsync_dir(dir.path()).unwrap();
    }
}
