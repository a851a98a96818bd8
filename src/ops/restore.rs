use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Error, IoResultExt, Result};
use crate::fs::{remove_file_if_exists, write_file_synced};
use crate::hash::hash_file;
use crate::ops::flatten::tag_snapshot;
use crate::store::Store;
use crate::types::{validate_file_name, Snapshot};

/// what a restore did
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// files downloaded and written
    pub written: usize,
    /// files already present with the right content
    pub skipped: usize,
    /// tombstoned files removed from the destination
    pub removed: usize,
}

/// materialize the head of `tag` into `dest`
pub fn restore(store: &Store, tag: &str, dest: &Path) -> Result<RestoreReport> {
    let snapshot = tag_snapshot(store, tag)?;
    let report = restore_snapshot(store, &snapshot, dest)?;
    tracing::info!(
        tag,
        head = %snapshot.head,
        written = report.written,
        skipped = report.skipped,
        removed = report.removed,
        "restored"
    );
    Ok(report)
}

/// write a snapshot into `dest`, touching only files whose content differs
///
/// tombstones are applied first so a path can change between file and
/// directory across entries. symlinks in the destination are replaced, never
/// followed. every written file is re-hashed from disk before it counts as
/// restored.
pub fn restore_snapshot(store: &Store, snapshot: &Snapshot, dest: &Path) -> Result<RestoreReport> {
    fs::create_dir_all(dest).with_path(dest)?;
    let mut report = RestoreReport::default();

    for name in snapshot.tombstones.keys() {
        validate_file_name(name)?;
        if !parents_are_dirs(dest, name)? {
            continue;
        }
        let path = dest.join(name);
        match fs::symlink_metadata(&path) {
            Ok(meta) if !meta.is_dir() => {
                if remove_file_if_exists(&path)? {
                    tracing::debug!(path = %name, "removed");
                    report.removed += 1;
                }
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e).with_path(&path),
        }
    }

    for (name, entry) in &snapshot.files {
        validate_file_name(name)?;
        let path = dest.join(name);
        clear_target(dest, name)?;

        if is_regular_file(&path)? && hash_file(&path)? == entry.hash {
            tracing::debug!(path = %name, "up to date");
            report.skipped += 1;
            continue;
        }

        let content = store
            .codec()
            .decode(
                |chunk| store.data().download(chunk),
                &entry.hash,
                entry.additional_chunks,
            )
            .map_err(|e| annotate(e, &path))?;
        write_file_synced(&path, &content)?;

        let actual = hash_file(&path)?;
        if actual != entry.hash {
            return Err(Error::ConsistencyViolation {
                target: path.display().to_string(),
                expected: entry.hash,
                actual,
            });
        }

        tracing::debug!(path = %name, bytes = content.len(), "wrote");
        report.written += 1;
    }

    Ok(report)
}

fn is_regular_file(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(meta) => Ok(meta.file_type().is_file()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_path(path),
    }
}

/// whether every ancestor of `name` under `dest` exists as a real directory
fn parents_are_dirs(dest: &Path, name: &str) -> Result<bool> {
    let mut current = dest.to_path_buf();
    let parents = name.split('/').collect::<Vec<_>>();
    for part in &parents[..parents.len().saturating_sub(1)] {
        current.push(part);
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_dir() => {}
            Ok(_) => return Ok(false),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e).with_path(&current),
        }
    }
    Ok(true)
}

/// make room for the file `name`: anything that is not a directory on its
/// parent path goes, and so does whatever sits at the target that is not a
/// regular file
fn clear_target(dest: &Path, name: &str) -> Result<()> {
    let mut current = dest.to_path_buf();
    let parts = name.split('/').collect::<Vec<_>>();
    let Some((leaf, parents)) = parts.split_last() else {
        return Ok(());
    };

    for part in parents {
        current.push(part);
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_dir() => {}
            Ok(_) => {
                tracing::debug!(path = %current.display(), "replacing with directory");
                fs::remove_file(&current).with_path(&current)?;
                return Ok(());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e).with_path(&current),
        }
    }

    current.push(leaf);
    match fs::symlink_metadata(&current) {
        Ok(meta) if meta.file_type().is_dir() => {
            tracing::debug!(path = %current.display(), "replacing directory with file");
            fs::remove_dir_all(&current).with_path(&current)
        }
        Ok(meta) if meta.file_type().is_symlink() => {
            fs::remove_file(&current).with_path(&current)
        }
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_path(&current),
    }
}

/// name the destination path in content errors
fn annotate(e: Error, path: &Path) -> Error {
    match e {
        Error::ConsistencyViolation {
            target,
            expected,
            actual,
        } => Error::ConsistencyViolation {
            target: format!("{} (content {})", path.display(), target),
            expected,
            actual,
        },
        Error::NotFound(object) => {
            Error::NotFound(format!("{} (needed for {})", object, path.display()))
        }
        other => other,
    }
}
