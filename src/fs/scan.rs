use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::{hash_file, Hash};

/// a regular file found under a scanned root
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannedFile {
    /// '/'-separated path relative to the scan root
    pub rel: String,
    /// absolute (or root-joined) path on disk
    pub path: PathBuf,
}

impl ScannedFile {
    /// read the file's bytes
    pub fn read(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).with_path(&self.path)
    }

    /// digest of the file's bytes, streamed
    pub fn hash(&self) -> Result<Hash> {
        hash_file(&self.path)
    }
}

/// recursive directory walker yielding regular files in name order
#[derive(Clone, Debug)]
pub struct Scanner {
    root: PathBuf,
    exclude: Vec<PathBuf>,
}

impl Scanner {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            exclude: Vec::new(),
        }
    }

    /// skip a directory (and everything below it) if it lives under the root
    pub fn exclude(mut self, path: &Path) -> Self {
        self.exclude.push(path.to_path_buf());
        self
    }

    /// walk the root
    ///
    /// symlinks and special files are skipped. file bytes are not read here,
    /// callers pull them through `ScannedFile::read` or `ScannedFile::hash`.
    pub fn scan(&self) -> Result<Vec<ScannedFile>> {
        let meta = fs::metadata(&self.root).with_path(&self.root)?;
        if !meta.is_dir() {
            return Err(Error::Io {
                path: self.root.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
            });
        }

        let excluded: Vec<PathBuf> = self
            .exclude
            .iter()
            .filter_map(|p| fs::canonicalize(p).ok())
            .collect();

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if excluded.is_empty() || !e.file_type().is_dir() {
                    return true;
                }
                match fs::canonicalize(e.path()) {
                    Ok(canonical) => !excluded.contains(&canonical),
                    Err(_) => true,
                }
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.root).to_path_buf();
                Error::Io {
                    path,
                    source: e.into(),
                }
            })?;

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if !file_type.is_file() {
                tracing::debug!(path = %entry.path().display(), "skipping non-regular file");
                continue;
            }

            let rel = relative_name(&self.root, entry.path())?;
            files.push(ScannedFile {
                rel,
                path: entry.path().to_path_buf(),
            });
        }

        Ok(files)
    }
}

/// scan a directory with no exclusions
pub fn scan_dir(root: &Path) -> Result<Vec<ScannedFile>> {
    Scanner::new(root).scan()
}

fn relative_name(root: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(root)
        .map_err(|_| Error::InvalidPath(format!("{} is outside {}", path.display(), root.display())))?;

    let mut parts = Vec::new();
    for component in rel.components() {
        let part = component.as_os_str().to_str().ok_or_else(|| {
            Error::InvalidPath(format!("non-utf8 file name: {}", path.display()))
        })?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::compute_content_hash;
    use tempfile::tempdir;

    #[test]
    fn test_scan_sorted_relative_paths() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("sub/deeper/c.bin"), b"c").unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();

        let files = scan_dir(dir.path()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.rel.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub/deeper/c.bin"]);

        assert_eq!(files[0].read().unwrap(), b"a");
        assert_eq!(files[2].hash().unwrap(), compute_content_hash(b"c"));
    }

    #[test]
    fn test_scan_skips_symlinks() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("real"), b"data").unwrap();
        std::os::unix::fs::symlink("real", dir.path().join("link")).unwrap();

        let files = scan_dir(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].rel, "real");
    }

    #[test]
    fn test_scan_excludes_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".staging")).unwrap();
        fs::write(dir.path().join(".staging/staged.json"), b"{}").unwrap();
        fs::write(dir.path().join("kept"), b"k").unwrap();

        let files = Scanner::new(dir.path())
            .exclude(&dir.path().join(".staging"))
            .scan()
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].rel, "kept");
    }

    #[test]
    fn test_scan_missing_root() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        let result = scan_dir(&missing);
        assert!(matches!(result, Err(Error::Io { path, .. }) if path == missing));
    }

    #[test]
    fn test_scan_empty_dir() {
        let dir = tempdir().unwrap();
        assert!(scan_dir(dir.path()).unwrap().is_empty());
    }
}
