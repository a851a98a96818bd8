//! data hive backed by a local directory

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::hive::{validate_object_name, DataHive};

const BACKEND: &str = "local";

/// flat directory of objects, one file per name
#[derive(Clone, Debug)]
pub struct LocalDataHive {
    root: PathBuf,
}

impl LocalDataHive {
    /// open (and create if missing) an object directory
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root.join(".tmp")).map_err(|e| unavailable(root, e))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// check if an object exists
    pub fn contains(&self, name: &str) -> bool {
        validate_object_name(name).is_ok() && self.root.join(name).is_file()
    }

    /// names of all stored objects, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(|e| unavailable(&self.root, e))? {
            let entry = entry.map_err(|e| unavailable(&self.root, e))?;
            if !entry.path().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn object_path(&self, name: &str) -> Result<PathBuf> {
        validate_object_name(name)?;
        Ok(self.root.join(name))
    }
}

impl DataHive for LocalDataHive {
    fn upload(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.object_path(name)?;

        // atomic write: temp -> fsync -> rename
        let tmp_path = self
            .root
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string());
        {
            let mut tmp_file = File::create(&tmp_path).map_err(|e| unavailable(&tmp_path, e))?;
            tmp_file
                .write_all(data)
                .map_err(|e| unavailable(&tmp_path, e))?;
            tmp_file.sync_all().map_err(|e| unavailable(&tmp_path, e))?;
        }

        fs::rename(&tmp_path, &path).map_err(|e| unavailable(&path, e))?;
        tracing::trace!(name, bytes = data.len(), "stored object");
        Ok(())
    }

    fn download(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.object_path(name)?;
        fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(name.to_string())
            } else {
                unavailable(&path, e)
            }
        })
    }
}

fn unavailable(path: &Path, e: std::io::Error) -> Error {
    Error::BackendUnavailable {
        backend: BACKEND,
        message: format!("{}: {}", path.display(), e),
    }
}
