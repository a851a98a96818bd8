use std::fs::{self, File};
use std::path::{Path, PathBuf};

use nix::fcntl::{Flock, FlockArg};

use crate::error::{Error, IoResultExt, Result};
use crate::fs::{write_file_atomic, write_file_synced};
use crate::hive::validate_object_name;
use crate::object::{decode_entry, encode_entry};
use crate::types::{ChainEntry, EntryId};

const ENTRY_FILE: &str = "staged.json";
const CHUNKS_DIR: &str = "chunks";
const LINKED_FILE: &str = "linked";
const LOCK_FILE: &str = ".lock";

/// scratch area holding one uncommitted chain entry and its chunks
///
/// the directory is locked for as long as the value lives; `finish` removes it.
pub struct Staging {
    path: PathBuf,
    _lock: StagingLock,
}

impl Staging {
    /// create (or reclaim) a staging area for a new entry
    ///
    /// fails with `StagingOccupied` if an uncommitted entry is already staged.
    /// leftovers from an interrupted staging run are cleared.
    pub fn init(path: &Path) -> Result<Self> {
        fs::create_dir_all(path).with_path(path)?;
        let lock = StagingLock::acquire(path)?;

        if path.join(ENTRY_FILE).exists() {
            return Err(Error::StagingOccupied(path.to_path_buf()));
        }

        let chunks = path.join(CHUNKS_DIR);
        if chunks.exists() {
            tracing::debug!(path = %chunks.display(), "clearing leftover staged chunks");
            fs::remove_dir_all(&chunks).with_path(&chunks)?;
        }
        crate::fs::remove_file_if_exists(&path.join(LINKED_FILE))?;
        fs::create_dir_all(&chunks).with_path(&chunks)?;

        Ok(Self {
            path: path.to_path_buf(),
            _lock: lock,
        })
    }

    /// open a staging area holding an entry
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(Error::NothingStaged(path.to_path_buf()));
        }
        let lock = StagingLock::acquire(path)?;

        if !path.join(ENTRY_FILE).is_file() {
            return Err(Error::NothingStaged(path.to_path_buf()));
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock: lock,
        })
    }

    /// is there an uncommitted entry at `path`
    pub fn is_staged(path: &Path) -> bool {
        path.join(ENTRY_FILE).is_file()
    }

    /// remove a staging area, returning whether anything was there
    pub fn discard(path: &Path) -> Result<bool> {
        if !path.is_dir() {
            return Ok(false);
        }
        let _lock = StagingLock::acquire(path)?;
        fs::remove_dir_all(path).with_path(path)?;
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn chunk_path(&self, name: &str) -> Result<PathBuf> {
        validate_object_name(name)?;
        Ok(self.path.join(CHUNKS_DIR).join(name))
    }

    /// store a chunk under its storage name
    pub fn write_chunk(&self, name: &str, data: &[u8]) -> Result<()> {
        write_file_synced(&self.chunk_path(name)?, data)
    }

    pub fn read_chunk(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.chunk_path(name)?;
        match fs::read(&path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(name.to_string()))
            }
            Err(e) => Err(e).with_path(&path),
        }
    }

    pub fn has_chunk(&self, name: &str) -> bool {
        self.chunk_path(name).map(|p| p.is_file()).unwrap_or(false)
    }

    /// persist the pending entry; written last so its presence marks a
    /// complete staging run
    pub fn write_entry(&self, entry: &ChainEntry) -> Result<()> {
        let bytes = encode_entry(entry)?;
        write_file_atomic(&self.path.join(ENTRY_FILE), &bytes)
    }

    /// raw bytes of the pending entry, exactly as they will be uploaded
    pub fn read_entry_bytes(&self) -> Result<Vec<u8>> {
        let path = self.path.join(ENTRY_FILE);
        fs::read(&path).with_path(&path)
    }

    pub fn read_entry(&self) -> Result<ChainEntry> {
        decode_entry(&self.read_entry_bytes()?)
    }

    /// note that the chain edge for `id` has been recorded
    pub fn mark_linked(&self, id: &EntryId) -> Result<()> {
        write_file_atomic(&self.path.join(LINKED_FILE), id.to_string().as_bytes())
    }

    /// was the chain edge for `id` recorded by an earlier attempt
    pub fn is_linked(&self, id: &EntryId) -> Result<bool> {
        let path = self.path.join(LINKED_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(content.trim() == id.to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_path(&path),
        }
    }

    /// remove the staging area after a successful commit
    pub fn finish(self) -> Result<()> {
        fs::remove_dir_all(&self.path).with_path(&self.path)?;
        Ok(())
    }
}

/// guard that holds the staging lock until dropped
struct StagingLock {
    #[allow(dead_code)]
    flock: Flock<File>,
}

impl StagingLock {
    fn acquire(dir: &Path) -> Result<Self> {
        let lock_path = dir.join(LOCK_FILE);
        let file = File::create(&lock_path).with_path(&lock_path)?;

        let flock = Flock::lock(file, FlockArg::LockExclusiveNonblock)
            .map_err(|_| Error::LockContention(dir.to_path_buf()))?;

        Ok(Self { flock })
    }
}
