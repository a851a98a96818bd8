use std::path::PathBuf;

use crate::{EntryId, Hash};

/// error type for tp operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("tag not found: {0}")]
    TagNotFound(String),

    #[error("invalid tag name: {0}")]
    InvalidTagName(String),

    #[error("chain entry already committed: {0}")]
    DuplicateEntry(EntryId),

    #[error("broken chain: no parent recorded for entry {0}")]
    BrokenChain(EntryId),

    #[error("no changes in {0}")]
    NoChanges(PathBuf),

    #[error("content {hash} needs {chunks} chunks, more than the limit of {limit}")]
    ChunkLimitExceeded {
        hash: Hash,
        chunks: usize,
        limit: usize,
    },

    #[error("consistency violation for {target}: expected {expected}, got {actual}")]
    ConsistencyViolation {
        target: String,
        expected: Hash,
        actual: Hash,
    },

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("{backend} backend unavailable: {message}")]
    BackendUnavailable {
        backend: &'static str,
        message: String,
    },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid chain entry: {0}")]
    InvalidEntry(String),

    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("nothing staged in {0}")]
    NothingStaged(PathBuf),

    #[error("staging area {0} already holds an uncommitted entry")]
    StagingOccupied(PathBuf),

    #[error("staging area {0} is in use by another command")]
    LockContention(PathBuf),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("invalid hash hex: {0}")]
    InvalidHashHex(String),

    #[error("invalid entry id: {0}")]
    InvalidId(String),

    #[error("invalid tag pattern: {0}")]
    InvalidPattern(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
