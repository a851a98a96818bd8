//! storage collaborators
//!
//! a *data hive* stores opaque named objects (chunks and chain entries); a
//! *meta hive* stores tags and chain edges. the core only talks to these two
//! traits, concrete adapters are picked by configuration.

pub mod json;
pub mod local;
pub mod memory;

pub use json::JsonMetaHive;
pub use local::LocalDataHive;
pub use memory::{MemoryDataHive, MemoryMetaHive};

use crate::error::{Error, Result};
use crate::types::{EntryId, Tag};

/// object storage for chunks and chain entries
pub trait DataHive {
    /// store `data` under `name`, replacing any previous object
    fn upload(&self, name: &str, data: &[u8]) -> Result<()>;

    /// fetch the object stored under `name`; `Error::NotFound` if absent
    fn download(&self, name: &str) -> Result<Vec<u8>>;

    /// release backend resources
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// tag and chain-edge storage
pub trait MetaHive {
    fn list_tags(&self) -> Result<Vec<Tag>>;

    fn find_tag(&self, name: &str) -> Result<Option<Tag>>;

    /// point `name` at `id`, creating the tag if needed (last writer wins)
    fn upsert_tag(&self, name: &str, id: EntryId) -> Result<()>;

    /// base id recorded for `id`, or `None` if `id` was never committed
    fn find_parent(&self, id: &EntryId) -> Result<Option<EntryId>>;

    /// record the chain edge `id -> base_id`
    ///
    /// recording the same edge twice is a no-op; recording a different base
    /// for a known id is `Error::DuplicateEntry`.
    fn record_edge(&self, id: EntryId, base_id: EntryId) -> Result<()>;

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// reject object names that could escape a flat object namespace
pub fn validate_object_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(Error::InvalidPath(format!(
            "invalid object name: {}",
            name.escape_default()
        )));
    }
    Ok(())
}
