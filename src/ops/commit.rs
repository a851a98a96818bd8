use std::path::Path;

use crate::error::{Error, Result};
use crate::object::entry_object_name;
use crate::staging::Staging;
use crate::store::Store;
use crate::types::{validate_tag_name, EntryId};

/// outcome of a commit
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitReport {
    pub id: EntryId,
    pub base_id: EntryId,
    pub tag: String,
    /// chunk objects uploaded
    pub chunks: usize,
    /// an earlier attempt had already linked the entry; only the tag moved
    pub resumed: bool,
}

/// commit the staged entry and point `tag` at it
///
/// chunks go up first, then the entry object, then the chain edge, then the
/// tag. the staging area is only removed once all of that succeeded; after a
/// failure it is left as is and the commit can be retried.
pub fn commit(store: &Store, tag: &str, staging_path: &Path) -> Result<CommitReport> {
    validate_tag_name(tag)?;

    let staging = Staging::open(staging_path)?;
    let bytes = staging.read_entry_bytes()?;
    let entry = crate::object::decode_entry(&bytes)?;

    let resumed = match store.meta().find_parent(&entry.id)? {
        None => false,
        Some(parent) if parent == entry.base_id && staging.is_linked(&entry.id)? => {
            tracing::info!(id = %entry.id, "entry already linked, resuming at tag update");
            true
        }
        Some(_) => return Err(Error::DuplicateEntry(entry.id)),
    };

    let mut chunks = 0;
    if !resumed {
        if !entry.is_root() && store.meta().find_parent(&entry.base_id)?.is_none() {
            return Err(Error::BrokenChain(entry.base_id));
        }

        for name in entry.chunk_names() {
            let data = staging.read_chunk(&name)?;
            store.data().upload(&name, &data)?;
            tracing::debug!(chunk = %name, bytes = data.len(), "uploaded chunk");
            chunks += 1;
        }

        store.data().upload(&entry_object_name(&entry.id), &bytes)?;
        store.meta().record_edge(entry.id, entry.base_id)?;
        staging.mark_linked(&entry.id)?;
    }

    if let Some(current) = store.meta().find_tag(tag)? {
        if current.id != entry.base_id && current.id != entry.id {
            tracing::warn!(
                tag,
                current = %current.id,
                base = %entry.base_id,
                "tag moved since this entry was staged, overwriting"
            );
        }
    }
    store.meta().upsert_tag(tag, entry.id)?;

    staging.finish()?;

    tracing::info!(tag, id = %entry.id, chunks, "committed");
    Ok(CommitReport {
        id: entry.id,
        base_id: entry.base_id,
        tag: tag.to_string(),
        chunks,
        resumed,
    })
}
