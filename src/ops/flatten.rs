use crate::error::{Error, Result};
use crate::hive::DataHive;
use crate::object::read_entry;
use crate::ops::resolve::{find_tag, resolve_chain};
use crate::store::Store;
use crate::types::{ChainEntry, EntryId, Snapshot};

/// replay chain entries, root first, into a single snapshot
///
/// a changed file overrides whatever came before and clears a tombstone at the
/// same path; a tombstone drops the file and is remembered.
pub fn flatten_entries<'a, I>(entries: I) -> Snapshot
where
    I: IntoIterator<Item = &'a ChainEntry>,
{
    let mut snapshot = Snapshot::empty();

    for entry in entries {
        for changed in &entry.changed {
            snapshot.tombstones.remove(&changed.file_name);
            snapshot
                .files
                .insert(changed.file_name.clone(), changed.clone());
        }
        for deleted in &entry.deleted {
            snapshot.files.remove(&deleted.file_name);
            snapshot
                .tombstones
                .insert(deleted.file_name.clone(), deleted.clone());
        }
        snapshot.head = entry.id;
    }

    snapshot
}

/// fetch every entry of a resolved chain and flatten it
///
/// the fetched entries must agree with the chain: the first is a root and
/// each later entry names its predecessor as base.
pub fn flatten(data: &dyn DataHive, chain: &[EntryId]) -> Result<Snapshot> {
    let mut entries = Vec::with_capacity(chain.len());
    let mut previous = EntryId::ROOT;

    for id in chain {
        let entry = read_entry(data, id)?;
        if entry.base_id != previous {
            return Err(Error::InvalidEntry(format!(
                "entry {} is based on {}, chain expects {}",
                entry.id, entry.base_id, previous
            )));
        }
        previous = entry.id;
        entries.push(entry);
    }

    Ok(flatten_entries(&entries))
}

/// flattened snapshot at `head`
pub fn snapshot_at(store: &Store, head: EntryId) -> Result<Snapshot> {
    let chain = resolve_chain(store.meta(), head)?;
    flatten(store.data(), &chain)
}

/// flattened snapshot at the head of a tag
pub fn tag_snapshot(store: &Store, tag: &str) -> Result<Snapshot> {
    let tag = find_tag(store.meta(), tag)?;
    snapshot_at(store, tag.id)
}
