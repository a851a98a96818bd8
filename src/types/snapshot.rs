use std::collections::BTreeMap;

use crate::hash::Hash;
use crate::types::{Entry, EntryId, Tombstone};

/// the complete logical state at one chain position
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// id of the chain entry this snapshot was taken at (`ROOT` when empty)
    pub head: EntryId,
    /// tracked files keyed by path
    pub files: BTreeMap<String, Entry>,
    /// paths deleted somewhere along the chain and not re-added since
    pub tombstones: BTreeMap<String, Tombstone>,
}

impl Snapshot {
    /// snapshot with nothing tracked, used as the prior of a root entry
    pub fn empty() -> Self {
        Self {
            head: EntryId::ROOT,
            files: BTreeMap::new(),
            tombstones: BTreeMap::new(),
        }
    }

    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.files.get(path)
    }

    pub fn hash_of(&self, path: &str) -> Option<Hash> {
        self.files.get(path).map(|e| e.hash)
    }

    pub fn is_deleted(&self, path: &str) -> bool {
        self.tombstones.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
