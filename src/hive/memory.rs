//! in-process hives
//!
//! clones share state, so a caller can hand one clone to a `Store` and keep
//! another to inspect or tamper with what was stored.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::hive::{DataHive, MetaHive};
use crate::types::{EntryId, Tag};

const BACKEND: &str = "memory";

fn poisoned() -> Error {
    Error::BackendUnavailable {
        backend: BACKEND,
        message: "state lock poisoned".to_string(),
    }
}

/// named objects held in memory
#[derive(Clone, Debug, Default)]
pub struct MemoryDataHive {
    objects: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryDataHive {
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> Result<MutexGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.objects.lock().map_err(|_| poisoned())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects().map(|o| o.contains_key(name)).unwrap_or(false)
    }

    /// names of all stored objects, sorted
    pub fn names(&self) -> Vec<String> {
        self.objects()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.objects().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// drop an object, returning its bytes
    pub fn remove(&self, name: &str) -> Option<Vec<u8>> {
        self.objects().ok()?.remove(name)
    }
}

impl DataHive for MemoryDataHive {
    fn upload(&self, name: &str, data: &[u8]) -> Result<()> {
        self.objects()?.insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn download(&self, name: &str) -> Result<Vec<u8>> {
        self.objects()?
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }
}

#[derive(Debug, Default)]
struct MetaState {
    tags: BTreeMap<String, EntryId>,
    edges: BTreeMap<EntryId, EntryId>,
}

/// tags and chain edges held in memory
#[derive(Clone, Debug, Default)]
pub struct MemoryMetaHive {
    state: Arc<Mutex<MetaState>>,
}

impl MemoryMetaHive {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MetaState>> {
        self.state.lock().map_err(|_| poisoned())
    }

    /// every recorded edge as `(id, base_id)`, sorted by id
    pub fn edges(&self) -> Result<Vec<(EntryId, EntryId)>> {
        Ok(self
            .state()?
            .edges
            .iter()
            .map(|(id, base)| (*id, *base))
            .collect())
    }
}

impl MetaHive for MemoryMetaHive {
    fn list_tags(&self) -> Result<Vec<Tag>> {
        Ok(self
            .state()?
            .tags
            .iter()
            .map(|(name, id)| Tag::new(name.clone(), *id))
            .collect())
    }

    fn find_tag(&self, name: &str) -> Result<Option<Tag>> {
        Ok(self
            .state()?
            .tags
            .get(name)
            .map(|id| Tag::new(name, *id)))
    }

    fn upsert_tag(&self, name: &str, id: EntryId) -> Result<()> {
        self.state()?.tags.insert(name.to_string(), id);
        Ok(())
    }

    fn find_parent(&self, id: &EntryId) -> Result<Option<EntryId>> {
        Ok(self.state()?.edges.get(id).copied())
    }

    fn record_edge(&self, id: EntryId, base_id: EntryId) -> Result<()> {
        let mut state = self.state()?;
        match state.edges.get(&id) {
            Some(existing) if *existing == base_id => Ok(()),
            Some(_) => Err(Error::DuplicateEntry(id)),
            None => {
                state.edges.insert(id, base_id);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_clones_share_objects() {
        let hive = MemoryDataHive::new();
        let observer = hive.clone();

        hive.upload("a", b"1").unwrap();
        assert!(observer.contains("a"));
        assert_eq!(observer.download("a").unwrap(), b"1");

        observer.remove("a");
        assert!(matches!(hive.download("a"), Err(Error::NotFound(_))));
        assert!(hive.is_empty());
    }

    #[test]
    fn test_meta_tags_and_edges() {
        let hive = MemoryMetaHive::new();
        let id = EntryId::new_random();

        hive.record_edge(id, EntryId::ROOT).unwrap();
        hive.upsert_tag("latest", id).unwrap();

        assert_eq!(hive.find_tag("latest").unwrap(), Some(Tag::new("latest", id)));
        assert_eq!(hive.find_parent(&id).unwrap(), Some(EntryId::ROOT));
        assert_eq!(hive.edges().unwrap(), vec![(id, EntryId::ROOT)]);
        assert!(matches!(
            hive.record_edge(id, EntryId::new_random()),
            Err(Error::DuplicateEntry(_))
        ));
    }
}
