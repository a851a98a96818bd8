use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::chunk_name;
use crate::types::EntryId;

/// the only chain entry format version understood
pub const FORMAT_VERSION: u32 = 1;

/// tracked content at a path
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// relative '/'-separated path, unique within a chain entry
    #[serde(rename = "FileName")]
    pub file_name: String,
    /// digest of the raw uncompressed bytes
    #[serde(rename = "Hash")]
    pub hash: Hash,
    /// number of stored chunks beyond the first
    #[serde(rename = "AdditionalChunks", default, skip_serializing_if = "is_zero")]
    pub additional_chunks: u32,
}

impl Entry {
    pub fn new(file_name: impl Into<String>, hash: Hash, additional_chunks: u32) -> Self {
        Self {
            file_name: file_name.into(),
            hash,
            additional_chunks,
        }
    }

    /// total number of stored chunk objects
    pub fn chunk_count(&self) -> usize {
        self.additional_chunks as usize + 1
    }

    /// storage names of every chunk, in order
    pub fn chunk_names(&self) -> Vec<String> {
        (0..self.chunk_count())
            .map(|i| chunk_name(&self.hash, i))
            .collect()
    }
}

/// marks a path removed relative to the prior snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tombstone {
    #[serde(rename = "FileName")]
    pub file_name: String,
}

impl Tombstone {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

/// one link of a patch chain
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEntry {
    #[serde(rename = "Version")]
    pub version: u32,
    #[serde(rename = "ID")]
    pub id: EntryId,
    /// predecessor, or `EntryId::ROOT` for the first entry of a chain
    #[serde(rename = "BaseID")]
    pub base_id: EntryId,
    /// new and modified files
    #[serde(rename = "Changed", default, deserialize_with = "null_as_empty")]
    pub changed: Vec<Entry>,
    #[serde(rename = "Deleted", default, deserialize_with = "null_as_empty")]
    pub deleted: Vec<Tombstone>,
}

impl ChainEntry {
    /// create an empty entry on top of `base_id`
    pub fn new(id: EntryId, base_id: EntryId) -> Self {
        Self {
            version: FORMAT_VERSION,
            id,
            base_id,
            changed: Vec::new(),
            deleted: Vec::new(),
        }
    }

    /// does this entry start a chain
    pub fn is_root(&self) -> bool {
        self.base_id.is_root()
    }

    /// no changes and no deletions
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.deleted.is_empty()
    }

    /// sort both sets by file name
    pub fn sort(&mut self) {
        self.changed.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        self.deleted.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    }

    /// distinct chunk names referenced by the changed set
    pub fn chunk_names(&self) -> BTreeSet<String> {
        self.changed.iter().flat_map(Entry::chunk_names).collect()
    }

    /// check structural invariants
    pub fn validate(&self) -> Result<()> {
        if self.version != FORMAT_VERSION {
            return Err(Error::InvalidEntry(format!(
                "entry {} has unsupported version {}",
                self.id, self.version
            )));
        }

        if self.id.is_root() {
            return Err(Error::InvalidEntry(
                "entry id cannot be the root sentinel".to_string(),
            ));
        }

        if self.id == self.base_id {
            return Err(Error::InvalidEntry(format!(
                "entry {} names itself as base",
                self.id
            )));
        }

        if self.is_root() && !self.deleted.is_empty() {
            return Err(Error::InvalidEntry(format!(
                "root entry {} cannot delete files",
                self.id
            )));
        }

        let mut seen = HashSet::new();
        let names = self
            .changed
            .iter()
            .map(|e| &e.file_name)
            .chain(self.deleted.iter().map(|t| &t.file_name));
        for name in names {
            validate_file_name(name)?;
            if !seen.insert(name.as_str()) {
                return Err(Error::InvalidEntry(format!(
                    "entry {} lists {} more than once",
                    self.id, name
                )));
            }
        }

        Ok(())
    }
}

/// validate a tracked relative path
///
/// names are '/'-separated, relative, and free of '.'/'..' components so a
/// restore can never write outside its destination.
pub fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidPath("empty file name".to_string()));
    }

    if name.contains('\0') {
        return Err(Error::InvalidPath(format!(
            "file name contains null byte: {}",
            name.escape_default()
        )));
    }

    if name.starts_with('/') {
        return Err(Error::InvalidPath(format!("absolute file name: {}", name)));
    }

    for component in name.split('/') {
        if component.is_empty() || component == "." || component == ".." {
            return Err(Error::InvalidPath(format!(
                "file name has empty, '.' or '..' component: {}",
                name
            )));
        }
    }

    Ok(())
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

/// older writers serialize empty lists as `null`
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::compute_content_hash;

    fn sample() -> ChainEntry {
        let mut entry = ChainEntry::new(EntryId::new_random(), EntryId::new_random());
        entry
            .changed
            .push(Entry::new("b.txt", compute_content_hash(b"b"), 0));
        entry
            .changed
            .push(Entry::new("a/x.bin", compute_content_hash(b"x"), 2));
        entry.deleted.push(Tombstone::new("gone.txt"));
        entry
    }

    #[test]
    fn test_new_entry_is_empty() {
        let entry = ChainEntry::new(EntryId::new_random(), EntryId::ROOT);
        assert!(entry.is_root());
        assert!(entry.is_empty());
        assert_eq!(entry.version, FORMAT_VERSION);
    }

    #[test]
    fn test_sort_orders_by_name() {
        let mut entry = sample();
        entry.sort();
        assert_eq!(entry.changed[0].file_name, "a/x.bin");
        assert_eq!(entry.changed[1].file_name, "b.txt");
    }

    #[test]
    fn test_chunk_names() {
        let hash = compute_content_hash(b"x");
        let entry = Entry::new("x", hash, 2);
        assert_eq!(
            entry.chunk_names(),
            vec![
                hash.to_hex(),
                format!("{}_1", hash.to_hex()),
                format!("{}_2", hash.to_hex())
            ]
        );
    }

    #[test]
    fn test_chunk_names_dedup_across_entries() {
        let hash = compute_content_hash(b"same");
        let mut entry = ChainEntry::new(EntryId::new_random(), EntryId::ROOT);
        entry.changed.push(Entry::new("one", hash, 0));
        entry.changed.push(Entry::new("two", hash, 0));
        assert_eq!(entry.chunk_names().len(), 1);
    }

    #[test]
    fn test_validate_ok() {
        sample().validate().unwrap();
    }

    #[test]
    fn test_validate_wrong_version() {
        let mut entry = sample();
        entry.version = 2;
        assert!(matches!(entry.validate(), Err(Error::InvalidEntry(_))));
    }

    #[test]
    fn test_validate_duplicate_name() {
        let mut entry = sample();
        entry
            .changed
            .push(Entry::new("b.txt", compute_content_hash(b"other"), 0));
        assert!(matches!(entry.validate(), Err(Error::InvalidEntry(_))));
    }

    #[test]
    fn test_validate_changed_and_deleted_overlap() {
        let mut entry = sample();
        entry.deleted.push(Tombstone::new("b.txt"));
        assert!(matches!(entry.validate(), Err(Error::InvalidEntry(_))));
    }

    #[test]
    fn test_validate_root_cannot_delete() {
        let mut entry = ChainEntry::new(EntryId::new_random(), EntryId::ROOT);
        entry.deleted.push(Tombstone::new("x"));
        assert!(matches!(entry.validate(), Err(Error::InvalidEntry(_))));
    }

    #[test]
    fn test_validate_self_reference() {
        let id = EntryId::new_random();
        let entry = ChainEntry::new(id, id);
        assert!(matches!(entry.validate(), Err(Error::InvalidEntry(_))));
    }

    #[test]
    fn test_invalid_file_names() {
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("/etc/passwd").is_err());
        assert!(validate_file_name("../escape").is_err());
        assert!(validate_file_name("a/../../escape").is_err());
        assert!(validate_file_name("a/./b").is_err());
        assert!(validate_file_name("a//b").is_err());
        assert!(validate_file_name("trailing/").is_err());
        assert!(validate_file_name("nul\0byte").is_err());

        assert!(validate_file_name("plain.txt").is_ok());
        assert!(validate_file_name("deep/nested/file").is_ok());
        assert!(validate_file_name(".hidden").is_ok());
    }

    #[test]
    fn test_json_field_names() {
        let entry = sample();
        let json = serde_json::to_string(&entry).unwrap();
        for field in ["\"Version\"", "\"ID\"", "\"BaseID\"", "\"Changed\"", "\"Deleted\"", "\"FileName\"", "\"Hash\""] {
            assert!(json.contains(field), "missing {} in {}", field, json);
        }
        // only the multi-chunk entry carries AdditionalChunks
        assert_eq!(json.matches("\"AdditionalChunks\"").count(), 1);
    }

    #[test]
    fn test_json_accepts_null_lists_and_missing_chunks() {
        let hash = compute_content_hash(b"a");
        let json = format!(
            r#"{{
                "Version": 1,
                "ID": "6f1c1d6e-3c2b-4a7e-9d51-0c7e7b0a1f22",
                "BaseID": "00000000-0000-0000-0000-000000000000",
                "Changed": [{{"FileName": "a.txt", "Hash": "{}"}}],
                "Deleted": null
            }}"#,
            hash
        );
        let entry: ChainEntry = serde_json::from_str(&json).unwrap();
        assert!(entry.is_root());
        assert!(entry.deleted.is_empty());
        assert_eq!(entry.changed[0].additional_chunks, 0);
        entry.validate().unwrap();
    }
}
