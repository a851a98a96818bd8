//! meta hive backed by a single JSON database file
//!
//! layout: `{"Tags": [{"Name", "ID"}], "Entries": [{"ID", "BaseID"}]}`.
//! every mutation rewrites the whole file atomically while holding an
//! exclusive flock on `<db>.lock`, so concurrent writers serialize.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use nix::fcntl::{Flock, FlockArg};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fs::write_file_atomic;
use crate::hive::MetaHive;
use crate::types::{null_as_empty, EntryId, Tag};

const BACKEND: &str = "json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Database {
    #[serde(rename = "Tags", default, deserialize_with = "null_as_empty")]
    tags: Vec<Tag>,
    #[serde(rename = "Entries", default, deserialize_with = "null_as_empty")]
    entries: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct EdgeRecord {
    #[serde(rename = "ID")]
    id: EntryId,
    #[serde(rename = "BaseID")]
    base_id: EntryId,
}

/// tags and chain edges in one JSON file
#[derive(Clone, Debug)]
pub struct JsonMetaHive {
    path: PathBuf,
}

impl JsonMetaHive {
    /// open a database file; it is created on first write
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| unavailable(parent, e))?;
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Database> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Database::default()),
            Err(e) => Err(unavailable(&self.path, e)),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    /// block until this process is the only writer of the database
    fn lock(&self) -> Result<Flock<File>> {
        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| unavailable(&lock_path, e))?;

        Flock::lock(file, FlockArg::LockExclusive)
            .map_err(|(_, errno)| unavailable(&lock_path, errno.into()))
    }

    /// load, apply `f`, and save if it reports a change, all under the lock
    fn modify<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Database) -> Result<bool>,
    {
        let _lock = self.lock()?;
        let mut db = self.load()?;
        if f(&mut db)? {
            self.save(&db)?;
        }
        Ok(())
    }

    fn save(&self, db: &Database) -> Result<()> {
        let content = serde_json::to_vec_pretty(db)?;
        write_file_atomic(&self.path, &content).map_err(|e| match e {
            Error::Io { path, source } => unavailable(&path, source),
            other => other,
        })
    }
}

impl MetaHive for JsonMetaHive {
    fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut tags = self.load()?.tags;
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    fn find_tag(&self, name: &str) -> Result<Option<Tag>> {
        Ok(self.load()?.tags.into_iter().find(|t| t.name == name))
    }

    fn upsert_tag(&self, name: &str, id: EntryId) -> Result<()> {
        self.modify(|db| {
            match db.tags.iter_mut().find(|t| t.name == name) {
                Some(tag) => tag.id = id,
                None => db.tags.push(Tag::new(name, id)),
            }
            Ok(true)
        })
    }

    fn find_parent(&self, id: &EntryId) -> Result<Option<EntryId>> {
        Ok(self
            .load()?
            .entries
            .iter()
            .find(|e| e.id == *id)
            .map(|e| e.base_id))
    }

    fn record_edge(&self, id: EntryId, base_id: EntryId) -> Result<()> {
        self.modify(|db| {
            if let Some(existing) = db.entries.iter().find(|e| e.id == id) {
                if existing.base_id == base_id {
                    return Ok(false);
                }
                return Err(Error::DuplicateEntry(id));
            }
            db.entries.push(EdgeRecord { id, base_id });
            Ok(true)
        })
    }
}

fn unavailable(path: &Path, e: std::io::Error) -> Error {
    Error::BackendUnavailable {
        backend: BACKEND,
        message: format!("{}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_hive() -> (tempfile::TempDir, JsonMetaHive) {
        let dir = tempdir().unwrap();
        let hive = JsonMetaHive::open(&dir.path().join("meta/db.json")).unwrap();
        (dir, hive)
    }

    #[test]
    fn test_missing_file_is_empty_database() {
        let (_dir, hive) = test_hive();
        assert!(hive.list_tags().unwrap().is_empty());
        assert!(hive.find_tag("latest").unwrap().is_none());
        assert!(hive.find_parent(&EntryId::new_random()).unwrap().is_none());
    }

    #[test]
    fn test_upsert_tag() {
        let (_dir, hive) = test_hive();
        let first = EntryId::new_random();
        let second = EntryId::new_random();

        hive.upsert_tag("latest", first).unwrap();
        assert_eq!(hive.find_tag("latest").unwrap().unwrap().id, first);

        hive.upsert_tag("latest", second).unwrap();
        assert_eq!(hive.find_tag("latest").unwrap().unwrap().id, second);
        assert_eq!(hive.list_tags().unwrap().len(), 1);
    }

    #[test]
    fn test_list_tags_sorted() {
        let (_dir, hive) = test_hive();
        hive.upsert_tag("zeta", EntryId::new_random()).unwrap();
        hive.upsert_tag("alpha", EntryId::new_random()).unwrap();

        let names: Vec<_> = hive.list_tags().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_edges() {
        let (_dir, hive) = test_hive();
        let root = EntryId::new_random();
        let child = EntryId::new_random();

        hive.record_edge(root, EntryId::ROOT).unwrap();
        hive.record_edge(child, root).unwrap();

        assert_eq!(hive.find_parent(&root).unwrap(), Some(EntryId::ROOT));
        assert_eq!(hive.find_parent(&child).unwrap(), Some(root));
    }

    #[test]
    fn test_record_edge_idempotent_but_not_rebindable() {
        let (_dir, hive) = test_hive();
        let id = EntryId::new_random();

        hive.record_edge(id, EntryId::ROOT).unwrap();
        hive.record_edge(id, EntryId::ROOT).unwrap();

        let result = hive.record_edge(id, EntryId::new_random());
        assert!(matches!(result, Err(Error::DuplicateEntry(dup)) if dup == id));
        assert_eq!(hive.find_parent(&id).unwrap(), Some(EntryId::ROOT));
    }

    #[test]
    fn test_reads_legacy_layout_with_nulls() {
        let (_dir, hive) = test_hive();
        fs::write(hive.path(), r#"{"Tags": null, "Entries": null}"#).unwrap();
        assert!(hive.list_tags().unwrap().is_empty());

        let id = EntryId::new_random();
        fs::write(
            hive.path(),
            format!(
                r#"{{"Tags":[{{"Name":"latest","ID":"{id}"}}],"Entries":[{{"ID":"{id}","BaseID":"00000000-0000-0000-0000-000000000000"}}]}}"#
            ),
        )
        .unwrap();
        assert_eq!(hive.find_tag("latest").unwrap().unwrap().id, id);
        assert_eq!(hive.find_parent(&id).unwrap(), Some(EntryId::ROOT));
    }

    #[test]
    fn test_corrupt_database() {
        let (_dir, hive) = test_hive();
        fs::write(hive.path(), "not json").unwrap();
        assert!(matches!(hive.list_tags(), Err(Error::Json(_))));
    }

    #[test]
    fn test_concurrent_writers_keep_every_update() {
        let (dir, _hive) = test_hive();
        let db_path = dir.path().join("meta/db.json");
        let writers = 8;
        let rounds = 10;

        let handles: Vec<_> = (0..writers)
            .map(|i| {
                let hive = JsonMetaHive::open(&db_path).unwrap();
                std::thread::spawn(move || {
                    let mut ids = Vec::new();
                    for round in 0..rounds {
                        let id = EntryId::new_random();
                        hive.record_edge(id, EntryId::ROOT).unwrap();
                        hive.upsert_tag(&format!("tag{}_{}", round, i), id).unwrap();
                        ids.push(id);
                    }
                    ids
                })
            })
            .collect();

        let ids: Vec<EntryId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();

        let hive = JsonMetaHive::open(&db_path).unwrap();
        assert_eq!(hive.list_tags().unwrap().len(), writers * rounds);
        for id in &ids {
            assert_eq!(hive.find_parent(id).unwrap(), Some(EntryId::ROOT));
        }
    }

    #[test]
    fn test_persists_across_instances() {
        let (dir, hive) = test_hive();
        let id = EntryId::new_random();
        hive.upsert_tag("latest", id).unwrap();

        let reopened = JsonMetaHive::open(&dir.path().join("meta/db.json")).unwrap();
        assert_eq!(reopened.find_tag("latest").unwrap().unwrap().id, id);
    }
}
