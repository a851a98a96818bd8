use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::fs::Scanner;
use crate::hash::Hash;
use crate::object::BlobCodec;
use crate::ops::diff::compute_changes;
use crate::ops::flatten::tag_snapshot;
use crate::staging::Staging;
use crate::store::Store;
use crate::types::{ChainEntry, Entry, EntryId, Snapshot, Tombstone};

/// options for staging a new chain entry
#[derive(Clone, Debug, Default)]
pub struct StageOptions {
    /// discard a pending staged entry instead of refusing to stage
    pub force: bool,
}

/// what a staging run produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageReport {
    pub id: EntryId,
    pub base_id: EntryId,
    pub changed: usize,
    pub deleted: usize,
    /// chunk objects written to staging
    pub chunks: usize,
}

/// stage a root entry holding every file under `source`
pub fn version(
    codec: &BlobCodec,
    source: &Path,
    staging: &Path,
    options: &StageOptions,
) -> Result<StageReport> {
    stage(codec, &Snapshot::empty(), source, staging, options)
}

/// stage a patch of `source` against the current head of `tag`
pub fn patch(
    store: &Store,
    tag: &str,
    source: &Path,
    staging: &Path,
    options: &StageOptions,
) -> Result<StageReport> {
    let prior = tag_snapshot(store, tag)?;
    stage(store.codec(), &prior, source, staging, options)
}

fn stage(
    codec: &BlobCodec,
    prior: &Snapshot,
    source: &Path,
    staging_path: &Path,
    options: &StageOptions,
) -> Result<StageReport> {
    if options.force {
        if Staging::discard(staging_path)? {
            tracing::info!(staging = %staging_path.display(), "discarded pending entry");
        }
    } else if Staging::is_staged(staging_path) {
        return Err(Error::StagingOccupied(staging_path.to_path_buf()));
    }

    let files = Scanner::new(source).exclude(staging_path).scan()?;
    let changes = compute_changes(prior, &files)?;
    if changes.is_empty() {
        return Err(Error::NoChanges(source.to_path_buf()));
    }

    let staging = Staging::init(staging_path)?;
    let mut entry = ChainEntry::new(EntryId::new_random(), prior.head);
    let mut encoded: HashMap<Hash, u32> = HashMap::new();
    let mut chunks = 0;

    for change in &changes.changed {
        let (hash, additional) = match encoded.get(&change.hash) {
            Some(additional) => (change.hash, *additional),
            None => {
                let blob = codec.encode(&change.file.read()?)?;
                if blob.hash != change.hash {
                    tracing::warn!(path = %change.file.rel, "file changed while staging");
                }
                for (name, data) in blob.named_chunks() {
                    staging.write_chunk(&name, data)?;
                    chunks += 1;
                }
                encoded.insert(blob.hash, blob.additional_chunks());
                (blob.hash, blob.additional_chunks())
            }
        };
        tracing::debug!(path = %change.file.rel, %hash, additional, "staged file");
        entry
            .changed
            .push(Entry::new(change.file.rel.clone(), hash, additional));
    }

    for path in &changes.deleted {
        entry.deleted.push(Tombstone::new(path.clone()));
    }

    staging.write_entry(&entry)?;

    let report = StageReport {
        id: entry.id,
        base_id: entry.base_id,
        changed: entry.changed.len(),
        deleted: entry.deleted.len(),
        chunks,
    };
    tracing::info!(
        id = %report.id,
        base = %report.base_id,
        changed = report.changed,
        deleted = report.deleted,
        "staged entry"
    );
    Ok(report)
}

/// the entry waiting in a staging area, if any
pub fn status(staging: &Path) -> Result<Option<ChainEntry>> {
    if !Staging::is_staged(staging) {
        return Ok(None);
    }
    let staging = Staging::open(staging)?;
    Ok(Some(staging.read_entry()?))
}

/// drop whatever is staged, returning whether anything was there
pub fn discard(staging: &Path) -> Result<bool> {
    Staging::discard(staging)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::compute_content_hash;
    use crate::object::chunk_name;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_version_stages_root() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source");
        let staging = dir.path().join(".staging");
        fs::create_dir_all(source.join("sub")).unwrap();
        fs::write(source.join("a.txt"), "a").unwrap();
        fs::write(source.join("sub/b.txt"), "b").unwrap();

        let codec = BlobCodec::default();
        let report = version(&codec, &source, &staging, &StageOptions::default()).unwrap();
        assert_eq!(report.base_id, EntryId::ROOT);
        assert_eq!(report.changed, 2);
        assert_eq!(report.deleted, 0);
        assert_eq!(report.chunks, 2);

        let entry = status(&staging).unwrap().unwrap();
        assert_eq!(entry.id, report.id);
        assert!(entry.is_root());

        let staged = Staging::open(&staging).unwrap();
        let chunk = staged
            .read_chunk(&chunk_name(&compute_content_hash(b"a"), 0))
            .unwrap();
        assert!(!chunk.is_empty());
    }

    #[test]
    fn test_identical_content_staged_once() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source");
        let staging = dir.path().join(".staging");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("one"), "same").unwrap();
        fs::write(source.join("two"), "same").unwrap();

        let report = version(
            &BlobCodec::default(),
            &source,
            &staging,
            &StageOptions::default(),
        )
        .unwrap();
        assert_eq!(report.changed, 2);
        assert_eq!(report.chunks, 1);
    }

    #[test]
    fn test_multi_chunk_file() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source");
        let staging = dir.path().join(".staging");
        fs::create_dir_all(&source).unwrap();

        // incompressible enough to span several 64-byte chunks
        let content: Vec<u8> = (0..4096u32).map(|i| (i.wrapping_mul(2654435761) >> 13) as u8).collect();
        fs::write(source.join("big"), &content).unwrap();

        let codec = BlobCodec::new(64).unwrap();
        let report = version(&codec, &source, &staging, &StageOptions::default()).unwrap();
        assert!(report.chunks > 1);

        let entry = status(&staging).unwrap().unwrap();
        assert_eq!(entry.changed[0].chunk_count(), report.chunks);
    }

    #[test]
    fn test_empty_source_is_no_changes() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source");
        let staging = dir.path().join(".staging");
        fs::create_dir_all(&source).unwrap();

        let result = version(
            &BlobCodec::default(),
            &source,
            &staging,
            &StageOptions::default(),
        );
        assert!(matches!(result, Err(Error::NoChanges(_))));
        assert!(!staging.exists());
    }

    #[test]
    fn test_occupied_and_force() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source");
        let staging = dir.path().join(".staging");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("a"), "a").unwrap();

        let codec = BlobCodec::default();
        let first = version(&codec, &source, &staging, &StageOptions::default()).unwrap();

        let result = version(&codec, &source, &staging, &StageOptions::default());
        assert!(matches!(result, Err(Error::StagingOccupied(_))));

        let second = version(&codec, &source, &staging, &StageOptions { force: true }).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(status(&staging).unwrap().unwrap().id, second.id);
    }

    #[test]
    fn test_staging_inside_source_is_not_scanned() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source");
        let staging = source.join(".staging");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("a"), "a").unwrap();

        let codec = BlobCodec::default();
        version(&codec, &source, &staging, &StageOptions::default()).unwrap();
        let report = version(&codec, &source, &staging, &StageOptions { force: true }).unwrap();
        assert_eq!(report.changed, 1);
    }

    #[test]
    fn test_status_and_discard() {
        let dir = tempdir().unwrap();
        let staging = dir.path().join(".staging");

        assert!(status(&staging).unwrap().is_none());
        assert!(!discard(&staging).unwrap());

        let source = dir.path().join("source");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("a"), "a").unwrap();
        version(
            &BlobCodec::default(),
            &source,
            &staging,
            &StageOptions::default(),
        )
        .unwrap();

        assert!(discard(&staging).unwrap());
        assert!(status(&staging).unwrap().is_none());
    }
}
