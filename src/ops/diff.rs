use std::collections::BTreeMap;

use crate::error::Result;
use crate::fs::ScannedFile;
use crate::hash::Hash;
use crate::types::Snapshot;

/// a scanned file whose content differs from (or is absent in) the prior snapshot
#[derive(Clone, Debug)]
pub struct FileChange {
    pub file: ScannedFile,
    pub hash: Hash,
}

/// minimal changeset between a snapshot and a scanned directory
#[derive(Clone, Debug, Default)]
pub struct Changes {
    /// new or modified files, by path
    pub changed: Vec<FileChange>,
    /// paths tracked by the prior snapshot that are gone
    pub deleted: Vec<String>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.deleted.is_empty()
    }
}

/// compare a scan against a prior snapshot
///
/// only content matters: a file whose bytes hash to the recorded digest is
/// unchanged whatever its timestamps say.
pub fn compute_changes(prior: &Snapshot, files: &[ScannedFile]) -> Result<Changes> {
    let scanned: BTreeMap<&str, &ScannedFile> =
        files.iter().map(|f| (f.rel.as_str(), f)).collect();

    let mut changes = Changes::default();

    for path in prior.files.keys() {
        if !scanned.contains_key(path.as_str()) {
            tracing::debug!(path = %path, "deleted");
            changes.deleted.push(path.clone());
        }
    }

    for (path, file) in scanned {
        let hash = file.hash()?;
        match prior.hash_of(path) {
            Some(previous) if previous == hash => continue,
            Some(_) => tracing::debug!(path, "modified"),
            None => tracing::debug!(path, "added"),
        }
        changes.changed.push(FileChange {
            file: file.clone(),
            hash,
        });
    }

    Ok(changes)
}
