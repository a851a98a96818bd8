use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::ops::flatten::tag_snapshot;
use crate::store::Store;
use crate::types::EntryId;

/// verify report
#[derive(Debug, Default)]
pub struct VerifyReport {
    /// head the snapshot was taken at
    pub head: EntryId,
    /// files checked
    pub files_checked: usize,
    /// distinct contents decoded
    pub contents_checked: usize,
    /// files whose chunks are missing from the data hive
    pub missing: Vec<MissingContent>,
    /// files whose chunks decode to the wrong digest
    pub corrupt: Vec<CorruptContent>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty() && self.corrupt.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingContent {
    pub file_name: String,
    pub chunk: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorruptContent {
    pub file_name: String,
    pub expected: Hash,
    pub actual: Hash,
}

enum Outcome {
    Ok,
    Missing(String),
    Corrupt(Hash),
}

/// decode every file of a tag's snapshot without writing anything
pub fn verify(store: &Store, tag: &str) -> Result<VerifyReport> {
    let snapshot = tag_snapshot(store, tag)?;
    let mut report = VerifyReport {
        head: snapshot.head,
        ..VerifyReport::default()
    };
    let mut outcomes: HashMap<Hash, Outcome> = HashMap::new();

    for (name, entry) in &snapshot.files {
        report.files_checked += 1;

        if !outcomes.contains_key(&entry.hash) {
            let decoded = store.codec().decode(
                |chunk| store.data().download(chunk),
                &entry.hash,
                entry.additional_chunks,
            );
            let outcome = match decoded {
                Ok(_) => Outcome::Ok,
                Err(Error::NotFound(chunk)) => Outcome::Missing(chunk),
                Err(Error::ConsistencyViolation { actual, .. }) => Outcome::Corrupt(actual),
                Err(e) => return Err(e),
            };
            report.contents_checked += 1;
            outcomes.insert(entry.hash, outcome);
        }

        match outcomes.get(&entry.hash) {
            Some(Outcome::Missing(chunk)) => {
                tracing::warn!(path = %name, chunk = %chunk, "missing chunk");
                report.missing.push(MissingContent {
                    file_name: name.clone(),
                    chunk: chunk.clone(),
                });
            }
            Some(Outcome::Corrupt(actual)) => {
                tracing::warn!(path = %name, expected = %entry.hash, actual = %actual, "corrupt content");
                report.corrupt.push(CorruptContent {
                    file_name: name.clone(),
                    expected: entry.hash,
                    actual: *actual,
                });
            }
            Some(Outcome::Ok) | None => {}
        }
    }

    Ok(report)
}
