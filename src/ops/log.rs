use crate::error::Result;
use crate::object::read_entry;
use crate::ops::resolve::{find_tag, resolve_chain};
use crate::store::Store;
use crate::types::EntryId;

/// one chain entry summarized for log output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub id: EntryId,
    pub base_id: EntryId,
    pub changed: usize,
    pub deleted: usize,
}

/// history of a tag, newest first
pub fn log(store: &Store, tag: &str, max_count: Option<usize>) -> Result<Vec<LogEntry>> {
    let head = find_tag(store.meta(), tag)?.id;
    let chain = resolve_chain(store.meta(), head)?;

    let limit = max_count.unwrap_or(chain.len());
    let mut entries = Vec::new();
    for id in chain.iter().rev().take(limit) {
        let entry = read_entry(store.data(), id)?;
        entries.push(LogEntry {
            id: entry.id,
            base_id: entry.base_id,
            changed: entry.changed.len(),
            deleted: entry.deleted.len(),
        });
    }

    Ok(entries)
}

/// format a log entry for display
impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "entry {}", self.id)?;
        if self.base_id.is_root() {
            writeln!(f, "Base:    (root)")?;
        } else {
            writeln!(f, "Base:    {}", self.base_id)?;
        }
        writeln!(f, "Changed: {}", self.changed)?;
        writeln!(f, "Deleted: {}", self.deleted)
    }
}
