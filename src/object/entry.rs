use crate::error::{Error, Result};
use crate::hive::DataHive;
use crate::types::{ChainEntry, EntryId};

/// storage name of a chain entry object
pub fn entry_object_name(id: &EntryId) -> String {
    format!("{}.json", id)
}

/// serialize a chain entry
///
/// entries are written as pretty JSON with both sets sorted by file name, so
/// the same logical entry always produces the same bytes.
pub fn encode_entry(entry: &ChainEntry) -> Result<Vec<u8>> {
    entry.validate()?;

    let mut sorted = entry.clone();
    sorted.sort();
    Ok(serde_json::to_vec_pretty(&sorted)?)
}

/// parse and validate a serialized chain entry
pub fn decode_entry(bytes: &[u8]) -> Result<ChainEntry> {
    let entry: ChainEntry = serde_json::from_slice(bytes)?;
    entry.validate()?;
    Ok(entry)
}

/// download a committed chain entry by id
pub fn read_entry(data: &dyn DataHive, id: &EntryId) -> Result<ChainEntry> {
    let bytes = data.download(&entry_object_name(id))?;
    let entry = decode_entry(&bytes)?;

    if entry.id != *id {
        return Err(Error::InvalidEntry(format!(
            "object {} holds entry {}",
            entry_object_name(id),
            entry.id
        )));
    }

    Ok(entry)
}
