mod entry;
mod id;
mod snapshot;
mod tag;

pub(crate) use entry::null_as_empty;
pub use entry::{validate_file_name, ChainEntry, Entry, Tombstone, FORMAT_VERSION};
pub use id::EntryId;
pub use snapshot::Snapshot;
pub use tag::{validate_tag_name, Tag, FORBIDDEN_TAG_CHARS};
