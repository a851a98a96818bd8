//! high-level operations over a store and a staging area

mod commit;
mod diff;
mod flatten;
mod log;
mod resolve;
mod restore;
mod stage;
mod tags;
mod verify;

pub use commit::{commit, CommitReport};
pub use diff::{compute_changes, Changes, FileChange};
pub use flatten::{flatten, flatten_entries, snapshot_at, tag_snapshot};
pub use log::{log, LogEntry};
pub use resolve::{find_tag, resolve_chain, resolve_tag};
pub use restore::{restore, restore_snapshot, RestoreReport};
pub use stage::{discard, patch, status, version, StageOptions, StageReport};
pub use tags::tags;
pub use verify::{verify, CorruptContent, MissingContent, VerifyReport};
