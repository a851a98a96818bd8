//! tp - versioned directory distribution over a content-addressed patch chain
//!
//! a producer commits directory states under a tag; consumers restore a tag to
//! a local directory, downloading only the content they lack.
//!
//! # Core concepts
//!
//! - **Blob**: file content, zlib-compressed and split into chunks named by the
//!   SHA-256 of the raw bytes (`H`, `H_1`, `H_2`, ...)
//! - **Chain entry**: one patch (changed files plus tombstones) pointing back at
//!   its base entry, stored as `<id>.json`
//! - **Tag**: a named, mutable pointer to the head of a chain
//! - **Hive**: a storage collaborator; the data hive holds chunks and entries,
//!   the meta hive holds tags and chain edges
//!
//! # Example usage
//!
//! ```no_run
//! use tp::{ops, Config, Store};
//! use std::path::Path;
//!
//! let config = Config::load_or_default(Path::new("transport.toml")).unwrap();
//! let store = Store::open(&config).unwrap();
//! let staging = Path::new(".staging");
//!
//! // stage and commit a root entry
//! ops::version(store.codec(), Path::new("/source"), staging, &ops::StageOptions::default()).unwrap();
//! ops::commit(&store, "stable", staging).unwrap();
//!
//! // restore to a directory
//! ops::restore(&store, "stable", Path::new("/destination")).unwrap();
//! ```

mod config;
mod error;
mod hash;
mod staging;
mod store;

pub mod fs;
pub mod hive;
pub mod object;
pub mod ops;
pub mod types;

pub use config::{Config, DataBackend, MetaBackend, DEFAULT_CHUNK_SIZE_MB};
pub use error::{Error, IoResultExt, Result};
pub use hash::{compute_content_hash, hash_file, ContentHasher, Hash};
pub use hive::{DataHive, MetaHive};
pub use object::{BlobCodec, EncodedBlob};
pub use staging::Staging;
pub use store::Store;
pub use types::{ChainEntry, Entry, EntryId, Snapshot, Tag, Tombstone};
