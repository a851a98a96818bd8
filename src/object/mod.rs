pub mod blob;
pub mod entry;

pub use blob::{chunk_count, chunk_name, BlobCodec, EncodedBlob, DEFAULT_CHUNK_SIZE, MAX_CHUNKS};
pub use entry::{decode_entry, encode_entry, entry_object_name, read_entry};
