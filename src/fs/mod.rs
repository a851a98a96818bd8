pub mod scan;
pub mod write;

pub use scan::{scan_dir, ScannedFile, Scanner};
pub use write::{fsync_dir, fsync_file, remove_file_if_exists, write_file_atomic, write_file_synced};
