//! ustar archive construction.
//!
//! Archives are built entirely in memory: every entry is a 512-byte header,
//! the entry data, and zero padding up to the next block, followed by two
//! zero blocks at the end of the archive.

pub mod builder;
pub mod header;
pub mod names;

pub use builder::{archive_len, build_archive, padding_len, ArchiveEntry, TarBuilder};
pub use header::{encode_header, header_checksum, split_path, SplitPath, BLOCK_SIZE};
pub use names::{ensure_unique_name, UniqueNames};
