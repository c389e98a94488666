//! In-memory tar assembly.

use super::header::{encode_header, BLOCK_SIZE};

/// Two zero blocks mark the end of an archive.
const END_OF_ARCHIVE: [u8; BLOCK_SIZE * 2] = [0u8; BLOCK_SIZE * 2];

/// One file placed into an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// In-archive path, already de-duplicated and joined under the root directory.
    pub path: String,
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }
}

/// Number of zero bytes needed after `size` bytes of data to reach a block boundary.
pub fn padding_len(size: usize) -> usize {
    (BLOCK_SIZE - size % BLOCK_SIZE) % BLOCK_SIZE
}

/// Incremental tar writer over a growable buffer.
///
/// All entries share the `mtime` given at construction.
#[derive(Debug)]
pub struct TarBuilder {
    buffer: Vec<u8>,
    mtime: i64,
    entries: usize,
}

impl TarBuilder {
    pub fn new(mtime: i64) -> Self {
        Self::with_capacity(mtime, 0)
    }

    pub fn with_capacity(mtime: i64, capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            mtime,
            entries: 0,
        }
    }

    /// Append one regular file: header, data, then padding.
    pub fn append(&mut self, path: &str, data: &[u8]) {
        let header = encode_header(path, data.len() as u64, self.mtime);
        self.buffer.extend_from_slice(&header);
        self.buffer.extend_from_slice(data);
        self.buffer.resize(self.buffer.len() + padding_len(data.len()), 0);
        self.entries += 1;
    }

    /// Number of entries appended so far.
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    /// Write the end-of-archive marker and return the archive bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.buffer.extend_from_slice(&END_OF_ARCHIVE);
        self.buffer
    }
}

/// Exact size of the archive [`build_archive`] produces for `entries`.
pub fn archive_len(entries: &[ArchiveEntry]) -> usize {
    entries
        .iter()
        .map(|entry| BLOCK_SIZE + entry.bytes.len() + padding_len(entry.bytes.len()))
        .sum::<usize>()
        + END_OF_ARCHIVE.len()
}

/// Build a complete tar archive from `entries`, in order.
pub fn build_archive(entries: Vec<ArchiveEntry>, mtime: i64) -> Vec<u8> {
    let mut builder = TarBuilder::with_capacity(mtime, archive_len(&entries));
    for entry in entries {
        builder.append(&entry.path, &entry.bytes);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn entries() -> Vec<ArchiveEntry> {
        vec![
            ArchiveEntry::new("root/a.txt", b"hello tar".to_vec()),
            ArchiveEntry::new("root/empty.bin", Vec::new()),
            ArchiveEntry::new("root/block.bin", vec![7u8; 512]),
            ArchiveEntry::new("root/big.bin", vec![1u8; 1300]),
        ]
    }

    #[test]
    fn test_padding_len() {
        assert_eq!(padding_len(0), 0);
        assert_eq!(padding_len(1), 511);
        assert_eq!(padding_len(511), 1);
        assert_eq!(padding_len(512), 0);
        assert_eq!(padding_len(513), 511);
    }

    #[test]
    fn test_empty_archive_is_end_marker_only() {
        let archive = build_archive(Vec::new(), 0);
        assert_eq!(archive.len(), 1024);
        assert!(archive.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_length_is_block_aligned_with_zero_trailer() {
        let archive = build_archive(entries(), 1_700_000_000);
        assert_eq!(archive.len() % 512, 0);
        assert!(archive[archive.len() - 1024..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_archive_len_matches_output() {
        let expected = archive_len(&entries());
        // 512+512, 512, 512+512, 512+1536, 1024
        assert_eq!(expected, 5632);
        assert_eq!(build_archive(entries(), 0).len(), expected);
    }

    #[test]
    fn test_layout_of_single_entry() {
        let archive = build_archive(vec![ArchiveEntry::new("root/a.txt", b"hello tar".to_vec())], 0);
        assert_eq!(archive.len(), 512 + 512 + 1024);
        assert_eq!(&archive[512..521], b"hello tar");
        assert!(archive[521..1024].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty_payload_gets_header_only() {
        let archive = build_archive(vec![ArchiveEntry::new("root/empty", Vec::new())], 0);
        assert_eq!(archive.len(), 512 + 1024);
        assert_eq!(&archive[257..263], b"ustar\0");
    }

    #[test]
    fn test_builder_counts_entries() {
        let mut builder = TarBuilder::new(0);
        builder.append("a", b"1");
        builder.append("b", b"2");
        assert_eq!(builder.entry_count(), 2);
        assert_eq!(builder.finish().len(), 2 * 1024 + 1024);
    }

    #[test]
    fn test_archive_readable_by_tar_crate() {
        let archive = build_archive(entries(), 1_700_000_000);
        let mut reader = tar::Archive::new(archive.as_slice());

        let mut seen = Vec::new();
        for entry in reader.entries().unwrap() {
            let mut entry = entry.unwrap();
            let path = entry.path().unwrap().to_string_lossy().into_owned();
            assert_eq!(entry.header().mtime().unwrap(), 1_700_000_000);
            assert_eq!(entry.header().mode().unwrap(), 0o644);
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            seen.push((path, data));
        }

        let expected: Vec<(String, Vec<u8>)> =
            entries().into_iter().map(|e| (e.path, e.bytes)).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_long_paths_readable_by_tar_crate() {
        let long_dir = format!("root/{}", "nested-directory-".repeat(6));
        let path = format!("{}/{}.txt", long_dir, "n".repeat(70));
        let archive = build_archive(vec![ArchiveEntry::new(path.clone(), b"x".to_vec())], 0);

        let mut reader = tar::Archive::new(archive.as_slice());
        let entry = reader.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(entry.path().unwrap().to_string_lossy(), path);
    }
}
