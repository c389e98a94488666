//! ustar header encoding.
//!
//! Every archive entry starts with one 512-byte header block. Numeric fields
//! are zero-padded octal terminated by a NUL, and paths longer than the
//! 100-byte `name` field are split into a `prefix` and a `name` at a `/`.
//!
//! | Field    | Offset | Length |
//! |----------|--------|--------|
//! | name     | 0      | 100    |
//! | mode     | 100    | 8      |
//! | uid      | 108    | 8      |
//! | gid      | 116    | 8      |
//! | size     | 124    | 12     |
//! | mtime    | 136    | 12     |
//! | chksum   | 148    | 8      |
//! | typeflag | 156    | 1      |
//! | magic    | 257    | 6      |
//! | version  | 263    | 2      |
//! | prefix   | 345    | 155    |

use std::ops::Range;

use crate::util::truncate_to_byte_budget;

/// Size of a header block, and the unit all entry data is padded to.
pub const BLOCK_SIZE: usize = 512;

/// Maximum byte length of the `name` field.
pub const NAME_LEN: usize = 100;

/// Maximum byte length of the `prefix` field.
pub const PREFIX_LEN: usize = 155;

const NAME: Range<usize> = 0..100;
const MODE: Range<usize> = 100..108;
const UID: Range<usize> = 108..116;
const GID: Range<usize> = 116..124;
const SIZE: Range<usize> = 124..136;
const MTIME: Range<usize> = 136..148;
const CHECKSUM: Range<usize> = 148..156;
const TYPEFLAG: usize = 156;
const MAGIC: Range<usize> = 257..263;
const VERSION: Range<usize> = 263..265;
const PREFIX: Range<usize> = 345..500;

const FILE_MODE: u64 = 0o644;
const REGULAR_FILE: u8 = b'0';

/// A path split into the ustar `prefix` and `name` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPath {
    pub prefix: String,
    pub name: String,
}

/// Split an archive path into ustar `prefix` and `name` parts.
///
/// Leading slashes are dropped. Paths of up to 100 bytes go entirely into
/// `name`. Longer paths are split at the right-most `/` that leaves a
/// `name` of at most 100 bytes and a `prefix` of at most 155 bytes. When no
/// such `/` exists the path is truncated to 100 bytes and the prefix stays
/// empty, so such entries may end up with the same stored name.
pub fn split_path(path: &str) -> SplitPath {
    let normalized = path.trim_start_matches('/');

    if normalized.len() <= NAME_LEN {
        return SplitPath {
            prefix: String::new(),
            name: normalized.to_string(),
        };
    }

    for (idx, _) in normalized.rmatch_indices('/') {
        let name = &normalized[idx + 1..];
        // moving left only makes the name longer
        if name.len() > NAME_LEN {
            break;
        }

        let prefix = &normalized[..idx];
        if !name.is_empty() && prefix.len() <= PREFIX_LEN {
            return SplitPath {
                prefix: prefix.to_string(),
                name: name.to_string(),
            };
        }
    }

    SplitPath {
        prefix: String::new(),
        name: truncate_to_byte_budget(normalized, NAME_LEN),
    }
}

/// Encode the header block for a regular file entry.
///
/// `mtime` is in Unix seconds; negative values are stored as 0.
pub fn encode_header(path: &str, size: u64, mtime: i64) -> [u8; BLOCK_SIZE] {
    let mut block = [0u8; BLOCK_SIZE];
    let split = split_path(path);

    write_bytes(&mut block[NAME], split.name.as_bytes());
    write_octal(&mut block[MODE], FILE_MODE);
    write_octal(&mut block[UID], 0);
    write_octal(&mut block[GID], 0);
    write_octal(&mut block[SIZE], size);
    write_octal(&mut block[MTIME], u64::try_from(mtime).unwrap_or(0));
    block[TYPEFLAG] = REGULAR_FILE;
    block[MAGIC].copy_from_slice(b"ustar\0");
    block[VERSION].copy_from_slice(b"00");
    write_bytes(&mut block[PREFIX], split.prefix.as_bytes());

    block[CHECKSUM].fill(b' ');
    let checksum = header_checksum(&block);
    let digits = format!("{:06o}", checksum);
    block[148..154].copy_from_slice(digits.as_bytes());
    block[154] = 0;
    block[155] = b' ';

    block
}

/// Unsigned byte sum of a header block with the checksum field counted as
/// eight spaces.
pub fn header_checksum(block: &[u8; BLOCK_SIZE]) -> u32 {
    block
        .iter()
        .enumerate()
        .map(|(idx, &byte)| {
            if CHECKSUM.contains(&idx) {
                u32::from(b' ')
            } else {
                u32::from(byte)
            }
        })
        .sum()
}

/// Write `value` as zero-padded octal filling all but the last byte of
/// `field`, followed by a NUL. Values that do not fit are clamped to the
/// largest representable one.
fn write_octal(field: &mut [u8], value: u64) {
    let digits = field.len() - 1;
    let max = (1u64 << (3 * digits as u32)) - 1;
    let text = format!("{:0width$o}", value.min(max), width = digits);
    field[..digits].copy_from_slice(text.as_bytes());
    field[digits] = 0;
}

fn write_bytes(field: &mut [u8], bytes: &[u8]) {
    let len = bytes.len().min(field.len());
    field[..len].copy_from_slice(&bytes[..len]);
}
