use super::{ArchiveFormat, Filter};

/// Bytes of decoded prefix needed to recognise every supported format
///
/// Tar needs a full 512-byte header block; everything else is decided in the
/// first eight bytes.
pub const PROBE_LEN: usize = 512;

const TAR_BLOCK: usize = 512;

/// Detect a compression filter from the first bytes of a stream
pub fn detect_filter(data: &[u8]) -> Option<Filter> {
    match data {
        [0x1F, 0x8B, ..] => Some(Filter::Gzip),
        [b'B', b'Z', b'h', level, ..] if (b'1'..=b'9').contains(level) => Some(Filter::Bzip2),
        [0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00, ..] => Some(Filter::Xz),
        [0x28, 0xB5, 0x2F, 0xFD, ..] => Some(Filter::Zstd),
        [0x5D, 0x00, 0x00, ..] => Some(Filter::Lzma),
        _ => None,
    }
}

/// Detect a container format from the first bytes of a decoded stream
pub fn detect_format(data: &[u8]) -> Option<ArchiveFormat> {
    match data {
        [] => Some(ArchiveFormat::Empty),
        [0x50, 0x4B, 0x03, 0x04, ..]
        | [0x50, 0x4B, 0x05, 0x06, ..]
        | [0x50, 0x4B, 0x07, 0x08, ..] => Some(ArchiveFormat::Zip),
        [0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C, ..] => Some(ArchiveFormat::SevenZip),
        [b'R', b'a', b'r', b'!', 0x1A, 0x07, ..] => Some(ArchiveFormat::Rar),
        _ => {
            if is_tar_header(data) {
                Some(ArchiveFormat::Tar)
            } else {
                None
            }
        }
    }
}

fn is_tar_header(data: &[u8]) -> bool {
    if data.len() < TAR_BLOCK {
        return false;
    }
    let block = &data[..TAR_BLOCK];
    if block[257..262] == *b"ustar" {
        return true;
    }
    // end-of-archive marker: an empty tar is nothing but zero blocks
    if block.iter().all(|&b| b == 0) {
        return true;
    }
    has_valid_checksum(block)
}

/// Pre-POSIX (v7) headers carry no magic, only the checksum field
fn has_valid_checksum(block: &[u8]) -> bool {
    let Some(recorded) = parse_octal(&block[148..156]) else {
        return false;
    };
    let computed: u64 = block
        .iter()
        .enumerate()
        .map(|(i, &b)| if (148..156).contains(&i) { b' ' as u64 } else { b as u64 })
        .sum();
    recorded == computed
}

fn parse_octal(field: &[u8]) -> Option<u64> {
    let digits: Vec<u8> = field
        .iter()
        .copied()
        .skip_while(|&b| b == b' ')
        .take_while(|&b| (b'0'..=b'7').contains(&b))
        .collect();
    if digits.is_empty() {
        return None;
    }
    let text = std::str::from_utf8(&digits).ok()?;
    u64::from_str_radix(text, 8).ok()
}
