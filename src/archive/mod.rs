//! Archive stream service
//!
//! Opens a byte buffer (or a staged file) as an archive, auto-detects the
//! compression filters and the container format, and walks the entries in
//! archive order. Each format lives in its own submodule behind the
//! [`ArchiveStream`] trait:
//!
//! - `tar` - tar (ustar, GNU, pax, v7) through the filter chain
//! - `zip` - zip, read from an in-memory cursor
//! - `sevenz` - 7z, read from an in-memory cursor
//! - `rar` - rar, read from a staged temporary file (feature `rar`)
//! - `raw` - no container at all, one pseudo-entry

/// Magic-byte detection of filters and formats
pub mod detect;
/// Compression filter decoding
pub mod filter;
#[cfg(feature = "rar")]
mod rar;
mod raw;
mod sevenz;
mod tar;
mod zip;

#[cfg(feature = "rar")]
pub use self::rar::RarStream;
pub use self::raw::RawStream;
pub use self::sevenz::SevenZipStream;
pub use self::tar::TarStream;
pub use self::zip::ZipStream;

use std::io::{Cursor, Read};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ExtractConfig;
use crate::error::{Error, Result};
use filter::{BoxRead, peel_filters};

/// Unix file type bits (`S_IFMT`)
pub(crate) const S_IFMT: u32 = 0o170000;
/// Unix symlink file type (`S_IFLNK`)
pub(crate) const S_IFLNK: u32 = 0o120000;

/// Container format, see [`detect::detect_format`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    /// Tar archive
    Tar,
    /// ZIP archive
    Zip,
    /// 7-Zip archive
    SevenZip,
    /// RAR archive (v4 or v5)
    Rar,
    /// Zero bytes after decoding; an archive with no entries
    Empty,
    /// No container, the decoded stream is the single entry
    Raw,
}

/// Compression filter wrapped around a container or raw stream
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// gzip (possibly multi-member)
    Gzip,
    /// bzip2
    Bzip2,
    /// xz
    Xz,
    /// legacy lzma-alone
    Lzma,
    /// zstandard
    Zstd,
}

/// Entry type as reported by the decoder
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file with content
    Regular,
    /// Directory
    Directory,
    /// Symbolic link; `target` is relative to the link's own directory
    Symlink {
        /// Raw link target
        target: String,
    },
    /// Hard link; `target` is an archive path
    HardLink {
        /// Raw link target
        target: String,
    },
    /// Device nodes, fifos and anything else without file content
    Other,
}

/// Header of one archive entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryHeader {
    /// Archive path, lossily decoded as UTF-8
    pub path: String,
    /// Content size declared by the container (None when the stream has no
    /// length up front, as in raw mode)
    pub declared_size: Option<u64>,
    /// Entry type
    pub kind: EntryKind,
}

/// Visitor called once per entry with its header and a reader over its bytes
pub type EntryVisitor<'v> = dyn FnMut(&EntryHeader, &mut dyn Read) -> Result<()> + 'v;

/// An opened archive
///
/// Dropping the stream closes it and releases any staged resources.
pub trait ArchiveStream {
    /// Detected container format
    fn format(&self) -> ArchiveFormat;

    /// Walk every entry in archive order
    ///
    /// The visitor may leave an entry's bytes unread. An error from the
    /// visitor stops the walk and is returned unchanged; a decoder error while
    /// moving to the next header is returned as [`Error::Read`].
    fn for_each_entry(&mut self, visit: &mut EntryVisitor<'_>) -> Result<()>;
}

/// Archive with no entries
struct EmptyStream;

impl ArchiveStream for EmptyStream {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Empty
    }

    fn for_each_entry(&mut self, _visit: &mut EntryVisitor<'_>) -> Result<()> {
        Ok(())
    }
}

/// Open `input` as an archive with every filter and format enabled
pub fn open_archive<'a>(
    input: &'a [u8],
    config: &ExtractConfig,
) -> Result<Box<dyn ArchiveStream + 'a>> {
    let peeled = peel_filters(Box::new(Cursor::new(input)))?;
    let format = detect::detect_format(&peeled.prefix)
        .ok_or_else(|| Error::open("Unrecognized archive format"))?;

    debug!(
        ?format,
        filters = ?peeled.filters,
        input_len = input.len(),
        "opening archive"
    );

    let unfiltered = peeled.filters.is_empty();
    match format {
        ArchiveFormat::Empty => Ok(Box::new(EmptyStream)),
        ArchiveFormat::Tar => Ok(Box::new(TarStream::new(peeled.into_reader()))),
        ArchiveFormat::Zip => {
            if unfiltered {
                Ok(Box::new(ZipStream::new(Cursor::new(input), config)?))
            } else {
                let decoded = decode_all(peeled.into_reader())?;
                Ok(Box::new(ZipStream::new(Cursor::new(decoded), config)?))
            }
        }
        ArchiveFormat::SevenZip => {
            if unfiltered {
                Ok(Box::new(SevenZipStream::new(
                    Cursor::new(input),
                    input.len() as u64,
                    config,
                )?))
            } else {
                let decoded = decode_all(peeled.into_reader())?;
                let len = decoded.len() as u64;
                Ok(Box::new(SevenZipStream::new(Cursor::new(decoded), len, config)?))
            }
        }
        #[cfg(feature = "rar")]
        ArchiveFormat::Rar => {
            if unfiltered {
                Ok(Box::new(RarStream::open(input, config)?))
            } else {
                let decoded = decode_all(peeled.into_reader())?;
                Ok(Box::new(RarStream::open(&decoded, config)?))
            }
        }
        #[cfg(not(feature = "rar"))]
        ArchiveFormat::Rar => Err(Error::open("RAR support is not enabled in this build")),
        ArchiveFormat::Raw => Err(Error::open("Unrecognized archive format")),
    }
}

/// Fully decode a filtered stream for formats that need random access
fn decode_all(mut reader: BoxRead<'_>) -> Result<Vec<u8>> {
    let mut decoded = Vec::new();
    reader
        .read_to_end(&mut decoded)
        .map_err(|e| Error::open(format!("decompression failed: {e}")))?;
    Ok(decoded)
}

/// Lossy UTF-8 for names and link targets
pub(crate) fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
