use std::io::{self, Cursor, Read};

use tracing::debug;

use super::Filter;
use super::detect::{PROBE_LEN, detect_filter};
use crate::error::{Error, Result};

/// Most compression layers peeled off one input (e.g. `tar.gz.xz` is two)
pub const MAX_FILTER_CHAIN: usize = 4;

/// A boxed byte stream borrowing from the input buffer
pub type BoxRead<'a> = Box<dyn Read + 'a>;

/// Stream with its filters removed, plus the already-read decoded prefix
pub struct Peeled<'a> {
    /// Filters applied, outermost first
    pub filters: Vec<Filter>,
    /// First bytes of the decoded stream (up to [`PROBE_LEN`])
    pub prefix: Vec<u8>,
    /// Remainder of the decoded stream after `prefix`
    pub rest: BoxRead<'a>,
}

impl<'a> Peeled<'a> {
    /// Reassemble the whole decoded stream
    pub fn into_reader(self) -> BoxRead<'a> {
        Box::new(Cursor::new(self.prefix).chain(self.rest))
    }
}

impl Filter {
    /// Wrap `reader` in the decoder for this filter
    pub fn decoder<'a>(self, reader: BoxRead<'a>) -> Result<BoxRead<'a>> {
        match self {
            Filter::Gzip => Ok(Box::new(flate2::read::MultiGzDecoder::new(reader))),
            Filter::Bzip2 => Ok(Box::new(bzip2::read::MultiBzDecoder::new(reader))),
            Filter::Xz => Ok(Box::new(xz2::read::XzDecoder::new_multi_decoder(reader))),
            Filter::Lzma => {
                let stream = xz2::stream::Stream::new_lzma_decoder(u64::MAX)
                    .map_err(|e| Error::open(format!("failed to initialise lzma decoder: {e}")))?;
                Ok(Box::new(xz2::read::XzDecoder::new_stream(reader, stream)))
            }
            Filter::Zstd => {
                let decoder = zstd::stream::read::Decoder::new(reader)
                    .map_err(|e| Error::open(format!("failed to initialise zstd decoder: {e}")))?;
                Ok(Box::new(decoder))
            }
        }
    }

    /// Short lowercase name (e.g. "gzip")
    pub fn name(self) -> &'static str {
        match self {
            Filter::Gzip => "gzip",
            Filter::Bzip2 => "bzip2",
            Filter::Xz => "xz",
            Filter::Lzma => "lzma",
            Filter::Zstd => "zstd",
        }
    }
}

/// Read up to `len` bytes, stopping early only at end of stream
fn read_prefix(reader: &mut dyn Read, len: usize) -> io::Result<Vec<u8>> {
    let mut prefix = Vec::with_capacity(len);
    reader.take(len as u64).read_to_end(&mut prefix)?;
    Ok(prefix)
}

/// Detect and strip compression layers from `reader`
///
/// Decoder errors while probing a layer mean the input cannot be opened and
/// are reported as [`Error::Open`].
pub fn peel_filters(reader: BoxRead<'_>) -> Result<Peeled<'_>> {
    let mut filters = Vec::new();
    let mut reader = reader;
    loop {
        let prefix = read_prefix(&mut reader, PROBE_LEN).map_err(|e| match filters.last() {
            Some(filter) => {
                Error::open(format!("{} decompression failed: {e}", Filter::name(*filter)))
            }
            None => Error::open(format!("failed to read input: {e}")),
        })?;

        let next = match detect_filter(&prefix) {
            Some(filter) if filters.len() < MAX_FILTER_CHAIN => filter,
            _ => {
                debug!(?filters, prefix_len = prefix.len(), "compression filters resolved");
                return Ok(Peeled {
                    filters,
                    prefix,
                    rest: reader,
                });
            }
        };

        debug!(filter = next.name(), depth = filters.len(), "detected compression filter");
        let joined: BoxRead<'_> = Box::new(Cursor::new(prefix).chain(reader));
        reader = next.decoder(joined)?;
        filters.push(next);
    }
}
