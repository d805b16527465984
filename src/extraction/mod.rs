//! Extraction orchestration
//!
//! Two flows produce a [`FileTable`](crate::FileTable):
//!
//! - structured: one pass for regular files, then (only if links were seen) a
//!   second pass over a freshly opened stream that collects and resolves links
//! - raw: the input is staged, its compression filters are peeled and the
//!   decoded bytes become a single entry
//!
//! Both flows take the stream opener as a parameter so the state machine can
//! be driven by any [`ArchiveStream`](crate::archive::ArchiveStream).

mod raw;
mod structured;


pub use raw::extract_raw;
pub use structured::extract_structured;

use std::io::Read;

use crate::error::{Error, Result};

/// Read an entry of unknown length in `chunk`-sized reads
///
/// The buffer grows fallibly; a zero-length read ends the entry.
pub(crate) fn read_unsized(
    reader: &mut dyn Read,
    chunk: usize,
    name: &str,
) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(chunk)
        .map_err(|_| Error::Allocation("memory allocation error for transfer buffer"))?;
    buffer.resize(chunk, 0u8);

    let mut data = Vec::new();
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => return Ok(data),
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::read(format!("failed to read '{name}': {e}"))),
        };
        data.try_reserve(n)
            .map_err(|_| Error::Allocation("memory allocation error"))?;
        data.extend_from_slice(&buffer[..n]);
    }
}
