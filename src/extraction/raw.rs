use tracing::info;

use super::read_unsized;
use crate::archive::{ArchiveStream, RawStream};
use crate::config::ExtractConfig;
use crate::error::{ExtractResult, Failure, Result};
use crate::staging::StagedInput;
use crate::table::{FileEntry, FileTable};

/// Decompress a bare stream into a single entry
///
/// The input is staged to a temporary file for the duration of the call and
/// removed again before returning, whatever the outcome.
pub fn extract_raw(input: &[u8], config: &ExtractConfig) -> ExtractResult {
    let mut staged = match StagedInput::stage(input, config) {
        Ok(staged) => staged,
        Err(e) => return Err(Failure::new(e, FileTable::new())),
    };

    let result = run_raw(
        || {
            let stream = RawStream::open(staged.path(), &config.raw_entry_name)?;
            Ok(Box::new(stream) as Box<dyn ArchiveStream>)
        },
        config,
    );

    staged.unstage();
    result
}

/// The raw flow over an arbitrary stream opener
pub(crate) fn run_raw<'a, F>(open: F, config: &ExtractConfig) -> ExtractResult
where
    F: FnOnce() -> Result<Box<dyn ArchiveStream + 'a>>,
{
    let mut table = match FileTable::with_capacity(1) {
        Ok(table) => table,
        Err(e) => return Err(Failure::new(e, FileTable::new())),
    };

    let mut stream = match open() {
        Ok(stream) => stream,
        Err(e) => return Err(Failure::new(e, table)),
    };

    let chunk = config.transfer_buffer_size;
    let walked = stream.for_each_entry(&mut |header, reader| {
        let data = read_unsized(reader, chunk, &header.path)?;
        table.push(FileEntry::new(header.path.clone(), data))?;
        Ok(())
    });
    drop(stream);

    if let Err(e) = walked {
        return Err(Failure::new(e, table));
    }

    info!(
        decompressed_bytes = table.iter().map(|e| e.size()).sum::<usize>(),
        "raw decompression complete"
    );
    Ok(table)
}
