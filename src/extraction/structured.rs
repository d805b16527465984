use std::io::Read;

use tracing::{debug, info};

use super::read_unsized;
use crate::archive::{self, ArchiveStream, EntryHeader, EntryKind};
use crate::config::ExtractConfig;
use crate::error::{Error, ExtractResult, Failure, Result};
use crate::symlink::{SymlinkRecord, append_resolved_links};
use crate::table::{FileEntry, FileTable};

const CONTENTS_ALLOCATION: &str = "memory allocation error for file contents";

/// Extract every regular file of a container archive, then its links
///
/// Failures follow one rule: an allocation failure returns the entries
/// appended so far, any other failure returns an empty table.
pub fn extract_structured(input: &[u8], config: &ExtractConfig) -> ExtractResult {
    run_structured(|| archive::open_archive(input, config), config)
}

/// The structured state machine over an arbitrary stream opener
///
/// `open` is called once per pass. The first stream is dropped before the
/// second one is opened.
pub(crate) fn run_structured<'a, F>(mut open: F, config: &ExtractConfig) -> ExtractResult
where
    F: FnMut() -> Result<Box<dyn ArchiveStream + 'a>>,
{
    let mut table = match FileTable::with_capacity(config.initial_capacity) {
        Ok(table) => table,
        Err(e) => return Err(Failure::new(e, FileTable::new())),
    };

    let has_links = match read_regular_entries(&mut open, &mut table, config) {
        Ok(has_links) => has_links,
        Err(e) => return Err(Failure::new(e, table)),
    };
    let regular_count = table.len();

    let mut link_count = 0;
    let mut skipped_count = 0;
    if has_links {
        let records = match collect_links(&mut open) {
            Ok(records) => records,
            Err(e) => return Err(Failure::new(e, table)),
        };
        match append_resolved_links(&mut table, &records) {
            Ok(summary) => {
                link_count = summary.resolved;
                skipped_count = summary.skipped;
            }
            Err(e) => return Err(Failure::new(e, table)),
        }
    }

    info!(
        extracted_count = table.len(),
        regular_count, link_count, skipped_count, "structured extraction complete"
    );
    Ok(table)
}

/// First pass: append every regular entry, report whether any link was seen
fn read_regular_entries<'a, F>(
    open: &mut F,
    table: &mut FileTable,
    config: &ExtractConfig,
) -> Result<bool>
where
    F: FnMut() -> Result<Box<dyn ArchiveStream + 'a>>,
{
    let mut stream = open()?;
    debug!(format = ?stream.format(), "reading regular entries");

    let mut has_links = false;
    stream.for_each_entry(&mut |header, reader| {
        match header.kind {
            EntryKind::Regular => {
                let entry = read_entry(header, reader, config.transfer_buffer_size)?;
                table.push(entry)?;
            }
            EntryKind::Symlink { .. } | EntryKind::HardLink { .. } => has_links = true,
            EntryKind::Directory | EntryKind::Other => {}
        }
        Ok(())
    })?;

    Ok(has_links)
}

/// Second pass: gather a record for every link entry, in archive order
fn collect_links<'a, F>(open: &mut F) -> Result<Vec<SymlinkRecord>>
where
    F: FnMut() -> Result<Box<dyn ArchiveStream + 'a>>,
{
    let mut stream = open()?;
    debug!(format = ?stream.format(), "collecting links");

    let mut records = Vec::new();
    stream.for_each_entry(&mut |header, _reader| {
        if let Some(record) = SymlinkRecord::from_header(header) {
            records
                .try_reserve(1)
                .map_err(|_| Error::Allocation("memory allocation error for symlink data"))?;
            records.push(record);
        }
        Ok(())
    })?;

    debug!(links = records.len(), "collected links");
    Ok(records)
}

/// Read one regular entry in full
///
/// The buffer is sized from the declared length up front. An entry that ends
/// early is a read failure.
fn read_entry(header: &EntryHeader, reader: &mut dyn Read, chunk: usize) -> Result<FileEntry> {
    let Some(size) = header.declared_size else {
        let data = read_unsized(reader, chunk, &header.path)?;
        return Ok(FileEntry::new(header.path.clone(), data));
    };

    let len = usize::try_from(size).map_err(|_| Error::Allocation(CONTENTS_ALLOCATION))?;
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| Error::Allocation(CONTENTS_ALLOCATION))?;

    let read = (&mut *reader)
        .take(size)
        .read_to_end(&mut data)
        .map_err(|e| entry_read_error(&header.path, &e))?;
    if (read as u64) < size {
        return Err(Error::read(format!(
            "failed to read entry '{}': truncated after {read} of {size} bytes",
            header.path
        )));
    }

    // zip verifies the CRC only once the entry reader reports its end
    let mut probe = [0u8; 1];
    reader
        .read(&mut probe)
        .map_err(|e| entry_read_error(&header.path, &e))?;

    Ok(FileEntry::new(header.path.clone(), data))
}

fn entry_read_error(path: &str, e: &std::io::Error) -> Error {
    Error::read(format!("failed to read entry '{path}': {e}"))
}
