use std::io::{Read, Seek};

use sevenz_rust::{Password, SevenZArchiveEntry, SevenZReader};
use tracing::debug;

use super::{
    ArchiveFormat, ArchiveStream, EntryHeader, EntryKind, EntryVisitor, S_IFLNK, S_IFMT, lossy,
};
use crate::config::ExtractConfig;
use crate::error::{Error, Result};

/// Set in the attribute word when the high 16 bits carry a unix mode
const UNIX_EXTENSION: u32 = 0x8000;

/// 7z archive over a seekable in-memory reader
pub struct SevenZipStream<R: Read + Seek> {
    reader: SevenZReader<R>,
}

impl<R: Read + Seek> SevenZipStream<R> {
    /// Parse the archive headers
    pub fn new(reader: R, len: u64, config: &ExtractConfig) -> Result<Self> {
        let password = match config.password() {
            Some(password) => Password::from(password),
            None => Password::empty(),
        };
        let reader = SevenZReader::new(reader, len, password)
            .map_err(|e| Error::open(format!("failed to read 7z archive: {e}")))?;
        debug!(len, "opened 7z archive");
        Ok(Self { reader })
    }
}

fn is_symlink(entry: &SevenZArchiveEntry) -> bool {
    entry.has_windows_attributes
        && entry.windows_attributes & UNIX_EXTENSION != 0
        && (entry.windows_attributes >> 16) & S_IFMT == S_IFLNK
}

impl<R: Read + Seek> ArchiveStream for SevenZipStream<R> {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::SevenZip
    }

    fn for_each_entry(&mut self, visit: &mut EntryVisitor<'_>) -> Result<()> {
        // errors raised inside the callback have to cross sevenz_rust's own
        // error type; ours is parked here and returned afterwards
        let mut stopped: Option<Error> = None;

        let walked = self.reader.for_each_entries(|entry, reader| {
            let kind = if entry.is_directory() {
                EntryKind::Directory
            } else if is_symlink(entry) {
                let mut target = Vec::new();
                if let Err(e) = reader.read_to_end(&mut target) {
                    stopped = Some(Error::read(format!(
                        "failed to read 7z symlink '{}': {e}",
                        entry.name()
                    )));
                    return Err(sevenz_rust::Error::other("symlink target unreadable"));
                }
                EntryKind::Symlink {
                    target: lossy(&target),
                }
            } else {
                EntryKind::Regular
            };

            let header = EntryHeader {
                path: entry.name().to_string(),
                declared_size: Some(entry.size()),
                kind,
            };
            match visit(&header, reader) {
                Ok(()) => Ok(true),
                Err(e) => {
                    stopped = Some(e);
                    Err(sevenz_rust::Error::other("extraction stopped"))
                }
            }
        });

        if let Some(e) = stopped {
            return Err(e);
        }
        walked.map_err(|e| Error::read(format!("failed to read 7z archive: {e}")))
    }
}
