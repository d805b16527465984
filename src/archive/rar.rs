use std::io::Cursor;

use tracing::debug;

use super::{ArchiveFormat, ArchiveStream, EntryHeader, EntryKind, EntryVisitor};
use crate::config::ExtractConfig;
use crate::error::{Error, Result};
use crate::staging::StagedInput;

/// RAR archive read from a staged temporary file
///
/// unrar only opens archives by file name, so the input is written to a
/// staged file that lives exactly as long as the stream.
pub struct RarStream {
    staged: StagedInput,
    password: Option<String>,
}

impl RarStream {
    /// Stage `input` and check that unrar accepts it
    pub fn open(input: &[u8], config: &ExtractConfig) -> Result<Self> {
        let staged = StagedInput::stage(input, config)?;
        let stream = Self {
            staged,
            password: config.password().map(str::to_string),
        };
        // surface a bad archive as an open failure rather than mid-walk
        stream
            .archive()
            .open_for_processing()
            .map_err(|e| Error::open(format!("failed to open RAR archive: {e}")))?;
        debug!(path = ?stream.staged.path(), "opened RAR archive");
        Ok(stream)
    }

    fn archive(&self) -> unrar::Archive<'_> {
        match &self.password {
            Some(password) => {
                unrar::Archive::with_password(self.staged.path(), password.as_bytes())
            }
            None => unrar::Archive::new(self.staged.path()),
        }
    }
}

impl ArchiveStream for RarStream {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Rar
    }

    fn for_each_entry(&mut self, visit: &mut EntryVisitor<'_>) -> Result<()> {
        let mut at_header = self
            .archive()
            .open_for_processing()
            .map_err(|e| Error::read(format!("failed to read RAR archive: {e}")))?;

        loop {
            let at_file = match at_header.read_header() {
                Ok(Some(at_file)) => at_file,
                Ok(None) => return Ok(()),
                Err(e) => return Err(Error::read(format!("failed to read RAR header: {e}"))),
            };

            let entry = at_file.entry();
            let path = entry.filename.to_string_lossy().into_owned();
            let declared_size = entry.unpacked_size;

            if entry.is_directory() {
                let header = EntryHeader {
                    path,
                    declared_size: Some(0),
                    kind: EntryKind::Directory,
                };
                visit(&header, &mut std::io::empty())?;
                at_header = at_file
                    .skip()
                    .map_err(|e| Error::read(format!("failed to skip RAR directory: {e}")))?;
                continue;
            }

            let (data, next) = at_file
                .read()
                .map_err(|e| Error::read(format!("failed to read RAR entry '{path}': {e}")))?;
            let header = EntryHeader {
                path,
                declared_size: Some(declared_size),
                kind: EntryKind::Regular,
            };
            visit(&header, &mut Cursor::new(data))?;
            at_header = next;
        }
    }
}
