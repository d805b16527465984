use std::io::{Read, Seek};

use tracing::debug;

use super::{
    ArchiveFormat, ArchiveStream, EntryHeader, EntryKind, EntryVisitor, S_IFLNK, S_IFMT, lossy,
};
use crate::config::ExtractConfig;
use crate::error::{Error, Result};

/// ZIP archive over a seekable in-memory reader
pub struct ZipStream<R: Read + Seek> {
    archive: ::zip::ZipArchive<R>,
    password: Option<String>,
}

impl<R: Read + Seek> ZipStream<R> {
    /// Parse the central directory
    pub fn new(reader: R, config: &ExtractConfig) -> Result<Self> {
        let archive = ::zip::ZipArchive::new(reader)
            .map_err(|e| Error::open(format!("failed to read ZIP archive: {e}")))?;
        debug!(entries = archive.len(), "opened ZIP archive");
        Ok(Self {
            archive,
            password: config.password().map(str::to_string),
        })
    }
}

/// Open a ZIP entry by index, decrypting it if a password is configured
fn open_zip_entry<'a, R: Read + Seek>(
    archive: &'a mut ::zip::ZipArchive<R>,
    index: usize,
    password: Option<&str>,
) -> Result<::zip::read::ZipFile<'a>> {
    match password {
        None => archive
            .by_index(index)
            .map_err(|e| Error::read(format!("failed to read ZIP entry {index}: {e}"))),
        Some(password) => archive
            .by_index_decrypt(index, password.as_bytes())
            .map_err(|e| Error::read(format!("failed to read ZIP entry {index}: {e}")))?
            .map_err(|_| Error::read(format!("wrong password for ZIP entry {index}"))),
    }
}

impl<R: Read + Seek> ArchiveStream for ZipStream<R> {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Zip
    }

    fn for_each_entry(&mut self, visit: &mut EntryVisitor<'_>) -> Result<()> {
        let password = self.password.as_deref();
        for index in 0..self.archive.len() {
            let mut file = open_zip_entry(&mut self.archive, index, password)?;
            let path = file.name().to_string();

            let is_symlink = file
                .unix_mode()
                .is_some_and(|mode| mode & S_IFMT == S_IFLNK);

            let kind = if file.is_dir() {
                EntryKind::Directory
            } else if is_symlink {
                // the link target is stored as the entry's content
                let mut target = Vec::new();
                file.read_to_end(&mut target).map_err(|e| {
                    Error::read(format!("failed to read ZIP symlink '{path}': {e}"))
                })?;
                EntryKind::Symlink {
                    target: lossy(&target),
                }
            } else {
                EntryKind::Regular
            };

            let header = EntryHeader {
                path,
                declared_size: Some(file.size()),
                kind,
            };
            visit(&header, &mut file)?;
        }
        Ok(())
    }
}
