use std::io::Read;

use ::tar::EntryType;

use super::{ArchiveFormat, ArchiveStream, EntryHeader, EntryKind, EntryVisitor, lossy};
use crate::error::{Error, Result};

/// Tar archive read sequentially through the filter chain
pub struct TarStream<R: Read> {
    archive: ::tar::Archive<R>,
}

impl<R: Read> TarStream<R> {
    /// Wrap an already decoded tar stream
    pub fn new(reader: R) -> Self {
        Self {
            archive: ::tar::Archive::new(reader),
        }
    }
}

fn entry_kind<R: Read>(entry: &::tar::Entry<'_, R>) -> EntryKind {
    let entry_type = entry.header().entry_type();
    match entry_type {
        EntryType::Regular | EntryType::Continuous | EntryType::GNUSparse => EntryKind::Regular,
        EntryType::Directory => EntryKind::Directory,
        EntryType::Symlink => match entry.link_name_bytes() {
            Some(target) => EntryKind::Symlink {
                target: lossy(&target),
            },
            None => EntryKind::Other,
        },
        EntryType::Link => match entry.link_name_bytes() {
            Some(target) => EntryKind::HardLink {
                target: lossy(&target),
            },
            None => EntryKind::Other,
        },
        _ => EntryKind::Other,
    }
}

impl<R: Read> ArchiveStream for TarStream<R> {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Tar
    }

    fn for_each_entry(&mut self, visit: &mut EntryVisitor<'_>) -> Result<()> {
        let entries = self
            .archive
            .entries()
            .map_err(|e| Error::read(format!("failed to read tar archive: {e}")))?;

        for entry in entries {
            let mut entry =
                entry.map_err(|e| Error::read(format!("failed to read tar header: {e}")))?;

            let header = EntryHeader {
                path: lossy(&entry.path_bytes()),
                declared_size: Some(entry.size()),
                kind: entry_kind(&entry),
            };
            visit(&header, &mut entry)?;
        }
        Ok(())
    }
}
