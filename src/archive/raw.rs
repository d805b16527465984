use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use super::filter::{Peeled, peel_filters};
use super::{ArchiveFormat, ArchiveStream, EntryHeader, EntryKind, EntryVisitor};
use crate::error::{Error, Result};

/// A bare (optionally compressed) stream exposed as one pseudo-entry
///
/// Only filter detection runs; no container format is parsed. Input without
/// any recognised filter passes through unchanged.
pub struct RawStream {
    entry_name: String,
    peeled: Option<Peeled<'static>>,
}

impl RawStream {
    /// Open the staged file at `path` and peel its compression filters
    pub fn open(path: &Path, entry_name: &str) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| Error::open(format!("failed to open staged input: {e}")))?;
        let peeled = peel_filters(Box::new(BufReader::new(file)))?;
        debug!(filters = ?peeled.filters, "opened raw stream");
        Ok(Self {
            entry_name: entry_name.to_string(),
            peeled: Some(peeled),
        })
    }
}

impl ArchiveStream for RawStream {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Raw
    }

    fn for_each_entry(&mut self, visit: &mut EntryVisitor<'_>) -> Result<()> {
        // the single entry can only be walked once
        let Some(peeled) = self.peeled.take() else {
            return Ok(());
        };
        let header = EntryHeader {
            path: self.entry_name.clone(),
            declared_size: None,
            kind: EntryKind::Regular,
        };
        let mut reader = peeled.into_reader();
        visit(&header, &mut reader)
    }
}
