//! Temporary staging of the input buffer
//!
//! Some decoders only read from a named file (rar) and raw decompression is
//! driven from a file as well. [`StagedInput`] writes the buffer to a uniquely
//! named temporary file and deletes it again when unstaged or dropped.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::ExtractConfig;
use crate::error::{Error, Result};

/// The input buffer written to a temporary file
#[derive(Debug)]
pub struct StagedInput {
    file: Option<NamedTempFile>,
    path: PathBuf,
}

impl StagedInput {
    /// Write `input` to a new temporary file
    ///
    /// The file is created in `config.staging_dir` (or the system temp dir)
    /// with `config.staging_prefix` as its name prefix. The contents are
    /// flushed before this returns.
    pub fn stage(input: &[u8], config: &ExtractConfig) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&config.staging_prefix);

        let created = match &config.staging_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        let mut file = created.map_err(|source| Error::Staging { source })?;

        file.write_all(input)
            .and_then(|()| file.flush())
            .map_err(|source| Error::Staging { source })?;

        let path = file.path().to_path_buf();
        debug!(?path, bytes = input.len(), "staged input");
        Ok(Self {
            file: Some(file),
            path,
        })
    }

    /// Location of the staged file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the staged file still exists
    pub fn is_staged(&self) -> bool {
        self.file.is_some()
    }

    /// Delete the staged file
    ///
    /// Calling this more than once is a no-op. A failed deletion is logged and
    /// otherwise ignored.
    pub fn unstage(&mut self) {
        if let Some(file) = self.file.take() {
            match file.close() {
                Ok(()) => debug!(path = ?self.path, "removed staged input"),
                Err(e) => warn!(path = ?self.path, error = %e, "failed to remove staged input"),
            }
        }
    }
}

impl Drop for StagedInput {
    fn drop(&mut self) {
        self.unstage();
    }
}
