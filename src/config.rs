//! Configuration types for memunpack

use crate::error::{Error, Result};
use crate::table::FileTable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the input buffer is interpreted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMode {
    /// Container archive (tar, zip, 7z, rar), optionally compressed (default)
    #[default]
    Structured,
    /// A single compressed stream with no container; yields one entry
    RawDecompression,
}

impl ExtractMode {
    /// Mode selected by a plain `decompression_only` flag
    pub fn from_decompression_only(decompression_only: bool) -> Self {
        if decompression_only {
            ExtractMode::RawDecompression
        } else {
            ExtractMode::Structured
        }
    }
}

/// Extraction configuration
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Structured or raw-decompression mode
    #[serde(default)]
    pub mode: ExtractMode,

    /// Entry slots reserved before the first entry is read (default: 100)
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,

    /// Chunk size used by raw decompression reads (default: 64 KiB)
    #[serde(default = "default_transfer_buffer_size")]
    pub transfer_buffer_size: usize,

    /// Name given to the single entry produced in raw mode (default: "data")
    ///
    /// A bare compressed stream carries no file name of its own.
    #[serde(default = "default_raw_entry_name")]
    pub raw_entry_name: String,

    /// Password for encrypted zip, 7z and rar archives
    #[serde(default)]
    pub password: Option<String>,

    /// Directory for staged temporary files (None = system temp dir)
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    /// File name prefix for staged temporary files (default: "decompression")
    #[serde(default = "default_staging_prefix")]
    pub staging_prefix: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            mode: ExtractMode::default(),
            initial_capacity: default_initial_capacity(),
            transfer_buffer_size: default_transfer_buffer_size(),
            raw_entry_name: default_raw_entry_name(),
            password: None,
            staging_dir: None,
            staging_prefix: default_staging_prefix(),
        }
    }
}

impl ExtractConfig {
    /// Default config for the given mode
    pub fn for_mode(mode: ExtractMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Check that every setting is usable
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(Error::config(
                "initial_capacity must be greater than zero",
                "initial_capacity",
            ));
        }
        if self.transfer_buffer_size == 0 {
            return Err(Error::config(
                "transfer_buffer_size must be greater than zero",
                "transfer_buffer_size",
            ));
        }
        if self.raw_entry_name.is_empty() {
            return Err(Error::config(
                "raw_entry_name must not be empty",
                "raw_entry_name",
            ));
        }
        Ok(())
    }

    pub(crate) fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

fn default_initial_capacity() -> usize {
    FileTable::INITIAL_CAPACITY
}

fn default_transfer_buffer_size() -> usize {
    64 * 1024
}

fn default_raw_entry_name() -> String {
    "data".to_string()
}

fn default_staging_prefix() -> String {
    "decompression".to_string()
}
