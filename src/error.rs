//! Error types for memunpack
//!
//! This module provides the error/partial-result contract of the library:
//! - [`Error`] classifies what went wrong (open, read, allocation, staging, ...)
//! - [`Failure`] pairs an error with whatever entries were recovered before it
//! - [`ErrorDetail`] is a serializable view for hosts that marshal results
//!   across a language or process boundary

use crate::table::FileTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for memunpack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of one top-level extraction call
///
/// `Ok` carries the complete file table, `Err` carries a [`Failure`] holding the
/// diagnostic and the table built so far. Dropping either half releases it.
pub type ExtractResult = std::result::Result<FileTable, Failure>;

/// Upper bound for [`Failure::bounded_message`], matching the fixed-size
/// diagnostic field of C hosts (255 bytes plus terminator)
pub const MAX_BOUNDED_MESSAGE: usize = 255;

/// Main error type for memunpack
#[derive(Debug, Error)]
pub enum Error {
    /// The input could not be opened as an archive (bad magic, unsupported
    /// format, corrupt container header)
    #[error("{message}")]
    Open {
        /// Diagnostic reported by the decoder
        message: String,
    },

    /// Decoding failed in the middle of the archive
    #[error("{message}")]
    Read {
        /// Diagnostic reported by the decoder
        message: String,
    },

    /// A buffer for the table, an entry, or link data could not be allocated
    #[error("{0}")]
    Allocation(&'static str),

    /// The input could not be staged to a temporary file
    #[error("failed to create temporary file: {source}")]
    Staging {
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "initial_capacity")
        key: Option<String>,
    },

    /// Other error (background task failure)
    #[error("{0}")]
    Other(String),
}

/// Error category, one per branch of the failure taxonomy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad or unsupported archive
    OpenFailure,
    /// Mid-archive decode error
    ReadFailure,
    /// Memory allocation failed
    AllocationFailure,
    /// Temporary file creation or write failed
    StagingFailure,
    /// Invalid configuration
    ConfigInvalid,
    /// Anything else
    Other,
}

impl ErrorKind {
    /// Machine-readable error code (e.g. "read_failure")
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::OpenFailure => "open_failure",
            ErrorKind::ReadFailure => "read_failure",
            ErrorKind::AllocationFailure => "allocation_failure",
            ErrorKind::StagingFailure => "staging_failure",
            ErrorKind::ConfigInvalid => "config_invalid",
            ErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub(crate) fn open(message: impl Into<String>) -> Self {
        Error::Open {
            message: message.into(),
        }
    }

    pub(crate) fn read(message: impl Into<String>) -> Self {
        Error::Read {
            message: message.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>, key: &str) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Open { .. } => ErrorKind::OpenFailure,
            Error::Read { .. } => ErrorKind::ReadFailure,
            Error::Allocation(_) => ErrorKind::AllocationFailure,
            Error::Staging { .. } => ErrorKind::StagingFailure,
            Error::Config { .. } => ErrorKind::ConfigInvalid,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Get the machine-readable error code
    pub fn error_code(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Whether entries appended before this error stay in the returned table
    ///
    /// Only allocation failures keep them. A read failure discards everything
    /// the call produced, so callers never see output from a corrupt stream.
    pub fn preserves_progress(&self) -> bool {
        matches!(self, Error::Allocation(_))
    }
}

/// The failure half of an [`ExtractResult`]
///
/// Carries the error and the partial table. The table only ever holds fully
/// read entries, so it is always safe to iterate; whether it holds anything
/// depends on [`Error::preserves_progress`].
#[derive(Debug)]
pub struct Failure {
    error: Error,
    partial: FileTable,
}

impl Failure {
    pub(crate) fn new(error: Error, mut partial: FileTable) -> Self {
        if !error.preserves_progress() {
            partial.discard();
        }
        Self { error, partial }
    }

    /// The error that ended extraction
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// Category of the error
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    /// Full diagnostic text
    pub fn message(&self) -> String {
        self.error.to_string()
    }

    /// Diagnostic text cut to at most [`MAX_BOUNDED_MESSAGE`] bytes on a
    /// character boundary
    pub fn bounded_message(&self) -> String {
        let mut message = self.message();
        if message.len() > MAX_BOUNDED_MESSAGE {
            let mut end = MAX_BOUNDED_MESSAGE;
            while !message.is_char_boundary(end) {
                end -= 1;
            }
            message.truncate(end);
        }
        message
    }

    /// Entries recovered before the failure
    pub fn partial(&self) -> &FileTable {
        &self.partial
    }

    /// Split into the error and the partial table
    pub fn into_parts(self) -> (Error, FileTable) {
        (self.error, self.partial)
    }

    /// Serializable description of the failure for host boundaries
    pub fn detail(&self) -> ErrorDetail {
        ErrorDetail {
            code: self.error.error_code().to_string(),
            message: self.bounded_message(),
            details: Some(serde_json::json!({
                "recovered_entries": self.partial.len(),
            })),
        }
    }

    /// Release the partial table and the diagnostic
    pub fn release(self) {
        drop(self);
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Detailed error information for host-facing responses
///
/// # Example JSON
///
/// ```json
/// {
///   "code": "read_failure",
///   "message": "failed to read entry 'a.txt': unexpected end of stream",
///   "details": { "recovered_entries": 0 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "open_failure", "read_failure")
    pub code: String,

    /// Human-readable error message, at most [`MAX_BOUNDED_MESSAGE`] bytes
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
