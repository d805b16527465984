//! # memunpack
//!
//! Extract archives held in memory into an in-memory table of files.
//!
//! ## Design Philosophy
//!
//! memunpack is designed to be:
//! - **Filesystem-free** - Input is a byte buffer, output is a `(name, bytes)` table
//! - **Auto-detecting** - tar, zip, 7z and rar, optionally wrapped in gzip, bzip2,
//!   xz, lzma or zstd, are recognised from their magic bytes
//! - **Link-flattening** - Symlinks and hard links become copies of the file
//!   they point at
//! - **Explicit about partial results** - A failure says what went wrong and hands
//!   back whatever was safely recovered
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let archive = std::fs::read("bundle.tar.gz")?;
//!
//!     match memunpack::extract(&archive, false) {
//!         Ok(table) => {
//!             for entry in &table {
//!                 println!("{} ({} bytes)", entry.name(), entry.size());
//!             }
//!         }
//!         Err(failure) => {
//!             eprintln!("extraction failed: {failure}");
//!             eprintln!("recovered {} entries", failure.partial().len());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Raw mode treats the input as one compressed stream without a container:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let compressed = std::fs::read("dump.sql.xz")?;
//! let table = memunpack::extract(&compressed, true)?;
//! assert_eq!(table.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Archive stream service: filter and format detection, per-format readers
pub mod archive;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Structured and raw extraction
pub mod extraction;
/// Temporary staging of input buffers
pub mod staging;
/// Symlink and hard link resolution
pub mod symlink;
/// Growable in-memory file table
pub mod table;

// Re-export commonly used types
pub use archive::{ArchiveFormat, Filter};
pub use config::{ExtractConfig, ExtractMode};
pub use error::{Error, ErrorDetail, ErrorKind, ExtractResult, Failure, Result};
pub use extraction::{extract_raw, extract_structured};
pub use table::{FileEntry, FileTable};

use tracing::debug;

/// Extract `input` with default settings
///
/// With `decompression_only` set the input is decompressed as a single
/// stream and the result holds exactly one entry. Otherwise it is read as a
/// container archive.
pub fn extract(input: &[u8], decompression_only: bool) -> ExtractResult {
    let config = ExtractConfig::for_mode(ExtractMode::from_decompression_only(decompression_only));
    extract_with_config(input, &config)
}

/// Extract `input` with an explicit configuration
///
/// The configuration is validated before any work starts; an invalid one
/// fails with [`ErrorKind::ConfigInvalid`] and an empty table.
pub fn extract_with_config(input: &[u8], config: &ExtractConfig) -> ExtractResult {
    if let Err(e) = config.validate() {
        return Err(Failure::new(e, FileTable::new()));
    }

    debug!(mode = ?config.mode, input_len = input.len(), "starting extraction");
    match config.mode {
        ExtractMode::Structured => extract_structured(input, config),
        ExtractMode::RawDecompression => extract_raw(input, config),
    }
}

/// Run [`extract_with_config`] on tokio's blocking thread pool
///
/// If the background task panics or is cancelled the result is a failure of
/// kind [`ErrorKind::Other`].
///
/// # Example
///
/// ```no_run
/// use memunpack::{ExtractConfig, extract_async};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let archive = std::fs::read("bundle.zip")?;
///     let table = extract_async(archive, ExtractConfig::default()).await?;
///     println!("extracted {} files", table.len());
///     Ok(())
/// }
/// ```
pub async fn extract_async(input: Vec<u8>, config: ExtractConfig) -> ExtractResult {
    match tokio::task::spawn_blocking(move || extract_with_config(&input, &config)).await {
        Ok(result) => result,
        Err(e) => Err(Failure::new(
            Error::Other(format!("extraction task failed: {e}")),
            FileTable::new(),
        )),
    }
}

/// Release a result and everything it owns
///
/// Works the same for a success and for a failure with a partial table.
/// Dropping the result has the same effect.
pub fn release(result: ExtractResult) {
    match result {
        Ok(table) => table.release(),
        Err(failure) => failure.release(),
    }
}
