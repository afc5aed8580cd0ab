//! # PNG/ZIP Polyglot Builder
//!
//! This library builds files that are valid PNG images and valid ZIP archives
//! at the same time, with a small dual-platform extraction script hidden in an
//! `iCCP` chunk so the image can later be "executed" to unpack itself.
//!
//! The core concept is embedding the ZIP archive as the last `IDAT` chunk of a
//! pruned cover image, then rewriting every absolute offset in the archive's
//! central directory so ZIP readers still find each entry.

use std::path::PathBuf;

// Public API exports
pub mod cli;
pub mod png;
pub mod zip;
pub mod script;
pub mod polyglot;
pub mod utils;
pub mod extract;

#[cfg(test)]
pub(crate) mod test_support;

pub use polyglot::{PolyglotCreator, RunContext, assemble};
pub use script::{ArgumentPrompt, PresetArguments, StdinPrompt, FileCategory};
pub use extract::{ValidationResult, validate_polyglot, extract_archive};

/// Largest polyglot this tool will produce (200 MiB).
pub const MAX_FILE_SIZE: usize = 209_715_200;

/// Result type alias for polyglot operations
pub type PolyglotResult<T> = Result<T, PolyglotError>;

/// Comprehensive error type for the polyglot tool
#[derive(Debug, thiserror::Error)]
pub enum PolyglotError {
    #[error("Read File Error: Unable to open {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File Size Error: {0}")]
    SizeLimit(String),

    #[error("Image File Error: {0}")]
    ImageFormat(String),

    #[error("Image File Error: {0}")]
    UnsupportedImage(String),

    #[error("ZIP File Error: {0}")]
    ZipFormat(String),

    #[error("File Size Error: {0}")]
    ScriptSize(String),

    #[error("Invalid Input Error: {0}")]
    InvalidInput(String),

    #[error("field at index {index} does not fit in a {len}-byte buffer")]
    FieldOutOfBounds { index: usize, len: usize },

    #[error("value {value:#x} does not fit in a {bits}-bit field")]
    FieldOverflow { value: u64, bits: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PolyglotError {
    /// Validate that a PNG chunk's stored CRC matches the computed value
    pub fn validate_png_chunk(chunk_type: &[u8], expected_crc: u32, actual_crc: u32)
        -> PolyglotResult<()> {
        if expected_crc != actual_crc {
            let chunk_str = String::from_utf8_lossy(chunk_type);
            Err(PolyglotError::ImageFormat(format!("CRC value for {chunk_str} chunk is invalid.")))
        } else {
            Ok(())
        }
    }
}
