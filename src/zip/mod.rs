//! ZIP archive wrapping and offset repair

pub mod offsets;

use tracing::debug;
use crate::utils::{read_u16_le, write_value, ByteOrder, FieldWidth};
use crate::{PolyglotError, PolyglotResult};
pub use offsets::{fix_zip_offsets, EocdRecord, ZipRepair};

/// Local file header signature (PK\x03\x04)
pub const ZIP_LOCAL_SIG: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Shortest first entry name that can still carry an extension
pub const MIN_ENTRY_NAME_LEN: usize = 4;

// Offsets inside a local file header
const NAME_LENGTH_OFFSET: usize = 26;
const NAME_OFFSET: usize = 30;

// Chunk length and type fields ahead of the archive bytes
const ARCHIVE_START: usize = 8;

/// A ZIP archive wrapped as a PNG `IDAT` chunk.
///
/// The CRC field is left zeroed until the chunk sits at its final position
/// and its offsets have been repaired.
#[derive(Debug, Clone)]
pub struct ArchiveChunk {
    bytes: Vec<u8>,
}

impl ArchiveChunk {
    /// Wrap `archive` and check that it looks like a usable ZIP file
    pub fn wrap(archive: &[u8]) -> PolyglotResult<Self> {
        let length = u32::try_from(archive.len()).map_err(|_| {
            PolyglotError::SizeLimit("ZIP file is too large to fit in a PNG chunk.".to_string())
        })?;

        let mut bytes = Vec::with_capacity(archive.len() + 12);
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(b"IDAT");
        bytes.extend_from_slice(archive);
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        write_value(&mut bytes, 0, length, FieldWidth::U32, ByteOrder::Big)?;

        let chunk = Self { bytes };
        chunk.validate()?;
        debug!(archive_len = archive.len(), "wrapped ZIP archive as IDAT chunk");
        Ok(chunk)
    }

    fn validate(&self) -> PolyglotResult<()> {
        let archive = self.archive();
        if archive.len() < NAME_OFFSET || archive[..4] != ZIP_LOCAL_SIG {
            return Err(PolyglotError::ZipFormat(
                "File does not appear to be a valid ZIP archive.".to_string(),
            ));
        }

        let name_len = read_u16_le(archive, NAME_LENGTH_OFFSET).unwrap_or_default() as usize;
        if name_len < MIN_ENTRY_NAME_LEN {
            return Err(PolyglotError::ZipFormat(
                "\n\nName length of first file within ZIP archive is too short.\
                 \nIncrease its length (minimum 4 characters) and make sure it has a valid extension."
                    .to_string(),
            ));
        }
        if archive.len() < NAME_OFFSET + name_len {
            return Err(PolyglotError::ZipFormat(
                "First file name runs past the end of the ZIP archive.".to_string(),
            ));
        }
        Ok(())
    }

    /// The wrapped ZIP bytes, without chunk fields
    pub fn archive(&self) -> &[u8] {
        &self.bytes[ARCHIVE_START..self.bytes.len() - 4]
    }

    /// Name of the first entry, as the raw bytes stored in the archive.
    /// Zip tools on Windows often store code page 437 names, so this is not
    /// necessarily UTF-8.
    pub fn first_entry_name(&self) -> &[u8] {
        let archive = self.archive();
        let name_len = read_u16_le(archive, NAME_LENGTH_OFFSET).unwrap_or_default() as usize;
        archive.get(NAME_OFFSET..NAME_OFFSET + name_len).unwrap_or_default()
    }

    /// Whole chunk, fields included
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
