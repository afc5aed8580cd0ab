//! Low-level PNG chunk parsing using manual byte slicing

use crate::utils::{calculate_crc32, find_signature, read_u32_be};
use crate::{PolyglotError, PolyglotResult};

/// Length, type and CRC fields together
pub const CHUNK_FIELDS_LEN: usize = 12;

/// Borrowed view of one PNG chunk inside a larger buffer
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    /// Index of the length field
    pub offset: usize,
    pub chunk_type: [u8; 4],
    pub data: &'a [u8],
    pub crc: u32,
}

impl<'a> Chunk<'a> {
    /// Total bytes the chunk occupies, fields included
    pub fn span(&self) -> usize {
        self.data.len() + CHUNK_FIELDS_LEN
    }

    /// Index just past the CRC field
    pub fn end(&self) -> usize {
        self.offset + self.span()
    }

    /// CRC computed over type + payload
    pub fn computed_crc(&self) -> u32 {
        let mut crc_data = Vec::with_capacity(4 + self.data.len());
        crc_data.extend_from_slice(&self.chunk_type);
        crc_data.extend_from_slice(self.data);
        calculate_crc32(&crc_data)
    }

    pub fn has_valid_crc(&self) -> bool {
        self.crc == self.computed_crc()
    }

    pub fn type_str(&self) -> String {
        String::from_utf8_lossy(&self.chunk_type).to_string()
    }
}

/// Read the chunk whose length field starts at `offset`
pub fn chunk_at(data: &[u8], offset: usize) -> PolyglotResult<Chunk<'_>> {
    let truncated = || PolyglotError::ImageFormat(format!("Chunk at index {offset} extends beyond file."));

    let length = read_u32_be(data, offset).ok_or_else(truncated)? as usize;
    let type_bytes = data.get(offset + 4..offset + 8).ok_or_else(truncated)?;
    let chunk_type = [type_bytes[0], type_bytes[1], type_bytes[2], type_bytes[3]];

    let data_start = offset + 8;
    let data_end = data_start.checked_add(length).ok_or_else(truncated)?;
    let payload = data.get(data_start..data_end).ok_or_else(truncated)?;
    let crc = read_u32_be(data, data_end).ok_or_else(truncated)?;

    Ok(Chunk { offset, chunk_type, data: payload, crc })
}

/// Search for a chunk by its type tag, starting at `from`.
///
/// The tag is matched as raw bytes, so the cursor must already be past any
/// payload that could contain the same four bytes.
pub fn find_chunk<'a>(data: &'a [u8], tag: &[u8; 4], from: usize) -> PolyglotResult<Option<Chunk<'a>>> {
    match find_signature(data, tag, from) {
        Some(tag_index) if tag_index >= 4 => chunk_at(data, tag_index - 4).map(Some),
        Some(_) | None => Ok(None),
    }
}

/// Parse PNG chunks from byte data, verifying every CRC
pub fn parse_png_chunks(data: &[u8]) -> PolyglotResult<Vec<Chunk<'_>>> {
    if !crate::utils::is_png_signature(data) {
        return Err(PolyglotError::ImageFormat("Invalid PNG signature".to_string()));
    }

    let mut offset = 8; // Skip PNG signature
    let mut chunks = Vec::new();

    while offset + CHUNK_FIELDS_LEN <= data.len() {
        let chunk = chunk_at(data, offset)?;
        PolyglotError::validate_png_chunk(&chunk.chunk_type, chunk.crc, chunk.computed_crc())?;

        offset = chunk.end();
        let is_end = &chunk.chunk_type == b"IEND";
        chunks.push(chunk);

        // IEND indicates end of PNG chunks
        if is_end {
            break;
        }
    }

    if chunks.is_empty() {
        return Err(PolyglotError::ImageFormat("No chunks found".to_string()));
    }

    Ok(chunks)
}
