//! Polyglot validation and extraction functionality

use std::io::Cursor;
use std::ops::Range;
use tracing::debug;
use crate::png::parser::{chunk_at, parse_png_chunks, CHUNK_FIELDS_LEN};
use crate::utils::{is_png_signature, read_u16_le, read_u32_le};
use crate::zip::offsets::{find_eocd, EocdRecord, START_CENTRAL_DIR_SIG};
use crate::zip::ZIP_LOCAL_SIG;
use crate::{PolyglotError, PolyglotResult};

/// Validation result for polyglot files
#[derive(Debug, PartialEq)]
pub enum ValidationResult {
    /// File is a valid PNG/ZIP polyglot
    Valid,
    /// Invalid PNG with error message
    InvalidPng(String),
    /// Invalid ZIP with error message
    InvalidZip(String),
    /// Both PNG and ZIP are invalid
    InvalidBoth(String, String),
}

// Central directory entry layout
const CENTRAL_HEADER_LEN: usize = 46;
const CENTRAL_NAME_LEN: usize = 28;
const CENTRAL_EXTRA_LEN: usize = 30;
const CENTRAL_COMMENT_LEN: usize = 32;
const CENTRAL_LOCAL_OFFSET: usize = 42;

/// Payload range of the final `IDAT` chunk, which holds the archive
pub fn locate_archive_chunk(data: &[u8]) -> PolyglotResult<Range<usize>> {
    if !is_png_signature(data) {
        return Err(PolyglotError::ImageFormat("Invalid PNG signature".to_string()));
    }

    let mut offset = 8;
    let mut last_idat = None;
    while offset + CHUNK_FIELDS_LEN <= data.len() {
        let chunk = chunk_at(data, offset)?;
        if &chunk.chunk_type == b"IDAT" {
            last_idat = Some(offset + 8..offset + 8 + chunk.data.len());
        }
        if &chunk.chunk_type == b"IEND" {
            break;
        }
        offset = chunk.end();
    }

    let range = last_idat.ok_or_else(|| PolyglotError::ImageFormat("No IDAT chunk found.".to_string()))?;
    if data.get(range.start..range.start + 4) != Some(ZIP_LOCAL_SIG.as_slice()) {
        return Err(PolyglotError::ZipFormat("No ZIP archive found in the final IDAT chunk.".to_string()));
    }
    Ok(range)
}

/// Copy of the archive embedded in a polyglot.
///
/// The copy keeps the absolute offsets written during assembly, so it is
/// byte-for-byte what sits inside the image.
pub fn extract_archive(data: &[u8]) -> PolyglotResult<Vec<u8>> {
    let range = locate_archive_chunk(data)?;
    debug!(start = range.start, len = range.len(), "extracted embedded archive");
    Ok(data[range].to_vec())
}

/// Check that every central directory entry points at a local file header.
/// Returns the number of entries checked.
pub fn verify_local_header_offsets(data: &[u8]) -> PolyglotResult<usize> {
    let eocd_index = find_eocd(data)
        .ok_or_else(|| PolyglotError::ZipFormat("End of Central Directory signature not found.".to_string()))?;
    let eocd = EocdRecord::read(data, eocd_index)
        .ok_or_else(|| PolyglotError::ZipFormat("End of Central Directory record is truncated.".to_string()))?;

    let mut cursor = eocd.cd_offset as usize;
    for entry in 1..=usize::from(eocd.num_entries_total) {
        if data.get(cursor..cursor + 4) != Some(START_CENTRAL_DIR_SIG.as_slice()) {
            return Err(PolyglotError::ZipFormat(format!(
                "Central directory entry {entry} is not at index {cursor}."
            )));
        }
        let field = |at: usize| read_u16_le(data, cursor + at).map(usize::from);
        let (Some(name), Some(extra), Some(comment), Some(local)) = (
            field(CENTRAL_NAME_LEN),
            field(CENTRAL_EXTRA_LEN),
            field(CENTRAL_COMMENT_LEN),
            read_u32_le(data, cursor + CENTRAL_LOCAL_OFFSET),
        ) else {
            return Err(PolyglotError::ZipFormat(format!("Central directory entry {entry} is truncated.")));
        };

        let local = local as usize;
        if data.get(local..local + 4) != Some(ZIP_LOCAL_SIG.as_slice()) {
            return Err(PolyglotError::ZipFormat(format!(
                "Central directory entry {entry} points to index {local}, which is not a local file header."
            )));
        }
        cursor += CENTRAL_HEADER_LEN + name + extra + comment;
    }
    Ok(usize::from(eocd.num_entries_total))
}

/// Entry names, in central directory order, as a ZIP reader sees them
pub fn list_archive_entries(data: &[u8]) -> PolyglotResult<Vec<String>> {
    let mut archive = ::zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| PolyglotError::ZipFormat(format!("Unable to read archive: {e}")))?;

    let mut names = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let file = archive
            .by_index(index)
            .map_err(|e| PolyglotError::ZipFormat(format!("Unable to read entry {index}: {e}")))?;
        names.push(file.name().to_string());
    }
    Ok(names)
}

/// Validate that a buffer is a valid PNG/ZIP polyglot
pub fn validate_polyglot(data: &[u8]) -> ValidationResult {
    let png_result = validate_as_png(data);
    let zip_result = validate_as_zip(data);

    match (png_result, zip_result) {
        (Ok(()), Ok(())) => ValidationResult::Valid,
        (Err(png_err), Ok(())) => ValidationResult::InvalidPng(png_err.to_string()),
        (Ok(()), Err(zip_err)) => ValidationResult::InvalidZip(zip_err.to_string()),
        (Err(png_err), Err(zip_err)) => ValidationResult::InvalidBoth(png_err.to_string(), zip_err.to_string()),
    }
}

/// Walk every chunk, checking CRCs, and require IEND at the very end
fn validate_as_png(data: &[u8]) -> PolyglotResult<()> {
    let chunks = parse_png_chunks(data)?;
    match chunks.last() {
        Some(last) if &last.chunk_type == b"IEND" && last.end() == data.len() => Ok(()),
        _ => Err(PolyglotError::ImageFormat("PNG does not end with an IEND chunk.".to_string())),
    }
}

fn validate_as_zip(data: &[u8]) -> PolyglotResult<()> {
    locate_archive_chunk(data)?;
    verify_local_header_offsets(data)?;
    list_archive_entries(data)?;
    Ok(())
}
