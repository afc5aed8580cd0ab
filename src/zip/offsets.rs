//! ZIP central directory offset repair after relocation into the PNG

use tracing::debug;
use crate::utils::{find_signature, read_u16_le, read_u32_le, write_value, ByteOrder, FieldWidth};
use crate::{PolyglotError, PolyglotResult};
use super::ZIP_LOCAL_SIG;

/// Central directory file header signature (PK\x01\x02)
pub const START_CENTRAL_DIR_SIG: [u8; 4] = [0x50, 0x4B, 0x01, 0x02];

/// End of central directory signature (PK\x05\x06)
pub const END_CENTRAL_DIR_SIG: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];

/// Fixed part of the end of central directory record
pub const EOCD_MIN_SIZE: usize = 22;

/// Bytes that follow the archive inside the PNG: the IDAT CRC and IEND chunk
pub const PNG_TRAILER_LEN: u16 = 16;

// Little-endian fields are written backward, so these name each field's last byte
const CENTRAL_LOCAL_OFFSET_LAST: usize = 45;
const EOCD_CD_OFFSET_LAST: usize = 19;
const EOCD_COMMENT_LENGTH_LAST: usize = 21;

/// ZIP End of Central Directory record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EocdRecord {
    pub disk_num: u16,         // Number of this disk
    pub cd_disk_num: u16,      // Disk where central directory starts
    pub num_entries_disk: u16, // Number of central directory entries on this disk
    pub num_entries_total: u16, // Total number of central directory entries
    pub cd_size: u32,          // Size of central directory
    pub cd_offset: u32,        // Offset of central directory from start of archive
    pub comment_length: u16,   // Comment length
}

impl EocdRecord {
    /// Read the record whose signature starts at `offset`
    pub fn read(data: &[u8], offset: usize) -> Option<Self> {
        if data.get(offset..offset + 4)? != END_CENTRAL_DIR_SIG {
            return None;
        }
        Some(Self {
            disk_num: read_u16_le(data, offset + 4)?,
            cd_disk_num: read_u16_le(data, offset + 6)?,
            num_entries_disk: read_u16_le(data, offset + 8)?,
            num_entries_total: read_u16_le(data, offset + 10)?,
            cd_size: read_u32_le(data, offset + 12)?,
            cd_offset: read_u32_le(data, offset + 16)?,
            comment_length: read_u16_le(data, offset + 20)?,
        })
    }
}

/// Locate the last End of Central Directory record in `data`
pub fn find_eocd(data: &[u8]) -> Option<usize> {
    if data.len() < EOCD_MIN_SIZE {
        return None;
    }
    data.windows(END_CENTRAL_DIR_SIG.len())
        .rposition(|w| w == END_CENTRAL_DIR_SIG)
        .filter(|&offset| offset + EOCD_MIN_SIZE <= data.len())
}

/// What the offset repair touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipRepair {
    pub entries: u16,
    pub central_directory: usize,
    pub end_of_central_directory: usize,
}

fn absolute_offset(index: usize) -> PolyglotResult<u32> {
    u32::try_from(index).map_err(|_| {
        PolyglotError::SizeLimit("ZIP offset does not fit in a 32-bit field.".to_string())
    })
}

/// Rewrite every archive offset so it is absolute within `buffer`.
///
/// `archive_chunk` is the index of the `IDAT` tag of the chunk holding the
/// archive. Local headers and central directory entries are visited in
/// lockstep, which assumes both appear in the same order, as they do in
/// well-formed archives.
pub fn fix_zip_offsets(buffer: &mut [u8], archive_chunk: usize) -> PolyglotResult<ZipRepair> {
    let start_central = find_signature(buffer, &START_CENTRAL_DIR_SIG, archive_chunk).ok_or_else(|| {
        PolyglotError::ZipFormat("Start Central Directory signature not found.".to_string())
    })?;
    let end_central = find_signature(buffer, &END_CENTRAL_DIR_SIG, start_central).ok_or_else(|| {
        PolyglotError::ZipFormat("End of Central Directory signature not found.".to_string())
    })?;
    let eocd = EocdRecord::read(buffer, end_central).ok_or_else(|| {
        PolyglotError::ZipFormat("End of Central Directory record is truncated.".to_string())
    })?;

    let entries = eocd.num_entries_total;
    let mut local_index = archive_chunk;
    let mut central_cursor = start_central;

    for entry in 1..=entries {
        local_index = find_signature(&buffer[..start_central], &ZIP_LOCAL_SIG, local_index + 1)
            .ok_or_else(|| {
                PolyglotError::ZipFormat(format!("Local file header {entry} of {entries} not found."))
            })?;

        let central_entry = find_signature(buffer, &START_CENTRAL_DIR_SIG, central_cursor)
            .filter(|&index| index < end_central)
            .ok_or_else(|| {
                PolyglotError::ZipFormat(format!(
                    "Central directory entry {entry} of {entries} not found."
                ))
            })?;

        central_cursor = central_entry + CENTRAL_LOCAL_OFFSET_LAST;
        write_value(
            buffer,
            central_cursor,
            absolute_offset(local_index)?,
            FieldWidth::U32,
            ByteOrder::Little,
        )?;
    }

    write_value(
        buffer,
        end_central + EOCD_CD_OFFSET_LAST,
        absolute_offset(start_central)?,
        FieldWidth::U32,
        ByteOrder::Little,
    )?;

    // Cover the PNG trailer with the archive comment so readers that honour
    // the comment length (JAR loaders) still accept the file.
    let comment_length = eocd
        .comment_length
        .checked_add(PNG_TRAILER_LEN)
        .ok_or_else(|| PolyglotError::ZipFormat("Comment length overflow.".to_string()))?;
    write_value(
        buffer,
        end_central + EOCD_COMMENT_LENGTH_LAST,
        u32::from(comment_length),
        FieldWidth::U16,
        ByteOrder::Little,
    )?;

    debug!(entries, start_central, end_central, comment_length, "repaired ZIP offsets");
    Ok(ZipRepair {
        entries,
        central_directory: start_central,
        end_of_central_directory: end_central,
    })
}
