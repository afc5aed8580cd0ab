//! Byte-field codec and checksum helpers shared by the PNG and ZIP stages

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};
use crc32fast::Hasher;
use crate::{PolyglotError, PolyglotResult};

/// Byte order of a fixed-width field.
///
/// PNG length and CRC fields are big-endian. ZIP offsets and lengths are
/// little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}

/// Width of a fixed-width unsigned field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWidth {
    U16,
    U32,
}

impl FieldWidth {
    pub fn bits(self) -> u32 {
        match self {
            FieldWidth::U16 => 16,
            FieldWidth::U32 => 32,
        }
    }

    pub fn bytes(self) -> usize {
        self.bits() as usize / 8
    }
}

/// Calculate CRC32 checksum for given data
pub fn calculate_crc32(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Write `value` into `buf` as a `width` field.
///
/// Big-endian writes run forward from `index`. Little-endian writes run
/// backward from `index`, most significant byte first, so `index` names the
/// last byte of the field.
pub fn write_value(
    buf: &mut [u8],
    index: usize,
    value: u32,
    width: FieldWidth,
    order: ByteOrder,
) -> PolyglotResult<()> {
    let bits = width.bits();
    if u64::from(value) >> bits != 0 {
        return Err(PolyglotError::FieldOverflow { value: u64::from(value), bits });
    }

    let span = width.bytes();
    let start = match order {
        ByteOrder::Big => index,
        ByteOrder::Little => index
            .checked_sub(span - 1)
            .ok_or(PolyglotError::FieldOutOfBounds { index, len: buf.len() })?,
    };
    let len = buf.len();
    let field = buf
        .get_mut(start..start + span)
        .ok_or(PolyglotError::FieldOutOfBounds { index, len })?;

    match (order, width) {
        (ByteOrder::Big, FieldWidth::U16) => BigEndian::write_u16(field, value as u16),
        (ByteOrder::Big, FieldWidth::U32) => BigEndian::write_u32(field, value),
        (ByteOrder::Little, FieldWidth::U16) => LittleEndian::write_u16(field, value as u16),
        (ByteOrder::Little, FieldWidth::U32) => LittleEndian::write_u32(field, value),
    }
    Ok(())
}

/// Read a big-endian u16 from byte slice
pub fn read_u16_be(bytes: &[u8], offset: usize) -> Option<u16> {
    bytes.get(offset..offset + 2).map(BigEndian::read_u16)
}

/// Read a big-endian u32 from byte slice
pub fn read_u32_be(bytes: &[u8], offset: usize) -> Option<u32> {
    bytes.get(offset..offset + 4).map(BigEndian::read_u32)
}

/// Read a little-endian u16 from byte slice
pub fn read_u16_le(bytes: &[u8], offset: usize) -> Option<u16> {
    bytes.get(offset..offset + 2).map(LittleEndian::read_u16)
}

/// Read a little-endian u32 from byte slice
pub fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    bytes.get(offset..offset + 4).map(LittleEndian::read_u32)
}

/// Find the first occurrence of `sig` in `data` at or after `from`
pub fn find_signature(data: &[u8], sig: &[u8], from: usize) -> Option<usize> {
    if sig.is_empty() {
        return None;
    }
    data.get(from..)?
        .windows(sig.len())
        .position(|w| w == sig)
        .map(|pos| pos + from)
}

/// Validate PNG signature
pub fn is_png_signature(data: &[u8]) -> bool {
    data.len() >= 8 && data[0..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]
}
