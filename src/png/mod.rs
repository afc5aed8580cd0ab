//! PNG cover image validation and chunk pruning

pub mod parser;
pub mod prune;

use tracing::debug;
use crate::utils::read_u16_be;
use crate::{PolyglotError, PolyglotResult};
pub use parser::{Chunk, parse_png_chunks};
pub use prune::prune_chunks;

/// First four bytes of every PNG
pub const PNG_TOP_SIG: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];

/// "IEND" tag followed by its constant CRC
pub const PNG_END_SIG: [u8; 8] = [0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82];

/// Bytes that break the Linux half of the extraction script when the image
/// is run as a shell script: `" ' ( ) ; > \``
pub const BAD_CHARS: [u8; 7] = [0x22, 0x27, 0x28, 0x29, 0x3B, 0x3E, 0x60];

/// Signature plus the whole IHDR chunk
pub const IHDR_END: usize = 33;

/// Length of the IEND chunk
pub const IEND_CHUNK_LEN: usize = 12;

pub const MIN_DIMS: u16 = 68;
pub const MAX_TRUECOLOR_DIMS: u16 = 899;
pub const MAX_INDEXED_DIMS: u16 = 4096;

// IHDR bytes a shell may read: width low byte through the IHDR CRC
const SCAN_START: usize = 19;
const SCAN_END: usize = 33;

const WIDTH_INDEX: usize = 18;
const HEIGHT_INDEX: usize = 22;
const COLOR_TYPE_INDEX: usize = 25;

/// Colour models accepted as a cover image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorType {
    /// PNG-24/PNG-32 (colour types 2 and 6)
    Truecolor,
    /// PNG-8 (colour type 3)
    Indexed,
}

impl ColorType {
    fn from_byte(byte: u8) -> Option<Self> {
        // Truecolor with alpha is handled exactly like plain truecolor
        let normalized = if byte == 6 { 2 } else { byte };
        match normalized {
            2 => Some(ColorType::Truecolor),
            3 => Some(ColorType::Indexed),
            _ => None,
        }
    }

    pub fn max_dims(self) -> u16 {
        match self {
            ColorType::Truecolor => MAX_TRUECOLOR_DIMS,
            ColorType::Indexed => MAX_INDEXED_DIMS,
        }
    }
}

/// Fields read from IHDR during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u16,
    pub height: u16,
    pub color_type: ColorType,
}

/// True when `bytes` holds a character that breaks the Linux script
pub fn contains_bad_char(bytes: &[u8]) -> bool {
    bytes.iter().any(|b| BAD_CHARS.contains(b))
}

/// Run every structural check on the cover image.
///
/// Checks run in a fixed order (signatures, shell-breaking bytes in IHDR,
/// colour type, dimensions, first IDAT CRC) and the first failure wins.
pub fn validate(image: &[u8]) -> PolyglotResult<ImageHeader> {
    if image.len() < IHDR_END + IEND_CHUNK_LEN
        || image[..4] != PNG_TOP_SIG
        || image[image.len() - PNG_END_SIG.len()..] != PNG_END_SIG
    {
        return Err(PolyglotError::ImageFormat(
            "File does not appear to be a valid PNG image.".to_string(),
        ));
    }

    if contains_bad_char(&image[SCAN_START..SCAN_END]) {
        return Err(PolyglotError::ImageFormat(
            "\n\nThe IHDR chunk of this image contains a character that will break the Linux extraction script.\
             \nTry modifying image dimensions (1% increase or decrease) to resolve the issue. Repeat if necessary."
                .to_string(),
        ));
    }

    let color_type = ColorType::from_byte(image[COLOR_TYPE_INDEX]).ok_or_else(|| {
        PolyglotError::UnsupportedImage(
            "Color type of PNG image is not supported.\n\nPNG-32/24 (Truecolor) or PNG-8 (Indexed Color) only."
                .to_string(),
        )
    })?;

    let width = read_u16_be(image, WIDTH_INDEX).unwrap_or_default();
    let height = read_u16_be(image, HEIGHT_INDEX).unwrap_or_default();
    let range = MIN_DIMS..=color_type.max_dims();
    if !range.contains(&width) || !range.contains(&height) {
        return Err(PolyglotError::UnsupportedImage(
            "Dimensions of PNG image are not within the supported range.\
             \n\nPNG-32/24 Truecolor: [68 x 68]<->[899 x 899].\nPNG-8 Indexed Color: [68 x 68]<->[4096 x 4096]."
                .to_string(),
        ));
    }

    let first_idat = parser::find_chunk(image, b"IDAT", IHDR_END)?
        .ok_or_else(|| PolyglotError::ImageFormat("No IDAT chunk found.".to_string()))?;
    if !first_idat.has_valid_crc() {
        return Err(PolyglotError::ImageFormat(
            "CRC value for first IDAT chunk is invalid.".to_string(),
        ));
    }

    debug!(width, height, ?color_type, first_idat = first_idat.offset, "cover image validated");
    Ok(ImageHeader { width, height, color_type })
}
