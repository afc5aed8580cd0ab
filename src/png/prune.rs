//! Rebuild the cover image keeping only the critical chunks

use tracing::debug;
use super::parser::find_chunk;
use super::{ColorType, IEND_CHUNK_LEN, IHDR_END, ImageHeader};
use crate::{PolyglotError, PolyglotResult};

/// Keep the signature and IHDR, the PLTE chunk for indexed images, every
/// IDAT chunk and IEND. All other chunks are dropped.
pub fn prune_chunks(image: &[u8], header: &ImageHeader) -> PolyglotResult<Vec<u8>> {
    let mut pruned = Vec::with_capacity(image.len());
    pruned.extend_from_slice(&image[..IHDR_END]);

    let first_idat = find_chunk(image, b"IDAT", IHDR_END)?
        .ok_or_else(|| PolyglotError::ImageFormat("No IDAT chunk found.".to_string()))?;

    if header.color_type == ColorType::Indexed {
        match find_chunk(image, b"PLTE", IHDR_END)? {
            Some(plte) if plte.offset < first_idat.offset => {
                pruned.extend_from_slice(&image[plte.offset..plte.end()]);
            }
            _ => {
                return Err(PolyglotError::ImageFormat(
                    "Required PLTE chunk not found for Indexed-color (PNG-8) image.".to_string(),
                ));
            }
        }
    }

    let mut idat_count = 0;
    let mut next = Some(first_idat);
    while let Some(idat) = next {
        pruned.extend_from_slice(&image[idat.offset..idat.end()]);
        idat_count += 1;
        // Resume past this chunk so payload bytes are never matched as a tag
        next = find_chunk(image, b"IDAT", idat.end())?;
    }

    pruned.extend_from_slice(&image[image.len() - IEND_CHUNK_LEN..]);

    debug!(
        original = image.len(),
        pruned = pruned.len(),
        idat_count,
        "removed non-critical chunks"
    );
    Ok(pruned)
}
