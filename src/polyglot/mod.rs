//! Core polyglot creation logic

use std::fs;
use std::path::Path;
use tracing::debug;
use crate::png::{self, IEND_CHUNK_LEN, IHDR_END, ImageHeader};
use crate::script::{build_extraction_script, ArgumentPrompt, FileCategory};
use crate::utils::{calculate_crc32, write_value, ByteOrder, FieldWidth};
use crate::zip::{fix_zip_offsets, ArchiveChunk, ZipRepair};
use crate::{PolyglotError, PolyglotResult, MAX_FILE_SIZE};

/// Cover images must be larger than this many bytes
pub const MIN_IMAGE_SIZE: usize = 68;

/// ZIP archives must be larger than this many bytes
pub const MIN_ZIP_SIZE: usize = 40;

/// Reject inputs that are too small to be real files, or too large together
pub fn check_input_sizes(image_len: usize, zip_len: usize) -> PolyglotResult<()> {
    if image_len <= MIN_IMAGE_SIZE {
        return Err(PolyglotError::SizeLimit("Invalid PNG image. File too small.".to_string()));
    }
    if zip_len <= MIN_ZIP_SIZE {
        return Err(PolyglotError::SizeLimit("Invalid ZIP file. File too small.".to_string()));
    }
    if image_len.saturating_add(zip_len) > MAX_FILE_SIZE {
        return Err(PolyglotError::SizeLimit(
            "The combined file size of your PNG image and ZIP file exceeds maximum limit.".to_string(),
        ));
    }
    Ok(())
}

/// Everything one run reads, decides and produces
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub image: Vec<u8>,
    pub archive: Vec<u8>,
    pub header: Option<ImageHeader>,
    pub category: Option<FileCategory>,
    pub repair: Option<ZipRepair>,
}

/// Core orchestrator for creating PNG/ZIP polyglots
pub struct PolyglotCreator {
    context: RunContext,
}

fn read_input(path: &Path) -> PolyglotResult<Vec<u8>> {
    fs::read(path).map_err(|source| PolyglotError::FileAccess { path: path.to_path_buf(), source })
}

impl PolyglotCreator {
    /// Load the cover image and archive from disk
    pub fn from_files(png_path: &Path, zip_path: &Path) -> PolyglotResult<Self> {
        let image = read_input(png_path)?;
        let archive = read_input(zip_path)?;
        Self::from_data(image, archive)
    }

    /// Create polyglot from raw data
    pub fn from_data(image: Vec<u8>, archive: Vec<u8>) -> PolyglotResult<Self> {
        check_input_sizes(image.len(), archive.len())?;
        Ok(Self { context: RunContext { image, archive, ..RunContext::default() } })
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Run every stage and return the finished polyglot.
    ///
    /// `prompt` is only consulted when the first archive entry is a file
    /// type that takes launch arguments.
    pub fn create(&mut self, prompt: &mut dyn ArgumentPrompt) -> PolyglotResult<Vec<u8>> {
        let header = png::validate(&self.context.image)?;
        self.context.header = Some(header);

        let pruned = png::prune_chunks(&self.context.image, &header)?;
        let archive = ArchiveChunk::wrap(&self.context.archive)?;

        let script = build_extraction_script(archive.first_entry_name(), prompt)?;
        self.context.category = Some(script.category);
        println!("\nUpdating extraction script.");

        println!("\nEmbedding extraction script within the PNG image.");
        println!("\nEmbedding ZIP file within the PNG image.");
        let (polyglot, repair) = assemble_with_repair(pruned, script.as_bytes(), archive)?;
        self.context.repair = Some(repair);
        Ok(polyglot)
    }
}

/// Combine the pruned image, script chunk and archive chunk into one file
pub fn assemble(image: Vec<u8>, script: &[u8], archive: ArchiveChunk) -> PolyglotResult<Vec<u8>> {
    assemble_with_repair(image, script, archive).map(|(polyglot, _)| polyglot)
}

fn assemble_with_repair(
    mut image: Vec<u8>,
    script: &[u8],
    archive: ArchiveChunk,
) -> PolyglotResult<(Vec<u8>, ZipRepair)> {
    let total = image.len() + script.len() + archive.len();
    if total > MAX_FILE_SIZE {
        return Err(PolyglotError::SizeLimit(
            "The combined file size of your PNG image and ZIP file exceeds maximum limit.".to_string(),
        ));
    }
    if image.len() < IHDR_END + IEND_CHUNK_LEN {
        return Err(PolyglotError::ImageFormat("Image is too short to hold IHDR and IEND.".to_string()));
    }

    // The archive chunk becomes the last IDAT, so its tag sits 8 bytes
    // before the original IEND position once the script is in place
    let archive_tag = image.len() + script.len() - 8;
    let archive_len = archive.len();

    image.splice(IHDR_END..IHDR_END, script.iter().copied());
    let iend = image.len() - IEND_CHUNK_LEN;
    image.splice(iend..iend, archive.into_bytes());

    let repair = fix_zip_offsets(&mut image, archive_tag)?;

    let crc = calculate_crc32(&image[archive_tag..archive_tag + archive_len - 8]);
    let crc_index = image.len() - (IEND_CHUNK_LEN + 4);
    write_value(&mut image, crc_index, crc, FieldWidth::U32, ByteOrder::Big)?;

    debug!(total = image.len(), archive_tag, crc = format_args!("{crc:#010x}"), "assembled polyglot");
    Ok((image, repair))
}
