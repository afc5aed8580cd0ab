//! Hand-built PNG and ZIP fixtures shared by the unit tests

use crate::utils::calculate_crc32;

/// Serialize one PNG chunk with a valid CRC
pub fn chunk(tag: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 12);
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(tag);
    out.extend_from_slice(data);
    let crc = calculate_crc32(&[tag.as_slice(), data].concat());
    out.extend_from_slice(&crc.to_be_bytes());
    out
}

/// PNG with IHDR, an ancillary tEXt chunk, a PLTE for indexed images,
/// a gAMA chunk between the two IDAT chunks, and IEND.
pub fn build_png(width: u32, height: u32, color_type: u8, interlace: u8) -> Vec<u8> {
    let mut png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.extend_from_slice(&[8, color_type, 0, 0, interlace]);
    png.extend(chunk(b"IHDR", &ihdr));

    png.extend(chunk(b"tEXt", b"Comment\0made by hand"));
    if color_type == 3 {
        png.extend(chunk(b"PLTE", &[0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF]));
    }
    png.extend(chunk(b"IDAT", &[0x78, 0x9C, 0xED, 0xC1, 0x01, 0x01, 0x00, 0x00, 0x00, 0x80]));
    png.extend(chunk(b"gAMA", &[0x00, 0x00, 0xB1, 0x8F]));
    png.extend(chunk(b"IDAT", &[0x90, 0xFE, 0x37, 0x10]));
    png.extend(chunk(b"IEND", &[]));
    png
}

/// A truecolor 68x68 image whose IHDR window holds no shell-breaking bytes
pub fn clean_png() -> Vec<u8> {
    build_png(68, 68, 2, 0)
}

/// Stored (uncompressed) ZIP archive with the given entries and comment
pub fn build_zip_with_comment(entries: &[(&str, &[u8])], comment: &[u8]) -> Vec<u8> {
    let mut zip = Vec::new();
    let mut central = Vec::new();

    for (name, data) in entries {
        let local_offset = zip.len() as u32;
        let crc = crc32fast::hash(data);
        let size = data.len() as u32;

        zip.extend_from_slice(&[0x50, 0x4B, 0x03, 0x04]); // LFHS
        zip.extend_from_slice(&[0x0A, 0x00]); // Version needed
        zip.extend_from_slice(&[0x00, 0x00]); // GPB flag
        zip.extend_from_slice(&[0x00, 0x00]); // Compression method
        zip.extend_from_slice(&[0x00, 0x00, 0x21, 0x00]); // Last mod time/date
        zip.extend_from_slice(&crc.to_le_bytes());
        zip.extend_from_slice(&size.to_le_bytes()); // Compressed size
        zip.extend_from_slice(&size.to_le_bytes()); // Uncompressed size
        zip.extend_from_slice(&(name.len() as u16).to_le_bytes());
        zip.extend_from_slice(&[0x00, 0x00]); // Extra field length
        zip.extend_from_slice(name.as_bytes());
        zip.extend_from_slice(data);

        central.extend_from_slice(&[0x50, 0x4B, 0x01, 0x02]); // CDHS
        central.extend_from_slice(&[0x14, 0x03]); // Version made by
        central.extend_from_slice(&[0x0A, 0x00]); // Version needed
        central.extend_from_slice(&[0x00, 0x00]); // GPB flag
        central.extend_from_slice(&[0x00, 0x00]); // Compression method
        central.extend_from_slice(&[0x00, 0x00, 0x21, 0x00]); // Last mod time/date
        central.extend_from_slice(&crc.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&(name.len() as u16).to_le_bytes());
        central.extend_from_slice(&[0x00, 0x00]); // Extra field length
        central.extend_from_slice(&[0x00, 0x00]); // File comment length
        central.extend_from_slice(&[0x00, 0x00]); // Disk number
        central.extend_from_slice(&[0x00, 0x00]); // Internal attributes
        central.extend_from_slice(&[0x00, 0x00, 0xA4, 0x81]); // External attributes
        central.extend_from_slice(&local_offset.to_le_bytes());
        central.extend_from_slice(name.as_bytes());
    }

    let cd_offset = zip.len() as u32;
    let cd_size = central.len() as u32;
    zip.extend_from_slice(&central);

    zip.extend_from_slice(&[0x50, 0x4B, 0x05, 0x06]); // EOCDS
    zip.extend_from_slice(&[0x00, 0x00]); // Disk number
    zip.extend_from_slice(&[0x00, 0x00]); // CD disk number
    zip.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    zip.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    zip.extend_from_slice(&cd_size.to_le_bytes());
    zip.extend_from_slice(&cd_offset.to_le_bytes());
    zip.extend_from_slice(&(comment.len() as u16).to_le_bytes());
    zip.extend_from_slice(comment);
    zip
}

pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    build_zip_with_comment(entries, b"")
}

/// Two-entry archive whose first entry is a video
pub fn sample_zip() -> Vec<u8> {
    build_zip(&[
        ("clip.mp4", b"not really a video, but long enough".as_slice()),
        ("notes/readme.txt", b"hello from inside the png".as_slice()),
    ])
}
