//! Extraction script stored in the `iCCP` chunk

pub mod category;
pub mod prompt;
pub mod template;

use tracing::{debug, info, warn};
use crate::png::contains_bad_char;
use crate::utils::{calculate_crc32, write_value, ByteOrder, FieldWidth};
use crate::{PolyglotError, PolyglotResult};
pub use category::{CommandProfile, FileCategory, ScriptLayout};
pub use prompt::{ArgumentPrompt, LinePrompt, Platform, PresetArguments, StdinPrompt};
use template::{render, Slot, SCRIPT_TEMPLATE};

/// Largest script chunk, fields included
pub const MAX_SCRIPT_SIZE: usize = 750;

/// Padding inserted when the chunk length byte would break the shell
const FILLER: &[u8; 10] = b"..........";

// The low byte of the length field is read by the shell
const LENGTH_FIELD: usize = 2;
const LENGTH_LOW_BYTE: usize = 3;

/// A finished `iCCP` chunk and the category it was built for
#[derive(Debug, Clone)]
pub struct ExtractionScript {
    pub bytes: Vec<u8>,
    pub category: FileCategory,
    pub filler_blocks: usize,
}

impl ExtractionScript {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Build the script chunk that launches `entry_name` after extraction.
///
/// `entry_name` is the name exactly as stored in the archive, which need not
/// be UTF-8. Arguments are only requested when the entry's category accepts
/// them.
pub fn build_extraction_script(
    entry_name: &[u8],
    prompt: &mut dyn ArgumentPrompt,
) -> PolyglotResult<ExtractionScript> {
    let category = FileCategory::classify(entry_name);
    let profile = category.profile();
    info!(
        entry_name = %String::from_utf8_lossy(entry_name),
        %category,
        layout = ?profile.layout,
        "selected extraction script"
    );

    let (linux_args, windows_args) = if profile.takes_arguments {
        (prompt.arguments(Platform::Linux)?, prompt.arguments(Platform::Windows)?)
    } else {
        (String::new(), String::new())
    };

    let payload = render(SCRIPT_TEMPLATE, |slot| match slot {
        Slot::LinuxCommand => category::render_command(profile.linux, entry_name, &linux_args),
        Slot::WindowsCommand => category::render_command(profile.windows, entry_name, &windows_args),
        Slot::WindowsEpilogue => profile.windows_epilogue.as_bytes().to_vec(),
    });

    let mut bytes = Vec::with_capacity(payload.len() + 12);
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(b"iCCP");
    bytes.extend_from_slice(&payload);
    bytes.extend_from_slice(&[0, 0, 0, 0]);

    let filler_blocks = write_script_length(&mut bytes)?;
    if filler_blocks > 0 {
        warn!(filler_blocks, "padded script so its length byte is shell safe");
    }

    if bytes.len() > MAX_SCRIPT_SIZE {
        return Err(PolyglotError::ScriptSize(
            "Extraction script exceeds size limit.".to_string(),
        ));
    }

    let crc_index = bytes.len() - 4;
    let crc = calculate_crc32(&bytes[4..crc_index]);
    write_value(&mut bytes, crc_index, crc, FieldWidth::U32, ByteOrder::Big)?;

    debug!(script_len = bytes.len(), crc = format_args!("{crc:#010x}"), "built script chunk");
    Ok(ExtractionScript { bytes, category, filler_blocks })
}

/// Write the chunk length, padding the payload until its low byte is safe.
/// Returns how many filler blocks were added.
fn write_script_length(bytes: &mut Vec<u8>) -> PolyglotResult<usize> {
    let mut filler_blocks = 0;
    loop {
        let length = u32::try_from(bytes.len() - 12).map_err(|_| {
            PolyglotError::ScriptSize("Extraction script exceeds size limit.".to_string())
        })?;
        write_value(bytes, LENGTH_FIELD, length, FieldWidth::U16, ByteOrder::Big)
            .map_err(|_| PolyglotError::ScriptSize("Extraction script exceeds size limit.".to_string()))?;

        if !contains_bad_char(&bytes[LENGTH_LOW_BYTE..=LENGTH_LOW_BYTE]) {
            return Ok(filler_blocks);
        }
        let crc_index = bytes.len() - 4;
        bytes.splice(crc_index..crc_index, FILLER.iter().copied());
        filler_blocks += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::png::BAD_CHARS;
    use crate::utils::read_u32_be;
    use proptest::prelude::*;
    use std::io;

    /// Counts how often it is asked
    struct CountingPrompt {
        calls: Vec<Platform>,
    }

    impl ArgumentPrompt for CountingPrompt {
        fn arguments(&mut self, platform: Platform) -> io::Result<String> {
            self.calls.push(platform);
            Ok(String::new())
        }
    }

    fn payload(script: &ExtractionScript) -> &[u8] {
        &script.bytes[8..script.len() - 4]
    }

    fn check_chunk(script: &ExtractionScript) {
        let bytes = script.as_bytes();
        assert_eq!(&bytes[4..8], b"iCCP");
        assert_eq!(read_u32_be(bytes, 0), Some(bytes.len() as u32 - 12));
        assert_eq!(
            read_u32_be(bytes, bytes.len() - 4),
            Some(calculate_crc32(&bytes[4..bytes.len() - 4]))
        );
        assert!(!BAD_CHARS.contains(&bytes[3]));
        assert!(bytes.len() <= MAX_SCRIPT_SIZE);
    }

    #[test]
    fn test_media_script_bytes() {
        let script = build_extraction_script(b"clip.mp4", &mut PresetArguments::default()).unwrap();
        let expected: &[u8] = b"scr\0\0\rREM;clear;mkdir ./pdvzip_extracted;mv \"$0\" ./pdvzip_extracted;\
cd ./pdvzip_extracted;unzip -qo \"$0\";clear;vlc --play-and-exit --no-video-title-show \"clip.mp4\" &> /dev/null;\
exit;\r\n#&cls&mkdir .\\pdvzip_extracted&move \"%~dpnx0\" .\\pdvzip_extracted&cd .\\pdvzip_extracted&cls&\
tar -xf \"%~n0%~x0\"&start /b \"\" \"clip.mp4\"&ren \"%~n0%~x0\" *.png&exit\r\n";

        assert_eq!(script.category, FileCategory::Media);
        assert_eq!(payload(&script), expected);
        assert_eq!(payload(&script).len(), 344);
        assert_eq!(script.filler_blocks, 0);
        check_chunk(&script);
    }

    #[test]
    fn test_python_script_with_arguments() {
        let mut preset = PresetArguments::new("--fast", "/q");
        let script = build_extraction_script(b"run.py", &mut preset).unwrap();
        let text = String::from_utf8_lossy(payload(&script)).into_owned();

        assert!(text.contains("clear;python3 \"run.py\" --fast;exit;\r\n"));
        assert!(text.ends_with(
            "tar -xf \"%~n0%~x0\"&python3  \"run.py\" /q&ren \"%~n0%~x0\" *.png&pause&exit\r\n"
        ));
        check_chunk(&script);
    }

    #[test]
    fn test_prompt_only_for_argument_types() {
        let mut prompt = CountingPrompt { calls: Vec::new() };
        build_extraction_script(b"doc.pdf", &mut prompt).unwrap();
        assert!(prompt.calls.is_empty());

        build_extraction_script(b"tool", &mut prompt).unwrap();
        assert_eq!(prompt.calls, [Platform::Linux, Platform::Windows]);
    }

    #[test]
    fn test_filler_for_unsafe_length() {
        // 296 byte payload puts 0x28 '(' in the low length byte
        let script = build_extraction_script(b"test.pdf", &mut PresetArguments::default()).unwrap();
        assert_eq!(script.filler_blocks, 1);
        assert_eq!(payload(&script).len(), 306);
        assert!(payload(&script).ends_with(b"exit\r\n.........."));
        check_chunk(&script);
    }

    #[test]
    fn test_long_name_exceeds_limit() {
        let name = format!("{}.mp4", "a".repeat(300));
        let err = build_extraction_script(name.as_bytes(), &mut PresetArguments::default()).unwrap_err();
        assert!(matches!(err, PolyglotError::ScriptSize(_)));
    }

    #[test]
    fn test_prompt_failure_propagates() {
        struct Broken;
        impl ArgumentPrompt for Broken {
            fn arguments(&mut self, _: Platform) -> io::Result<String> {
                Err(io::Error::new(io::ErrorKind::UnexpectedEof, "closed"))
            }
        }
        assert!(matches!(build_extraction_script(b"run.py", &mut Broken), Err(PolyglotError::Io(_))));
    }

    #[test]
    fn test_non_utf8_name_is_written_verbatim() {
        let script = build_extraction_script(b"caf\x82.mp4", &mut PresetArguments::default()).unwrap();
        let body = payload(&script);
        assert_eq!(script.category, FileCategory::Media);
        assert!(body.windows(10).any(|w| w == b"\"caf\x82.mp4\""));
        assert!(!body.windows(3).any(|w| w == [0xEF, 0xBF, 0xBD]));
        check_chunk(&script);
    }

    proptest! {
        #[test]
        fn script_is_always_shell_safe_or_rejected(
            hidden in any::<bool>(),
            stem in "[a-zA-Z0-9_]{1,120}",
            ext in prop::sample::select(vec!["mp4", "pdf", "py", "ps1", "exe", "sh", "txt", "", "/"]),
            args in "[a-z -]{0,40}",
        ) {
            let stem = if hidden { format!(".{stem}") } else { stem };
            let name = match ext {
                "" => stem,
                "/" => format!("{stem}/"),
                ext => format!("{stem}.{ext}"),
            };
            let mut preset = PresetArguments::new(args.clone(), args);
            match build_extraction_script(name.as_bytes(), &mut preset) {
                Ok(script) => {
                    let bytes = script.as_bytes();
                    prop_assert!(bytes.len() <= MAX_SCRIPT_SIZE);
                    prop_assert!(!BAD_CHARS.contains(&bytes[3]));
                    prop_assert_eq!(read_u32_be(bytes, 0), Some(bytes.len() as u32 - 12));
                    prop_assert_eq!(
                        read_u32_be(bytes, bytes.len() - 4),
                        Some(calculate_crc32(&bytes[4..bytes.len() - 4]))
                    );
                    if ext == "/" {
                        prop_assert_eq!(script.category, FileCategory::Folder);
                    }
                }
                Err(err) => {
                    prop_assert!(matches!(err, PolyglotError::ScriptSize(_)));
                }
            }
        }
    }
}
