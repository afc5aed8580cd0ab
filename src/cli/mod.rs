//! CLI argument parsing and validation interfaces

use std::path::{Path, PathBuf};
use clap::{ArgAction, Parser};
use rand::Rng;
use crate::{PolyglotError, PolyglotResult};

pub const USAGE: &str = "\nUsage: pngzip <cover_image> <zip_file>\n       pngzip --info\n";

pub const INFO_TEXT: &str = r#"
pngzip embeds a ZIP archive inside a PNG image. The result is still a normal
image that image hosts keep intact, a ZIP file any archive tool can open, and
a script that unpacks itself when run.

To extract on Linux:   chmod +x pzip_12345.png && ./pzip_12345.png
To extract on Windows: rename the file to .cmd, then run .\pzip_12345.cmd
Or open the image with any ZIP tool. Rename it to .jar to run a JAR archive.

After unpacking, the first file in the archive is opened:
  video/audio  Linux uses vlc, Windows uses the default player
  .pdf         Linux uses evince, Windows uses the default viewer
  .py          python3 on both, with optional arguments
  .ps1         pwsh on Linux, powershell on Windows, with optional arguments
  executables  run directly, with optional arguments
  folders      opened in the file manager
  anything else is handed to the default application.

Cover image requirements:
  PNG-32/24 truecolour: 68 x 68 up to 899 x 899
  PNG-8 indexed colour: 68 x 68 up to 4096 x 4096
  Combined size of image and archive: at most 200 MB.
The first file name in the archive must be at least 4 characters long.
"#;

/// Embed a ZIP archive in a PNG image that extracts itself
#[derive(Parser, Debug)]
#[command(name = "pngzip")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Cover image (.png) followed by the archive to embed (.zip)
    #[arg(num_args = 0.., value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Show detailed usage information
    #[arg(long)]
    pub info: bool,

    /// Log more detail (-v warnings, -vv info, -vvv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// What a parsed command line asks for
#[derive(Debug, PartialEq, Eq)]
pub enum Mode<'a> {
    Info,
    Build { image: &'a Path, archive: &'a Path },
    Usage,
}

impl Cli {
    pub fn mode(&self) -> Mode<'_> {
        match (self.inputs.as_slice(), self.info) {
            ([], true) => Mode::Info,
            ([image, archive], false) => Mode::Build { image, archive },
            _ => Mode::Usage,
        }
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.to_string_lossy().ends_with(ext)
}

fn has_supported_chars(path: &Path) -> bool {
    path.to_string_lossy()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || matches!(c, '_' | '.' | '\\' | '-' | '/'))
}

/// Check the input names before any file is opened
pub fn check_input_names(image: &Path, archive: &Path) -> PolyglotResult<()> {
    if !has_extension(image, "png") || !has_extension(archive, "zip") {
        return Err(PolyglotError::InvalidInput(
            "Invalid file extension found. Only expecting 'png' followed by 'zip'.".to_string(),
        ));
    }
    if !has_supported_chars(image) || !has_supported_chars(archive) {
        return Err(PolyglotError::InvalidInput(
            "Characters not supported by this program found within file name arguments.".to_string(),
        ));
    }
    Ok(())
}

/// Random name for the finished polyglot, `pzip_` and five digits
pub fn output_file_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("pzip_{:05}.png", rng.gen_range(0..100_000u32))
}
