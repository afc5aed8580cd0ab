//! Collecting launch arguments for the archived file

use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Windows,
}

/// Source of the optional command-line arguments written into the script.
///
/// Only called for file types that accept arguments, once for Linux and
/// then once for Windows.
pub trait ArgumentPrompt {
    fn arguments(&mut self, platform: Platform) -> io::Result<String>;
}

/// Asks on `output` and reads one line per platform from `input`
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

/// The interactive prompt used by the command-line tool
pub type StdinPrompt = LinePrompt<io::StdinLock<'static>, io::Stdout>;

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl StdinPrompt {
    pub fn stdin() -> Self {
        LinePrompt::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ArgumentPrompt for LinePrompt<R, W> {
    fn arguments(&mut self, platform: Platform) -> io::Result<String> {
        match platform {
            Platform::Linux => write!(
                self.output,
                "\nFor this file type you can provide command-line arguments here, if required.\n\nLinux: "
            )?,
            Platform::Windows => write!(self.output, "\nWindows: ")?,
        }
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
    }
}

/// Fixed arguments, for callers that cannot prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetArguments {
    pub linux: String,
    pub windows: String,
}

impl PresetArguments {
    pub fn new(linux: impl Into<String>, windows: impl Into<String>) -> Self {
        Self { linux: linux.into(), windows: windows.into() }
    }
}

impl ArgumentPrompt for PresetArguments {
    fn arguments(&mut self, platform: Platform) -> io::Result<String> {
        Ok(match platform {
            Platform::Linux => self.linux.clone(),
            Platform::Windows => self.windows.clone(),
        })
    }
}
