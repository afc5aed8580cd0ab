//! The dual-interpreter extraction script, as literal segments and slots.
//!
//! A POSIX shell reads the first line, where `REM;` is just an unknown
//! command, and exits before the second. `cmd.exe` skips the first line and
//! treats `#` on the second line as a label, so each interpreter only runs
//! its own half.

/// Placeholders filled in from the archived file's command profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    LinuxCommand,
    WindowsCommand,
    /// Runs just before the Windows `exit`
    WindowsEpilogue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Literal(&'static [u8]),
    Slot(Slot),
}

/// Payload of the `iCCP` chunk. The leading `scr\0\0` is the profile name and
/// compression byte a PNG decoder expects.
pub const SCRIPT_TEMPLATE: &[Segment] = &[
    Segment::Literal(
        b"scr\0\0\rREM;clear;mkdir ./pdvzip_extracted;mv \"$0\" ./pdvzip_extracted;\
cd ./pdvzip_extracted;unzip -qo \"$0\";clear;",
    ),
    Segment::Slot(Slot::LinuxCommand),
    Segment::Literal(
        b";exit;\r\n#&cls&mkdir .\\pdvzip_extracted&move \"%~dpnx0\" .\\pdvzip_extracted&\
cd .\\pdvzip_extracted&cls&tar -xf \"%~n0%~x0\"&",
    ),
    Segment::Slot(Slot::WindowsCommand),
    Segment::Literal(b"&ren \"%~n0%~x0\" *.png&"),
    Segment::Slot(Slot::WindowsEpilogue),
    Segment::Literal(b"exit\r\n"),
];

/// Render `template`, asking `fill` for the bytes of each slot
pub fn render<F>(template: &[Segment], mut fill: F) -> Vec<u8>
where
    F: FnMut(Slot) -> Vec<u8>,
{
    let mut out = Vec::with_capacity(512);
    for segment in template {
        match segment {
            Segment::Literal(bytes) => out.extend_from_slice(bytes),
            Segment::Slot(slot) => out.extend(fill(*slot)),
        }
    }
    out
}
