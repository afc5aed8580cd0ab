//! File-type classification and the launch commands used for each type

use std::fmt;

/// Shape of the launch commands written into the script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptLayout {
    MediaPlayer,
    DocumentViewer,
    FolderOpen,
    DefaultOpen,
    Interpreter,
    Executable,
}

/// What kind of file the first archive entry is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Media,
    Document,
    Python,
    PowerShell,
    Executable,
    ShellScript,
    Folder,
    Unknown,
}

/// A piece of a launch command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece {
    Text(&'static str),
    /// The first entry name, verbatim
    Name,
    /// A space and the user's arguments, or nothing when none were given
    Args,
}

/// How one category is launched on each platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandProfile {
    pub layout: ScriptLayout,
    pub linux: &'static [Piece],
    pub windows: &'static [Piece],
    pub windows_epilogue: &'static str,
    pub takes_arguments: bool,
}

const MEDIA_EXTENSIONS: [&str; 15] = [
    "aac", "mp3", "mp4", "avi", "asf", "flv", "ebm", "mkv", "peg", "wav", "wmv", "wma", "mov", "3gp",
    "ogg",
];

use Piece::{Args, Name, Text};

const START_QUIET: &[Piece] = &[Text("start /b \"\" \""), Name, Text("\"")];
const XDG_OPEN: &[Piece] = &[Text("xdg-open \""), Name, Text("\"")];
const CHMOD_RUN: &[Piece] = &[Text("chmod +x "), Name, Text(";./\""), Name, Text("\""), Args];
const START_WITH_ARGS: &[Piece] = &[Text("start /b \"\" \""), Name, Text("\""), Args];

impl FileCategory {
    /// Classify an archive entry name, given as the raw bytes stored in the
    /// archive.
    ///
    /// A name has an extension only when its last `.` is not the first
    /// byte. Without one, a trailing `/` marks a folder and anything else is
    /// treated as an executable. With one, the last three bytes of the name
    /// decide, so `.py` and `.sh` include their dot.
    pub fn classify(name: &[u8]) -> Self {
        let has_extension = name.iter().rposition(|&b| b == b'.').is_some_and(|dot| dot > 0);
        if !has_extension {
            return if name.ends_with(b"/") {
                FileCategory::Folder
            } else {
                FileCategory::Executable
            };
        }

        let tail = &name[name.len().saturating_sub(3)..];
        if MEDIA_EXTENSIONS.iter().any(|ext| ext.as_bytes() == tail) {
            return FileCategory::Media;
        }
        match tail {
            b"pdf" => FileCategory::Document,
            b".py" => FileCategory::Python,
            b"ps1" => FileCategory::PowerShell,
            b"exe" => FileCategory::Executable,
            b".sh" => FileCategory::ShellScript,
            _ => FileCategory::Unknown,
        }
    }

    pub fn profile(self) -> CommandProfile {
        match self {
            FileCategory::Media => CommandProfile {
                layout: ScriptLayout::MediaPlayer,
                linux: &[
                    Text("vlc --play-and-exit --no-video-title-show \""),
                    Name,
                    Text("\" &> /dev/null"),
                ],
                windows: START_QUIET,
                windows_epilogue: "",
                takes_arguments: false,
            },
            FileCategory::Document => CommandProfile {
                layout: ScriptLayout::DocumentViewer,
                linux: &[Text("evince \""), Name, Text("\"")],
                windows: START_QUIET,
                windows_epilogue: "",
                takes_arguments: false,
            },
            FileCategory::Python => CommandProfile {
                layout: ScriptLayout::Interpreter,
                linux: &[Text("python3 \""), Name, Text("\""), Args],
                windows: &[Text("python3  \""), Name, Text("\""), Args],
                windows_epilogue: "pause&",
                takes_arguments: true,
            },
            FileCategory::PowerShell => CommandProfile {
                layout: ScriptLayout::Interpreter,
                linux: &[Text("pwsh \""), Name, Text("\""), Args],
                windows: &[Text("powershell \".\\"), Name, Text("\""), Args],
                windows_epilogue: "pause&",
                takes_arguments: true,
            },
            FileCategory::Executable => CommandProfile {
                layout: ScriptLayout::Executable,
                linux: CHMOD_RUN,
                windows: START_WITH_ARGS,
                windows_epilogue: "pause&",
                takes_arguments: true,
            },
            FileCategory::ShellScript => CommandProfile {
                layout: ScriptLayout::Executable,
                linux: CHMOD_RUN,
                windows: START_WITH_ARGS,
                windows_epilogue: "",
                takes_arguments: true,
            },
            FileCategory::Folder => CommandProfile {
                layout: ScriptLayout::FolderOpen,
                linux: XDG_OPEN,
                windows: &[Text("powershell;Invoke-Item  \""), Name, Text("\"")],
                windows_epilogue: "",
                takes_arguments: false,
            },
            // pdvzip 1.8 emits its folder command on Windows for unmatched
            // extensions; these open with the default application instead
            FileCategory::Unknown => CommandProfile {
                layout: ScriptLayout::DefaultOpen,
                linux: XDG_OPEN,
                windows: START_QUIET,
                windows_epilogue: "",
                takes_arguments: false,
            },
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileCategory::Media => "media",
            FileCategory::Document => "document",
            FileCategory::Python => "python script",
            FileCategory::PowerShell => "powershell script",
            FileCategory::Executable => "executable",
            FileCategory::ShellScript => "shell script",
            FileCategory::Folder => "folder",
            FileCategory::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Expand `pieces` into command bytes. The name is copied verbatim, so
/// names stored in a legacy code page reach the script unchanged.
pub fn render_command(pieces: &[Piece], name: &[u8], args: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for piece in pieces {
        match piece {
            Text(text) => out.extend_from_slice(text.as_bytes()),
            Name => out.extend_from_slice(name),
            Args if !args.is_empty() => {
                out.push(b' ');
                out.extend_from_slice(args.as_bytes());
            }
            Args => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux(category: FileCategory, name: &str, args: &str) -> String {
        String::from_utf8(render_command(category.profile().linux, name.as_bytes(), args)).unwrap()
    }

    fn windows(category: FileCategory, name: &str, args: &str) -> String {
        String::from_utf8(render_command(category.profile().windows, name.as_bytes(), args)).unwrap()
    }

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(FileCategory::classify(b"clip.mp4"), FileCategory::Media);
        assert_eq!(FileCategory::classify(b"movie.webm"), FileCategory::Media);
        assert_eq!(FileCategory::classify(b"song.mpeg"), FileCategory::Media);
        assert_eq!(FileCategory::classify(b"doc.pdf"), FileCategory::Document);
        assert_eq!(FileCategory::classify(b"run.py"), FileCategory::Python);
        assert_eq!(FileCategory::classify(b"setup.ps1"), FileCategory::PowerShell);
        assert_eq!(FileCategory::classify(b"game.exe"), FileCategory::Executable);
        assert_eq!(FileCategory::classify(b"build.sh"), FileCategory::ShellScript);
        assert_eq!(FileCategory::classify(b"notes.txt"), FileCategory::Unknown);
    }

    #[test]
    fn test_classify_without_extension() {
        assert_eq!(FileCategory::classify(b"tool"), FileCategory::Executable);
        assert_eq!(FileCategory::classify(b"assets/"), FileCategory::Folder);
        // A leading dot is a hidden file, not an extension
        assert_eq!(FileCategory::classify(b".bashrc"), FileCategory::Executable);
    }

    #[test]
    fn test_classify_non_utf8_name() {
        // CP437 "café.mp4" as stored by Windows zip tools
        assert_eq!(FileCategory::classify(b"caf\x82.mp4"), FileCategory::Media);
        assert_eq!(FileCategory::classify(b"\x82\x83"), FileCategory::Executable);
    }

    #[test]
    fn test_raw_name_is_copied_verbatim() {
        let command = render_command(FileCategory::Document.profile().linux, b"r\xe9sum\xe9.pdf", "");
        assert_eq!(command, b"evince \"r\xe9sum\xe9.pdf\"");
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        assert_eq!(FileCategory::classify(b"CLIP.MP4"), FileCategory::Unknown);
    }

    #[test]
    fn test_layouts() {
        assert_eq!(FileCategory::Media.profile().layout, ScriptLayout::MediaPlayer);
        assert_eq!(FileCategory::Document.profile().layout, ScriptLayout::DocumentViewer);
        assert_eq!(FileCategory::Folder.profile().layout, ScriptLayout::FolderOpen);
        assert_eq!(FileCategory::Unknown.profile().layout, ScriptLayout::DefaultOpen);
        assert_eq!(FileCategory::Python.profile().layout, ScriptLayout::Interpreter);
        assert_eq!(FileCategory::ShellScript.profile().layout, ScriptLayout::Executable);
    }

    #[test]
    fn test_commands() {
        assert_eq!(
            linux(FileCategory::Media, "clip.mp4", ""),
            "vlc --play-and-exit --no-video-title-show \"clip.mp4\" &> /dev/null"
        );
        assert_eq!(windows(FileCategory::Media, "clip.mp4", ""), "start /b \"\" \"clip.mp4\"");
        assert_eq!(linux(FileCategory::Executable, "tool", "-x"), "chmod +x tool;./\"tool\" -x");
        assert_eq!(windows(FileCategory::PowerShell, "a.ps1", ""), "powershell \".\\a.ps1\"");
        assert_eq!(
            windows(FileCategory::Folder, "assets/", ""),
            "powershell;Invoke-Item  \"assets/\""
        );
        assert_eq!(linux(FileCategory::Unknown, "notes.txt", ""), "xdg-open \"notes.txt\"");
        assert_eq!(windows(FileCategory::Unknown, "notes.txt", ""), "start /b \"\" \"notes.txt\"");
    }

    #[test]
    fn test_empty_arguments_add_nothing() {
        assert_eq!(linux(FileCategory::Python, "run.py", ""), "python3 \"run.py\"");
        assert_eq!(windows(FileCategory::Python, "run.py", "/q"), "python3  \"run.py\" /q");
    }

    #[test]
    fn test_argument_categories() {
        let takes: Vec<_> = [
            FileCategory::Media,
            FileCategory::Document,
            FileCategory::Python,
            FileCategory::PowerShell,
            FileCategory::Executable,
            FileCategory::ShellScript,
            FileCategory::Folder,
            FileCategory::Unknown,
        ]
        .into_iter()
        .filter(|c| c.profile().takes_arguments)
        .collect();
        assert_eq!(
            takes,
            [
                FileCategory::Python,
                FileCategory::PowerShell,
                FileCategory::Executable,
                FileCategory::ShellScript
            ]
        );
    }
}
