////////////////////////////
/// internals/files.rs
///
/// Reading and writing files, and stdin/TUI line-at-a-time input:
/// read tokens from a file or the terminal, one line at a time,
/// returning one space-delimited token at a time while the remainder
/// of the line is cached for the next call.
///
/// See DESIGN.md for grounding; this is the canonical reader (an
/// older-generation duplicate at the crate root has been dropped).
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{DebugLevel, Msg};
use crate::internals::tui::ForthTui;

/// The one ambient boundary where the core touches `std::io::Error`
/// directly.
#[derive(Debug, thiserror::Error)]
pub enum FileIoError {
    #[error("unable to open {path}: {source}")]
    Open { path: String, #[source] source: io::Error },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum FileMode {
    RW,
    RO,
    WO,
}

pub enum FType {
    Stdin,
    File(File),
    BReader(BufReader<File>),
    Tui(ForthTui),
}

pub struct FileHandle {
    pub source: FType,
    file_mode: FileMode,
    file_size: usize,
    file_position: usize,
    msg: Msg,
}

impl FileHandle {
    pub fn new_file(path: &Path, mode: FileMode) -> Result<FileHandle, FileIoError> {
        let file_size = std::fs::metadata(path).map(|m| m.len() as usize).unwrap_or(0);
        let mut msg = Msg::new();
        msg.set_level(DebugLevel::Warning);
        let source = match mode {
            FileMode::RO => {
                let file = File::open(path).map_err(|e| FileIoError::Open { path: path.display().to_string(), source: e })?;
                FType::BReader(BufReader::new(file))
            }
            FileMode::RW | FileMode::WO => {
                let file = OpenOptions::new()
                    .read(mode == FileMode::RW)
                    .write(true)
                    .create(true)
                    .open(path)
                    .map_err(|e| FileIoError::Open { path: path.display().to_string(), source: e })?;
                FType::File(file)
            }
        };
        Ok(FileHandle { source, file_mode: mode, file_size, file_position: 0, msg })
    }

    pub fn new_stdin() -> FileHandle {
        FileHandle { source: FType::Stdin, file_mode: FileMode::RO, file_size: 0, file_position: 0, msg: Msg::new() }
    }

    pub fn new_tui() -> Result<FileHandle, FileIoError> {
        let tui = ForthTui::new().map_err(FileIoError::Io)?;
        Ok(FileHandle { source: FType::Tui(tui), file_mode: FileMode::RO, file_size: 0, file_position: 0, msg: Msg::new() })
    }

    /// get_line - read one line of text, blocking for interactive
    /// sources. `None` means end of input (EOF on a file, or the TUI
    /// line editor was cancelled).
    pub fn get_line(&mut self) -> Option<String> {
        let mut new_line = String::new();
        let result = match &mut self.source {
            FType::Stdin => {
                io::stdout().flush().ok();
                io::stdin().read_line(&mut new_line)
            }
            FType::BReader(br) => {
                if self.file_mode == FileMode::WO {
                    self.msg.error::<&str>("get_line", "cannot read a write-only file", None);
                    return None;
                }
                br.read_line(&mut new_line)
            }
            FType::File(_) => {
                self.msg.error::<&str>("get_line", "file not opened for buffered reading", None);
                return None;
            }
            FType::Tui(tui) => return tui.get_line(),
        };
        match result {
            Ok(0) => None,
            Ok(_) => {
                self.file_position += new_line.len();
                Some(new_line.trim_end_matches(['\n', '\r']).to_string())
            }
            Err(e) => {
                self.msg.error("get_line", "read error", Some(e));
                None
            }
        }
    }

    pub fn read_char(&mut self) -> Option<char> {
        let mut buf = [0u8; 1];
        let n = match &mut self.source {
            FType::Stdin => io::stdin().lock().read(&mut buf).ok()?,
            FType::BReader(br) => br.read(&mut buf).ok()?,
            FType::File(f) => f.read(&mut buf).ok()?,
            FType::Tui(_) => return None,
        };
        if n == 0 {
            None
        } else {
            self.file_position += 1;
            Some(buf[0] as char)
        }
    }

    pub fn write_line(&mut self, text: &str) -> Result<(), FileIoError> {
        match &mut self.source {
            FType::File(f) => {
                writeln!(f, "{}", text)?;
                self.file_position += text.len() + 1;
                Ok(())
            }
            FType::Stdin => {
                println!("{}", text);
                Ok(())
            }
            _ => Err(FileIoError::Io(io::Error::new(io::ErrorKind::Unsupported, "not writable"))),
        }
    }

    pub fn file_position(&mut self) -> usize {
        if let FType::File(f) = &mut self.source {
            if let Ok(pos) = f.seek(SeekFrom::Current(0)) {
                self.file_position = pos as usize;
            }
        }
        self.file_position
    }

    pub fn file_size(&self) -> usize {
        self.file_size
    }

    pub fn file_mode(&self) -> FileMode {
        self.file_mode
    }

    pub fn set_file_mode(&mut self, mode: FileMode) {
        self.file_mode = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn scratch_file(contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("f3core-test-{}.fs", std::process::id()));
        let mut f = File::create(&path).unwrap();
        write!(f, "{}", contents).unwrap();
        path
    }

    #[test]
    fn new_file_opens_existing_path() {
        let path = scratch_file("dup swap\n");
        let handle = FileHandle::new_file(&path, FileMode::RO);
        assert!(handle.is_ok());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn new_file_errors_on_missing_path() {
        let handle = FileHandle::new_file(Path::new("/nonexistent/path/x.fs"), FileMode::RO);
        assert!(handle.is_err());
    }

    #[test]
    fn get_line_reads_and_trims() {
        let path = scratch_file("1 2 +\n");
        let mut handle = FileHandle::new_file(&path, FileMode::RO).unwrap();
        assert_eq!(handle.get_line().as_deref(), Some("1 2 +"));
        assert_eq!(handle.get_line(), None);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn file_mode_roundtrip() {
        let path = scratch_file("x\n");
        let mut handle = FileHandle::new_file(&path, FileMode::RO).unwrap();
        assert_eq!(handle.file_mode(), FileMode::RO);
        handle.set_file_mode(FileMode::RW);
        assert_eq!(handle.file_mode(), FileMode::RW);
        std::fs::remove_file(path).ok();
    }
}
