//! Append-only session log.
//!
//! The log captures every byte the remote end sends, with optional
//! annotations ahead of the non-printable ones. It is opened once before
//! the session starts and flushed after every received byte, so killing
//! the process never loses more than the byte in flight.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum LogFileError {
    #[error("file io error on {}: {}", path.display(), source)]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Append-only sink for the session log.
pub struct LogSink {
    out: BufWriter<File>,
    path: PathBuf,
}

impl LogSink {
    /// Open the log for appending, creating the file if it is missing.
    pub fn open(path: &Path) -> Result<Self, LogFileError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LogFileError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        info!("Logging session to {}", path.display());
        Ok(Self {
            out: BufWriter::new(file),
            path: path.to_path_buf(),
        })
    }

    /// Path the sink was opened with.
    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Buffer an annotation; it reaches the file with the next byte flush.
    pub fn annotate(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())
    }

    /// Append one raw byte and flush it, along with any pending annotation.
    pub fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.out.write_all(&[byte])?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_log(tag: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "rawterm-test-{}-{}.log",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn test_annotation_precedes_raw_byte() {
        let path = temp_log("annotated");
        let mut sink = LogSink::open(&path).unwrap();
        sink.annotate("[7.BEL]").unwrap();
        sink.write_byte(7).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"[7.BEL]\x07");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_write_byte_flushes_immediately() {
        let path = temp_log("flush");
        let mut sink = LogSink::open(&path).unwrap();
        sink.write_byte(b'x').unwrap();

        // Readable before the sink is dropped
        assert_eq!(fs::read(&path).unwrap(), b"x");
        sink.write_byte(b'y').unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"xy");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_reopen_appends() {
        let path = temp_log("append");
        {
            let mut sink = LogSink::open(&path).unwrap();
            sink.write_byte(b'a').unwrap();
        }
        {
            let mut sink = LogSink::open(&path).unwrap();
            sink.write_byte(b'b').unwrap();
        }

        assert_eq!(fs::read(&path).unwrap(), b"ab");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_unwritable_path_reports_open_error() {
        let path = std::env::temp_dir().join("rawterm-no-such-dir").join("x.log");
        assert!(matches!(
            LogSink::open(&path),
            Err(LogFileError::Open { .. })
        ));
    }
}
