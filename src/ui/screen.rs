//! Raw-mode terminal control and the received-byte display.
//!
//! Raw mode has three jobs here: per-keystroke delivery, no line editing,
//! and no caret-notation mangling of control bytes. Crossterm's raw mode
//! also stops the terminal from echoing input and post-processing output,
//! so the [`Screen`] writer takes over the one translation still wanted
//! (LF to CRLF on the display path) and the session echoes typed bytes
//! itself.

use std::io::{self, Write};

use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::{execute, terminal};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum TerminalError {
    #[error("failed to set raw mode: {0}")]
    RawMode(#[source] io::Error),

    #[error("failed to configure paste reporting: {0}")]
    PasteMode(#[source] io::Error),
}

/// Raw mode for the lifetime of the value.
///
/// Cooked mode comes back when the guard drops, on every exit path,
/// panics included.
pub struct RawModeGuard;

impl RawModeGuard {
    /// Enter raw mode and turn on bracketed paste reporting.
    pub fn enable() -> Result<Self, TerminalError> {
        terminal::enable_raw_mode().map_err(TerminalError::RawMode)?;
        if let Err(e) = execute!(io::stdout(), EnableBracketedPaste) {
            let _ = terminal::disable_raw_mode();
            return Err(TerminalError::PasteMode(e));
        }
        info!("Terminal in raw mode");
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), DisableBracketedPaste);
        let _ = terminal::disable_raw_mode();
    }
}

/// Display sink for session bytes.
///
/// With output post-processing off, a bare LF moves down a line without
/// returning the cursor, so the screen path writes CRLF for it. The log
/// path never sees that translation.
pub struct Screen<W: Write> {
    out: W,
}

impl Screen<io::Stdout> {
    /// Screen over the process stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Screen<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// The underlying writer.
    #[allow(dead_code)]
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Write one raw session byte.
    pub fn put_byte(&mut self, byte: u8) -> io::Result<()> {
        if byte == b'\n' {
            self.out.write_all(b"\r\n")
        } else {
            self.out.write_all(&[byte])
        }
    }

    /// Write a bracketed control-code annotation.
    pub fn annotate(&mut self, name: &str) -> io::Result<()> {
        write!(self.out, "[{}]", name)
    }

    /// Echo locally-typed bytes.
    pub fn echo(&mut self, bytes: &[u8]) -> io::Result<()> {
        for &byte in bytes {
            self.put_byte(byte)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
