//! The bridge loop.
//!
//! One single-threaded loop owns both endpoints and relays bytes between
//! them, keyboard first, then socket, every iteration. The keyboard poll
//! doubles as the idle wait, so a quiet session parks in the kernel
//! instead of spinning, and a keystroke wakes it immediately.
//!
//! The loop ends when the peer closes the connection, when Ctrl+] is
//! pressed locally, or when an I/O error surfaces. Nothing is retried.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use thiserror::Error;
use tracing::info;

use crate::config::Settings;
use crate::core::connection::{Connection, Received};
use crate::core::filter::{self, DisplayAction, LogAction};
use crate::core::log::LogSink;
use crate::ui::{KeyEncoder, Screen};

/// How long the keyboard poll waits before the socket gets a turn.
const POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// Socket read chunk size.
const RECV_CHUNK: usize = 4096;

/// The byte that closes the session from the local side (Ctrl+]).
const LOCAL_CLOSE: u8 = 0x1D;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("terminal input error: {0}")]
    Input(#[source] io::Error),

    #[error("connection i/o error: {0}")]
    Connection(#[source] io::Error),

    #[error("screen write error: {0}")]
    Screen(#[source] io::Error),

    #[error("log write error: {0}")]
    Log(#[source] io::Error),
}

/// Why the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The remote end closed the connection.
    PeerClosed,
    /// Ctrl+] was pressed locally.
    LocalClose,
}

/// A running bridge between the keyboard and a connection.
pub struct Session<W: Write> {
    conn: Connection,
    screen: Screen<W>,
    sink: Option<LogSink>,
    settings: Settings,
}

impl<W: Write> Session<W> {
    pub fn new(
        conn: Connection,
        screen: Screen<W>,
        sink: Option<LogSink>,
        settings: Settings,
    ) -> Self {
        Self {
            conn,
            screen,
            sink,
            settings,
        }
    }

    /// Run the bridge to completion.
    pub fn run(&mut self) -> Result<SessionEnd, SessionError> {
        info!("Session with {} started", self.conn.peer());
        let mut buf = [0u8; RECV_CHUNK];

        loop {
            // Keyboard first; the poll timeout is the loop's idle wait
            if event::poll(POLL_TIMEOUT).map_err(SessionError::Input)? {
                match event::read().map_err(SessionError::Input)? {
                    Event::Key(key_event) => {
                        if key_event.kind != KeyEventKind::Press {
                            continue;
                        }
                        if let Some(bytes) = KeyEncoder::encode(&key_event) {
                            if is_local_close(&bytes) {
                                info!("Session closed locally");
                                return Ok(SessionEnd::LocalClose);
                            }
                            self.forward(&bytes)?;
                        }
                    }
                    Event::Paste(text) => {
                        self.forward(text.as_bytes())?;
                    }
                    _ => {}
                }
            }

            // Then drain what the socket has ready
            match self.conn.recv(&mut buf).map_err(SessionError::Connection)? {
                Received::Bytes(n) => {
                    for &byte in &buf[..n] {
                        relay_byte(byte, &self.settings, &mut self.screen, &mut self.sink)?;
                    }
                    self.screen.flush().map_err(SessionError::Screen)?;
                }
                Received::Closed => {
                    info!("Connection closed by {}", self.conn.peer());
                    return Ok(SessionEnd::PeerClosed);
                }
                Received::Idle => {}
            }
        }
    }

    /// Send typed bytes to the remote end, echoing locally when configured.
    fn forward(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        self.conn.send(bytes).map_err(SessionError::Connection)?;
        if self.settings.local_echo {
            self.screen.echo(bytes).map_err(SessionError::Screen)?;
            self.screen.flush().map_err(SessionError::Screen)?;
        }
        Ok(())
    }
}

/// True when an encoded key is exactly the local close chord.
/// Longer sequences that merely contain the byte pass through untouched.
fn is_local_close(bytes: &[u8]) -> bool {
    matches!(bytes, [LOCAL_CLOSE])
}

/// Apply one received byte's filter actions to the screen and the log.
fn relay_byte<W: Write>(
    byte: u8,
    settings: &Settings,
    screen: &mut Screen<W>,
    sink: &mut Option<LogSink>,
) -> Result<(), SessionError> {
    let actions = filter::apply(byte, settings);

    match actions.display {
        DisplayAction::Suppress => {}
        DisplayAction::ShowRaw => {
            screen.put_byte(byte).map_err(SessionError::Screen)?;
        }
        DisplayAction::ShowSymbolic(name) => {
            screen.annotate(name).map_err(SessionError::Screen)?;
        }
        DisplayAction::ShowSymbolicRaw(name) => {
            screen.annotate(name).map_err(SessionError::Screen)?;
            screen.put_byte(byte).map_err(SessionError::Screen)?;
        }
    }

    if let Some(sink) = sink.as_mut() {
        match actions.log {
            LogAction::None => {}
            LogAction::WriteRaw(b) => {
                sink.write_byte(b).map_err(SessionError::Log)?;
            }
            LogAction::WriteFormatted(text, b) => {
                sink.annotate(&text).map_err(SessionError::Log)?;
                sink.write_byte(b).map_err(SessionError::Log)?;
            }
        }
    }

    Ok(())
}
