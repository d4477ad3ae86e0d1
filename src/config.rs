//! Session settings and the optional configuration file.
//!
//! Settings are resolved once at startup and never change while a session
//! runs: built-in defaults first, then `~/.rawterm/config.toml` when one
//! exists, then command-line flags. The resolved [`Settings`] value is
//! handed to the session and read from there on.
//!
//! # Configuration File
//!
//! Every key is optional:
//!
//! ```toml
//! # Log annotations for non-printable bytes
//! decimal_codes = true
//! symbolic_codes = true
//!
//! # Display
//! show_all_bytes = false
//! interpret_ansi = false
//! local_echo = true
//!
//! # Session log
//! logging = true
//! log_file = "rawterm.log"
//! ```

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::warn;

/// Default session log file name.
pub const DEFAULT_LOG_FILE: &str = "rawterm.log";

/// Resolved per-session settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Annotate logged control bytes with their decimal value.
    pub decimal_codes: bool,
    /// Annotate control bytes with their ASCII mnemonic.
    pub symbolic_codes: bool,
    /// Pass every byte to the screen, control bytes included.
    pub show_all_bytes: bool,
    /// Pass ESC through so the terminal interprets ANSI sequences.
    pub interpret_ansi: bool,
    /// Record the session to the log file.
    pub logging: bool,
    /// Echo typed keys locally.
    pub local_echo: bool,
    /// Session log path.
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            decimal_codes: true,
            symbolic_codes: true,
            show_all_bytes: false,
            interpret_ansi: false,
            logging: true,
            local_echo: true,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Settings {
    /// Apply configuration file values over the current settings.
    pub fn merge_file(&mut self, file: &FileConfig) {
        if let Some(v) = file.decimal_codes {
            self.decimal_codes = v;
        }
        if let Some(v) = file.symbolic_codes {
            self.symbolic_codes = v;
        }
        if let Some(v) = file.show_all_bytes {
            self.show_all_bytes = v;
        }
        if let Some(v) = file.interpret_ansi {
            self.interpret_ansi = v;
        }
        if let Some(v) = file.logging {
            self.logging = v;
        }
        if let Some(v) = file.local_echo {
            self.local_echo = v;
        }
        if let Some(ref v) = file.log_file {
            self.log_file = v.clone();
        }
    }
}

/// On-disk configuration, `~/.rawterm/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub decimal_codes: Option<bool>,
    pub symbolic_codes: Option<bool>,
    pub show_all_bytes: Option<bool>,
    pub interpret_ansi: Option<bool>,
    pub logging: Option<bool>,
    pub local_echo: Option<bool>,
    pub log_file: Option<PathBuf>,
}

impl FileConfig {
    /// Load the configuration file if one exists.
    ///
    /// A missing file is normal. A malformed one is reported and ignored
    /// rather than blocking the session.
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                match fs::read_to_string(&path) {
                    Ok(content) => match toml::from_str(&content) {
                        Ok(config) => return config,
                        Err(e) => warn!("Ignoring malformed {}: {}", path.display(), e),
                    },
                    Err(e) => warn!("Could not read {}: {}", path.display(), e),
                }
            }
        }
        Self::default()
    }

    /// Configuration file path.
    fn config_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".rawterm").join("config.toml"))
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
