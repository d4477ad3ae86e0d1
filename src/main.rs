//! rawterm - a raw TCP terminal
//!
//! rawterm connects a raw-mode keyboard to a TCP socket and relays bytes
//! both ways, unfiltered. Non-printable bytes coming back from the remote
//! end are classified instead of handed to the terminal emulator: the
//! screen shows their mnemonics, and a session log records every byte
//! with optional annotations, flushed as it arrives.
//!
//! # Quick Start
//!
//! ```text
//! rawterm bbs.example.net 23       # defaults: annotate + log
//! rawterm -d -c host 9100          # no annotations, plain relay
//! rawterm -a -l 10.0.0.5 7000     # let ANSI through, skip the log
//! ```
//!
//! Ctrl+] closes the session from the local side. Every other key,
//! Ctrl+C included, goes to the remote end.
//!
//! # Flags
//!
//! | Flag | Effect |
//! |------|--------|
//! | -d | decimal log annotations off |
//! | -c | symbolic annotations off |
//! | -s | show-all-bytes off |
//! | -a | pass ANSI escapes to the screen |
//! | -l | session logging off |
//! | -o\<file\> | log file (default rawterm.log) |

mod config;
mod core;
mod ui;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::{FileConfig, Settings};
use crate::core::connection::Connection;
use crate::core::log::LogSink;
use crate::core::session::{Session, SessionEnd};
use crate::ui::{RawModeGuard, Screen};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How long a connect may take before it is reported as failed.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Parsed command line.
struct Args {
    server: String,
    port: String,
    decimal_off: bool,
    symbolic_off: bool,
    show_all_off: bool,
    ansi_on: bool,
    logging_off: bool,
    log_file: Option<PathBuf>,
}

impl Args {
    /// Fold the flags into the session settings. Flags win over the
    /// configuration file, and every flag except -a and -o disables
    /// something.
    fn apply(&self, settings: &mut Settings) {
        if self.decimal_off {
            settings.decimal_codes = false;
        }
        if self.symbolic_off {
            settings.symbolic_codes = false;
        }
        if self.show_all_off {
            settings.show_all_bytes = false;
        }
        if self.ansi_on {
            settings.interpret_ansi = true;
        }
        if self.logging_off {
            settings.logging = false;
        }
        if let Some(ref path) = self.log_file {
            settings.log_file = path.clone();
        }
    }
}

fn print_version() {
    eprintln!("rawterm {}", VERSION);
}

fn print_help() {
    eprintln!("rawterm {} - an unobstructed telnet terminal", VERSION);
    eprintln!();
    eprintln!("Usage: rawterm [options] <server> <port>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -d              ASCII decimal codes OFF");
    eprintln!("  -c              ASCII key codes OFF");
    eprintln!("  -s              display non-screen chars ON");
    eprintln!("  -a              interpret ANSI ON");
    eprintln!("  -l              log file OFF");
    eprintln!("  -o<filename>    output file, default <rawterm.log>");
    eprintln!("  -v, --version   show version");
    eprintln!("      --help      display this help");
    eprintln!();
    eprintln!("Ctrl+] closes the session; every other key reaches the remote end.");
    eprintln!();
    eprintln!("Configuration: ~/.rawterm/config.toml");
}

fn parse_args() -> Result<Args, String> {
    let argv: Vec<String> = env::args().skip(1).collect();
    parse_arg_list(&argv)
}

/// Parse flags getopt-style: clustered shorts, `-o` with an attached or
/// separate value, `--` ending flag processing, and flags permitted after
/// the positionals.
fn parse_arg_list(argv: &[String]) -> Result<Args, String> {
    let mut positionals: Vec<String> = Vec::new();
    let mut decimal_off = false;
    let mut symbolic_off = false;
    let mut show_all_off = false;
    let mut ansi_on = false;
    let mut logging_off = false;
    let mut log_file: Option<PathBuf> = None;

    let mut i = 0;
    while i < argv.len() {
        let arg = &argv[i];
        match arg.as_str() {
            "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "--" => {
                positionals.extend(argv[i + 1..].iter().cloned());
                break;
            }
            _ if arg.starts_with("--") => {
                return Err(format!("unknown option {}", arg));
            }
            _ if arg.starts_with('-') && arg.len() > 1 => {
                // A cluster of short flags, e.g. -dcl or -odump.log
                let mut chars = arg[1..].chars();
                while let Some(flag) = chars.next() {
                    match flag {
                        'd' => decimal_off = true,
                        'c' => symbolic_off = true,
                        's' => show_all_off = true,
                        'a' => ansi_on = true,
                        'l' => logging_off = true,
                        'o' => {
                            let rest: String = chars.by_ref().collect();
                            let value = if !rest.is_empty() {
                                rest
                            } else {
                                i += 1;
                                argv.get(i)
                                    .cloned()
                                    .ok_or_else(|| "option -o requires a filename".to_string())?
                            };
                            log_file = Some(PathBuf::from(value));
                        }
                        other => {
                            return Err(format!("unknown option -{}", other));
                        }
                    }
                }
            }
            _ => positionals.push(arg.clone()),
        }
        i += 1;
    }

    if positionals.len() != 2 {
        return Err(format!(
            "expected <server> <port>, got {} argument(s)",
            positionals.len()
        ));
    }

    let port = positionals.pop().unwrap_or_default();
    let server = positionals.pop().unwrap_or_default();

    Ok(Args {
        server,
        port,
        decimal_off,
        symbolic_off,
        show_all_off,
        ansi_on,
        logging_off,
        log_file,
    })
}

/// Route diagnostics to a file; the terminal itself belongs to the session.
fn init_tracing() {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from);

    let log_path = home
        .map(|h| h.join(".rawterm").join("debug.log"))
        .unwrap_or_else(|| PathBuf::from("rawterm-debug.log"));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_help();
            std::process::exit(1);
        }
    };

    init_tracing();
    info!("rawterm {} starting", VERSION);

    let mut settings = Settings::default();
    settings.merge_file(&FileConfig::load());
    args.apply(&mut settings);

    run_session(&args, &settings)?;

    Ok(())
}

/// Bring the pieces up in the order the terminal changes hands: raw mode,
/// log sink, connection, then the loop. The raw-mode guard drops before
/// any error propagates out, so failures are reported on a sane terminal.
fn run_session(args: &Args, settings: &Settings) -> anyhow::Result<()> {
    let _raw = RawModeGuard::enable()?;

    let sink = if settings.logging {
        Some(LogSink::open(&settings.log_file)?)
    } else {
        None
    };

    let conn = Connection::open(&args.server, &args.port, CONNECT_TIMEOUT)?;

    let mut session = Session::new(conn, Screen::stdout(), sink, settings.clone());
    match session.run()? {
        SessionEnd::PeerClosed => info!("Session over, peer closed"),
        SessionEnd::LocalClose => info!("Session over, closed locally"),
    }

    Ok(())
}
