//! Core session machinery.
//!
//! Everything between the keyboard and the wire lives here:
//!
//! - **codes**: ASCII control code names
//! - **filter**: per-byte display and log classification
//! - **connection**: nonblocking TCP client
//! - **log**: append-only session log
//! - **session**: the bridge loop tying them together
//!
//! # Architecture
//!
//! ```text
//! Session
//! ├── Connection (nonblocking TCP stream)
//! ├── Screen (raw-mode display)
//! └── LogSink (append-only, flush per byte)
//!         ▲
//!   filter::apply(byte, settings) decides what each one gets
//! ```

pub mod codes;
pub mod connection;
pub mod filter;
pub mod log;
pub mod session;
