//! Terminal-side input and output.
//!
//! - **keymapper**: key events to wire bytes
//! - **screen**: raw-mode guard and the received-byte display

pub mod keymapper;
pub mod screen;

pub use keymapper::KeyEncoder;
pub use screen::{RawModeGuard, Screen};
