//! ASCII control code names.
//!
//! The C0 range (0-31) plus DEL (127) are the bytes a session cannot
//! safely print. Each one has a short mnemonic used for screen and log
//! annotations.

/// Mnemonics for bytes 0-31 in order, with DEL last.
pub const CONTROL_CODES: [&str; 33] = [
    "NUL", "SOH", "STX", "ETX", "EOT", "ENQ", "ACK", "BEL", "BS", "HT", "LF",
    "VT", "FF", "CR", "SO", "SI", "DLE", "DC1", "DC2", "DC3", "DC4", "NAK",
    "SYN", "ETB", "CAN", "EM", "SUB", "ESC", "FS", "GS", "RS", "US", "DEL",
];

/// Look up the mnemonic for a control byte.
///
/// Returns `None` for printable bytes and for bytes above 127, which have
/// no mnemonic.
pub fn name_of(byte: u8) -> Option<&'static str> {
    match byte {
        0..=31 => Some(CONTROL_CODES[byte as usize]),
        127 => Some("DEL"),
        _ => None,
    }
}
