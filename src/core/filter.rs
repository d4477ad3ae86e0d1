//! Byte classification for screen display and session logging.
//!
//! Every byte received from the remote end passes through [`apply`],
//! which decides independently what the screen shows and what the log
//! records. The decision depends only on the byte and the session
//! [`Settings`], so the whole pipeline is a pure function.
//!
//! Classification rules:
//!
//! - Printable means `31 < byte < 127`. Everything else, bytes 128-255
//!   included, counts as non-printable.
//! - The screen annotates non-printable bytes that have a mnemonic, when
//!   symbolic codes are on. The annotation never replaces the raw byte;
//!   when both apply, the annotation comes first.
//! - A newline always passes to the screen raw, ESC passes when ANSI
//!   interpretation is on, and `show_all_bytes` passes everything.
//! - The log records every byte raw. Non-printable bytes get at most one
//!   annotation ahead of the raw byte, chosen by the decimal and symbolic
//!   flags. The newline and ESC screen overrides do not change what the
//!   log records.

use crate::config::Settings;
use crate::core::codes;

const NL: u8 = b'\n';
const ESC: u8 = 0x1B;

/// What the screen does with a received byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayAction {
    /// Nothing reaches the screen.
    Suppress,
    /// The raw byte, as-is.
    ShowRaw,
    /// The bracketed mnemonic alone.
    ShowSymbolic(&'static str),
    /// The bracketed mnemonic, then the raw byte.
    ShowSymbolicRaw(&'static str),
}

/// What the log records for a received byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogAction {
    /// Logging is off.
    None,
    /// The raw byte alone.
    WriteRaw(u8),
    /// An annotation, then the raw byte.
    WriteFormatted(String, u8),
}

/// Combined outcome for one received byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actions {
    pub display: DisplayAction,
    pub log: LogAction,
}

/// True for bytes that render as themselves on any terminal.
pub fn is_printable(byte: u8) -> bool {
    byte > 31 && byte < 127
}

/// Classify one received byte against the session settings.
pub fn apply(byte: u8, settings: &Settings) -> Actions {
    let printable = is_printable(byte);
    let name = if printable { None } else { codes::name_of(byte) };

    // Raw pass-through to the screen
    let echo = printable
        || byte == NL
        || (settings.interpret_ansi && byte == ESC)
        || settings.show_all_bytes;

    let display = match name {
        Some(n) if settings.symbolic_codes => {
            if echo {
                DisplayAction::ShowSymbolicRaw(n)
            } else {
                DisplayAction::ShowSymbolic(n)
            }
        }
        _ => {
            if echo {
                DisplayAction::ShowRaw
            } else {
                DisplayAction::Suppress
            }
        }
    };

    let log = if !settings.logging {
        LogAction::None
    } else if printable {
        LogAction::WriteRaw(byte)
    } else {
        match annotation(byte, name, settings) {
            Some(text) => LogAction::WriteFormatted(text, byte),
            None => LogAction::WriteRaw(byte),
        }
    };

    Actions { display, log }
}

/// Log annotation for a non-printable byte, if the flags call for one.
///
/// Bytes without a mnemonic can only be annotated by decimal value.
fn annotation(byte: u8, name: Option<&'static str>, settings: &Settings) -> Option<String> {
    match (settings.decimal_codes, settings.symbolic_codes, name) {
        (true, true, Some(n)) => Some(format!("[{}.{}]", byte, n)),
        (true, _, _) => Some(format!("[{}]", byte)),
        (false, true, Some(n)) => Some(format!("[{}]", n)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Settings {
        Settings::default()
    }

    #[test]
    fn test_printable_range_passes_through_unannotated() {
        for byte in 32u8..=126 {
            let actions = apply(byte, &defaults());
            assert_eq!(actions.display, DisplayAction::ShowRaw, "byte {}", byte);
            assert_eq!(actions.log, LogAction::WriteRaw(byte), "byte {}", byte);
        }

        // Boundary bytes: 31 and 127 sit just outside
        assert_ne!(apply(31, &defaults()).display, DisplayAction::ShowRaw);
        assert_ne!(apply(127, &defaults()).display, DisplayAction::ShowRaw);
    }

    #[test]
    fn test_same_byte_same_actions() {
        // No hidden state: the decision is a function of byte and settings
        let settings = defaults();
        for byte in [0u8, 7, b'\n', 0x1B, b'A', 127, 200] {
            assert_eq!(apply(byte, &settings), apply(byte, &settings));
        }
    }

    #[test]
    fn test_control_byte_annotated_not_echoed() {
        let actions = apply(7, &defaults());
        assert_eq!(actions.display, DisplayAction::ShowSymbolic("BEL"));
        assert_eq!(
            actions.log,
            LogAction::WriteFormatted("[7.BEL]".to_string(), 7)
        );
    }

    #[test]
    fn test_newline_always_shown_raw() {
        let actions = apply(b'\n', &defaults());
        assert_eq!(actions.display, DisplayAction::ShowSymbolicRaw("LF"));
        assert_eq!(
            actions.log,
            LogAction::WriteFormatted("[10.LF]".to_string(), b'\n')
        );

        // Still shown when annotations are off, and logged raw-only
        let mut settings = defaults();
        settings.symbolic_codes = false;
        settings.decimal_codes = false;
        let actions = apply(b'\n', &settings);
        assert_eq!(actions.display, DisplayAction::ShowRaw);
        assert_eq!(actions.log, LogAction::WriteRaw(b'\n'));
    }

    #[test]
    fn test_esc_follows_ansi_flag() {
        let actions = apply(0x1B, &defaults());
        assert_eq!(actions.display, DisplayAction::ShowSymbolic("ESC"));

        let mut settings = defaults();
        settings.interpret_ansi = true;
        let actions = apply(0x1B, &settings);
        assert_eq!(actions.display, DisplayAction::ShowSymbolicRaw("ESC"));

        // The ANSI flag changes the screen, never the log
        assert_eq!(
            actions.log,
            LogAction::WriteFormatted("[27.ESC]".to_string(), 0x1B)
        );

        // Without the annotation flag the escape passes bare
        settings.symbolic_codes = false;
        assert_eq!(apply(0x1B, &settings).display, DisplayAction::ShowRaw);
    }

    #[test]
    fn test_show_all_bytes_passes_everything() {
        let mut settings = defaults();
        settings.show_all_bytes = true;
        assert_eq!(apply(7, &settings).display, DisplayAction::ShowSymbolicRaw("BEL"));
        assert_eq!(apply(0, &settings).display, DisplayAction::ShowSymbolicRaw("NUL"));

        settings.symbolic_codes = false;
        assert_eq!(apply(7, &settings).display, DisplayAction::ShowRaw);
    }

    #[test]
    fn test_symbolic_off_suppresses_annotation() {
        let mut settings = defaults();
        settings.symbolic_codes = false;
        let actions = apply(7, &settings);
        assert_eq!(actions.display, DisplayAction::Suppress);
        assert_eq!(actions.log, LogAction::WriteFormatted("[7]".to_string(), 7));

        // Nothing at all reaches the screen for a bare control byte
        assert_eq!(apply(1, &settings).display, DisplayAction::Suppress);
    }

    #[test]
    fn test_log_annotation_matrix() {
        let mut settings = defaults();

        // decimal on, symbolic on
        assert_eq!(
            apply(13, &settings).log,
            LogAction::WriteFormatted("[13.CR]".to_string(), 13)
        );

        // decimal off, symbolic on
        settings.decimal_codes = false;
        assert_eq!(
            apply(13, &settings).log,
            LogAction::WriteFormatted("[CR]".to_string(), 13)
        );

        // decimal off, symbolic off: raw byte only
        settings.symbolic_codes = false;
        assert_eq!(apply(13, &settings).log, LogAction::WriteRaw(13));

        // decimal on, symbolic off
        settings.decimal_codes = true;
        assert_eq!(
            apply(13, &settings).log,
            LogAction::WriteFormatted("[13]".to_string(), 13)
        );
    }

    #[test]
    fn test_logging_off_records_nothing() {
        let mut settings = defaults();
        settings.logging = false;
        assert_eq!(apply(b'A', &settings).log, LogAction::None);
        assert_eq!(apply(7, &settings).log, LogAction::None);
    }

    #[test]
    fn test_high_bytes_have_decimal_annotations_only() {
        let actions = apply(200, &defaults());
        assert_eq!(actions.display, DisplayAction::Suppress);
        assert_eq!(
            actions.log,
            LogAction::WriteFormatted("[200]".to_string(), 200)
        );

        // Symbolic-only annotation has nothing to say about them
        let mut settings = defaults();
        settings.decimal_codes = false;
        assert_eq!(apply(200, &settings).log, LogAction::WriteRaw(200));

        // show_all_bytes still passes them to the screen raw
        settings.show_all_bytes = true;
        assert_eq!(apply(200, &settings).display, DisplayAction::ShowRaw);
    }

    #[test]
    fn test_del_annotated_as_del() {
        let actions = apply(127, &defaults());
        assert_eq!(actions.display, DisplayAction::ShowSymbolic("DEL"));
        assert_eq!(
            actions.log,
            LogAction::WriteFormatted("[127.DEL]".to_string(), 127)
        );
    }
}
