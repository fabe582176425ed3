//! Scancode decoding for the dock keyboard.
//!
//! The EC reports keys as PS/2-style set-2 scancodes embedded in the status
//! vector, with optional extend (`0xE0`) and break (`0xF0`) prefixes starting
//! at byte 2. Decoding is stateless across notifications: the prefix flags
//! are reset for every vector.

use crate::status::StatusVector;

/// Extend prefix: the scancode refers to the extended table.
pub const EXTEND_PREFIX: u8 = 0xE0;
/// Break prefix: the key was released.
pub const BREAK_PREFIX: u8 = 0xF0;

/// Scancode-to-key table for the plain set. An entry of 0 means unmapped.
static KEYS: [u8; 128] = [
    /*      0    1    2    3    4    5    6    7    8    9    A    B    C    D    E    F */
    /* 0 */ 0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,  15,  41,   0,
    /* 1 */ 0,  56,  42,  93,  29,  16,   2,   0,   0,   0,  44,  31,  30,  17,   3,   0,
    /* 2 */ 0,  46,  45,  32,  18,   5,   4,   0,   0,  57,  47,  33,  20,  19,   6,   0,
    /* 3 */ 0,  49,  48,  35,  34,  21,   7,   0,   0,   0,  50,  36,  22,   8,   9,   0,
    /* 4 */ 0,  51,  37,  23,  24,  11,  10,   0,   0,  52,  53,  38,  39,  25,  12,   0,
    /* 5 */ 0,  89,  40,   0,  26,  13,   0,   0,  58,  54,  28,  27,   0,  43,   0,  85,
    /* 6 */ 0,  86,   0,   0,  92,   0,  14,  94,   0,   0, 124,   0,   0,   0,   0,   0,
    /* 7 */ 0,   0,   0,   0,   0,   0,   1,   0,   0,   0,   0,   0,   0,   0,   0,   0,
];

/// Scancode-to-key table for the extended (`0xE0`-prefixed) set.
static EXT_KEYS: [u8; 128] = [
    /*      0    1    2    3    4    5    6    7    8    9    A    B    C    D    E    F */
    /* 0 */ 0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
    /* 1 */ 0, 100,   0,   0,  97,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0, 125,
    /* 2 */ 0,   0,   0,   0,   0,   0,   0,  56,   0,   0,   0,   0,   0,   0,   0, 139,
    /* 3 */ 0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
    /* 4 */ 0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
    /* 5 */ 0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
    /* 6 */ 0,   0,   0,   0,   0,   0,   0,   0,   0, 107,   0, 105, 102,   0,   0,   0,
    /* 7 */ 0, 111, 108,   0, 106, 103,   0,   0,   0,   0, 109,   0,   0, 104,   0,   0,
];

/// Scancode-to-key table for the function-key row.
static F_KEYS: [u8; 24] = [
    /*      0    1    2    3    4    5    6    7    8    9    A    B    C    D    E    F */
    /* 0 */ 0, 111,  59,  60,  61,  62,  63,  64,  65,   0,   0,   0,   0,   0,   0,   0,
    /* 1 */ 66, 67,  68,  87,  88, 113, 114, 115,
];

/// A decoded key press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The logical key code.
    pub code: u8,
    /// `true` for press, `false` for release.
    pub down: bool,
}

/// Decodes a keyboard notification into at most one key event.
///
/// Returns `None` for unmapped or out-of-range scancodes; the hardware is
/// known to emit those spuriously.
pub fn decode_key(status: &StatusVector) -> Option<KeyEvent> {
    let mut extend = false;
    let mut down = true;
    let mut pos = 2;

    if status.byte(pos) == EXTEND_PREFIX {
        pos += 1;
        extend = true;
    }
    if status.byte(pos) == BREAK_PREFIX {
        pos += 1;
        down = false;
    }

    let mut scancode = status.byte(pos);

    // Two-key chords are reported as a single extended break whose real
    // released key sits at byte 6 of the same vector.
    if extend && !down && (scancode == 0x12 || scancode == 0x59) {
        down = true;
        scancode = status.byte(6);
    }

    let code = if (scancode as usize) < KEYS.len() {
        if extend {
            EXT_KEYS[scancode as usize]
        } else {
            KEYS[scancode as usize]
        }
    } else {
        0
    };

    if code == 0 {
        log::warn!("unknown scancode {scancode:#04x}");
        return None;
    }

    Some(KeyEvent { code, down })
}

/// Decodes a function-row notification into a logical key code.
///
/// Function-row keys have no break framing and no up-event from the
/// hardware; the caller reports a press immediately followed by a release.
pub fn decode_f_key(status: &StatusVector) -> Option<u8> {
    let scancode = status.byte(2);

    // The device sometimes sends a scancode 0 for no reason.
    if (scancode as usize) < F_KEYS.len() {
        let code = F_KEYS[scancode as usize];
        if code != 0 {
            return Some(code);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_status(bytes: &[u8]) -> StatusVector {
        let mut raw = [0u8; 8];
        raw[2..2 + bytes.len()].copy_from_slice(bytes);
        StatusVector(raw)
    }

    #[test]
    fn plain_scancode_is_a_press() {
        let ev = decode_key(&key_status(&[0x29])).unwrap();
        assert_eq!(ev, KeyEvent { code: 57, down: true });
    }

    #[test]
    fn break_prefix_is_a_release() {
        let ev = decode_key(&key_status(&[0xF0, 0x29])).unwrap();
        assert_eq!(ev, KeyEvent { code: 57, down: false });
    }

    #[test]
    fn extend_prefix_uses_the_extended_table() {
        let ev = decode_key(&key_status(&[0xE0, 0x75])).unwrap();
        assert_eq!(ev, KeyEvent { code: 103, down: true });
    }

    #[test]
    fn extended_break_is_a_release() {
        let ev = decode_key(&key_status(&[0xE0, 0xF0, 0x72])).unwrap();
        assert_eq!(ev, KeyEvent { code: 108, down: false });
    }

    #[test]
    fn every_mapped_plain_code_decodes_to_one_press() {
        for (scancode, &code) in KEYS.iter().enumerate() {
            let decoded = decode_key(&key_status(&[scancode as u8]));
            if code == 0 {
                assert_eq!(decoded, None, "scancode {scancode:#04x}");
            } else {
                assert_eq!(decoded, Some(KeyEvent { code, down: true }));
            }
        }
    }

    #[test]
    fn every_mapped_extended_code_decodes_to_one_release() {
        for (scancode, &code) in EXT_KEYS.iter().enumerate() {
            // 0x12 and 0x59 are chord codes and resolve through byte 6.
            if scancode == 0x12 || scancode == 0x59 {
                continue;
            }
            let decoded = decode_key(&key_status(&[0xE0, 0xF0, scancode as u8]));
            if code == 0 {
                assert_eq!(decoded, None, "scancode {scancode:#04x}");
            } else {
                assert_eq!(decoded, Some(KeyEvent { code, down: false }));
            }
        }
    }

    #[test]
    fn unmapped_scancode_yields_nothing() {
        assert_eq!(decode_key(&key_status(&[0x00])), None);
        assert_eq!(decode_key(&key_status(&[0x7F])), None);
    }

    #[test]
    fn chord_codes_resolve_through_byte_six() {
        for chord in [0x12u8, 0x59] {
            let mut raw = [0u8; 8];
            raw[2] = 0xE0;
            raw[3] = 0xF0;
            raw[4] = chord;
            raw[6] = 0x75;
            let ev = decode_key(&StatusVector(raw)).unwrap();
            // The event is for the key at byte 6, reported as a press.
            assert_eq!(ev, KeyEvent { code: 103, down: true });
        }
    }

    #[test]
    fn function_row_lookup() {
        assert_eq!(decode_f_key(&key_status(&[0x02])), Some(59));
        assert_eq!(decode_f_key(&key_status(&[0x17])), Some(115));
        // Zero and out-of-range codes are dropped.
        assert_eq!(decode_f_key(&key_status(&[0x00])), None);
        assert_eq!(decode_f_key(&key_status(&[0x18])), None);
        assert_eq!(decode_f_key(&key_status(&[0xFF])), None);
    }
}
