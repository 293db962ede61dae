//! Host key code to X11 keysym translation table.
//!
//! Host key codes use the legacy DOM `KeyboardEvent.keyCode` numbering
//! (see <http://unixpapa.com/js/key.html>).  Codes are `u32` because hosts
//! deliver them that way, but every mapped code fits in one byte.
//!
//! # How this table works
//!
//! Four contiguous ranges (letters, digits, keypad digits, F1–F12) map by a
//! linear offset and are checked first.  Everything else goes through
//! `EXACT_TABLE`, a compile-time array of 256 keysyms indexed by key code.
//! Unmapped positions hold [`XK_VOID_SYMBOL`].

use super::keysym::*;

/// Translates a host key code to its keysym.
///
/// Returns [`XK_VOID_SYMBOL`] (0) for any code without a mapping.
///
/// # Panics
///
/// This function never panics; all `u32` inputs are handled.
pub fn keycode_to_keysym(code: u32) -> u16 {
    match code {
        // 'A'..'Z' → lowercase ASCII
        65..=90 => (code + 32) as u16,
        // '0'..'9' → ASCII
        48..=57 => (code - 48) as u16 + XK_0,
        // KP_0..KP_9
        96..=105 => (code - 96) as u16 + XK_KP_0,
        // F1..F12
        112..=123 => (code - 112) as u16 + XK_F1,
        0..=255 => EXACT_TABLE[code as usize],
        _ => XK_VOID_SYMBOL,
    }
}

const EXACT_TABLE: [u16; 256] = {
    let mut t = [XK_VOID_SYMBOL; 256];

    // ── Editing and control ───────────────────────────────────────────────────
    t[8] = XK_BACKSPACE;
    t[9] = XK_TAB;
    t[12] = XK_KP_BEGIN; // keypad 5 with Num Lock off
    t[13] = XK_CARRIAGE_RETURN;
    t[19] = XK_PAUSE;
    t[27] = XK_ESCAPE;
    t[32] = XK_SPACE;
    t[42] = XK_PRINT;
    t[45] = XK_INSERT;
    t[46] = XK_DELETE;

    // ── Modifiers ─────────────────────────────────────────────────────────────
    t[16] = XK_SHIFT_L;
    t[17] = XK_CONTROL_L;
    t[18] = XK_ALT_L;
    t[20] = XK_CAPS_LOCK;
    t[91] = XK_SUPER_L;

    // ── Navigation ────────────────────────────────────────────────────────────
    t[33] = XK_PAGE_UP;
    t[34] = XK_PAGE_DOWN;
    t[35] = XK_END;
    t[36] = XK_HOME;
    t[37] = XK_LEFT;
    t[38] = XK_UP;
    t[39] = XK_RIGHT;
    t[40] = XK_DOWN;

    // ── Keypad operators and locks ────────────────────────────────────────────
    t[106] = XK_KP_MULTIPLY;
    t[107] = XK_KP_ADD;
    t[109] = XK_KP_SUBTRACT;
    t[110] = XK_KP_DECIMAL;
    t[111] = XK_KP_DIVIDE;
    t[144] = XK_NUM_LOCK;
    t[145] = XK_SCROLL_LOCK;

    // ── OEM punctuation ───────────────────────────────────────────────────────
    t[186] = XK_SEMICOLON;
    t[187] = XK_EQUAL;
    t[188] = XK_COMMA;
    t[189] = XK_MINUS;
    t[190] = XK_PERIOD;
    t[191] = XK_SLASH;
    t[192] = XK_GRAVE;
    t[219] = XK_BRACKETLEFT;
    t[220] = XK_BACKSLASH;
    t[221] = XK_BRACKETRIGHT;
    t[222] = XK_APOSTROPHE;

    t
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_a_maps_to_lowercase_ascii() {
        assert_eq!(keycode_to_keysym(65), 0x61);
    }

    #[test]
    fn test_all_letters_map_to_lowercase_range() {
        for code in 65u32..=90 {
            let sym = keycode_to_keysym(code);
            assert!(
                (0x61..=0x7A).contains(&sym),
                "code {code} must map into 0x61..=0x7A, got 0x{sym:04X}"
            );
        }
        assert_eq!(keycode_to_keysym(90), 0x7A);
    }

    #[test]
    fn test_digits_map_to_ascii_digits() {
        for code in 48u32..=57 {
            assert_eq!(keycode_to_keysym(code), code as u16);
        }
    }

    #[test]
    fn test_keypad_digits_map_to_kp_range() {
        assert_eq!(keycode_to_keysym(96), 0xFFB0);
        assert_eq!(keycode_to_keysym(105), 0xFFB9);
    }

    #[test]
    fn test_function_keys_map_to_f_range() {
        assert_eq!(keycode_to_keysym(112), 0xFFBE);
        assert_eq!(keycode_to_keysym(123), 0xFFC9);
    }

    #[test]
    fn test_enter_maps_to_carriage_return() {
        assert_eq!(keycode_to_keysym(13), 0x000D);
    }

    #[test]
    fn test_left_arrow_maps_to_xk_left() {
        assert_eq!(keycode_to_keysym(37), 0xFF51);
    }

    #[test]
    fn test_modifiers_and_locks() {
        assert_eq!(keycode_to_keysym(16), 0xFFE1);
        assert_eq!(keycode_to_keysym(17), 0xFFE3);
        assert_eq!(keycode_to_keysym(18), 0xFFE9);
        assert_eq!(keycode_to_keysym(20), 0xFFE5);
        assert_eq!(keycode_to_keysym(91), 0xFFEB);
        assert_eq!(keycode_to_keysym(144), 0xFF7F);
        assert_eq!(keycode_to_keysym(145), 0xFF14);
    }

    #[test]
    fn test_oem_punctuation() {
        let expected = [
            (186, b';'),
            (187, b'='),
            (188, b','),
            (189, b'-'),
            (190, b'.'),
            (191, b'/'),
            (192, b'`'),
            (219, b'['),
            (220, b'\\'),
            (221, b']'),
            (222, b'\''),
        ];
        for (code, ch) in expected {
            assert_eq!(keycode_to_keysym(code), ch as u16, "code {code}");
        }
    }

    #[test]
    fn test_unmapped_codes_return_sentinel() {
        for code in [0u32, 1, 7, 10, 11, 14, 15, 21, 41, 47, 58, 64, 92, 108, 124, 255] {
            assert_eq!(keycode_to_keysym(code), 0, "code {code} must be unmapped");
        }
    }

    #[test]
    fn test_codes_above_one_byte_return_sentinel() {
        assert_eq!(keycode_to_keysym(256), 0);
        assert_eq!(keycode_to_keysym(0x1_0041), 0);
        assert_eq!(keycode_to_keysym(u32::MAX), 0);
    }

    #[test]
    fn test_translation_is_stable_across_calls() {
        for code in 0u32..=300 {
            assert_eq!(keycode_to_keysym(code), keycode_to_keysym(code));
        }
    }
}
