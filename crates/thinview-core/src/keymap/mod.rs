//! Key code translation for keyboard event forwarding.
//!
//! The host delivers keyboard events tagged with legacy DOM `keyCode` values.
//! The wire carries X11-style keysyms instead, so the server never has to know
//! which host produced the event.

pub mod host_keycode;
pub mod keysym;

/// Keysym returned for host key codes that have no mapping.
pub const NO_SYMBOL: u16 = keysym::XK_VOID_SYMBOL;

/// Unified key mapper used by the input forwarder.
pub struct KeyMapper;

impl KeyMapper {
    /// Translates a host key code to the keysym sent on the wire.
    ///
    /// Total: unmapped codes return [`NO_SYMBOL`] (0).
    pub fn translate(host_code: u32) -> u16 {
        host_keycode::keycode_to_keysym(host_code)
    }

    /// Returns `true` if `host_code` has a keysym mapping.
    pub fn is_mapped(host_code: u32) -> bool {
        Self::translate(host_code) != NO_SYMBOL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_delegates_to_host_keycode_table() {
        assert_eq!(KeyMapper::translate(65), keysym::XK_A_LOWER);
    }

    #[test]
    fn test_is_mapped_false_for_unknown_code() {
        assert!(!KeyMapper::is_mapped(0));
        assert!(!KeyMapper::is_mapped(255));
        assert!(KeyMapper::is_mapped(13));
    }
}
