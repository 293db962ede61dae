//! X11 keysym values used on the wire.
//!
//! Values follow X11/keysymdef.h so a server backed by XTest can inject them
//! unchanged.
//!
//! # What is a keysym? (for beginners)
//!
//! A keysym names a *logical* key.  Printable Latin-1 keys use their ASCII
//! value (`XK_a` is 0x61), while function, editing, and modifier keys live in
//! the 0xFF00 page (`XK_Escape` is 0xFF1B).  Enter is the one exception: it
//! is sent as the ASCII carriage return 0x0D.  Letters are always sent in their
//! lowercase form; the server applies Shift itself.

pub const XK_VOID_SYMBOL: u16 = 0x0000;

// Latin-1
pub const XK_SPACE: u16 = 0x0020;
pub const XK_APOSTROPHE: u16 = 0x0027;
pub const XK_COMMA: u16 = 0x002C;
pub const XK_MINUS: u16 = 0x002D;
pub const XK_PERIOD: u16 = 0x002E;
pub const XK_SLASH: u16 = 0x002F;
pub const XK_0: u16 = 0x0030;
pub const XK_SEMICOLON: u16 = 0x003B;
pub const XK_EQUAL: u16 = 0x003D;
pub const XK_BRACKETLEFT: u16 = 0x005B;
pub const XK_BACKSLASH: u16 = 0x005C;
pub const XK_BRACKETRIGHT: u16 = 0x005D;
pub const XK_GRAVE: u16 = 0x0060;
pub const XK_A_LOWER: u16 = 0x0061;
/// Enter.  Sent as ASCII CR rather than `XK_Return` (0xFF0D).
pub const XK_CARRIAGE_RETURN: u16 = 0x000D;

// TTY function keys
pub const XK_BACKSPACE: u16 = 0xFF08;
pub const XK_TAB: u16 = 0xFF09;
pub const XK_PAUSE: u16 = 0xFF13;
pub const XK_SCROLL_LOCK: u16 = 0xFF14;
pub const XK_ESCAPE: u16 = 0xFF1B;
pub const XK_DELETE: u16 = 0xFFFF;

// Cursor control
pub const XK_HOME: u16 = 0xFF50;
pub const XK_LEFT: u16 = 0xFF51;
pub const XK_UP: u16 = 0xFF52;
pub const XK_RIGHT: u16 = 0xFF53;
pub const XK_DOWN: u16 = 0xFF54;
pub const XK_PAGE_UP: u16 = 0xFF55;
pub const XK_PAGE_DOWN: u16 = 0xFF56;
pub const XK_END: u16 = 0xFF57;

// Misc functions
pub const XK_PRINT: u16 = 0xFF61;
pub const XK_INSERT: u16 = 0xFF63;
pub const XK_NUM_LOCK: u16 = 0xFF7F;

// Keypad
pub const XK_KP_BEGIN: u16 = 0xFF9D;
pub const XK_KP_MULTIPLY: u16 = 0xFFAA;
pub const XK_KP_ADD: u16 = 0xFFAB;
pub const XK_KP_SUBTRACT: u16 = 0xFFAD;
pub const XK_KP_DECIMAL: u16 = 0xFFAE;
pub const XK_KP_DIVIDE: u16 = 0xFFAF;
pub const XK_KP_0: u16 = 0xFFB0;

// Function keys
pub const XK_F1: u16 = 0xFFBE;

// Modifiers
pub const XK_SHIFT_L: u16 = 0xFFE1;
pub const XK_CONTROL_L: u16 = 0xFFE3;
pub const XK_CAPS_LOCK: u16 = 0xFFE5;
pub const XK_ALT_L: u16 = 0xFFE9;
pub const XK_SUPER_L: u16 = 0xFFEB;
