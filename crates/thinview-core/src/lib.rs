//! # thinview-core
//!
//! Shared library for the thinview remote-framebuffer client containing the
//! wire codec, the host key code to keysym translation table, and the
//! frame-buffer domain types.
//!
//! It has zero dependencies on sockets, runtimes, or display APIs, so every
//! item here is a pure function or a plain value type.
//!
//! # Architecture overview (for beginners)
//!
//! thinview is a *thin client*: it connects to a framebuffer server, asks it
//! to paint the screen into a local pixel buffer, shows that buffer, and
//! forwards keyboard input back to the server.
//!
//! - **`protocol`** – The two fixed-size client→server frames (`'K'` key
//!   events and `'S'` screen requests) and their little-endian layouts.
//!
//! - **`keymap`** – Translation from the host's numeric key codes (the legacy
//!   DOM `keyCode` numbering) to X11-style keysyms, which is what travels on
//!   the wire.
//!
//! - **`domain`** – The frame buffer with its ownership token and fill cursor,
//!   and the moving-average frame-rate estimator.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::fps::FpsEstimator;
pub use domain::frame::{BufferToken, FillCursor, FrameBuffer, Size, TokenIssuer, BYTES_PER_PIXEL};
pub use keymap::KeyMapper;
pub use protocol::codec::{
    decode_message, encode_key_event, encode_message, encode_screen_request, ProtocolError,
};
pub use protocol::messages::{Delivery, WireMessage};
