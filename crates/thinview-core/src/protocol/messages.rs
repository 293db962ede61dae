//! All thinview wire message types.
//!
//! The protocol has no header, version byte, or length prefix: every
//! client→server message is a fixed-size frame identified by its first byte.
//! Multi-byte integers are little-endian.
//!
//! ```text
//! KeyEvent       (8 bytes):  ['K'][down:1][keysym:2][pad:4]
//! ScreenRequest (24 bytes):  ['S'][width:2][height:2][delivery:1][pad:2]
//!                            [buffer_handle:8][nonce:8]
//! ```
//!
//! The server never sends control messages back.  Its only output is raw
//! pixel bytes (`width * height * 4` per screen request) or a stream close.

use serde::{Deserialize, Serialize};

/// Tag byte of a [`WireMessage::KeyEvent`] frame.
pub const KEY_EVENT_TAG: u8 = b'K';

/// Tag byte of a [`WireMessage::ScreenRequest`] frame.
pub const SCREEN_REQUEST_TAG: u8 = b'S';

/// Encoded size of a key event frame in bytes.
pub const KEY_EVENT_LEN: usize = 8;

/// Encoded size of a screen request frame in bytes.
pub const SCREEN_REQUEST_LEN: usize = 24;

/// How the server should deliver the pixels for a screen request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Delivery {
    /// Raw pixel bytes follow on the same stream.
    InBand = 0x00,
    /// Pixels are written into a shared-memory segment named by the buffer handle.
    SharedMemory = 0x01,
}

impl TryFrom<u8> for Delivery {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Delivery::InBand),
            0x01 => Ok(Delivery::SharedMemory),
            _ => Err(()),
        }
    }
}

/// A client→server protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireMessage {
    /// A key was pressed (`down == true`) or released.
    KeyEvent { down: bool, keysym: u16 },
    /// Asks the server to paint one full frame into the identified buffer.
    ScreenRequest {
        width: u16,
        height: u16,
        delivery: Delivery,
        /// Opaque handle naming the destination buffer (a generation token,
        /// never a memory address).
        buffer_handle: u64,
        /// Random value also written into the first bytes of the buffer.
        nonce: u64,
    },
}

impl WireMessage {
    /// Returns the tag byte this message is encoded with.
    pub fn tag(&self) -> u8 {
        match self {
            WireMessage::KeyEvent { .. } => KEY_EVENT_TAG,
            WireMessage::ScreenRequest { .. } => SCREEN_REQUEST_TAG,
        }
    }

    /// Returns the fixed encoded length of this message.
    pub fn encoded_len(&self) -> usize {
        match self {
            WireMessage::KeyEvent { .. } => KEY_EVENT_LEN,
            WireMessage::ScreenRequest { .. } => SCREEN_REQUEST_LEN,
        }
    }
}
