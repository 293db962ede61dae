//! Binary codec for thinview protocol messages.
//!
//! Encoding is infallible: both frames have a fixed layout and every field
//! fits its slot.  Decoding exists for server-side tooling and tests; the
//! client itself never decodes anything but raw pixels.

use thiserror::Error;
use tracing::trace;

use crate::protocol::messages::{
    Delivery, WireMessage, KEY_EVENT_LEN, KEY_EVENT_TAG, SCREEN_REQUEST_LEN, SCREEN_REQUEST_TAG,
};

/// Errors that can occur while decoding a message.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the frame requires.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The first byte is not a known message tag.
    #[error("unknown message tag: 0x{0:02X}")]
    UnknownTag(u8),

    /// A field holds a value outside its defined range.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a key event frame.
///
/// # Examples
///
/// ```rust
/// use thinview_core::encode_key_event;
///
/// assert_eq!(encode_key_event(true, 0x61), [b'K', 1, 0x61, 0x00, 0, 0, 0, 0]);
/// ```
pub fn encode_key_event(down: bool, keysym: u16) -> [u8; KEY_EVENT_LEN] {
    let mut buf = [0u8; KEY_EVENT_LEN];
    buf[0] = KEY_EVENT_TAG;
    buf[1] = u8::from(down);
    buf[2..4].copy_from_slice(&keysym.to_le_bytes());
    // bytes 4..8 are padding
    buf
}

/// Encodes a screen request frame with in-band delivery.
///
/// # Examples
///
/// ```rust
/// use thinview_core::encode_screen_request;
///
/// let frame = encode_screen_request(800, 600, 7, 42);
/// assert_eq!(u16::from_le_bytes([frame[1], frame[2]]), 800);
/// assert_eq!(u16::from_le_bytes([frame[3], frame[4]]), 600);
/// ```
pub fn encode_screen_request(
    width: u16,
    height: u16,
    buffer_handle: u64,
    nonce: u64,
) -> [u8; SCREEN_REQUEST_LEN] {
    encode_screen_request_with(width, height, Delivery::InBand, buffer_handle, nonce)
}

/// Encodes any [`WireMessage`] into its fixed-size frame.
pub fn encode_message(msg: &WireMessage) -> Vec<u8> {
    match *msg {
        WireMessage::KeyEvent { down, keysym } => encode_key_event(down, keysym).to_vec(),
        WireMessage::ScreenRequest {
            width,
            height,
            delivery,
            buffer_handle,
            nonce,
        } => encode_screen_request_with(width, height, delivery, buffer_handle, nonce).to_vec(),
    }
}

/// Decodes one [`WireMessage`] from the beginning of `bytes`.
///
/// Returns the message and the number of bytes consumed so a server can
/// advance through a stream of back-to-back frames.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the slice is empty, truncated, carries an
/// unknown tag, or holds an out-of-range field.
pub fn decode_message(bytes: &[u8]) -> Result<(WireMessage, usize), ProtocolError> {
    let tag = *bytes.first().ok_or(ProtocolError::InsufficientData {
        needed: 1,
        available: 0,
    })?;

    match tag {
        KEY_EVENT_TAG => {
            require_len(bytes, KEY_EVENT_LEN)?;
            let down = match bytes[1] {
                0 => false,
                1 => true,
                other => {
                    return Err(ProtocolError::MalformedPayload(format!(
                        "key event down flag must be 0 or 1, got {other}"
                    )))
                }
            };
            let keysym = u16::from_le_bytes([bytes[2], bytes[3]]);
            Ok((WireMessage::KeyEvent { down, keysym }, KEY_EVENT_LEN))
        }
        SCREEN_REQUEST_TAG => {
            require_len(bytes, SCREEN_REQUEST_LEN)?;
            let width = u16::from_le_bytes([bytes[1], bytes[2]]);
            let height = u16::from_le_bytes([bytes[3], bytes[4]]);
            let delivery = Delivery::try_from(bytes[5]).map_err(|_| {
                ProtocolError::MalformedPayload(format!("unknown delivery flag: {}", bytes[5]))
            })?;
            let buffer_handle = read_u64(bytes, 8);
            let nonce = read_u64(bytes, 16);
            Ok((
                WireMessage::ScreenRequest {
                    width,
                    height,
                    delivery,
                    buffer_handle,
                    nonce,
                },
                SCREEN_REQUEST_LEN,
            ))
        }
        other => {
            trace!("rejecting frame with tag 0x{other:02X}");
            Err(ProtocolError::UnknownTag(other))
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn encode_screen_request_with(
    width: u16,
    height: u16,
    delivery: Delivery,
    buffer_handle: u64,
    nonce: u64,
) -> [u8; SCREEN_REQUEST_LEN] {
    let mut buf = [0u8; SCREEN_REQUEST_LEN];
    buf[0] = SCREEN_REQUEST_TAG;
    buf[1..3].copy_from_slice(&width.to_le_bytes());
    buf[3..5].copy_from_slice(&height.to_le_bytes());
    buf[5] = delivery as u8;
    // bytes 6..8 are padding
    buf[8..16].copy_from_slice(&buffer_handle.to_le_bytes());
    buf[16..24].copy_from_slice(&nonce.to_le_bytes());
    buf
}

fn require_len(bytes: &[u8], needed: usize) -> Result<(), ProtocolError> {
    if bytes.len() < needed {
        return Err(ProtocolError::InsufficientData {
            needed,
            available: bytes.len(),
        });
    }
    Ok(())
}

/// Caller guarantees `bytes.len() >= offset + 8`.
fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(raw)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
