//! Protocol module containing message types and the binary codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_message, encode_key_event, encode_message, encode_screen_request, ProtocolError};
pub use messages::*;
