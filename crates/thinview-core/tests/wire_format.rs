//! Integration tests for the thinview-core public API.
//!
//! These tests drive the key translator and the codec together the way the
//! client's input forwarder and frame pipeline do, and check the exact bytes
//! a server would see.

use thinview_core::{
    decode_message, encode_key_event, encode_message, encode_screen_request, Delivery,
    FrameBuffer, KeyMapper, Size, TokenIssuer, WireMessage,
};

#[test]
fn test_host_key_a_down_produces_expected_frame() {
    // Arrange
    let keysym = KeyMapper::translate(65);

    // Act
    let frame = encode_key_event(true, keysym);

    // Assert
    assert_eq!(frame, [b'K', 1, 0x61, 0x00, 0, 0, 0, 0]);
}

#[test]
fn test_unmapped_key_still_encodes_with_zero_keysym() {
    let frame = encode_key_event(false, KeyMapper::translate(7));
    assert_eq!(frame, [b'K', 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn test_screen_request_describes_buffer_token_and_nonce() {
    // Arrange
    let mut issuer = TokenIssuer::new();
    let mut buffer = FrameBuffer::allocate(Size::new(800, 600), issuer.issue());
    let nonce = 0x0BAD_F00D_1234_5678u64;
    buffer.write_nonce(nonce);

    // Act
    let frame = encode_screen_request(
        buffer.size().width,
        buffer.size().height,
        buffer.token().handle(),
        nonce,
    );
    let (decoded, used) = decode_message(&frame).expect("decode must succeed");

    // Assert
    assert_eq!(used, 24);
    assert_eq!(
        decoded,
        WireMessage::ScreenRequest {
            width: 800,
            height: 600,
            delivery: Delivery::InBand,
            buffer_handle: buffer.token().handle(),
            nonce,
        }
    );
    assert_eq!(buffer.nonce_prefix(), nonce);
}

#[test]
fn test_encode_message_matches_specialised_encoders() {
    let key = WireMessage::KeyEvent { down: true, keysym: 0xFF51 };
    assert_eq!(encode_message(&key), encode_key_event(true, 0xFF51).to_vec());

    let screen = WireMessage::ScreenRequest {
        width: 2,
        height: 2,
        delivery: Delivery::InBand,
        buffer_handle: 9,
        nonce: 10,
    };
    assert_eq!(encode_message(&screen), encode_screen_request(2, 2, 9, 10).to_vec());
}
