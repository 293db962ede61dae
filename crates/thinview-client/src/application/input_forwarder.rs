//! InputForwarder: keyboard events from the input source to the server.
//!
//! Each key event is translated to a keysym, encoded as an 8-byte `'K'`
//! frame, and handed to the connection manager.  Events are forwarded
//! whether or not the connection is up; a send that fails is logged and
//! dropped.  Pointer events are accepted and ignored.

use thinview_core::{encode_key_event, KeyMapper};
use tracing::debug;

use super::connection::ConnectionManager;
use super::diagnostics::{Diagnostics, LEVEL_EVENTS};

/// An event delivered by the input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Key pressed, with the host's numeric key code.
    KeyDown(u32),
    /// Key released.
    KeyUp(u32),
    /// Pointer moved.  Not forwarded.
    Pointer { x: i32, y: i32 },
}

pub struct InputForwarder {
    diag: Diagnostics,
    forwarded: u64,
    dropped: u64,
}

impl InputForwarder {
    pub fn new(diag: Diagnostics) -> Self {
        Self {
            diag,
            forwarded: 0,
            dropped: 0,
        }
    }

    /// Key events accepted by the connection manager.
    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }

    /// Key events the connection manager refused.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Dispatches one input event.  Returns the keysym sent for key events.
    pub fn handle(&mut self, conn: &mut ConnectionManager, event: InputEvent) -> Option<u16> {
        match event {
            InputEvent::KeyDown(code) => Some(self.on_key_event(conn, code, true)),
            InputEvent::KeyUp(code) => Some(self.on_key_event(conn, code, false)),
            InputEvent::Pointer { x, y } => {
                debug!("pointer at ({x}, {y}) not forwarded");
                None
            }
        }
    }

    /// Translates, encodes, and sends one key event.  Returns the keysym.
    pub fn on_key_event(&mut self, conn: &mut ConnectionManager, host_code: u32, is_down: bool) -> u16 {
        let keysym = KeyMapper::translate(host_code);
        let direction = if is_down { "DOWN" } else { "UP" };
        self.diag
            .post(LEVEL_EVENTS, format!("Key {direction}: {host_code:x} @ {keysym:x}"));
        let frame = encode_key_event(is_down, keysym);
        match conn.send(frame.to_vec()) {
            Ok(()) => self.forwarded += 1,
            Err(e) => {
                self.dropped += 1;
                debug!("key event {host_code} not sent: {e}");
            }
        }
        keysym
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::application::connection::Endpoint;
    use crate::infrastructure::display::mock::MockDisplayHost;
    use crate::infrastructure::network::mock::MockTransport;

    fn setup(connected: bool) -> (ConnectionManager, Arc<MockTransport>, Arc<MockDisplayHost>, InputForwarder) {
        let transport = Arc::new(MockTransport::new());
        let host = Arc::new(MockDisplayHost::new());
        let mut conn = ConnectionManager::new(Endpoint::new("127.0.0.1", 30002), transport.clone(), 64);
        if connected {
            conn.resolve().unwrap();
            conn.on_resolved(1, Ok("127.0.0.1:30002".parse().unwrap()))
                .unwrap();
            conn.on_connected(1, Ok(())).unwrap();
        }
        let forwarder = InputForwarder::new(Diagnostics::new(host.clone(), LEVEL_EVENTS));
        (conn, transport, host, forwarder)
    }

    #[test]
    fn test_key_down_a_sends_k_frame() {
        // Arrange
        let (mut conn, transport, host, mut fwd) = setup(true);

        // Act
        let keysym = fwd.on_key_event(&mut conn, 65, true);

        // Assert
        assert_eq!(keysym, 0x61);
        assert_eq!(transport.writes(), vec![vec![b'K', 1, 0x61, 0, 0, 0, 0, 0]]);
        assert_eq!(fwd.forwarded(), 1);
        assert!(host.diagnostics()[0].ends_with("Key DOWN: 41 @ 61"));
    }

    #[test]
    fn test_key_up_is_logged_and_sent() {
        let (mut conn, transport, host, mut fwd) = setup(true);
        fwd.handle(&mut conn, InputEvent::KeyUp(13));
        assert_eq!(transport.writes(), vec![vec![b'K', 0, 0x0d, 0x00, 0, 0, 0, 0]]);
        let messages = host.diagnostics();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].ends_with("Key UP: d @ d"), "{}", messages[0]);
    }

    #[test]
    fn test_key_while_disconnected_is_dropped_silently() {
        let (mut conn, transport, _host, mut fwd) = setup(false);
        let keysym = fwd.on_key_event(&mut conn, 37, true);
        assert_eq!(keysym, 0xff51);
        assert!(transport.writes().is_empty());
        assert_eq!(fwd.dropped(), 1);
    }

    #[test]
    fn test_pointer_events_are_not_forwarded() {
        let (mut conn, transport, _host, mut fwd) = setup(true);
        assert_eq!(fwd.handle(&mut conn, InputEvent::Pointer { x: 1, y: 2 }), None);
        assert!(transport.writes().is_empty());
    }

    #[test]
    fn test_unmapped_key_sends_zero_keysym() {
        let (mut conn, transport, _host, mut fwd) = setup(true);
        assert_eq!(fwd.on_key_event(&mut conn, 255, true), 0);
        assert_eq!(transport.writes()[0][2..4], [0, 0]);
    }
}
