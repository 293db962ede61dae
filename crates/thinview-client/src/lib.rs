//! thinview-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does thinview-client do? (for beginners)
//!
//! The client is the viewer side of a remote framebuffer.  It:
//!
//! 1. Resolves and connects to the framebuffer server over TCP.
//! 2. Allocates a pixel buffer the size of the local view and sends a
//!    24-byte `'S'` screen request describing it.
//! 3. Reads the server's `width * height * 4` pixel bytes into the buffer.
//! 4. Hands the buffer to the display host, waits for the flush (vsync)
//!    completion, and starts the next frame.
//! 5. Translates local key presses to keysyms and sends them as 8-byte
//!    `'K'` frames.
//!
//! While the server is unreachable the display keeps running on placeholder
//! frames.

/// Application layer: the connection state machine, frame pipeline, input
/// forwarding, and the controller that wires them together.
pub mod application;

/// Infrastructure layer: Tokio sockets, the headless display, stdin input,
/// nonce generation, and configuration storage.
pub mod infrastructure;
