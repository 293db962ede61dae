//! Domain types with no I/O: frame buffers and frame-rate estimation.

pub mod fps;
pub mod frame;

pub use fps::FpsEstimator;
pub use frame::{BufferToken, FillCursor, FrameBuffer, Size, TokenIssuer, BYTES_PER_PIXEL};
