//! Frame buffer, its ownership token, and the fill cursor.
//!
//! # Ownership model
//!
//! A [`FrameBuffer`] is a plain owned value.  The frame pipeline fills it and
//! then *moves* it into the display host to present it, so the compiler
//! rejects any later write through the pipeline's old binding.  A fresh
//! buffer with a new [`BufferToken`] is allocated for the next cycle.
//!
//! The token's generation is what travels on the wire as the buffer handle,
//! so a server answering a stale request can be told apart from one answering
//! the current request.

use serde::{Deserialize, Serialize};

/// Bytes per pixel of the single packed 32-bit pixel format.
pub const BYTES_PER_PIXEL: usize = 4;

/// Dimensions of a view, surface, or frame in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

impl Size {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Number of pixels (`width * height`).
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size in bytes of a frame with these dimensions.
    pub fn byte_len(&self) -> usize {
        self.pixel_count() * BYTES_PER_PIXEL
    }

    /// `true` if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Capability identifying one buffer instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferToken {
    generation: u64,
}

impl BufferToken {
    /// The generation counter this token was issued with.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The value sent as `buffer_handle` in a screen request.
    pub fn handle(&self) -> u64 {
        self.generation
    }
}

/// Issues strictly increasing [`BufferToken`]s, starting at generation 1.
#[derive(Debug, Default)]
pub struct TokenIssuer {
    last: u64,
}

impl TokenIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a token that has never been issued before by this issuer.
    pub fn issue(&mut self) -> BufferToken {
        self.last = self.last.wrapping_add(1);
        BufferToken {
            generation: self.last,
        }
    }
}

/// A `width * height * 4` byte pixel buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    token: BufferToken,
    size: Size,
    data: Vec<u8>,
}

impl FrameBuffer {
    /// Allocates a zero-filled buffer for a frame of `size`.
    pub fn allocate(size: Size, token: BufferToken) -> Self {
        Self {
            token,
            size,
            data: vec![0u8; size.byte_len()],
        }
    }

    pub fn token(&self) -> BufferToken {
        self.token
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Length of the pixel data in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Writes `nonce` little-endian into the first `min(8, len)` bytes.
    pub fn write_nonce(&mut self, nonce: u64) {
        let raw = nonce.to_le_bytes();
        let n = raw.len().min(self.data.len());
        self.data[..n].copy_from_slice(&raw[..n]);
    }

    /// Reads back the nonce prefix, zero-extended when the buffer is shorter
    /// than 8 bytes.
    pub fn nonce_prefix(&self) -> u64 {
        let mut raw = [0u8; 8];
        let n = raw.len().min(self.data.len());
        raw[..n].copy_from_slice(&self.data[..n]);
        u64::from_le_bytes(raw)
    }

    /// Paints every pixel with `pixel` in host byte order.
    pub fn fill_pixels(&mut self, pixel: u32) {
        let raw = pixel.to_ne_bytes();
        for chunk in self.data.chunks_exact_mut(BYTES_PER_PIXEL) {
            chunk.copy_from_slice(&raw);
        }
    }

    /// Copies as much of `chunk` as fits starting at `offset`.
    ///
    /// Returns the number of bytes copied; zero if `offset` is past the end.
    pub fn write_at(&mut self, offset: usize, chunk: &[u8]) -> usize {
        if offset >= self.data.len() {
            return 0;
        }
        let n = chunk.len().min(self.data.len() - offset);
        self.data[offset..offset + n].copy_from_slice(&chunk[..n]);
        n
    }
}

/// Tracks how many bytes of the current frame have been filled.
///
/// Never exceeds the capacity it was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillCursor {
    filled: usize,
    capacity: usize,
}

impl FillCursor {
    /// A cursor at offset 0 for a buffer of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            filled: 0,
            capacity,
        }
    }

    pub fn filled(&self) -> usize {
        self.filled
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.filled
    }

    pub fn is_complete(&self) -> bool {
        self.filled == self.capacity
    }

    /// Advances by `n` bytes, saturating at capacity.
    pub fn advance(&mut self, n: usize) {
        self.filled = self.filled.saturating_add(n).min(self.capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_byte_len_is_four_bytes_per_pixel() {
        assert_eq!(Size::new(2, 2).byte_len(), 16);
        assert_eq!(Size::new(800, 600).byte_len(), 1_920_000);
        assert_eq!(Size::new(0, 600).byte_len(), 0);
        assert!(Size::new(0, 600).is_empty());
    }

    #[test]
    fn test_token_issuer_is_strictly_increasing() {
        let mut issuer = TokenIssuer::new();
        let a = issuer.issue();
        let b = issuer.issue();
        assert_eq!(a.generation(), 1);
        assert!(b.generation() > a.generation());
        assert_ne!(a, b);
    }

    #[test]
    fn test_allocate_is_zero_filled() {
        let buf = FrameBuffer::allocate(Size::new(3, 2), TokenIssuer::new().issue());
        assert_eq!(buf.len(), 24);
        assert!(buf.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_nonce_occupies_first_eight_bytes() {
        let mut buf = FrameBuffer::allocate(Size::new(2, 2), TokenIssuer::new().issue());
        buf.write_nonce(0x1122_3344_5566_7788);
        assert_eq!(&buf.as_bytes()[..8], &0x1122_3344_5566_7788u64.to_le_bytes());
        assert!(buf.as_bytes()[8..].iter().all(|&b| b == 0));
        assert_eq!(buf.nonce_prefix(), 0x1122_3344_5566_7788);
    }

    #[test]
    fn test_write_nonce_truncates_on_single_pixel_buffer() {
        let mut buf = FrameBuffer::allocate(Size::new(1, 1), TokenIssuer::new().issue());
        buf.write_nonce(0x1122_3344_5566_7788);
        assert_eq!(buf.as_bytes(), &[0x88, 0x77, 0x66, 0x55]);
    }

    #[test]
    fn test_fill_pixels_writes_every_pixel() {
        let mut buf = FrameBuffer::allocate(Size::new(2, 2), TokenIssuer::new().issue());
        buf.fill_pixels(0xDEAD_BEEF);
        for px in buf.as_bytes().chunks_exact(4) {
            assert_eq!(px, &0xDEAD_BEEFu32.to_ne_bytes());
        }
    }

    #[test]
    fn test_write_at_clamps_to_end() {
        let mut buf = FrameBuffer::allocate(Size::new(1, 1), TokenIssuer::new().issue());
        assert_eq!(buf.write_at(2, &[9, 9, 9, 9]), 2);
        assert_eq!(buf.as_bytes(), &[0, 0, 9, 9]);
        assert_eq!(buf.write_at(4, &[1]), 0);
    }

    #[test]
    fn test_fill_cursor_never_exceeds_capacity() {
        let mut cursor = FillCursor::new(16);
        cursor.advance(10);
        assert_eq!(cursor.remaining(), 6);
        cursor.advance(100);
        assert_eq!(cursor.filled(), 16);
        assert!(cursor.is_complete());
        assert_eq!(cursor.remaining(), 0);
    }
}
