//! Recording display host for tests.
//!
//! Nothing is drawn.  Created surfaces, presented frames, and diagnostic
//! messages are pushed into `Mutex<Vec<_>>` fields for assertions.  Flush
//! completions are not generated automatically; tests call
//! `on_flush_complete` (or send `ClientEvent::PresentComplete`) themselves.
//!
//! Set `fail_surfaces` to make `create_surface` return an error.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use thinview_core::{FrameBuffer, Size};

use crate::application::frame_pipeline::{DisplayHost, SurfaceError, SurfaceHandle};

#[derive(Default)]
pub struct MockDisplayHost {
    /// Sizes passed to `create_surface`, including refused ones.
    pub surfaces: Mutex<Vec<Size>>,
    /// Every presented frame together with its target surface.
    pub presented: Mutex<Vec<(SurfaceHandle, FrameBuffer)>>,
    /// Every diagnostic line, exactly as posted.
    pub messages: Mutex<Vec<String>>,
    /// When set, `create_surface` refuses every request.
    pub fail_surfaces: AtomicBool,
    next_id: AtomicU64,
}

impl MockDisplayHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented_count(&self) -> usize {
        self.presented.lock().unwrap().len()
    }

    /// Pixel bytes of every presented frame, oldest first.
    pub fn presented_bytes(&self) -> Vec<Vec<u8>> {
        self.presented
            .lock()
            .unwrap()
            .iter()
            .map(|(_, frame)| frame.as_bytes().to_vec())
            .collect()
    }

    pub fn last_presented_bytes(&self) -> Option<Vec<u8>> {
        self.presented_bytes().pop()
    }

    /// Token generations of every presented frame, oldest first.
    pub fn presented_generations(&self) -> Vec<u64> {
        self.presented
            .lock()
            .unwrap()
            .iter()
            .map(|(_, frame)| frame.token().generation())
            .collect()
    }

    pub fn diagnostics(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl DisplayHost for MockDisplayHost {
    fn create_surface(&self, size: Size) -> Result<SurfaceHandle, SurfaceError> {
        self.surfaces.lock().unwrap().push(size);
        if self.fail_surfaces.load(Ordering::SeqCst) {
            return Err(SurfaceError::Refused("mock configured to fail".into()));
        }
        if size.is_empty() {
            return Err(SurfaceError::InvalidSize(size));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SurfaceHandle { id, size })
    }

    fn present_whole_surface(&self, surface: SurfaceHandle, frame: FrameBuffer) {
        self.presented.lock().unwrap().push((surface, frame));
    }

    fn post_diagnostic_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
