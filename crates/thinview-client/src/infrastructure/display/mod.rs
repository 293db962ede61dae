//! Display infrastructure.
//!
//! `HeadlessDisplay` is a [`DisplayHost`] without a window.  It keeps the most
//! recently presented frame in memory and simulates vsync: one refresh
//! interval after each present it sends `ClientEvent::PresentComplete`, which
//! paces the frame pipeline exactly as a real compositor would.
//!
//! Diagnostics are written to `tracing` under the `thinview::host` target.

pub mod mock;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use thinview_core::{FrameBuffer, Size};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::application::controller::ClientEvent;
use crate::application::frame_pipeline::{DisplayHost, SurfaceError, SurfaceHandle};

/// Refresh rate used when the configured one is zero.
pub const DEFAULT_REFRESH_HZ: u32 = 60;

/// A display host that renders nowhere.
pub struct HeadlessDisplay {
    events: mpsc::UnboundedSender<ClientEvent>,
    refresh_interval: Duration,
    next_surface_id: AtomicU64,
    presented: AtomicU64,
    latest: Mutex<Option<FrameBuffer>>,
}

impl HeadlessDisplay {
    /// Creates a headless host that completes presents at `refresh_hz`.
    pub fn new(events: mpsc::UnboundedSender<ClientEvent>, refresh_hz: u32) -> Self {
        let hz = if refresh_hz == 0 {
            DEFAULT_REFRESH_HZ
        } else {
            refresh_hz
        };
        Self {
            events,
            refresh_interval: Duration::from_secs(1) / hz,
            next_surface_id: AtomicU64::new(0),
            presented: AtomicU64::new(0),
            latest: Mutex::new(None),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Number of frames presented so far.
    pub fn presented_frames(&self) -> u64 {
        self.presented.load(Ordering::Relaxed)
    }

    /// Token generation and size of the last presented frame.
    pub fn latest_frame(&self) -> Option<(u64, Size)> {
        self.latest
            .lock()
            .ok()?
            .as_ref()
            .map(|frame| (frame.token().generation(), frame.size()))
    }
}

impl DisplayHost for HeadlessDisplay {
    fn create_surface(&self, size: Size) -> Result<SurfaceHandle, SurfaceError> {
        if size.is_empty() {
            return Err(SurfaceError::InvalidSize(size));
        }
        let id = self.next_surface_id.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("created headless surface {id} ({size})");
        Ok(SurfaceHandle { id, size })
    }

    fn present_whole_surface(&self, surface: SurfaceHandle, frame: FrameBuffer) {
        self.presented.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut latest) = self.latest.lock() {
            *latest = Some(frame);
        }
        let events = self.events.clone();
        let delay = self.refresh_interval;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if events.send(ClientEvent::PresentComplete).is_err() {
                debug!("controller gone; present on surface {} not acknowledged", surface.id);
            }
        });
    }

    fn post_diagnostic_message(&self, message: &str) {
        info!(target: "thinview::host", "{message}");
    }
}
