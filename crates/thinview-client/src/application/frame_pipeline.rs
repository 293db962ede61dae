//! FramePipeline: the allocate → request → fill → present → flush cycle.
//!
//! # One frame cycle
//!
//! ```text
//!  allocate_buffer ──connected──> request_screen ──> fill_buffer ──(reads)──> frame_ready
//!        │                                                                       │
//!        └──disconnected──> placeholder fill ───────────────────────────────────>┤
//!                                                                                v
//!  on_flush_complete <──────────── host PresentComplete <──────── present_whole_surface
//!        │
//!        └──> next cycle (or idle if the surface is gone)
//! ```
//!
//! # Buffer ownership
//!
//! The pipeline owns the current [`FrameBuffer`] while filling it.  At
//! `frame_ready` the buffer is *moved* into [`DisplayHost::present_whole_surface`],
//! so there is no way to write to it afterwards.  The next cycle allocates a
//! new buffer with a new [`BufferToken`](thinview_core::BufferToken).
//!
//! # Fill policies
//!
//! With [`FillPolicy::Accumulate`] reads are re-issued until every byte of
//! the frame has arrived.  [`FillPolicy::FirstResponse`] declares the frame
//! ready on the first successful read, which assumes the server delivers a
//! whole frame at once.
//!
//! # Disconnected rendering
//!
//! While not connected the first `placeholder_frames` frames are painted
//! with [`PLACEHOLDER_PIXEL`] and later ones are left blank, so the display
//! keeps running instead of freezing.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thinview_core::{encode_screen_request, FillCursor, FpsEstimator, FrameBuffer, Size, TokenIssuer};
use thiserror::Error;
use tracing::{debug, warn};

use super::connection::{ConnectionManager, NetError, ReadOutcome};
use super::diagnostics::{Diagnostics, LEVEL_EVENTS, LEVEL_TRACE, LEVEL_TRANSITIONS};

/// Pixel value painted during the first disconnected frames.
pub const PLACEHOLDER_PIXEL: u32 = 0xDEAD_BEEF;

// ── Host seams ────────────────────────────────────────────────────────────────

/// A surface created by the display host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceHandle {
    pub id: u64,
    pub size: Size,
}

/// Surface creation failure.  Rendering halts until a new surface is offered.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("cannot create a surface of size {0}")]
    InvalidSize(Size),
    #[error("display host refused to create a surface: {0}")]
    Refused(String),
}

/// The host that owns the actual display.
///
/// `present_whole_surface` takes the buffer by value; the host answers each
/// call with exactly one `ClientEvent::PresentComplete`.
pub trait DisplayHost: Send + Sync {
    /// Creates a rendering surface of `size`.
    fn create_surface(&self, size: Size) -> Result<SurfaceHandle, SurfaceError>;

    /// Replaces the whole surface with `frame`.
    fn present_whole_surface(&self, surface: SurfaceHandle, frame: FrameBuffer);

    /// Fire-and-forget log line for the host's development console.
    fn post_diagnostic_message(&self, message: &str);
}

/// Source of the random nonce embedded in every requested buffer.
#[cfg_attr(test, mockall::automock)]
pub trait NonceSource: Send {
    fn next_nonce(&mut self) -> u64;
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// When a frame counts as filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Keep reading until `width * height * 4` bytes have arrived.
    #[default]
    Accumulate,
    /// The first successful read completes the frame.
    FirstResponse,
}

/// Tunables for the frame cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub fill_policy: FillPolicy,
    /// Number of initial frames painted with [`PLACEHOLDER_PIXEL`] while disconnected.
    pub placeholder_frames: u64,
    /// Post an FPS report every this many frames (0 disables reports).
    pub fps_report_interval: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fill_policy: FillPolicy::Accumulate,
            placeholder_frames: 5,
            fps_report_interval: 60,
        }
    }
}

/// Where the pipeline is within the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// No cycle running.
    Idle,
    /// A buffer is allocated and being filled.
    Filling,
    /// The buffer was handed to the host; waiting for its flush completion.
    Presenting,
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Drives frame cycles against a [`ConnectionManager`] and a [`DisplayHost`].
pub struct FramePipeline {
    config: PipelineConfig,
    host: Arc<dyn DisplayHost>,
    diag: Diagnostics,
    nonce: Box<dyn NonceSource>,
    tokens: TokenIssuer,
    surface: Option<SurfaceHandle>,
    buffer: Option<FrameBuffer>,
    cursor: FillCursor,
    state: CycleState,
    request_in_flight: bool,
    frames: u64,
    fps: FpsEstimator,
    last_flush: Option<Instant>,
}

impl FramePipeline {
    pub fn new(
        config: PipelineConfig,
        host: Arc<dyn DisplayHost>,
        diag: Diagnostics,
        nonce: Box<dyn NonceSource>,
    ) -> Self {
        Self {
            config,
            host,
            diag,
            nonce,
            tokens: TokenIssuer::new(),
            surface: None,
            buffer: None,
            cursor: FillCursor::new(0),
            state: CycleState::Idle,
            request_in_flight: false,
            frames: 0,
            fps: FpsEstimator::new(),
            last_flush: None,
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == CycleState::Idle
    }

    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.surface
    }

    /// Number of completed frames.  Frames discarded after a resize are not counted.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn fps(&self) -> &FpsEstimator {
        &self.fps
    }

    pub fn request_in_flight(&self) -> bool {
        self.request_in_flight
    }

    pub fn cursor(&self) -> FillCursor {
        self.cursor
    }

    /// The buffer currently being filled, if the pipeline still owns one.
    pub fn current_buffer(&self) -> Option<&FrameBuffer> {
        self.buffer.as_ref()
    }

    /// Installs (or, with `None`, withdraws) the surface to render into.
    ///
    /// The running cycle is not interrupted.  A frame still being filled at
    /// the old size is discarded when ready and the cycle restarts at the new
    /// size.
    pub fn set_surface(&mut self, surface: Option<SurfaceHandle>) {
        self.surface = surface;
    }

    /// Starts the first cycle if the pipeline is idle and has a surface.
    ///
    /// Returns `false` when a cycle is already running.
    pub fn start(&mut self, conn: &mut ConnectionManager) -> bool {
        if self.state != CycleState::Idle || self.surface.is_none() {
            return false;
        }
        self.begin_cycle(conn);
        true
    }

    fn begin_cycle(&mut self, conn: &mut ConnectionManager) {
        let Some(surface) = self.surface else {
            self.state = CycleState::Idle;
            return;
        };
        self.allocate_buffer(surface.size);
        if conn.is_connected() {
            if self.request_screen(conn) {
                self.fill_buffer(conn);
            } else {
                self.frame_ready(conn);
            }
        } else {
            self.fill_placeholder();
            self.frame_ready(conn);
        }
    }

    /// Allocates a zeroed buffer of `size` with a fresh token and resets the cursor.
    pub fn allocate_buffer(&mut self, size: Size) {
        let buffer = FrameBuffer::allocate(size, self.tokens.issue());
        self.cursor = FillCursor::new(buffer.len());
        self.buffer = Some(buffer);
        self.state = CycleState::Filling;
    }

    /// Sends one ScreenRequest for the current buffer.
    ///
    /// A no-op while a request is already in flight.  Returns `false` when no
    /// request is outstanding afterwards (no buffer, or the send failed).
    pub fn request_screen(&mut self, conn: &mut ConnectionManager) -> bool {
        if self.request_in_flight {
            debug!("screen request already in flight");
            return true;
        }
        let Some(buffer) = self.buffer.as_mut() else {
            return false;
        };
        let nonce = self.nonce.next_nonce();
        buffer.write_nonce(nonce);
        let size = buffer.size();
        let handle = buffer.token().handle();
        let frame = encode_screen_request(size.width, size.height, handle, nonce);

        self.request_in_flight = true;
        match conn.send(frame.to_vec()) {
            Ok(()) => {
                self.diag
                    .post(LEVEL_TRACE, format!("ScreenRequest {size} handle {handle}"));
                true
            }
            Err(e) => {
                self.request_in_flight = false;
                self.diag
                    .post(LEVEL_EVENTS, format!("Screen request failed: {e}"));
                false
            }
        }
    }

    /// Issues one read for the rest of the frame, or marks the frame ready
    /// when there is nothing left to read or no connection to read from.
    pub fn fill_buffer(&mut self, conn: &mut ConnectionManager) {
        if self.state != CycleState::Filling || self.buffer.is_none() {
            return;
        }
        let remaining = self.cursor.remaining();
        if !conn.is_connected() || remaining == 0 {
            self.frame_ready(conn);
            return;
        }
        match conn.receive(remaining) {
            Ok(()) | Err(NetError::ReadInFlight) => {}
            Err(e) => {
                debug!("fill skipped: {e}");
                self.frame_ready(conn);
            }
        }
    }

    /// Applies a read completion to the current frame.
    pub fn on_read_outcome(&mut self, conn: &mut ConnectionManager, outcome: ReadOutcome) {
        match outcome {
            ReadOutcome::Stale => {}
            ReadOutcome::Data(bytes) => {
                if self.state != CycleState::Filling {
                    warn!("dropping {} bytes read outside a fill", bytes.len());
                    return;
                }
                let Some(buffer) = self.buffer.as_mut() else {
                    return;
                };
                let copied = buffer.write_at(self.cursor.filled(), &bytes);
                self.cursor.advance(copied);
                self.diag.post(
                    LEVEL_TRACE,
                    format!("ReadCompletion: {} ({}/{})", bytes.len(), self.cursor.filled(), self.cursor.capacity()),
                );
                match self.config.fill_policy {
                    FillPolicy::FirstResponse => self.frame_ready(conn),
                    FillPolicy::Accumulate if self.cursor.is_complete() => self.frame_ready(conn),
                    FillPolicy::Accumulate => self.fill_buffer(conn),
                }
            }
            ReadOutcome::Failed(_) => {
                // The connection is now Failed, so this falls through to frame_ready.
                self.request_in_flight = false;
                self.fill_buffer(conn);
            }
        }
    }

    fn fill_placeholder(&mut self) {
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };
        if self.frames < self.config.placeholder_frames {
            buffer.fill_pixels(PLACEHOLDER_PIXEL);
            self.diag.post(
                LEVEL_TRANSITIONS,
                format!("placeholder: deadbeef frame {}", self.frames),
            );
        }
        self.cursor.advance(buffer.len());
    }

    /// Hands the filled buffer to the host, or goes idle if the surface is gone.
    fn frame_ready(&mut self, conn: &mut ConnectionManager) {
        self.request_in_flight = false;
        let buffer = self.buffer.take();
        match (self.surface, buffer) {
            (Some(surface), Some(buffer)) if buffer.size() != surface.size => {
                debug!(
                    "discarding {} frame for {} surface {}",
                    buffer.size(),
                    surface.size,
                    surface.id
                );
                self.begin_cycle(conn);
            }
            (Some(surface), Some(buffer)) => {
                self.frames += 1;
                self.state = CycleState::Presenting;
                self.host.present_whole_surface(surface, buffer);
            }
            _ => {
                self.frames += 1;
                debug!("no surface to present frame {}; pipeline idle", self.frames);
                self.state = CycleState::Idle;
            }
        }
    }

    /// Handles the host's flush completion for the last presented frame.
    ///
    /// Updates the FPS estimate, posts the periodic report, and begins the
    /// next cycle if a surface is still installed.
    pub fn on_flush_complete(&mut self, conn: &mut ConnectionManager, now: Instant) {
        if self.state != CycleState::Presenting {
            warn!("flush completion with no frame presented");
            return;
        }
        if let Some(previous) = self.last_flush {
            self.fps
                .record_interval(now.saturating_duration_since(previous));
        }
        self.last_flush = Some(now);

        let interval = self.config.fps_report_interval;
        if interval > 0 && self.frames % interval == 0 {
            self.diag.post(
                LEVEL_TRANSITIONS,
                format!(
                    "fps: {} ({})",
                    whole_fps(self.fps.instantaneous()),
                    whole_fps(self.fps.average())
                ),
            );
        }

        self.state = CycleState::Idle;
        if self.surface.is_some() {
            self.begin_cycle(conn);
        } else {
            debug!("surface withdrawn; pipeline idle");
        }
    }
}

/// Rounds a frame rate to the nearest whole number, halves rounding up.
fn whole_fps(fps: f64) -> u64 {
    (fps + 0.5).floor() as u64
}

// ── Tests ─────────────────────────────────────────────────────────────────────
