//! Diagnostics: user-visible status messages mirrored to the display host.
//!
//! Every message goes to `tracing`.  Messages at or below the configured
//! verbosity are also posted to [`DisplayHost::post_diagnostic_message`],
//! prefixed with the milliseconds elapsed since the client started, so the
//! host's console shows a timeline like:
//!
//! ```text
//! 12 Resolved: 127.0.0.1:30002
//! 14 Connected
//! 1016 fps: 60 (58)
//! ```

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, trace};

use super::frame_pipeline::DisplayHost;

/// State transitions and FPS reports.
pub const LEVEL_TRANSITIONS: u8 = 0;
/// Resolve/connect progress and key events.
pub const LEVEL_EVENTS: u8 = 1;
/// Per-operation trace.
pub const LEVEL_TRACE: u8 = 5;

/// Default verbosity of the host diagnostic channel.
pub const DEFAULT_VERBOSITY: u8 = LEVEL_EVENTS;

/// Cloneable handle to the host diagnostic channel.
#[derive(Clone)]
pub struct Diagnostics {
    host: Arc<dyn DisplayHost>,
    verbosity: u8,
    started: Instant,
}

impl Diagnostics {
    pub fn new(host: Arc<dyn DisplayHost>, verbosity: u8) -> Self {
        Self {
            host,
            verbosity,
            started: Instant::now(),
        }
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Logs `message` and posts it to the host if `level <= verbosity`.
    pub fn post(&self, level: u8, message: impl AsRef<str>) {
        let message = message.as_ref();
        match level {
            LEVEL_TRANSITIONS => info!("{message}"),
            LEVEL_EVENTS => debug!("{message}"),
            _ => trace!("{message}"),
        }
        if level <= self.verbosity {
            let elapsed = self.started.elapsed().as_millis();
            self.host
                .post_diagnostic_message(&format!("{elapsed} {message}"));
        }
    }
}
