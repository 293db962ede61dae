//! ClientController: startup sequencing and the single event loop entry point.
//!
//! # How events flow (for beginners)
//!
//! Nothing in the client blocks.  The transport, the display host, and the
//! input source all report back by sending a [`ClientEvent`] on one channel.
//! `main` pulls events off that channel one at a time and calls
//! [`ClientController::handle_event`], which routes each event to the
//! component that owns the affected state:
//!
//! ```text
//! Net(Resolved/Connected)  ──> ConnectionManager
//! Net(Read)                ──> ConnectionManager ──> FramePipeline
//! Net(Written)             ──> ConnectionManager (next queued write)
//! ViewChanged(size)        ──> DisplayHost::create_surface ──> FramePipeline::start
//! PresentComplete          ──> FramePipeline::on_flush_complete
//! Input(..)                ──> InputForwarder
//! HostMessage("hello")     ──> diagnostic reply
//! RetryConnect             ──> ConnectionManager::retry
//! ```
//!
//! Because only one event is handled at a time, no component needs a lock.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thinview_core::Size;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::connection::{
    ConnectionManager, ConnectionState, Endpoint, NetCompletion, NetError, ReadOutcome,
    ReconnectBackoff, Transport, DEFAULT_WRITE_QUEUE_LIMIT,
};
use super::diagnostics::{Diagnostics, DEFAULT_VERBOSITY, LEVEL_EVENTS, LEVEL_TRACE, LEVEL_TRANSITIONS};
use super::frame_pipeline::{DisplayHost, FramePipeline, NonceSource, PipelineConfig, SurfaceError};
use super::input_forwarder::{InputEvent, InputForwarder};

/// Default server port.
pub const DEFAULT_PORT: u16 = 30002;

/// Reply to the host's `hello` message.
pub const HELLO_REPLY: &str = "hello from thinview";

/// Everything the controller reacts to.
#[derive(Debug)]
pub enum ClientEvent {
    /// A transport operation finished.
    Net(NetCompletion),
    /// The host's view was created or resized.
    ViewChanged(Size),
    /// The host consumed the last presented frame.
    PresentComplete,
    /// Keyboard or pointer input.
    Input(InputEvent),
    /// Text message from the embedding host.
    HostMessage(String),
    /// The reconnect backoff timer fired.
    RetryConnect,
}

/// Errors surfaced by the controller.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A host capability the client cannot run without is missing.
    #[error("required capability unavailable: {0}")]
    CapabilityUnavailable(&'static str),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Net(#[from] NetError),
}

/// Backoff bounds for automatic reconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial: Duration,
    pub max: Duration,
}

/// Settings for [`ClientController::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub endpoint: Endpoint,
    pub pipeline: PipelineConfig,
    pub write_queue_limit: usize,
    pub diagnostic_level: u8,
    /// `None` keeps a failed connection failed for the rest of the session.
    pub reconnect: Option<ReconnectPolicy>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::new("127.0.0.1", DEFAULT_PORT),
            pipeline: PipelineConfig::default(),
            write_queue_limit: DEFAULT_WRITE_QUEUE_LIMIT,
            diagnostic_level: DEFAULT_VERBOSITY,
            reconnect: None,
        }
    }
}

/// Owns the connection, the frame pipeline, and the input forwarder.
pub struct ClientController {
    conn: ConnectionManager,
    pipeline: FramePipeline,
    forwarder: InputForwarder,
    host: Arc<dyn DisplayHost>,
    diag: Diagnostics,
    backoff: Option<ReconnectBackoff>,
    pending_retry: Option<Duration>,
}

impl ClientController {
    pub fn new(
        config: ControllerConfig,
        transport: Arc<dyn Transport>,
        host: Arc<dyn DisplayHost>,
        nonce: Box<dyn NonceSource>,
    ) -> Self {
        let diag = Diagnostics::new(Arc::clone(&host), config.diagnostic_level);
        Self {
            conn: ConnectionManager::new(config.endpoint, transport, config.write_queue_limit),
            pipeline: FramePipeline::new(config.pipeline, Arc::clone(&host), diag.clone(), nonce),
            forwarder: InputForwarder::new(diag.clone()),
            host,
            diag,
            backoff: config
                .reconnect
                .map(|policy| ReconnectBackoff::new(policy.initial, policy.max)),
            pending_retry: None,
        }
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.conn
    }

    pub fn pipeline(&self) -> &FramePipeline {
        &self.pipeline
    }

    pub fn forwarder(&self) -> &InputForwarder {
        &self.forwarder
    }

    /// Checks host capabilities and starts resolving the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::CapabilityUnavailable`] if the host has no
    /// socket support.
    pub fn init(&mut self) -> Result<(), ClientError> {
        if !self.conn.transport_available() {
            self.diag
                .post(LEVEL_TRANSITIONS, "Network capability unavailable");
            return Err(ClientError::CapabilityUnavailable("tcp sockets"));
        }
        self.diag.post(
            LEVEL_EVENTS,
            format!("Resolving {}", self.conn.endpoint()),
        );
        self.conn.resolve()?;
        Ok(())
    }

    /// Routes one event to the component that owns it.
    pub fn handle_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Net(completion) => self.on_net(completion),
            ClientEvent::ViewChanged(size) => {
                if let Err(e) = self.on_view_changed(size) {
                    error!("view change to {size} failed: {e}");
                }
            }
            ClientEvent::PresentComplete => {
                self.pipeline.on_flush_complete(&mut self.conn, Instant::now());
            }
            ClientEvent::Input(input) => {
                self.forwarder.handle(&mut self.conn, input);
            }
            ClientEvent::HostMessage(text) => self.on_host_message(&text),
            ClientEvent::RetryConnect => self.on_retry(),
        }
    }

    /// Creates a surface for `size` and starts the pipeline if it is idle.
    ///
    /// Safe to call repeatedly: a running cycle is never duplicated.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Surface`] if the host refuses the surface;
    /// rendering then halts until a later view change succeeds.
    pub fn on_view_changed(&mut self, size: Size) -> Result<(), ClientError> {
        match self.host.create_surface(size) {
            Ok(surface) => {
                self.diag
                    .post(LEVEL_TRACE, format!("Surface {} ({size})", surface.id));
                self.pipeline.set_surface(Some(surface));
                if self.pipeline.is_idle() {
                    self.pipeline.start(&mut self.conn);
                }
                Ok(())
            }
            Err(e) => {
                self.pipeline.set_surface(None);
                self.diag
                    .post(LEVEL_TRANSITIONS, format!("Surface creation failed: {e}"));
                Err(e.into())
            }
        }
    }

    /// The delay before the next reconnect attempt, if one was scheduled
    /// since the last call.
    pub fn take_retry_delay(&mut self) -> Option<Duration> {
        self.pending_retry.take()
    }

    // ── Network completions ───────────────────────────────────────────────────

    fn on_net(&mut self, completion: NetCompletion) {
        match completion {
            NetCompletion::Resolved { epoch, result } => {
                let permission_denied = matches!(
                    &result,
                    Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied
                );
                match self.conn.on_resolved(epoch, result) {
                    Ok(Some(addr)) => {
                        self.diag.post(LEVEL_EVENTS, format!("Resolved: {addr}"));
                        self.diag.post(LEVEL_EVENTS, format!("Connecting to {addr}"));
                    }
                    Ok(None) => {}
                    Err(e) => {
                        if permission_denied {
                            self.diag.post(LEVEL_TRANSITIONS, "No access.");
                        }
                        self.connection_failed(&e);
                    }
                }
            }
            NetCompletion::Connected { epoch, result } => match self.conn.on_connected(epoch, result) {
                Ok(Some(addr)) => {
                    self.diag
                        .post(LEVEL_TRANSITIONS, format!("Connected to {addr}"));
                    if let Some(backoff) = self.backoff.as_mut() {
                        backoff.reset();
                    }
                }
                Ok(None) => {}
                Err(e) => self.connection_failed(&e),
            },
            NetCompletion::Read { epoch, result } => {
                let outcome = self.conn.on_read_complete(epoch, result);
                if let ReadOutcome::Failed(e) = &outcome {
                    self.connection_failed(e);
                }
                self.pipeline.on_read_outcome(&mut self.conn, outcome);
            }
            NetCompletion::Written { epoch, result } => match self.conn.on_write_complete(epoch, result) {
                Ok(Some(n)) => self.diag.post(LEVEL_TRACE, format!("WriteCompletion: {n}")),
                Ok(None) => {}
                Err(e) => self.diag.post(LEVEL_EVENTS, format!("Write failed: {e}")),
            },
        }
    }

    fn connection_failed(&mut self, err: &NetError) {
        self.diag.post(LEVEL_TRANSITIONS, format!("Disconnected: {err}"));
        if let Some(backoff) = self.backoff.as_mut() {
            let delay = backoff.next_delay();
            debug!("reconnect scheduled in {delay:?}");
            self.pending_retry = Some(delay);
        }
    }

    fn on_retry(&mut self) {
        if self.backoff.is_none() {
            debug!("reconnection disabled; retry ignored");
            return;
        }
        if self.conn.state() != ConnectionState::Failed {
            debug!("retry timer fired while {:?}; ignored", self.conn.state());
            return;
        }
        self.diag.post(
            LEVEL_TRANSITIONS,
            format!("Reconnecting to {}", self.conn.endpoint()),
        );
        if let Err(e) = self.conn.retry() {
            warn!("reconnect failed to start: {e}");
        }
    }

    fn on_host_message(&mut self, text: &str) {
        if text == "hello" {
            self.diag.post(LEVEL_TRANSITIONS, HELLO_REPLY);
        } else {
            debug!("ignoring host message {text:?}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::application::frame_pipeline::{CycleState, MockNonceSource};
    use crate::infrastructure::display::mock::MockDisplayHost;
    use crate::infrastructure::network::mock::{MockTransport, TransportOp};

    fn addr() -> std::net::SocketAddr {
        "127.0.0.1:30002".parse().unwrap()
    }

    fn nonce() -> Box<MockNonceSource> {
        let mut source = MockNonceSource::new();
        source.expect_next_nonce().return_const(99u64);
        Box::new(source)
    }

    fn controller(
        config: ControllerConfig,
        transport: MockTransport,
    ) -> (ClientController, Arc<MockTransport>, Arc<MockDisplayHost>) {
        let transport = Arc::new(transport);
        let host = Arc::new(MockDisplayHost::new());
        let ctl = ClientController::new(config, transport.clone(), host.clone(), nonce());
        (ctl, transport, host)
    }

    fn connect(ctl: &mut ClientController) {
        ctl.init().unwrap();
        ctl.handle_event(ClientEvent::Net(NetCompletion::Resolved {
            epoch: 1,
            result: Ok(addr()),
        }));
        ctl.handle_event(ClientEvent::Net(NetCompletion::Connected {
            epoch: 1,
            result: Ok(()),
        }));
    }

    #[test]
    fn test_init_fails_fast_without_network_capability() {
        let transport = MockTransport {
            unavailable: true,
            ..MockTransport::default()
        };
        let (mut ctl, transport, _) = controller(ControllerConfig::default(), transport);

        assert!(matches!(ctl.init(), Err(ClientError::CapabilityUnavailable(_))));
        assert!(transport.ops().is_empty());
    }

    #[test]
    fn test_init_resolves_endpoint_then_connects() {
        // Arrange
        let (mut ctl, transport, host) = controller(ControllerConfig::default(), MockTransport::new());

        // Act
        connect(&mut ctl);

        // Assert
        assert_eq!(ctl.connection().state(), ConnectionState::Connected);
        assert_eq!(
            transport.ops()[..2],
            [
                TransportOp::Resolve {
                    epoch: 1,
                    host: "127.0.0.1".into(),
                    port: 30002
                },
                TransportOp::Connect { epoch: 1, addr: addr() },
            ]
        );
        let messages = host.diagnostics();
        assert!(messages.iter().any(|m| m.ends_with("Resolved: 127.0.0.1:30002")));
        assert!(messages.iter().any(|m| m.ends_with("Connected to 127.0.0.1:30002")));
    }

    #[test]
    fn test_connected_frame_cycle_end_to_end() {
        // Arrange
        let (mut ctl, transport, host) = controller(ControllerConfig::default(), MockTransport::new());
        connect(&mut ctl);

        // Act – view ready, then the server answers the screen request
        ctl.handle_event(ClientEvent::ViewChanged(Size::new(2, 2)));
        ctl.handle_event(ClientEvent::Net(NetCompletion::Written { epoch: 1, result: Ok(24) }));
        ctl.handle_event(ClientEvent::Net(NetCompletion::Read {
            epoch: 1,
            result: Ok(vec![0x11; 16]),
        }));

        // Assert
        assert_eq!(transport.writes().len(), 1);
        assert_eq!(transport.writes()[0][0], b'S');
        assert_eq!(host.presented_count(), 1);
        assert_eq!(ctl.pipeline().state(), CycleState::Presenting);

        // Act – flush completes, next cycle requests again
        ctl.handle_event(ClientEvent::PresentComplete);

        // Assert
        assert_eq!(transport.writes().len(), 2);
        assert_eq!(transport.reads(), vec![16, 16]);
    }

    #[test]
    fn test_second_view_change_does_not_start_second_cycle() {
        let (mut ctl, transport, _) = controller(ControllerConfig::default(), MockTransport::new());
        connect(&mut ctl);

        ctl.handle_event(ClientEvent::ViewChanged(Size::new(2, 2)));
        ctl.handle_event(ClientEvent::ViewChanged(Size::new(4, 4)));

        assert_eq!(transport.writes().len(), 1);
        assert_eq!(transport.reads().len(), 1);
        assert_eq!(ctl.pipeline().surface().unwrap().size, Size::new(4, 4));
    }

    #[test]
    fn test_surface_failure_halts_rendering_until_new_surface() {
        // Arrange
        let (mut ctl, _, host) = controller(ControllerConfig::default(), MockTransport::new());
        host.fail_surfaces.store(true, std::sync::atomic::Ordering::SeqCst);

        // Act
        let result = ctl.on_view_changed(Size::new(2, 2));

        // Assert
        assert!(matches!(result, Err(ClientError::Surface(_))));
        assert_eq!(host.presented_count(), 0);
        assert!(ctl.pipeline().is_idle());

        host.fail_surfaces.store(false, std::sync::atomic::Ordering::SeqCst);
        ctl.on_view_changed(Size::new(2, 2)).unwrap();
        assert_eq!(host.presented_count(), 1, "placeholder frame while disconnected");
    }

    #[test]
    fn test_read_failure_without_reconnect_stays_failed() {
        let (mut ctl, _, _) = controller(ControllerConfig::default(), MockTransport::new());
        connect(&mut ctl);
        ctl.handle_event(ClientEvent::ViewChanged(Size::new(2, 2)));

        ctl.handle_event(ClientEvent::Net(NetCompletion::Read {
            epoch: 1,
            result: Err(io::Error::from(io::ErrorKind::ConnectionReset)),
        }));

        assert_eq!(ctl.connection().state(), ConnectionState::Failed);
        assert_eq!(ctl.take_retry_delay(), None);
        ctl.handle_event(ClientEvent::RetryConnect);
        assert_eq!(ctl.connection().state(), ConnectionState::Failed);
    }

    #[test]
    fn test_read_failure_with_reconnect_schedules_backoff_retry() {
        // Arrange
        let config = ControllerConfig {
            reconnect: Some(ReconnectPolicy {
                initial: Duration::from_millis(500),
                max: Duration::from_secs(30),
            }),
            ..ControllerConfig::default()
        };
        let (mut ctl, transport, _) = controller(config, MockTransport::new());
        connect(&mut ctl);
        ctl.handle_event(ClientEvent::ViewChanged(Size::new(2, 2)));

        // Act
        ctl.handle_event(ClientEvent::Net(NetCompletion::Read {
            epoch: 1,
            result: Err(io::Error::from(io::ErrorKind::ConnectionReset)),
        }));
        let delay = ctl.take_retry_delay();
        ctl.handle_event(ClientEvent::RetryConnect);

        // Assert
        assert_eq!(delay, Some(Duration::from_millis(500)));
        assert_eq!(ctl.connection().state(), ConnectionState::Resolving);
        assert!(matches!(
            transport.ops().last(),
            Some(TransportOp::Resolve { epoch: 2, .. })
        ));
    }

    #[test]
    fn test_permission_denied_resolution_posts_no_access() {
        let (mut ctl, _, host) = controller(ControllerConfig::default(), MockTransport::new());
        ctl.init().unwrap();

        ctl.handle_event(ClientEvent::Net(NetCompletion::Resolved {
            epoch: 1,
            result: Err(io::Error::from(io::ErrorKind::PermissionDenied)),
        }));

        assert_eq!(ctl.connection().state(), ConnectionState::Failed);
        assert!(host.diagnostics().iter().any(|m| m.ends_with("No access.")));
    }

    #[test]
    fn test_key_input_is_forwarded_as_k_frame() {
        let (mut ctl, transport, _) = controller(ControllerConfig::default(), MockTransport::new());
        connect(&mut ctl);

        ctl.handle_event(ClientEvent::Input(InputEvent::KeyDown(65)));

        assert_eq!(transport.writes(), vec![vec![b'K', 1, 0x61, 0, 0, 0, 0, 0]]);
        assert_eq!(ctl.forwarder().forwarded(), 1);
    }

    #[test]
    fn test_hello_host_message_gets_reply() {
        let (mut ctl, _, host) = controller(ControllerConfig::default(), MockTransport::new());

        ctl.handle_event(ClientEvent::HostMessage("hello".into()));
        ctl.handle_event(ClientEvent::HostMessage("bye".into()));

        let replies: Vec<_> = host
            .diagnostics()
            .into_iter()
            .filter(|m| m.ends_with(HELLO_REPLY))
            .collect();
        assert_eq!(replies.len(), 1);
    }
}
