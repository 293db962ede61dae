//! ConnectionManager: the socket lifecycle as an explicit state machine.
//!
//! ```text
//! Unresolved ─resolve()─> Resolving ─ok─> Resolved ─connect()─> Connecting ─ok─> Connected
//!                             │                                     │               │
//!                             └──────────err──────────> Failed <────┘<──read error──┘
//!                                                         │
//!                                  retry() ───────────────┘ (back to Resolving)
//! ```
//!
//! # Submission and completion
//!
//! The manager never blocks.  Each operation is *submitted* to a
//! [`Transport`] and its result comes back later as a [`NetCompletion`]
//! which the controller feeds into the matching `on_*` method.  Every
//! completion carries the epoch it was submitted under; the epoch increases
//! on each resolve attempt, so a completion from an earlier attempt is
//! recognised as stale and dropped.  Checking the epoch and the in-flight
//! flags replaces cancellation.
//!
//! At most one read and one write are in flight.  A second `receive` is
//! rejected; extra `send`s wait in a bounded FIFO.

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

/// Default number of frames that may wait behind an in-flight write.
pub const DEFAULT_WRITE_QUEUE_LIMIT: usize = 64;

/// Server endpoint: host name or literal address, plus port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Lifecycle state of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unresolved,
    Resolving,
    Resolved,
    Connecting,
    Connected,
    Failed,
}

/// Errors surfaced by the connection manager.
///
/// None of these are fatal to the process; the caller logs them and the
/// frame pipeline falls back to placeholder rendering.
#[derive(Debug, Error)]
pub enum NetError {
    /// Name resolution failed.
    #[error("failed to resolve {endpoint}: {source}")]
    Resolution {
        endpoint: Endpoint,
        #[source]
        source: io::Error,
    },
    /// The TCP connection could not be established.
    #[error("failed to connect to {addr}: {source}")]
    Connection {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    /// A read failed or the server closed the stream.
    #[error("read failed: {0}")]
    Read(#[source] io::Error),
    /// A write failed.
    #[error("write failed: {0}")]
    Write(#[source] io::Error),
    /// The operation requires a connected socket.
    #[error("not connected (state {0:?})")]
    NotConnected(ConnectionState),
    /// A read is already outstanding on this socket.
    #[error("a read is already in flight")]
    ReadInFlight,
    /// Too many writes are queued behind the in-flight one.
    #[error("write queue full ({limit} frames)")]
    WriteQueueFull { limit: usize },
    /// The requested transition is not valid from the current state.
    #[error("cannot {op} while {from:?}")]
    InvalidTransition {
        from: ConnectionState,
        op: &'static str,
    },
}

/// Completion of a submitted transport operation.
#[derive(Debug)]
pub enum NetCompletion {
    Resolved {
        epoch: u64,
        result: io::Result<SocketAddr>,
    },
    Connected {
        epoch: u64,
        result: io::Result<()>,
    },
    /// The bytes delivered by one read.  Remote close is reported as an error.
    Read {
        epoch: u64,
        result: io::Result<Vec<u8>>,
    },
    Written {
        epoch: u64,
        result: io::Result<usize>,
    },
}

/// What a read completion meant for the caller.
#[derive(Debug)]
pub enum ReadOutcome {
    /// Bytes arrived for the current read.
    Data(Vec<u8>),
    /// The read failed; the connection is now [`ConnectionState::Failed`].
    Failed(NetError),
    /// The completion belonged to an earlier read or epoch and was ignored.
    Stale,
}

/// Socket operations the connection manager submits.
///
/// Each method returns immediately; the result is delivered later as a
/// [`NetCompletion`] tagged with the same `epoch`.  The production
/// implementation runs on Tokio; tests use a recording mock.
pub trait Transport: Send + Sync {
    /// Whether the host can provide name resolution and TCP sockets at all.
    fn is_available(&self) -> bool;

    /// Resolves `host:port` to one socket address.
    fn submit_resolve(&self, epoch: u64, host: &str, port: u16);

    /// Opens a stream connection to `addr`.
    fn submit_connect(&self, epoch: u64, addr: SocketAddr);

    /// Writes all of `bytes` to the connected stream.
    fn submit_write(&self, epoch: u64, bytes: Vec<u8>);

    /// Reads at most `max_len` bytes from the connected stream.
    fn submit_read(&self, epoch: u64, max_len: usize);

    /// Drops the socket, if any.
    fn close(&self);
}

/// Owns the connection state and enforces one read and one write in flight.
pub struct ConnectionManager {
    endpoint: Endpoint,
    state: ConnectionState,
    epoch: u64,
    address: Option<SocketAddr>,
    read_in_flight: bool,
    write_in_flight: bool,
    write_queue: VecDeque<Vec<u8>>,
    write_queue_limit: usize,
    transport: Arc<dyn Transport>,
}

impl ConnectionManager {
    /// Creates an unresolved manager for `endpoint`.
    pub fn new(endpoint: Endpoint, transport: Arc<dyn Transport>, write_queue_limit: usize) -> Self {
        Self {
            endpoint,
            state: ConnectionState::Unresolved,
            epoch: 0,
            address: None,
            read_in_flight: false,
            write_in_flight: false,
            write_queue: VecDeque::new(),
            write_queue_limit,
            transport,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// The epoch completions must carry to be accepted.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The resolved address, once known.
    pub fn address(&self) -> Option<SocketAddr> {
        self.address
    }

    pub fn read_in_flight(&self) -> bool {
        self.read_in_flight
    }

    pub fn write_in_flight(&self) -> bool {
        self.write_in_flight
    }

    /// Number of writes waiting behind the in-flight one.
    pub fn queued_writes(&self) -> usize {
        self.write_queue.len()
    }

    /// Whether the underlying transport exists on this host.
    pub fn transport_available(&self) -> bool {
        self.transport.is_available()
    }

    // ── Resolve / connect ─────────────────────────────────────────────────────

    /// Starts name resolution of the endpoint.
    ///
    /// Valid from `Unresolved` and, as an explicit retry, from `Failed`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidTransition`] from any other state.
    pub fn resolve(&mut self) -> Result<(), NetError> {
        match self.state {
            ConnectionState::Unresolved | ConnectionState::Failed => {}
            from => return Err(NetError::InvalidTransition { from, op: "resolve" }),
        }
        self.epoch = self.epoch.wrapping_add(1);
        self.state = ConnectionState::Resolving;
        self.address = None;
        self.read_in_flight = false;
        self.write_in_flight = false;
        self.write_queue.clear();
        debug!("resolving {} (epoch {})", self.endpoint, self.epoch);
        self.transport
            .submit_resolve(self.epoch, &self.endpoint.host, self.endpoint.port);
        Ok(())
    }

    /// Explicit `Failed → Resolving` transition.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidTransition`] unless the state is `Failed`.
    pub fn retry(&mut self) -> Result<(), NetError> {
        if self.state != ConnectionState::Failed {
            return Err(NetError::InvalidTransition {
                from: self.state,
                op: "retry",
            });
        }
        self.resolve()
    }

    /// Handles a resolve completion.
    ///
    /// On success transitions to `Resolved`, immediately submits the connect,
    /// and returns the address.  Stale completions return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Resolution`] after transitioning to `Failed`.
    pub fn on_resolved(
        &mut self,
        epoch: u64,
        result: io::Result<SocketAddr>,
    ) -> Result<Option<SocketAddr>, NetError> {
        if !self.is_current(epoch, ConnectionState::Resolving) {
            debug!("ignoring stale resolve completion (epoch {epoch})");
            return Ok(None);
        }
        match result {
            Ok(addr) => {
                self.state = ConnectionState::Resolved;
                self.address = Some(addr);
                self.connect(addr)?;
                Ok(Some(addr))
            }
            Err(source) => {
                self.fail();
                Err(NetError::Resolution {
                    endpoint: self.endpoint.clone(),
                    source,
                })
            }
        }
    }

    /// Submits the connect to a resolved address.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidTransition`] unless the state is `Resolved`.
    pub fn connect(&mut self, addr: SocketAddr) -> Result<(), NetError> {
        if self.state != ConnectionState::Resolved {
            return Err(NetError::InvalidTransition {
                from: self.state,
                op: "connect",
            });
        }
        self.state = ConnectionState::Connecting;
        self.transport.submit_connect(self.epoch, addr);
        Ok(())
    }

    /// Handles a connect completion.
    ///
    /// Returns the peer address when the connection is now established,
    /// `Ok(None)` for stale completions.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Connection`] after transitioning to `Failed`.
    pub fn on_connected(
        &mut self,
        epoch: u64,
        result: io::Result<()>,
    ) -> Result<Option<SocketAddr>, NetError> {
        if !self.is_current(epoch, ConnectionState::Connecting) {
            debug!("ignoring stale connect completion (epoch {epoch})");
            return Ok(None);
        }
        // Connecting always has an address; the fallback only satisfies the type.
        let addr = self
            .address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], self.endpoint.port)));
        match result {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                Ok(Some(addr))
            }
            Err(source) => {
                self.fail();
                Err(NetError::Connection { addr, source })
            }
        }
    }

    // ── Write path ────────────────────────────────────────────────────────────

    /// Submits `bytes` as one write, or queues it behind the in-flight write.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::NotConnected`] unless `Connected`, and
    /// [`NetError::WriteQueueFull`] when the queue is at its limit.
    pub fn send(&mut self, bytes: Vec<u8>) -> Result<(), NetError> {
        if !self.is_connected() {
            return Err(NetError::NotConnected(self.state));
        }
        if self.write_in_flight {
            if self.write_queue.len() >= self.write_queue_limit {
                return Err(NetError::WriteQueueFull {
                    limit: self.write_queue_limit,
                });
            }
            self.write_queue.push_back(bytes);
            return Ok(());
        }
        self.write_in_flight = true;
        self.transport.submit_write(self.epoch, bytes);
        Ok(())
    }

    /// Handles a write completion and submits the next queued write.
    ///
    /// A write failure leaves the connection state untouched.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Write`] if the write failed.
    pub fn on_write_complete(
        &mut self,
        epoch: u64,
        result: io::Result<usize>,
    ) -> Result<Option<usize>, NetError> {
        if epoch != self.epoch || !self.write_in_flight {
            debug!("ignoring stale write completion (epoch {epoch})");
            return Ok(None);
        }
        self.write_in_flight = false;
        if self.is_connected() {
            if let Some(next) = self.write_queue.pop_front() {
                self.write_in_flight = true;
                self.transport.submit_write(self.epoch, next);
            }
        } else {
            self.write_queue.clear();
        }
        result.map(Some).map_err(NetError::Write)
    }

    // ── Read path ─────────────────────────────────────────────────────────────

    /// Submits one read of at most `max_len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::NotConnected`] unless `Connected`, and
    /// [`NetError::ReadInFlight`] if a read is already outstanding.
    pub fn receive(&mut self, max_len: usize) -> Result<(), NetError> {
        if !self.is_connected() {
            return Err(NetError::NotConnected(self.state));
        }
        if self.read_in_flight {
            return Err(NetError::ReadInFlight);
        }
        self.read_in_flight = true;
        self.transport.submit_read(self.epoch, max_len);
        Ok(())
    }

    /// Handles a read completion.
    ///
    /// A failed read moves `Connected → Failed` exactly once; any further
    /// completions for the same read are reported as [`ReadOutcome::Stale`].
    pub fn on_read_complete(&mut self, epoch: u64, result: io::Result<Vec<u8>>) -> ReadOutcome {
        if epoch != self.epoch || !self.read_in_flight {
            debug!("ignoring stale read completion (epoch {epoch})");
            return ReadOutcome::Stale;
        }
        self.read_in_flight = false;
        match result {
            Ok(bytes) if !bytes.is_empty() => ReadOutcome::Data(bytes),
            Ok(_) => {
                self.fail();
                ReadOutcome::Failed(NetError::Read(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by server",
                )))
            }
            Err(source) => {
                self.fail();
                ReadOutcome::Failed(NetError::Read(source))
            }
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn is_current(&self, epoch: u64, expected: ConnectionState) -> bool {
        epoch == self.epoch && self.state == expected
    }

    fn fail(&mut self) {
        if self.state == ConnectionState::Failed {
            return;
        }
        warn!("connection to {} failed (epoch {})", self.endpoint, self.epoch);
        self.state = ConnectionState::Failed;
        self.read_in_flight = false;
        self.write_queue.clear();
        self.transport.close();
    }
}

// ── Reconnect backoff ─────────────────────────────────────────────────────────

/// Exponential backoff between reconnect attempts.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    initial: Duration,
    max: Duration,
    next: Duration,
}

impl ReconnectBackoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            next: initial,
        }
    }

    /// Returns the delay before the next attempt and doubles it, capped at `max`.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next.min(self.max);
        self.next = self.next.saturating_mul(2).min(self.max);
        delay
    }

    /// Restarts the sequence after a successful connection.
    pub fn reset(&mut self) {
        self.next = self.initial;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
