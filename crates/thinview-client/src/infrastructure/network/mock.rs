//! Recording transport for unit and integration tests.
//!
//! `MockTransport` performs no I/O.  Every submitted operation is pushed onto
//! `ops` so tests can assert exactly what the connection manager asked for,
//! and completions are fed back by hand through the manager's `on_*` methods.
//!
//! ```ignore
//! let transport = Arc::new(MockTransport::new());
//! let mut conn = ConnectionManager::new(endpoint, transport.clone(), 64);
//! conn.resolve().unwrap();
//! assert_eq!(transport.ops().len(), 1);
//! ```
//!
//! Set `unavailable = true` to simulate a host without socket support.

use std::net::SocketAddr;
use std::sync::Mutex;

use crate::application::connection::Transport;

/// One recorded call on the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOp {
    Resolve { epoch: u64, host: String, port: u16 },
    Connect { epoch: u64, addr: SocketAddr },
    Write { epoch: u64, bytes: Vec<u8> },
    Read { epoch: u64, max_len: usize },
    Close,
}

/// A transport that records calls without touching the network.
#[derive(Default)]
pub struct MockTransport {
    /// Every submitted operation, in submission order.
    pub ops: Mutex<Vec<TransportOp>>,
    /// When `true`, `is_available` reports the capability as missing.
    pub unavailable: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded operation.
    pub fn ops(&self) -> Vec<TransportOp> {
        self.ops.lock().unwrap().clone()
    }

    /// Payloads of every submitted write, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                TransportOp::Write { bytes, .. } => Some(bytes),
                _ => None,
            })
            .collect()
    }

    /// `max_len` of every submitted read, in order.
    pub fn reads(&self) -> Vec<usize> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                TransportOp::Read { max_len, .. } => Some(max_len),
                _ => None,
            })
            .collect()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.ops.lock().unwrap().clear();
    }

    fn record(&self, op: TransportOp) {
        self.ops.lock().unwrap().push(op);
    }
}

impl Transport for MockTransport {
    fn is_available(&self) -> bool {
        !self.unavailable
    }

    fn submit_resolve(&self, epoch: u64, host: &str, port: u16) {
        self.record(TransportOp::Resolve {
            epoch,
            host: host.to_string(),
            port,
        });
    }

    fn submit_connect(&self, epoch: u64, addr: SocketAddr) {
        self.record(TransportOp::Connect { epoch, addr });
    }

    fn submit_write(&self, epoch: u64, bytes: Vec<u8>) {
        self.record(TransportOp::Write { epoch, bytes });
    }

    fn submit_read(&self, epoch: u64, max_len: usize) {
        self.record(TransportOp::Read { epoch, max_len });
    }

    fn close(&self) {
        self.record(TransportOp::Close);
    }
}
