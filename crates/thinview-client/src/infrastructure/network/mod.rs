//! Network infrastructure: the Tokio implementation of [`Transport`].
//!
//! Architecture:
//! - Each submitted operation runs in its own spawned task and reports back
//!   as a `ClientEvent::Net(NetCompletion)` on the controller's channel.
//! - The connected stream is split and both halves live in one [`Halves`]
//!   slot.  A read or write task takes its half out for the duration of the
//!   I/O and puts it back afterwards, so no lock is held across an await and
//!   `close` or a new `connect` never waits on a stalled peer.
//! - Every connect and close bumps the slot's session number.  A half
//!   returned by a task from an older session is dropped instead of
//!   restored.

pub mod mock;

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::mpsc,
};
use tracing::{debug, info, warn};

use crate::application::connection::{NetCompletion, Transport};
use crate::application::controller::ClientEvent;

/// Upper bound on the bytes requested from the socket in one read.
pub const MAX_READ_CHUNK: usize = 1 << 20;

/// The halves of the current stream, tagged with the session they belong to.
#[derive(Default)]
struct Halves {
    session: u64,
    reader: Option<OwnedReadHalf>,
    writer: Option<OwnedWriteHalf>,
}

type SharedHalves = Arc<Mutex<Halves>>;

fn lock(halves: &SharedHalves) -> MutexGuard<'_, Halves> {
    halves.lock().unwrap_or_else(PoisonError::into_inner)
}

/// TCP transport driven by the Tokio runtime.
pub struct TokioTransport {
    events: mpsc::UnboundedSender<ClientEvent>,
    halves: SharedHalves,
}

impl TokioTransport {
    /// Creates a transport that reports completions on `events`.
    pub fn new(events: mpsc::UnboundedSender<ClientEvent>) -> Self {
        Self {
            events,
            halves: Arc::new(Mutex::new(Halves::default())),
        }
    }
}

fn deliver(events: &mpsc::UnboundedSender<ClientEvent>, completion: NetCompletion) {
    if events.send(ClientEvent::Net(completion)).is_err() {
        debug!("controller gone; dropping network completion");
    }
}

impl Transport for TokioTransport {
    fn is_available(&self) -> bool {
        tokio::runtime::Handle::try_current().is_ok()
    }

    fn submit_resolve(&self, epoch: u64, host: &str, port: u16) {
        let events = self.events.clone();
        let target = format!("{host}:{port}");
        tokio::spawn(async move {
            let result = match tokio::net::lookup_host(&target).await {
                Ok(mut addrs) => addrs.next().ok_or_else(|| {
                    io::Error::new(io::ErrorKind::NotFound, format!("no addresses for {target}"))
                }),
                Err(e) => Err(e),
            };
            deliver(&events, NetCompletion::Resolved { epoch, result });
        });
    }

    fn submit_connect(&self, epoch: u64, addr: SocketAddr) {
        let events = self.events.clone();
        let halves = Arc::clone(&self.halves);
        tokio::spawn(async move {
            let result = match TcpStream::connect(addr).await {
                Ok(stream) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!("failed to set TCP_NODELAY: {e}");
                    }
                    let (reader, writer) = stream.into_split();
                    let mut slot = lock(&halves);
                    slot.session += 1;
                    slot.reader = Some(reader);
                    slot.writer = Some(writer);
                    info!("connected to {addr}");
                    Ok(())
                }
                Err(e) => Err(e),
            };
            deliver(&events, NetCompletion::Connected { epoch, result });
        });
    }

    fn submit_write(&self, epoch: u64, bytes: Vec<u8>) {
        let events = self.events.clone();
        let halves = Arc::clone(&self.halves);
        tokio::spawn(async move {
            let taken = {
                let mut slot = lock(&halves);
                slot.writer.take().map(|writer| (slot.session, writer))
            };
            let result = match taken {
                Some((session, mut writer)) => {
                    let result = writer.write_all(&bytes).await.map(|()| bytes.len());
                    let mut slot = lock(&halves);
                    if slot.session == session && slot.writer.is_none() {
                        slot.writer = Some(writer);
                    }
                    result
                }
                None => Err(io::Error::from(io::ErrorKind::NotConnected)),
            };
            deliver(&events, NetCompletion::Written { epoch, result });
        });
    }

    fn submit_read(&self, epoch: u64, max_len: usize) {
        let events = self.events.clone();
        let halves = Arc::clone(&self.halves);
        let len = max_len.min(MAX_READ_CHUNK);
        tokio::spawn(async move {
            let taken = {
                let mut slot = lock(&halves);
                slot.reader.take().map(|reader| (slot.session, reader))
            };
            let result = match taken {
                Some((session, mut reader)) => {
                    let mut chunk = vec![0u8; len];
                    let result = match reader.read(&mut chunk).await {
                        Ok(0) => Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "connection closed by server",
                        )),
                        Ok(n) => {
                            chunk.truncate(n);
                            Ok(chunk)
                        }
                        Err(e) => Err(e),
                    };
                    let mut slot = lock(&halves);
                    if slot.session == session && slot.reader.is_none() {
                        slot.reader = Some(reader);
                    }
                    result
                }
                None => Err(io::Error::from(io::ErrorKind::NotConnected)),
            };
            deliver(&events, NetCompletion::Read { epoch, result });
        });
    }

    fn close(&self) {
        let mut slot = lock(&self.halves);
        slot.session += 1;
        slot.reader = None;
        slot.writer = None;
        debug!("socket closed");
    }
}
