//! Application layer of the thin client.
//!
//! Everything here is synchronous and I/O free.  Sockets, the display, and
//! randomness sit behind the [`connection::Transport`],
//! [`frame_pipeline::DisplayHost`], and [`frame_pipeline::NonceSource`]
//! traits, implemented in the infrastructure layer.
//!
//! - **`connection`** – Resolve/connect/read/write state machine with
//!   in-flight flags and connection epochs.
//! - **`frame_pipeline`** – One frame cycle at a time: buffer allocation,
//!   screen request, fill, present, flush.
//! - **`input_forwarder`** – Key events to `'K'` frames.
//! - **`controller`** – Startup sequencing and event routing.
//! - **`diagnostics`** – Timestamped status lines for the host console.

pub mod connection;
pub mod controller;
pub mod diagnostics;
pub mod frame_pipeline;
pub mod input_forwarder;
