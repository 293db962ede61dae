//! Infrastructure layer for the thin client.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `thinview_core`, but MUST NOT be imported by the `application` layer
//! outside of tests.
//!
//! # Sub-modules
//!
//! - **`network`** – `TokioTransport`, the TCP implementation of `Transport`,
//!   plus a recording `MockTransport` for tests.
//! - **`display`** – `HeadlessDisplay`, a windowless `DisplayHost` with
//!   simulated vsync, plus a recording `MockDisplayHost`.
//! - **`input_source`** – Keyboard and pointer events parsed from stdin.
//! - **`nonce`** – Time-seeded `StdRng` nonce source.
//! - **`storage`** – TOML configuration loading.

pub mod display;
pub mod input_source;
pub mod network;
pub mod nonce;
pub mod storage;
