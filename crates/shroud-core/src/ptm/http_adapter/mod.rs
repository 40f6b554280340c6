//! REST client for Tessera-compatible private transaction managers.
//!
//! Implements [`PrivateTransactionManager`](super::PrivateTransactionManager)
//! over the manager's third-party HTTP API using `reqwest`, with liveness
//! checks, one-time capability discovery from the advertised API versions,
//! and optional request rate limiting.

mod client;
mod connection;
mod protocol;

pub use client::HttpManager;
