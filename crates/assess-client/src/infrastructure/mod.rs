//! Infrastructure layer for assess-client.
//!
//! Contains the adapters that touch the outside world: the WebSocket link and
//! the TOML configuration file.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain` and
//! `assess_core`.  Apart from the default transport wired in by
//! `ChatClient::new`, nothing in the inner layers imports it.
//!
//! # Sub-modules
//!
//! - **`transport`** – [`transport::WsTransport`], which runs one
//!   tokio-tungstenite connection per link, and [`transport::RecordingTransport`],
//!   an in-memory double that records traffic and lets tests play the server.
//!
//! - **`storage`** – loading [`crate::domain::ClientConfig`] from a TOML file.

pub mod storage;
pub mod transport;
