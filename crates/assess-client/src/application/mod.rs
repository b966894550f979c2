//! Application layer for assess-client.
//!
//! **Dependency rule**: this layer may depend on `domain` and `assess_core`.
//! The network is reached only through the [`connection::Transport`] trait,
//! which the infrastructure layer implements (and which tests replace with a
//! recording double).  The single exception is [`client::ChatClient::new`],
//! which wires in the default WebSocket transport.
//!
//! # Sub-modules
//!
//! - **`timer`** – cancelable one-shot and repeating timers.
//! - **`connection`** – the connection state machine (connect, heartbeat,
//!   reconnect, teardown) and the transport seam.
//! - **`dispatcher`** – classifies decoded envelopes into chat lines and
//!   assessment reports and fans them out to subscribers.
//! - **`client`** – the [`client::ChatClient`] facade and its driver task.

pub mod client;
pub mod connection;
pub mod dispatcher;
pub mod timer;
