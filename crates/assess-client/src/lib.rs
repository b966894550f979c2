//! assess-client library crate.
//!
//! A persistent WebSocket client for a speech-assessment server, plus the
//! observer API a chat UI binds to.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Assessment server (JSON over WebSocket)
//!         ↕
//! [assess-client]
//!   ├── domain/           ClientConfig, ConnectionState, LifecycleEvent
//!   ├── application/
//!   │     ├── timer/       cancelable one-shot and repeating timers
//!   │     ├── connection/  ConnectionManager state machine + Transport seam
//!   │     ├── dispatcher/  envelope → ChatMessage / AssessmentReport fan-out
//!   │     └── client/      ChatClient facade and its driver task
//!   └── infrastructure/
//!         ├── transport/  tokio-tungstenite link, recording link for tests
//!         └── storage/    TOML config file loading
//!         ↕
//! Chat UI (on_message / on_assessment callbacks)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `assess-core`; it reaches the
//!   network only through the [`application::connection::Transport`] trait.
//! - `infrastructure` implements that trait and owns all file and socket I/O.
//!
//! # Execution model
//!
//! Each [`application::client::ChatClient`] spawns one driver task that owns
//! the connection state machine.  Facade calls, transport callbacks, heartbeat
//! ticks and reconnect firings all arrive on one channel and are handled one
//! at a time, so no two state transitions ever run concurrently.

/// Domain layer: configuration and lifecycle types (no I/O).
pub mod domain;

/// Application layer: state machine, timers, dispatch, facade.
pub mod application;

/// Infrastructure layer: WebSocket transport and config file storage.
pub mod infrastructure;

pub use application::client::ChatClient;
pub use domain::{ClientConfig, ConnectionState, LifecycleEvent};
