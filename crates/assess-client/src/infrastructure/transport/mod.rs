//! Implementations of the [`crate::application::connection::Transport`] seam.

pub mod mock;
pub mod ws;

pub use mock::RecordingTransport;
pub use ws::WsTransport;
