//! Domain layer for assess-client.
//!
//! Plain types with no dependencies on sockets, tasks, or files:
//!
//! - Configuration ([`ClientConfig`]) and its validation rules
//! - Connection state ([`ConnectionState`]) and lifecycle notifications
//!   ([`LifecycleEvent`])
//!
//! The infrastructure layer populates [`ClientConfig`] from a TOML file and
//! the command line; the application layer drives [`ConnectionState`].

pub mod config;
pub mod state;

pub use config::{ClientConfig, ConfigError};
pub use state::{ConnectionState, LifecycleEvent};
