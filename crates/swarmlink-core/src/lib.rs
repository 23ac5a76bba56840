//! swarmlink-core: Core traits, types, and error definitions for swarmlink.
//!
//! This crate defines the device-agnostic abstractions the swarmlink modem
//! driver is built on. Control-panel applications depend on these types
//! without pulling in the protocol engine or a concrete transport.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel to the modem
//! - [`StatusModel`] -- single-writer shared link status and geolocation
//! - [`ModemEvent`] -- asynchronous telemetry and message notifications
//! - [`MessageSink`] -- persistence collaborator for retrieved messages
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod events;
pub mod helpers;
pub mod sink;
pub mod status;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use swarmlink_core::*`.
pub use error::{Error, Result};
pub use events::ModemEvent;
pub use helpers::{format_position, signal_band, SignalBand};
pub use sink::{MessageSink, NullSink};
pub use status::{StatusModel, StatusSnapshot};
pub use transport::Transport;
pub use types::*;
