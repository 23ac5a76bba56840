//! Transport implementations for swarmlink.
//!
//! Concrete [`Transport`](swarmlink_core::Transport) implementations that
//! carry the M138 line protocol. Today that means the serial port the
//! modem enumerates as; the trait boundary is what lets the protocol
//! engine run against a mock in tests.

pub mod serial;

pub use serial::{SerialConfig, SerialTransport};
