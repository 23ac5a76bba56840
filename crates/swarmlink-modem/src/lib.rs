//! Swarm M138 protocol engine and modem driver for swarmlink.
//!
//! This crate implements the newline-terminated, `$...*HH`-framed ASCII
//! protocol spoken by the Swarm M138 satellite modem. It provides:
//!
//! - **Frame codec** ([`protocol`]) -- encode commands into the checksummed
//!   wire envelope and decode tagged telemetry lines, degrading anything
//!   malformed to a raw passthrough instead of failing the read loop.
//! - **Command vocabulary** ([`commands`]) -- typed constructors for every
//!   command the driver issues, plus recognition of `$MM` status chatter.
//! - **Telemetry dispatch** ([`dispatch`]) -- fold decoded lines into the
//!   shared status model and the event channel, in arrival order.
//! - **Mailbox sequencer** ([`mailbox`]) -- the Idle/Polling/Draining state
//!   machine that retrieves queued messages one identifier at a time, with
//!   per-identifier timeout and failure isolation.
//! - **Request builders** ([`request`], [`models`]) -- pure construction of
//!   text-message, GPS-ping, and GRIB payloads, including the per-model
//!   field rules and the 192-character packet budget.
//! - **Modem driver** ([`modem`]) -- ties the protocol engine to a
//!   [`Transport`](swarmlink_core::Transport) via a background reader task,
//!   with periodic mailbox polling and an hourly position tracker.
//! - **Builder** ([`builder`]) -- fluent builder API for constructing
//!   [`SwarmModem`] instances with smart defaults.
//!
//! # Example
//!
//! ```
//! use swarmlink_modem::protocol::{CommandFrame, decode_line, TelemetryLine};
//!
//! // Frame a "read configuration settings" command for the wire.
//! let frame = CommandFrame::encode("CS").unwrap();
//! assert_eq!(frame.wire_bytes(), b"$CS*10\n");
//!
//! // Decode a background RSSI report pushed by the modem.
//! match decode_line("$RT RSSI=-95*1b") {
//!     TelemetryLine::LinkQuality { rssi } => assert_eq!(rssi, -95),
//!     other => panic!("unexpected line {other:?}"),
//! }
//! ```

pub mod builder;
pub mod commands;
pub mod dispatch;
pub mod mailbox;
pub mod models;
pub mod modem;
pub mod protocol;
pub mod request;

mod reader;

// Re-export the primary types for ergonomic `use swarmlink_modem::*`.
pub use builder::ModemBuilder;
pub use mailbox::{DrainReport, MailboxState};
pub use models::{GribField, GribFieldSet, GribModel};
pub use modem::SwarmModem;
pub use request::{GribRequest, TextMessage};
