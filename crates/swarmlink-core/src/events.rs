//! Asynchronous modem event types.
//!
//! Events are emitted by the modem driver through a `tokio::sync::broadcast`
//! channel as telemetry lines arrive and mailbox messages are retrieved.
//! Display layers subscribe to these events for real-time updates without
//! polling.

use crate::types::{GeoFix, IncomingMessage, MessageKind};

/// An event emitted by the modem driver.
///
/// Events are delivered on a best-effort basis through a bounded broadcast
/// channel; slow consumers may miss events under heavy telemetry load.
#[derive(Debug, Clone)]
pub enum ModemEvent {
    /// An inbound line that did not match any known telemetry tag, passed
    /// through verbatim for the serial monitor.
    ///
    /// Lines degrade to raw pass-through rather than being discarded, so
    /// the operator always sees what the modem said.
    RawLine(String),

    /// A command frame was written to the transport (serial monitor echo).
    CommandSent(String),

    /// Background RSSI reading changed (`$RT` telemetry).
    SignalQuality {
        /// RSSI in dBm.
        rssi: i32,
    },

    /// Modem queue depths changed (`$MT` / `$MM` telemetry).
    QueueDepths {
        /// Unsent messages in the transmit queue.
        tx_waiting: u32,
        /// Unread messages in the receive mailbox.
        rx_waiting: u32,
    },

    /// A new position fix was received (`$GN` telemetry).
    PositionUpdated(GeoFix),

    /// A mailbox message was retrieved and classified.
    MessageReceived {
        /// Payload classification.
        kind: MessageKind,
        /// The retrieved message.
        message: IncomingMessage,
    },

    /// A mailbox drain pass finished.
    MailboxDrained {
        /// Messages successfully retrieved and emitted.
        retrieved: usize,
        /// Identifiers whose retrieval failed (timeout or short payload).
        failed: usize,
    },

    /// The transport connected.
    Connected,

    /// The transport disconnected or the port went away.
    Disconnected,
}
