//! # swarmlink -- Async driver for the Swarm M138 satellite modem
//!
//! `swarmlink` drives a [Swarm M138](https://swarm.space) satellite modem
//! over its serial interface: framing and checksumming commands, decoding
//! the modem's tagged telemetry, draining the on-device mailbox, and
//! building the text-message, GPS-ping, and GRIB weather-request payloads
//! that ride the Swarm network. It is written for offshore and off-grid
//! applications where the modem is the only link.
//!
//! ## Quick Start
//!
//! Add `swarmlink` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! swarmlink = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! Connect, initialize, and watch telemetry:
//!
//! ```no_run
//! use swarmlink::{ModemBuilder, ModemEvent};
//!
//! #[tokio::main]
//! async fn main() -> swarmlink::Result<()> {
//!     let modem = ModemBuilder::new()
//!         .serial_port("/dev/ttyUSB0")
//!         .build()
//!         .await?;
//!
//!     let mut events = modem.subscribe();
//!     modem.init().await?;
//!     modem.start_polling();
//!
//!     while let Ok(event) = events.recv().await {
//!         match event {
//!             ModemEvent::SignalQuality { rssi } => println!("RSSI {rssi} dBm"),
//!             ModemEvent::MessageReceived { message, .. } => {
//!                 println!("{}", message.summary());
//!             }
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                     | Purpose                                       |
//! |---------------------------|-----------------------------------------------|
//! | `swarmlink-core`          | [`Transport`] trait, types, errors, events    |
//! | `swarmlink-transport`     | Serial transport implementation               |
//! | `swarmlink-modem`         | M138 protocol engine and [`SwarmModem`] driver |
//! | `swarmlink-test-harness`  | Mock transport for protocol tests             |
//! | **`swarmlink`**           | This facade crate -- re-exports everything    |
//!
//! ## Event Subscription
//!
//! The driver emits [`ModemEvent`]s through a broadcast channel: signal
//! quality, queue depths, position fixes, retrieved messages, and link
//! state changes. Subscribe before calling [`SwarmModem::init`] to see the
//! connect-time telemetry too.
//!
//! ## Sending
//!
//! Outbound traffic is built by pure request builders and queued on the
//! modem with one call each:
//!
//! ```no_run
//! use swarmlink::{GribModel, GribRequest, TextMessage};
//! # async fn example(modem: &swarmlink::SwarmModem) -> swarmlink::Result<()> {
//! modem
//!     .send_text_message(&TextMessage::new("skipper", "eta", "thursday 0900"))
//!     .await?;
//! modem.send_gps_ping().await?;
//! modem
//!     .send_grib_request(&GribRequest::new(GribModel::Gfs))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub use swarmlink_core::*;

pub use swarmlink_modem::{
    DrainReport, GribField, GribFieldSet, GribModel, GribRequest, MailboxState, ModemBuilder,
    SwarmModem, TextMessage,
};

/// The M138 protocol engine: frame codec, command vocabulary, telemetry
/// dispatch, mailbox sequencing, and request builders.
pub mod modem {
    pub use swarmlink_modem::*;
}

/// Transport implementations (serial).
pub mod transport {
    pub use swarmlink_transport::*;
}
