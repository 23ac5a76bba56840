//! Transport trait for modem communication.
//!
//! The [`Transport`] trait abstracts over the physical link to the modem.
//! Implementations exist for serial ports (the usual connection for a
//! Swarm M138 breakout) and for mock transports used in testing.
//!
//! The protocol engine in `swarmlink-modem` operates on a `Transport`
//! rather than directly on a serial port, enabling both real hardware
//! control and deterministic unit testing with `MockTransport` from the
//! `swarmlink-test-harness` crate.
//!
//! Transport failures do not cross the core boundary as panics: the driver
//! maps them onto [`LinkState`](crate::types::LinkState) transitions so the
//! operator sees "port gone" in the shared status rather than a crash.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to the modem.
///
/// Implementations handle buffering and error recovery at the physical
/// layer. Protocol-level concerns (frame envelopes, checksums, line
/// termination) are handled by the protocol engine that consumes this
/// trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the modem.
    ///
    /// Implementations should block until all bytes have been written to
    /// the underlying transport (serial TX buffer, socket, etc.).
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the modem into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Will wait up to `timeout`
    /// for data to arrive; returns [`Error::Timeout`](crate::error::Error::Timeout)
    /// if no data is received within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
