//! ModemBuilder -- fluent builder for constructing [`SwarmModem`] instances.
//!
//! Separates configuration from construction so that callers can set up
//! serial port parameters, timeout values, and the persistence sink before
//! establishing the transport connection.
//!
//! # Example
//!
//! ```no_run
//! use swarmlink_modem::builder::ModemBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> swarmlink_core::Result<()> {
//! let modem = ModemBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .baud_rate(115_200)
//!     .retrieval_timeout(Duration::from_secs(5))
//!     .build()
//!     .await?;
//! modem.init().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use swarmlink_core::error::{Error, Result};
use swarmlink_core::sink::{MessageSink, NullSink};
use swarmlink_core::transport::Transport;

use crate::modem::SwarmModem;

/// Default baud rate of the M138 serial interface.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Fluent builder for [`SwarmModem`].
///
/// All configuration has sensible defaults, so the simplest usage is:
///
/// ```ignore
/// let modem = ModemBuilder::new()
///     .serial_port("/dev/ttyUSB0")
///     .build()
///     .await?;
/// ```
pub struct ModemBuilder {
    serial_port: Option<String>,
    baud_rate: u32,
    command_timeout: Duration,
    retrieval_timeout: Duration,
    poll_interval: Duration,
    tracker_interval: Duration,
    sink: Arc<dyn MessageSink>,
}

impl ModemBuilder {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        ModemBuilder {
            serial_port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            command_timeout: Duration::from_millis(500),
            retrieval_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_secs(5),
            tracker_interval: Duration::from_secs(3600),
            sink: Arc::new(NullSink),
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the default baud rate (default: 115200).
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    /// Set the timeout for a single transport write to be acknowledged
    /// (default: 500ms).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the per-identifier timeout for a mailbox retrieval reply
    /// (default: 5s). A retrieval that misses this deadline fails that one
    /// identifier; the drain continues with the rest.
    pub fn retrieval_timeout(mut self, timeout: Duration) -> Self {
        self.retrieval_timeout = timeout;
        self
    }

    /// Set the periodic mailbox poll interval (default: 5s).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the position tracker ping interval (default: 1 hour).
    pub fn tracker_interval(mut self, interval: Duration) -> Self {
        self.tracker_interval = interval;
        self
    }

    /// Set the persistence sink that receives retrieved messages
    /// (default: [`NullSink`], which discards them after the event is
    /// emitted).
    pub fn message_sink(mut self, sink: Arc<dyn MessageSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Build a [`SwarmModem`] with a caller-provided transport.
    ///
    /// This is the primary entry point for testing (pass a
    /// `MockTransport` from `swarmlink-test-harness`) and for advanced
    /// use cases where the caller manages the transport lifecycle
    /// directly.
    pub fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<SwarmModem> {
        if self.retrieval_timeout.is_zero() {
            return Err(Error::InvalidParameter(
                "retrieval_timeout must be non-zero".into(),
            ));
        }
        Ok(SwarmModem::new(
            transport,
            self.sink,
            self.command_timeout,
            self.retrieval_timeout,
            self.poll_interval,
            self.tracker_interval,
        ))
    }

    /// Build a [`SwarmModem`] using a serial transport.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    pub async fn build(self) -> Result<SwarmModem> {
        let port = self
            .serial_port
            .as_ref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;

        let transport = swarmlink_transport::SerialTransport::open(port, self.baud_rate).await?;
        self.build_with_transport(Box::new(transport))
    }
}

impl Default for ModemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarmlink_core::types::LinkState;
    use swarmlink_test_harness::MockTransport;

    #[tokio::test]
    async fn builder_defaults() {
        let mock = MockTransport::new();
        let modem = ModemBuilder::new()
            .build_with_transport(Box::new(mock))
            .unwrap();

        assert_eq!(modem.status().link.state, LinkState::Disconnected);
        assert_eq!(modem.status().link.rssi, 0);
    }

    #[tokio::test]
    async fn builder_fluent_chain() {
        let mock = MockTransport::new();
        let modem = ModemBuilder::new()
            .serial_port("/dev/ttyUSB0")
            .baud_rate(9600)
            .command_timeout(Duration::from_millis(200))
            .retrieval_timeout(Duration::from_secs(2))
            .poll_interval(Duration::from_secs(10))
            .tracker_interval(Duration::from_secs(600))
            .build_with_transport(Box::new(mock));
        assert!(modem.is_ok());
    }

    #[tokio::test]
    async fn builder_rejects_zero_retrieval_timeout() {
        let mock = MockTransport::new();
        let result = ModemBuilder::new()
            .retrieval_timeout(Duration::ZERO)
            .build_with_transport(Box::new(mock));
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn builder_serial_port_required_for_build() {
        let result = ModemBuilder::new().build().await;
        assert!(result.is_err());
    }
}
