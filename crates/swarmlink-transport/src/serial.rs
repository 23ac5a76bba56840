//! Serial port transport for the Swarm M138.
//!
//! The M138 presents as a USB virtual COM port (or a 3.3V UART on the
//! breakout header) speaking 115200 baud, 8 data bits, 1 stop bit, no
//! parity. [`SerialTransport`] implements the [`Transport`] trait over
//! that link.
//!
//! # Example
//!
//! ```no_run
//! use swarmlink_transport::SerialTransport;
//! use swarmlink_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> swarmlink_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 115_200).await?;
//!
//! // Frame and send a command (normally done by the modem driver).
//! transport.send(b"$CS*10\n").await?;
//!
//! // Read whatever the modem pushes, with a 1 second timeout.
//! let mut buf = [0u8; 256];
//! let n = transport.receive(&mut buf, Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::time::Duration;
use swarmlink_core::error::{Error, Result};
use swarmlink_core::transport::Transport;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// Serial port configuration.
///
/// The defaults match the M138 interface: 115200 baud, 8 data bits,
/// 1 stop bit, no parity, no flow control.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate. The M138 is fixed at 115200 unless reconfigured.
    pub baud_rate: u32,
    /// Number of data bits.
    pub data_bits: tokio_serial::DataBits,
    /// Number of stop bits.
    pub stop_bits: tokio_serial::StopBits,
    /// Parity checking.
    pub parity: tokio_serial::Parity,
    /// Flow control.
    pub flow_control: tokio_serial::FlowControl,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: tokio_serial::DataBits::Eight,
            stop_bits: tokio_serial::StopBits::One,
            parity: tokio_serial::Parity::None,
            flow_control: tokio_serial::FlowControl::None,
        }
    }
}

/// Serial port transport for modem communication.
pub struct SerialTransport {
    /// The underlying serial port stream, `None` after close.
    port: Option<SerialStream>,
    /// Port name for logging.
    port_name: String,
}

impl SerialTransport {
    /// Open a serial port with the given baud rate and default settings.
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g., "/dev/ttyUSB0" on Linux, "COM3"
    ///   on Windows)
    /// * `baud_rate` - Baud rate, normally 115200
    pub async fn open(port: &str, baud_rate: u32) -> Result<Self> {
        let config = SerialConfig {
            baud_rate,
            ..Default::default()
        };
        Self::open_with_config(port, config).await
    }

    /// Open a serial port with full configuration control.
    pub async fn open_with_config(port: &str, config: SerialConfig) -> Result<Self> {
        tracing::debug!(
            port = %port,
            baud_rate = config.baud_rate,
            "Opening serial port"
        );

        let serial_stream = tokio_serial::new(port, config.baud_rate)
            .data_bits(config.data_bits)
            .stop_bits(config.stop_bits)
            .parity(config.parity)
            .flow_control(config.flow_control)
            .open_native_async()
            .map_err(|e| {
                tracing::error!(port = %port, error = %e, "Failed to open serial port");
                Error::Transport(format!("Failed to open serial port {}: {}", port, e))
            })?;

        tracing::info!(port = %port, baud_rate = config.baud_rate, "Serial port opened");

        Ok(Self {
            port: Some(serial_stream),
            port_name: port.to_string(),
        })
    }

    /// Get the name of the serial port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(
            port = %self.port_name,
            bytes = data.len(),
            "Sending data"
        );

        port.write_all(data).await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to send data");
            Error::Io(e)
        })?;

        // Flush so a whole frame leaves at once.
        port.flush().await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to flush serial port");
            Error::Io(e)
        })?;

        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        match tokio::time::timeout(timeout, port.read(buf)).await {
            Ok(Ok(n)) => {
                tracing::trace!(port = %self.port_name, bytes = n, "Received data");
                Ok(n)
            }
            Ok(Err(e)) => {
                tracing::error!(port = %self.port_name, error = %e, "Failed to receive data");
                Err(Error::Io(e))
            }
            Err(_) => Err(Error::Timeout),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            tracing::debug!(port = %self.port_name, "Closing serial port");
            if let Err(e) = port.flush().await {
                tracing::warn!(
                    port = %self.port_name,
                    error = %e,
                    "Failed to flush before closing (continuing anyway)"
                );
            }
            // Dropping the stream closes the port.
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_config_defaults_match_the_modem() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.data_bits, tokio_serial::DataBits::Eight);
        assert_eq!(config.stop_bits, tokio_serial::StopBits::One);
        assert_eq!(config.parity, tokio_serial::Parity::None);
        assert_eq!(config.flow_control, tokio_serial::FlowControl::None);
    }

    #[tokio::test]
    async fn open_bad_port_is_a_transport_error() {
        let result = SerialTransport::open("/dev/does-not-exist-swarmlink", 115_200).await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
