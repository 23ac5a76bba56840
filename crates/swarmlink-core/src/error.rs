//! Error types for swarmlink.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-layer, protocol-layer, and
//! request-building errors are all captured here.
//!
//! Note that inbound line decoding is deliberately infallible: a telemetry
//! line that does not fit its tag degrades to a raw pass-through line
//! instead of producing an error, so a malformed line can never abort the
//! read loop. Only failures of a whole operation (an empty outbound
//! command, a mailbox retrieval that never got its reply) surface here.

/// The error type for all swarmlink operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An outbound command string was empty.
    ///
    /// Rejected before any bytes are written to the transport; the modem
    /// has no meaningful response to an empty `$*HH` frame.
    #[error("empty command")]
    EmptyCommand,

    /// A transport-level error (serial port gone, write failed).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (malformed mailbox payload, unexpected reply).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for a reply from the modem.
    ///
    /// During a mailbox drain this marks a single identifier as failed;
    /// the sequencer then advances to the next identifier rather than
    /// hanging the link.
    #[error("timeout waiting for reply")]
    Timeout,

    /// No connection to the modem has been established, or it was lost.
    #[error("not connected")]
    NotConnected,

    /// An invalid parameter was passed to a request builder.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The requested operation is not implemented.
    ///
    /// Used for the declared extension points (multi-part message
    /// reassembly, payload compression).
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_empty_command() {
        let e = Error::EmptyCommand;
        assert_eq!(e.to_string(), "empty command");
    }

    #[test]
    fn error_display_transport() {
        let e = Error::Transport("port gone".into());
        assert_eq!(e.to_string(), "transport error: port gone");
    }

    #[test]
    fn error_display_protocol() {
        let e = Error::Protocol("short mailbox payload".into());
        assert_eq!(e.to_string(), "protocol error: short mailbox payload");
    }

    #[test]
    fn error_display_timeout() {
        let e = Error::Timeout;
        assert_eq!(e.to_string(), "timeout waiting for reply");
    }

    #[test]
    fn error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let e: Error = io.into();
        assert!(matches!(e, Error::Io(_)));
    }
}
