//! Persistence collaborator interface for retrieved messages.
//!
//! The core never touches the filesystem. Retrieved mailbox messages are
//! handed to a [`MessageSink`] and then discarded; what "append to the
//! message log" or "write a GRIB payload" means (paths, formats, naming)
//! is entirely the implementor's business.

use crate::types::IncomingMessage;

/// Fire-and-forget persistence collaborator.
///
/// Called by the mailbox sequencer once per retrieved message. The core
/// does not await completion and ignores nothing-to-report outcomes; a
/// sink that needs durability guarantees should buffer internally.
pub trait MessageSink: Send + Sync {
    /// Append a text (or unknown-kind) message to the message log.
    fn append_message_log(&self, message: &IncomingMessage);

    /// Store a weather-grid payload.
    ///
    /// [`IncomingMessage::grib_stem`] gives the payload-derived file stem
    /// the original tooling used, if the implementor wants it.
    fn write_grib_payload(&self, message: &IncomingMessage);
}

/// A sink that drops everything, for callers that only want display events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MessageSink for NullSink {
    fn append_message_log(&self, _message: &IncomingMessage) {}
    fn write_grib_payload(&self, _message: &IncomingMessage) {}
}
