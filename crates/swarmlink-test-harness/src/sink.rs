//! Recording message sink for drain tests.

use std::sync::Mutex;

use swarmlink_core::sink::MessageSink;
use swarmlink_core::types::IncomingMessage;

/// A [`MessageSink`] that records everything it is handed, for asserting
/// on the outcome of a mailbox drain.
#[derive(Debug, Default)]
pub struct RecordingSink {
    logged: Mutex<Vec<IncomingMessage>>,
    gribs: Mutex<Vec<IncomingMessage>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        RecordingSink::default()
    }

    /// Messages appended to the message log, in arrival order.
    pub fn logged(&self) -> Vec<IncomingMessage> {
        self.logged.lock().unwrap().clone()
    }

    /// GRIB payloads written, in arrival order.
    pub fn gribs(&self) -> Vec<IncomingMessage> {
        self.gribs.lock().unwrap().clone()
    }
}

impl MessageSink for RecordingSink {
    fn append_message_log(&self, message: &IncomingMessage) {
        self.logged.lock().unwrap().push(message.clone());
    }

    fn write_grib_payload(&self, message: &IncomingMessage) {
        self.gribs.lock().unwrap().push(message.clone());
    }
}
