//! Mailbox sequencer.
//!
//! The modem queues received messages in an on-device mailbox. Draining it
//! is a small state machine:
//!
//! ```text
//! Idle -> Polling -> Draining -> Idle
//! ```
//!
//! - `Idle`: no outstanding request.
//! - `Polling`: the unread-list (`MM L=U`) and unsent-count (`MT C=U`)
//!   requests have been issued. An empty reply returns to `Idle`; a reply
//!   carrying identifiers moves to `Draining`.
//! - `Draining`: each identifier, in device order, is retrieved with
//!   `MM R=<id>`, awaited with a bounded timeout, parsed, classified, and
//!   emitted. Per-identifier failures are recorded and the drain advances;
//!   one bad or lost message never abandons the rest.
//!
//! A new poll is refused while a drain is in flight so the in-flight
//! sequence cannot be corrupted. Periodic and manual polling share the
//! same machine.
//!
//! The transport round-trip is abstracted behind [`Retrieve`] so the
//! drain logic can be exercised against a scripted retriever in tests;
//! the real implementation lives in the reader task, which owns the
//! transport and keeps dispatching unrelated telemetry while it waits.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use swarmlink_core::error::{Error, Result};
use swarmlink_core::events::ModemEvent;
use swarmlink_core::sink::MessageSink;
use swarmlink_core::types::{IncomingMessage, MessageKind};

use crate::protocol::split_fields;

/// Where the sequencer is in its poll/drain cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MailboxState {
    /// No outstanding request.
    #[default]
    Idle,
    /// Waiting for the unread-list reply.
    Polling,
    /// Retrieving queued identifiers one at a time.
    Draining,
}

/// One identifier whose retrieval failed during a drain.
#[derive(Debug)]
pub struct DrainFailure {
    /// The mailbox identifier that failed.
    pub id: String,
    /// Why it failed (timeout, short payload, transport loss).
    pub error: Error,
}

/// Outcome of one drain pass.
#[derive(Debug, Default)]
pub struct DrainReport {
    /// Messages successfully retrieved and emitted.
    pub retrieved: usize,
    /// Identifiers that failed, in encounter order.
    pub failed: Vec<DrainFailure>,
}

/// The retrieval round-trip: send `MM R=<id>`, return the single reply
/// line.
///
/// Implementations must bound the wait; a reply that never comes surfaces
/// as [`Error::Timeout`] rather than hanging the drain.
#[async_trait]
pub trait Retrieve: Send {
    /// Retrieve one message by identifier, returning the raw reply line.
    async fn retrieve(&mut self, id: &str) -> Result<String>;
}

/// Parse a retrieval reply line into an [`IncomingMessage`].
///
/// The payload is a fixed five-field split on the protocol delimiter set:
/// application ID, RSSI, SNR, frequency deviation, data. A leading `$MM`
/// tag and a trailing checksum are stripped first. Fewer than five fields
/// is a decode failure; the application ID must be numeric (it drives
/// classification), while the three signal metrics parse leniently.
pub fn parse_incoming(line: &str) -> Result<IncomingMessage> {
    let text = line.trim_end_matches(['\r', '\n']);
    let mut fields = split_fields(text);

    // Drop the tag and the checksum; neither is a payload field.
    if fields.first().is_some_and(|f| f.starts_with('$')) {
        fields.remove(0);
    }
    if text.contains('*') && !fields.is_empty() {
        fields.pop();
    }

    if fields.len() < 5 {
        return Err(Error::Protocol(format!(
            "mailbox payload has {} fields, expected 5: {text}",
            fields.len()
        )));
    }

    let app_id = fields[0]
        .parse::<u32>()
        .map_err(|_| Error::Protocol(format!("non-numeric app id in mailbox payload: {text}")))?;

    Ok(IncomingMessage {
        app_id,
        rssi: fields[1].parse().unwrap_or(0),
        snr: fields[2].parse().unwrap_or(0),
        fdev: fields[3].parse().unwrap_or(0),
        data: fields[4].to_string(),
    })
}

/// The poll/drain state machine, shared between the driver (which starts
/// polls) and the reader task (which runs drains).
#[derive(Debug, Default)]
pub struct MailboxSequencer {
    state: Mutex<MailboxState>,
}

impl MailboxSequencer {
    /// Create a sequencer in `Idle`.
    pub fn new() -> Self {
        MailboxSequencer::default()
    }

    /// Current state.
    pub fn state(&self) -> MailboxState {
        *self.state.lock().expect("mailbox state lock poisoned")
    }

    /// Try to start a poll. Refused (returns `false`) while a drain is in
    /// flight; a repeat poll while already `Polling` is allowed and
    /// harmless.
    pub fn try_begin_poll(&self) -> bool {
        let mut state = self.state.lock().expect("mailbox state lock poisoned");
        match *state {
            MailboxState::Draining => false,
            _ => {
                *state = MailboxState::Polling;
                true
            }
        }
    }

    /// Record that the poll came back with an empty mailbox.
    pub fn poll_returned_empty(&self) {
        let mut state = self.state.lock().expect("mailbox state lock poisoned");
        if *state == MailboxState::Polling {
            *state = MailboxState::Idle;
        }
    }

    /// Drain the given identifiers in order.
    ///
    /// Refuses (returns `None`) if a drain is already in flight. Each
    /// retrieved message is classified by application ID, handed to the
    /// persistence sink (text and unknown messages to the message log,
    /// GRIB payloads to the grid store), and announced on the event
    /// channel. Failures are recorded per identifier and never abort the
    /// remaining retrievals. Always returns to `Idle`.
    pub async fn drain<R: Retrieve + ?Sized>(
        &self,
        ids: &[String],
        retriever: &mut R,
        sink: &dyn MessageSink,
        event_tx: &broadcast::Sender<ModemEvent>,
    ) -> Option<DrainReport> {
        {
            let mut state = self.state.lock().expect("mailbox state lock poisoned");
            if *state == MailboxState::Draining {
                debug!("mailbox drain refused: one already in flight");
                return None;
            }
            *state = MailboxState::Draining;
        }

        let mut report = DrainReport::default();
        for id in ids {
            match retriever.retrieve(id).await.and_then(|l| parse_incoming(&l)) {
                Ok(message) => {
                    let kind = message.kind();
                    debug!(id, ?kind, "mailbox message retrieved");
                    match kind {
                        MessageKind::Grib => sink.write_grib_payload(&message),
                        MessageKind::Text | MessageKind::Unknown => {
                            sink.append_message_log(&message)
                        }
                    }
                    let _ = event_tx.send(ModemEvent::MessageReceived { kind, message });
                    report.retrieved += 1;
                }
                Err(error) => {
                    warn!(id, %error, "mailbox retrieval failed, continuing");
                    report.failed.push(DrainFailure {
                        id: id.clone(),
                        error,
                    });
                }
            }
        }

        let _ = event_tx.send(ModemEvent::MailboxDrained {
            retrieved: report.retrieved,
            failed: report.failed.len(),
        });

        *self.state.lock().expect("mailbox state lock poisoned") = MailboxState::Idle;
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use swarmlink_core::sink::NullSink;

    /// Scripted retriever: pops one pre-loaded result per call.
    struct ScriptedRetriever {
        replies: VecDeque<Result<String>>,
        asked: Vec<String>,
    }

    impl ScriptedRetriever {
        fn new(replies: Vec<Result<String>>) -> Self {
            ScriptedRetriever {
                replies: replies.into(),
                asked: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl Retrieve for ScriptedRetriever {
        async fn retrieve(&mut self, id: &str) -> Result<String> {
            self.asked.push(id.to_string());
            self.replies.pop_front().unwrap_or(Err(Error::Timeout))
        }
    }

    /// Sink that records what it was handed.
    #[derive(Default)]
    struct RecordingSink {
        logged: StdMutex<Vec<IncomingMessage>>,
        gribs: StdMutex<Vec<IncomingMessage>>,
    }

    impl MessageSink for RecordingSink {
        fn append_message_log(&self, message: &IncomingMessage) {
            self.logged.lock().unwrap().push(message.clone());
        }
        fn write_grib_payload(&self, message: &IncomingMessage) {
            self.gribs.lock().unwrap().push(message.clone());
        }
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    // ---------------------------------------------------------------
    // Payload parsing
    // ---------------------------------------------------------------

    #[test]
    fn parse_text_message_payload() {
        let msg = parse_incoming("$MM 37550,-95,10,2,ahoy there*1c\n").unwrap();
        assert_eq!(msg.app_id, 37550);
        assert_eq!(msg.rssi, -95);
        assert_eq!(msg.snr, 10);
        assert_eq!(msg.fdev, 2);
        assert_eq!(msg.data, "ahoy");
        assert_eq!(msg.kind(), MessageKind::Text);
    }

    #[test]
    fn parse_grib_payload() {
        let msg = parse_incoming("$MM 37700,-101,8,1,0a1b2c3d*22").unwrap();
        assert_eq!(msg.kind(), MessageKind::Grib);
        assert_eq!(msg.grib_stem(), "0a1b2c");
    }

    #[test]
    fn parse_short_payload_is_decode_failure() {
        let err = parse_incoming("$MM 37550,-95,10*3a").unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn parse_non_numeric_app_id_is_decode_failure() {
        let err = parse_incoming("$MM DBX,-95,10,2,data*00").unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn parse_lenient_signal_metrics() {
        let msg = parse_incoming("$MM 12345,?,?,?,payload*00").unwrap();
        assert_eq!(msg.app_id, 12345);
        assert_eq!((msg.rssi, msg.snr, msg.fdev), (0, 0, 0));
        assert_eq!(msg.kind(), MessageKind::Unknown);
    }

    // ---------------------------------------------------------------
    // State machine
    // ---------------------------------------------------------------

    #[test]
    fn poll_transitions() {
        let seq = MailboxSequencer::new();
        assert_eq!(seq.state(), MailboxState::Idle);
        assert!(seq.try_begin_poll());
        assert_eq!(seq.state(), MailboxState::Polling);
        // Re-polling while polling is harmless.
        assert!(seq.try_begin_poll());
        seq.poll_returned_empty();
        assert_eq!(seq.state(), MailboxState::Idle);
    }

    #[tokio::test]
    async fn drain_emits_and_sinks_by_kind() {
        let seq = MailboxSequencer::new();
        let mut retriever = ScriptedRetriever::new(vec![
            Ok("$MM 37550,-95,10,2,hello*00".into()),
            Ok("$MM 37700,-99,9,1,grbdata*00".into()),
        ]);
        let sink = RecordingSink::default();
        let (event_tx, mut event_rx) = broadcast::channel(16);

        let report = seq
            .drain(&ids(&["100", "101"]), &mut retriever, &sink, &event_tx)
            .await
            .expect("drain accepted");

        assert_eq!(report.retrieved, 2);
        assert!(report.failed.is_empty());
        assert_eq!(retriever.asked, vec!["100", "101"]);
        assert_eq!(sink.logged.lock().unwrap().len(), 1);
        assert_eq!(sink.gribs.lock().unwrap().len(), 1);
        assert_eq!(seq.state(), MailboxState::Idle);

        assert!(matches!(
            event_rx.try_recv().unwrap(),
            ModemEvent::MessageReceived {
                kind: MessageKind::Text,
                ..
            }
        ));
        assert!(matches!(
            event_rx.try_recv().unwrap(),
            ModemEvent::MessageReceived {
                kind: MessageKind::Grib,
                ..
            }
        ));
        assert!(matches!(
            event_rx.try_recv().unwrap(),
            ModemEvent::MailboxDrained {
                retrieved: 2,
                failed: 0
            }
        ));
    }

    #[tokio::test]
    async fn drain_timeout_on_one_id_continues_with_the_rest() {
        let seq = MailboxSequencer::new();
        let mut retriever = ScriptedRetriever::new(vec![
            Ok("$MM 37550,-95,10,2,first*00".into()),
            Err(Error::Timeout),
            Ok("$MM 37550,-95,10,2,third*00".into()),
        ]);
        let sink = RecordingSink::default();
        let (event_tx, _event_rx) = broadcast::channel(16);

        let report = seq
            .drain(&ids(&["A", "B", "C"]), &mut retriever, &sink, &event_tx)
            .await
            .expect("drain accepted");

        // A and C were retrieved and emitted; exactly one failure for B.
        assert_eq!(report.retrieved, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, "B");
        assert!(matches!(report.failed[0].error, Error::Timeout));
        assert_eq!(retriever.asked, vec!["A", "B", "C"]);

        let logged = sink.logged.lock().unwrap();
        assert_eq!(logged.len(), 2);
        assert_eq!(logged[0].data, "first");
        assert_eq!(logged[1].data, "third");
    }

    #[tokio::test]
    async fn drain_malformed_reply_is_isolated() {
        let seq = MailboxSequencer::new();
        let mut retriever = ScriptedRetriever::new(vec![
            Ok("$MM DBX_NOMORE*2f".into()),
            Ok("$MM 37550,-95,10,2,ok*00".into()),
        ]);
        let sink = RecordingSink::default();
        let (event_tx, _event_rx) = broadcast::channel(16);

        let report = seq
            .drain(&ids(&["1", "2"]), &mut retriever, &sink, &event_tx)
            .await
            .expect("drain accepted");

        assert_eq!(report.retrieved, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, "1");
    }

    #[tokio::test]
    async fn second_drain_refused_while_in_flight() {
        let seq = MailboxSequencer::new();
        // Force the Draining state as the reader task would hold it.
        assert!(seq.try_begin_poll());
        *seq.state.lock().unwrap() = MailboxState::Draining;

        assert!(!seq.try_begin_poll());

        let mut retriever = ScriptedRetriever::new(vec![]);
        let sink = NullSink;
        let (event_tx, _rx) = broadcast::channel(4);
        let refused = seq.drain(&ids(&["9"]), &mut retriever, &sink, &event_tx).await;
        assert!(refused.is_none());
        assert!(retriever.asked.is_empty());
    }
}
