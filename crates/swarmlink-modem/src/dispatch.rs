//! Telemetry dispatcher.
//!
//! Consumes decoded [`TelemetryLine`]s one at a time, in arrival order,
//! and applies them to the shared [`StatusModel`] and the event channel.
//! The dispatcher performs no I/O: queue-depth and signal lines become
//! state mutations plus events, position fixes replace the shared fix
//! wholesale, and everything unrecognised is forwarded verbatim as a
//! [`ModemEvent::RawLine`] so nothing the modem says is silently dropped.
//!
//! When a mailbox-count line carries unread identifiers, the dispatcher
//! reports them back to the caller (the reader loop) instead of touching
//! the transport itself; starting the drain is the driver's business.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use swarmlink_core::events::ModemEvent;
use swarmlink_core::status::StatusModel;

use crate::protocol::TelemetryLine;

/// What the reader loop should do after a line was dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Nothing further; the line was fully absorbed.
    Handled,
    /// The modem reported unread messages; these identifiers are ready to
    /// be drained, in device order.
    UnreadIds(Vec<String>),
}

/// Applies telemetry to the shared status and the event channel.
pub struct Dispatcher {
    status: Arc<StatusModel>,
    event_tx: broadcast::Sender<ModemEvent>,
}

impl Dispatcher {
    /// Create a dispatcher writing to the given status model and event
    /// channel.
    pub fn new(status: Arc<StatusModel>, event_tx: broadcast::Sender<ModemEvent>) -> Self {
        Dispatcher { status, event_tx }
    }

    /// Dispatch one decoded line.
    ///
    /// Event sends are best-effort: a send error only means nobody is
    /// subscribed right now.
    pub fn dispatch(&self, line: TelemetryLine) -> DispatchOutcome {
        match line {
            TelemetryLine::LinkQuality { rssi } => {
                self.status.set_rssi(rssi);
                let _ = self.event_tx.send(ModemEvent::SignalQuality { rssi });
            }
            TelemetryLine::TxQueueDepth { count } => {
                self.status.set_tx_waiting(count);
                self.emit_queue_depths();
            }
            TelemetryLine::RxQueueDepth { count, ids } => {
                self.status.set_rx_waiting(count);
                self.emit_queue_depths();
                if !ids.is_empty() {
                    debug!(unread = ids.len(), "mailbox reports unread messages");
                    return DispatchOutcome::UnreadIds(ids);
                }
            }
            TelemetryLine::GeoFix(fix) => {
                self.status.replace_fix(fix);
                let _ = self.event_tx.send(ModemEvent::PositionUpdated(fix));
            }
            TelemetryLine::Raw { text } => {
                let _ = self.event_tx.send(ModemEvent::RawLine(text));
            }
        }
        DispatchOutcome::Handled
    }

    fn emit_queue_depths(&self) {
        let link = self.status.link();
        let _ = self.event_tx.send(ModemEvent::QueueDepths {
            tx_waiting: link.tx_waiting,
            rx_waiting: link.rx_waiting,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarmlink_core::types::GeoFix;

    fn dispatcher() -> (Dispatcher, Arc<StatusModel>, broadcast::Receiver<ModemEvent>) {
        let status = Arc::new(StatusModel::new());
        let (event_tx, event_rx) = broadcast::channel(16);
        (Dispatcher::new(status.clone(), event_tx), status, event_rx)
    }

    #[test]
    fn link_quality_updates_status_and_emits() {
        let (dispatcher, status, mut rx) = dispatcher();
        let outcome = dispatcher.dispatch(TelemetryLine::LinkQuality { rssi: -99 });
        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(status.link().rssi, -99);
        assert!(matches!(
            rx.try_recv().unwrap(),
            ModemEvent::SignalQuality { rssi: -99 }
        ));
    }

    #[test]
    fn queue_depths_overwrite_fields() {
        let (dispatcher, status, _rx) = dispatcher();
        dispatcher.dispatch(TelemetryLine::TxQueueDepth { count: 3 });
        dispatcher.dispatch(TelemetryLine::RxQueueDepth {
            count: 1,
            ids: vec![],
        });
        let link = status.link();
        assert_eq!(link.tx_waiting, 3);
        assert_eq!(link.rx_waiting, 1);
    }

    #[test]
    fn unread_ids_are_reported_to_the_caller() {
        let (dispatcher, status, _rx) = dispatcher();
        let outcome = dispatcher.dispatch(TelemetryLine::RxQueueDepth {
            count: 2,
            ids: vec!["100".into(), "101".into()],
        });
        assert_eq!(
            outcome,
            DispatchOutcome::UnreadIds(vec!["100".into(), "101".into()])
        );
        // The count still landed in shared status first.
        assert_eq!(status.link().rx_waiting, 2);
    }

    #[test]
    fn geo_fix_replaces_wholesale() {
        let (dispatcher, status, mut rx) = dispatcher();
        let fix = GeoFix {
            latitude: 48.5,
            longitude: -123.25,
            altitude: 12,
            course: 270,
            speed: 9,
        };
        dispatcher.dispatch(TelemetryLine::GeoFix(fix));
        assert_eq!(status.fix(), fix);
        assert!(matches!(
            rx.try_recv().unwrap(),
            ModemEvent::PositionUpdated(f) if f == fix
        ));
    }

    #[test]
    fn raw_lines_are_forwarded_never_dropped() {
        let (dispatcher, _status, mut rx) = dispatcher();
        dispatcher.dispatch(TelemetryLine::Raw {
            text: "$FV v1.1.0*00".into(),
        });
        match rx.try_recv().unwrap() {
            ModemEvent::RawLine(text) => assert_eq!(text, "$FV v1.1.0*00"),
            other => panic!("expected RawLine, got {other:?}"),
        }
    }

    #[test]
    fn dispatch_survives_no_subscribers() {
        let status = Arc::new(StatusModel::new());
        let (event_tx, rx) = broadcast::channel(16);
        drop(rx);
        let dispatcher = Dispatcher::new(status, event_tx);
        // Nobody listening: state still updates, nothing panics.
        dispatcher.dispatch(TelemetryLine::LinkQuality { rssi: -101 });
    }
}
