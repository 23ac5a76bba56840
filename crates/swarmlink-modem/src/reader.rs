//! Background serial reader task.
//!
//! The modem pushes unsolicited telemetry lines (`$RT`, `$MT`, `$MM`,
//! `$GN`, ...) on its own schedule, so the transport is owned exclusively
//! by one background task that reads continuously. Outbound frames are
//! sent to the task via an `mpsc` channel and acknowledged via `oneshot`;
//! the task decodes every inbound line and hands it to the
//! [`Dispatcher`].
//!
//! When a dispatched mailbox-count line carries unread identifiers, the
//! task runs the drain inline: it retrieves each message with
//! `MM R=<id>` and, while waiting for the reply, keeps dispatching any
//! unrelated telemetry that arrives interleaved. Each retrieval wait is
//! bounded by the configured timeout so a lost reply fails that one
//! identifier instead of wedging the loop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use swarmlink_core::error::{Error, Result};
use swarmlink_core::events::ModemEvent;
use swarmlink_core::sink::MessageSink;
use swarmlink_core::status::StatusModel;
use swarmlink_core::transport::Transport;
use swarmlink_core::types::LinkState;

use crate::commands;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::mailbox::{MailboxSequencer, Retrieve};
use crate::protocol::{self, CommandFrame, TERMINATOR};

/// How long an idle transport read waits before the loop re-checks the
/// command channel.
const IDLE_READ_TIMEOUT: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A request sent from the driver to the reader task.
pub(crate) enum CommandRequest {
    /// A framed command to forward to the transport.
    Send {
        frame: Vec<u8>,
        response_tx: oneshot::Sender<Result<()>>,
    },
    /// Close the transport and exit the loop.
    Close {
        response_tx: oneshot::Sender<Result<()>>,
    },
}

/// Handle to the background reader task.
pub(crate) struct ReaderHandle {
    pub cmd_tx: mpsc::Sender<CommandRequest>,
    /// Kept so the task can be aborted when the driver is dropped.
    #[allow(dead_code)]
    pub task_handle: JoinHandle<()>,
}

/// Everything the loop needs besides the transport itself.
struct ReaderContext {
    dispatcher: Dispatcher,
    sequencer: Arc<MailboxSequencer>,
    sink: Arc<dyn MessageSink>,
    status: Arc<StatusModel>,
    event_tx: broadcast::Sender<ModemEvent>,
    retrieval_timeout: Duration,
}

// ---------------------------------------------------------------------------
// Line accumulation
// ---------------------------------------------------------------------------

/// Pop the next complete newline-terminated line out of `buf`, or `None`
/// if no terminator has arrived yet. Partial data stays for the next read.
fn next_line(buf: &mut Vec<u8>) -> Option<String> {
    let pos = buf.iter().position(|&b| b == TERMINATOR)?;
    let line: Vec<u8> = buf.drain(..=pos).collect();
    Some(String::from_utf8_lossy(&line).trim_end_matches(['\r', '\n']).to_string())
}

// ---------------------------------------------------------------------------
// Spawn
// ---------------------------------------------------------------------------

/// Spawn the background reader task.
///
/// The task owns the transport exclusively. Frames are sent via the
/// returned handle's channel; inbound lines are decoded and dispatched to
/// the shared status model and the event channel.
pub(crate) fn spawn_reader_task(
    transport: Box<dyn Transport>,
    status: Arc<StatusModel>,
    event_tx: broadcast::Sender<ModemEvent>,
    sequencer: Arc<MailboxSequencer>,
    sink: Arc<dyn MessageSink>,
    retrieval_timeout: Duration,
) -> ReaderHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel::<CommandRequest>(16);

    let ctx = ReaderContext {
        dispatcher: Dispatcher::new(status.clone(), event_tx.clone()),
        sequencer,
        sink,
        status,
        event_tx,
        retrieval_timeout,
    };

    let task_handle = tokio::spawn(reader_loop(transport, ctx, cmd_rx));

    ReaderHandle {
        cmd_tx,
        task_handle,
    }
}

// ---------------------------------------------------------------------------
// Reader loop
// ---------------------------------------------------------------------------

/// The main loop of the background reader task.
///
/// Uses `tokio::select! { biased; }` to prioritize outbound frames over
/// idle line reading.
async fn reader_loop(
    mut transport: Box<dyn Transport>,
    ctx: ReaderContext,
    mut cmd_rx: mpsc::Receiver<CommandRequest>,
) {
    let mut idle_buf = Vec::new();

    loop {
        tokio::select! {
            biased;

            // Priority: forward outbound frames.
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(CommandRequest::Send { frame, response_tx }) => {
                        let result = transport.send(&frame).await;
                        let _ = response_tx.send(result);
                    }
                    Some(CommandRequest::Close { response_tx }) => {
                        let result = transport.close().await;
                        let _ = response_tx.send(result);
                        debug!("transport closed, exiting reader loop");
                        break;
                    }
                    None => {
                        // All senders dropped -- the driver was dropped.
                        debug!("command channel closed, exiting reader loop");
                        break;
                    }
                }
            }

            // Idle: read telemetry pushed by the modem.
            read = async {
                let mut buf = [0u8; 512];
                transport
                    .receive(&mut buf, IDLE_READ_TIMEOUT)
                    .await
                    .map(|n| buf[..n].to_vec())
            } => {
                match read {
                    Ok(chunk) if !chunk.is_empty() => {
                        idle_buf.extend_from_slice(&chunk);
                        while let Some(line) = next_line(&mut idle_buf) {
                            handle_line(&line, &mut *transport, &ctx).await;
                        }
                    }
                    Ok(_) | Err(Error::Timeout) => {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                    Err(e) => {
                        // The port is gone (unplugged, revoked). Mark the
                        // link down and exit rather than spin on errors.
                        warn!(error = %e, "transport read failed, marking link down");
                        ctx.status.set_state(LinkState::Disconnected);
                        let _ = ctx.event_tx.send(ModemEvent::Disconnected);
                        break;
                    }
                }
            }
        }
    }
}

/// Decode and dispatch one complete inbound line, running a mailbox drain
/// when the line announces unread messages.
async fn handle_line(line: &str, transport: &mut dyn Transport, ctx: &ReaderContext) {
    if line.is_empty() {
        return;
    }
    let decoded = protocol::decode_line(line);

    // An empty mailbox reply closes out an in-flight poll.
    if matches!(&decoded, protocol::TelemetryLine::RxQueueDepth { ids, .. } if ids.is_empty()) {
        ctx.sequencer.poll_returned_empty();
    }

    match ctx.dispatcher.dispatch(decoded) {
        DispatchOutcome::Handled => {}
        DispatchOutcome::UnreadIds(ids) => {
            let mut retriever = TransportRetriever {
                transport,
                dispatcher: &ctx.dispatcher,
                carry: Vec::new(),
                timeout: ctx.retrieval_timeout,
            };
            ctx.sequencer
                .drain(&ids, &mut retriever, ctx.sink.as_ref(), &ctx.event_tx)
                .await;
        }
    }
}

// ---------------------------------------------------------------------------
// Retrieval over the live transport
// ---------------------------------------------------------------------------

/// [`Retrieve`] implementation over the live transport.
///
/// Sends `MM R=<id>` and waits for the reply with a bounded deadline. The
/// reply is the first `$MM` line that is not status chatter; every other
/// line that arrives while waiting is normal telemetry and gets dispatched
/// rather than discarded.
struct TransportRetriever<'a> {
    transport: &'a mut dyn Transport,
    dispatcher: &'a Dispatcher,
    /// Bytes read past the reply, carried to the next retrieval.
    carry: Vec<u8>,
    timeout: Duration,
}

#[async_trait]
impl Retrieve for TransportRetriever<'_> {
    async fn retrieve(&mut self, id: &str) -> Result<String> {
        let frame = CommandFrame::encode(&commands::read_message(id))?;
        self.transport.send(&frame.wire_bytes()).await?;

        let deadline = Instant::now() + self.timeout;
        loop {
            while let Some(line) = next_line(&mut self.carry) {
                if line.is_empty() {
                    continue;
                }
                if line.starts_with("$MM") {
                    if commands::is_mm_status_line(&line) {
                        debug!(line, "mailbox status chatter while retrieving");
                        continue;
                    }
                    return Ok(line);
                }
                // Interleaved telemetry -- dispatch it and keep waiting. A
                // drain is already in flight, so a nested unread list is
                // deliberately not acted on here.
                let _ = self.dispatcher.dispatch(protocol::decode_line(&line));
            }

            let remaining = deadline
                .checked_duration_since(Instant::now())
                .ok_or(Error::Timeout)?;
            let mut buf = [0u8; 512];
            match tokio::time::timeout(remaining, self.transport.receive(&mut buf, remaining)).await
            {
                Ok(Ok(n)) if n > 0 => self.carry.extend_from_slice(&buf[..n]),
                Ok(Ok(_)) => {}
                Ok(Err(Error::Timeout)) | Err(_) => {
                    warn!(id, "no retrieval reply before deadline");
                    return Err(Error::Timeout);
                }
                Ok(Err(e)) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_line_pops_complete_lines_only() {
        let mut buf = b"$RT RSSI=-95*1a\r\n$MT 0".to_vec();
        assert_eq!(next_line(&mut buf).as_deref(), Some("$RT RSSI=-95*1a"));
        // The partial second line stays for the next read.
        assert_eq!(next_line(&mut buf), None);
        assert_eq!(buf, b"$MT 0");

        buf.extend_from_slice(b"*2b\n");
        assert_eq!(next_line(&mut buf).as_deref(), Some("$MT 0*2b"));
        assert!(buf.is_empty());
    }

    #[test]
    fn next_line_strips_bare_terminators() {
        let mut buf = b"\n".to_vec();
        assert_eq!(next_line(&mut buf).as_deref(), Some(""));
        assert_eq!(next_line(&mut buf), None);
    }
}
