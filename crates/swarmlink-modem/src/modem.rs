//! SwarmModem -- the driver for a Swarm M138 satellite modem.
//!
//! Ties the line protocol ([`protocol`], [`commands`]) and the request
//! builders ([`request`]) to a [`Transport`]. The transport itself lives
//! in a background reader task (see [`reader`](crate::reader)); the driver
//! holds the command channel, the shared [`StatusModel`], and the mailbox
//! sequencer, plus the optional periodic tasks: the mailbox poll timer and
//! the position tracker.
//!
//! Commands on this protocol are fire-and-forget at the driver level: the
//! modem answers asynchronously with tagged telemetry lines, which the
//! reader task decodes and folds into the shared status. The only awaited
//! round-trip is the per-identifier mailbox retrieval, and that runs
//! inside the reader task.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use swarmlink_core::error::{Error, Result};
use swarmlink_core::events::ModemEvent;
use swarmlink_core::sink::MessageSink;
use swarmlink_core::status::{StatusModel, StatusSnapshot};
use swarmlink_core::transport::Transport;
use swarmlink_core::types::LinkState;

use crate::commands;
use crate::mailbox::MailboxSequencer;
use crate::protocol::CommandFrame;
use crate::reader::{self, CommandRequest, ReaderHandle};
use crate::request::{GribRequest, TextMessage};

/// A connected Swarm M138 modem.
///
/// Constructed via [`ModemBuilder`](crate::builder::ModemBuilder). All
/// device communication goes through the [`Transport`] provided at build
/// time, owned by the background reader task.
pub struct SwarmModem {
    status: Arc<StatusModel>,
    event_tx: broadcast::Sender<ModemEvent>,
    sequencer: Arc<MailboxSequencer>,
    reader: ReaderHandle,
    command_timeout: Duration,
    poll_interval: Duration,
    tracker_interval: Duration,
    poll_task: Mutex<Option<JoinHandle<()>>>,
    tracker_task: Mutex<Option<JoinHandle<()>>>,
}

impl SwarmModem {
    /// Create a new `SwarmModem` and spawn its reader task.
    ///
    /// This is called by [`ModemBuilder`](crate::builder::ModemBuilder);
    /// callers should use the builder API instead.
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        sink: Arc<dyn MessageSink>,
        command_timeout: Duration,
        retrieval_timeout: Duration,
        poll_interval: Duration,
        tracker_interval: Duration,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let status = Arc::new(StatusModel::new());
        let sequencer = Arc::new(MailboxSequencer::new());

        let reader = reader::spawn_reader_task(
            transport,
            status.clone(),
            event_tx.clone(),
            sequencer.clone(),
            sink,
            retrieval_timeout,
        );

        SwarmModem {
            status,
            event_tx,
            sequencer,
            reader,
            command_timeout,
            poll_interval,
            tracker_interval,
            poll_task: Mutex::new(None),
            tracker_task: Mutex::new(None),
        }
    }

    /// Subscribe to modem events.
    ///
    /// Every subscriber receives every event from the moment of
    /// subscription; a slow subscriber only lags itself.
    pub fn subscribe(&self) -> broadcast::Receiver<ModemEvent> {
        self.event_tx.subscribe()
    }

    /// A point-in-time copy of the shared link status and position fix.
    pub fn status(&self) -> StatusSnapshot {
        self.status.snapshot()
    }

    /// The shared status model, for callers that render it continuously.
    pub fn status_model(&self) -> Arc<StatusModel> {
        self.status.clone()
    }

    /// Frame and send one command.
    ///
    /// Waits only for the transport write to be acknowledged, not for any
    /// reply; replies arrive as telemetry. The framed text is echoed as a
    /// [`ModemEvent::CommandSent`].
    pub async fn send_command(&self, command: &str) -> Result<()> {
        let frame = CommandFrame::encode(command)?;
        debug!(command, "sending command frame");
        send_frame(&self.reader.cmd_tx, &frame, self.command_timeout).await?;
        let _ = self.event_tx.send(ModemEvent::CommandSent(frame.display()));
        Ok(())
    }

    /// Run the connect-time initialization sequence.
    ///
    /// Requests the configuration settings and firmware version, turns on
    /// background GNSS and RSSI telemetry at a 2-second rate, marks the
    /// link up, and kicks off the first mailbox poll.
    pub async fn init(&self) -> Result<()> {
        self.send_command(&commands::configuration_settings()).await?;
        self.send_command(&commands::firmware_version()).await?;
        self.send_command(&commands::gnss_rate(2)).await?;
        self.send_command(&commands::rssi_rate(2)).await?;

        self.status.set_state(LinkState::Connected);
        let _ = self.event_tx.send(ModemEvent::Connected);
        info!("modem initialized, telemetry enabled");

        self.check_mailbox().await
    }

    /// Poll the device queues: unread mailbox list and unsent count.
    ///
    /// Refused without error while a mailbox drain is in flight; the next
    /// poll picks up whatever the drain left behind.
    pub async fn check_mailbox(&self) -> Result<()> {
        if !self.sequencer.try_begin_poll() {
            debug!("mailbox poll skipped: drain in flight");
            return Ok(());
        }
        self.send_command(&commands::unread_list()).await?;
        self.send_command(&commands::unsent_count()).await
    }

    /// Queue a text message for transmission.
    pub async fn send_text_message(&self, message: &TextMessage) -> Result<()> {
        self.send_command(&message.to_command()).await
    }

    /// Queue a position ping built from the current fix.
    pub async fn send_gps_ping(&self) -> Result<()> {
        let fix = self.status.fix();
        self.send_command(&crate::request::ping_command(&fix)).await
    }

    /// Queue a GRIB weather-data request.
    pub async fn send_grib_request(&self, request: &GribRequest) -> Result<()> {
        self.send_command(&request.to_command()).await
    }

    /// Delete every unsent message from the device transmit queue.
    pub async fn flush_tx_queue(&self) -> Result<()> {
        self.send_command(&commands::flush_tx_queue()).await
    }

    /// Restart the modem.
    pub async fn restart(&self) -> Result<()> {
        self.send_command(&commands::restart()).await
    }

    /// Start the periodic mailbox poll. Idempotent.
    pub fn start_polling(&self) {
        let mut slot = self.poll_task.lock().expect("poll task lock poisoned");
        if slot.is_some() {
            debug!("mailbox polling already running");
            return;
        }
        let cmd_tx = self.reader.cmd_tx.clone();
        let sequencer = self.sequencer.clone();
        let interval = self.poll_interval;
        let timeout = self.command_timeout;
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick fires immediately; init already polled.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !sequencer.try_begin_poll() {
                    debug!("periodic mailbox poll skipped: drain in flight");
                    continue;
                }
                for command in [commands::unread_list(), commands::unsent_count()] {
                    let frame = match CommandFrame::encode(&command) {
                        Ok(frame) => frame,
                        Err(_) => continue,
                    };
                    if send_frame(&cmd_tx, &frame, timeout).await.is_err() {
                        debug!("mailbox poll send failed, reader gone");
                        return;
                    }
                }
            }
        }));
    }

    /// Stop the periodic mailbox poll. Idempotent.
    pub fn stop_polling(&self) {
        if let Some(task) = self.poll_task.lock().expect("poll task lock poisoned").take() {
            task.abort();
        }
    }

    /// Start the periodic position tracker: one GPS ping per interval,
    /// built from the fix current at each tick. Idempotent.
    pub fn start_tracker(&self) {
        let mut slot = self.tracker_task.lock().expect("tracker task lock poisoned");
        if slot.is_some() {
            debug!("tracker already running");
            return;
        }
        let cmd_tx = self.reader.cmd_tx.clone();
        let status = self.status.clone();
        let interval = self.tracker_interval;
        let timeout = self.command_timeout;
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let command = crate::request::ping_command(&status.fix());
                let frame = match CommandFrame::encode(&command) {
                    Ok(frame) => frame,
                    Err(_) => continue,
                };
                if send_frame(&cmd_tx, &frame, timeout).await.is_err() {
                    debug!("tracker ping send failed, reader gone");
                    return;
                }
                debug!("tracker ping queued");
            }
        }));
    }

    /// Stop the periodic position tracker. Idempotent.
    pub fn stop_tracker(&self) {
        if let Some(task) = self
            .tracker_task
            .lock()
            .expect("tracker task lock poisoned")
            .take()
        {
            task.abort();
        }
    }

    /// Close the connection: stop the periodic tasks, close the transport,
    /// and mark the link down.
    pub async fn close(&self) -> Result<()> {
        self.stop_polling();
        self.stop_tracker();

        let (response_tx, response_rx) = oneshot::channel();
        let result = match self
            .reader
            .cmd_tx
            .send(CommandRequest::Close { response_tx })
            .await
        {
            Ok(()) => match tokio::time::timeout(self.command_timeout, response_rx).await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Ok(()), // reader already gone
                Err(_) => Err(Error::Timeout),
            },
            Err(_) => Ok(()), // reader already gone
        };

        self.status.set_state(LinkState::Disconnected);
        let _ = self.event_tx.send(ModemEvent::Disconnected);
        result
    }
}

impl Drop for SwarmModem {
    fn drop(&mut self) {
        self.stop_polling();
        self.stop_tracker();
    }
}

/// Send one framed command through the reader channel and wait for the
/// transport-write acknowledgement.
async fn send_frame(
    cmd_tx: &mpsc::Sender<CommandRequest>,
    frame: &CommandFrame,
    timeout: Duration,
) -> Result<()> {
    let (response_tx, response_rx) = oneshot::channel();
    cmd_tx
        .send(CommandRequest::Send {
            frame: frame.wire_bytes(),
            response_tx,
        })
        .await
        .map_err(|_| Error::NotConnected)?;

    match tokio::time::timeout(timeout + Duration::from_millis(500), response_rx).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(Error::NotConnected), // oneshot sender dropped
        Err(_) => Err(Error::Timeout),          // overall timeout
    }
}
