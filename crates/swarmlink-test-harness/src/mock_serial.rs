//! Mock transport for deterministic testing of the protocol engine.
//!
//! [`MockTransport`] implements the [`Transport`] trait against in-memory
//! byte queues. The modem driver moves the transport into its background
//! reader task, so all test-side control goes through a [`MockController`]
//! obtained *before* the transport is handed over:
//!
//! - [`MockController::push_line`] injects an unsolicited telemetry line,
//!   as the modem would push `$RT`/`$GN` reports on its own schedule.
//! - [`MockController::reply_on`] arms a canned reply: when a sent frame
//!   contains the given text, the reply line is queued for the next read.
//! - [`MockController::sent_lines`] returns everything the driver wrote,
//!   one frame per element.
//!
//! # Example
//!
//! ```
//! use swarmlink_test_harness::MockTransport;
//!
//! let mock = MockTransport::new();
//! let controller = mock.controller();
//! controller.reply_on("MM R=100", "$MM 37550,-95,10,2,hello*00");
//! controller.push_line("$RT RSSI=-95*1b");
//! // Box::new(mock) now goes to ModemBuilder::build_with_transport().
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use swarmlink_core::error::{Error, Result};
use swarmlink_core::transport::Transport;

/// One armed canned reply: when a sent frame contains `trigger`, the next
/// queued line is released to the read side.
#[derive(Debug)]
struct CannedReply {
    trigger: String,
    lines: VecDeque<Vec<u8>>,
}

#[derive(Debug, Default)]
struct Shared {
    /// Bytes waiting to be read by the driver.
    incoming: Mutex<VecDeque<u8>>,
    /// Log of every `send()` call, one frame per element.
    sent: Mutex<Vec<Vec<u8>>>,
    /// Armed replies, matched in arming order.
    replies: Mutex<Vec<CannedReply>>,
    connected: AtomicBool,
}

/// A mock [`Transport`] for testing the protocol engine without hardware.
#[derive(Debug)]
pub struct MockTransport {
    shared: Arc<Shared>,
}

/// Test-side handle to a [`MockTransport`] that has been moved into the
/// driver. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MockController {
    shared: Arc<Shared>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        let shared = Arc::new(Shared::default());
        shared.connected.store(true, Ordering::SeqCst);
        MockTransport { shared }
    }

    /// Obtain a controller for this transport. Call before boxing the
    /// transport and handing it to the driver.
    pub fn controller(&self) -> MockController {
        MockController {
            shared: self.shared.clone(),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockController {
    /// Inject one unsolicited line, terminator appended.
    pub fn push_line(&self, line: &str) {
        let mut incoming = self.shared.incoming.lock().unwrap();
        incoming.extend(line.as_bytes());
        incoming.push_back(b'\n');
    }

    /// Inject raw bytes, exactly as given. Useful for split-frame and
    /// partial-line cases.
    pub fn push_bytes(&self, bytes: &[u8]) {
        self.shared.incoming.lock().unwrap().extend(bytes);
    }

    /// Arm a canned reply: the next sent frame containing `trigger`
    /// releases `line` (terminator appended) to the read side. Arming the
    /// same trigger again queues another reply behind the first.
    pub fn reply_on(&self, trigger: &str, line: &str) {
        let mut reply = line.as_bytes().to_vec();
        reply.push(b'\n');
        let mut replies = self.shared.replies.lock().unwrap();
        if let Some(existing) = replies.iter_mut().find(|r| r.trigger == trigger) {
            existing.lines.push_back(reply);
        } else {
            replies.push(CannedReply {
                trigger: trigger.to_string(),
                lines: VecDeque::from([reply]),
            });
        }
    }

    /// Every frame sent so far, raw.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.shared.sent.lock().unwrap().clone()
    }

    /// Every frame sent so far, as text with the terminator stripped.
    pub fn sent_lines(&self) -> Vec<String> {
        self.shared
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|frame| {
                String::from_utf8_lossy(frame)
                    .trim_end_matches(['\r', '\n'])
                    .to_string()
            })
            .collect()
    }

    /// Set the connected state. When `false`, `send()` and `receive()`
    /// return [`Error::NotConnected`].
    pub fn set_connected(&self, connected: bool) {
        self.shared.connected.store(connected, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.shared.connected.load(Ordering::SeqCst) {
            return Err(Error::NotConnected);
        }

        self.shared.sent.lock().unwrap().push(data.to_vec());

        // Release the first armed reply whose trigger appears in the frame.
        let text = String::from_utf8_lossy(data).to_string();
        let released = {
            let mut replies = self.shared.replies.lock().unwrap();
            replies
                .iter_mut()
                .find(|r| text.contains(&r.trigger))
                .and_then(|r| r.lines.pop_front())
        };
        if let Some(reply) = released {
            self.shared.incoming.lock().unwrap().extend(reply);
        }
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.shared.connected.load(Ordering::SeqCst) {
                return Err(Error::NotConnected);
            }
            {
                let mut incoming = self.shared.incoming.lock().unwrap();
                if !incoming.is_empty() {
                    let n = incoming.len().min(buf.len());
                    for slot in buf.iter_mut().take(n) {
                        *slot = incoming.pop_front().unwrap_or_default();
                    }
                    return Ok(n);
                }
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.shared.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pushed_lines_come_back_in_order() {
        let mut mock = MockTransport::new();
        let controller = mock.controller();
        controller.push_line("$RT RSSI=-95*1b");
        controller.push_line("$MT 0*12");

        let mut buf = [0u8; 64];
        let n = mock.receive(&mut buf, Duration::from_millis(50)).await.unwrap();
        assert_eq!(&buf[..n], b"$RT RSSI=-95*1b\n$MT 0*12\n");
    }

    #[tokio::test]
    async fn empty_queue_times_out() {
        let mut mock = MockTransport::new();
        let mut buf = [0u8; 8];
        let err = mock.receive(&mut buf, Duration::from_millis(20)).await;
        assert!(matches!(err, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn canned_reply_released_by_matching_send() {
        let mut mock = MockTransport::new();
        let controller = mock.controller();
        controller.reply_on("MM R=7", "$MM 37550,-95,10,2,seven*00");

        // A non-matching frame releases nothing.
        mock.send(b"$CS*10\n").await.unwrap();
        let mut buf = [0u8; 64];
        assert!(mock.receive(&mut buf, Duration::from_millis(20)).await.is_err());

        mock.send(b"$MM R=7*48\n").await.unwrap();
        let n = mock.receive(&mut buf, Duration::from_millis(50)).await.unwrap();
        assert_eq!(&buf[..n], b"$MM 37550,-95,10,2,seven*00\n");

        assert_eq!(controller.sent_lines(), ["$CS*10", "$MM R=7*48"]);
    }

    #[tokio::test]
    async fn repeated_trigger_queues_replies() {
        let mut mock = MockTransport::new();
        let controller = mock.controller();
        controller.reply_on("MM L=U", "$MM 1,100*00");
        controller.reply_on("MM L=U", "$MM 0*10");

        let mut buf = [0u8; 64];
        mock.send(b"$MM L=U*04\n").await.unwrap();
        let n = mock.receive(&mut buf, Duration::from_millis(50)).await.unwrap();
        assert_eq!(&buf[..n], b"$MM 1,100*00\n");

        mock.send(b"$MM L=U*04\n").await.unwrap();
        let n = mock.receive(&mut buf, Duration::from_millis(50)).await.unwrap();
        assert_eq!(&buf[..n], b"$MM 0*10\n");
    }

    #[tokio::test]
    async fn disconnected_refuses_io() {
        let mut mock = MockTransport::new();
        let controller = mock.controller();
        controller.set_connected(false);

        assert!(matches!(mock.send(b"$CS*10\n").await, Err(Error::NotConnected)));
        let mut buf = [0u8; 8];
        assert!(matches!(
            mock.receive(&mut buf, Duration::from_millis(10)).await,
            Err(Error::NotConnected)
        ));
        assert!(!mock.is_connected());
    }

    #[tokio::test]
    async fn partial_reads_respect_the_buffer() {
        let mut mock = MockTransport::new();
        let controller = mock.controller();
        controller.push_bytes(b"$GN 48.5,-123.25,12,270,9*0a\n");

        let mut small = [0u8; 4];
        let n = mock.receive(&mut small, Duration::from_millis(20)).await.unwrap();
        assert_eq!(&small[..n], b"$GN ");
        let n = mock.receive(&mut small, Duration::from_millis(20)).await.unwrap();
        assert_eq!(&small[..n], b"48.5");
    }
}
