//! Test utilities for swarmlink.
//!
//! Provides [`MockTransport`], an in-memory [`Transport`](swarmlink_core::Transport)
//! with test-side injection and inspection via [`MockController`], and
//! [`RecordingSink`], a [`MessageSink`](swarmlink_core::MessageSink) that
//! records retrieved messages for assertions.

pub mod mock_serial;
pub mod sink;

pub use mock_serial::{MockController, MockTransport};
pub use sink::RecordingSink;
