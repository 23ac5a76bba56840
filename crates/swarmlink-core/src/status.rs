//! Shared link status and geolocation state.
//!
//! [`StatusModel`] is the single shared instance of the link status and the
//! last known position fix. It has one writer role (the telemetry
//! dispatcher, plus the transport lifecycle for connection-state changes)
//! and many reader roles (the UI, the request builders). There are no
//! process-wide globals; the model is created once and injected wherever it
//! is needed behind an `Arc`.
//!
//! Readers always observe either a fully-old or fully-new [`GeoFix`]: the
//! fix is replaced wholesale under the lock, never mutated field by field.

use std::sync::RwLock;

use crate::types::{GeoFix, LinkState, LinkStatus};

/// A coherent read of the shared state: link status and position together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    /// Current link status.
    pub link: LinkStatus,
    /// Last known position fix.
    pub fix: GeoFix,
}

#[derive(Debug, Default)]
struct StatusInner {
    link: LinkStatus,
    fix: GeoFix,
}

/// Single-writer shared state container for link status and geolocation.
#[derive(Debug, Default)]
pub struct StatusModel {
    inner: RwLock<StatusInner>,
}

impl StatusModel {
    /// Create a new model in the `Disconnected` state with a zero fix.
    pub fn new() -> Self {
        StatusModel::default()
    }

    /// Take a coherent snapshot of link status and position.
    pub fn snapshot(&self) -> StatusSnapshot {
        let inner = self.inner.read().expect("status lock poisoned");
        StatusSnapshot {
            link: inner.link,
            fix: inner.fix,
        }
    }

    /// Current link status.
    pub fn link(&self) -> LinkStatus {
        self.inner.read().expect("status lock poisoned").link
    }

    /// Last known position fix.
    pub fn fix(&self) -> GeoFix {
        self.inner.read().expect("status lock poisoned").fix
    }

    /// Record a connection-state transition from the transport lifecycle.
    pub fn set_state(&self, state: LinkState) {
        self.inner.write().expect("status lock poisoned").link.state = state;
    }

    /// Record a background RSSI reading from `$RT` telemetry.
    pub fn set_rssi(&self, rssi: i32) {
        self.inner.write().expect("status lock poisoned").link.rssi = rssi;
    }

    /// Record the transmit queue depth from `$MT` telemetry.
    pub fn set_tx_waiting(&self, count: u32) {
        self.inner
            .write()
            .expect("status lock poisoned")
            .link
            .tx_waiting = count;
    }

    /// Record the unread mailbox depth from `$MM` telemetry.
    pub fn set_rx_waiting(&self, count: u32) {
        self.inner
            .write()
            .expect("status lock poisoned")
            .link
            .rx_waiting = count;
    }

    /// Replace the position fix wholesale.
    pub fn replace_fix(&self, fix: GeoFix) {
        self.inner.write().expect("status lock poisoned").fix = fix;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_starts_disconnected() {
        let status = StatusModel::new();
        let snap = status.snapshot();
        assert_eq!(snap.link.state, LinkState::Disconnected);
        assert_eq!(snap.link.rssi, 0);
        assert_eq!(snap.fix, GeoFix::default());
    }

    #[test]
    fn setters_update_individual_fields() {
        let status = StatusModel::new();
        status.set_state(LinkState::Connected);
        status.set_rssi(-97);
        status.set_tx_waiting(2);
        status.set_rx_waiting(5);

        let link = status.link();
        assert_eq!(link.state, LinkState::Connected);
        assert_eq!(link.rssi, -97);
        assert_eq!(link.tx_waiting, 2);
        assert_eq!(link.rx_waiting, 5);
    }

    #[test]
    fn replace_fix_is_wholesale() {
        let status = StatusModel::new();
        let fix = GeoFix {
            latitude: 57.0,
            longitude: -133.0,
            altitude: 3,
            course: 270,
            speed: 11,
        };
        status.replace_fix(fix);
        assert_eq!(status.fix(), fix);

        // A later fix fully supersedes the earlier one.
        let fix2 = GeoFix {
            latitude: 58.0,
            ..GeoFix::default()
        };
        status.replace_fix(fix2);
        assert_eq!(status.fix(), fix2);
    }
}
