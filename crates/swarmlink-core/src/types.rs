//! Core types used throughout swarmlink.
//!
//! These types describe the modem's link state, the last known position
//! fix, and retrieved mailbox messages, independent of the wire protocol
//! that produced them.

use std::fmt;

/// Connection state of the serial link to the modem.
///
/// Transitions are driven by the transport lifecycle (open/close/error),
/// never by the protocol engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    /// No port is open.
    #[default]
    Disconnected,
    /// The configured port is not present on the system.
    PortUnavailable,
    /// Opening the port failed (permissions, busy, wrong device).
    OpenFailed,
    /// The port is open and the modem is talking.
    Connected,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkState::Disconnected => "Disconnected",
            LinkState::PortUnavailable => "Error: Port Not Available",
            LinkState::OpenFailed => "Error: Failed to Open Port",
            LinkState::Connected => "Comm OK",
        };
        write!(f, "{s}")
    }
}

/// Current link status: connection state, signal quality, and the modem's
/// queue depths.
///
/// A single shared instance lives in [`StatusModel`](crate::status::StatusModel),
/// written only by the telemetry dispatcher (and the transport lifecycle for
/// `state`), read by the UI and the request builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkStatus {
    /// Connection state of the serial link.
    pub state: LinkState,
    /// Most recent background RSSI reading in dBm (from `$RT` telemetry).
    pub rssi: i32,
    /// Number of unsent messages waiting in the modem's transmit queue.
    pub tx_waiting: u32,
    /// Number of unread messages waiting in the modem's receive mailbox.
    pub rx_waiting: u32,
}

/// A GNSS position fix as reported by `$GN` telemetry.
///
/// A fix is always replaced wholesale: either all five fields decoded, or
/// the line degraded to raw pass-through and the previous fix is kept.
/// There is no partial merging.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoFix {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Altitude in metres.
    pub altitude: i32,
    /// Course over ground in degrees, 0..=359.
    pub course: u16,
    /// Speed over ground in km/h.
    pub speed: u32,
}

impl fmt::Display for GeoFix {
    /// Multi-line presentation form: position, altitude, speed and course.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}\n{}m\n{}kph, {:03}\u{00b0}",
            self.latitude, self.longitude, self.altitude, self.speed, self.course
        )
    }
}

/// Payload classification of a retrieved mailbox message.
///
/// Derived from the application ID carried in the payload; see
/// [`IncomingMessage::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// A free-text message for the operator.
    Text,
    /// A weather-grid (GRIB) payload.
    Grib,
    /// An application ID this library does not recognise.
    Unknown,
}

/// Application ID of an incoming free-text message.
pub const APPID_INCOMING_MESSAGE: u32 = 37550;
/// Application ID of an incoming GRIB payload.
pub const APPID_INCOMING_GRIB: u32 = 37700;
/// Application ID of an outbound GPS tracker ping.
pub const APPID_OUTGOING_GPS_PING: u32 = 37400;
/// Application ID of an outbound free-text message.
pub const APPID_OUTGOING_MESSAGE: u32 = 37500;
/// Application ID of an outbound GRIB request.
pub const APPID_OUTGOING_GRIBRQ: u32 = 37600;

/// Reserved for multi-part message continuation requests (unimplemented).
pub const APPID_OUTGOING_MESSAGE_PART_REQ: u32 = 37510;
/// Reserved for multi-part message continuation payloads (unimplemented).
pub const APPID_INCOMING_MESSAGE_PART_REQ: u32 = 37560;
/// Reserved for multi-part GRIB continuation requests (unimplemented).
pub const APPID_OUTGOING_GRIBRQ_PART_REQ: u32 = 37610;

/// One message retrieved from the modem's mailbox.
///
/// Parsed from a single retrieval reply line using a fixed five-field
/// split; created by the mailbox sequencer, handed to the persistence
/// collaborator, then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    /// Application ID classifying the payload kind.
    pub app_id: u32,
    /// RSSI of the burst that carried this message, in dBm.
    pub rssi: i32,
    /// Signal-to-noise ratio of the burst, in dB.
    pub snr: i32,
    /// Frequency deviation of the burst.
    pub fdev: i32,
    /// Raw data payload.
    pub data: String,
}

impl IncomingMessage {
    /// Classify this message by its application ID.
    pub fn kind(&self) -> MessageKind {
        match self.app_id {
            APPID_INCOMING_MESSAGE => MessageKind::Text,
            APPID_INCOMING_GRIB => MessageKind::Grib,
            _ => MessageKind::Unknown,
        }
    }

    /// Short presentation summary for the display collaborator.
    pub fn summary(&self) -> String {
        match self.kind() {
            MessageKind::Text => format!("New Message {}", self.data),
            MessageKind::Grib => "GRIB Received".to_string(),
            MessageKind::Unknown => "Unknown Message Received".to_string(),
        }
    }

    /// Suggested GRIB file stem: the first six characters of the payload.
    ///
    /// Storage naming is the persistence collaborator's business; this
    /// only exposes the portion of the payload the original file-naming
    /// scheme used.
    pub fn grib_stem(&self) -> &str {
        let end = self.data.len().min(6);
        &self.data[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_state_display() {
        assert_eq!(LinkState::Disconnected.to_string(), "Disconnected");
        assert_eq!(LinkState::Connected.to_string(), "Comm OK");
        assert_eq!(
            LinkState::PortUnavailable.to_string(),
            "Error: Port Not Available"
        );
    }

    #[test]
    fn geofix_display_pads_course() {
        let fix = GeoFix {
            latitude: 48.5,
            longitude: -123.25,
            altitude: 12,
            course: 7,
            speed: 9,
        };
        assert_eq!(fix.to_string(), "48.5, -123.25\n12m\n9kph, 007\u{00b0}");
    }

    #[test]
    fn message_kind_from_app_id() {
        let mut msg = IncomingMessage {
            app_id: APPID_INCOMING_MESSAGE,
            rssi: -95,
            snr: 10,
            fdev: 2,
            data: "hello".into(),
        };
        assert_eq!(msg.kind(), MessageKind::Text);
        msg.app_id = APPID_INCOMING_GRIB;
        assert_eq!(msg.kind(), MessageKind::Grib);
        msg.app_id = 12345;
        assert_eq!(msg.kind(), MessageKind::Unknown);
    }

    #[test]
    fn message_summary() {
        let msg = IncomingMessage {
            app_id: APPID_INCOMING_MESSAGE,
            rssi: -95,
            snr: 10,
            fdev: 2,
            data: "ahoy".into(),
        };
        assert_eq!(msg.summary(), "New Message ahoy");
    }

    #[test]
    fn grib_stem_truncates_short_payloads() {
        let msg = IncomingMessage {
            app_id: APPID_INCOMING_GRIB,
            rssi: -95,
            snr: 10,
            fdev: 2,
            data: "ab".into(),
        };
        assert_eq!(msg.grib_stem(), "ab");
        let msg2 = IncomingMessage {
            data: "abcdefgh".into(),
            ..msg
        };
        assert_eq!(msg2.grib_stem(), "abcdef");
    }
}
