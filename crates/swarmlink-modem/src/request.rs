//! Outbound request builders: free-text messages, GPS pings, and GRIB
//! requests.
//!
//! These are pure: they turn structured operator input into the payload
//! string of a `TD AI=...` transmit-data command and report its size
//! against the per-packet budget. They perform no I/O and hold no shared
//! state; the driver encodes and sends the result.
//!
//! # The 192-character budget
//!
//! A single Swarm packet carries at most [`PACKET_BUDGET`] characters.
//! The builders recompute the character count on every change so the
//! caller can warn the operator before sending; exceeding the budget is a
//! warning, not a hard failure. Splitting an oversized message into
//! multiple packets (and reassembling on the far side) is an unfilled
//! extension point: [`TextMessage::packet_count`] reports how many packets
//! would be needed, and the part-request application IDs are reserved in
//! `swarmlink-core`, but no splitting is performed here.

use rand::Rng;

use swarmlink_core::types::{
    GeoFix, APPID_OUTGOING_GPS_PING, APPID_OUTGOING_GRIBRQ, APPID_OUTGOING_MESSAGE,
};

use crate::commands;
use crate::models::{GribFieldSet, GribModel};

/// Maximum characters in a single packet payload.
pub const PACKET_BUDGET: usize = 192;

/// Routing byte carried after the sequence number of a text message.
const ROUTING_BYTE: char = '1';

/// Type byte carried after the routing byte of a text message.
const TYPE_BYTE: char = '1';

/// A free-text message addressed to another operator.
///
/// Serializes as `NN` (two-digit sequence) + routing byte + type byte +
/// `T:<to>S:<subject>M<body>`, verbatim and unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    /// Destination address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
}

impl TextMessage {
    /// Create a message from operator input.
    pub fn new(to: &str, subject: &str, body: &str) -> Self {
        TextMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        }
    }

    /// The addressed part of the payload: `T:<to>S:<subject>M<body>`.
    pub fn addressed_text(&self) -> String {
        format!("T:{}S:{}M{}", self.to, self.subject, self.body)
    }

    /// Full payload with an explicit two-digit sequence number.
    ///
    /// The sequence number occupies exactly two characters on the wire, so
    /// values outside 10..=99 are clamped into that range before
    /// formatting.
    pub fn payload_with_sequence(&self, seq: u8) -> String {
        let seq = seq.clamp(10, 99);
        format!(
            "{seq}{ROUTING_BYTE}{TYPE_BYTE}{}",
            self.addressed_text()
        )
    }

    /// Full payload with a freshly drawn random sequence number.
    pub fn payload(&self) -> String {
        let seq = rand::thread_rng().gen_range(10..=99);
        self.payload_with_sequence(seq)
    }

    /// Character count of the full payload.
    pub fn char_count(&self) -> usize {
        // Sequence (2) + routing (1) + type (1) + addressed text.
        4 + self.addressed_text().chars().count()
    }

    /// Number of packets this payload would occupy.
    ///
    /// Values above 1 mean the message needs multi-part transmission,
    /// which this library does not perform (extension point); the caller
    /// should warn the operator.
    pub fn packet_count(&self) -> usize {
        self.char_count().div_ceil(PACKET_BUDGET)
    }

    /// The complete `TD` command text carrying this message.
    pub fn to_command(&self) -> String {
        commands::transmit_data(APPID_OUTGOING_MESSAGE, &self.payload())
    }
}

/// Build the payload of a GPS tracker ping from the current fix.
///
/// The wire form is exactly `<lat>, <lon>`; no rounding, padding, or
/// altitude.
pub fn ping_payload(fix: &GeoFix) -> String {
    swarmlink_core::helpers::format_position(fix)
}

/// The complete `TD` command text for a GPS tracker ping.
pub fn ping_command(fix: &GeoFix) -> String {
    commands::transmit_data(APPID_OUTGOING_GPS_PING, &ping_payload(fix))
}

/// A weather-grid request: model, bounding box, resolution, time interval,
/// forecast range, and field selection.
///
/// Mutating setters keep the field set consistent with the active model's
/// rules; [`GribRequest::char_count`] is recomputed from scratch on every
/// call so the caller can surface the budget after each change.
#[derive(Debug, Clone, PartialEq)]
pub struct GribRequest {
    fields: GribFieldSet,
    /// Northern edge of the bounding box, degrees latitude.
    pub lat_max: i32,
    /// Southern edge of the bounding box, degrees latitude.
    pub lat_min: i32,
    /// Western edge of the bounding box, degrees longitude.
    pub lon_min: i32,
    /// Eastern edge of the bounding box, degrees longitude.
    pub lon_max: i32,
    /// Grid resolution expression, e.g. `2.0,2.0`.
    pub resolution: String,
    /// Forecast time interval expression, e.g. `0,6,12..48`.
    pub interval: String,
    /// Forecast range in days, where the interval expression does not
    /// already carry it. Clamped into the model's range table on model
    /// change.
    pub range: Option<u8>,
}

impl GribRequest {
    /// Create a request for a model with that model's default field set
    /// and an empty bounding box.
    pub fn new(model: GribModel) -> Self {
        GribRequest {
            fields: GribFieldSet::defaults_for(model),
            lat_max: 0,
            lat_min: 0,
            lon_min: 0,
            lon_max: 0,
            resolution: String::new(),
            interval: String::new(),
            range: None,
        }
    }

    /// The active model.
    pub fn model(&self) -> GribModel {
        self.fields.model()
    }

    /// The current field selection.
    pub fn fields(&self) -> &GribFieldSet {
        &self.fields
    }

    /// Mutable access to the field selection (model rules still apply).
    pub fn fields_mut(&mut self) -> &mut GribFieldSet {
        &mut self.fields
    }

    /// Switch model, resetting the field selection to the new model's
    /// defaults and clamping the range into the new model's table.
    pub fn set_model(&mut self, model: GribModel) {
        self.fields.change_model(model);
        if let (Some(range), Some(options)) = (self.range, model.range_options()) {
            self.range = Some(range.clamp(*options.start(), *options.end()));
        }
    }

    /// Centre the bounding box on a position fix (degenerate box, the
    /// operator widens it from there).
    pub fn set_box_from_fix(&mut self, fix: &GeoFix) {
        let lat = fix.latitude.round() as i32;
        let lon = fix.longitude.round() as i32;
        self.lat_max = lat;
        self.lat_min = lat;
        self.lon_min = lon;
        self.lon_max = lon;
    }

    /// Serialize the request payload:
    /// `<model>:<latMax>,<latMin>,<lonMin>,<lonMax>|<res>|<interval>,<range>|<fields>`,
    /// with the trailing separator trimmed when no field is selected.
    pub fn payload(&self) -> String {
        let mut out = format!(
            "{}:{},{},{},{}|{}|{}",
            self.model().name(),
            self.lat_max,
            self.lat_min,
            self.lon_min,
            self.lon_max,
            self.resolution,
            self.interval,
        );
        if let Some(range) = self.range {
            out.push(',');
            out.push_str(&range.to_string());
        }
        let tokens = self.fields.wire_tokens();
        if tokens.is_empty() {
            return out;
        }
        out.push('|');
        out.push_str(&tokens);
        out
    }

    /// Character count of the serialized payload.
    pub fn char_count(&self) -> usize {
        self.payload().chars().count()
    }

    /// Whether the payload exceeds the single-packet budget.
    ///
    /// A `true` here is a warning to surface to the operator, not a send
    /// blocker.
    pub fn over_budget(&self) -> bool {
        self.char_count() > PACKET_BUDGET
    }

    /// The complete `TD` command text carrying this request.
    pub fn to_command(&self) -> String {
        commands::transmit_data(APPID_OUTGOING_GRIBRQ, &self.payload())
    }
}
