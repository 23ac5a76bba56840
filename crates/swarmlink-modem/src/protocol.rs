//! Swarm M138 line-protocol frame codec.
//!
//! The M138 speaks a newline-terminated ASCII protocol over a serial link,
//! framed NMEA-style. Every outbound command is wrapped in a `$...*HH`
//! envelope; every inbound line carries a three-character tag that selects
//! how the rest of the line is interpreted.
//!
//! # Command format
//!
//! ```text
//! $<command>*<HH>\n
//! ```
//!
//! - `$`: frame start (0x24).
//! - `command`: the command text, e.g. `RT 2` or `MM R=1234`.
//! - `*`: checksum separator (0x2A).
//! - `HH`: XOR fold of every command byte, two uppercase hex digits.
//! - Terminator: `\n` (0x0A).
//!
//! This layout is the wire contract with the device and is bit-exact.
//!
//! # Telemetry format
//!
//! Inbound lines use the same envelope. The first three characters are the
//! tag (`$RT`, `$MT`, `$MM`, `$GN`, ...); the remaining fields are split on
//! the delimiter set {space, comma, `*`, `=`}. Decoding is infallible:
//! anything that does not fit its tag degrades to [`TelemetryLine::Raw`]
//! so a malformed line can never abort the read loop.

use bytes::{BufMut, BytesMut};

use swarmlink_core::error::{Error, Result};
use swarmlink_core::types::GeoFix;

/// Line terminator for both directions.
pub const TERMINATOR: u8 = b'\n';

/// Frame start byte.
pub const FRAME_START: u8 = b'$';

/// Checksum separator byte.
pub const CHECKSUM_SEPARATOR: u8 = b'*';

/// The delimiter set used to split telemetry fields throughout the protocol.
const DELIMITERS: &[char] = &[' ', ',', '*', '='];

/// XOR-fold checksum over the bytes of a command string.
///
/// XOR is associative and commutative, so the fold order cannot change the
/// result, but every byte of the command participates.
///
/// # Example
///
/// ```
/// use swarmlink_modem::protocol::checksum;
///
/// // 'C' (0x43) ^ 'S' (0x53) = 0x10
/// assert_eq!(checksum("CS"), 0x10);
/// ```
pub fn checksum(command: &str) -> u8 {
    command.bytes().fold(0, |acc, b| acc ^ b)
}

/// A command payload with its computed checksum, ready for the wire.
///
/// Immutable once built; produced only by [`CommandFrame::encode`] and
/// consumed by the transport as [`CommandFrame::wire_bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    command: String,
    checksum: u8,
}

impl CommandFrame {
    /// Build a frame for the given command text.
    ///
    /// Returns [`Error::EmptyCommand`] for an empty command, before any
    /// bytes reach the transport.
    pub fn encode(command: &str) -> Result<CommandFrame> {
        if command.is_empty() {
            return Err(Error::EmptyCommand);
        }
        Ok(CommandFrame {
            checksum: checksum(command),
            command: command.to_string(),
        })
    }

    /// The command text inside the envelope.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The single-byte XOR checksum.
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Render the full wire frame: `$<command>*<HH>\n`.
    pub fn wire_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.command.len() + 5);
        buf.put_u8(FRAME_START);
        buf.put_slice(self.command.as_bytes());
        buf.put_u8(CHECKSUM_SEPARATOR);
        buf.put_slice(format!("{:02X}", self.checksum).as_bytes());
        buf.put_u8(TERMINATOR);
        buf.to_vec()
    }

    /// Render the frame as display text (no terminator), for monitor echo.
    pub fn display(&self) -> String {
        format!("${}*{:02X}", self.command, self.checksum)
    }
}

/// One decoded inbound telemetry line.
///
/// Produced by [`decode_line`]; consumed exactly once by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryLine {
    /// Background RSSI report (`$RT` tag, third field).
    LinkQuality {
        /// RSSI in dBm.
        rssi: i32,
    },
    /// Transmit queue depth (`$MT` tag, second field).
    TxQueueDepth {
        /// Unsent messages waiting.
        count: u32,
    },
    /// Receive mailbox depth (`$MM` tag, second field), plus any unread
    /// message identifiers the device appended to the count line.
    RxQueueDepth {
        /// Unread messages waiting.
        count: u32,
        /// Unread message identifiers, in device order. Often empty.
        ids: Vec<String>,
    },
    /// A complete position fix (`$GN` tag, fields 2-6). All five fields
    /// decode or the whole line degrades to [`TelemetryLine::Raw`].
    GeoFix(GeoFix),
    /// Unrecognised or malformed line, passed through verbatim.
    Raw {
        /// The original line with the terminator stripped.
        text: String,
    },
}

/// Split a line into fields on the protocol delimiter set.
///
/// Empty tokens (from adjacent delimiters) are dropped, so the result has
/// a fixed arity per tag and missing fields show up as a short slice
/// rather than an index error.
pub fn split_fields(line: &str) -> Vec<&str> {
    line.split(DELIMITERS).filter(|s| !s.is_empty()).collect()
}

/// Strip a trailing `*HH` checksum from a line, if present.
///
/// Inbound checksums are not verified (inbound integrity is the link
/// layer's problem), but they must not be mistaken for a data field, so a
/// one-or-two-hex-digit suffix after the last `*` is cut before the field
/// split.
fn strip_checksum(text: &str) -> &str {
    match text.rfind('*') {
        Some(pos) => {
            let tail = &text[pos + 1..];
            let looks_like_checksum = !tail.is_empty()
                && tail.len() <= 2
                && tail.chars().all(|c| c.is_ascii_hexdigit());
            if looks_like_checksum {
                &text[..pos]
            } else {
                text
            }
        }
        None => text,
    }
}

/// Decode one inbound line into a [`TelemetryLine`].
///
/// Strips the terminator and checksum, inspects the first three characters
/// as the tag, and maps the delimited fields onto the tag's variant. Any
/// unknown tag, short field list, or numeric-parse failure yields
/// [`TelemetryLine::Raw`] with the terminator-stripped line -- never an
/// error.
///
/// # Example
///
/// ```
/// use swarmlink_modem::protocol::{decode_line, TelemetryLine};
///
/// match decode_line("$RT RSSI=-95*3b") {
///     TelemetryLine::LinkQuality { rssi } => assert_eq!(rssi, -95),
///     other => panic!("expected LinkQuality, got {other:?}"),
/// }
/// ```
pub fn decode_line(line: &str) -> TelemetryLine {
    let text = line.trim_end_matches(['\r', '\n']);
    let raw = || TelemetryLine::Raw {
        text: text.to_string(),
    };

    if text.len() < 3 {
        return raw();
    }

    let fields = split_fields(strip_checksum(text));
    match &text[0..3] {
        "$RT" => match fields.get(2).and_then(|f| f.parse::<i32>().ok()) {
            Some(rssi) => TelemetryLine::LinkQuality { rssi },
            None => raw(),
        },
        "$MT" => match fields.get(1).and_then(|f| f.parse::<u32>().ok()) {
            Some(count) => TelemetryLine::TxQueueDepth { count },
            None => raw(),
        },
        "$MM" => match fields.get(1).and_then(|f| f.parse::<u32>().ok()) {
            // Fields after the count are unread message identifiers.
            Some(count) => TelemetryLine::RxQueueDepth {
                count,
                ids: fields[2..].iter().map(|s| s.to_string()).collect(),
            },
            None => raw(),
        },
        "$GN" => decode_geo_fix(&fields)
            .map(TelemetryLine::GeoFix)
            .unwrap_or_else(raw),
        _ => raw(),
    }
}

/// Decode fields 2-6 of a `$GN` line into a [`GeoFix`].
///
/// Returns `None` unless all five fields are present and parse, so a
/// partial fix is rejected outright instead of partially applied.
fn decode_geo_fix(fields: &[&str]) -> Option<GeoFix> {
    Some(GeoFix {
        latitude: fields.get(1)?.parse().ok()?,
        longitude: fields.get(2)?.parse().ok()?,
        altitude: fields.get(3)?.parse().ok()?,
        course: fields.get(4)?.parse().ok()?,
        speed: fields.get(5)?.parse().ok()?,
    })
}
