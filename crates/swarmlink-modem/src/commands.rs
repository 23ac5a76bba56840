//! Swarm M138 command vocabulary.
//!
//! Typed constructors for every command the driver issues, so command
//! strings are built in exactly one place. The frame envelope and checksum
//! are applied later by [`protocol::CommandFrame`](crate::protocol::CommandFrame);
//! these functions produce only the command text between `$` and `*`.
//!
//! | Command      | Purpose                                  |
//! |--------------|------------------------------------------|
//! | `CS`         | Configuration settings / device ID       |
//! | `FV`         | Firmware version                         |
//! | `GN <rate>`  | GNSS telemetry rate (0 disables)         |
//! | `RT <rate>`  | Background RSSI telemetry rate           |
//! | `RS`         | Restart the modem                        |
//! | `MT C=U`     | Count of unsent messages                 |
//! | `MT D=U`     | Delete all unsent messages               |
//! | `MM L=U`     | List unread message identifiers          |
//! | `MM R=<id>`  | Read (retrieve) one unread message       |
//! | `TD AI=...`  | Transmit data with an application ID     |

/// Status and acknowledgement chatter the modem emits on the `$MM` tag.
///
/// These are command replies, not mailbox lists, and must not be fed to
/// the mailbox sequencer or misread as queue-depth telemetry.
pub const MM_STATUS_MARKERS: &[&str] = &["DBX_NOMORE", "CMD_BADPARAMVALUE", "MM OK", "MM 0*10"];

/// Returns `true` if a raw `$MM` line is status/ack chatter rather than a
/// mailbox list or retrieval payload.
pub fn is_mm_status_line(line: &str) -> bool {
    MM_STATUS_MARKERS.iter().any(|m| line.contains(m))
}

/// `CS` -- read configuration settings (device ID).
pub fn configuration_settings() -> String {
    "CS".to_string()
}

/// `FV` -- read the firmware version.
pub fn firmware_version() -> String {
    "FV".to_string()
}

/// `GN <rate>` -- set the GNSS telemetry rate in seconds (0 disables).
pub fn gnss_rate(rate: u32) -> String {
    format!("GN {rate}")
}

/// `RT <rate>` -- set the background RSSI telemetry rate in seconds.
pub fn rssi_rate(rate: u32) -> String {
    format!("RT {rate}")
}

/// `RS` -- restart the modem.
pub fn restart() -> String {
    "RS".to_string()
}

/// `MT C=U` -- request the count of unsent messages.
pub fn unsent_count() -> String {
    "MT C=U".to_string()
}

/// `MT D=U` -- delete every unsent message from the transmit queue.
pub fn flush_tx_queue() -> String {
    "MT D=U".to_string()
}

/// `MM L=U` -- request the list of unread message identifiers.
pub fn unread_list() -> String {
    "MM L=U".to_string()
}

/// `MM R=<id>` -- retrieve one unread message by identifier.
pub fn read_message(id: &str) -> String {
    format!("MM R={id}")
}

/// `TD AI=<appid>,"<payload>"` -- transmit a data payload tagged with an
/// application ID.
pub fn transmit_data(app_id: u32, payload: &str) -> String {
    format!("TD AI={app_id},\"{payload}\"")
}
