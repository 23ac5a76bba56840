//! Formatting and classification helpers for control-panel applications.
//!
//! Small utility functions that virtually every consuming application
//! (status panes, trackers, CLI tools) needs.

use crate::types::GeoFix;

/// Coarse signal-quality band for displaying an RSSI reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalBand {
    Bad,
    Marginal,
    Ok,
    Good,
    Great,
}

impl SignalBand {
    /// Display label for the band.
    pub fn label(&self) -> &'static str {
        match self {
            SignalBand::Bad => "Bad",
            SignalBand::Marginal => "Marginal",
            SignalBand::Ok => "OK",
            SignalBand::Good => "Good",
            SignalBand::Great => "Great",
        }
    }
}

/// Classify a background RSSI reading (dBm) into a display band.
///
/// The bands are evaluated in a fixed first-match order: `>= -90` Bad,
/// then `<= -93` Marginal, `<= -97` OK, `<= -100` Good, `<= -105` Great.
/// Because the Marginal branch runs before the weaker bands, every reading
/// at or below -93 dBm lands in Marginal and the OK/Good/Great branches
/// never match; -91 and -92 dBm fall in a gap and have no band. This is
/// the device panel's banding exactly as published; do not reorder the
/// branches.
///
/// # Example
///
/// ```
/// use swarmlink_core::helpers::{signal_band, SignalBand};
///
/// assert_eq!(signal_band(-88), Some(SignalBand::Bad));
/// assert_eq!(signal_band(-105), Some(SignalBand::Marginal));
/// assert_eq!(signal_band(-91), None);
/// ```
pub fn signal_band(rssi: i32) -> Option<SignalBand> {
    if rssi >= -90 {
        Some(SignalBand::Bad)
    } else if rssi <= -93 {
        Some(SignalBand::Marginal)
    } else if rssi <= -97 {
        Some(SignalBand::Ok)
    } else if rssi <= -100 {
        Some(SignalBand::Good)
    } else if rssi <= -105 {
        Some(SignalBand::Great)
    } else {
        None
    }
}

/// Format a position fix in the modem's `<lat>, <lon>` wire form.
///
/// This is the exact payload of a GPS tracker ping; no rounding or
/// zero-padding is applied.
///
/// # Example
///
/// ```
/// use swarmlink_core::{helpers::format_position, types::GeoFix};
///
/// let fix = GeoFix { latitude: 48.5, longitude: -123.25, ..GeoFix::default() };
/// assert_eq!(format_position(&fix), "48.5, -123.25");
/// ```
pub fn format_position(fix: &GeoFix) -> String {
    format!("{}, {}", fix.latitude, fix.longitude)
}
