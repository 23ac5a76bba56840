//! Weather-model definitions for GRIB requests.
//!
//! Each requestable forecast model is described by its field rules and the
//! forecast ranges it offers. The selectable data fields come from a fixed
//! vocabulary; which of them are legal -- and which are forced on -- is
//! model-dependent:
//!
//! | Model  | Ranges | Field rules                                     |
//! |--------|--------|-------------------------------------------------|
//! | GFS    | 1..=16 | WIND and PRESS forced on; CUR locked off        |
//! | RTOFS  | 1..=6  | CUR forced on; every other field locked off     |
//! | Local  | --     | unrestricted (extension point)                  |
//! | ECMWF  | --     | unrestricted (extension point)                  |
//! | SPIRE  | --     | unrestricted (extension point)                  |
//!
//! Switching model always resets the field set to that model's defaults;
//! the caller never inherits a selection that the new model forbids.

use std::fmt;

/// A selectable GRIB data field.
///
/// `Wave` is a triple: it always serializes as `HTSGW,WVPER,WVDIR`
/// together, gated by a single flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GribField {
    /// Ocean current (`CUR`).
    Current,
    /// Air temperature (`AIRTMP`).
    AirTemp,
    /// Convective available potential energy (`CAPE`).
    Cape,
    /// Total cloud cover (`TCDC`).
    CloudCover,
    /// Surface pressure (`PRESS`).
    Pressure,
    /// Wave height, period and direction (`HTSGW,WVPER,WVDIR`).
    Wave,
    /// Wind speed and direction (`WIND`).
    Wind,
    /// Wind gust (`GUST`).
    Gust,
}

/// All fields, in serialization order.
pub const ALL_FIELDS: [GribField; 8] = [
    GribField::Current,
    GribField::AirTemp,
    GribField::Cape,
    GribField::CloudCover,
    GribField::Pressure,
    GribField::Wave,
    GribField::Wind,
    GribField::Gust,
];

impl GribField {
    /// Wire token(s) for this field, comma-joined where plural.
    pub fn token(&self) -> &'static str {
        match self {
            GribField::Current => "CUR",
            GribField::AirTemp => "AIRTMP",
            GribField::Cape => "CAPE",
            GribField::CloudCover => "TCDC",
            GribField::Pressure => "PRESS",
            GribField::Wave => "HTSGW,WVPER,WVDIR",
            GribField::Wind => "WIND",
            GribField::Gust => "GUST",
        }
    }
}

/// A requestable weather model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GribModel {
    /// NOAA Global Forecast System.
    #[default]
    Gfs,
    /// NOAA Real-Time Ocean Forecast System (currents only).
    Rtofs,
    /// Provider-local model (no field rules defined yet).
    Local,
    /// ECMWF model (no field rules defined yet).
    Ecmwf,
    /// Spire model (no field rules defined yet).
    Spire,
}

impl fmt::Display for GribModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl GribModel {
    /// Wire name of the model.
    pub fn name(&self) -> &'static str {
        match self {
            GribModel::Gfs => "GFS",
            GribModel::Rtofs => "RTOFS",
            GribModel::Local => "Local",
            GribModel::Ecmwf => "ECMWF",
            GribModel::Spire => "SPIRE",
        }
    }

    /// Forecast ranges this model offers, or `None` where the model's
    /// range table is not defined in this library.
    pub fn range_options(&self) -> Option<std::ops::RangeInclusive<u8>> {
        match self {
            GribModel::Gfs => Some(1..=16),
            GribModel::Rtofs => Some(1..=6),
            GribModel::Local | GribModel::Ecmwf | GribModel::Spire => None,
        }
    }

    /// Fields this model forces on. Forced fields cannot be deselected.
    pub fn forced_fields(&self) -> &'static [GribField] {
        match self {
            GribModel::Gfs => &[GribField::Wind, GribField::Pressure],
            GribModel::Rtofs => &[GribField::Current],
            _ => &[],
        }
    }

    /// Fields this model locks out. Locked fields cannot be selected.
    pub fn locked_fields(&self) -> &'static [GribField] {
        match self {
            GribModel::Gfs => &[GribField::Current],
            GribModel::Rtofs => &[
                GribField::AirTemp,
                GribField::Cape,
                GribField::CloudCover,
                GribField::Pressure,
                GribField::Wave,
                GribField::Wind,
                GribField::Gust,
            ],
            _ => &[],
        }
    }
}

/// The set of selected data fields for one GRIB request, with the active
/// model's force/lock rules applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GribFieldSet {
    model: GribModel,
    selected: [bool; ALL_FIELDS.len()],
}

fn index_of(field: GribField) -> usize {
    ALL_FIELDS
        .iter()
        .position(|f| *f == field)
        .expect("field in vocabulary")
}

impl GribFieldSet {
    /// The default field set for a model: exactly its forced fields.
    pub fn defaults_for(model: GribModel) -> Self {
        let mut set = GribFieldSet {
            model,
            selected: [false; ALL_FIELDS.len()],
        };
        for &field in model.forced_fields() {
            set.selected[index_of(field)] = true;
        }
        set
    }

    /// The model whose rules govern this set.
    pub fn model(&self) -> GribModel {
        self.model
    }

    /// Whether a field is currently selected.
    pub fn is_selected(&self, field: GribField) -> bool {
        self.selected[index_of(field)]
    }

    /// Whether the model pins this field (forced on or locked off).
    pub fn is_locked(&self, field: GribField) -> bool {
        self.model.forced_fields().contains(&field) || self.model.locked_fields().contains(&field)
    }

    /// Select or deselect a field.
    ///
    /// Returns `false` without changing anything when the model pins the
    /// field (the disabled-checkbox case); `true` when the change applied.
    pub fn set(&mut self, field: GribField, on: bool) -> bool {
        if self.is_locked(field) {
            return false;
        }
        self.selected[index_of(field)] = on;
        true
    }

    /// Switch to another model, resetting the selection to that model's
    /// defaults. This reset is required behaviour, not incidental: a field
    /// the new model forbids must never survive the switch.
    pub fn change_model(&mut self, model: GribModel) {
        *self = GribFieldSet::defaults_for(model);
    }

    /// Selected fields in serialization order.
    pub fn iter_selected(&self) -> impl Iterator<Item = GribField> + '_ {
        ALL_FIELDS
            .iter()
            .copied()
            .filter(|f| self.selected[index_of(*f)])
    }

    /// Comma-joined wire tokens of the selected fields, no trailing comma.
    pub fn wire_tokens(&self) -> String {
        let mut out = String::new();
        for field in self.iter_selected() {
            if !out.is_empty() {
                out.push(',');
            }
            out.push_str(field.token());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gfs_defaults_force_wind_and_pressure() {
        let set = GribFieldSet::defaults_for(GribModel::Gfs);
        assert!(set.is_selected(GribField::Wind));
        assert!(set.is_selected(GribField::Pressure));
        assert!(!set.is_selected(GribField::Current));
        assert!(!set.is_selected(GribField::Wave));
    }

    #[test]
    fn gfs_locks_current_off() {
        let mut set = GribFieldSet::defaults_for(GribModel::Gfs);
        assert!(!set.set(GribField::Current, true));
        assert!(!set.is_selected(GribField::Current));
        // Forced fields cannot be deselected either.
        assert!(!set.set(GribField::Wind, false));
        assert!(set.is_selected(GribField::Wind));
    }

    #[test]
    fn rtofs_is_current_only() {
        let set = GribFieldSet::defaults_for(GribModel::Rtofs);
        assert!(set.is_selected(GribField::Current));
        for field in ALL_FIELDS {
            if field != GribField::Current {
                assert!(!set.is_selected(field), "{field:?} selected");
                assert!(set.is_locked(field), "{field:?} not locked");
            }
        }
        assert_eq!(set.wire_tokens(), "CUR");
    }

    #[test]
    fn model_change_resets_selection() {
        let mut set = GribFieldSet::defaults_for(GribModel::Gfs);
        assert!(set.set(GribField::Cape, true));
        assert!(set.set(GribField::Wave, true));

        set.change_model(GribModel::Rtofs);
        // Exactly {CUR}: nothing survives the switch.
        assert_eq!(set.wire_tokens(), "CUR");
        assert_eq!(set.model(), GribModel::Rtofs);
    }

    #[test]
    fn range_options_per_model() {
        assert_eq!(GribModel::Gfs.range_options(), Some(1..=16));
        assert_eq!(GribModel::Rtofs.range_options(), Some(1..=6));
        assert_eq!(GribModel::Local.range_options(), None);
        assert_eq!(GribModel::Spire.range_options(), None);
    }

    #[test]
    fn open_models_are_unrestricted() {
        let mut set = GribFieldSet::defaults_for(GribModel::Ecmwf);
        assert_eq!(set.wire_tokens(), "");
        for field in ALL_FIELDS {
            assert!(set.set(field, true), "{field:?} refused");
        }
        assert!(set.is_selected(GribField::Current));
    }

    #[test]
    fn wave_triple_serializes_together() {
        let mut set = GribFieldSet::defaults_for(GribModel::Local);
        set.set(GribField::Wave, true);
        assert_eq!(set.wire_tokens(), "HTSGW,WVPER,WVDIR");
        set.set(GribField::Wind, true);
        assert_eq!(set.wire_tokens(), "HTSGW,WVPER,WVDIR,WIND");
    }

    #[test]
    fn tokens_in_fixed_vocabulary_order() {
        let mut set = GribFieldSet::defaults_for(GribModel::Local);
        set.set(GribField::Gust, true);
        set.set(GribField::Current, true);
        set.set(GribField::Pressure, true);
        assert_eq!(set.wire_tokens(), "CUR,PRESS,GUST");
    }
}
