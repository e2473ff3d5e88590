#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation parameter and result types.
//!
//! Defines the fields incidents can be grouped by, the metrics computed per
//! group, and the bucket types handed to the rendering layer.

use nypd_shootings_incident_models::CategoricalField;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Bucket key used for records that have no value for the grouped field.
pub const MISSING_KEY: &str = "(missing)";

/// A field incidents can be grouped by, either read directly from the
/// record or derived from its date and time.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum GroupField {
    // ── Direct ──────────────────────────────────────────
    /// Borough name
    Borough,
    /// Precinct code
    Precinct,
    /// Victim age group
    VictimAgeGroup,
    /// Victim sex
    VictimSex,
    /// Victim race
    VictimRace,
    /// Perpetrator age group
    PerpAgeGroup,
    /// Perpetrator sex
    PerpSex,
    /// Perpetrator race
    PerpRace,
    /// Statistical murder flag (`"true"`/`"false"`)
    MurderFlag,

    // ── Derived ─────────────────────────────────────────
    /// Calendar year
    Year,
    /// Calendar month name
    Month,
    /// Day of week
    Weekday,
    /// Hour of day (0-23)
    Hour,
    /// Time-of-day bucket
    TimeOfDay,
}

impl GroupField {
    /// Returns the categorical record field behind a direct grouping, if any.
    #[must_use]
    pub const fn categorical(self) -> Option<CategoricalField> {
        match self {
            Self::Borough => Some(CategoricalField::Borough),
            Self::Precinct => Some(CategoricalField::Precinct),
            Self::VictimAgeGroup => Some(CategoricalField::VictimAgeGroup),
            Self::VictimSex => Some(CategoricalField::VictimSex),
            Self::VictimRace => Some(CategoricalField::VictimRace),
            Self::PerpAgeGroup => Some(CategoricalField::PerpAgeGroup),
            Self::PerpSex => Some(CategoricalField::PerpSex),
            Self::PerpRace => Some(CategoricalField::PerpRace),
            Self::MurderFlag
            | Self::Year
            | Self::Month
            | Self::Weekday
            | Self::Hour
            | Self::TimeOfDay => None,
        }
    }

    /// Human-readable column heading.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Borough => "Borough",
            Self::Precinct => "Precinct",
            Self::VictimAgeGroup => "Victim age group",
            Self::VictimSex => "Victim sex",
            Self::VictimRace => "Victim race",
            Self::PerpAgeGroup => "Perpetrator age group",
            Self::PerpSex => "Perpetrator sex",
            Self::PerpRace => "Perpetrator race",
            Self::MurderFlag => "Murder",
            Self::Year => "Year",
            Self::Month => "Month",
            Self::Weekday => "Weekday",
            Self::Hour => "Hour",
            Self::TimeOfDay => "Time of day",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Borough,
            Self::Precinct,
            Self::VictimAgeGroup,
            Self::VictimSex,
            Self::VictimRace,
            Self::PerpAgeGroup,
            Self::PerpSex,
            Self::PerpRace,
            Self::MurderFlag,
            Self::Year,
            Self::Month,
            Self::Weekday,
            Self::Hour,
            Self::TimeOfDay,
        ]
    }
}

/// What to compute for each group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    /// Exact tally per group.
    Count,
    /// Tally plus share of the total in percent.
    Percentage,
}

/// Display order of aggregation buckets.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BucketOrder {
    /// Descending count, ties broken by key ascending.
    #[default]
    CountDesc,
    /// The grouped field's own order: chronological for dates and hours,
    /// bucket order for time of day, key ascending otherwise.
    Natural,
}

/// One group of an aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateBucket {
    /// Group key (e.g. `"BROOKLYN"`, `"2021"`, `"Evening"`).
    pub key: String,
    /// Number of incidents in the group.
    pub count: u64,
    /// Share of all incidents passed to the aggregation, in percent.
    /// `None` for [`Metric::Count`].
    pub percentage: Option<f64>,
}

/// Murder share within one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateBucket {
    /// Group key.
    pub key: String,
    /// Incidents in the group with a known murder flag.
    pub total: u64,
    /// Incidents in the group flagged as murders.
    pub murders: u64,
    /// `murders / total`.
    pub rate: f64,
}

/// Incident count for one H3 cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HexBin {
    /// H3 cell index in hexadecimal form.
    pub cell: String,
    /// Latitude of the cell center.
    pub center_lat: f64,
    /// Longitude of the cell center.
    pub center_lng: f64,
    /// Number of incidents in the cell.
    pub count: u64,
}

/// Result of spatially binning incidents into H3 cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HexBinSummary {
    /// H3 resolution used.
    pub resolution: u8,
    /// Bins ordered by descending count, then cell ascending.
    pub bins: Vec<HexBin>,
    /// Incidents placed into a bin.
    pub located: u64,
    /// Incidents without usable coordinates.
    pub skipped: u64,
}
