#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Descriptive aggregation of cleaned shooting incidents.
//!
//! Every function takes any iterator of borrowed [`IncidentRecord`]s, so the
//! same aggregation serves the full cleaned set and a pre-filtered subset
//! (see [`filter::exclude_sentinels`]).
//!
//! [`IncidentRecord`]: nypd_shootings_incident_models::IncidentRecord

pub mod aggregate;
pub mod filter;
pub mod rates;
pub mod spatial;

pub use aggregate::{aggregate, aggregate_ordered, date_span, group_key};
pub use filter::exclude_sentinels;
pub use rates::murder_rate;
pub use spatial::hexbins;

use thiserror::Error;

/// Errors that can occur during aggregation.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The requested H3 resolution does not exist.
    #[error("Invalid H3 resolution {resolution}: expected 0-15")]
    InvalidResolution {
        /// The rejected resolution.
        resolution: u8,
    },
}
