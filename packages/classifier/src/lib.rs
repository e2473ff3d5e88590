#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Murder classification of shooting incidents.
//!
//! The pipeline is:
//!
//! 1. [`build_features`] reduces cleaned incidents to complete
//!    [`FeatureRow`]s (borough, precinct, time of day, murder flag) whose
//!    levels belong to the category domains inferred during cleaning.
//! 2. [`stratified_split`] partitions the rows into train and test sets,
//!    preserving the murder share in each.
//! 3. [`fit`] learns a one-hot encoding from the training rows and fits a
//!    logistic regression with `smartcore`.
//! 4. [`evaluate`] scores the held-out rows.
//!
//! [`FeatureRow`]: nypd_shootings_classifier_models::FeatureRow

pub mod encoding;
pub mod features;
pub mod metrics;
pub mod model;
pub mod split;

pub use encoding::OneHotEncoder;
pub use features::build_features;
pub use metrics::evaluate;
pub use model::{FitOptions, MurderClassifier, fit};
pub use split::{Split, stratified_split};

use thiserror::Error;

/// Errors that can occur while splitting, fitting or evaluating.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Train fraction outside the open interval (0, 1).
    #[error("Train fraction must be between 0 and 1 (exclusive), got {fraction}")]
    InvalidTrainFraction {
        /// The rejected fraction.
        fraction: f64,
    },

    /// No rows to fit on.
    #[error("Training set is empty")]
    EmptyTrainingSet,

    /// Every training row has the same label.
    #[error("Training set contains only {} rows", if *murder { "murder" } else { "non-murder" })]
    SingleClass {
        /// The only label present.
        murder: bool,
    },

    /// Every predictor has a single level in the training set.
    #[error("No predictor has more than one level in the training set")]
    NoPredictors,

    /// The logistic regression solver failed.
    #[error("Logistic regression failed: {message}")]
    Solver {
        /// Solver error description.
        message: String,
    },
}
