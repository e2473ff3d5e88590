#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Model-ready feature rows and classifier evaluation types.

use nypd_shootings_incident_models::{
    CategoricalDomain, CategoricalField, CategoryDomains, TimeOfDay,
};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A reduced incident carrying only what the murder classifier uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRow {
    /// Key of the incident this row was built from.
    pub incident_key: String,
    /// Borough name.
    pub borough: String,
    /// Precinct code.
    pub precinct: String,
    /// Time-of-day bucket of the incident hour.
    pub time_of_day: TimeOfDay,
    /// Label: whether the incident was a murder.
    pub is_murder: bool,
}

impl FeatureRow {
    /// Returns the value of one predictor.
    #[must_use]
    pub fn value(&self, predictor: Predictor) -> &str {
        match predictor {
            Predictor::Borough => &self.borough,
            Predictor::Precinct => &self.precinct,
            Predictor::TimeOfDay => self.time_of_day.as_ref(),
        }
    }
}

/// The categorical predictors of the classifier.
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
#[strum(serialize_all = "snake_case")]
pub enum Predictor {
    /// Borough name
    Borough,
    /// Precinct code
    Precinct,
    /// Time-of-day bucket
    TimeOfDay,
}

impl Predictor {
    /// Returns all variants in design-matrix column order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Borough, Self::Precinct, Self::TimeOfDay]
    }
}

/// Observed values of each predictor within a feature set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDomains {
    /// Observed boroughs.
    pub borough: CategoricalDomain,
    /// Observed precincts.
    pub precinct: CategoricalDomain,
    /// Observed time-of-day buckets.
    pub time_of_day: CategoricalDomain,
}

impl FeatureDomains {
    /// Collects the domains of `rows`.
    #[must_use]
    pub fn from_rows(rows: &[FeatureRow]) -> Self {
        let domain = |predictor: Predictor| {
            CategoricalDomain::from_values(rows.iter().map(|r| r.value(predictor)))
        };
        Self {
            borough: domain(Predictor::Borough),
            precinct: domain(Predictor::Precinct),
            time_of_day: domain(Predictor::TimeOfDay),
        }
    }

    /// Borough and precinct levels of the cleaned incidents, plus every
    /// time-of-day bucket.
    #[must_use]
    pub fn from_categories(categories: &CategoryDomains) -> Self {
        let field =
            |field: CategoricalField| categories.get(field).cloned().unwrap_or_default();
        Self {
            borough: field(CategoricalField::Borough),
            precinct: field(CategoricalField::Precinct),
            time_of_day: CategoricalDomain::from_values(
                TimeOfDay::all().iter().map(ToString::to_string),
            ),
        }
    }

    /// Levels of `self` absent from `other`, as `predictor=level`.
    #[must_use]
    pub fn levels_missing_from(&self, other: &Self) -> Vec<String> {
        Predictor::all()
            .iter()
            .flat_map(|&predictor| {
                let theirs = other.get(predictor);
                self.get(predictor)
                    .values()
                    .iter()
                    .filter(move |level| !theirs.contains(level))
                    .map(move |level| format!("{predictor}={level}"))
            })
            .collect()
    }

    /// The domain of one predictor.
    #[must_use]
    pub const fn get(&self, predictor: Predictor) -> &CategoricalDomain {
        match predictor {
            Predictor::Borough => &self.borough,
            Predictor::Precinct => &self.precinct,
            Predictor::TimeOfDay => &self.time_of_day,
        }
    }
}

/// Complete feature rows plus the domains observed in them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSet {
    /// Rows in input order.
    pub rows: Vec<FeatureRow>,
    /// Predictor domains observed in `rows`.
    pub domains: FeatureDomains,
}

impl FeatureSet {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the set has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows labelled as murders.
    #[must_use]
    pub fn positives(&self) -> usize {
        self.rows.iter().filter(|r| r.is_murder).count()
    }
}

/// Sizes and label balance of one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionSummary {
    pub rows: usize,
    pub positives: usize,
}

/// Sizes of a train/test split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitSummary {
    pub train: PartitionSummary,
    pub test: PartitionSummary,
}

/// Binary confusion matrix, murder being the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfusionMatrix {
    pub true_positive: u64,
    pub false_positive: u64,
    pub true_negative: u64,
    pub false_negative: u64,
}

impl ConfusionMatrix {
    /// Records one prediction against its actual label.
    pub const fn record(&mut self, actual: bool, predicted: bool) {
        match (actual, predicted) {
            (true, true) => self.true_positive += 1,
            (false, true) => self.false_positive += 1,
            (false, false) => self.true_negative += 1,
            (true, false) => self.false_negative += 1,
        }
    }

    /// Total number of recorded predictions.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }
}

/// Held-out performance of a fitted classifier.
///
/// Ratios whose denominator is zero are reported as `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationMetrics {
    pub test_rows: u64,
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
    pub precision: f64,
    pub recall: f64,
    pub specificity: f64,
    pub f1: f64,
    /// Share of the majority class in the test set.
    pub no_information_rate: f64,
    /// Test rows with a predictor value never seen in training.
    pub unseen_rows: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, boro: &str, precinct: &str, tod: TimeOfDay, murder: bool) -> FeatureRow {
        FeatureRow {
            incident_key: key.to_string(),
            borough: boro.to_string(),
            precinct: precinct.to_string(),
            time_of_day: tod,
            is_murder: murder,
        }
    }

    #[test]
    fn domains_cover_observed_values() {
        let rows = vec![
            row("1", "BRONX", "44", TimeOfDay::Night, true),
            row("2", "QUEENS", "105", TimeOfDay::Evening, false),
            row("3", "BRONX", "44", TimeOfDay::Evening, false),
        ];
        let domains = FeatureDomains::from_rows(&rows);
        assert_eq!(domains.borough.values(), ["BRONX", "QUEENS"]);
        assert_eq!(domains.precinct.len(), 2);
        assert_eq!(
            domains.get(Predictor::TimeOfDay).values(),
            ["Evening", "Night"]
        );
    }

    #[test]
    fn cleaning_domains_carry_all_time_buckets() {
        use nypd_shootings_incident_models::IncidentRecord;

        let mut a = IncidentRecord::new("1");
        a.borough = Some("BRONX".to_string());
        a.precinct = Some("44".to_string());
        let mut b = IncidentRecord::new("2");
        b.borough = Some("QUEENS".to_string());
        let domains = FeatureDomains::from_categories(&CategoryDomains::from_records(&[a, b]));

        assert_eq!(domains.borough.values(), ["BRONX", "QUEENS"]);
        assert_eq!(domains.precinct.values(), ["44"]);
        assert_eq!(domains.time_of_day.len(), TimeOfDay::all().len());
    }

    #[test]
    fn lists_levels_missing_from_other_domains() {
        let wide = FeatureDomains::from_rows(&[
            row("1", "BRONX", "44", TimeOfDay::Night, true),
            row("2", "QUEENS", "105", TimeOfDay::Night, false),
        ]);
        let narrow = FeatureDomains::from_rows(&[row("1", "BRONX", "44", TimeOfDay::Night, true)]);
        assert_eq!(
            wide.levels_missing_from(&narrow),
            ["borough=QUEENS", "precinct=105"]
        );
        assert!(narrow.levels_missing_from(&wide).is_empty());
    }

    #[test]
    fn confusion_matrix_tallies_each_cell() {
        let mut matrix = ConfusionMatrix::default();
        matrix.record(true, true);
        matrix.record(true, false);
        matrix.record(false, false);
        matrix.record(false, false);
        assert_eq!(matrix.true_positive, 1);
        assert_eq!(matrix.false_negative, 1);
        assert_eq!(matrix.true_negative, 2);
        assert_eq!(matrix.false_positive, 0);
        assert_eq!(matrix.total(), 4);
    }
}
