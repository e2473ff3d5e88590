//! Treatment-coded one-hot encoding of the categorical predictors.

use ndarray::Array2;
use nypd_shootings_classifier_models::{FeatureDomains, FeatureRow, Predictor};
use nypd_shootings_incident_models::CategoricalDomain;

/// Maps feature rows to a numeric design matrix.
///
/// Levels are learned from the training rows only. Each predictor gets one
/// column per level except its first (reference) level, so a row at the
/// reference level has all zeros for that predictor. Values never seen in
/// training are encoded the same way and reported as unseen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneHotEncoder {
    domains: FeatureDomains,
    offsets: Vec<(Predictor, usize)>,
    width: usize,
}

/// A design matrix plus the number of rows that hit an unseen level.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub matrix: Array2<f64>,
    pub unseen_rows: u64,
}

impl OneHotEncoder {
    /// Learns the levels of every predictor from `rows`.
    #[must_use]
    pub fn fit(rows: &[FeatureRow]) -> Self {
        let domains = FeatureDomains::from_rows(rows);
        let mut offsets = Vec::with_capacity(Predictor::all().len());
        let mut width = 0;
        for &predictor in Predictor::all() {
            offsets.push((predictor, width));
            width += domains.get(predictor).len().saturating_sub(1);
        }
        Self {
            domains,
            offsets,
            width,
        }
    }

    /// Number of design-matrix columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// The learned levels.
    #[must_use]
    pub const fn domains(&self) -> &FeatureDomains {
        &self.domains
    }

    /// Column names in matrix order, e.g. `borough=BROOKLYN`.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        Predictor::all()
            .iter()
            .flat_map(|&predictor| {
                self.domains
                    .get(predictor)
                    .values()
                    .iter()
                    .skip(1)
                    .map(move |level| format!("{predictor}={level}"))
            })
            .collect()
    }

    /// Encodes `rows` into an `rows.len() x width()` matrix.
    #[must_use]
    pub fn transform(&self, rows: &[FeatureRow]) -> Encoded {
        let mut matrix = Array2::<f64>::zeros((rows.len(), self.width));
        let mut unseen_rows = 0;

        for (i, row) in rows.iter().enumerate() {
            let mut unseen = false;
            for &(predictor, offset) in &self.offsets {
                let value = row.value(predictor);
                match level_column(self.domains.get(predictor), value) {
                    Level::Column(column) => matrix[[i, offset + column]] = 1.0,
                    Level::Reference => {}
                    Level::Unseen => {
                        log::debug!(
                            "Incident {}: unseen {predictor} level {value:?}",
                            row.incident_key
                        );
                        unseen = true;
                    }
                }
            }
            if unseen {
                unseen_rows += 1;
            }
        }

        Encoded {
            matrix,
            unseen_rows,
        }
    }
}

enum Level {
    Reference,
    Column(usize),
    Unseen,
}

fn level_column(domain: &CategoricalDomain, value: &str) -> Level {
    match domain.index_of(value) {
        None => Level::Unseen,
        Some(0) => Level::Reference,
        Some(index) => Level::Column(index - 1),
    }
}

#[cfg(test)]
mod tests {
    use nypd_shootings_incident_models::TimeOfDay;

    use super::*;

    fn row(key: &str, boro: &str, precinct: &str, tod: TimeOfDay) -> FeatureRow {
        FeatureRow {
            incident_key: key.to_string(),
            borough: boro.to_string(),
            precinct: precinct.to_string(),
            time_of_day: tod,
            is_murder: false,
        }
    }

    fn training() -> Vec<FeatureRow> {
        vec![
            row("1", "BRONX", "40", TimeOfDay::Night),
            row("2", "BROOKLYN", "73", TimeOfDay::Evening),
            row("3", "QUEENS", "105", TimeOfDay::Night),
        ]
    }

    #[test]
    fn drops_the_reference_level_of_each_predictor() {
        let encoder = OneHotEncoder::fit(&training());
        // boroughs 3 -> 2, precincts 3 -> 2, time of day 2 -> 1
        assert_eq!(encoder.width(), 5);
        assert_eq!(
            encoder.column_names(),
            [
                "borough=BROOKLYN",
                "borough=QUEENS",
                "precinct=40",
                "precinct=73",
                "time_of_day=Night",
            ]
        );
    }

    #[test]
    fn encodes_levels_into_their_columns() {
        let encoder = OneHotEncoder::fit(&training());
        let encoded = encoder.transform(&training());
        let m = &encoded.matrix;

        assert_eq!(m.shape(), [3, 5]);
        // BRONX is the borough reference; precinct "105" sorts first.
        assert_eq!(m.row(0).to_vec(), [0.0, 0.0, 1.0, 0.0, 1.0]);
        assert_eq!(m.row(1).to_vec(), [1.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(m.row(2).to_vec(), [0.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(encoded.unseen_rows, 0);
    }

    #[test]
    fn unseen_levels_encode_as_reference_and_are_counted() {
        let encoder = OneHotEncoder::fit(&training());
        let encoded = encoder.transform(&[
            row("4", "STATEN ISLAND", "40", TimeOfDay::Night),
            row("5", "QUEENS", "999", TimeOfDay::Morning),
            row("6", "QUEENS", "73", TimeOfDay::Evening),
        ]);

        assert_eq!(encoded.matrix.row(0).to_vec(), [0.0, 0.0, 1.0, 0.0, 1.0]);
        assert_eq!(encoded.matrix.row(1).to_vec(), [0.0, 1.0, 0.0, 0.0, 0.0]);
        assert_eq!(encoded.unseen_rows, 2);
    }
}
