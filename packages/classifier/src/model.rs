//! Logistic regression of the murder flag on the encoded predictors.

use std::fmt;

use ndarray::Array2;
use nypd_shootings_classifier_models::FeatureRow;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};

use crate::ModelError;
use crate::encoding::OneHotEncoder;

type Regression = LogisticRegression<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// Fitting parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// L2 regularization strength. `0.0` fits an unpenalized model.
    pub alpha: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self { alpha: 0.0 }
    }
}

/// Predicted labels plus the number of rows with levels unseen in training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predictions {
    pub labels: Vec<bool>,
    pub unseen_rows: u64,
}

/// A fitted binary classifier over borough, precinct and time of day.
pub struct MurderClassifier {
    encoder: OneHotEncoder,
    model: Regression,
    training_rows: usize,
}

impl fmt::Debug for MurderClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MurderClassifier")
            .field("columns", &self.encoder.width())
            .field("training_rows", &self.training_rows)
            .finish_non_exhaustive()
    }
}

/// Fits a classifier on `train`.
///
/// # Errors
///
/// * [`ModelError::EmptyTrainingSet`] if `train` is empty
/// * [`ModelError::SingleClass`] if every row has the same label
/// * [`ModelError::NoPredictors`] if no predictor has two or more levels
/// * [`ModelError::Solver`] if the regression fails
pub fn fit(train: &[FeatureRow], options: &FitOptions) -> Result<MurderClassifier, ModelError> {
    let Some(first) = train.first() else {
        return Err(ModelError::EmptyTrainingSet);
    };
    if train.iter().all(|r| r.is_murder == first.is_murder) {
        return Err(ModelError::SingleClass {
            murder: first.is_murder,
        });
    }

    let encoder = OneHotEncoder::fit(train);
    if encoder.width() == 0 {
        return Err(ModelError::NoPredictors);
    }

    let x = to_dense_matrix(&encoder.transform(train).matrix);
    let y: Vec<i32> = train.iter().map(|r| i32::from(r.is_murder)).collect();

    let params = LogisticRegressionParameters::default().with_alpha(options.alpha);
    let model = LogisticRegression::fit(&x, &y, params).map_err(|e| ModelError::Solver {
        message: e.to_string(),
    })?;

    log::info!(
        "Fitted logistic regression on {} rows with {} columns (alpha {})",
        train.len(),
        encoder.width(),
        options.alpha
    );

    Ok(MurderClassifier {
        encoder,
        model,
        training_rows: train.len(),
    })
}

impl MurderClassifier {
    /// The encoder learned from the training rows.
    #[must_use]
    pub const fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    /// Number of rows the model was fitted on.
    #[must_use]
    pub const fn training_rows(&self) -> usize {
        self.training_rows
    }

    /// Predicts the murder flag of each row.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Solver`] if prediction fails.
    pub fn predict(&self, rows: &[FeatureRow]) -> Result<Predictions, ModelError> {
        if rows.is_empty() {
            return Ok(Predictions {
                labels: Vec::new(),
                unseen_rows: 0,
            });
        }

        let encoded = self.encoder.transform(rows);
        let x = to_dense_matrix(&encoded.matrix);
        let predicted = self.model.predict(&x).map_err(|e| ModelError::Solver {
            message: e.to_string(),
        })?;

        Ok(Predictions {
            labels: predicted.into_iter().map(|label| label == 1).collect(),
            unseen_rows: encoded.unseen_rows,
        })
    }
}

fn to_dense_matrix(matrix: &Array2<f64>) -> DenseMatrix<f64> {
    let (rows, cols) = matrix.dim();
    let data: Vec<f64> = matrix.iter().copied().collect();
    DenseMatrix::new(rows, cols, data, false)
}
