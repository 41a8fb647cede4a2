use anyhow::{bail, Context, Result};
use serde::Serialize;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{LinearRegression, LinearRegressionParameters};
use smartcore::metrics::r2;
use smartcore::model_selection::train_test_split;
use thiserror::Error;

use crate::data::model::Dataset;
use crate::data::prepare::PreparedMatrix;

/// Fraction of rows held out for scoring.
const TEST_FRACTION: f32 = 0.2;
/// Fixed shuffle seed so retraining on the same data reproduces the split.
const SPLIT_SEED: u64 = 42;

// ---------------------------------------------------------------------------
// Mean imputer – first stage of the fitted pipeline
// ---------------------------------------------------------------------------

/// Replaces NaN cells with per-column means learned from the training split.
#[derive(Debug, Clone)]
struct MeanImputer {
    means: Vec<f64>,
}

impl MeanImputer {
    fn fit(x: &DenseMatrix<f64>) -> Self {
        let (rows, cols) = x.shape();
        let means = (0..cols)
            .map(|j| {
                let mut sum = 0.0;
                let mut count = 0usize;
                for i in 0..rows {
                    let v = *x.get((i, j));
                    if v.is_finite() {
                        sum += v;
                        count += 1;
                    }
                }
                if count > 0 {
                    sum / count as f64
                } else {
                    0.0
                }
            })
            .collect();
        MeanImputer { means }
    }

    fn impute_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.means)
            .map(|(&v, &mean)| if v.is_finite() { v } else { mean })
            .collect()
    }

    fn transform(&self, x: &DenseMatrix<f64>) -> Result<DenseMatrix<f64>> {
        let (rows, cols) = x.shape();
        let data: Vec<Vec<f64>> = (0..rows)
            .map(|i| {
                let row: Vec<f64> = (0..cols).map(|j| *x.get((i, j))).collect();
                self.impute_row(&row)
            })
            .collect();
        DenseMatrix::from_2d_vec(&data).context("rebuilding imputed matrix")
    }
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

/// A fitted imputer + OLS pipeline bound to an ordered feature list.
/// Overwritten wholesale on each retrain.
#[derive(Debug)]
pub struct TrainedModel {
    /// Name of the raw column the model predicts.
    pub target: String,
    /// Feature columns in training order; prediction input is positional
    /// against this list.
    pub feature_names: Vec<String>,
    /// R² on the held-out split.
    pub r2: f64,
    imputer: MeanImputer,
    regressor: LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>,
}

/// Fit the pipeline on the selected prepared-feature columns.
///
/// The regression target is always the FIRST column of the raw table. The
/// chart target selector is a separate variable and does not influence
/// training; this mirrors the legacy behavior deliberately.
pub fn train(
    dataset: &Dataset,
    features: &PreparedMatrix,
    selected: &[String],
) -> Result<TrainedModel> {
    if selected.is_empty() {
        bail!("no feature columns selected");
    }

    let target_col = dataset
        .columns
        .first()
        .context("dataset has no columns")?;
    let y: Vec<f64> = target_col
        .numeric_values()
        .into_iter()
        .collect::<Option<_>>()
        .with_context(|| {
            format!(
                "target column '{}' has missing or non-numeric values",
                target_col.name
            )
        })?;

    let rows = features.rows_for(selected)?;
    if rows.len() != y.len() {
        bail!(
            "feature matrix has {} rows but target has {}",
            rows.len(),
            y.len()
        );
    }

    let x = DenseMatrix::from_2d_vec(&rows).context("building feature matrix")?;
    let (x_train, x_test, y_train, y_test) =
        train_test_split(&x, &y, TEST_FRACTION, true, Some(SPLIT_SEED));

    let imputer = MeanImputer::fit(&x_train);
    let x_train = imputer.transform(&x_train)?;
    let x_test = imputer.transform(&x_test)?;

    let regressor = LinearRegression::fit(&x_train, &y_train, LinearRegressionParameters::default())
        .context("fitting linear regression")?;

    let y_pred = regressor
        .predict(&x_test)
        .context("scoring on the held-out split")?;
    let score = r2(&y_test, &y_pred);

    Ok(TrainedModel {
        target: target_col.name.clone(),
        feature_names: selected.to_vec(),
        r2: score,
        imputer,
        regressor,
    })
}

impl TrainedModel {
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Predict a single point from positionally ordered feature values.
    pub fn predict_one(&self, values: &[f64]) -> Result<f64, PredictError> {
        if values.len() != self.n_features() {
            return Err(PredictError::WrongCount {
                expected: self.n_features(),
                got: values.len(),
            });
        }

        let row = self.imputer.impute_row(values);
        let x = DenseMatrix::from_2d_vec(&vec![row])
            .map_err(|e| PredictError::Model(e.to_string()))?;
        let prediction = self
            .regressor
            .predict(&x)
            .map_err(|e| PredictError::Model(e.to_string()))?;

        prediction
            .first()
            .copied()
            .ok_or_else(|| PredictError::Model("empty prediction".to_string()))
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            target: self.target.clone(),
            features: self.feature_names.clone(),
            r2: self.r2,
        }
    }
}

/// Exportable description of the fitted model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub target: String,
    pub features: Vec<String>,
    pub r2: f64,
}

// ---------------------------------------------------------------------------
// Prediction from freeform input
// ---------------------------------------------------------------------------

/// Everything that can go wrong between the input box and a prediction.
/// Rendered verbatim to the user, so messages must stay readable.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("no trained model; train a model first")]
    NotTrained,
    #[error("could not read '{0}' as a number")]
    BadNumber(String),
    #[error("expected {expected} feature values, got {got}")]
    WrongCount { expected: usize, got: usize },
    #[error("{0}")]
    Model(String),
}

/// Parse a comma-separated value string into floats.
pub fn parse_input_line(line: &str) -> Result<Vec<f64>, PredictError> {
    line.split(',')
        .map(|tok| {
            let tok = tok.trim();
            tok.parse::<f64>()
                .map_err(|_| PredictError::BadNumber(tok.to_string()))
        })
        .collect()
}

/// Run the full prediction path: parse, then feed positionally into the
/// trained model.
pub fn predict_line(model: Option<&TrainedModel>, line: &str) -> Result<f64, PredictError> {
    let model = model.ok_or(PredictError::NotTrained)?;
    let values = parse_input_line(line)?;
    model.predict_one(&values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::parse_csv;
    use crate::data::prepare::prepare;

    /// price = 3·age + 5, forty rows. Perfectly linear, so the held-out R²
    /// must be essentially 1 regardless of the split.
    fn linear_dataset() -> Dataset {
        let mut csv = String::from("price,age\n");
        for i in 0..40 {
            let age = i as f64;
            csv.push_str(&format!("{},{age}\n", 3.0 * age + 5.0));
        }
        parse_csv(csv.as_bytes()).unwrap()
    }

    #[test]
    fn training_recovers_a_linear_relationship() {
        let ds = linear_dataset();
        let prepared = prepare(&ds).unwrap();
        let model = train(&ds, &prepared.features, &["age".to_string()]).unwrap();

        assert_eq!(model.target, "price");
        assert_eq!(model.feature_names, vec!["age"]);
        assert!(model.r2 > 0.99, "r2 was {}", model.r2);

        let p = model.predict_one(&[0.0]).unwrap();
        assert!(p.is_finite());
    }

    #[test]
    fn mismatched_value_count_is_a_readable_error() {
        let ds = linear_dataset();
        let prepared = prepare(&ds).unwrap();
        let model = train(&ds, &prepared.features, &["age".to_string()]).unwrap();

        let err = model.predict_one(&[1.0, 2.0]).unwrap_err();
        assert_eq!(err.to_string(), "expected 1 feature values, got 2");
    }

    #[test]
    fn unparsable_tokens_are_reported() {
        let err = parse_input_line("1.5, abc, 3").unwrap_err();
        assert_eq!(err.to_string(), "could not read 'abc' as a number");
    }

    #[test]
    fn predicting_without_a_model_fails_cleanly() {
        let err = predict_line(None, "1,2,3").unwrap_err();
        assert!(matches!(err, PredictError::NotTrained));
    }

    #[test]
    fn categorical_target_is_a_training_error() {
        let ds = parse_csv("label,age\nyes,1\nno,2\n".as_bytes()).unwrap();
        let prepared = prepare(&ds).unwrap();
        let err = train(&ds, &prepared.features, &["age".to_string()]).unwrap_err();
        assert!(err.to_string().contains("label"));
    }

    #[test]
    fn model_summary_serializes() {
        let ds = linear_dataset();
        let prepared = prepare(&ds).unwrap();
        let model = train(&ds, &prepared.features, &["age".to_string()]).unwrap();

        let json = serde_json::to_string(&model.summary()).unwrap();
        assert!(json.contains("\"target\":\"price\""));
        assert!(json.contains("\"age\""));
    }
}
