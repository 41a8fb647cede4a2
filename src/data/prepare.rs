use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;

use super::model::Dataset;

// ---------------------------------------------------------------------------
// Prepared artifacts
// ---------------------------------------------------------------------------

/// Median-imputed numeric columns (unscaled). Feeds the correlation chart.
#[derive(Debug, Clone)]
pub struct NumericTable {
    pub names: Vec<String>,
    /// Column-major, same order as `names`.
    pub columns: Vec<Vec<f64>>,
}

/// Mode-imputed categorical columns as display strings.
#[derive(Debug, Clone)]
pub struct CategoricalTable {
    pub names: Vec<String>,
    pub columns: Vec<Vec<String>>,
}

/// The model-ready feature matrix: standardized numeric columns followed by
/// one-hot encoded categorical columns (first level dropped per column).
#[derive(Debug, Clone)]
pub struct PreparedMatrix {
    pub column_names: Vec<String>,
    /// Column-major, same order as `column_names`.
    pub columns: Vec<Vec<f64>>,
}

impl PreparedMatrix {
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.len())
    }

    /// Row-major rows restricted to the given columns, in matrix order.
    /// Errors on an unknown column name.
    pub fn rows_for(&self, names: &[String]) -> Result<Vec<Vec<f64>>> {
        let selected: Vec<&Vec<f64>> = names
            .iter()
            .map(|name| {
                self.column_names
                    .iter()
                    .position(|c| c == name)
                    .map(|i| &self.columns[i])
                    .with_context(|| format!("unknown feature column '{name}'"))
            })
            .collect::<Result<_>>()?;

        Ok((0..self.n_rows())
            .map(|row| selected.iter().map(|col| col[row]).collect())
            .collect())
    }
}

/// The three derived artifacts of one load. The raw [`Dataset`] itself is
/// the fourth and is kept alongside by the caller.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub numeric: NumericTable,
    pub categorical: CategoricalTable,
    pub features: PreparedMatrix,
}

// ---------------------------------------------------------------------------
// Preparation pipeline
// ---------------------------------------------------------------------------

/// Transform a raw table into the imputed partitions and the feature matrix.
///
/// Policy (in order): partition columns by dtype; fill numeric gaps with the
/// column median; fill categorical gaps with the column's most frequent
/// value (smallest on ties); one-hot encode categoricals dropping the first
/// sorted level per column (`{col}_{level}` names); standardize numeric
/// columns to zero mean / unit variance; concatenate numeric-first.
///
/// Any failure propagates; the caller must not commit partial state.
pub fn prepare(dataset: &Dataset) -> Result<Prepared> {
    if dataset.is_empty() {
        bail!("dataset has no rows");
    }

    let numeric = impute_numeric(dataset)?;
    let categorical = impute_categorical(dataset)?;

    let mut column_names = Vec::new();
    let mut columns = Vec::new();

    for (name, col) in numeric.names.iter().zip(&numeric.columns) {
        column_names.push(name.clone());
        columns.push(standardize(col));
    }

    for (name, col) in categorical.names.iter().zip(&categorical.columns) {
        let (encoded_names, encoded_cols) = one_hot_encode(name, col);
        column_names.extend(encoded_names);
        columns.extend(encoded_cols);
    }

    Ok(Prepared {
        numeric,
        categorical,
        features: PreparedMatrix {
            column_names,
            columns,
        },
    })
}

/// Median-impute every numeric column of the dataset.
pub fn impute_numeric(dataset: &Dataset) -> Result<NumericTable> {
    let mut names = Vec::new();
    let mut columns = Vec::new();

    for col in dataset.columns.iter().filter(|c| c.is_numeric()) {
        let values = col.numeric_values();
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            bail!("column '{}' is entirely missing, cannot impute", col.name);
        }
        let fill = median(&present);
        names.push(col.name.clone());
        columns.push(values.into_iter().map(|v| v.unwrap_or(fill)).collect());
    }

    Ok(NumericTable { names, columns })
}

/// Mode-impute every categorical column of the dataset.
pub fn impute_categorical(dataset: &Dataset) -> Result<CategoricalTable> {
    let mut names = Vec::new();
    let mut columns = Vec::new();

    for col in dataset.columns.iter().filter(|c| !c.is_numeric()) {
        let values = col.text_values();
        let fill = mode(values.iter().flatten())
            .with_context(|| format!("column '{}' is entirely missing, cannot impute", col.name))?;
        names.push(col.name.clone());
        columns.push(values.into_iter().map(|v| v.unwrap_or_else(|| fill.clone())).collect());
    }

    Ok(CategoricalTable { names, columns })
}

/// One-hot encode a single imputed categorical column, dropping the first
/// sorted level. A single-level column therefore encodes to zero columns.
fn one_hot_encode(name: &str, values: &[String]) -> (Vec<String>, Vec<Vec<f64>>) {
    let levels: Vec<&String> = {
        let set: std::collections::BTreeSet<&String> = values.iter().collect();
        set.into_iter().collect()
    };

    let kept = &levels[1.min(levels.len())..];

    let names = kept.iter().map(|level| format!("{name}_{level}")).collect();
    let columns = kept
        .iter()
        .map(|level| {
            values
                .iter()
                .map(|v| if v == *level { 1.0 } else { 0.0 })
                .collect()
        })
        .collect();

    (names, columns)
}

/// Z-score a column using the population standard deviation.
/// A zero-variance column maps to all zeros rather than NaN.
fn standardize(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();

    if std == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - mean) / std).collect()
}

/// Median with linear interpolation for even-length input.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Most frequent value; the smallest one wins on ties.
fn mode<'a>(values: impl Iterator<Item = &'a String>) -> Option<String> {
    let mut counts: BTreeMap<&'a String, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    // BTreeMap iterates in ascending key order, so the first maximum is the
    // smallest of the most frequent values.
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(a.0)))
        .map(|(v, _)| v.clone())
}
