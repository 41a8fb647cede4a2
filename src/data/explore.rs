use std::collections::BTreeMap;

use super::model::Dataset;
use super::prepare::NumericTable;

// ---------------------------------------------------------------------------
// Chart-ready aggregates
// ---------------------------------------------------------------------------

/// One bar chart worth of data: parallel label / value vectors plus axis text.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Pearson correlation of every imputed numeric column against `target`,
/// excluding the target itself. Columns whose correlation is undefined
/// (zero variance) are skipped. Returns `None` if `target` is not a numeric
/// column.
pub fn correlation_with_target(numeric: &NumericTable, target: &str) -> Option<BarSeries> {
    let target_idx = numeric.names.iter().position(|n| n == target)?;
    let target_col = &numeric.columns[target_idx];

    let mut labels = Vec::new();
    let mut values = Vec::new();

    for (name, col) in numeric.names.iter().zip(&numeric.columns) {
        if name == target {
            continue;
        }
        if let Some(r) = pearson(col, target_col) {
            labels.push(name.clone());
            values.push(r);
        }
    }

    Some(BarSeries {
        title: format!("Correlation Strength of numerical variables with {target}"),
        x_label: "Numerical Variables".to_string(),
        y_label: "Correlation Strength".to_string(),
        labels,
        values,
    })
}

/// Mean of the raw `target` column grouped by the raw `group_by` column.
/// Rows with a missing group or target cell are skipped; groups come out in
/// sorted order. Returns `None` if either column is absent.
pub fn group_means(dataset: &Dataset, group_by: &str, target: &str) -> Option<BarSeries> {
    let group_col = dataset.column(group_by)?;
    let target_col = dataset.column(target)?;

    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for (group, value) in group_col.values.iter().zip(&target_col.values) {
        if group.is_null() {
            continue;
        }
        if let Some(v) = value.as_f64() {
            let entry = sums.entry(group.to_string()).or_insert((0.0, 0));
            entry.0 += v;
            entry.1 += 1;
        }
    }

    let mut labels = Vec::new();
    let mut values = Vec::new();
    for (group, (sum, count)) in sums {
        labels.push(group);
        values.push(sum / count as f64);
    }

    Some(BarSeries {
        title: format!("Average {target} by {group_by}"),
        x_label: group_by.to_string(),
        y_label: target.to_string(),
        labels,
        values,
    })
}

/// Pearson correlation coefficient; `None` when either side has zero
/// variance (the coefficient is undefined there).
fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len() as f64;
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::parse_csv;
    use crate::data::prepare::impute_numeric;

    const SAMPLE: &str = "\
age,city,price
1,Oslo,10.0
2,Bergen,20.0
3,Oslo,30.0
4,Bergen,40.0
";

    #[test]
    fn correlation_chart_has_one_bar_per_other_numeric_column() {
        let ds = parse_csv(SAMPLE.as_bytes()).unwrap();
        let numeric = impute_numeric(&ds).unwrap();

        let series = correlation_with_target(&numeric, "price").unwrap();
        assert_eq!(series.labels, vec!["age"]);
        assert!((series.values[0] - 1.0).abs() < 1e-12);
        assert_eq!(series.y_label, "Correlation Strength");
    }

    #[test]
    fn average_chart_has_one_bar_per_group() {
        let ds = parse_csv(SAMPLE.as_bytes()).unwrap();
        let series = group_means(&ds, "city", "price").unwrap();
        assert_eq!(series.labels, vec!["Bergen", "Oslo"]);
        assert_eq!(series.values, vec![30.0, 20.0]);
        assert_eq!(series.title, "Average price by city");
    }

    #[test]
    fn missing_cells_are_skipped_in_group_means() {
        let ds = parse_csv("city,price\nOslo,10\nOslo,\n,99\nBergen,4\n".as_bytes()).unwrap();
        let series = group_means(&ds, "city", "price").unwrap();
        assert_eq!(series.labels, vec!["Bergen", "Oslo"]);
        assert_eq!(series.values, vec![4.0, 10.0]);
    }

    #[test]
    fn zero_variance_columns_are_skipped_in_correlation() {
        let ds = parse_csv("flat,price\n5,1\n5,2\n5,3\n".as_bytes()).unwrap();
        let numeric = impute_numeric(&ds).unwrap();
        let series = correlation_with_target(&numeric, "price").unwrap();
        assert!(series.labels.is_empty());
    }

    #[test]
    fn unknown_target_yields_no_series() {
        let ds = parse_csv(SAMPLE.as_bytes()).unwrap();
        let numeric = impute_numeric(&ds).unwrap();
        assert!(correlation_with_target(&numeric, "city").is_none());
        assert!(group_means(&ds, "nope", "price").is_none());
    }
}
