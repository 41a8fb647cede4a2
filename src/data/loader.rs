use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::model::{CellValue, Column, Dataset};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a dataset from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.csv` – delimited text with a header row
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path).context("opening CSV file")?;
            parse_csv(file)
        }
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Decode an upload content string of the form `type,base64payload`
/// (e.g. `data:text/csv;base64,cHJpY2Us...`) and parse the payload as CSV.
///
/// The prefix before the first comma is an opaque content type and is
/// ignored; everything after it must be valid base64 UTF-8 text.
pub fn decode_contents(contents: &str) -> Result<Dataset> {
    let (_content_type, payload) = contents
        .split_once(',')
        .context("content string has no `type,payload` separator")?;

    let decoded = STANDARD
        .decode(payload.trim())
        .context("decoding base64 payload")?;
    let text = String::from_utf8(decoded).context("payload is not UTF-8 text")?;

    parse_csv(text.as_bytes())
}

// ---------------------------------------------------------------------------
// CSV parsing
// ---------------------------------------------------------------------------

/// Parse delimited text with a header row into a [`Dataset`].
///
/// Cells are typed leniently (integer, then float, else string; empty cell
/// → null). Whether a whole column is numeric is decided afterwards by
/// [`Column::is_numeric`], matching dataframe-style dtype inference.
pub fn parse_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.is_empty() {
        bail!("CSV has no columns");
    }

    let mut columns: Vec<Column> = headers
        .into_iter()
        .map(|name| Column {
            name,
            values: Vec::new(),
        })
        .collect();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        if record.len() != columns.len() {
            bail!(
                "CSV row {row_no}: expected {} fields, got {}",
                columns.len(),
                record.len()
            );
        }

        for (col, field) in columns.iter_mut().zip(record.iter()) {
            col.values.push(guess_cell_type(field));
        }
    }

    Ok(Dataset::new(columns))
}

fn guess_cell_type(s: &str) -> CellValue {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return CellValue::Float(f);
    }
    CellValue::String(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "price,city,age\n100.5,Oslo,10\n90,Bergen,\n120.0,Oslo,8\n";

    #[test]
    fn parses_csv_with_type_inference() {
        let ds = parse_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.column_names(), vec!["price", "city", "age"]);
        assert_eq!(ds.n_rows(), 3);
        assert_eq!(ds.numeric_column_names(), vec!["price", "age"]);
        assert_eq!(ds.categorical_column_names(), vec!["city"]);

        let age = ds.column("age").unwrap();
        assert_eq!(
            age.values,
            vec![CellValue::Integer(10), CellValue::Null, CellValue::Integer(8)]
        );
    }

    #[test]
    fn decode_contents_round_trips_base64() {
        let contents = format!("data:text/csv;base64,{}", STANDARD.encode(SAMPLE));
        let ds = decode_contents(&contents).unwrap();
        assert_eq!(ds.n_rows(), 3);
        assert_eq!(ds.column_names(), vec!["price", "city", "age"]);
    }

    #[test]
    fn decode_contents_rejects_bad_payloads() {
        assert!(decode_contents("no separator here").is_err());
        assert!(decode_contents("data:text/csv;base64,!!!not-base64!!!").is_err());
    }

    #[test]
    fn ragged_rows_are_a_parse_error() {
        let err = parse_csv("a,b\n1,2\n3\n".as_bytes());
        assert!(err.is_err());
    }

    #[test]
    fn load_file_dispatches_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let csv_path = dir.path().join("data.csv");
        std::fs::File::create(&csv_path)
            .unwrap()
            .write_all(SAMPLE.as_bytes())
            .unwrap();
        assert_eq!(load_file(&csv_path).unwrap().n_rows(), 3);

        let other = dir.path().join("data.parquet");
        std::fs::File::create(&other).unwrap();
        assert!(load_file(&other).is_err());
    }
}
