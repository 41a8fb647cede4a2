//! End-to-end pipeline: write a CSV to disk, load it, prepare it, train a
//! model on a feature subset, and get a prediction back.

use std::io::Write;

use tablab::data::explore::{correlation_with_target, group_means};
use tablab::data::loader::load_file;
use tablab::state::AppState;

fn write_sample_csv(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("housing.csv");
    let mut file = std::fs::File::create(&path).unwrap();

    writeln!(file, "price,age,city").unwrap();
    for i in 0..50 {
        let age = i as f64;
        let city = match i % 3 {
            0 => "Oslo",
            1 => "Bergen",
            _ => "Trondheim",
        };
        // Missing age on a few rows; price stays complete.
        let age_cell = if i % 17 == 0 {
            String::new()
        } else {
            format!("{age}")
        };
        writeln!(file, "{},{},{}", 200.0 - 2.0 * age, age_cell, city).unwrap();
    }
    path
}

#[test]
fn load_explore_train_predict() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sample_csv(&dir);

    let mut state = AppState::default();
    state.ingest(load_file(&path).unwrap()).unwrap();

    // Four artifacts of the load.
    let dataset = state.dataset.as_ref().unwrap();
    let prepared = state.prepared.as_ref().unwrap();
    assert_eq!(dataset.column_names(), vec!["price", "age", "city"]);
    assert_eq!(prepared.numeric.names, vec!["price", "age"]);
    assert_eq!(prepared.categorical.names, vec!["city"]);
    // 2 standardized numeric + (3 city levels - 1) encoded.
    assert_eq!(prepared.features.column_names.len(), 4);

    // Exploration: one correlation bar (age vs price), one average bar per city.
    let corr = correlation_with_target(&prepared.numeric, "price").unwrap();
    assert_eq!(corr.labels, vec!["age"]);
    assert!(corr.values[0] < -0.9, "price falls with age: {}", corr.values[0]);

    let avg = group_means(dataset, "city", "price").unwrap();
    assert_eq!(avg.labels, vec!["Bergen", "Oslo", "Trondheim"]);

    // Training on the standardized age column.
    state.toggle_feature("age");
    state.train();
    let status = state.train_status.clone().unwrap();
    assert!(
        status.starts_with("Model trained successfully with R² score:"),
        "{status}"
    );
    let model = state.model.as_ref().unwrap();
    assert_eq!(model.target, "price");
    assert!(model.r2 > 0.9, "r2 was {}", model.r2);

    // Positional prediction.
    state.predict_input = "0.0".to_string();
    state.predict();
    let prediction = state.predict_status.clone().unwrap();
    assert!(prediction.starts_with("Prediction:"), "{prediction}");

    // A second load replaces the session wholesale.
    state.ingest(load_file(&path).unwrap()).unwrap();
    assert!(state.selected_features.is_empty());
    assert_eq!(state.target_column.as_deref(), Some("price"));
}
