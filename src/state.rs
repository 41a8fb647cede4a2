use std::collections::BTreeSet;

use anyhow::Result;

use crate::color::ColorMap;
use crate::data::model::Dataset;
use crate::data::prepare::{prepare, Prepared};
use crate::model::{self, TrainedModel};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full session state, independent of rendering. Replaces the legacy
/// process-global dataset/model variables; single-session by construction.
pub struct AppState {
    /// Loaded raw table (None until the user loads a file).
    pub dataset: Option<Dataset>,

    /// Derived artifacts of the last successful load.
    pub prepared: Option<Prepared>,

    /// Numeric column charted against the others (correlation chart) and
    /// averaged per group (average chart). Unrelated to the training target.
    pub target_column: Option<String>,

    /// Categorical column the average chart groups by.
    pub group_column: Option<String>,

    /// Prepared-feature columns ticked for training.
    pub selected_features: BTreeSet<String>,

    /// Last fitted model. Survives a new load until the next retrain.
    pub model: Option<TrainedModel>,

    /// Status line under the train button.
    pub train_status: Option<String>,

    /// Freeform comma-separated prediction input.
    pub predict_input: String,

    /// Status line under the predict button.
    pub predict_status: Option<String>,

    /// Load / export error shown in the top bar.
    pub status_message: Option<String>,

    /// Bar colours for the current group-by column.
    pub color_map: Option<ColorMap>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            prepared: None,
            target_column: None,
            group_column: None,
            selected_features: BTreeSet::new(),
            model: None,
            train_status: None,
            predict_input: String::new(),
            predict_status: None,
            status_message: None,
            color_map: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded table: run the preparation pipeline, then
    /// commit everything atomically. On failure the previous dataset,
    /// charts and model are left untouched.
    pub fn ingest(&mut self, dataset: Dataset) -> Result<()> {
        let prepared = prepare(&dataset)?;

        // Default selectors: first numeric column as the chart target,
        // first categorical column as the group-by.
        self.target_column = dataset.numeric_column_names().into_iter().next();
        self.group_column = dataset.categorical_column_names().into_iter().next();
        self.selected_features.clear();

        self.dataset = Some(dataset);
        self.prepared = Some(prepared);
        self.rebuild_color_map();
        self.status_message = None;
        Ok(())
    }

    /// Rebuild the bar colour map from the current group-by column.
    pub fn rebuild_color_map(&mut self) {
        self.color_map = match (&self.dataset, &self.group_column) {
            (Some(ds), Some(col)) => ds
                .column(col)
                .map(|c| ColorMap::new(col, c.unique_levels())),
            _ => None,
        };
    }

    /// Set the chart target column.
    pub fn set_target_column(&mut self, col: String) {
        self.target_column = Some(col);
    }

    /// Set the group-by column and rebuild the colour map.
    pub fn set_group_column(&mut self, col: String) {
        self.group_column = Some(col);
        self.rebuild_color_map();
    }

    /// Toggle a feature checkbox.
    pub fn toggle_feature(&mut self, name: &str) {
        if !self.selected_features.remove(name) {
            self.selected_features.insert(name.to_string());
        }
    }

    /// Select every prepared-feature column.
    pub fn select_all_features(&mut self) {
        if let Some(prepared) = &self.prepared {
            self.selected_features = prepared.features.column_names.iter().cloned().collect();
        }
    }

    /// Deselect every feature column.
    pub fn select_no_features(&mut self) {
        self.selected_features.clear();
    }

    /// The ticked features in prepared-matrix order (numeric first, then
    /// encoded). This is the order the model trains on and the order the
    /// prediction input must follow.
    pub fn features_in_matrix_order(&self) -> Vec<String> {
        self.prepared
            .as_ref()
            .map(|p| {
                p.features
                    .column_names
                    .iter()
                    .filter(|name| self.selected_features.contains(*name))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Handle a train-button click. With no data or no selection the click
    /// is a silent no-op: prior output stays on screen.
    pub fn train(&mut self) {
        let (Some(dataset), Some(prepared)) = (&self.dataset, &self.prepared) else {
            return;
        };
        if self.selected_features.is_empty() {
            return;
        }

        let selected = self.features_in_matrix_order();
        match model::train(dataset, &prepared.features, &selected) {
            Ok(trained) => {
                self.train_status = Some(format!(
                    "Model trained successfully with R² score: {:.2}",
                    trained.r2
                ));
                self.model = Some(trained);
            }
            Err(e) => {
                log::error!("training failed: {e:#}");
                self.train_status = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Handle a predict-button click. Empty input is a silent no-op; every
    /// other failure becomes a readable status string.
    pub fn predict(&mut self) {
        if self.predict_input.trim().is_empty() {
            return;
        }

        match model::predict_line(self.model.as_ref(), &self.predict_input) {
            Ok(value) => {
                self.predict_status = Some(format!("Prediction: {value:.2}"));
            }
            Err(e) => {
                self.predict_status = Some(format!("Error in prediction: {e}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::parse_csv;

    fn sample_state() -> AppState {
        let mut csv = String::from("price,age,city\n");
        for i in 0..30 {
            let city = if i % 2 == 0 { "Oslo" } else { "Bergen" };
            csv.push_str(&format!("{},{i},{city}\n", 2.0 * i as f64 + 1.0));
        }
        let mut state = AppState::default();
        state.ingest(parse_csv(csv.as_bytes()).unwrap()).unwrap();
        state
    }

    #[test]
    fn ingest_initializes_selectors() {
        let state = sample_state();
        assert_eq!(state.target_column.as_deref(), Some("price"));
        assert_eq!(state.group_column.as_deref(), Some("city"));
        assert!(state.selected_features.is_empty());
        assert!(state.color_map.is_some());
    }

    #[test]
    fn failed_ingest_preserves_previous_session() {
        let mut state = sample_state();
        // All-null column cannot be prepared.
        let bad = parse_csv("x,y\n,1\n,2\n".as_bytes()).unwrap();
        assert!(state.ingest(bad).is_err());
        assert!(state.dataset.is_some());
        assert_eq!(state.target_column.as_deref(), Some("price"));
    }

    #[test]
    fn train_without_data_or_selection_is_suppressed() {
        let mut empty = AppState::default();
        empty.train();
        assert!(empty.train_status.is_none());

        let mut state = sample_state();
        state.train();
        assert!(state.train_status.is_none(), "no features selected yet");
    }

    #[test]
    fn train_then_predict_happy_path() {
        let mut state = sample_state();
        state.toggle_feature("age");
        state.train();
        let status = state.train_status.clone().unwrap();
        assert!(status.starts_with("Model trained successfully"), "{status}");

        state.predict_input = "0.5".to_string();
        state.predict();
        assert!(state.predict_status.clone().unwrap().starts_with("Prediction:"));
    }

    #[test]
    fn predict_failures_are_caught_as_strings() {
        let mut state = sample_state();
        state.predict_input = "  ".to_string();
        state.predict();
        assert!(state.predict_status.is_none(), "blank input is suppressed");

        state.predict_input = "1,2,3".to_string();
        state.predict();
        let status = state.predict_status.clone().unwrap();
        assert!(status.starts_with("Error in prediction:"), "{status}");

        state.toggle_feature("age");
        state.train();
        state.predict_input = "1,2".to_string();
        state.predict();
        assert_eq!(
            state.predict_status.as_deref(),
            Some("Error in prediction: expected 1 feature values, got 2")
        );
    }

    #[test]
    fn feature_order_follows_the_matrix_not_click_order() {
        let mut state = sample_state();
        state.toggle_feature("city_Oslo");
        state.toggle_feature("age");
        assert_eq!(
            state.features_in_matrix_order(),
            vec!["age".to_string(), "city_Oslo".to_string()]
        );

        state.select_all_features();
        assert_eq!(state.features_in_matrix_order().len(), 3);
        state.select_no_features();
        assert!(state.features_in_matrix_order().is_empty());
    }
}
