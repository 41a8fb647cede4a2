use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = state.model.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export model summary…"))
                .clicked()
            {
                export_model_summary(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} rows × {} columns loaded",
                ds.n_rows(),
                ds.columns.len()
            ));
        }

        if let Some(model) = &state.model {
            ui.separator();
            ui.label(format!(
                "model: {} ~ {} features, R² {:.2}",
                model.target,
                model.n_features(),
                model.r2
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Left side panel – selectors, training and prediction controls
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Explore");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone the name lists so we can mutate state inside the loops.
    let numeric_cols = dataset.numeric_column_names();
    let categorical_cols = dataset.categorical_column_names();
    let first_column = dataset.columns.first().map(|c| c.name.clone());

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Chart target selector ----
            ui.strong("Target variable");
            let current_target = state.target_column.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("target_column")
                .selected_text(&current_target)
                .show_ui(ui, |ui: &mut Ui| {
                    for col in &numeric_cols {
                        if ui
                            .selectable_label(current_target == *col, col)
                            .clicked()
                        {
                            state.set_target_column(col.clone());
                        }
                    }
                });
            ui.add_space(4.0);

            // ---- Group-by selector ----
            ui.strong("Group by");
            if categorical_cols.is_empty() {
                ui.label("No categorical columns.");
            }
            for col in &categorical_cols {
                let selected = state.group_column.as_deref() == Some(col.as_str());
                if ui.radio(selected, col).clicked() {
                    state.set_group_column(col.clone());
                }
            }
            ui.separator();

            // ---- Feature selection + training ----
            ui.heading("Train");
            if let Some(first) = &first_column {
                // The model always regresses on the first raw column; the
                // target selector above only drives the charts.
                ui.label(
                    RichText::new(format!("Regression target: '{first}' (first column)"))
                        .italics()
                        .small(),
                );
            }
            ui.add_space(4.0);

            ui.strong("Features");
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all_features();
                }
                if ui.small_button("None").clicked() {
                    state.select_no_features();
                }
            });

            let feature_names: Vec<String> = state
                .prepared
                .as_ref()
                .map(|p| p.features.column_names.clone())
                .unwrap_or_default();
            for name in &feature_names {
                let mut checked = state.selected_features.contains(name);
                if ui.checkbox(&mut checked, name).changed() {
                    state.toggle_feature(name);
                }
            }

            ui.add_space(4.0);
            if ui.button("Train Model").clicked() {
                state.train();
            }
            if let Some(status) = state.train_status.clone() {
                ui.label(status);
            }
            ui.separator();

            // ---- Prediction ----
            ui.heading("Predict");
            if let Some(model) = &state.model {
                ui.label(
                    RichText::new(format!("Value order: {}", model.feature_names.join(", ")))
                        .small(),
                );
            }
            ui.add(
                egui::TextEdit::singleline(&mut state.predict_input)
                    .hint_text("Enter feature values separated by commas"),
            );
            if ui.button("Predict").clicked() {
                state.predict();
            }
            if let Some(status) = state.predict_status.clone() {
                ui.label(status);
            }
        });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open tabular data")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path).and_then(|ds| state.ingest(ds)) {
            Ok(()) => {
                if let Some(ds) = &state.dataset {
                    log::info!(
                        "Loaded {} rows with columns {:?}",
                        ds.n_rows(),
                        ds.column_names()
                    );
                }
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

fn export_model_summary(state: &mut AppState) {
    let Some(model) = &state.model else {
        return;
    };

    let file = rfd::FileDialog::new()
        .set_title("Export model summary")
        .set_file_name("model_summary.json")
        .add_filter("JSON", &["json"])
        .save_file();

    if let Some(path) = file {
        let result = serde_json::to_string_pretty(&model.summary())
            .map_err(anyhow::Error::from)
            .and_then(|json| std::fs::write(&path, json).map_err(anyhow::Error::from));
        match result {
            Ok(()) => log::info!("Exported model summary to {}", path.display()),
            Err(e) => {
                log::error!("Failed to export model summary: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
