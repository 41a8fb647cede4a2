use eframe::egui::{self, Color32, Ui};
use egui_plot::{Bar, BarChart, Plot, PlotPoint, Text};

use crate::data::explore::{correlation_with_target, group_means, BarSeries};
use crate::data::model::Dataset;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Central panel: correlation + group-average bar charts, data preview
// ---------------------------------------------------------------------------

/// Render the exploration charts in the central panel.
pub fn charts(ui: &mut Ui, state: &AppState) {
    let (Some(dataset), Some(prepared)) = (&state.dataset, &state.prepared) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a CSV file to explore it  (File → Open…)");
        });
        return;
    };

    egui::CollapsingHeader::new("Data preview")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            preview_table(ui, dataset);
        });
    ui.separator();

    let chart_height = (ui.available_height() / 2.0 - 24.0).max(120.0);

    // Correlation of every other numeric column with the chart target.
    if let Some(series) = state
        .target_column
        .as_deref()
        .and_then(|target| correlation_with_target(&prepared.numeric, target))
    {
        bar_chart(ui, "corr_chart", &series, chart_height, |_| {
            Color32::LIGHT_BLUE
        });
    }

    // Average of the target per group-by category, one colour per category.
    if let (Some(target), Some(group)) =
        (state.target_column.as_deref(), state.group_column.as_deref())
    {
        if let Some(series) = group_means(dataset, group, target) {
            bar_chart(ui, "avg_chart", &series, chart_height, |label| {
                state
                    .color_map
                    .as_ref()
                    .map(|cm| cm.color_for(label))
                    .unwrap_or(Color32::LIGHT_BLUE)
            });
        }
    }
}

/// One labelled bar chart: a bar per label, value text above each bar.
fn bar_chart(
    ui: &mut Ui,
    id: &str,
    series: &BarSeries,
    height: f32,
    color_for: impl Fn(&str) -> Color32,
) {
    ui.strong(&series.title);

    let bars: Vec<Bar> = series
        .labels
        .iter()
        .zip(&series.values)
        .enumerate()
        .map(|(i, (label, &value))| {
            Bar::new(i as f64, value)
                .name(label)
                .fill(color_for(label))
        })
        .collect();

    let labels = series.labels.clone();
    Plot::new(id)
        .height(height)
        .x_axis_label(&series.x_label)
        .y_axis_label(&series.y_label)
        .allow_boxed_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .x_axis_formatter(move |mark, _range| {
            let i = mark.value.round();
            if (mark.value - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < labels.len() {
                labels[i as usize].clone()
            } else {
                String::new()
            }
        })
        .show(ui, |plot_ui| {
            for (i, &value) in series.values.iter().enumerate() {
                plot_ui.text(Text::new(
                    PlotPoint::new(i as f64, value),
                    format!("{value:.2}"),
                ));
            }
            plot_ui.bar_chart(BarChart::new(bars).width(0.6));
        });
}

/// First rows of the raw table, for sanity-checking a load.
fn preview_table(ui: &mut Ui, dataset: &Dataset) {
    use egui_extras::{Column, TableBuilder};

    const MAX_PREVIEW_ROWS: usize = 100;
    let n_rows = dataset.n_rows().min(MAX_PREVIEW_ROWS);

    TableBuilder::new(ui)
        .striped(true)
        .columns(Column::auto().resizable(true), dataset.columns.len())
        .header(20.0, |mut header| {
            for col in &dataset.columns {
                header.col(|ui| {
                    ui.strong(&col.name);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, n_rows, |mut row| {
                let i = row.index();
                for col in &dataset.columns {
                    row.col(|ui| {
                        ui.label(col.values[i].to_string());
                    });
                }
            });
        });
}
