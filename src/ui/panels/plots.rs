use bevy_egui::egui;
use egui::Color32;
use egui_plot::{Legend, Line, Plot, PlotPoints};

use crate::coerce::value_text;
use crate::dashboard::{DashboardData, NO_VALUE_TEXT};

const SERIES_COLORS: [Color32; 6] = [
    Color32::from_rgb(255, 99, 132),
    Color32::from_rgb(54, 162, 235),
    Color32::from_rgb(255, 206, 86),
    Color32::from_rgb(75, 192, 192),
    Color32::from_rgb(153, 102, 255),
    Color32::from_rgb(255, 159, 64),
];

/// Time series chart, one line per dataset
pub fn render_dashboard_plot(ui: &mut egui::Ui, data: &DashboardData) {
    let available_width = ui.available_width();
    let plot_height = (ui.ctx().screen_rect().height() * 0.4).min(360.0);
    let labels = data.labels.clone();

    Plot::new("dashboard_plot")
        .legend(Legend::default())
        .height(plot_height)
        .width(available_width)
        .y_axis_label(data.y_axis_title())
        .x_axis_formatter(move |mark, _range| {
            let index = mark.value.round();
            if index < 0.0 || (mark.value - index).abs() > f64::EPSILON {
                return String::new();
            }
            labels
                .get(index as usize)
                .map(value_text)
                .unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            for (i, dataset) in data.datasets.iter().enumerate() {
                let color = SERIES_COLORS[i % SERIES_COLORS.len()];
                // Same name on every segment keeps one legend entry
                for segment in dataset.segments() {
                    plot_ui.line(
                        Line::new(PlotPoints::from(segment))
                            .name(&dataset.label)
                            .color(color),
                    );
                }
            }
        });
}

/// Latest value per field, or a placeholder when there is nothing to show
pub fn render_latest_values(ui: &mut egui::Ui, data: Option<&DashboardData>) {
    let values = data.map(DashboardData::latest_values).unwrap_or_default();
    if values.is_empty() {
        ui.label(NO_VALUE_TEXT);
        return;
    }

    egui::Grid::new("latest_values")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            for (name, value) in values {
                ui.label(format!("{name}:"));
                ui.strong(value);
                ui.end_row();
            }
        });
}
