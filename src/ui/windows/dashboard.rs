use bevy_egui::egui;
use egui::Color32;

use crate::app::AppState;
use crate::dashboard::{DashboardSource, NO_VALUE_TEXT};
use crate::model::{Configuration, SensorId};
use crate::persistence::PersistentSettings;
use crate::ui::EditorAction;
use crate::ui::panels;

/// Renders the read-only dashboard window
pub fn render_dashboard_window(
    ctx: &egui::Context,
    state: &mut AppState,
    config: &Configuration,
    settings: &mut PersistentSettings,
    actions: &mut Vec<EditorAction>,
) {
    let mut show_dashboard = state.show_dashboard;

    if show_dashboard {
        egui::Window::new("Dashboard")
            .open(&mut show_dashboard)
            .resizable(true)
            .default_width(640.0)
            .show(ctx, |ui| {
                render_source_selection(ui, state, settings, actions);
                ui.separator();

                render_sensor_selection(ui, state, config, actions);
                ui.separator();

                if let Some(error) = state.dashboard.error() {
                    ui.colored_label(Color32::from_rgb(220, 80, 80), error);
                } else if let Some(data) = state.dashboard.data() {
                    panels::render_dashboard_plot(ui, data);
                } else {
                    ui.label(NO_VALUE_TEXT);
                }

                ui.add_space(8.0);
                ui.label("Últimos valores:");
                panels::render_latest_values(ui, state.dashboard.data());
            });

        state.show_dashboard = show_dashboard;
    }
}

fn render_source_selection(
    ui: &mut egui::Ui,
    state: &mut AppState,
    settings: &mut PersistentSettings,
    actions: &mut Vec<EditorAction>,
) {
    ui.horizontal(|ui| {
        ui.label("Fonte:");
        let previous = state.dashboard.source;
        for source in [DashboardSource::Application, DashboardSource::Network] {
            ui.selectable_value(&mut state.dashboard.source, source, source.label());
        }
        if state.dashboard.source != previous {
            settings.dashboard_source = state.dashboard.source;
            actions.push(EditorAction::RefreshDashboard);
        }
    });
}

fn render_sensor_selection(
    ui: &mut egui::Ui,
    state: &mut AppState,
    config: &Configuration,
    actions: &mut Vec<EditorAction>,
) {
    let directory = config.sensor_directory();

    // A sensor deleted from the editor is no longer selectable
    if let Some(selected) = &state.dashboard.selected
        && !directory.iter().any(|(id, _)| id == selected)
    {
        state.dashboard.selected = None;
        actions.push(EditorAction::RefreshDashboard);
    }

    let selected_text = state
        .dashboard
        .selected
        .as_ref()
        .and_then(|selected| directory.iter().find(|(id, _)| id == selected))
        .map(|(id, label)| format!("{id} - {label}"))
        .unwrap_or_else(|| "Selecione um sensor".to_string());

    let previous: Option<SensorId> = state.dashboard.selected.clone();
    ui.horizontal(|ui| {
        ui.label("Nó sensor:");
        egui::ComboBox::from_id_salt("dashboard_sensor_select")
            .selected_text(selected_text)
            .width(240.0)
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut state.dashboard.selected, None, "Selecione um sensor");
                for (id, label) in &directory {
                    ui.selectable_value(
                        &mut state.dashboard.selected,
                        Some(id.clone()),
                        format!("{id} - {label}"),
                    );
                }
            });
        if ui.button("Atualizar").clicked() {
            actions.push(EditorAction::RefreshDashboard);
        }
    });

    if state.dashboard.selected != previous {
        actions.push(EditorAction::RefreshDashboard);
    }
}
