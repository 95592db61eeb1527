pub mod panels;
pub mod windows;

use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};
use std::sync::Arc;

use crate::activity::ActivityLog;
use crate::app::AppState;
use crate::editor::ConfigEditor;
use crate::model::SensorId;
use crate::persistence::PersistentSettings;
use crate::save::{HttpSaveEndpoint, PersistenceClient};

/// Something the operator clicked. Gathered while drawing and applied
/// once the frame's widgets have released the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    AddSensor,
    RemoveSensor(SensorId),
    AddField(SensorId),
    RemoveField(SensorId, usize),
    Save,
    ApplyServerUrl,
    RefreshDashboard,
}

/// Main UI system that renders all the egui panels
pub fn ui_system(
    mut contexts: EguiContexts,
    mut editor: ResMut<ConfigEditor>,
    mut client: ResMut<PersistenceClient>,
    mut settings: ResMut<PersistentSettings>,
    mut state: ResMut<AppState>,
    mut log: ResMut<ActivityLog>,
) {
    let ctx = contexts.ctx_mut();
    let mut actions = Vec::new();
    let saving = client.is_saving();

    // Widgets write into the settings every frame; only real edits count.
    let settings_before = settings.clone();

    // Top Panel - Server and save controls
    egui::TopBottomPanel::top("top_panel")
        .frame(egui::Frame {
            inner_margin: egui::Margin::same(8.0),
            fill: ctx.style().visuals.window_fill(),
            ..Default::default()
        })
        .show(ctx, |ui| {
            panels::render_connection_panel(
                ui,
                &mut state,
                &client,
                settings.bypass_change_detection(),
                &mut actions,
            );
        });

    // Bottom Panel - Activity log
    egui::TopBottomPanel::bottom("log_panel")
        .resizable(true)
        .show(ctx, |ui| {
            panels::render_logs_section(ui, &state, &mut log);
        });

    // Central Panel - Configuration form
    egui::CentralPanel::default()
        .frame(egui::Frame {
            inner_margin: egui::Margin::same(8.0),
            fill: ctx.style().visuals.window_fill(),
            ..Default::default()
        })
        .show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    // Nothing is editable while a save is outstanding
                    ui.add_enabled_ui(!saving, |ui| {
                        render_form(ui, &mut editor, &mut actions);
                    });
                });
        });

    // Dashboard Window
    windows::render_dashboard_window(
        ctx,
        &mut state,
        editor.config(),
        settings.bypass_change_detection(),
        &mut actions,
    );

    if *settings.bypass_change_detection() != settings_before {
        settings.set_changed();
    }

    apply_actions(actions, &mut editor, &mut client, &settings, &mut state, &mut log);
}

/// Renders the three configuration sections
fn render_form(ui: &mut egui::Ui, editor: &mut ConfigEditor, actions: &mut Vec<EditorAction>) {
    let view = editor.view_mut();

    ui.group(|ui| {
        panels::render_polling_section(ui, &mut view.polling);
    });
    ui.add_space(8.0);

    ui.group(|ui| {
        panels::render_log_files_section(ui, &mut view.log_files);
    });
    ui.add_space(8.0);

    ui.group(|ui| {
        panels::render_sensors_section(ui, &mut view.sensors, actions);
    });
}

fn apply_actions(
    actions: Vec<EditorAction>,
    editor: &mut ConfigEditor,
    client: &mut PersistenceClient,
    settings: &PersistentSettings,
    state: &mut AppState,
    log: &mut ActivityLog,
) {
    for action in actions {
        match action {
            EditorAction::AddSensor => {
                let added = editor.add_sensor();
                if added.replaced_existing {
                    log.push_log(format!(
                        "Atenção: o ID {} já existia e o nó sensor foi substituído",
                        added.id
                    ));
                } else {
                    log.push_log(format!("Nó sensor {} adicionado", added.id));
                }
            }
            EditorAction::RemoveSensor(id) => {
                if editor.remove_sensor(&id) {
                    log.push_log(format!("Nó sensor {id} excluído"));
                }
            }
            EditorAction::AddField(id) => {
                if editor.add_field(&id) {
                    log.push_log(format!("Campo adicionado ao nó sensor {id}"));
                }
            }
            EditorAction::RemoveField(id, index) => {
                if editor.remove_field(&id, index) {
                    log.push_log(format!("Campo {} removido do nó sensor {id}", index + 1));
                }
            }
            EditorAction::Save => match client.start(editor) {
                Ok(()) => log.push_log("Salvando configuração..."),
                Err(e) => log.push_log(format!("Erro ao salvar: {e}")),
            },
            EditorAction::ApplyServerUrl => {
                client.set_endpoint(Arc::new(HttpSaveEndpoint::new(&settings.server_url)));
                log.push_log(format!("Servidor: {}", settings.server_url));
                state.dashboard.refresh(&settings.server_url);
            }
            EditorAction::RefreshDashboard => {
                state.dashboard.refresh(&settings.server_url);
            }
        }
    }
}
