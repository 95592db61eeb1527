use bevy_egui::egui;
use egui::Color32;

use crate::app::AppState;
use crate::persistence::PersistentSettings;
use crate::save::{PersistenceClient, StatusKind};
use crate::ui::EditorAction;

/// Renders the top panel with server, save and view controls
pub fn render_connection_panel(
    ui: &mut egui::Ui,
    state: &mut AppState,
    client: &PersistenceClient,
    settings: &mut PersistentSettings,
    actions: &mut Vec<EditorAction>,
) {
    ui.horizontal_wrapped(|ui| {
        ui.heading("Configuração da Rede de Sensores");
        ui.separator();

        ui.label("Servidor:");
        let response =
            ui.add(egui::TextEdit::singleline(&mut state.server_url_draft).desired_width(200.0));
        let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if (ui.button("Aplicar").clicked() || submitted)
            && state.server_url_draft.trim() != settings.server_url
        {
            settings.server_url = state.server_url_draft.trim().to_string();
            actions.push(EditorAction::ApplyServerUrl);
        }

        ui.separator();

        if ui
            .add_enabled(!client.is_saving(), egui::Button::new("Salvar configuração"))
            .clicked()
        {
            actions.push(EditorAction::Save);
        }

        if let Some(status) = client.status() {
            let color = match status.kind {
                StatusKind::Pending => Color32::from_rgb(200, 200, 100),
                StatusKind::Success => Color32::from_rgb(100, 200, 100),
                StatusKind::Failure => Color32::from_rgb(220, 80, 80),
            };
            ui.colored_label(color, &status.text);
        }

        ui.separator();
        ui.checkbox(&mut state.auto_scroll_logs, "Auto-scroll logs");

        ui.separator();
        if ui.button("Dashboard").clicked() {
            state.show_dashboard = !state.show_dashboard;
            if state.show_dashboard {
                actions.push(EditorAction::RefreshDashboard);
            }
        }
    });
}
