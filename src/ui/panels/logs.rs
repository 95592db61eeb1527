use bevy_egui::egui;

use crate::activity::ActivityLog;
use crate::app::AppState;

/// Renders the activity log section
pub fn render_logs_section(ui: &mut egui::Ui, state: &AppState, log: &mut ActivityLog) {
    ui.vertical(|ui| {
        ui.horizontal(|ui| {
            ui.label(format!("Atividade ({} mensagens)", log.logs.len()));
            if ui.button("limpar").clicked() {
                log.clear_logs();
            }
        });

        egui::ScrollArea::vertical()
            .max_height(160.0)
            .id_salt("activity_log")
            .auto_shrink([false; 2])
            .stick_to_bottom(state.auto_scroll_logs)
            .show(ui, |ui| {
                for entry in log.logs.iter() {
                    ui.horizontal(|ui| {
                        ui.label(format!("[{}]", entry.clock_time.format("%H:%M:%S%.3f")));
                        ui.label(&entry.message);
                    });
                }
            });
    });
}
