use bevy_egui::egui;

use crate::form::PollingForm;

/// Polling settings (`nivel3`)
pub fn render_polling_section(ui: &mut egui::Ui, form: &mut PollingForm) {
    ui.heading("Coleta");
    ui.add_space(4.0);

    egui::Grid::new("polling_grid")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            ui.label("Ativo:");
            ui.checkbox(&mut form.active, "");
            ui.end_row();

            ui.label("Intervalo de leitura (s):");
            ui.add(egui::TextEdit::singleline(&mut form.read_interval_s).desired_width(80.0));
            ui.end_row();

            ui.label("ID base:");
            ui.add(egui::TextEdit::singleline(&mut form.base_id).desired_width(80.0));
            ui.end_row();

            ui.label("Tempo limite de resposta (s):");
            ui.add(egui::TextEdit::singleline(&mut form.response_timeout_s).desired_width(80.0));
            ui.end_row();
        });
}
