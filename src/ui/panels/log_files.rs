use bevy_egui::egui;

use crate::form::LogFilesForm;

/// Log file settings (`nivel4`)
pub fn render_log_files_section(ui: &mut egui::Ui, form: &mut LogFilesForm) {
    ui.heading("Arquivos de log");
    ui.add_space(4.0);

    egui::Grid::new("log_files_grid")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            ui.label("Diretório dos logs:");
            ui.add(egui::TextEdit::singleline(&mut form.logs_directory).desired_width(260.0));
            ui.end_row();

            ui.label("Arquivo da rede:");
            ui.add(egui::TextEdit::singleline(&mut form.network_log_file).desired_width(260.0));
            ui.end_row();

            ui.label("Arquivo da aplicação:");
            ui.add(egui::TextEdit::singleline(&mut form.app_log_file).desired_width(260.0));
            ui.end_row();
        });
}
