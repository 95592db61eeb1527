use bevy_egui::egui;

use crate::form::{FieldRow, SensorCard};
use crate::ui::EditorAction;

/// Sensor cards (`nivel1`). Structural edits are only requested here; the
/// caller applies them after the frame.
pub fn render_sensors_section(
    ui: &mut egui::Ui,
    cards: &mut [SensorCard],
    actions: &mut Vec<EditorAction>,
) {
    ui.horizontal(|ui| {
        ui.heading(format!("Nós sensores ({})", cards.len()));
        if ui.button("+ Adicionar Nó Sensor").clicked() {
            actions.push(EditorAction::AddSensor);
        }
    });
    ui.add_space(4.0);

    for (index, card) in cards.iter_mut().enumerate() {
        // Indexed so that editing the ID text does not reset widget state
        ui.push_id(("sensor_card", index), |ui| {
            ui.group(|ui| {
                render_sensor_card(ui, card, actions);
            });
        });
        ui.add_space(6.0);
    }
}

fn render_sensor_card(ui: &mut egui::Ui, card: &mut SensorCard, actions: &mut Vec<EditorAction>) {
    ui.horizontal(|ui| {
        ui.label("ID:");
        ui.add(egui::TextEdit::singleline(&mut card.id_input).desired_width(80.0));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Excluir Nó Sensor").clicked() {
                actions.push(EditorAction::RemoveSensor(card.target_id()));
            }
        });
    });

    egui::Grid::new("sensor_meta")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            ui.label("Descrição:");
            ui.add(egui::TextEdit::singleline(&mut card.description).desired_width(260.0));
            ui.end_row();

            ui.label("Tipo de dados:");
            ui.add(egui::TextEdit::singleline(&mut card.data_type).desired_width(260.0));
            ui.end_row();
        });

    ui.add_space(4.0);
    ui.label("Mapeamento do pacote:");

    let mut removed = None;
    egui::Grid::new("packet_mapping")
        .num_columns(5)
        .striped(true)
        .spacing([8.0, 4.0])
        .show(ui, |ui| {
            ui.strong("Nome do Campo");
            ui.strong("Posição (Byte)");
            ui.strong("Tamanho (Bytes)");
            ui.strong("Escala (Divisor)");
            ui.strong("Ações");
            ui.end_row();

            for (i, row) in card.fields.iter_mut().enumerate() {
                if render_field_row(ui, row) {
                    removed = Some(i);
                }
                ui.end_row();
            }
        });

    if let Some(i) = removed {
        actions.push(EditorAction::RemoveField(card.target_id(), i));
    }

    if ui.button("+ Adicionar Campo (Sensor)").clicked() {
        actions.push(EditorAction::AddField(card.target_id()));
    }
}

/// Returns true when the row's remove button was clicked
fn render_field_row(ui: &mut egui::Ui, row: &mut FieldRow) -> bool {
    ui.add(egui::TextEdit::singleline(&mut row.field_name).desired_width(140.0));
    ui.add(egui::TextEdit::singleline(&mut row.byte_position).desired_width(60.0));
    ui.add(egui::TextEdit::singleline(&mut row.size_bytes).desired_width(60.0));
    ui.add(egui::TextEdit::singleline(&mut row.scale_divisor).desired_width(60.0));
    ui.button("X").on_hover_text("Remover campo").clicked()
}
