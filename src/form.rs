//! Form controls projected from a [`Configuration`].
//!
//! The view holds nothing but control text. It is rebuilt wholesale from
//! the model after every structural edit and read back by
//! [`crate::collect`]; it is never a second source of truth.

use crate::model::{Configuration, FieldMapping, LogFileSettings, PollingSettings, SensorId, SensorNode};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormView {
    pub polling: PollingForm,
    pub log_files: LogFilesForm,
    pub sensors: Vec<SensorCard>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollingForm {
    pub active: bool,
    pub read_interval_s: String,
    pub base_id: String,
    pub response_timeout_s: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogFilesForm {
    pub logs_directory: String,
    pub network_log_file: String,
    pub app_log_file: String,
}

/// One editable sensor. `rendered_id` is the key the card was built from;
/// `id_input` is whatever the operator has typed since.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorCard {
    pub rendered_id: SensorId,
    pub id_input: String,
    pub description: String,
    pub data_type: String,
    pub fields: Vec<FieldRow>,
}

impl SensorCard {
    /// Identifier a button on this card acts on: the typed text, or the
    /// rendered key when the control was cleared.
    pub fn target_id(&self) -> SensorId {
        SensorId::parse(&self.id_input).unwrap_or_else(|| self.rendered_id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldRow {
    pub field_name: String,
    pub byte_position: String,
    pub size_bytes: String,
    pub scale_divisor: String,
}

impl FormView {
    pub fn render(config: &Configuration) -> Self {
        let mut view = Self {
            polling: PollingForm::from(&config.nivel3),
            log_files: LogFilesForm::from(&config.nivel4),
            sensors: Vec::new(),
        };
        view.render_sensors(config);
        view
    }

    /// Points every card with a valid identifier at the key it was just
    /// collected under. Control text is left alone.
    pub fn rebind_sensor_keys(&mut self) {
        for card in &mut self.sensors {
            if let Some(id) = SensorId::parse(&card.id_input) {
                card.rendered_id = id;
            }
        }
    }

    /// Replaces every sensor card. Section controls are left alone.
    pub fn render_sensors(&mut self, config: &Configuration) {
        self.sensors = config
            .nivel1
            .iter()
            .map(|(id, sensor)| SensorCard::render(id, sensor))
            .collect();
    }
}

impl From<&PollingSettings> for PollingForm {
    fn from(settings: &PollingSettings) -> Self {
        Self {
            active: settings.active,
            read_interval_s: settings.read_interval_s.to_string(),
            base_id: settings.base_id.to_string(),
            response_timeout_s: settings.response_timeout_s.to_string(),
        }
    }
}

impl From<&LogFileSettings> for LogFilesForm {
    fn from(settings: &LogFileSettings) -> Self {
        Self {
            logs_directory: settings.logs_directory.clone(),
            network_log_file: settings.network_log_file.clone(),
            app_log_file: settings.app_log_file.clone(),
        }
    }
}

impl SensorCard {
    fn render(id: &SensorId, sensor: &SensorNode) -> Self {
        Self {
            rendered_id: id.clone(),
            id_input: id.to_string(),
            description: sensor.description.clone(),
            data_type: sensor.data_type.clone(),
            fields: sensor.packet_mapping.iter().map(FieldRow::from).collect(),
        }
    }
}

impl From<&FieldMapping> for FieldRow {
    fn from(field: &FieldMapping) -> Self {
        Self {
            field_name: field.field_name.clone(),
            byte_position: field.byte_position.to_string(),
            size_bytes: field.size_bytes.to_string(),
            scale_divisor: field.scale_divisor.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Configuration {
        serde_json::from_value(json!({
            "nivel1": {
                "2": {"descricao": "Porta", "tipo_dados": "Contato", "mapeamento_pacote": []},
                "1": {
                    "descricao": "Sala",
                    "tipo_dados": "Clima",
                    "mapeamento_pacote": [
                        {"campo": "temperatura", "posicao_byte": 16, "tamanho_bytes": 2, "escala": 10},
                        {"campo": "umidade", "posicao_byte": 18, "tamanho_bytes": 2, "escala": 1}
                    ]
                }
            },
            "nivel3": {"ativo": true, "intervalo_leitura_s": 15, "id_base": 3, "tempo_limite_resposta_s": 30},
            "nivel4": {"diretorio_logs": "logs", "nome_arquivo_rede": "rede.jsonl", "nome_arquivo_aplicacao": "app.jsonl"}
        }))
        .unwrap()
    }

    #[test]
    fn renders_one_card_per_sensor_in_key_order() {
        let view = FormView::render(&sample());

        assert_eq!(view.sensors.len(), 2);
        assert_eq!(view.sensors[0].id_input, "1");
        assert_eq!(view.sensors[1].id_input, "2");
        assert_eq!(view.sensors[0].fields.len(), 2);
        assert_eq!(
            view.sensors[0].fields[0],
            FieldRow {
                field_name: "temperatura".into(),
                byte_position: "16".into(),
                size_bytes: "2".into(),
                scale_divisor: "10".into(),
            }
        );
        assert!(view.polling.active);
        assert_eq!(view.polling.read_interval_s, "15");
        assert_eq!(view.log_files.app_log_file, "app.jsonl");
    }

    #[test]
    fn rendering_is_idempotent_and_replaces_prior_output() {
        let config = sample();
        let first = FormView::render(&config);
        let mut second = FormView::render(&config);
        assert_eq!(first, second);

        second.sensors[0].description = "stale edit".into();
        second.render_sensors(&config);
        assert_eq!(first, second);
    }

    #[test]
    fn target_id_falls_back_to_rendered_key() {
        let mut view = FormView::render(&sample());
        let card = &mut view.sensors[0];

        card.id_input = "7".into();
        assert_eq!(card.target_id(), SensorId::new("7"));
        card.id_input.clear();
        assert_eq!(card.target_id(), SensorId::new("1"));
    }
}
