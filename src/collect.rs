use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::coerce::int_or;
use crate::config::*;
use crate::form::{FieldRow, FormView, LogFilesForm, PollingForm, SensorCard};
use crate::model::{Configuration, FieldMapping, LogFileSettings, PollingSettings, SensorId, SensorNode};

/// Reads every control back into a fresh [`Configuration`].
///
/// `nivel1` is rebuilt from scratch, so a card with a blank identifier or
/// a sensor without a card is simply absent from the result. Passthrough
/// data (`log_headers`, unknown top-level sections) is taken from
/// `previous`.
pub fn collect(view: &FormView, previous: &Configuration) -> Configuration {
    let mut nivel1 = BTreeMap::new();

    for card in &view.sensors {
        let Some(id) = SensorId::parse(&card.id_input) else {
            if card.id_input.trim().is_empty() {
                debug!(rendered_id = %card.rendered_id, "dropping sensor with blank identifier");
            } else {
                warn!(
                    rendered_id = %card.rendered_id,
                    input = %card.id_input,
                    "dropping sensor with non-numeric identifier"
                );
            }
            continue;
        };

        let sensor = collect_sensor(card, &id, previous);
        if nivel1.insert(id.clone(), sensor).is_some() {
            warn!(%id, "duplicate sensor identifier, later card wins");
        }
    }

    Configuration {
        nivel1,
        nivel3: collect_polling(&view.polling),
        nivel4: collect_log_files(&view.log_files),
        extra: previous.extra.clone(),
    }
}

fn collect_sensor(card: &SensorCard, id: &SensorId, previous: &Configuration) -> SensorNode {
    // The card's own key first so a rename keeps its headers; the collected
    // key covers a model that was re-keyed without a re-render.
    let log_headers = previous
        .nivel1
        .get(&card.rendered_id)
        .or_else(|| previous.nivel1.get(id))
        .and_then(|sensor| sensor.log_headers.clone());

    SensorNode {
        description: card.description.clone(),
        data_type: card.data_type.clone(),
        packet_mapping: card.fields.iter().filter_map(collect_field).collect(),
        log_headers,
    }
}

fn collect_field(row: &FieldRow) -> Option<FieldMapping> {
    if row.field_name.trim().is_empty() {
        return None;
    }

    Some(FieldMapping {
        field_name: row.field_name.clone(),
        byte_position: int_or(&row.byte_position, DEFAULT_BYTE_POSITION),
        size_bytes: int_or(&row.size_bytes, DEFAULT_SIZE_BYTES),
        scale_divisor: int_or(&row.scale_divisor, DEFAULT_SCALE_DIVISOR),
    })
}

fn collect_polling(form: &PollingForm) -> PollingSettings {
    PollingSettings {
        active: form.active,
        read_interval_s: int_or(&form.read_interval_s, DEFAULT_READ_INTERVAL_S),
        base_id: int_or(&form.base_id, DEFAULT_BASE_ID),
        response_timeout_s: int_or(&form.response_timeout_s, DEFAULT_RESPONSE_TIMEOUT_S),
    }
}

fn collect_log_files(form: &LogFilesForm) -> LogFileSettings {
    LogFileSettings {
        logs_directory: form.logs_directory.clone(),
        network_log_file: form.network_log_file.clone(),
        app_log_file: form.app_log_file.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Configuration {
        serde_json::from_value(json!({
            "nivel1": {
                "1": {
                    "descricao": "Sala",
                    "tipo_dados": "Clima",
                    "mapeamento_pacote": [
                        {"campo": "temperatura", "posicao_byte": 16, "tamanho_bytes": 2, "escala": 10}
                    ]
                },
                "3": {
                    "descricao": "Porta",
                    "tipo_dados": "Contato",
                    "log_headers": {"x": 1},
                    "mapeamento_pacote": [
                        {"campo": "", "posicao_byte": 4},
                        {"campo": "aberta"}
                    ]
                }
            },
            "nivel3": {"ativo": true, "intervalo_leitura_s": 5, "id_base": 2},
            "nivel4": {"diretorio_logs": "logs"},
            "nivel5": {"porta": 8080}
        }))
        .unwrap()
    }

    #[test]
    fn render_then_collect_only_applies_defaults_and_drops_unnamed_fields() {
        let config = sample();
        let collected = collect(&FormView::render(&config), &config);

        let mut expected = config.clone();
        expected
            .nivel1
            .get_mut(&SensorId::new("3"))
            .unwrap()
            .packet_mapping
            .retain(|f| !f.field_name.is_empty());
        assert_eq!(collected, expected);
        assert_eq!(collected.nivel3.response_timeout_s, 20);
    }

    #[test]
    fn collecting_a_collected_model_is_a_fixed_point() {
        let config = sample();
        let once = collect(&FormView::render(&config), &config);
        let twice = collect(&FormView::render(&once), &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn log_headers_survive_a_description_edit() {
        let config = sample();
        let mut view = FormView::render(&config);
        view.sensors[1].description = "Porta dos fundos".into();

        let collected = collect(&view, &config);
        let sensor = &collected.nivel1[&SensorId::new("3")];
        assert_eq!(sensor.description, "Porta dos fundos");
        assert_eq!(sensor.log_headers, Some(json!({"x": 1})));
    }

    #[test]
    fn log_headers_follow_a_renamed_sensor() {
        let config = sample();
        let mut view = FormView::render(&config);
        view.sensors[1].id_input = "9".into();

        let collected = collect(&view, &config);
        assert!(!collected.nivel1.contains_key(&SensorId::new("3")));
        assert_eq!(
            collected.nivel1[&SensorId::new("9")].log_headers,
            Some(json!({"x": 1}))
        );
    }

    #[test]
    fn log_headers_are_found_by_collected_key_when_the_card_is_stale() {
        let config = sample();
        let mut view = FormView::render(&config);
        view.sensors[1].id_input = "9".into();
        let renamed = collect(&view, &config);

        // Same cards, still carrying the key "3", against the re-keyed model
        let again = collect(&view, &renamed);
        assert_eq!(again.nivel1[&SensorId::new("9")].log_headers, Some(json!({"x": 1})));
    }

    #[test]
    fn blank_identifier_drops_the_sensor() {
        let config = sample();
        let mut view = FormView::render(&config);
        view.sensors[0].id_input = "  ".into();

        let collected = collect(&view, &config);
        let keys: Vec<&str> = collected.nivel1.keys().map(SensorId::as_str).collect();
        assert_eq!(keys, vec!["3"]);
    }

    #[test]
    fn blank_numeric_controls_collect_to_defaults() {
        let config = sample();
        let mut view = FormView::render(&config);
        let row = &mut view.sensors[0].fields[0];
        row.size_bytes.clear();
        row.byte_position.clear();
        row.scale_divisor = "abc".into();
        view.polling.read_interval_s.clear();

        let collected = collect(&view, &config);
        let field = &collected.nivel1[&SensorId::new("1")].packet_mapping[0];
        assert_eq!(field.size_bytes, 1);
        assert_eq!(field.byte_position, 0);
        assert_eq!(field.scale_divisor, 1);
        assert_eq!(collected.nivel3.read_interval_s, 10);
    }

    #[test]
    fn unknown_sections_pass_through() {
        let config = sample();
        let collected = collect(&FormView::render(&config), &config);
        assert_eq!(collected.extra.get("nivel5"), Some(&json!({"porta": 8080})));
    }

    #[test]
    fn duplicate_identifiers_keep_the_later_card() {
        let config = sample();
        let mut view = FormView::render(&config);
        view.sensors[0].id_input = "3".into();

        let collected = collect(&view, &config);
        assert_eq!(collected.nivel1.len(), 1);
        assert_eq!(collected.nivel1[&SensorId::new("3")].description, "Porta");
    }
}
