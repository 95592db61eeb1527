use serde_json::{Map, Value, json};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::model::{Configuration, SensorId};

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Couldn't read snapshot file: {source}")]
    FileError {
        #[from]
        source: io::Error,
    },
    #[error("Failed to parse JSON snapshot: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },
    #[error("Failed to parse YAML snapshot: {source}")]
    YamlError {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Snapshot root is not a mapping.")]
    NotAMapping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Yaml,
}

impl SnapshotFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Reads the configuration snapshot at `path`. A missing file is not an
/// error: the example configuration is returned instead.
pub fn load_snapshot(path: &Path) -> Result<Configuration, SnapshotError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no snapshot file, using example configuration");
            return Ok(example_configuration());
        }
        Err(e) => return Err(e.into()),
    };

    let config = parse_snapshot(&contents, SnapshotFormat::from_path(path))?;
    info!(path = %path.display(), sensors = config.nivel1.len(), "loaded snapshot");
    Ok(config)
}

pub fn parse_snapshot(contents: &str, format: SnapshotFormat) -> Result<Configuration, SnapshotError> {
    let mut value = match format {
        SnapshotFormat::Json => serde_json::from_str::<Value>(contents)?,
        SnapshotFormat::Yaml => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(contents)?;
            serde_json::to_value(yaml)?
        }
    };

    if value.is_null() {
        return Ok(example_configuration());
    }
    let root = value.as_object_mut().ok_or(SnapshotError::NotAMapping)?;
    normalize_sensor_keys(root);
    fill_missing_descriptions(root);

    Ok(serde_json::from_value(value)?)
}

/// Rewrites `nivel1` keys in canonical form. Sensors whose key is not a
/// positive integer are dropped here rather than failing the whole load.
fn normalize_sensor_keys(root: &mut Map<String, Value>) {
    let Some(sensors) = root.get_mut("nivel1").and_then(Value::as_object_mut) else {
        return;
    };

    let mut normalized = Map::new();
    for (key, sensor) in std::mem::take(sensors) {
        match SensorId::parse(&key) {
            Some(id) => {
                if normalized.insert(id.to_string(), sensor).is_some() {
                    warn!(%key, "duplicate sensor identifier in snapshot, later entry wins");
                }
            }
            None => warn!(%key, "dropping sensor with invalid identifier from snapshot"),
        }
    }
    *sensors = normalized;
}

/// Older snapshots predate `descricao`; label those sensors by data type
/// or by identifier.
fn fill_missing_descriptions(root: &mut Map<String, Value>) {
    let Some(sensors) = root.get_mut("nivel1").and_then(Value::as_object_mut) else {
        return;
    };

    for (id, sensor) in sensors.iter_mut() {
        let Some(sensor) = sensor.as_object_mut() else {
            continue;
        };
        if sensor.contains_key("descricao") {
            continue;
        }
        let label = match sensor.get("tipo_dados").and_then(Value::as_str) {
            Some(data_type) if !data_type.is_empty() => data_type.to_string(),
            _ => format!("Nó Sensor ID {id}"),
        };
        sensor.insert("descricao".to_string(), Value::String(label));
    }
}

/// Configuration used when no snapshot is available.
pub fn example_configuration() -> Configuration {
    let value = json!({
        "nivel3": {
            "ativo": true,
            "intervalo_leitura_s": 10,
            "id_base": 0,
            "tempo_limite_resposta_s": 20
        },
        "nivel4": {
            "diretorio_logs": "Nivel4/Tempo_Real",
            "nome_arquivo_rede": "dados_brutos_rede.jsonl",
            "nome_arquivo_aplicacao": "dados_brutos_aplicacao.jsonl"
        },
        "nivel1": {
            "1": {
                "descricao": "Sensor de Exemplo (Clima)",
                "tipo_dados": "Clima",
                "log_headers": ["Data e Hora", "Contador", "Temperatura (C)", "Umidade (%)"],
                "mapeamento_pacote": [
                    {"campo": "temperatura", "posicao_byte": 16, "tamanho_bytes": 2, "escala": 10}
                ]
            }
        }
    });
    serde_json::from_value(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn example_configuration_is_complete() {
        let config = example_configuration();
        let sensor = &config.nivel1[&SensorId::new("1")];
        assert_eq!(sensor.data_type, "Clima");
        assert!(sensor.log_headers.is_some());
        assert_eq!(sensor.packet_mapping[0].scale_divisor, 10);
        assert!(config.nivel3.active);
    }

    #[test]
    fn missing_file_yields_example_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_snapshot(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, example_configuration());
    }

    #[test]
    fn loads_yaml_with_integer_keys() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            "nivel1:\n  2:\n    tipo_dados: Luminosidade\n    mapeamento_pacote:\n    - campo: lux\n      posicao_byte: 16\n      tamanho_bytes: 2\n      escala: 1\n"
        )
        .unwrap();

        let config = load_snapshot(file.path()).unwrap();
        let sensor = &config.nivel1[&SensorId::new("2")];
        assert_eq!(sensor.description, "Luminosidade");
        assert_eq!(sensor.packet_mapping[0].field_name, "lux");
    }

    #[test]
    fn loads_json_and_labels_undescribed_sensors() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"nivel1": {{"5": {{}}, "6": {{"descricao": ""}}}}}}"#).unwrap();

        let config = load_snapshot(file.path()).unwrap();
        assert_eq!(config.nivel1[&SensorId::new("5")].description, "Nó Sensor ID 5");
        assert_eq!(config.nivel1[&SensorId::new("6")].description, "");
    }

    #[test]
    fn invalid_sensor_keys_are_dropped_and_others_normalized() {
        let config = parse_snapshot(
            r#"{"nivel1": {"abc": {"descricao": "x"}, "0": {}, "+7": {"descricao": "sete"}}}"#,
            SnapshotFormat::Json,
        )
        .unwrap();

        let keys: Vec<&str> = config.nivel1.keys().map(SensorId::as_str).collect();
        assert_eq!(keys, vec!["7"]);
        assert_eq!(config.nivel1[&SensorId::new("7")].description, "sete");
    }

    #[test]
    fn empty_yaml_yields_example_configuration() {
        let config = parse_snapshot("", SnapshotFormat::Yaml).unwrap();
        assert_eq!(config, example_configuration());
    }

    #[test]
    fn malformed_snapshots_are_errors() {
        assert!(matches!(
            parse_snapshot("{not json", SnapshotFormat::Json),
            Err(SnapshotError::JsonError { .. })
        ));
        assert!(matches!(
            parse_snapshot("[1, 2]", SnapshotFormat::Json),
            Err(SnapshotError::NotAMapping)
        ));
    }
}
