use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::coerce::{null_as_default, value_flag, value_int_or, value_text};
use crate::config::*;

/// Operator-assigned sensor key. Ordered numerically so `nivel1` iterates
/// 1, 2, 10 rather than 1, 10, 2.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SensorId(String);

impl SensorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Accepts a positive integer and keeps its canonical digits, so
    /// `"+3"` and `"03"` both become `"3"`. Anything else yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().parse::<u64>() {
            Ok(0) | Err(_) => None,
            Ok(n) => Some(Self(n.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Ord for SensorId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for SensorId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SensorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Serialize for SensorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

struct SensorIdVisitor;

impl Visitor<'_> for SensorIdVisitor {
    type Value = SensorId;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a positive integer sensor identifier")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<SensorId, E> {
        SensorId::parse(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<SensorId, E> {
        if v == 0 {
            return Err(E::invalid_value(de::Unexpected::Unsigned(v), &self));
        }
        Ok(SensorId::new(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<SensorId, E> {
        match u64::try_from(v) {
            Ok(v) => self.visit_u64(v),
            Err(_) => Err(E::invalid_value(de::Unexpected::Signed(v), &self)),
        }
    }
}

impl<'de> Deserialize<'de> for SensorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SensorIdVisitor)
    }
}

/// Full editable configuration. Sections the editor does not know about
/// are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nivel1: BTreeMap<SensorId, SensorNode>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nivel3: PollingSettings,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nivel4: LogFileSettings,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Configuration {
    /// `(id, label)` pairs for sensor selectors.
    pub fn sensor_directory(&self) -> Vec<(SensorId, String)> {
        self.nivel1
            .iter()
            .map(|(id, sensor)| {
                let label = if sensor.description.is_empty() {
                    format!("Nó Sensor ID {id}")
                } else {
                    sensor.description.clone()
                };
                (id.clone(), label)
            })
            .collect()
    }
}

/// Polling and timing parameters (`nivel3`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPollingSettings")]
pub struct PollingSettings {
    #[serde(rename = "ativo")]
    pub active: bool,
    #[serde(rename = "intervalo_leitura_s")]
    pub read_interval_s: i64,
    #[serde(rename = "id_base")]
    pub base_id: i64,
    #[serde(rename = "tempo_limite_resposta_s")]
    pub response_timeout_s: i64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            active: false,
            read_interval_s: DEFAULT_READ_INTERVAL_S,
            base_id: DEFAULT_BASE_ID,
            response_timeout_s: DEFAULT_RESPONSE_TIMEOUT_S,
        }
    }
}

#[derive(Deserialize)]
struct RawPollingSettings {
    #[serde(default)]
    ativo: Value,
    #[serde(default)]
    intervalo_leitura_s: Value,
    #[serde(default)]
    id_base: Value,
    #[serde(default)]
    tempo_limite_resposta_s: Value,
}

impl From<RawPollingSettings> for PollingSettings {
    fn from(raw: RawPollingSettings) -> Self {
        Self {
            active: value_flag(&raw.ativo),
            read_interval_s: value_int_or(&raw.intervalo_leitura_s, DEFAULT_READ_INTERVAL_S),
            base_id: value_int_or(&raw.id_base, DEFAULT_BASE_ID),
            response_timeout_s: value_int_or(
                &raw.tempo_limite_resposta_s,
                DEFAULT_RESPONSE_TIMEOUT_S,
            ),
        }
    }
}

/// Log file locations (`nivel4`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawLogFileSettings")]
pub struct LogFileSettings {
    #[serde(rename = "diretorio_logs")]
    pub logs_directory: String,
    #[serde(rename = "nome_arquivo_rede")]
    pub network_log_file: String,
    #[serde(rename = "nome_arquivo_aplicacao")]
    pub app_log_file: String,
}

#[derive(Deserialize)]
struct RawLogFileSettings {
    #[serde(default)]
    diretorio_logs: Value,
    #[serde(default)]
    nome_arquivo_rede: Value,
    #[serde(default)]
    nome_arquivo_aplicacao: Value,
}

impl From<RawLogFileSettings> for LogFileSettings {
    fn from(raw: RawLogFileSettings) -> Self {
        Self {
            logs_directory: value_text(&raw.diretorio_logs),
            network_log_file: value_text(&raw.nome_arquivo_rede),
            app_log_file: value_text(&raw.nome_arquivo_aplicacao),
        }
    }
}

/// One physical sensor unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawSensorNode")]
pub struct SensorNode {
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "tipo_dados")]
    pub data_type: String,
    #[serde(rename = "mapeamento_pacote")]
    pub packet_mapping: Vec<FieldMapping>,
    /// Opaque passthrough bag. Never shown, never inspected.
    #[serde(rename = "log_headers", skip_serializing_if = "Option::is_none")]
    pub log_headers: Option<Value>,
}

impl SensorNode {
    /// Node inserted by the "add sensor" action.
    pub fn placeholder() -> Self {
        Self {
            description: NEW_SENSOR_DESCRIPTION.to_string(),
            data_type: NEW_SENSOR_DATA_TYPE.to_string(),
            packet_mapping: vec![FieldMapping {
                field_name: NEW_SENSOR_FIELD_NAME.to_string(),
                byte_position: NEW_SENSOR_BYTE_POSITION,
                size_bytes: NEW_SENSOR_SIZE_BYTES,
                scale_divisor: DEFAULT_SCALE_DIVISOR,
            }],
            log_headers: None,
        }
    }
}

#[derive(Deserialize)]
struct RawSensorNode {
    #[serde(default)]
    descricao: Value,
    #[serde(default)]
    tipo_dados: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    mapeamento_pacote: Vec<FieldMapping>,
    #[serde(default)]
    log_headers: Option<Value>,
}

impl From<RawSensorNode> for SensorNode {
    fn from(raw: RawSensorNode) -> Self {
        Self {
            description: value_text(&raw.descricao),
            data_type: value_text(&raw.tipo_dados),
            packet_mapping: raw.mapeamento_pacote,
            log_headers: raw.log_headers,
        }
    }
}

/// Where one named value sits inside a raw sensor packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFieldMapping")]
pub struct FieldMapping {
    #[serde(rename = "campo")]
    pub field_name: String,
    #[serde(rename = "posicao_byte")]
    pub byte_position: i64,
    #[serde(rename = "tamanho_bytes")]
    pub size_bytes: i64,
    #[serde(rename = "escala")]
    pub scale_divisor: i64,
}

impl FieldMapping {
    /// Unnamed row appended by the "add field" action. Dropped by the next
    /// collect unless the operator names it.
    pub fn blank() -> Self {
        Self {
            field_name: String::new(),
            byte_position: DEFAULT_BYTE_POSITION,
            size_bytes: DEFAULT_SIZE_BYTES,
            scale_divisor: DEFAULT_SCALE_DIVISOR,
        }
    }
}

#[derive(Deserialize)]
struct RawFieldMapping {
    #[serde(default)]
    campo: Value,
    #[serde(default)]
    posicao_byte: Value,
    #[serde(default)]
    tamanho_bytes: Value,
    #[serde(default)]
    escala: Value,
}

impl From<RawFieldMapping> for FieldMapping {
    fn from(raw: RawFieldMapping) -> Self {
        Self {
            field_name: value_text(&raw.campo),
            byte_position: value_int_or(&raw.posicao_byte, DEFAULT_BYTE_POSITION),
            size_bytes: value_int_or(&raw.tamanho_bytes, DEFAULT_SIZE_BYTES),
            scale_divisor: value_int_or(&raw.escala, DEFAULT_SCALE_DIVISOR),
        }
    }
}
