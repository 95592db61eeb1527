use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Mutex, mpsc};
use std::thread;
use thiserror::Error;
use tracing::{debug, warn};

use crate::coerce::value_text;
use crate::config::{NETWORK_DATA_PATH, SENSOR_DATA_PATH};
use crate::model::SensorId;

pub const LOAD_ERROR_TEXT: &str = "Erro ao carregar dados";
pub const NO_VALUE_TEXT: &str = "--";

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Erro na API: {0}")]
    Status(String),
    #[error("{0}")]
    Transport(String),
    #[error("resposta inválida: {0}")]
    MalformedResponse(String),
}

/// Which log the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DashboardSource {
    #[default]
    Application,
    Network,
}

impl DashboardSource {
    pub fn path(self) -> &'static str {
        match self {
            DashboardSource::Application => SENSOR_DATA_PATH,
            DashboardSource::Network => NETWORK_DATA_PATH,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DashboardSource::Application => "Dados de aplicação",
            DashboardSource::Network => "Rede (RSSI)",
        }
    }
}

/// Body of the dashboard query endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DashboardData {
    #[serde(default)]
    pub labels: Vec<Value>,
    #[serde(default)]
    pub datasets: Vec<Dataset>,
    #[serde(default)]
    pub ultimos_valores: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub data: Vec<Value>,
}

impl Dataset {
    /// Contiguous runs of numeric samples, x being the sample index.
    /// Null or non-numeric samples split the line.
    pub fn segments(&self) -> Vec<Vec<[f64; 2]>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();

        for (i, sample) in self.data.iter().enumerate() {
            match sample_value(sample) {
                Some(y) => current.push([i as f64, y]),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

impl DashboardData {
    pub fn y_axis_title(&self) -> String {
        if self.datasets.is_empty() {
            return "Valor".to_string();
        }
        self.datasets
            .iter()
            .map(|d| d.label.as_str())
            .collect::<Vec<_>>()
            .join(" / ")
    }

    /// `(humanized field name, value text)` for the latest values panel.
    pub fn latest_values(&self) -> Vec<(String, String)> {
        self.ultimos_valores
            .iter()
            .map(|(field, value)| (humanize_field_name(field), value_text(value)))
            .collect()
    }
}

fn sample_value(sample: &Value) -> Option<f64> {
    match sample {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `rssi_uplink_dbm` -> `Rssi Uplink (dBm)`.
pub fn humanize_field_name(field: &str) -> String {
    field
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            if word.eq_ignore_ascii_case("dbm") {
                return "(dBm)".to_string();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn fetch_dashboard(
    server_url: &str,
    source: DashboardSource,
    sensor: &SensorId,
) -> Result<DashboardData, DashboardError> {
    let url = format!("{}{}{}", server_url.trim_end_matches('/'), source.path(), sensor);
    debug!(%url, "querying dashboard");

    match ureq::get(&url).call() {
        Ok(response) => response
            .into_json::<DashboardData>()
            .map_err(|e| DashboardError::MalformedResponse(e.to_string())),
        Err(ureq::Error::Status(code, response)) => {
            let text = response.status_text().to_string();
            Err(DashboardError::Status(if text.is_empty() {
                code.to_string()
            } else {
                text
            }))
        }
        Err(ureq::Error::Transport(transport)) => Err(DashboardError::Transport(transport.to_string())),
    }
}

struct DashboardReply {
    seq: u64,
    result: Result<DashboardData, DashboardError>,
}

/// Read-only chart state. Re-queried whenever the selection or the source
/// changes; only the reply to the latest query is shown.
pub struct DashboardViewer {
    pub selected: Option<SensorId>,
    pub source: DashboardSource,
    data: Option<DashboardData>,
    error: Option<String>,
    sender: mpsc::Sender<DashboardReply>,
    receiver: Mutex<mpsc::Receiver<DashboardReply>>,
    latest_seq: u64,
}

impl DashboardViewer {
    pub fn new(source: DashboardSource) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            selected: None,
            source,
            data: None,
            error: None,
            sender,
            receiver: Mutex::new(receiver),
            latest_seq: 0,
        }
    }

    pub fn data(&self) -> Option<&DashboardData> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Starts a query for the current selection, or clears the chart when
    /// nothing is selected.
    pub fn refresh(&mut self, server_url: &str) {
        self.latest_seq += 1;
        let Some(sensor) = self.selected.clone() else {
            self.data = None;
            self.error = None;
            return;
        };

        let seq = self.latest_seq;
        let source = self.source;
        let server_url = server_url.to_string();
        let sender = self.sender.clone();
        thread::spawn(move || {
            let result = fetch_dashboard(&server_url, source, &sensor);
            let _ = sender.send(DashboardReply { seq, result });
        });
    }

    /// Applies finished queries and returns the error text of a failed
    /// one, if any. Never blocks.
    pub fn poll(&mut self) -> Option<String> {
        let replies: Vec<DashboardReply> = match self.receiver.lock() {
            Ok(receiver) => receiver.try_iter().collect(),
            Err(_) => return None,
        };
        replies.into_iter().filter_map(|reply| self.apply(reply)).last()
    }

    fn apply(&mut self, reply: DashboardReply) -> Option<String> {
        if reply.seq != self.latest_seq {
            debug!(seq = reply.seq, "dropping stale dashboard reply");
            return None;
        }
        match reply.result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
                None
            }
            Err(e) => {
                warn!(error = %e, "dashboard query failed");
                self.data = None;
                self.error = Some(LOAD_ERROR_TEXT.to_string());
                Some(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> DashboardData {
        serde_json::from_value(json!({
            "labels": ["10:00", "10:01", "10:02", "10:03"],
            "datasets": [
                {"label": "Temperatura", "data": [21.5, null, 22.0, "22.5"], "borderColor": "red"},
                {"label": "Umidade", "data": [40, 41, 42, 43]}
            ],
            "ultimos_valores": {"temperatura": 22.5, "rssi_uplink_dbm": -70, "umidade": "--"}
        }))
        .unwrap()
    }

    #[test]
    fn null_samples_split_the_line() {
        let data = sample();
        assert_eq!(
            data.datasets[0].segments(),
            vec![vec![[0.0, 21.5]], vec![[2.0, 22.0], [3.0, 22.5]]]
        );
        assert_eq!(data.datasets[1].segments().len(), 1);
    }

    #[test]
    fn y_axis_title_joins_dataset_labels() {
        assert_eq!(sample().y_axis_title(), "Temperatura / Umidade");
        assert_eq!(DashboardData::default().y_axis_title(), "Valor");
    }

    #[test]
    fn latest_values_are_humanized() {
        let values = sample().latest_values();
        assert!(values.contains(&("Rssi Uplink (dBm)".to_string(), "-70".to_string())));
        assert!(values.contains(&("Temperatura".to_string(), "22.5".to_string())));
        assert!(values.contains(&("Umidade".to_string(), "--".to_string())));
    }

    #[test]
    fn humanize_handles_plain_and_unit_names() {
        assert_eq!(humanize_field_name("rssi_downlink_dbm"), "Rssi Downlink (dBm)");
        assert_eq!(humanize_field_name("luminosidade"), "Luminosidade");
        assert_eq!(humanize_field_name(""), "");
    }

    #[test]
    fn failed_query_clears_chart_and_shows_error() {
        let mut viewer = DashboardViewer::new(DashboardSource::Application);
        viewer.latest_seq = 1;
        viewer.apply(DashboardReply {
            seq: 1,
            result: Ok(sample()),
        });
        assert!(viewer.data().is_some());

        viewer.latest_seq = 2;
        viewer.apply(DashboardReply {
            seq: 2,
            result: Err(DashboardError::Transport("connection refused".into())),
        });
        assert!(viewer.data().is_none());
        assert_eq!(viewer.error(), Some(LOAD_ERROR_TEXT));
    }

    #[test]
    fn stale_replies_are_ignored() {
        let mut viewer = DashboardViewer::new(DashboardSource::Network);
        viewer.latest_seq = 3;
        viewer.apply(DashboardReply {
            seq: 2,
            result: Ok(sample()),
        });
        assert!(viewer.data().is_none());
    }

    #[test]
    fn clearing_the_selection_clears_the_chart() {
        let mut viewer = DashboardViewer::new(DashboardSource::Application);
        viewer.latest_seq = 1;
        viewer.apply(DashboardReply {
            seq: 1,
            result: Ok(sample()),
        });

        viewer.selected = None;
        viewer.refresh("http://127.0.0.1:1");
        assert!(viewer.data().is_none());
        assert!(viewer.error().is_none());
    }
}
