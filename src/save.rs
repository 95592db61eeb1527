use bevy::prelude::Resource;
use serde::Deserialize;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{SAVE_PATH, STATUS_CLEAR_SECS};
use crate::editor::ConfigEditor;
use crate::model::Configuration;

pub const STATUS_SAVING: &str = "Salvando...";
pub const STATUS_SAVED: &str = "Configuração salva com sucesso!";

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("{0}")]
    Rejected(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("{0}")]
    Transport(String),
    #[error("resposta inválida do servidor: {0}")]
    MalformedResponse(String),
    #[error("falha ao serializar a configuração: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("já existe um salvamento em andamento")]
    InFlight,
}

/// Body returned by the save endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SaveResponse {
    pub fn into_result(self) -> Result<(), SaveError> {
        if self.success {
            if let Some(message) = self.message {
                debug!(%message, "server accepted configuration");
            }
            Ok(())
        } else {
            Err(SaveError::Rejected(self.error.unwrap_or_default()))
        }
    }
}

pub fn interpret_response(body: &str) -> Result<(), SaveError> {
    serde_json::from_str::<SaveResponse>(body)
        .map_err(|e| SaveError::MalformedResponse(e.to_string()))?
        .into_result()
}

/// Where serialized configurations are submitted. Called from a worker
/// thread.
pub trait SaveEndpoint: Send + Sync {
    fn submit(&self, payload: &str) -> Result<(), SaveError>;
}

pub struct HttpSaveEndpoint {
    url: String,
}

impl HttpSaveEndpoint {
    pub fn new(server_url: &str) -> Self {
        Self {
            url: format!("{}{}", server_url.trim_end_matches('/'), SAVE_PATH),
        }
    }
}

impl SaveEndpoint for HttpSaveEndpoint {
    fn submit(&self, payload: &str) -> Result<(), SaveError> {
        debug!(url = %self.url, bytes = payload.len(), "posting configuration");
        let result = ureq::post(&self.url)
            .set("Content-Type", "application/json")
            .send_string(payload);

        match result {
            Ok(response) => {
                let body = response
                    .into_string()
                    .map_err(|e| SaveError::Transport(e.to_string()))?;
                interpret_response(&body)
            }
            // The server still explains itself on 4xx/5xx.
            Err(ureq::Error::Status(code, response)) => match response.into_json::<SaveResponse>() {
                Ok(SaveResponse {
                    error: Some(error), ..
                }) => Err(SaveError::Rejected(error)),
                _ => Err(SaveError::Status(code)),
            },
            Err(ureq::Error::Transport(transport)) => Err(SaveError::Transport(transport.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Pending,
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    shown_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Failed(String),
}

struct SaveReply {
    seq: u64,
    payload: String,
    result: Result<(), SaveError>,
}

/// Submits the collected model and applies the server's verdict.
///
/// Only one save may be outstanding. Each request carries a sequence
/// number and replies for anything but the outstanding one are dropped.
#[derive(Resource)]
pub struct PersistenceClient {
    endpoint: Arc<dyn SaveEndpoint>,
    sender: mpsc::Sender<SaveReply>,
    receiver: Mutex<mpsc::Receiver<SaveReply>>,
    next_seq: u64,
    in_flight: Option<u64>,
    status: Option<StatusMessage>,
}

impl PersistenceClient {
    pub fn new(endpoint: Arc<dyn SaveEndpoint>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            endpoint,
            sender,
            receiver: Mutex::new(receiver),
            next_seq: 0,
            in_flight: None,
            status: None,
        }
    }

    /// Takes effect for the next save; an outstanding one keeps its endpoint.
    pub fn set_endpoint(&mut self, endpoint: Arc<dyn SaveEndpoint>) {
        self.endpoint = endpoint;
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// Collects the editor and starts the request on a worker thread.
    pub fn start(&mut self, editor: &mut ConfigEditor) -> Result<(), SaveError> {
        if self.in_flight.is_some() {
            return Err(SaveError::InFlight);
        }

        let payload = match serde_json::to_string(editor.collect()) {
            Ok(payload) => payload,
            Err(e) => {
                let e = SaveError::from(e);
                self.show(format!("Erro ao salvar: {e}"), StatusKind::Failure);
                return Err(e);
            }
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        self.in_flight = Some(seq);
        self.show(STATUS_SAVING.to_string(), StatusKind::Pending);

        let endpoint = Arc::clone(&self.endpoint);
        let sender = self.sender.clone();
        thread::spawn(move || {
            let result = endpoint.submit(&payload);
            let _ = sender.send(SaveReply {
                seq,
                payload,
                result,
            });
        });

        info!(seq, "save started");
        Ok(())
    }

    /// Applies a finished request, if any. Never blocks.
    pub fn poll(&mut self, editor: &mut ConfigEditor) -> Option<SaveOutcome> {
        let reply = {
            let receiver = self.receiver.lock().ok()?;
            receiver.try_recv().ok()?
        };
        self.finish(reply, editor)
    }

    /// Clears the status line once it has been visible long enough.
    pub fn tick(&mut self, now: Instant) {
        let expired = self.status.as_ref().is_some_and(|status| {
            now.duration_since(status.shown_at) >= Duration::from_secs(STATUS_CLEAR_SECS)
        });
        if expired {
            self.status = None;
        }
    }

    fn finish(&mut self, reply: SaveReply, editor: &mut ConfigEditor) -> Option<SaveOutcome> {
        if self.in_flight != Some(reply.seq) {
            debug!(seq = reply.seq, "dropping stale save reply");
            return None;
        }
        self.in_flight = None;

        // A fresh parse of what was sent becomes the canonical model.
        let accepted = reply.result.and_then(|()| {
            serde_json::from_str::<Configuration>(&reply.payload).map_err(SaveError::from)
        });

        match accepted {
            Ok(config) => {
                info!(seq = reply.seq, "configuration saved");
                editor.replace(config);
                self.show(STATUS_SAVED.to_string(), StatusKind::Success);
                Some(SaveOutcome::Saved)
            }
            Err(e) => {
                warn!(seq = reply.seq, error = %e, "save failed");
                let text = format!("Erro ao salvar: {e}");
                self.show(text.clone(), StatusKind::Failure);
                Some(SaveOutcome::Failed(text))
            }
        }
    }

    fn show(&mut self, text: String, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text,
            kind,
            shown_at: Instant::now(),
        });
    }

    #[cfg(test)]
    fn wait(&mut self, editor: &mut ConfigEditor) -> Option<SaveOutcome> {
        let reply = {
            let receiver = self.receiver.lock().ok()?;
            receiver.recv_timeout(Duration::from_secs(5)).ok()?
        };
        self.finish(reply, editor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SensorId;
    use serde_json::json;

    /// Answers every submission with a canned response body.
    struct CannedEndpoint {
        body: &'static str,
        received: Mutex<Vec<String>>,
    }

    impl CannedEndpoint {
        fn new(body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                body,
                received: Mutex::new(Vec::new()),
            })
        }
    }

    impl SaveEndpoint for CannedEndpoint {
        fn submit(&self, payload: &str) -> Result<(), SaveError> {
            self.received.lock().unwrap().push(payload.to_string());
            interpret_response(self.body)
        }
    }

    /// Blocks until the test releases it.
    struct GatedEndpoint {
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl SaveEndpoint for GatedEndpoint {
        fn submit(&self, _payload: &str) -> Result<(), SaveError> {
            let _ = self.gate.lock().unwrap().recv();
            Ok(())
        }
    }

    fn editor() -> ConfigEditor {
        ConfigEditor::new(
            serde_json::from_value(json!({
                "nivel1": {"1": {"descricao": "Sala", "tipo_dados": "Clima", "log_headers": ["a"],
                    "mapeamento_pacote": [{"campo": "t", "posicao_byte": 16, "tamanho_bytes": 2, "escala": 10}]}}
            }))
            .unwrap(),
        )
    }

    #[test]
    fn rejected_save_reports_error_and_keeps_model() {
        let endpoint = CannedEndpoint::new(r#"{"success": false, "error": "disk full"}"#);
        let mut client = PersistenceClient::new(endpoint.clone());
        let mut editor = editor();
        let before = editor.config().clone();

        client.start(&mut editor).unwrap();
        let outcome = client.wait(&mut editor);

        assert_eq!(outcome, Some(SaveOutcome::Failed("Erro ao salvar: disk full".into())));
        assert_eq!(client.status().unwrap().text, "Erro ao salvar: disk full");
        assert_eq!(client.status().unwrap().kind, StatusKind::Failure);
        assert_eq!(editor.config(), &before);
        assert!(!client.is_saving());
    }

    #[test]
    fn rename_and_edit_survive_a_failed_save_and_the_next_edit() {
        let endpoint = CannedEndpoint::new(r#"{"success": false, "error": "disk full"}"#);
        let mut client = PersistenceClient::new(endpoint.clone());
        let mut editor = editor();
        let renamed = SensorId::new("9");
        editor.view_mut().sensors[0].id_input = "9".into();
        editor.view_mut().sensors[0].description = "Sala de estar".into();

        client.start(&mut editor).unwrap();
        client.wait(&mut editor);
        assert_eq!(editor.config().nivel1[&renamed].log_headers, Some(json!(["a"])));

        editor.collect();
        assert!(editor.add_field(&renamed));

        let sensor = &editor.config().nivel1[&renamed];
        assert_eq!(sensor.log_headers, Some(json!(["a"])));
        assert_eq!(sensor.description, "Sala de estar");
        assert_eq!(sensor.packet_mapping.len(), 2);
        assert_eq!(editor.view().sensors[0].id_input, "9");
        assert!(!editor.config().nivel1.contains_key(&SensorId::new("1")));

        // A retry sends the same headers
        client.start(&mut editor).unwrap();
        client.wait(&mut editor);
        let sent = endpoint.received.lock().unwrap().last().cloned().unwrap();
        let sent: serde_json::Value = serde_json::from_str(&sent).unwrap();
        assert_eq!(sent["nivel1"]["9"]["log_headers"], json!(["a"]));
    }

    #[test]
    fn successful_save_installs_the_submitted_model() {
        let endpoint = CannedEndpoint::new(r#"{"success": true, "message": "ok"}"#);
        let mut client = PersistenceClient::new(endpoint.clone());
        let mut editor = editor();
        editor.view_mut().sensors[0].description = "Cozinha".into();

        client.start(&mut editor).unwrap();
        assert_eq!(client.status().unwrap().text, STATUS_SAVING);
        assert_eq!(client.wait(&mut editor), Some(SaveOutcome::Saved));

        let sensor = &editor.config().nivel1[&SensorId::new("1")];
        assert_eq!(sensor.description, "Cozinha");
        assert_eq!(sensor.log_headers, Some(json!(["a"])));
        assert_eq!(editor.view().sensors[0].description, "Cozinha");
        assert_eq!(client.status().unwrap().text, STATUS_SAVED);

        let sent: serde_json::Value =
            serde_json::from_str(&endpoint.received.lock().unwrap()[0]).unwrap();
        assert_eq!(sent["nivel1"]["1"]["descricao"], json!("Cozinha"));
        assert_eq!(sent["nivel3"]["tempo_limite_resposta_s"], json!(20));
    }

    #[test]
    fn malformed_response_is_a_failure() {
        let endpoint = CannedEndpoint::new("<html>oops</html>");
        let mut client = PersistenceClient::new(endpoint);
        let mut editor = editor();

        client.start(&mut editor).unwrap();
        match client.wait(&mut editor) {
            Some(SaveOutcome::Failed(text)) => assert!(text.starts_with("Erro ao salvar: ")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn second_save_is_refused_while_one_is_outstanding() {
        let (release, gate) = mpsc::channel();
        let mut client = PersistenceClient::new(Arc::new(GatedEndpoint {
            gate: Mutex::new(gate),
        }));
        let mut editor = editor();

        client.start(&mut editor).unwrap();
        assert!(client.is_saving());
        assert!(matches!(client.start(&mut editor), Err(SaveError::InFlight)));
        assert_eq!(client.poll(&mut editor), None);

        release.send(()).unwrap();
        assert_eq!(client.wait(&mut editor), Some(SaveOutcome::Saved));
        assert!(!client.is_saving());
    }

    #[test]
    fn stale_replies_are_dropped() {
        let mut client = PersistenceClient::new(CannedEndpoint::new("{}"));
        let mut editor = editor();
        let before = editor.config().clone();
        client.in_flight = Some(4);

        let stale = SaveReply {
            seq: 3,
            payload: "{}".into(),
            result: Ok(()),
        };
        assert_eq!(client.finish(stale, &mut editor), None);
        assert_eq!(editor.config(), &before);
        assert!(client.is_saving());
    }

    #[test]
    fn status_clears_after_three_seconds() {
        let mut client = PersistenceClient::new(CannedEndpoint::new("{}"));
        client.show("Erro ao salvar: x".into(), StatusKind::Failure);
        let shown_at = client.status().unwrap().shown_at;

        client.tick(shown_at + Duration::from_millis(2900));
        assert!(client.status().is_some());
        client.tick(shown_at + Duration::from_secs(3));
        assert!(client.status().is_none());
    }

    #[test]
    fn response_without_error_text_still_fails() {
        assert!(matches!(
            interpret_response(r#"{"success": false}"#),
            Err(SaveError::Rejected(msg)) if msg.is_empty()
        ));
        assert!(interpret_response(r#"{"success": true}"#).is_ok());
    }

    #[test]
    fn endpoint_url_joins_server_and_path() {
        let endpoint = HttpSaveEndpoint::new("http://localhost:5006/");
        assert_eq!(endpoint.url, "http://localhost:5006/api/salvar_config");
    }
}
