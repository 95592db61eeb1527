use bevy::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::activity::ActivityLog;
use crate::dashboard::DashboardViewer;
use crate::editor::ConfigEditor;
use crate::model::Configuration;
use crate::persistence::PersistentSettings;
use crate::save::{PersistenceClient, SaveOutcome};
use crate::snapshot::{example_configuration, load_snapshot};

/// UI-only state that is neither model nor settings.
#[derive(Resource)]
pub struct AppState {
    pub dashboard: DashboardViewer,
    pub server_url_draft: String,
    pub auto_scroll_logs: bool,
    pub show_dashboard: bool,
}

impl AppState {
    pub fn new(settings: &PersistentSettings) -> Self {
        Self {
            dashboard: DashboardViewer::new(settings.dashboard_source),
            server_url_draft: settings.server_url.clone(),
            auto_scroll_logs: true,
            show_dashboard: false,
        }
    }
}

/// Snapshot named on the command line, else the one remembered in the
/// settings, else the built-in example.
pub fn initial_configuration(settings: &PersistentSettings) -> Configuration {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| settings.snapshot_path.clone());

    let Some(path) = path else {
        info!("No snapshot configured, using example configuration");
        return example_configuration();
    };

    match load_snapshot(&path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load snapshot {:?}: {}", path, e);
            example_configuration()
        }
    }
}

pub fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// Applies finished saves and expires the status line.
pub fn save_poll_system(
    mut client: ResMut<PersistenceClient>,
    mut editor: ResMut<ConfigEditor>,
    mut log: ResMut<ActivityLog>,
) {
    match client.poll(&mut editor) {
        Some(SaveOutcome::Saved) => log.push_log("Configuração salva com sucesso"),
        Some(SaveOutcome::Failed(message)) => log.push_log(message),
        None => {}
    }
    client.tick(Instant::now());
}

pub fn dashboard_poll_system(mut state: ResMut<AppState>, mut log: ResMut<ActivityLog>) {
    if let Some(error) = state.dashboard.poll() {
        log.push_log(format!("Dashboard: {error}"));
    }
}
