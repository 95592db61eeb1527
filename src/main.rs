use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use std::sync::Arc;

mod activity;
mod app;
mod coerce;
mod collect;
mod config;
mod dashboard;
mod editor;
mod form;
mod model;
mod persistence;
mod save;
mod snapshot;
mod ui;

use activity::ActivityLog;
use app::{AppState, dashboard_poll_system, initial_configuration, save_poll_system, setup_camera};
use editor::ConfigEditor;
use persistence::{PersistentSettings, auto_save_system};
use save::{HttpSaveEndpoint, PersistenceClient};

fn main() -> AppExit {
    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Configuração da Rede de Sensores".to_string(),
            resolution: (1280.0, 860.0).into(),
            ..default()
        }),
        ..default()
    }))
    .add_plugins(EguiPlugin);

    // Loaded once the log plugin is up so startup problems reach the log
    let settings = PersistentSettings::load();
    let editor = ConfigEditor::new(initial_configuration(&settings));
    let client = PersistenceClient::new(Arc::new(HttpSaveEndpoint::new(&settings.server_url)));
    let state = AppState::new(&settings);

    let mut activity = ActivityLog::new();
    activity.push_log(format!(
        "{} nós sensores carregados; servidor {}",
        editor.config().nivel1.len(),
        settings.server_url
    ));

    app.insert_resource(settings)
        .insert_resource(editor)
        .insert_resource(client)
        .insert_resource(state)
        .insert_resource(activity)
        .add_systems(Startup, setup_camera)
        .add_systems(
            Update,
            (
                save_poll_system,
                ui::ui_system,
                dashboard_poll_system,
                auto_save_system,
            )
                .chain(),
        )
        .run()
}
