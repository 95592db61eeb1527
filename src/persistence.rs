use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::DEFAULT_SERVER_URL;
use crate::dashboard::DashboardSource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
pub struct PersistentSettings {
    // Base URL of the configuration server
    #[serde(default = "default_server_url")]
    pub server_url: String,

    // Snapshot loaded at startup when no path is given on the command line
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    // Last dashboard source the operator picked
    #[serde(default)]
    pub dashboard_source: DashboardSource,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

impl Default for PersistentSettings {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            snapshot_path: None,
            dashboard_source: DashboardSource::default(),
        }
    }
}

impl PersistentSettings {
    /// Get the path to the settings file
    fn settings_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));

        let app_config_dir = config_dir.join("sensor_config_gui");

        // Create the directory if it doesn't exist
        let _ = fs::create_dir_all(&app_config_dir);

        app_config_dir.join("settings.json")
    }

    /// Load settings from disk, or use defaults if file doesn't exist
    pub fn load() -> Self {
        Self::load_from(&Self::settings_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings file: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("No settings file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        fs::write(path, json).map_err(|e| format!("Failed to write settings file: {}", e))
    }
}

/// System that automatically saves settings when they change
pub fn auto_save_system(settings: Res<PersistentSettings>) {
    if settings.is_changed()
        && !settings.is_added()
        && let Err(e) = settings.save()
    {
        error!("Failed to auto-save settings: {}", e);
    }
}
