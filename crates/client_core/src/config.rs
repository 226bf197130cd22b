use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use shared::domain::{DEFAULT_GRID_SIZE, MAX_GRID_SIZE};
use tracing::warn;

use crate::channel::{ChannelConfig, DEFAULT_CHANNEL_PATH, DEFAULT_CONNECT_TIMEOUT};

pub const DEFAULT_SETTINGS_FILE: &str = "simulation.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub channel_path: String,
    pub grid_size: usize,
    pub connect_timeout_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".into(),
            channel_path: DEFAULT_CHANNEL_PATH.into(),
            grid_size: DEFAULT_GRID_SIZE,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl ClientSettings {
    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            channel_path: self.channel_path.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
        }
    }

    pub fn set_grid_size(&mut self, grid_size: usize) {
        if !(1..=MAX_GRID_SIZE).contains(&grid_size) {
            warn!(
                grid_size,
                max = MAX_GRID_SIZE,
                "grid_size must be between 1 and the maximum; keeping {}",
                self.grid_size
            );
            return;
        }
        self.grid_size = grid_size;
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    channel_path: Option<String>,
    grid_size: Option<usize>,
    connect_timeout_ms: Option<u64>,
}

/// Defaults, then `simulation.toml` (or `path`), then environment overrides.
pub fn load_settings(path: Option<&Path>) -> ClientSettings {
    let mut settings = ClientSettings::default();
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file_settings(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file_settings(settings: &mut ClientSettings, raw: &str) {
    let file_cfg = match toml::from_str::<FileSettings>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            warn!(%err, "ignoring unparseable settings file");
            return;
        }
    };

    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.channel_path {
        settings.channel_path = v;
    }
    if let Some(v) = file_cfg.grid_size {
        settings.set_grid_size(v);
    }
    if let Some(v) = file_cfg.connect_timeout_ms {
        settings.connect_timeout_ms = v;
    }
}

fn apply_env_overrides(settings: &mut ClientSettings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("SIM_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = var("APP__CHANNEL_PATH") {
        settings.channel_path = v;
    }

    if let Some(v) = var("APP__GRID_SIZE") {
        match v.parse::<usize>() {
            Ok(parsed) => settings.set_grid_size(parsed),
            Err(err) => warn!(value = %v, %err, "ignoring APP__GRID_SIZE"),
        }
    }

    if let Some(v) = var("APP__CONNECT_TIMEOUT_MS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.connect_timeout_ms = parsed,
            Err(err) => warn!(value = %v, %err, "ignoring APP__CONNECT_TIMEOUT_MS"),
        }
    }
}
