//! Settings schema and loader
//!
//! Settings are stored as YAML under the user config directory
//! (e.g. `~/.config/faderlink/server.yaml`). Missing or malformed files fall
//! back to defaults so a bare install works without any configuration.

use faderlink_core::DEFAULT_PORT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Relay server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// TCP port to listen on. Port 0 binds an ephemeral port (useful in tests).
    pub port: u16,

    /// Accept-poll cadence in milliseconds; also bounds how quickly the
    /// listener observes shutdown.
    pub accept_poll_ms: u64,

    /// Delay between bind retries in milliseconds.
    pub retry_ms: u64,

    /// Periodically serialize the mirrored state to a YAML file so external
    /// tools can read it without a TCP connection.
    pub persist_state: bool,

    /// Override for the state file location. `None` uses the user data
    /// directory.
    pub state_file: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            accept_poll_ms: 100,
            retry_ms: 1000,
            persist_state: false,
            state_file: None,
        }
    }
}

/// Client connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Server hostname or address.
    pub host: String,

    /// Server TCP port.
    pub port: u16,

    /// Delay between reconnect attempts in milliseconds.
    pub retry_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            retry_ms: 1000,
        }
    }
}

/// Default server settings path: `<config dir>/faderlink/server.yaml`.
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("faderlink")
        .join("server.yaml")
}

/// Default state file path: `<data dir>/faderlink/state.yaml`.
pub fn default_state_file_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("faderlink")
        .join("state.yaml")
}

/// Load server settings, falling back to defaults when the file is missing or
/// malformed.
pub fn load_server_settings(path: &Path) -> ServerSettings {
    match try_load(path) {
        Ok(settings) => {
            log::info!("[settings] Loaded from {}", path.display());
            settings
        }
        Err(e) => {
            log::warn!(
                "[settings] Using defaults ({} could not be loaded: {})",
                path.display(),
                e
            );
            ServerSettings::default()
        }
    }
}

fn try_load(path: &Path) -> anyhow::Result<ServerSettings> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ServerSettings::default();
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.accept_poll_ms, 100);
        assert_eq!(settings.retry_ms, 1000);
        assert!(!settings.persist_state);
        assert!(settings.state_file.is_none());

        let client = ClientSettings::default();
        assert_eq!(client.host, "127.0.0.1");
        assert_eq!(client.port, DEFAULT_PORT);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let settings = load_server_settings(Path::new("/nonexistent/faderlink.yaml"));
        assert_eq!(settings.port, DEFAULT_PORT);
    }

    #[test]
    fn test_partial_yaml_fills_in_defaults() {
        let dir = std::env::temp_dir().join("faderlink-settings-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("server.yaml");
        std::fs::write(&path, "port: 12345\npersist_state: true\n").unwrap();

        let settings = load_server_settings(&path);
        assert_eq!(settings.port, 12345);
        assert!(settings.persist_state);
        assert_eq!(settings.retry_ms, 1000);

        std::fs::remove_file(&path).ok();
    }
}
