//! Application settings persisted between runs

use crate::core::history::{HistorySet, DEFAULT_CAPACITY};
use crate::core::transport::{SerialConfig, UdpConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Presentation preferences.
///
/// Colors and font size are passed through to the presentation layer
/// unchanged; only the history capacity is interpreted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupConfig {
    /// Color for sent records (opaque to the core)
    pub send_color: String,
    /// Color for received records (opaque to the core)
    pub recv_color: String,
    /// Log font size in points (opaque to the core)
    pub font_size: u32,
    /// Maximum entries per history list
    pub history_capacity: usize,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            send_color: "#0000cd".to_string(),
            recv_color: "#008000".to_string(),
            font_size: 10,
            history_capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Serial tab settings
    pub serial: SerialConfig,
    /// UDP tab settings
    pub udp: UdpConfig,
    /// Presentation preferences
    pub setup: SetupConfig,
    /// Saved input histories
    pub history: HistorySet,
}

impl AppConfig {
    /// Load config from the platform config directory.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = super::config_dir()
            .ok_or("Could not determine config directory")?
            .join("config.toml");
        Self::load_from(&config_path)
    }

    /// Load config from an explicit path, defaulting when absent.
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let mut config: Self = toml::from_str(&content)?;
            config
                .history
                .set_capacity(config.setup.history_capacity);
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the platform config directory.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let config_path = super::config_dir()
            .ok_or("Could not determine config directory")?
            .join("config.toml");
        self.save_to(&config_path)
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::history::HistoryKind;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.serial.port = "/dev/ttyUSB0".to_string();
        config.serial.baud_rate = 9600;
        config.udp.dest_ip = "10.0.0.2".to_string();
        config.history.add(HistoryKind::SendText, "[41 42]");
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.serial.port, "/dev/ttyUSB0");
        assert_eq!(loaded.serial.baud_rate, 9600);
        assert_eq!(loaded.udp.dest_ip, "10.0.0.2");
        assert_eq!(
            loaded.history.list(HistoryKind::SendText).items(),
            &["[41 42]"]
        );
    }

    #[test]
    fn test_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.setup.history_capacity, DEFAULT_CAPACITY);
    }
}
