//! Player configuration stored as JSON

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::playback::PlaybackSettings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Instrument module to host
    pub plugin_path: Option<PathBuf>,
    /// Destroy the instrument on stop and create a fresh one on every start
    pub reset_on_start: bool,
    pub sample_rate: u32,
    pub sample_bits: u16,
    pub block_time_ms: u32,
    pub divide_num: u32,
    /// Live output device name; the default device when unset
    pub output_device: Option<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        let playback = PlaybackSettings::default();
        Self {
            plugin_path: None,
            reset_on_start: false,
            sample_rate: playback.sample_rate,
            sample_bits: playback.sample_bits,
            block_time_ms: playback.block_time_ms,
            divide_num: playback.divide_num,
            output_device: None,
        }
    }
}

impl PlayerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Config file that sits next to an instrument module
    pub fn path_beside(plugin: &Path) -> PathBuf {
        let mut name = plugin.as_os_str().to_os_string();
        name.push(".json");
        PathBuf::from(name)
    }

    /// Read `<plugin>.json` if present, otherwise defaults. `plugin_path` is
    /// always set to `plugin`.
    pub fn beside_plugin(plugin: &Path) -> Result<Self, ConfigError> {
        let path = Self::path_beside(plugin);
        let mut config = if path.exists() {
            log::info!("Loading config from {}", path.display());
            Self::load(&path)?
        } else {
            Self::default()
        };
        config.plugin_path = Some(plugin.to_path_buf());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Session output settings. Zero block time or divisor falls back to
    /// the default.
    pub fn playback_settings(&self) -> PlaybackSettings {
        let defaults = PlaybackSettings::default();
        PlaybackSettings {
            sample_rate: self.sample_rate,
            sample_bits: self.sample_bits,
            block_time_ms: if self.block_time_ms == 0 {
                defaults.block_time_ms
            } else {
                self.block_time_ms
            },
            divide_num: if self.divide_num == 0 {
                defaults.divide_num
            } else {
                self.divide_num
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("smfsynth-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: PlayerConfig =
            serde_json::from_str(r#"{ "reset_on_start": true, "sample_bits": 24 }"#).unwrap();
        assert!(config.reset_on_start);
        assert_eq!(config.sample_bits, 24);
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.divide_num, 5);
        assert_eq!(config.plugin_path, None);
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("config.json");
        let config = PlayerConfig {
            output_device: Some("Speakers".to_string()),
            sample_rate: 48000,
            ..PlayerConfig::default()
        };
        config.save(&path).unwrap();
        let loaded = PlayerConfig::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_beside_plugin() {
        let plugin = temp_path("synth.clap");
        assert_eq!(
            PlayerConfig::path_beside(&plugin).file_name().unwrap(),
            format!("smfsynth-{}-synth.clap.json", std::process::id()).as_str()
        );

        // No file yet: defaults with the plugin path filled in
        let config = PlayerConfig::beside_plugin(&plugin).unwrap();
        assert_eq!(config.plugin_path.as_deref(), Some(plugin.as_path()));
        assert!(!config.reset_on_start);

        let json_path = PlayerConfig::path_beside(&plugin);
        fs::write(&json_path, r#"{ "reset_on_start": true }"#).unwrap();
        let config = PlayerConfig::beside_plugin(&plugin).unwrap();
        fs::remove_file(&json_path).unwrap();
        assert!(config.reset_on_start);
    }

    #[test]
    fn test_invalid_json() {
        let path = temp_path("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let result = PlayerConfig::load(&path);
        fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_zero_divide_falls_back() {
        let config = PlayerConfig {
            divide_num: 0,
            block_time_ms: 0,
            ..PlayerConfig::default()
        };
        let settings = config.playback_settings();
        assert_eq!(settings.divide_num, 5);
        assert_eq!(settings.block_time_ms, 50);
    }
}
