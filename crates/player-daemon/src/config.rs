// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Configuration loading for the daemon (§6.6).

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("no config directory found for this platform")]
    NoConfigDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplayGainMode {
    Off,
    Track,
    Album,
    Auto,
}

impl Default for ReplayGainMode {
    fn default() -> Self {
        ReplayGainMode::Off
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioOutputConfig {
    #[serde(rename = "type")]
    pub plugin_type: String,
    pub name: String,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub always_on: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    pub plugin: String,
    #[serde(default)]
    pub enabled: bool,
}

/// Mirrors the §6.6 config keys. Missing fields fall back to the documented
/// spec defaults via `#[serde(default = ...)]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_audio_buffer_size")]
    pub audio_buffer_size: u32,
    #[serde(default)]
    pub buffered_before_play: u8,
    #[serde(default = "default_max_output_buffer_size")]
    pub max_output_buffer_size: u32,
    #[serde(default = "default_max_command_list_size")]
    pub max_command_list_size: u32,
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
    #[serde(default)]
    pub replaygain: ReplayGainMode,
    #[serde(default)]
    pub replaygain_preamp: f32,
    #[serde(default)]
    pub replaygain_missing_preamp: f32,
    #[serde(default = "default_true")]
    pub replaygain_limit: bool,
    #[serde(default = "default_crossfade_seconds")]
    pub crossfade_seconds: f32,
    #[serde(default)]
    pub audio_output: Vec<AudioOutputConfig>,
    #[serde(default)]
    pub decoder: Vec<DecoderConfig>,
}

fn default_audio_buffer_size() -> u32 {
    4096
}

fn default_max_output_buffer_size() -> u32 {
    8192
}

fn default_max_command_list_size() -> u32 {
    2048
}

fn default_connection_timeout() -> u64 {
    60
}

fn default_crossfade_seconds() -> f32 {
    0.0
}

fn default_true() -> bool {
    true
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            audio_buffer_size: default_audio_buffer_size(),
            buffered_before_play: 0,
            max_output_buffer_size: default_max_output_buffer_size(),
            max_command_list_size: default_max_command_list_size(),
            connection_timeout: default_connection_timeout(),
            replaygain: ReplayGainMode::default(),
            replaygain_preamp: 0.0,
            replaygain_missing_preamp: 0.0,
            replaygain_limit: true,
            crossfade_seconds: default_crossfade_seconds(),
            audio_output: Vec::new(),
            decoder: Vec::new(),
        }
    }
}

impl PlayerConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }
}

/// Resolves the config file location and loads it, falling back to
/// documented defaults when the file is absent.
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = directories::ProjectDirs::from("invalid", "player-core", "player")
            .map(|d| d.config_dir().to_path_buf())
            .ok_or(ConfigError::NoConfigDir)?;
        fs::create_dir_all(&config_dir)?;
        debug!(?config_dir, "config directory resolved");
        Ok(Self { config_dir })
    }

    fn config_path(&self) -> PathBuf {
        self.config_dir.join("player.toml")
    }

    pub fn load(&self) -> Result<PlayerConfig, ConfigError> {
        let path = self.config_path();
        if !path.exists() {
            debug!("no config file found, using defaults");
            return Ok(PlayerConfig::default());
        }
        let content = fs::read_to_string(&path)?;
        let config = PlayerConfig::from_toml(&content)?;
        info!(?path, "loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_spec_defaults() {
        let config = PlayerConfig::from_toml("").unwrap();
        assert_eq!(config.audio_buffer_size, 4096);
        assert_eq!(config.max_output_buffer_size, 8192);
        assert_eq!(config.max_command_list_size, 2048);
        assert_eq!(config.connection_timeout, 60);
        assert!(config.replaygain_limit);
        assert_eq!(config.replaygain, ReplayGainMode::Off);
    }

    #[test]
    fn parses_audio_output_blocks() {
        let toml = r#"
            audio_buffer_size = 8192
            [[audio_output]]
            type = "wave"
            name = "recorder"
            device = "/tmp/out.wav"
        "#;
        let config = PlayerConfig::from_toml(toml).unwrap();
        assert_eq!(config.audio_buffer_size, 8192);
        assert_eq!(config.audio_output.len(), 1);
        assert_eq!(config.audio_output[0].plugin_type, "wave");
    }
}
