//! Configuration management for metronome defaults
//!
//! This module provides runtime configuration loading from JSON files so
//! click timbre and session defaults can be adjusted without recompiling.
//! The file is read once at startup and never written back.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub metronome: MetronomeConfig,
    #[serde(default)]
    pub click: ClickConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

/// Initial session values, clamped the same way as live setter calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetronomeConfig {
    pub tempo_bpm: u32,
    pub beats_per_measure: u32,
    pub volume: f32,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            tempo_bpm: 120,
            beats_per_measure: 4,
            volume: 0.5,
        }
    }
}

/// Click synthesis parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickConfig {
    /// Base pitch in Hz; accented beats sound at 1.5x this
    pub frequency_hz: f32,
    /// Length of one click in seconds
    pub duration_sec: f32,
    /// Render rate used when the output has no preferred rate
    pub sample_rate: u32,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 880.0,
            duration_sec: 0.1,
            sample_rate: 44_100,
        }
    }
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Capacity of the click queue feeding the audio thread
    pub queue_capacity: usize,
    /// Maximum number of clicks mixed at once; the oldest is evicted beyond this
    pub max_voices: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 32,
            max_voices: 16,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration. If the file doesn't exist or the JSON is
    /// invalid, a warning is logged and the defaults are returned.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default asset location
    pub fn load() -> Self {
        Self::load_from_file("assets/metronome_config.json")
    }
}
