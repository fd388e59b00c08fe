//! Match settings
//!
//! Loaded from a JSON file next to the binary. A missing or unreadable file
//! is not an error: the defaults are used and a warning is logged.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::Role;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
}

/// Match and network settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Match seed; `None` picks one from the clock
    pub seed: Option<u64>,
    /// Role played by the host (the client gets the other one)
    pub host_role: Role,

    // === Timing ===
    /// Simulation ticks per second
    pub physics_hz: f32,
    /// Host STATE_UPDATE rate
    pub broadcast_hz: f32,
    /// Client INPUT_UPDATE rate
    pub input_hz: f32,

    // === Latency ===
    /// Seconds between pings
    pub ping_interval: f64,
    /// Seconds of silence before the link counts as lagging
    pub lag_threshold: f64,

    /// Headless runner gives up after this many seconds of match time
    pub max_match_seconds: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: None,
            host_role: Role::Hunter,

            physics_hz: 60.0,
            broadcast_hz: 20.0,
            input_hz: 30.0,

            ping_interval: 1.0,
            lag_threshold: 3.0,

            max_match_seconds: 900.0,
        }
    }
}

impl Settings {
    /// Parse and validate settings JSON (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from `path`, falling back to defaults on any problem
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path)
            .map_err(SettingsError::from)
            .and_then(|json| Self::from_json(&json))
        {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings ({}: {})", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let rates = [
            ("physics_hz", self.physics_hz as f64),
            ("broadcast_hz", self.broadcast_hz as f64),
            ("input_hz", self.input_hz as f64),
            ("ping_interval", self.ping_interval),
            ("lag_threshold", self.lag_threshold),
            ("max_match_seconds", self.max_match_seconds as f64),
        ];
        for (field, value) in rates {
            if !(value > 0.0) {
                return Err(SettingsError::NotPositive { field, value });
            }
        }
        Ok(())
    }

    /// Fixed timestep in seconds
    pub fn physics_dt(&self) -> f32 {
        1.0 / self.physics_hz
    }

    pub fn broadcast_interval(&self) -> f32 {
        1.0 / self.broadcast_hz
    }

    pub fn input_interval(&self) -> f32 {
        1.0 / self.input_hz
    }

    /// The configured seed, or one derived from the system clock
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
        })
    }
}
