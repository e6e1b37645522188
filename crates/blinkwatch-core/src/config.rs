use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::eye_state::DEFAULT_EYE_OPEN_THRESHOLD;
use crate::liveness::DEFAULT_LIVENESS_GRACE_MILLIS;

/// Default idle time after which a track is dropped.
pub const DEFAULT_TRACK_IDLE_EVICTION_MILLIS: i64 = 30_000;
/// Default number of frames between automatic eviction sweeps.
pub const DEFAULT_EVICT_EVERY_FRAMES: u32 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Tuning for the blink tracker, loaded from TOML and/or environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Eye-open probabilities strictly above this count as open.
    pub eye_open_threshold: f32,
    /// How long a new track may go without blinking before it is flagged.
    pub liveness_grace_millis: i64,
    /// Tracks not observed for longer than this are evicted.
    pub track_idle_eviction_millis: i64,
    /// Run an eviction sweep every N processed frames (0 disables).
    pub evict_every_frames: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            eye_open_threshold: DEFAULT_EYE_OPEN_THRESHOLD,
            liveness_grace_millis: DEFAULT_LIVENESS_GRACE_MILLIS,
            track_idle_eviction_millis: DEFAULT_TRACK_IDLE_EVICTION_MILLIS,
            evict_every_frames: DEFAULT_EVICT_EVERY_FRAMES,
        }
    }
}

impl TrackerConfig {
    /// Defaults overridden by `BLINKWATCH_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Override fields from `BLINKWATCH_*` environment variables.
    /// Unset or unparsable variables leave the current value in place.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Override fields from `BLINKWATCH_*` variables resolved through `lookup`.
    pub fn with_overrides_from(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            eye_open_threshold: parse_or(
                &lookup,
                "BLINKWATCH_EYE_OPEN_THRESHOLD",
                self.eye_open_threshold,
            ),
            liveness_grace_millis: parse_or(
                &lookup,
                "BLINKWATCH_LIVENESS_GRACE_MS",
                self.liveness_grace_millis,
            ),
            track_idle_eviction_millis: parse_or(
                &lookup,
                "BLINKWATCH_TRACK_IDLE_MS",
                self.track_idle_eviction_millis,
            ),
            evict_every_frames: parse_or(
                &lookup,
                "BLINKWATCH_EVICT_EVERY_FRAMES",
                self.evict_every_frames,
            ),
        }
    }

    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.eye_open_threshold) {
            return Err(ConfigError::Invalid {
                field: "eye_open_threshold",
                reason: format!("{} is outside [0, 1]", self.eye_open_threshold),
            });
        }
        if self.liveness_grace_millis < 0 {
            return Err(ConfigError::Invalid {
                field: "liveness_grace_millis",
                reason: format!("{} is negative", self.liveness_grace_millis),
            });
        }
        if self.track_idle_eviction_millis <= 0 {
            return Err(ConfigError::Invalid {
                field: "track_idle_eviction_millis",
                reason: format!("{} must be positive", self.track_idle_eviction_millis),
            });
        }
        Ok(())
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    current: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(current)
}
