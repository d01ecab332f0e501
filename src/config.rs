use crate::analysis::scoring::{ScoringConfig, ScoringWeights};
use crate::defaults;
use crate::error::{FluentError, Result};
use crate::session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub analysis: AnalysisConfig,
    pub scoring: ScoringConfig,
    pub session: SessionSettings,
    pub storage: StorageConfig,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
    pub frame_samples: usize,
    pub silence_threshold: f32,
}

/// Pause segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub min_pause_secs: f64,
}

/// Session lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSettings {
    pub max_session_secs: u64,
    pub finalize_timeout_ms: u64,
    /// Read each prompt aloud before capture starts.
    pub speak_prompts: bool,
}

/// Where the profile and an optional custom question bank live
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct StorageConfig {
    pub profile_path: Option<PathBuf>,
    pub question_bank: Option<PathBuf>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
            frame_samples: defaults::FRAME_SAMPLES,
            silence_threshold: defaults::SILENCE_THRESHOLD,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_pause_secs: defaults::MIN_PAUSE_SECS,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_session_secs: defaults::MAX_SESSION_SECS,
            finalize_timeout_ms: defaults::FINALIZE_TIMEOUT_MS,
            speak_prompts: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FluentError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                FluentError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(FluentError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - FLUENTME_PROFILE → storage.profile_path
    /// - FLUENTME_AUDIO_DEVICE → audio.device
    /// - FLUENTME_SILENCE_THRESHOLD → audio.silence_threshold
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(profile) = std::env::var("FLUENTME_PROFILE")
            && !profile.is_empty()
        {
            self.storage.profile_path = Some(PathBuf::from(profile));
        }

        if let Ok(device) = std::env::var("FLUENTME_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        if let Ok(threshold) = std::env::var("FLUENTME_SILENCE_THRESHOLD")
            && !threshold.is_empty()
        {
            match threshold.parse::<f32>() {
                Ok(value) => self.audio.silence_threshold = value,
                Err(_) => tracing::warn!(
                    "ignoring FLUENTME_SILENCE_THRESHOLD={:?}: not a number",
                    threshold
                ),
            }
        }

        self
    }

    /// Reject values the analysis cannot work with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, message: &str| {
            Err(FluentError::ConfigInvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };

        if self.audio.sample_rate == 0 {
            return invalid("audio.sample_rate", "must be greater than 0");
        }
        if self.audio.frame_samples == 0 {
            return invalid("audio.frame_samples", "must be greater than 0");
        }
        if !(0.0..=1.0).contains(&self.audio.silence_threshold) {
            return invalid("audio.silence_threshold", "must be between 0.0 and 1.0");
        }
        if !self.analysis.min_pause_secs.is_finite() || self.analysis.min_pause_secs < 0.0 {
            return invalid("analysis.min_pause_secs", "must be a non-negative number");
        }
        if !self.scoring.ideal_wpm.is_finite() || self.scoring.ideal_wpm <= 0.0 {
            return invalid("scoring.ideal_wpm", "must be greater than 0");
        }
        if !self.scoring.wpm_tolerance.is_finite() || self.scoring.wpm_tolerance <= 0.0 {
            return invalid("scoring.wpm_tolerance", "must be greater than 0");
        }

        let ScoringWeights {
            wpm,
            stutter,
            pause,
            speaking,
        } = self.scoring.weights;
        if [wpm, stutter, pause, speaking]
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            return invalid("scoring.weights", "weights must be non-negative numbers");
        }
        if (self.scoring.weights.sum() - 1.0).abs() > 1e-6 {
            return invalid("scoring.weights", "weights must sum to 1.0");
        }

        if !(1..=defaults::MAX_SESSION_SECS_LIMIT).contains(&self.session.max_session_secs) {
            return Err(FluentError::ConfigInvalidValue {
                key: "session.max_session_secs".to_string(),
                message: format!("must be between 1 and {}", defaults::MAX_SESSION_SECS_LIMIT),
            });
        }
        Ok(())
    }

    /// Session tunables derived from this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            frame_samples: self.audio.frame_samples,
            silence_threshold: self.audio.silence_threshold,
            max_session_secs: self.session.max_session_secs,
            finalize_timeout_ms: self.session.finalize_timeout_ms,
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            min_pause_secs: self.analysis.min_pause_secs,
            scoring: self.scoring,
            record_to: None,
        }
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/fluentme/config.toml on Linux
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(defaults::APP_DIR).join("config.toml"))
            .ok_or_else(|| FluentError::Other("could not determine config directory".to_string()))
    }

    /// Profile location: configured path, else the XDG data directory.
    pub fn profile_path(&self) -> Result<PathBuf> {
        match &self.storage.profile_path {
            Some(path) => Ok(path.clone()),
            None => crate::profile::ProfileStore::default_path(),
        }
    }
}
