//! Runtime settings shared by the voice worker and the front-ends.
//!
//! All fields are optional so a partially specified configuration falls back
//! to the defaults through the `effective_*` accessors.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long the worker waits for a command before re-checking for shutdown.
pub const DEFAULT_COMMAND_POLL_MS: u64 = 200;

/// How often the foreground drains worker results.
pub const DEFAULT_RESULT_POLL_MS: u64 = 100;

/// How far the skip control jumps ahead.
pub const DEFAULT_SKIP_SECS: u64 = 10;

/// Application settings structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Voice loaded automatically at start-up (catalog name).
    pub default_voice: Option<String>,

    /// Bounded wait of the worker's command receive, in milliseconds.
    pub command_poll_ms: Option<u64>,

    /// Foreground result polling cadence, in milliseconds.
    pub result_poll_ms: Option<u64>,

    /// Skip step of the fast-forward control, in seconds.
    pub skip_secs: Option<u64>,
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            default_voice: None,
            command_poll_ms: Some(DEFAULT_COMMAND_POLL_MS),
            result_poll_ms: Some(DEFAULT_RESULT_POLL_MS),
            skip_secs: Some(DEFAULT_SKIP_SECS),
        }
    }

    /// Effective bounded wait for the worker's command receive.
    #[must_use]
    pub const fn effective_command_poll(&self) -> Duration {
        match self.command_poll_ms {
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_millis(DEFAULT_COMMAND_POLL_MS),
        }
    }

    /// Effective foreground polling cadence.
    #[must_use]
    pub const fn effective_result_poll(&self) -> Duration {
        match self.result_poll_ms {
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_millis(DEFAULT_RESULT_POLL_MS),
        }
    }

    /// Effective skip step.
    #[must_use]
    pub const fn effective_skip(&self) -> Duration {
        match self.skip_secs {
            Some(secs) => Duration::from_secs(secs),
            None => Duration::from_secs(DEFAULT_SKIP_SECS),
        }
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Command poll interval must be between 10 and 5,000 ms, got {0}")]
    InvalidCommandPoll(u64),

    #[error("Result poll interval must be between 10 and 1,000 ms, got {0}")]
    InvalidResultPoll(u64),

    #[error("Skip step must be between 1 and 600 seconds, got {0}")]
    InvalidSkip(u64),

    #[error("Default voice cannot be empty")]
    EmptyDefaultVoice,
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if let Some(ms) = settings.command_poll_ms {
        if !(10..=5_000).contains(&ms) {
            return Err(SettingsError::InvalidCommandPoll(ms));
        }
    }

    // The foreground must stay responsive, so the cadence ceiling is lower.
    if let Some(ms) = settings.result_poll_ms {
        if !(10..=1_000).contains(&ms) {
            return Err(SettingsError::InvalidResultPoll(ms));
        }
    }

    if let Some(secs) = settings.skip_secs {
        if !(1..=600).contains(&secs) {
            return Err(SettingsError::InvalidSkip(secs));
        }
    }

    if settings
        .default_voice
        .as_ref()
        .is_some_and(|v| v.trim().is_empty())
    {
        return Err(SettingsError::EmptyDefaultVoice);
    }

    Ok(())
}
