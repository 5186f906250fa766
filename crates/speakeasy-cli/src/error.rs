//! CLI-specific error types and exit codes.

use speakeasy_core::SettingsError;
use speakeasy_voice::VoiceError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid settings or an unknown voice.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The worker could not be started or went away.
    #[error("Voice worker error: {0}")]
    Worker(String),

    /// The headless run finished without producing audio.
    #[error("No audio was produced")]
    NoAudio,

    /// Terminal or file I/O failed.
    #[error("IO error: {0}")]
    Io(String),
}

impl CliError {
    /// Map error to an exit code (sysexits.h where one fits).
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 78, // EX_CONFIG
            Self::Worker(_) => 70, // EX_SOFTWARE
            Self::NoAudio => 1,
            Self::Io(_) => 74, // EX_IOERR
        }
    }
}

impl From<VoiceError> for CliError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::UnknownVoice(_) | VoiceError::Paths(_) => Self::Config(err.to_string()),
            VoiceError::Io(e) => Self::Io(e.to_string()),
            other => Self::Worker(other.to_string()),
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_voice_is_a_config_error() {
        let err: CliError = VoiceError::UnknownVoice("Robot".to_string()).into();
        assert!(matches!(err, CliError::Config(_)));
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn missing_audio_fails_with_one() {
        assert_eq!(CliError::NoAudio.exit_code(), 1);
    }

    #[test]
    fn worker_gone_is_a_worker_error() {
        let err: CliError = VoiceError::WorkerGone.into();
        assert!(matches!(err, CliError::Worker(_)));
    }
}
