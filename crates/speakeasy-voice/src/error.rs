//! Voice worker error types.

use std::path::PathBuf;

/// Failure classes a task can end in.
///
/// Every [`VoiceError`] maps to exactly one class; the worker reports all of
/// them the same way (a log line and no terminal result).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown voice name. Not retried automatically.
    Configuration,
    /// Download or unpack failed. The user may retry by reselecting the voice.
    Acquisition,
    /// Engine construction or synthesis failed.
    Engine,
    /// Reading or writing an audio file failed.
    Io,
}

/// Errors that can occur in the voice worker and playback layer.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// Voice name is not in the catalog.
    #[error("Error: unknown voice '{0}'")]
    UnknownVoice(String),

    /// Model file not found at expected path.
    #[error("Voice model not found at {0}")]
    ModelNotFound(PathBuf),

    /// Failed to download or unpack a voice model.
    #[error("Failed to acquire voice model '{name}': {source}")]
    Acquisition { name: String, source: anyhow::Error },

    /// Failed to construct the synthesis engine.
    #[error("Failed to load voice engine: {0}")]
    EngineLoad(String),

    /// Failed to synthesize speech.
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    /// No engine has been loaded yet.
    #[error("Model not loaded")]
    NotLoaded,

    /// Failed to encode or decode a WAV file.
    #[error("WAV encoding failed for {path}: {source}")]
    Wav {
        path: PathBuf,
        source: hound::Error,
    },

    /// Failed to open the audio output device.
    #[error("Failed to open audio output stream: {0}")]
    OutputStream(String),

    /// Failed to load or play an audio artifact.
    #[error("Playback error: {0}")]
    Playback(String),

    /// The output device could not seek.
    #[error("Seeking is not supported for this audio: {0}")]
    SeekUnsupported(String),

    /// The worker thread is gone.
    #[error("Voice worker is not running")]
    WorkerGone,

    /// The models directory could not be resolved.
    #[error("Cannot resolve voice models directory: {0}")]
    Paths(#[from] speakeasy_core::PathError),

    /// IO error (model files, output files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VoiceError {
    /// Classify this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownVoice(_) | Self::Paths(_) => ErrorKind::Configuration,
            Self::ModelNotFound(_) | Self::Acquisition { .. } => ErrorKind::Acquisition,
            Self::EngineLoad(_) | Self::Synthesis(_) | Self::NotLoaded | Self::WorkerGone => {
                ErrorKind::Engine
            }
            Self::Wav { .. }
            | Self::OutputStream(_)
            | Self::Playback(_)
            | Self::SeekUnsupported(_)
            | Self::Io(_) => ErrorKind::Io,
        }
    }
}
