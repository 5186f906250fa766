//! Synthesis engine seam: engine-agnostic interfaces for TTS.
//!
//! The [`TaskExecutor`](crate::executor::TaskExecutor) holds a
//! `Box<dyn TtsBackend>` produced by a `Box<dyn EngineLoader>`, so engines can
//! be swapped (or mocked in tests) without touching the worker logic.
//!
//! ## Backend implementations
//!
//! | Feature    | Module             | Engine |
//! |------------|--------------------|--------|
//! | `sherpa`   | [`sherpa_vits`]    | sherpa-onnx VITS (Piper voices) |

#[cfg(feature = "sherpa")]
pub mod sherpa_vits;

use std::path::Path;
use std::time::Duration;

use crate::error::VoiceError;
use crate::models::VoiceModel;

// ── Shared types ───────────────────────────────────────────────────

/// Audio produced by TTS synthesis.
#[derive(Debug, Clone)]
pub struct TtsAudio {
    /// PCM f32 samples, mono.
    pub samples: Vec<f32>,

    /// Sample rate of the audio (e.g., 16 000 Hz for Piper "low" voices).
    pub sample_rate: u32,

    /// Duration of the audio.
    pub duration: Duration,
}

impl TtsAudio {
    /// Build audio from samples, deriving the duration.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let duration = if sample_rate > 0 {
            Duration::from_secs_f64(samples.len() as f64 / f64::from(sample_rate))
        } else {
            Duration::ZERO
        };
        Self {
            samples,
            sample_rate,
            duration,
        }
    }
}

/// Speaker and speed applied to every synthesis call.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SynthesisOptions {
    /// Speaker index within a multi-speaker model (0 for single-speaker voices).
    pub speaker_id: i32,

    /// Speed multiplier (1.0 = normal).
    pub speed: f32,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            speaker_id: 0,
            speed: 1.0,
        }
    }
}

// ── Traits ─────────────────────────────────────────────────────────

/// A loaded synthesis engine bound to one voice.
///
/// Implementations must be `Send` so the executor can be moved onto its
/// worker thread; they are never shared between threads.
pub trait TtsBackend: Send {
    /// Synthesize `text` to mono PCM.
    fn synthesize(&mut self, text: &str) -> Result<TtsAudio, VoiceError>;
}

/// Constructs a [`TtsBackend`] from an installed voice model.
pub trait EngineLoader: Send {
    /// Load the engine for `model`, whose files live in `install_dir`.
    fn load(&self, model: &VoiceModel, install_dir: &Path)
    -> Result<Box<dyn TtsBackend>, VoiceError>;
}

// ── Defaults ───────────────────────────────────────────────────────

/// Loader used when the crate is built without any synthesis backend.
///
/// Every load fails with [`VoiceError::EngineLoad`].
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableLoader;

impl EngineLoader for UnavailableLoader {
    fn load(
        &self,
        model: &VoiceModel,
        _install_dir: &Path,
    ) -> Result<Box<dyn TtsBackend>, VoiceError> {
        Err(VoiceError::EngineLoad(format!(
            "cannot load '{}': built without a synthesis backend (enable the `sherpa` feature)",
            model.id
        )))
    }
}

/// The loader for the backend compiled into this build.
pub fn default_loader(options: SynthesisOptions) -> Box<dyn EngineLoader> {
    #[cfg(feature = "sherpa")]
    {
        Box::new(sherpa_vits::SherpaVitsLoader::new(options))
    }
    #[cfg(not(feature = "sherpa"))]
    {
        let _ = options;
        Box::new(UnavailableLoader)
    }
}
