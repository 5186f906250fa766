//! Sherpa-ONNX VITS backend: implements [`TtsBackend`] via `sherpa-rs`.
//!
//! Piper voices are VITS models. The install directory must contain the
//! `.onnx` model, `tokens.txt`, and `espeak-ng-data/`.

use std::path::Path;

use sherpa_rs::tts::{VitsTts, VitsTtsConfig};

use crate::backend::{EngineLoader, SynthesisOptions, TtsAudio, TtsBackend};
use crate::error::VoiceError;
use crate::models::VoiceModel;

/// Builds [`SherpaVitsBackend`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SherpaVitsLoader {
    options: SynthesisOptions,
}

impl SherpaVitsLoader {
    pub const fn new(options: SynthesisOptions) -> Self {
        Self { options }
    }
}

impl EngineLoader for SherpaVitsLoader {
    fn load(
        &self,
        model: &VoiceModel,
        install_dir: &Path,
    ) -> Result<Box<dyn TtsBackend>, VoiceError> {
        Ok(Box::new(SherpaVitsBackend::load(
            install_dir,
            &model.model_file,
            self.options,
        )?))
    }
}

/// A loaded sherpa-onnx VITS engine.
pub struct SherpaVitsBackend {
    engine: VitsTts,
    options: SynthesisOptions,
}

impl SherpaVitsBackend {
    /// Load the VITS model `model_file` from `model_dir`.
    pub fn load(
        model_dir: &Path,
        model_file: &str,
        options: SynthesisOptions,
    ) -> Result<Self, VoiceError> {
        let model_path = model_dir.join(model_file);
        let tokens_path = model_dir.join("tokens.txt");
        let data_dir = model_dir.join("espeak-ng-data");

        // sherpa-onnx aborts the process on missing files, so check first.
        for path in [&model_path, &tokens_path, &data_dir] {
            if !path.exists() {
                return Err(VoiceError::ModelNotFound(path.clone()));
            }
        }

        tracing::info!(
            dir = %model_dir.display(),
            model = model_file,
            speaker_id = options.speaker_id,
            speed = options.speed,
            "Loading Sherpa VITS model"
        );

        let config = VitsTtsConfig {
            model: path_to_string(&model_path)?,
            tokens: path_to_string(&tokens_path)?,
            data_dir: path_to_string(&data_dir)?,
            ..Default::default()
        };

        let engine = VitsTts::new(config);

        tracing::info!("Sherpa VITS model loaded");
        Ok(Self { engine, options })
    }
}

impl TtsBackend for SherpaVitsBackend {
    fn synthesize(&mut self, text: &str) -> Result<TtsAudio, VoiceError> {
        tracing::debug!(
            text_len = text.len(),
            speaker_id = self.options.speaker_id,
            "Synthesizing speech (Sherpa VITS)"
        );

        let audio = self
            .engine
            .create(text, self.options.speaker_id, self.options.speed)
            .map_err(|e| VoiceError::Synthesis(format!("{e}")))?;

        let audio = TtsAudio::new(audio.samples, audio.sample_rate);
        tracing::debug!(
            samples = audio.samples.len(),
            sample_rate = audio.sample_rate,
            duration_ms = audio.duration.as_millis(),
            "Speech synthesized (Sherpa VITS)"
        );
        Ok(audio)
    }
}

/// Convert a path to a string, returning a `VoiceError` on invalid UTF-8.
fn path_to_string(path: &Path) -> Result<String, VoiceError> {
    path.to_str()
        .map(ToString::to_string)
        .ok_or_else(|| VoiceError::EngineLoad(format!("Invalid UTF-8 path: {}", path.display())))
}
