//! Audio output: plays generated WAV artifacts via `rodio`.
//!
//! The device is a single owned resource: the
//! [`PlaybackController`](crate::controller::PlaybackController) holds it as a
//! `Box<dyn AudioOutput>` on the foreground thread. It is initialised before
//! use ([`RodioOutput::new`]) and released when dropped.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use crate::error::VoiceError;

/// A single audio output that plays one file at a time.
pub trait AudioOutput {
    /// Load `path`, replacing anything loaded before. Playback does not start.
    fn load(&mut self, path: &Path) -> Result<(), VoiceError>;

    /// Start (or restart) playback of the loaded audio.
    fn play(&mut self);

    fn pause(&mut self);

    fn unpause(&mut self);

    /// Stop playback and unload the audio.
    fn stop(&mut self);

    /// Jump ahead by `step`. Best-effort: not every source can seek.
    fn skip(&mut self, step: Duration) -> Result<(), VoiceError>;

    /// Whether the loaded audio has played to its end (or nothing is loaded).
    fn is_finished(&self) -> bool;
}

// ── rodio ──────────────────────────────────────────────────────────

/// Audio output on the default device.
pub struct RodioOutput {
    /// rodio output stream (must be kept alive).
    _stream: OutputStream,

    /// Handle used to create sinks.
    stream_handle: OutputStreamHandle,

    /// Sink for the loaded file (if any).
    sink: Option<Sink>,
}

impl RodioOutput {
    /// Open the default output device.
    pub fn new() -> Result<Self, VoiceError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| VoiceError::OutputStream(e.to_string()))?;

        tracing::info!("Audio playback initialized on default output device");

        Ok(Self {
            _stream: stream,
            stream_handle,
            sink: None,
        })
    }
}

impl AudioOutput for RodioOutput {
    fn load(&mut self, path: &Path) -> Result<(), VoiceError> {
        self.stop();

        let file = File::open(path)?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| VoiceError::Playback(format!("{}: {e}", path.display())))?;

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| VoiceError::OutputStream(e.to_string()))?;
        sink.pause();
        sink.append(source);
        self.sink = Some(sink);

        tracing::debug!(path = %path.display(), "Audio loaded");
        Ok(())
    }

    fn play(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
            tracing::debug!("Audio playback started");
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn unpause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
            tracing::debug!("Audio playback stopped");
        }
    }

    fn skip(&mut self, step: Duration) -> Result<(), VoiceError> {
        let Some(sink) = &self.sink else {
            return Ok(());
        };
        let target = sink.get_pos() + step;
        sink.try_seek(target)
            .map_err(|e| VoiceError::SeekUnsupported(e.to_string()))?;
        tracing::debug!(position_ms = target.as_millis(), "Skipped forward");
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.sink.as_ref().is_none_or(Sink::empty)
    }
}

// ── Null device ────────────────────────────────────────────────────

/// Stand-in used when no output device could be opened.
///
/// Every load fails, so the controller never leaves `Stopped`.
#[derive(Debug, Clone)]
pub struct NullOutput {
    reason: String,
}

impl NullOutput {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl AudioOutput for NullOutput {
    fn load(&mut self, _path: &Path) -> Result<(), VoiceError> {
        Err(VoiceError::OutputStream(format!(
            "no audio output available ({})",
            self.reason
        )))
    }

    fn play(&mut self) {}

    fn pause(&mut self) {}

    fn unpause(&mut self) {}

    fn stop(&mut self) {}

    fn skip(&mut self, _step: Duration) -> Result<(), VoiceError> {
        Ok(())
    }

    fn is_finished(&self) -> bool {
        true
    }
}

/// Open the default device, falling back to [`NullOutput`] when there is none.
pub fn default_output() -> Box<dyn AudioOutput> {
    match RodioOutput::new() {
        Ok(output) => Box::new(output),
        Err(e) => {
            tracing::warn!(error = %e, "No audio output device; playback disabled");
            Box::new(NullOutput::new(e.to_string()))
        }
    }
}
