//! Uncompressed WAV encoding of synthesized audio.

use std::path::{Path, PathBuf};

use crate::error::VoiceError;

/// Write mono 32-bit float PCM to `path` at `sample_rate`.
pub fn write_wav(path: &Path, sample_rate: u32, samples: &[f32]) -> Result<(), VoiceError> {
    let wav_err = |source| VoiceError::Wav {
        path: path.to_path_buf(),
        source,
    };

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(wav_err)?;
    for &sample in samples {
        writer.write_sample(sample).map_err(wav_err)?;
    }
    writer.finalize().map_err(wav_err)?;

    tracing::debug!(
        path = %path.display(),
        samples = samples.len(),
        sample_rate,
        "WAV written"
    );
    Ok(())
}

/// Read a WAV file back into mono f32 samples and its sample rate.
///
/// Integer formats are scaled to `[-1.0, 1.0]`. Multi-channel files are
/// returned interleaved.
pub fn read_wav(path: &Path) -> Result<(Vec<f32>, u32), VoiceError> {
    let wav_err = |source| VoiceError::Wav {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = hound::WavReader::open(path).map_err(wav_err)?;
    let spec = reader.spec();

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(wav_err)?,
        hound::SampleFormat::Int => {
            #[allow(clippy::cast_precision_loss)]
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()
                .map_err(wav_err)?
        }
    };

    Ok((samples, spec.sample_rate))
}

/// Allocate a fresh, uniquely named `.wav` file in the system temp directory.
///
/// The file exists (empty) when this returns, so concurrent callers never
/// receive the same path. The caller owns its removal.
pub fn temp_wav_path() -> Result<PathBuf, VoiceError> {
    let file = tempfile::Builder::new()
        .prefix("speakeasy-")
        .suffix(".wav")
        .tempfile()?;
    let (_, path) = file.keep().map_err(|e| VoiceError::Io(e.error))?;
    Ok(path)
}
