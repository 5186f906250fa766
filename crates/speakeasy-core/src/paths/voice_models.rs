//! Voice models directory resolution.

use std::env;
use std::path::{Path, PathBuf};

use super::error::PathError;
use super::platform::{data_root, normalize_user_path};

/// Name of the voice models folder under the data root.
pub const VOICE_MODELS_DIR_NAME: &str = "voice_models";

/// Environment variable that overrides the voice models directory.
const MODELS_DIR_ENV: &str = "SPEAKEASY_MODELS_DIR";

/// How the voice models directory was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceModelsDirSource {
    /// The user passed an explicit path (CLI flag).
    Explicit,
    /// The path came from `SPEAKEASY_MODELS_DIR` / `.env`.
    EnvVar,
    /// Fallback default (`<data_root>/voice_models`).
    Default,
}

/// Resolution result for the voice models directory.
#[derive(Debug, Clone)]
pub struct VoiceModelsDirResolution {
    /// The resolved path to the voice models directory.
    pub path: PathBuf,
    /// How the path was determined.
    pub source: VoiceModelsDirSource,
}

/// The voice models directory beneath a given data root.
pub fn voice_models_dir_under(root: &Path) -> PathBuf {
    root.join(VOICE_MODELS_DIR_NAME)
}

/// Resolve the voice models directory from an explicit override, env var, or default.
///
/// Resolution order:
/// 1. Explicit path provided by caller (highest priority)
/// 2. `SPEAKEASY_MODELS_DIR` environment variable
/// 3. `<data_root>/voice_models`
pub fn resolve_voice_models_dir(
    explicit: Option<&str>,
) -> Result<VoiceModelsDirResolution, PathError> {
    if let Some(path_str) = explicit {
        return Ok(VoiceModelsDirResolution {
            path: normalize_user_path(path_str)?,
            source: VoiceModelsDirSource::Explicit,
        });
    }

    if let Ok(env_path) = env::var(MODELS_DIR_ENV) {
        if !env_path.trim().is_empty() {
            return Ok(VoiceModelsDirResolution {
                path: normalize_user_path(&env_path)?,
                source: VoiceModelsDirSource::EnvVar,
            });
        }
    }

    Ok(VoiceModelsDirResolution {
        path: voice_models_dir_under(&data_root()?),
        source: VoiceModelsDirSource::Default,
    })
}
