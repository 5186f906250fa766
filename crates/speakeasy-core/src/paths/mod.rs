//! Path utilities for speakeasy data directories.
//!
//! - Application data root (`SPEAKEASY_DATA_DIR` or the platform data dir)
//! - Voice models directory (explicit override, `SPEAKEASY_MODELS_DIR`, or
//!   `<data_root>/voice_models`)
//!
//! Returns `PathBuf` and [`PathError`]; no terminal I/O happens here.

mod error;
mod platform;
mod voice_models;

pub use error::PathError;
pub use platform::data_root;
pub use voice_models::{
    VOICE_MODELS_DIR_NAME, VoiceModelsDirResolution, VoiceModelsDirSource,
    resolve_voice_models_dir, voice_models_dir_under,
};
