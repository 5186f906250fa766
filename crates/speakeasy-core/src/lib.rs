//! Shared building blocks for speakeasy: where data lives on disk and the
//! runtime settings the voice worker and front-ends agree on.
//!
//! Nothing in this crate touches audio devices or synthesis engines.

pub mod paths;
pub mod settings;

pub use paths::{PathError, VoiceModelsDirResolution, VoiceModelsDirSource};
pub use settings::{Settings, SettingsError, validate_settings};
