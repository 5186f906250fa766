//! Voice model catalog: the fixed set of synthesizable voices.
//!
//! Each voice is a Piper VITS model published as a `.tar.bz2` archive in the
//! [`k2-fsa/sherpa-onnx`](https://github.com/k2-fsa/sherpa-onnx/releases)
//! `tts-models` release. An archive extracts to a directory holding the ONNX
//! model, `tokens.txt`, and an `espeak-ng-data/` folder.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ── Model identifiers ──────────────────────────────────────────────

/// Unique identifier for a voice model (its display name).
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoiceModelId(pub String);

impl std::fmt::Display for VoiceModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Voice model ────────────────────────────────────────────────────

/// A synthesizable voice: where to fetch it and where it lives once installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceModel {
    /// Voice name, unique within the catalog (e.g. `"Female (Amy)"`).
    pub id: VoiceModelId,

    /// URL of the `.tar.bz2` archive.
    pub archive_url: String,

    /// File name of the downloaded archive.
    pub archive_name: String,

    /// Directory name inside the archive (also the on-disk folder name).
    pub dir_name: String,

    /// ONNX model file name within `dir_name`.
    pub model_file: String,
}

impl VoiceModel {
    /// Directory the model is installed into under `models_dir`.
    pub fn install_dir(&self, models_dir: &Path) -> PathBuf {
        models_dir.join(&self.dir_name)
    }

    /// Path of the downloaded archive under `models_dir`.
    pub fn archive_path(&self, models_dir: &Path) -> PathBuf {
        models_dir.join(&self.archive_name)
    }

    /// Path of the ONNX model file under `models_dir`.
    pub fn model_path(&self, models_dir: &Path) -> PathBuf {
        self.install_dir(models_dir).join(&self.model_file)
    }

    /// Whether the model file is present locally.
    pub fn is_installed(&self, models_dir: &Path) -> bool {
        self.model_path(models_dir).exists()
    }
}

// ── URL bases ──────────────────────────────────────────────────────

const SHERPA_TTS_BASE: &str =
    "https://github.com/k2-fsa/sherpa-onnx/releases/download/tts-models";

/// Voice loaded when nothing else is configured.
pub const DEFAULT_VOICE: &str = "Female (Amy)";

// ── Catalog ────────────────────────────────────────────────────────

/// Immutable mapping from voice name to [`VoiceModel`], built once at start-up.
#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    voices: BTreeMap<String, VoiceModel>,
}

impl VoiceCatalog {
    /// The built-in voices.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_models([
            piper_voice("Female (Amy)", "en_US-amy-low"),
            piper_voice("Male (Ryan)", "en_US-ryan-low"),
        ])
    }

    /// Build a catalog from arbitrary models. Later duplicates replace earlier ones.
    pub fn from_models(models: impl IntoIterator<Item = VoiceModel>) -> Self {
        let voices = models
            .into_iter()
            .map(|model| (model.id.0.clone(), model))
            .collect();
        Self { voices }
    }

    /// Find a voice by name.
    pub fn get(&self, name: &str) -> Option<&VoiceModel> {
        self.voices.get(name)
    }

    /// Whether `name` is a known voice.
    pub fn contains(&self, name: &str) -> bool {
        self.voices.contains_key(name)
    }

    /// Voice names in display order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.voices.keys().map(String::as_str)
    }

    /// All voices in display order.
    pub fn iter(&self) -> impl Iterator<Item = &VoiceModel> {
        self.voices.values()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// The voice after `current` in display order, wrapping around.
    ///
    /// Returns the first voice when `current` is unknown.
    pub fn next_after(&self, current: &str) -> Option<&str> {
        let mut names = self.names().skip_while(|name| *name != current);
        match (names.next(), names.next()) {
            (Some(_), Some(next)) => Some(next),
            _ => self.names().next(),
        }
    }
}

// ── Internal constructors ──────────────────────────────────────────

fn piper_voice(name: &str, piper_id: &str) -> VoiceModel {
    let dir_name = format!("vits-piper-{piper_id}");
    let archive_name = format!("{dir_name}.tar.bz2");
    VoiceModel {
        id: VoiceModelId(name.to_string()),
        archive_url: format!("{SHERPA_TTS_BASE}/{archive_name}"),
        archive_name,
        dir_name,
        model_file: format!("{piper_id}.onnx"),
    }
}
