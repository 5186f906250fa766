//! Offline text-to-speech worker for speakeasy.
//!
//! Two threads cooperate through a pair of FIFO channels:
//!
//! - the **worker** ([`executor`]) owns the synthesis engine and performs
//!   every slow operation (model acquisition, engine load, synthesis, WAV
//!   encoding) one command at a time;
//! - the **foreground** ([`controller`]) owns the audio device and the
//!   playback state machine, and never blocks on the worker.
//!
//! [`protocol`] defines the messages between them.

#![deny(unused_crate_dependencies)]

pub mod backend;
pub mod controller;
pub mod download;
pub mod error;
pub mod executor;
pub mod models;
pub mod playback;
pub mod protocol;
pub mod wav;

// Re-export key types for convenience
pub use backend::{EngineLoader, SynthesisOptions, TtsAudio, TtsBackend, default_loader};
pub use controller::{Action, Affordances, Artifact, Notice, PlaybackController, PlaybackState};
pub use download::{ArchiveInstaller, ModelInstaller};
pub use error::{ErrorKind, VoiceError};
pub use executor::{ExecutorHandle, READY_MESSAGE, TaskExecutor};
pub use models::{DEFAULT_VOICE, VoiceCatalog, VoiceModel, VoiceModelId};
pub use playback::{AudioOutput, NullOutput, RodioOutput, default_output};
pub use protocol::{Command, CommandSender, EventReceiver, EventSender, WorkerEvent};
