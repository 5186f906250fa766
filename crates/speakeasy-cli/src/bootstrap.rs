//! Composition root: wires the catalog, installer, engine loader, and worker.
//!
//! This is the only place that picks concrete implementations; the front-ends
//! receive a running [`ExecutorHandle`] and its event receiver.

use speakeasy_core::{Settings, validate_settings};
use speakeasy_voice::{
    ArchiveInstaller, DEFAULT_VOICE, EventReceiver, ExecutorHandle, SynthesisOptions,
    VoiceCatalog, VoiceError, default_loader,
};

use crate::error::CliError;
use crate::parser::Cli;

/// Everything a front-end needs.
pub struct CliContext {
    pub settings: Settings,
    pub catalog: VoiceCatalog,
    /// Voice to load first.
    pub initial_voice: String,
    pub worker: ExecutorHandle,
    pub events: EventReceiver,
}

/// Validate configuration and start the voice worker.
pub fn bootstrap(cli: &Cli) -> Result<CliContext, CliError> {
    let settings = cli.settings();
    validate_settings(&settings)?;

    let catalog = VoiceCatalog::builtin();
    let initial_voice = initial_voice(&catalog, &settings)?;

    let installer = ArchiveInstaller::resolve(cli.models_dir.as_deref())?;
    tracing::info!(
        models_dir = %installer.models_dir().display(),
        voice = %initial_voice,
        "Starting voice worker"
    );

    let (worker, events) = ExecutorHandle::spawn(
        catalog.clone(),
        Box::new(installer),
        default_loader(SynthesisOptions::default()),
        settings.effective_command_poll(),
    )?;

    Ok(CliContext {
        settings,
        catalog,
        initial_voice,
        worker,
        events,
    })
}

/// The configured voice, or the built-in default.
///
/// Rejects names the catalog does not know before any work is queued.
fn initial_voice(catalog: &VoiceCatalog, settings: &Settings) -> Result<String, VoiceError> {
    let name = settings.default_voice.as_deref().unwrap_or(DEFAULT_VOICE);
    if catalog.contains(name) {
        Ok(name.to_string())
    } else {
        Err(VoiceError::UnknownVoice(name.to_string()))
    }
}
