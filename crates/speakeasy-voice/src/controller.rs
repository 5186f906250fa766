//! Playback controller: the foreground half of the worker protocol.
//!
//! Owns everything the user can see: the transport state, the loaded audio
//! artifact, and which controls are enabled. It never blocks: user actions
//! enqueue a [`Command`] and return, and [`poll`](PlaybackController::poll)
//! drains whatever the worker has produced so far.
//!
//! ```text
//!   Stopped ── AudioReady(temp) ──▶ Playing
//!   Playing ── Pause ─────────────▶ Paused
//!   Paused  ── Resume ────────────▶ Playing
//!   Playing ── Stop / drained ────▶ Stopped
//!   Paused  ── Stop ──────────────▶ Stopped
//! ```
//!
//! A new temporary artifact always lands in `Playing`, whatever came before.
//!
//! Invalid transport actions are never executed: each action is only
//! performed when its affordance is enabled, and affordances are derived from
//! the state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::VoiceError;
use crate::playback::AudioOutput;
use crate::protocol::{Command, CommandSender, EventReceiver, WorkerEvent};

// ── State machine ──────────────────────────────────────────────────

/// Transport state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing loaded.
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Inputs that can move the transport state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// A temporary artifact arrived and was loaded into the device.
    AudioLoaded,
    Pause,
    Resume,
    Stop,
    /// The device played the artifact to its end.
    Drained,
}

impl PlaybackState {
    /// The state after `event`, or `None` when `event` is not valid here.
    pub const fn on(self, event: TransportEvent) -> Option<Self> {
        match (self, event) {
            (_, TransportEvent::AudioLoaded)
            | (Self::Paused, TransportEvent::Resume) => Some(Self::Playing),
            (Self::Playing, TransportEvent::Pause) => Some(Self::Paused),
            (Self::Playing | Self::Paused, TransportEvent::Stop)
            | (Self::Playing, TransportEvent::Drained) => Some(Self::Stopped),
            _ => None,
        }
    }

    /// Whether audio is loaded (playing or paused).
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

/// A user-facing control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Generate and play.
    Generate,
    /// Generate to a chosen file.
    Save,
    Pause,
    Resume,
    Stop,
    /// Fast-forward (best-effort).
    Skip,
}

/// Which controls are currently enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Affordances {
    pub generate: bool,
    pub save: bool,
    pub pause: bool,
    pub resume: bool,
    pub stop: bool,
    pub skip: bool,
}

impl Affordances {
    /// Compute affordances for a transport state and task status.
    ///
    /// Generation stays enabled before any voice is ready so the worker can
    /// report that no model is loaded; saving needs a ready voice.
    pub const fn derive(state: PlaybackState, busy: bool, voice_ready: bool) -> Self {
        Self {
            generate: !busy,
            save: !busy && voice_ready,
            pause: matches!(state, PlaybackState::Playing),
            resume: matches!(state, PlaybackState::Paused),
            stop: state.is_active(),
            skip: state.is_active(),
        }
    }

    pub const fn allows(&self, action: Action) -> bool {
        match action {
            Action::Generate => self.generate,
            Action::Save => self.save,
            Action::Pause => self.pause,
            Action::Resume => self.resume,
            Action::Stop => self.stop,
            Action::Skip => self.skip,
        }
    }
}

// ── Controller ─────────────────────────────────────────────────────

/// The audio file currently loaded into the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    /// Temporary artifacts are deleted when released.
    pub is_temporary: bool,
}

/// Something the front-end should show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Worker status line.
    Log(String),
    /// A voice finished loading.
    VoiceReady(String),
    /// A persistent file was written.
    Saved(PathBuf),
    /// The device could not play an artifact, or could not skip.
    Playback(String),
    /// Playback reached the end of the artifact.
    Finished,
}

/// Foreground state machine driving the worker and the audio device.
pub struct PlaybackController {
    commands: CommandSender,
    events: EventReceiver,
    output: Box<dyn AudioOutput>,
    state: PlaybackState,
    artifact: Option<Artifact>,
    /// A `LoadVoice` or `Generate` is outstanding.
    busy: bool,
    /// Requested by [`select_voice`](Self::select_voice), not yet answered.
    pending_voice: Option<String>,
    ready_voice: Option<String>,
    skip_step: Duration,
}

impl PlaybackController {
    pub fn new(
        commands: CommandSender,
        events: EventReceiver,
        output: Box<dyn AudioOutput>,
        skip_step: Duration,
    ) -> Self {
        Self {
            commands,
            events,
            output,
            state: PlaybackState::Stopped,
            artifact: None,
            busy: false,
            pending_voice: None,
            ready_voice: None,
            skip_step,
        }
    }

    pub const fn state(&self) -> PlaybackState {
        self.state
    }

    pub const fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    pub const fn affordances(&self) -> Affordances {
        Affordances::derive(self.state, self.busy, self.ready_voice.is_some())
    }

    /// Whether a task is believed to be outstanding.
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    /// The voice being switched to, or else the one last reported ready.
    pub fn selected_voice(&self) -> Option<&str> {
        self.pending_voice.as_deref().or(self.ready_voice.as_deref())
    }

    /// The voice most recently reported ready by the worker.
    pub fn ready_voice(&self) -> Option<&str> {
        self.ready_voice.as_deref()
    }

    // ── User actions ───────────────────────────────────────────────

    /// Switch to `name`. Disables generation until the worker reports back.
    ///
    /// Never cancels an in-flight generation: the load is queued behind it.
    pub fn select_voice(&mut self, name: &str) -> Result<(), VoiceError> {
        self.commands.send(Command::load_voice(name))?;
        self.busy = true;
        self.pending_voice = Some(name.to_string());
        tracing::debug!(voice = name, "Voice selected");
        Ok(())
    }

    /// Stop any current playback and generate `text` for playback.
    ///
    /// Returns `false` when the control is disabled or the text is blank.
    pub fn generate(&mut self, text: &str) -> Result<bool, VoiceError> {
        let text = text.trim();
        if text.is_empty() || !self.affordances().allows(Action::Generate) {
            return Ok(false);
        }
        self.stop();
        self.commands.send(Command::generate(text, None))?;
        self.busy = true;
        Ok(true)
    }

    /// Generate `text` into `destination` without touching playback.
    pub fn save(&mut self, text: &str, destination: &Path) -> Result<bool, VoiceError> {
        let text = text.trim();
        if text.is_empty() || !self.affordances().allows(Action::Save) {
            return Ok(false);
        }
        self.commands
            .send(Command::generate(text, Some(destination.to_path_buf())))?;
        self.busy = true;
        Ok(true)
    }

    pub fn pause(&mut self) -> bool {
        if !self.transition(TransportEvent::Pause) {
            return false;
        }
        self.output.pause();
        true
    }

    pub fn resume(&mut self) -> bool {
        if !self.transition(TransportEvent::Resume) {
            return false;
        }
        self.output.unpause();
        true
    }

    /// Stop playback and release the artifact. A no-op when already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.transition(TransportEvent::Stop) {
            return false;
        }
        self.output.stop();
        self.release_artifact();
        true
    }

    /// Best-effort fast-forward. Seek failures become a [`Notice::Playback`].
    pub fn skip(&mut self) -> Option<Notice> {
        if !self.affordances().allows(Action::Skip) {
            return None;
        }
        match self.output.skip(self.skip_step) {
            Ok(()) => None,
            Err(e) => {
                tracing::info!(error = %e, "Skip unavailable");
                Some(Notice::Playback(format!("Fast forward unavailable: {e}")))
            }
        }
    }

    // ── Worker results ─────────────────────────────────────────────

    /// Drain worker events and apply them. Never blocks.
    pub fn poll(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();

        for event in self.events.drain() {
            self.apply(event, &mut notices);
        }

        if self.state == PlaybackState::Playing && self.output.is_finished() {
            self.transition(TransportEvent::Drained);
            self.output.stop();
            self.release_artifact();
            notices.push(Notice::Finished);
        }

        notices
    }

    /// Drain worker events without playing anything.
    ///
    /// For use at exit, after the worker has stopped: temporary audio that
    /// arrived too late to play is deleted, saved files are left alone.
    pub fn discard_events(&mut self) {
        for event in self.events.drain() {
            match event {
                WorkerEvent::AudioReady {
                    path,
                    is_temporary: true,
                } => remove_temporary(&path),
                WorkerEvent::AudioReady { path, .. } => {
                    tracing::debug!(path = %path.display(), "Saved audio reported at exit");
                }
                WorkerEvent::Log { .. } | WorkerEvent::VoiceReady { .. } => {}
            }
        }
        self.busy = false;
        self.pending_voice = None;
    }

    fn apply(&mut self, event: WorkerEvent, notices: &mut Vec<Notice>) {
        match event {
            WorkerEvent::Log { message } => {
                // The worker reports failures only as log lines; any log line
                // may be the last word on an outstanding task.
                self.busy = false;
                self.pending_voice = None;
                notices.push(Notice::Log(message));
            }
            WorkerEvent::VoiceReady { name } => {
                self.busy = false;
                self.pending_voice = None;
                self.ready_voice = Some(name.clone());
                notices.push(Notice::VoiceReady(name));
            }
            WorkerEvent::AudioReady {
                path,
                is_temporary: true,
            } => {
                self.busy = false;
                if let Err(e) = self.load_and_play(path) {
                    notices.push(Notice::Playback(e.to_string()));
                }
            }
            WorkerEvent::AudioReady {
                path,
                is_temporary: false,
            } => {
                self.busy = false;
                notices.push(Notice::Saved(path));
            }
        }
    }

    fn load_and_play(&mut self, path: PathBuf) -> Result<(), VoiceError> {
        self.output.stop();
        self.release_artifact();
        self.state = PlaybackState::Stopped;

        if let Err(e) = self.output.load(&path) {
            tracing::warn!(path = %path.display(), error = %e, "Could not load audio");
            remove_temporary(&path);
            return Err(e);
        }

        self.output.play();
        self.transition(TransportEvent::AudioLoaded);
        self.artifact = Some(Artifact {
            path,
            is_temporary: true,
        });
        Ok(())
    }

    /// Apply `event` if it is valid from the current state.
    fn transition(&mut self, event: TransportEvent) -> bool {
        match self.state.on(event) {
            Some(next) => {
                tracing::debug!(from = ?self.state, to = ?next, ?event, "Transport transition");
                self.state = next;
                true
            }
            None => false,
        }
    }

    fn release_artifact(&mut self) {
        if let Some(artifact) = self.artifact.take() {
            if artifact.is_temporary {
                remove_temporary(&artifact.path);
            }
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.output.stop();
        self.release_artifact();
    }
}

fn remove_temporary(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::debug!(path = %path.display(), error = %e, "Could not remove temporary audio");
    }
}
