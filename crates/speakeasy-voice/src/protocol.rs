//! Command and result messages exchanged between the foreground and the worker.
//!
//! Two one-directional, unbounded FIFO channels connect the two threads:
//!
//! ```text
//!   foreground ── Command ──────▶ worker
//!   foreground ◀── WorkerEvent ── worker
//! ```
//!
//! Sending never blocks. Each message is consumed exactly once, in the order
//! it was sent. Failures have no message of their own: a task that fails
//! emits a [`WorkerEvent::Log`] and simply omits its terminal event.

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use crate::error::VoiceError;

// ── Messages ───────────────────────────────────────────────────────

/// A task request for the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Make `name` the active voice, installing it first if needed.
    LoadVoice { name: String },

    /// Synthesize `text` with the active voice.
    ///
    /// With no destination the audio goes to a fresh temporary file.
    Generate {
        text: String,
        destination: Option<PathBuf>,
    },

    /// Finish the in-flight command, then stop the worker loop.
    Shutdown,
}

impl Command {
    pub fn load_voice(name: impl Into<String>) -> Self {
        Self::LoadVoice { name: name.into() }
    }

    pub fn generate(text: impl Into<String>, destination: Option<PathBuf>) -> Self {
        Self::Generate {
            text: text.into(),
            destination,
        }
    }
}

/// Progress or outcome reported by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// A human-readable status line (progress or failure).
    Log { message: String },

    /// Terminal success of `LoadVoice`.
    VoiceReady { name: String },

    /// Terminal success of `Generate`.
    AudioReady { path: PathBuf, is_temporary: bool },
}

impl WorkerEvent {
    pub fn log(message: impl Into<String>) -> Self {
        Self::Log {
            message: message.into(),
        }
    }

    /// Whether this event ends a task successfully.
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Log { .. })
    }
}

// ── Channels ───────────────────────────────────────────────────────

/// Create the foreground → worker command channel.
pub fn command_channel() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::channel();
    (CommandSender { tx }, CommandReceiver { rx })
}

/// Create the worker → foreground event channel.
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel();
    (EventSender { tx }, EventReceiver { rx })
}

/// Foreground end of the command channel.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::Sender<Command>,
}

impl CommandSender {
    /// Enqueue a command. Never blocks.
    pub fn send(&self, command: Command) -> Result<(), VoiceError> {
        self.tx.send(command).map_err(|_| VoiceError::WorkerGone)
    }
}

/// Outcome of a bounded wait for the next command.
#[derive(Debug)]
pub enum Received {
    Command(Command),
    /// Nothing arrived within the wait.
    Idle,
    /// Every sender is gone.
    Closed,
}

/// Worker end of the command channel.
#[derive(Debug)]
pub struct CommandReceiver {
    rx: mpsc::Receiver<Command>,
}

impl CommandReceiver {
    /// Wait at most `timeout` for the next command.
    pub fn recv_timeout(&self, timeout: Duration) -> Received {
        match self.rx.recv_timeout(timeout) {
            Ok(command) => Received::Command(command),
            Err(mpsc::RecvTimeoutError::Timeout) => Received::Idle,
            Err(mpsc::RecvTimeoutError::Disconnected) => Received::Closed,
        }
    }
}

/// Worker end of the event channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<WorkerEvent>,
}

impl EventSender {
    /// Emit an event. A vanished foreground is not an error for the worker.
    pub fn send(&self, event: WorkerEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Event receiver dropped; discarding worker event");
        }
    }

    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(%message, "worker");
        self.send(WorkerEvent::Log { message });
    }
}

/// Foreground end of the event channel.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<WorkerEvent>,
}

impl EventReceiver {
    /// Take every event that is already queued, without waiting.
    pub fn drain(&self) -> Vec<WorkerEvent> {
        self.rx.try_iter().collect()
    }

    /// Wait at most `timeout` for one event. Used by headless callers and tests.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<WorkerEvent> {
        self.rx.recv_timeout(timeout).ok()
    }
}
