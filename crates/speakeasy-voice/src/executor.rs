//! Task executor: the single background worker that owns the voice engine.
//!
//! All slow work (model download and unpack, engine construction, synthesis,
//! WAV encoding) happens here, one [`Command`] at a time in arrival order.
//! The foreground talks to it only through the two channels in
//! [`protocol`](crate::protocol); the engine never leaves this thread.
//!
//! Failures never escape a task: they are logged as a [`WorkerEvent::Log`]
//! and the task's terminal event is omitted. In-flight work cannot be
//! cancelled; a caller who wants a different outcome waits for the current
//! task and enqueues a new command.

use std::ops::ControlFlow;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::backend::{EngineLoader, TtsBackend};
use crate::download::ModelInstaller;
use crate::error::VoiceError;
use crate::models::{VoiceCatalog, VoiceModelId};
use crate::protocol::{
    Command, CommandReceiver, CommandSender, EventReceiver, EventSender, Received, WorkerEvent,
    command_channel, event_channel,
};
use crate::wav;

/// Greeting logged when the worker loop starts.
pub const READY_MESSAGE: &str = "Ready. Select a voice to begin.";

/// The engine currently bound to a voice.
struct LoadedEngine {
    voice: VoiceModelId,
    backend: Box<dyn TtsBackend>,
}

// ── Executor ───────────────────────────────────────────────────────

/// Processes commands to completion, one at a time.
///
/// Usually driven by [`ExecutorHandle::spawn`]; [`handle`](Self::handle) can
/// also be called directly, which is how the tests exercise it.
pub struct TaskExecutor {
    catalog: VoiceCatalog,
    installer: Box<dyn ModelInstaller>,
    loader: Box<dyn EngineLoader>,
    engine: Option<LoadedEngine>,
    events: EventSender,
}

impl TaskExecutor {
    pub fn new(
        catalog: VoiceCatalog,
        installer: Box<dyn ModelInstaller>,
        loader: Box<dyn EngineLoader>,
        events: EventSender,
    ) -> Self {
        Self {
            catalog,
            installer,
            loader,
            engine: None,
            events,
        }
    }

    /// Name of the voice the engine is bound to, if any.
    pub fn active_voice(&self) -> Option<&str> {
        self.engine.as_ref().map(|engine| engine.voice.0.as_str())
    }

    /// Execute one command to completion.
    ///
    /// Returns `Break` for [`Command::Shutdown`].
    pub fn handle(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::LoadVoice { name } => {
                self.run_task("load_voice", |this| this.load_voice(&name));
            }
            Command::Generate { text, destination } => {
                self.run_task("generate", |this| this.generate(&text, destination));
            }
            Command::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Task boundary: every error or panic becomes a log line.
    fn run_task(
        &mut self,
        task: &'static str,
        body: impl FnOnce(&mut Self) -> Result<(), VoiceError>,
    ) {
        match panic::catch_unwind(AssertUnwindSafe(|| body(self))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(task, kind = ?e.kind(), error = %e, "Task failed");
                self.events.log(e.to_string());
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                tracing::error!(task, %reason, "Task panicked");
                // The engine may be mid-call; don't trust it afterwards.
                self.engine = None;
                self.events.log(format!("Error: {task} crashed: {reason}"));
            }
        }
    }

    fn load_voice(&mut self, name: &str) -> Result<(), VoiceError> {
        let model = self
            .catalog
            .get(name)
            .cloned()
            .ok_or_else(|| VoiceError::UnknownVoice(name.to_string()))?;

        if self.active_voice() == Some(name) {
            self.events.log(format!("Voice '{name}' already loaded."));
            self.events.send(WorkerEvent::VoiceReady {
                name: name.to_string(),
            });
            return Ok(());
        }

        let events = self.events.clone();
        let install_dir = self
            .installer
            .ensure_installed(&model, &mut |line: String| events.log(line))?;

        // At most one engine exists: release the old one before building the next.
        if let Some(previous) = self.engine.take() {
            tracing::debug!(voice = %previous.voice, "Releasing previous engine");
        }

        let backend = self.loader.load(&model, &install_dir)?;
        self.engine = Some(LoadedEngine {
            voice: model.id,
            backend,
        });

        self.events.log(format!("Loaded: {name}"));
        self.events.send(WorkerEvent::VoiceReady {
            name: name.to_string(),
        });
        Ok(())
    }

    fn generate(&mut self, text: &str, destination: Option<PathBuf>) -> Result<(), VoiceError> {
        let engine = self.engine.as_mut().ok_or(VoiceError::NotLoaded)?;

        tracing::info!(voice = %engine.voice, text_len = text.len(), "Generating speech");
        let started = Instant::now();
        let audio = engine.backend.synthesize(text)?;
        self.events
            .log(format!("Done ({:.2}s)", started.elapsed().as_secs_f64()));

        let (path, is_temporary) = match destination {
            Some(path) => (path, false),
            None => (wav::temp_wav_path()?, true),
        };

        if let Err(e) = wav::write_wav(&path, audio.sample_rate, &audio.samples) {
            if is_temporary {
                let _ = std::fs::remove_file(&path);
            }
            return Err(e);
        }

        self.events.send(WorkerEvent::AudioReady { path, is_temporary });
        Ok(())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

// ── Handle ─────────────────────────────────────────────────────────

/// Foreground handle to the worker thread.
///
/// Dropping the handle asks the worker to stop and waits for the in-flight
/// command (if any) to finish.
pub struct ExecutorHandle {
    commands: CommandSender,
    shutdown: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ExecutorHandle {
    /// Spawn the worker thread and return its handle plus the event receiver.
    ///
    /// `command_poll` bounds how long the worker waits for a command before
    /// re-checking the out-of-band shutdown flag.
    pub fn spawn(
        catalog: VoiceCatalog,
        installer: Box<dyn ModelInstaller>,
        loader: Box<dyn EngineLoader>,
        command_poll: Duration,
    ) -> Result<(Self, EventReceiver), VoiceError> {
        let (command_tx, command_rx) = command_channel();
        let (event_tx, event_rx) = event_channel();
        let executor = TaskExecutor::new(catalog, installer, loader, event_tx);

        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);

        let thread = thread::Builder::new()
            .name("speakeasy-worker".into())
            .spawn(move || run(executor, &command_rx, &flag, command_poll))?;

        Ok((
            Self {
                commands: command_tx,
                shutdown,
                thread: Some(thread),
            },
            event_rx,
        ))
    }

    /// Enqueue a command. Never blocks.
    pub fn send(&self, command: Command) -> Result<(), VoiceError> {
        self.commands.send(command)
    }

    /// A clone of the command sender, for the controller.
    pub fn sender(&self) -> CommandSender {
        self.commands.clone()
    }

    /// Ask the worker to stop after its in-flight command, skipping anything queued.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Whether the worker loop has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(thread::JoinHandle::is_finished)
    }

    /// Queue `Shutdown` behind any pending commands and wait for the worker to exit.
    pub fn shutdown(mut self) {
        let _ = self.commands.send(Command::Shutdown);
        self.join();
    }

    fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                tracing::error!("Voice worker thread panicked");
            }
        }
    }
}

impl Drop for ExecutorHandle {
    fn drop(&mut self) {
        // Best-effort: the thread may already be gone.
        self.request_shutdown();
        let _ = self.commands.send(Command::Shutdown);
        self.join();
    }
}

/// Body of the worker thread.
fn run(
    mut executor: TaskExecutor,
    commands: &CommandReceiver,
    shutdown: &AtomicBool,
    poll: Duration,
) {
    executor.events.log(READY_MESSAGE);

    while !shutdown.load(Ordering::SeqCst) {
        match commands.recv_timeout(poll) {
            Received::Command(command) => {
                tracing::debug!(?command, "Worker received command");
                if executor.handle(command).is_break() {
                    break;
                }
            }
            Received::Idle => {}
            Received::Closed => {
                tracing::debug!("All command senders dropped");
                break;
            }
        }
    }

    // The engine is dropped here, on the worker thread.
    tracing::debug!("Voice worker shutting down");
}
