//! Headless test mode: load a voice, synthesize one text to a file, exit.

use std::path::{Path, PathBuf};

use speakeasy_voice::{Command, EventReceiver, ExecutorHandle, WorkerEvent};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Queue load, generate, and shutdown, then print worker output until it exits.
///
/// Fails with [`CliError::NoAudio`] when the worker never reports the file.
pub fn run(ctx: CliContext, text: &str, out: &Path) -> Result<PathBuf, CliError> {
    let CliContext {
        settings,
        initial_voice,
        worker,
        events,
        ..
    } = ctx;

    println!("Voice: {initial_voice}");
    worker.send(Command::load_voice(&initial_voice))?;
    worker.send(Command::generate(text, Some(out.to_path_buf())))?;
    worker.send(Command::Shutdown)?;

    let produced = follow(&worker, &events, settings.effective_result_poll(), |line| {
        println!("{line}");
    });
    worker.shutdown();

    let path = produced.ok_or(CliError::NoAudio)?;
    println!("Wrote {}", path.display());
    Ok(path)
}

/// Report events until the worker has exited and the channel is empty.
///
/// Returns the path of the last persistent `AudioReady`.
fn follow(
    worker: &ExecutorHandle,
    events: &EventReceiver,
    poll: std::time::Duration,
    mut report: impl FnMut(&str),
) -> Option<PathBuf> {
    let mut produced = None;
    loop {
        match events.recv_timeout(poll) {
            Some(WorkerEvent::Log { message }) => report(&message),
            Some(WorkerEvent::VoiceReady { name }) => {
                tracing::debug!(voice = %name, "Voice ready");
            }
            Some(WorkerEvent::AudioReady { path, .. }) => produced = Some(path),
            None if worker.is_finished() => break,
            None => {}
        }
    }
    produced
}
