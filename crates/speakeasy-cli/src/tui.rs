//! Interactive terminal front-end.
//!
//! A raw-mode line interface: worker status lines scroll above a single
//! status line that shows the voice, the transport state, the enabled
//! controls, and the input text. The loop never blocks on the worker; it
//! waits for a key press for at most the result-poll interval and drains
//! worker results every turn.

use std::io::{self, Stdout, Write};
use std::path::Path;

use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, Event};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{execute, queue};
use speakeasy_voice::{
    Affordances, Notice, PlaybackController, PlaybackState, VoiceCatalog, default_output,
};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::input::{KeyAction, handle_key_event};

const HELP: &str = "Enter: play  ^S: save  ^P: pause  ^R: resume  ^X: stop  ^F: skip  \
                    Tab: next voice  Esc: quit";

/// Restores cooked mode when dropped, including on early return.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Run the interactive session until the user quits.
pub fn run(ctx: CliContext, out: &Path) -> Result<(), CliError> {
    let CliContext {
        settings,
        catalog,
        initial_voice,
        worker,
        events,
    } = ctx;

    let mut controller = PlaybackController::new(
        worker.sender(),
        events,
        default_output(),
        settings.effective_skip(),
    );
    controller.select_voice(&initial_voice)?;

    let mut stdout = io::stdout();
    let guard = RawModeGuard::enable()?;
    let result = event_loop(
        &mut controller,
        &catalog,
        out,
        &mut stdout,
        settings.effective_result_poll(),
    );

    let _ = print_line(&mut stdout, "Shutting down...");
    drop(guard);

    controller.stop();
    worker.request_shutdown();
    worker.shutdown();
    // The worker has exited; anything it produced meanwhile is already queued.
    controller.discard_events();
    drop(controller);
    result
}

fn event_loop(
    controller: &mut PlaybackController,
    catalog: &VoiceCatalog,
    out: &Path,
    stdout: &mut Stdout,
    poll: std::time::Duration,
) -> Result<(), CliError> {
    let mut input = String::new();
    print_line(stdout, HELP)?;

    loop {
        for notice in controller.poll() {
            if let Some(line) = describe(&notice) {
                print_line(stdout, &line)?;
            }
        }
        draw_status(stdout, controller, &input)?;

        if !event::poll(poll)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };

        match handle_key_event(key, &mut input, controller.affordances()) {
            KeyAction::Quit => return Ok(()),
            KeyAction::Generate => {
                controller.generate(&input)?;
            }
            KeyAction::Save => {
                if controller.save(&input, out)? {
                    print_line(stdout, &format!("Saving to {}...", out.display()))?;
                }
            }
            KeyAction::Pause => {
                controller.pause();
            }
            KeyAction::Resume => {
                controller.resume();
            }
            KeyAction::Stop => {
                controller.stop();
            }
            KeyAction::Skip => {
                if let Some(line) = controller.skip().as_ref().and_then(describe) {
                    print_line(stdout, &line)?;
                }
            }
            KeyAction::NextVoice => {
                let current = controller.selected_voice().unwrap_or_default().to_string();
                if let Some(next) = catalog.next_after(&current) {
                    let next = next.to_string();
                    print_line(stdout, &format!("Loading {next}..."))?;
                    controller.select_voice(&next)?;
                }
            }
            KeyAction::None => {}
        }
    }
}

/// The line to show for a notice, if any.
fn describe(notice: &Notice) -> Option<String> {
    match notice {
        Notice::Log(line) | Notice::Playback(line) => Some(line.clone()),
        Notice::Saved(path) => Some(format!("Saved: {}", path.display())),
        Notice::VoiceReady(_) | Notice::Finished => None,
    }
}

fn status_line(
    voice: Option<&str>,
    busy: bool,
    state: PlaybackState,
    affordances: Affordances,
    input: &str,
) -> String {
    let voice = voice.unwrap_or("no voice");
    let activity = if busy { " (working)" } else { "" };

    let controls: Vec<&str> = [
        (affordances.generate, "play"),
        (affordances.save, "save"),
        (affordances.pause, "pause"),
        (affordances.resume, "resume"),
        (affordances.stop, "stop"),
        (affordances.skip, "skip"),
    ]
    .into_iter()
    .filter_map(|(enabled, name)| enabled.then_some(name))
    .collect();

    format!(
        "[{voice}{activity} | {state:?} | {}] > {input}",
        controls.join(" ")
    )
}

fn draw_status(
    stdout: &mut Stdout,
    controller: &PlaybackController,
    input: &str,
) -> io::Result<()> {
    let line = status_line(
        controller.selected_voice(),
        controller.is_busy(),
        controller.state(),
        controller.affordances(),
        input,
    );
    queue!(
        stdout,
        MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        Print(line)
    )?;
    stdout.flush()
}

/// Print `line` above the status line.
fn print_line(stdout: &mut Stdout, line: &str) -> io::Result<()> {
    execute!(
        stdout,
        MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        Print(line),
        Print("\r\n")
    )
}
