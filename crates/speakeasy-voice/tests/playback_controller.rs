//! Integration tests for the foreground playback state machine.
//!
//! Worker results are injected straight into the event channel and the audio
//! device is a recording mock, so the controller is tested without a worker
//! thread or sound hardware.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use speakeasy_voice::{
    AudioOutput, Command, Notice, PlaybackController, PlaybackState, VoiceError, WorkerEvent,
    protocol::{CommandReceiver, EventSender, Received, command_channel, event_channel},
};

// ── Mock device ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Load(PathBuf),
    Play,
    Pause,
    Unpause,
    Stop,
    Skip,
}

#[derive(Default)]
struct DeviceState {
    calls: Vec<Call>,
    refuse_loads: bool,
    refuse_seek: bool,
    finished: bool,
}

#[derive(Clone, Default)]
struct MockOutput(Rc<RefCell<DeviceState>>);

impl MockOutput {
    fn calls(&self) -> Vec<Call> {
        self.0.borrow().calls.clone()
    }

    fn clear(&self) {
        self.0.borrow_mut().calls.clear();
    }

    fn record(&self, call: Call) {
        self.0.borrow_mut().calls.push(call);
    }
}

impl AudioOutput for MockOutput {
    fn load(&mut self, path: &Path) -> Result<(), VoiceError> {
        self.record(Call::Load(path.to_path_buf()));
        if self.0.borrow().refuse_loads {
            return Err(VoiceError::Playback("unsupported format".to_string()));
        }
        self.0.borrow_mut().finished = false;
        Ok(())
    }

    fn play(&mut self) {
        self.record(Call::Play);
    }

    fn pause(&mut self) {
        self.record(Call::Pause);
    }

    fn unpause(&mut self) {
        self.record(Call::Unpause);
    }

    fn stop(&mut self) {
        self.record(Call::Stop);
    }

    fn skip(&mut self, _step: Duration) -> Result<(), VoiceError> {
        self.record(Call::Skip);
        if self.0.borrow().refuse_seek {
            return Err(VoiceError::SeekUnsupported("not seekable".to_string()));
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.0.borrow().finished
    }
}

// ── Helpers ────────────────────────────────────────────────────────

struct Harness {
    controller: PlaybackController,
    commands: CommandReceiver,
    worker: EventSender,
    device: MockOutput,
    dir: tempfile::TempDir,
}

fn harness() -> Harness {
    let (command_tx, command_rx) = command_channel();
    let (event_tx, event_rx) = event_channel();
    let device = MockOutput::default();
    let controller = PlaybackController::new(
        command_tx,
        event_rx,
        Box::new(device.clone()),
        Duration::from_secs(10),
    );
    Harness {
        controller,
        commands: command_rx,
        worker: event_tx,
        device,
        dir: tempfile::tempdir().unwrap(),
    }
}

impl Harness {
    /// Select `name` and let the worker report it ready.
    fn ready(&mut self, name: &str) {
        self.controller.select_voice(name).unwrap();
        self.worker.send(WorkerEvent::VoiceReady {
            name: name.to_string(),
        });
        self.controller.poll();
        self.sent();
    }

    fn sent(&self) -> Vec<Command> {
        let mut sent = Vec::new();
        while let Received::Command(command) = self.commands.recv_timeout(Duration::ZERO) {
            sent.push(command);
        }
        sent
    }

    /// A real file standing in for a freshly synthesized temporary artifact.
    fn temp_artifact(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, b"RIFF").unwrap();
        path
    }

    /// Deliver a temporary artifact and poll it into the controller.
    fn play(&mut self, name: &str) -> PathBuf {
        let path = self.temp_artifact(name);
        self.worker.send(WorkerEvent::AudioReady {
            path: path.clone(),
            is_temporary: true,
        });
        self.controller.poll();
        path
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[test]
fn initial_state_is_stopped_with_generation_enabled() {
    let h = harness();
    let affordances = h.controller.affordances();

    assert_eq!(h.controller.state(), PlaybackState::Stopped);
    assert!(affordances.generate);
    assert!(!affordances.save, "no voice is ready yet");
    assert!(!affordances.pause && !affordances.resume && !affordances.stop);
    assert!(h.controller.artifact().is_none());
}

#[test]
fn temporary_audio_starts_playing() {
    let mut h = harness();
    let path = h.play("a.wav");

    assert_eq!(h.controller.state(), PlaybackState::Playing);
    assert_eq!(h.controller.artifact().map(|a| &a.path), Some(&path));
    assert_eq!(
        h.device.calls(),
        vec![Call::Stop, Call::Load(path), Call::Play]
    );
    let affordances = h.controller.affordances();
    assert!(affordances.pause && affordances.stop && affordances.skip);
    assert!(!affordances.resume);
}

#[test]
fn persistent_audio_does_not_touch_playback() {
    let mut h = harness();
    h.worker.send(WorkerEvent::AudioReady {
        path: PathBuf::from("/out.wav"),
        is_temporary: false,
    });

    let notices = h.controller.poll();

    assert_eq!(notices, vec![Notice::Saved(PathBuf::from("/out.wav"))]);
    assert_eq!(h.controller.state(), PlaybackState::Stopped);
    assert!(h.device.calls().is_empty());
}

#[test]
fn stop_while_stopped_is_a_no_op() {
    let mut h = harness();
    assert!(!h.controller.stop());
    assert!(!h.controller.stop());
    assert_eq!(h.controller.state(), PlaybackState::Stopped);
    assert!(h.device.calls().is_empty());
}

#[test]
fn pause_and_resume_follow_the_state() {
    let mut h = harness();
    assert!(!h.controller.pause());
    assert!(!h.controller.resume());

    h.play("a.wav");
    h.device.clear();

    assert!(!h.controller.resume());
    assert!(h.controller.pause());
    assert_eq!(h.controller.state(), PlaybackState::Paused);
    assert!(!h.controller.pause());
    assert!(h.controller.affordances().resume);

    assert!(h.controller.resume());
    assert_eq!(h.controller.state(), PlaybackState::Playing);
    assert_eq!(h.device.calls(), vec![Call::Pause, Call::Unpause]);
}

#[test]
fn stop_from_paused_releases_the_temporary_file() {
    let mut h = harness();
    let path = h.play("a.wav");
    h.controller.pause();

    assert!(h.controller.stop());
    assert_eq!(h.controller.state(), PlaybackState::Stopped);
    assert!(h.controller.artifact().is_none());
    assert!(!path.exists());
}

#[test]
fn new_audio_replaces_the_previous_artifact() {
    let mut h = harness();
    let first = h.play("a.wav");
    h.controller.pause();
    let second = h.play("b.wav");

    assert_eq!(h.controller.state(), PlaybackState::Playing);
    assert_eq!(h.controller.artifact().map(|a| &a.path), Some(&second));
    assert!(!first.exists());
    assert!(second.exists());
}

#[test]
fn generate_stops_playback_and_enqueues_a_temporary_request() {
    let mut h = harness();
    let path = h.play("a.wav");

    assert!(h.controller.generate("  hello  ").unwrap());

    assert_eq!(h.controller.state(), PlaybackState::Stopped);
    assert!(!path.exists());
    assert_eq!(h.sent(), vec![Command::generate("hello", None)]);
    assert!(h.controller.is_busy());
    assert!(!h.controller.affordances().generate);
}

#[test]
fn blank_text_is_not_sent() {
    let mut h = harness();
    h.ready("V1");
    assert!(!h.controller.generate("   ").unwrap());
    assert!(!h.controller.save("", Path::new("/out.wav")).unwrap());
    assert!(h.sent().is_empty());
}

#[test]
fn generate_is_ignored_while_a_task_is_outstanding() {
    let mut h = harness();
    h.controller.select_voice("V1").unwrap();

    assert!(!h.controller.generate("hello").unwrap());
    assert_eq!(h.sent(), vec![Command::load_voice("V1")]);
}

#[test]
fn voice_ready_re_enables_generation() {
    let mut h = harness();
    h.controller.select_voice("V1").unwrap();
    h.worker.send(WorkerEvent::log("Loaded: V1"));
    h.worker.send(WorkerEvent::VoiceReady {
        name: "V1".to_string(),
    });

    let notices = h.controller.poll();

    assert_eq!(
        notices,
        vec![
            Notice::Log("Loaded: V1".to_string()),
            Notice::VoiceReady("V1".to_string())
        ]
    );
    assert_eq!(h.controller.ready_voice(), Some("V1"));
    assert!(h.controller.affordances().generate);
    assert!(h.controller.affordances().save);
}

#[test]
fn a_failure_log_re_enables_generation() {
    let mut h = harness();
    h.controller.select_voice("Nonexistent").unwrap();
    assert!(!h.controller.affordances().generate);

    h.worker.send(WorkerEvent::log("Error: unknown voice 'Nonexistent'"));
    h.controller.poll();

    assert!(h.controller.affordances().generate);
    assert_eq!(h.controller.ready_voice(), None);
    assert_eq!(h.controller.selected_voice(), None);
}

#[test]
fn failed_switch_falls_back_to_the_ready_voice() {
    let mut h = harness();
    h.ready("V1");

    h.controller.select_voice("V2").unwrap();
    assert_eq!(h.controller.selected_voice(), Some("V2"));

    h.worker.send(WorkerEvent::log("Error: engine load failed: V2 is corrupt"));
    h.controller.poll();

    assert_eq!(h.controller.selected_voice(), Some("V1"));
    assert_eq!(h.controller.ready_voice(), Some("V1"));
    assert!(h.controller.affordances().save);
}

#[test]
fn save_sends_a_destination_and_keeps_playing() {
    let mut h = harness();
    h.ready("V1");
    h.play("a.wav");

    assert!(h.controller.save("hello", Path::new("/out.wav")).unwrap());

    assert_eq!(h.controller.state(), PlaybackState::Playing);
    assert_eq!(
        h.sent(),
        vec![Command::generate("hello", Some(PathBuf::from("/out.wav")))]
    );
}

#[test]
fn unplayable_audio_is_reported_and_discarded() {
    let mut h = harness();
    h.device.0.borrow_mut().refuse_loads = true;
    let path = h.temp_artifact("bad.wav");
    h.worker.send(WorkerEvent::AudioReady {
        path: path.clone(),
        is_temporary: true,
    });

    let notices = h.controller.poll();

    assert!(matches!(&notices[..], [Notice::Playback(m)] if m.contains("unsupported")));
    assert_eq!(h.controller.state(), PlaybackState::Stopped);
    assert!(!path.exists());
    assert!(h.controller.affordances().generate);
}

#[test]
fn playback_ends_on_its_own() {
    let mut h = harness();
    let path = h.play("a.wav");
    h.device.0.borrow_mut().finished = true;

    let notices = h.controller.poll();

    assert_eq!(notices, vec![Notice::Finished]);
    assert_eq!(h.controller.state(), PlaybackState::Stopped);
    assert!(!path.exists());
}

#[test]
fn paused_audio_never_counts_as_finished() {
    let mut h = harness();
    h.play("a.wav");
    h.controller.pause();
    h.device.0.borrow_mut().finished = true;

    assert!(h.controller.poll().is_empty());
    assert_eq!(h.controller.state(), PlaybackState::Paused);
}

#[test]
fn skip_is_best_effort() {
    let mut h = harness();
    assert!(h.controller.skip().is_none());
    assert!(h.device.calls().is_empty());

    h.play("a.wav");
    assert!(h.controller.skip().is_none());

    h.device.0.borrow_mut().refuse_seek = true;
    let notice = h.controller.skip();
    assert!(matches!(notice, Some(Notice::Playback(m)) if m.contains("not seekable")));
    assert_eq!(h.controller.state(), PlaybackState::Playing);
}

#[test]
fn dropping_the_controller_removes_the_temporary_file() {
    let mut h = harness();
    let path = h.play("a.wav");
    drop(h.controller);
    assert!(!path.exists());
}

#[test]
fn late_audio_is_discarded_at_exit() {
    let mut h = harness();
    h.ready("V1");
    assert!(h.controller.generate("hello").unwrap());
    h.device.clear();

    let late = h.temp_artifact("late.wav");
    let kept = h.temp_artifact("kept.wav");
    h.worker.send(WorkerEvent::log("Done (0.10s)"));
    h.worker.send(WorkerEvent::AudioReady {
        path: late.clone(),
        is_temporary: true,
    });
    h.worker.send(WorkerEvent::AudioReady {
        path: kept.clone(),
        is_temporary: false,
    });

    h.controller.discard_events();

    assert!(!late.exists());
    assert!(kept.exists());
    assert_eq!(h.controller.state(), PlaybackState::Stopped);
    assert!(!h.controller.is_busy());
    assert!(h.device.calls().is_empty());
    assert!(h.controller.poll().is_empty());
}
