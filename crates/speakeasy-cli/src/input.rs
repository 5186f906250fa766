//! Key bindings for the terminal front-end.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use speakeasy_voice::{Action, Affordances};

/// What a key press asks the front-end to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Generate and play the input text.
    Generate,
    /// Generate the input text into the output file.
    Save,
    Pause,
    Resume,
    Stop,
    Skip,
    /// Select the next catalog voice.
    NextVoice,
    Quit,
    /// The input text changed (or nothing happened).
    None,
}

impl KeyAction {
    /// The affordance gating this action, if any.
    const fn gate(&self) -> Option<Action> {
        match self {
            Self::Generate => Some(Action::Generate),
            Self::Save => Some(Action::Save),
            Self::Pause => Some(Action::Pause),
            Self::Resume => Some(Action::Resume),
            Self::Stop => Some(Action::Stop),
            Self::Skip => Some(Action::Skip),
            Self::NextVoice | Self::Quit | Self::None => None,
        }
    }
}

/// Map a key press to an action, editing `input` for printable keys.
///
/// Actions whose affordance is disabled come back as [`KeyAction::None`].
pub fn handle_key_event(key: KeyEvent, input: &mut String, affordances: Affordances) -> KeyAction {
    if key.kind == KeyEventKind::Release {
        return KeyAction::None;
    }

    let action = match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => KeyAction::Quit,
        (KeyCode::Char(c), m) if m.contains(KeyModifiers::CONTROL) => match c {
            'c' | 'd' => KeyAction::Quit,
            'p' => KeyAction::Pause,
            'r' => KeyAction::Resume,
            'x' => KeyAction::Stop,
            'f' => KeyAction::Skip,
            's' => KeyAction::Save,
            'u' => {
                input.clear();
                KeyAction::None
            }
            _ => KeyAction::None,
        },
        (KeyCode::Enter, _) => KeyAction::Generate,
        (KeyCode::Tab, _) => KeyAction::NextVoice,
        (KeyCode::Backspace, _) => {
            input.pop();
            KeyAction::None
        }
        (KeyCode::Char(c), _) => {
            input.push(c);
            KeyAction::None
        }
        _ => KeyAction::None,
    };

    match action.gate() {
        Some(gate) if !affordances.allows(gate) => KeyAction::None,
        _ => action,
    }
}
