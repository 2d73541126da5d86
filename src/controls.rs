//! Key bindings, held-key tracking and the quit-confirmation rule.
//!
//! Nothing here touches the terminal; `main` feeds crossterm events in and
//! applies the resulting actions to the run state.

use std::collections::HashMap;

use crossterm::event::KeyCode;

use crate::compute::Direction;

// ── Held keys ────────────────────────────────────────────────────────────────

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames. Covers terminals that don't emit key-release events:
/// OS key-repeat refreshes the entry well before it expires.
pub const HOLD_WINDOW: u64 = 8;

/// Maps each held key to the frame it was last seen (press or repeat).
#[derive(Clone, Debug, Default)]
pub struct HeldKeys {
    last_seen: HashMap<KeyCode, u64>,
}

impl HeldKeys {
    pub fn press(&mut self, code: KeyCode, frame: u64) {
        self.last_seen.insert(normalize(code), frame);
    }

    pub fn release(&mut self, code: KeyCode) {
        self.last_seen.remove(&normalize(code));
    }

    pub fn clear(&mut self) {
        self.last_seen.clear();
    }

    pub fn is_held(&self, code: KeyCode, frame: u64) -> bool {
        self.last_seen
            .get(&normalize(code))
            .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
            .unwrap_or(false)
    }

    pub fn any_held(&self, codes: &[KeyCode], frame: u64) -> bool {
        codes.iter().any(|&c| self.is_held(c, frame))
    }
}

/// Letters are tracked case-insensitively so Shift doesn't drop a held key.
fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

// ── Per-player bindings ──────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug)]
pub struct PlayerKeys {
    pub left: &'static [KeyCode],
    pub right: &'static [KeyCode],
    pub up: &'static [KeyCode],
    pub down: &'static [KeyCode],
    pub fire: &'static [KeyCode],
}

const P1_KEYS: PlayerKeys = PlayerKeys {
    left: &[KeyCode::Left],
    right: &[KeyCode::Right],
    up: &[KeyCode::Up],
    down: &[KeyCode::Down],
    fire: &[KeyCode::Char(' ')],
};

const P2_KEYS: PlayerKeys = PlayerKeys {
    left: &[KeyCode::Char('a')],
    right: &[KeyCode::Char('d')],
    up: &[KeyCode::Char('w')],
    down: &[KeyCode::Char('s')],
    fire: &[KeyCode::Char('f')],
};

pub fn player_keys(number: u8) -> PlayerKeys {
    if number == 2 {
        P2_KEYS
    } else {
        P1_KEYS
    }
}

impl PlayerKeys {
    /// Directions whose keys are currently held. Opposite keys both apply.
    pub fn directions(&self, held: &HeldKeys, frame: u64) -> Vec<Direction> {
        [
            (self.left, Direction::Left),
            (self.right, Direction::Right),
            (self.up, Direction::Up),
            (self.down, Direction::Down),
        ]
        .into_iter()
        .filter(|(codes, _)| held.any_held(codes, frame))
        .map(|(_, dir)| dir)
        .collect()
    }

    pub fn firing(&self, held: &HeldKeys, frame: u64) -> bool {
        held.any_held(self.fire, frame)
    }
}

// ── One-shot keys ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hotkey {
    Pause,
    Save,
    Load,
    AddPlayerTwo,
    ToggleMouse,
    Quit,
}

pub fn hotkey(code: KeyCode) -> Option<Hotkey> {
    match normalize(code) {
        KeyCode::Char('p') => Some(Hotkey::Pause),
        KeyCode::F(1) => Some(Hotkey::Save),
        KeyCode::F(2) => Some(Hotkey::Load),
        KeyCode::Char('2') => Some(Hotkey::AddPlayerTwo),
        KeyCode::Char('m') => Some(Hotkey::ToggleMouse),
        KeyCode::Esc => Some(Hotkey::Quit),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    InsertCoin,
    Start,
    ToggleHighScores,
    TogglePlayerTwo,
    ToggleMouse,
    LoadSave,
    Quit,
}

pub fn menu_action(code: KeyCode) -> Option<MenuAction> {
    match normalize(code) {
        KeyCode::Char('c') => Some(MenuAction::InsertCoin),
        KeyCode::Enter => Some(MenuAction::Start),
        KeyCode::Char('h') => Some(MenuAction::ToggleHighScores),
        KeyCode::Char('2') => Some(MenuAction::TogglePlayerTwo),
        KeyCode::Char('m') => Some(MenuAction::ToggleMouse),
        KeyCode::Char('l') => Some(MenuAction::LoadSave),
        KeyCode::Esc | KeyCode::Char('q') => Some(MenuAction::Quit),
        _ => None,
    }
}

/// Second keypress after a quit request: only Esc confirms, anything else
/// cancels.
pub fn confirms_quit(code: KeyCode) -> bool {
    code == KeyCode::Esc
}
