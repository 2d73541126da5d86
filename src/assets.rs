//! Asset registry: text sprites and sound cues, loaded once at startup.
//!
//! Missing or unreadable files never fail the game. A missing image becomes
//! a placeholder sprite (the renderer paints a coloured block instead); a
//! missing sound becomes a silent handle. The simulation never looks at any
//! of this.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crossterm::{style::Print, QueueableCommand};
use tracing::{debug, info};

use crate::entities::{GameEvent, PowerUpKind};

/// Image key, file name, placeholder size in cells (cols, rows).
const IMAGES: &[(&str, &str, (u16, u16))] = &[
    ("player1", "player1.txt", (5, 2)),
    ("player2", "player2.txt", (5, 2)),
    ("bullet", "bullet.txt", (1, 1)),
    ("meteor", "meteor.txt", (3, 2)),
    ("powerup_life", "powerup_life.txt", (3, 2)),
    ("powerup_shot", "powerup_shot.txt", (3, 2)),
    ("powerup_tp", "powerup_tp.txt", (3, 2)),
    ("boss", "boss.txt", (16, 4)),
];

const SOUNDS: &[(&str, &str)] = &[
    ("intro", "intro.mp3"),
    ("shoot", "shoot.wav"),
    ("hit", "hit.wav"),
    ("point", "point.wav"),
    ("powerup_life", "powerup_life.wav"),
    ("powerup_shot", "powerup_shot.wav"),
    ("powerup_tp", "powerup_teleport.wav"),
    ("bg_phase1", "bg_phase1.mp3"),
    ("bg_phase2", "bg_phase2.mp3"),
    ("bg_phase3", "bg_phase3.mp3"),
    ("bg_phase4", "bg_phase4.mp3"),
    ("bg_boss", "bg_boss.mp3"),
];

// ── Images ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sprite {
    pub lines: Vec<String>,
    /// True when the file was missing and this is a blank stand-in.
    pub placeholder: bool,
}

impl Sprite {
    pub fn placeholder(cols: u16, rows: u16) -> Self {
        Sprite {
            lines: vec![" ".repeat(cols as usize); rows as usize],
            placeholder: true,
        }
    }

    pub fn width(&self) -> u16 {
        self.lines
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0) as u16
    }

    pub fn height(&self) -> u16 {
        self.lines.len() as u16
    }
}

/// Read a text sprite, falling back to a `size` placeholder.
pub fn load_image(path: &Path, size: (u16, u16)) -> Sprite {
    match fs::read_to_string(path) {
        Ok(raw) if !raw.trim().is_empty() => Sprite {
            lines: raw.lines().map(str::to_string).collect(),
            placeholder: false,
        },
        Ok(_) => {
            debug!(path = %path.display(), "empty sprite file, using placeholder");
            Sprite::placeholder(size.0, size.1)
        }
        Err(err) => {
            debug!(path = %path.display(), %err, "sprite unavailable, using placeholder");
            Sprite::placeholder(size.0, size.1)
        }
    }
}

// ── Sounds ───────────────────────────────────────────────────────────────────

/// A sound cue. The terminal can only ring its bell, so a loaded sound is a
/// bell and a missing one is silence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sound {
    source: Option<PathBuf>,
}

impl Sound {
    pub fn silent() -> Self {
        Sound { source: None }
    }

    pub fn is_silent(&self) -> bool {
        self.source.is_none()
    }

    pub fn play<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        if self.source.is_some() {
            out.queue(Print('\u{7}'))?;
        }
        Ok(())
    }
}

pub fn load_sound(path: &Path) -> Sound {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Sound {
            source: Some(path.to_path_buf()),
        },
        _ => {
            debug!(path = %path.display(), "sound unavailable, using silence");
            Sound::silent()
        }
    }
}

// ── Registry ─────────────────────────────────────────────────────────────────

/// Background track for a phase.
pub fn music_for_phase(phase: u8) -> &'static str {
    match phase {
        1 => "bg_phase1",
        2 => "bg_phase2",
        3 => "bg_phase3",
        4 => "bg_phase4",
        _ => "bg_boss",
    }
}

pub fn powerup_key(kind: PowerUpKind) -> &'static str {
    match kind {
        PowerUpKind::Life => "powerup_life",
        PowerUpKind::ShotBoost => "powerup_shot",
        PowerUpKind::TeleportShield => "powerup_tp",
    }
}

/// Built once in `main`, then only borrowed.
#[derive(Clone, Debug)]
pub struct AssetRegistry {
    images: HashMap<&'static str, Sprite>,
    sounds: HashMap<&'static str, Sound>,
    fallback_image: Sprite,
    silence: Sound,
}

impl AssetRegistry {
    pub fn load(dir: &Path) -> Self {
        let images: HashMap<_, _> = IMAGES
            .iter()
            .map(|&(key, file, size)| (key, load_image(&dir.join(file), size)))
            .collect();
        let sounds: HashMap<_, _> = SOUNDS
            .iter()
            .map(|&(key, file)| (key, load_sound(&dir.join(file))))
            .collect();

        info!(
            dir = %dir.display(),
            images = images.values().filter(|s| !s.placeholder).count(),
            sounds = sounds.values().filter(|s| !s.is_silent()).count(),
            "assets loaded"
        );

        AssetRegistry {
            images,
            sounds,
            fallback_image: Sprite::placeholder(1, 1),
            silence: Sound::silent(),
        }
    }

    pub fn image(&self, key: &str) -> &Sprite {
        self.images.get(key).unwrap_or(&self.fallback_image)
    }

    pub fn sound(&self, key: &str) -> &Sound {
        self.sounds.get(key).unwrap_or(&self.silence)
    }

    /// Sound cue for a simulation event, if it has one.
    pub fn sound_for(&self, event: GameEvent) -> Option<&Sound> {
        let key = match event {
            GameEvent::Shot => "shoot",
            GameEvent::Hit => "hit",
            GameEvent::Point => "point",
            GameEvent::PowerUp(kind) => powerup_key(kind),
            GameEvent::PhaseStarted(_)
            | GameEvent::BossSpawned
            | GameEvent::Victory
            | GameEvent::Defeat => return None,
        };
        Some(self.sound(key))
    }
}
