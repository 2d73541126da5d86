//! Save-game snapshot: conversion between the live `RunState` and a flat,
//! serde-friendly record, plus the JSON file helpers shared with the
//! high-score table.
//!
//! The record is versionless. Every field has a default, so older or
//! hand-edited files still load.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{
    BOSS_MAX_CORE, BOSS_MAX_LEFT, BOSS_MAX_RIGHT, BOSS_PHASE, HEIGHT, MAX_SAVED_LIVES,
    MAX_SAVED_SCORE, MAX_SHOT_LEVEL, METEOR_SIZE, PHASE_START_DELAY_MS, PLAYER_H,
    PLAYER_START_LIVES, PLAYER_W, WIDTH,
};
use crate::entities::{
    Boss, GameEvent, Meteor, Player, PowerUp, PowerUpKind, Rect, RunState, RunStatus,
};
use crate::spawner::meteor_speed_range;

// ── Record types ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSnapshot {
    pub number: u8,
    /// Top-left corner.
    pub x: f32,
    pub y: f32,
    pub lives: u32,
    pub shot_level: u8,
    /// Invulnerability left, in ms.
    pub inv_rem: u32,
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        PlayerSnapshot {
            number: 1,
            x: WIDTH / 2.0 - PLAYER_W / 2.0,
            y: HEIGHT - 60.0 - PLAYER_H / 2.0,
            lives: PLAYER_START_LIVES,
            shot_level: 1,
            inv_rem: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeteorSnapshot {
    pub x: f32,
    pub y: f32,
    pub speed: f32,
}

impl Default for MeteorSnapshot {
    fn default() -> Self {
        MeteorSnapshot {
            x: 0.0,
            y: -50.0,
            speed: 4.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpSnapshot {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: PowerUpKind,
}

impl Default for PowerUpSnapshot {
    fn default() -> Self {
        PowerUpSnapshot {
            x: 0.0,
            y: -100.0,
            kind: PowerUpKind::Life,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossSnapshot {
    pub hp_left: u32,
    pub hp_core: u32,
    pub hp_right: u32,
}

impl Default for BossSnapshot {
    fn default() -> Self {
        BossSnapshot {
            hp_left: BOSS_MAX_LEFT,
            hp_core: BOSS_MAX_CORE,
            hp_right: BOSS_MAX_RIGHT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSnapshot {
    pub phase: u8,
    pub phase_score: u32,
    pub player2_active: bool,
    pub mouse_control: bool,
    /// Run clock (ms) at which the current phase began.
    pub phase_timer_start: Option<u64>,
    pub players: Vec<PlayerSnapshot>,
    pub meteors: Vec<MeteorSnapshot>,
    pub powerups: Vec<PowerUpSnapshot>,
    pub boss: Option<BossSnapshot>,
}

impl Default for RunSnapshot {
    fn default() -> Self {
        RunSnapshot {
            phase: 1,
            phase_score: 0,
            player2_active: false,
            mouse_control: false,
            phase_timer_start: None,
            players: Vec::new(),
            meteors: Vec::new(),
            powerups: Vec::new(),
            boss: None,
        }
    }
}

// ── Conversion ───────────────────────────────────────────────────────────────

pub fn make_snapshot(state: &RunState) -> RunSnapshot {
    RunSnapshot {
        phase: state.phase,
        phase_score: state.phase_score,
        player2_active: state.player2_active,
        mouse_control: state.mouse_control,
        phase_timer_start: Some(state.phase_started_at_ms),
        players: state
            .players
            .iter()
            .map(|p| PlayerSnapshot {
                number: p.number,
                x: p.rect.x,
                y: p.rect.y,
                lives: p.lives,
                shot_level: p.shot_level,
                inv_rem: p.invulnerable_ms,
            })
            .collect(),
        meteors: state
            .meteors
            .iter()
            .map(|m| MeteorSnapshot {
                x: m.rect.x,
                y: m.rect.y,
                speed: m.speed,
            })
            .collect(),
        powerups: state
            .powerups
            .iter()
            .map(|pu| PowerUpSnapshot {
                x: pu.rect.x,
                y: pu.rect.y,
                kind: pu.kind,
            })
            .collect(),
        boss: state.boss.as_ref().map(|b| BossSnapshot {
            hp_left: b.hp_left,
            hp_core: b.hp_core,
            hp_right: b.hp_right,
        }),
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Rebuild a live run from a snapshot. The restored phase starts over with
/// its countdown; projectiles in flight are not part of the record.
///
/// Hand-edited values are pulled back into range: lives and score are
/// capped, meteor speeds are kept inside the phase's speed range.
pub fn restore_snapshot(snapshot: &RunSnapshot, credits: u32) -> RunState {
    let phase = snapshot.phase.clamp(1, BOSS_PHASE);
    let fallback = PlayerSnapshot::default();

    let mut players: Vec<Player> = Vec::new();
    for ps in &snapshot.players {
        if !(1..=2).contains(&ps.number) || players.iter().any(|p| p.number == ps.number) {
            debug!(number = ps.number, "skipping player entry in save");
            continue;
        }
        let mut player = Player::new(ps.number, 0.0, 0.0);
        let x = finite_or(ps.x, fallback.x);
        let y = finite_or(ps.y, fallback.y);
        player.rect = Rect::new(x, y, PLAYER_W, PLAYER_H);
        player.lives = ps.lives.min(MAX_SAVED_LIVES);
        player.shot_level = ps.shot_level.clamp(1, MAX_SHOT_LEVEL);
        player.invulnerable_ms = ps.inv_rem;
        players.push(player);
    }
    if players.is_empty() {
        let mut player = Player::new(1, 0.0, 0.0);
        player.rect = Rect::new(fallback.x, fallback.y, PLAYER_W, PLAYER_H);
        players.push(player);
    }
    players.sort_by_key(|p| p.number);

    let (meteors, powerups) = if phase >= BOSS_PHASE {
        (Vec::new(), Vec::new())
    } else {
        let (low, high) = meteor_speed_range(phase);
        let (low, high) = (low as f32, high as f32);
        (
            snapshot
                .meteors
                .iter()
                .map(|m| Meteor {
                    rect: Rect::new(
                        finite_or(m.x, 0.0),
                        finite_or(m.y, -50.0),
                        METEOR_SIZE,
                        METEOR_SIZE,
                    ),
                    speed: finite_or(m.speed, low).clamp(low, high),
                })
                .collect(),
            snapshot
                .powerups
                .iter()
                .map(|pu| PowerUp::new(finite_or(pu.x, 0.0), finite_or(pu.y, -100.0), pu.kind))
                .collect(),
        )
    };

    let boss = snapshot.boss.as_ref().map(|bs| {
        let mut boss = Boss::spawn();
        boss.hp_left = bs.hp_left.min(boss.max_left);
        boss.hp_core = bs.hp_core.min(boss.max_core);
        boss.hp_right = bs.hp_right.min(boss.max_right);
        boss
    });

    let phase_start = snapshot.phase_timer_start.unwrap_or(0);
    let player2_active = snapshot.player2_active || players.iter().any(|p| p.number == 2);

    RunState {
        phase,
        phase_score: snapshot.phase_score.min(MAX_SAVED_SCORE),
        status: RunStatus::Countdown {
            remaining_ms: PHASE_START_DELAY_MS,
        },
        players,
        meteors,
        powerups,
        boss,
        credits,
        paused: false,
        player2_active,
        mouse_control: snapshot.mouse_control,
        clock_ms: phase_start,
        phase_started_at_ms: phase_start,
        events: vec![GameEvent::PhaseStarted(phase)],
    }
}

// ── Files ────────────────────────────────────────────────────────────────────

pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating {}", parent.display()))?;
    }
    let encoded = serde_json::to_vec_pretty(value).context("failed encoding JSON")?;
    fs::write(path, encoded).with_context(|| format!("failed writing {}", path.display()))
}

/// `Ok(None)` when the file does not exist; `Err` when it exists but can't
/// be read or parsed.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
    let value = serde_json::from_slice(&raw)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;
    Ok(Some(value))
}

pub fn save_run(path: &Path, state: &RunState) -> Result<()> {
    save_json(path, &make_snapshot(state))
}

pub fn load_run(path: &Path, credits: u32) -> Result<Option<RunState>> {
    let snapshot: Option<RunSnapshot> = load_json(path)?;
    Ok(snapshot.map(|s| restore_snapshot(&s, credits)))
}
