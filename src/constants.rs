//! Tuning constants shared by the simulation and the renderer.
//!
//! All distances are in world pixels (the world is a fixed 800x600 field),
//! all speeds in pixels per tick, all durations in milliseconds.

// ── World ─────────────────────────────────────────────────────────────────────

pub const WIDTH: f32 = 800.0;
pub const HEIGHT: f32 = 600.0;

/// Simulation step. 16 ms ≈ 60 ticks per second.
pub const TICK_MS: u32 = 16;

// ── Phases ────────────────────────────────────────────────────────────────────

pub const BOSS_PHASE: u8 = 5;
pub const PHASE_START_DELAY_MS: u32 = 3000;

/// Score needed to leave phases 1..=4. The boss phase has no target.
pub fn phase_target(phase: u8) -> Option<u32> {
    match phase {
        1 => Some(50),
        2 => Some(75),
        3 => Some(100),
        4 => Some(125),
        _ => None,
    }
}

// ── Player ────────────────────────────────────────────────────────────────────

pub const PLAYER_W: f32 = 80.0;
pub const PLAYER_H: f32 = 60.0;
pub const PLAYER_SPEED: f32 = 7.0;
pub const PLAYER_START_LIVES: u32 = 5;
pub const MAX_SHOT_LEVEL: u8 = 3;
pub const BULLET_LIMIT: usize = 9;
pub const INVULN_DURATION_MS: u32 = 2000;
pub const TP_SHIELD_DURATION_MS: u32 = 5000;

/// Start position (centre) for player 1 and player 2.
pub const P1_START: (f32, f32) = (WIDTH / 2.0, HEIGHT - 80.0);
pub const P2_START: (f32, f32) = (WIDTH / 2.0 - 120.0, HEIGHT - 80.0);

/// Where the teleport-shield power-up drops its carrier (centre).
pub const SAFE_POINT: (f32, f32) = (WIDTH / 2.0, HEIGHT - 120.0);

// ── Projectiles ───────────────────────────────────────────────────────────────

pub const PROJECTILE_W: f32 = 6.0;
pub const PROJECTILE_H: f32 = 12.0;
pub const BULLET_SPEED: f32 = 12.0;
pub const BOSS_SHOT_SPEED: f32 = 4.5;

// ── Meteors & power-ups ───────────────────────────────────────────────────────

pub const METEOR_SIZE: f32 = 40.0;
pub const MAX_METEORS_BASE: u32 = 5;
pub const MAX_METEORS_INCREMENT: u32 = 3;
pub const METEOR_MAX_SPEED: u32 = 12;
pub const METEOR_SCORE: u32 = 2;

pub const POWERUP_SIZE: f32 = 40.0;
pub const POWERUP_SPEED: f32 = 3.0;

// ── Boss ──────────────────────────────────────────────────────────────────────

pub const BOSS_W: f32 = 256.0;
pub const BOSS_H: f32 = 128.0;
pub const BOSS_CENTER: (f32, f32) = (WIDTH / 2.0, HEIGHT / 3.0);
pub const BOSS_MAX_LEFT: u32 = 100;
pub const BOSS_MAX_CORE: u32 = 300;
pub const BOSS_MAX_RIGHT: u32 = 100;
pub const BOSS_FIRE_CADENCE_MS: u32 = 1200;
pub const BOSS_HIT_DAMAGE: u32 = 10;
pub const BOSS_HIT_SCORE: u32 = 10;
/// Victory bonus per remaining life.
pub const LIFE_BONUS: u32 = 5;

// ── Persistence ───────────────────────────────────────────────────────────────

pub const TOP_SCORES: usize = 10;
pub const MAX_NAME_LEN: usize = 16;
/// Upper bounds applied to values read back from a save file.
pub const MAX_SAVED_LIVES: u32 = 99;
pub const MAX_SAVED_SCORE: u32 = 1_000_000;
