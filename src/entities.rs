//! All game entity types. Mostly data, plus the small per-entity rules
//! (movement step, damage gate) that every caller must agree on.

use serde::{Deserialize, Serialize};

use crate::constants::{
    INVULN_DURATION_MS, PLAYER_H, PLAYER_START_LIVES, PLAYER_W, POWERUP_SIZE, POWERUP_SPEED,
    PROJECTILE_H, PROJECTILE_W,
};

// ── Geometry ──────────────────────────────────────────────────────────────────

/// Axis-aligned box in world pixels. `(x, y)` is the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Rect { x: cx - w / 2.0, y: cy - h / 2.0, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.h / 2.0
    }

    pub fn set_center(&mut self, cx: f32, cy: f32) {
        self.x = cx - self.w / 2.0;
        self.y = cy - self.h / 2.0;
    }

    /// Strict overlap: boxes that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

// ── Projectiles ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectileOwner {
    Player1,
    Player2,
    Boss,
}

impl ProjectileOwner {
    pub fn for_player(number: u8) -> Self {
        if number == 2 {
            ProjectileOwner::Player2
        } else {
            ProjectileOwner::Player1
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    pub rect: Rect,
    pub vx: f32,
    pub vy: f32,
    pub owner: ProjectileOwner,
}

impl Projectile {
    pub fn new(x: f32, y: f32, vx: f32, vy: f32, owner: ProjectileOwner) -> Self {
        Projectile {
            rect: Rect::new(x, y, PROJECTILE_W, PROJECTILE_H),
            vx,
            vy,
            owner,
        }
    }

    pub fn update(&mut self) {
        self.rect.x += self.vx;
        self.rect.y += self.vy;
    }
}

// ── Meteors & power-ups ───────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Meteor {
    pub rect: Rect,
    /// Fall speed, fixed until the meteor leaves the bottom edge.
    pub speed: f32,
}

impl Meteor {
    pub fn update(&mut self) {
        self.rect.y += self.speed;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// +1 life.
    #[serde(rename = "life")]
    Life,
    /// Widens the fire pattern, up to three bullets per volley.
    #[serde(rename = "shot")]
    ShotBoost,
    /// Jumps to the safe point behind a long shield.
    #[serde(rename = "tp")]
    TeleportShield,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PowerUp {
    pub rect: Rect,
    pub speed: f32,
    pub kind: PowerUpKind,
}

impl PowerUp {
    pub fn new(x: f32, y: f32, kind: PowerUpKind) -> Self {
        PowerUp {
            rect: Rect::new(x, y, POWERUP_SIZE, POWERUP_SIZE),
            speed: POWERUP_SPEED,
            kind,
        }
    }

    pub fn update(&mut self) {
        self.rect.y += self.speed;
    }
}

// ── Player ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    /// 1 or 2.
    pub number: u8,
    pub rect: Rect,
    pub lives: u32,
    /// 1..=3, number of bullets per volley.
    pub shot_level: u8,
    /// Milliseconds of invulnerability left; 0 means vulnerable.
    pub invulnerable_ms: u32,
    pub bullets: Vec<Projectile>,
}

impl Player {
    pub fn new(number: u8, cx: f32, cy: f32) -> Self {
        Player {
            number,
            rect: Rect::from_center(cx, cy, PLAYER_W, PLAYER_H),
            lives: PLAYER_START_LIVES,
            shot_level: 1,
            invulnerable_ms: 0,
            bullets: Vec::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.lives > 0
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_ms > 0
    }

    /// Lose a life unless still inside the invulnerability window.
    /// Returns whether the hit was applied.
    pub fn take_damage(&mut self) -> bool {
        if self.is_invulnerable() {
            return false;
        }
        self.lives = self.lives.saturating_sub(1);
        self.invulnerable_ms = INVULN_DURATION_MS;
        true
    }

    pub fn tick_timers(&mut self, dt_ms: u32) {
        self.invulnerable_ms = self.invulnerable_ms.saturating_sub(dt_ms);
    }
}

// ── Boss ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BossPart {
    Left,
    Core,
    Right,
}

/// The phase-5 boss. Damage model and AI live in `boss.rs`.
#[derive(Clone, Debug, PartialEq)]
pub struct Boss {
    pub rect: Rect,
    pub hp_left: u32,
    pub hp_core: u32,
    pub hp_right: u32,
    pub max_left: u32,
    pub max_core: u32,
    pub max_right: u32,
    pub projectiles: Vec<Projectile>,
    pub since_last_shot_ms: u32,
    pub fire_cadence_ms: u32,
}

// ── Run state ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum RunStatus {
    /// "Ready?" pause before a phase; nothing moves.
    Countdown { remaining_ms: u32 },
    Active,
    Victory { final_score: u32 },
    Defeat { final_score: u32 },
}

/// Flattened view of `(phase, status)` used by the run loop and the HUD.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Countdown(u8),
    Active(u8),
    BossActive,
    Victory,
    Defeat,
}

/// Side effects the simulation wants the frontend to perform (sound cues,
/// music switches). Cleared at the start of every tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Shot,
    Hit,
    Point,
    PowerUp(PowerUpKind),
    PhaseStarted(u8),
    BossSpawned,
    Victory,
    Defeat,
}

/// The entire run state. Cloneable so the update functions can return a new
/// copy without mutating the original.
#[derive(Clone, Debug, PartialEq)]
pub struct RunState {
    /// 1..=5, 5 is the boss fight.
    pub phase: u8,
    pub phase_score: u32,
    pub status: RunStatus,
    /// Ordered by player number.
    pub players: Vec<Player>,
    pub meteors: Vec<Meteor>,
    pub powerups: Vec<PowerUp>,
    pub boss: Option<Boss>,
    pub credits: u32,
    pub paused: bool,
    pub player2_active: bool,
    /// Player 1 follows the pointer instead of the arrow keys.
    pub mouse_control: bool,
    /// Simulated run clock, advanced only by active ticks.
    pub clock_ms: u64,
    pub phase_started_at_ms: u64,
    pub events: Vec<GameEvent>,
}

impl RunState {
    pub fn stage(&self) -> Stage {
        match self.status {
            RunStatus::Countdown { .. } => Stage::Countdown(self.phase),
            RunStatus::Active if self.phase >= crate::constants::BOSS_PHASE => Stage::BossActive,
            RunStatus::Active => Stage::Active(self.phase),
            RunStatus::Victory { .. } => Stage::Victory,
            RunStatus::Defeat { .. } => Stage::Defeat,
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(
            self.status,
            RunStatus::Victory { .. } | RunStatus::Defeat { .. }
        )
    }

    pub fn player(&self, number: u8) -> Option<&Player> {
        self.players.iter().find(|p| p.number == number)
    }

    pub fn player_mut(&mut self, number: u8) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.number == number)
    }

    pub fn any_alive(&self) -> bool {
        self.players.iter().any(Player::is_alive)
    }

    pub fn phase_elapsed_ms(&self) -> u64 {
        self.clock_ms.saturating_sub(self.phase_started_at_ms)
    }
}
