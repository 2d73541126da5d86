//! Run state machine and input-driven transitions.
//!
//! Every public function takes an immutable reference to the current
//! `RunState` (and, where needed, an RNG handle) and returns a brand-new
//! `RunState`. Side effects are limited to the injected RNG and the
//! `events` list on the returned state.

use rand::Rng;
use tracing::{debug, info};

use crate::collision;
use crate::constants::{
    phase_target, BOSS_PHASE, BULLET_LIMIT, BULLET_SPEED, HEIGHT, LIFE_BONUS, P1_START, P2_START,
    PHASE_START_DELAY_MS, PLAYER_SPEED, PROJECTILE_H, PROJECTILE_W, WIDTH,
};
use crate::entities::{
    Boss, GameEvent, Player, Projectile, ProjectileOwner, RunState, RunStatus,
};
use crate::spawner::{spawn_meteors, spawn_powerups};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Choices made on the start menu.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunOptions {
    pub player2: bool,
    pub mouse_control: bool,
    /// Credits left after paying for this run.
    pub credits: u32,
}

// ── Constructors ─────────────────────────────────────────────────────────────

/// Build a fresh run: phase 1 in countdown, batches spawned.
pub fn init_state(options: &RunOptions, rng: &mut impl Rng) -> RunState {
    let mut players = vec![Player::new(1, P1_START.0, P1_START.1)];
    if options.player2 {
        players.push(Player::new(2, P2_START.0, P2_START.1));
    }

    let mut state = RunState {
        phase: 1,
        phase_score: 0,
        status: RunStatus::Active,
        players,
        meteors: Vec::new(),
        powerups: Vec::new(),
        boss: None,
        credits: options.credits,
        paused: false,
        player2_active: options.player2,
        mouse_control: options.mouse_control,
        clock_ms: 0,
        phase_started_at_ms: 0,
        events: Vec::new(),
    };
    enter_phase(&mut state, 1, rng);
    state
}

/// Insert-coin gate: a run costs one credit. Returns `None` when broke.
pub fn start_run(credits: u32, options: &RunOptions, rng: &mut impl Rng) -> Option<RunState> {
    let remaining = credits.checked_sub(1)?;
    let options = RunOptions {
        credits: remaining,
        ..options.clone()
    };
    info!(credits = remaining, player2 = options.player2, "run started");
    Some(init_state(&options, rng))
}

/// Reset score, (re)populate or clear the field and start the countdown.
pub fn enter_phase(state: &mut RunState, phase: u8, rng: &mut impl Rng) {
    state.phase = phase;
    state.phase_score = 0;
    if phase >= BOSS_PHASE {
        state.meteors.clear();
        state.powerups.clear();
    } else {
        state.meteors = spawn_meteors(phase, rng);
        state.powerups = spawn_powerups(phase, rng);
    }
    state.status = RunStatus::Countdown {
        remaining_ms: PHASE_START_DELAY_MS,
    };
    state.phase_started_at_ms = state.clock_ms;
    state.events.push(GameEvent::PhaseStarted(phase));
    info!(
        phase,
        meteors = state.meteors.len(),
        powerups = state.powerups.len(),
        "phase entered"
    );
}

// ── Input-driven state transitions (pure) ───────────────────────────────────

/// Movement and firing are only accepted while the phase is live.
fn accepts_play_input(state: &RunState) -> bool {
    state.status == RunStatus::Active && !state.paused
}

pub fn move_player(state: &RunState, number: u8, direction: Direction) -> RunState {
    let mut next = state.clone();
    if !accepts_play_input(state) {
        return next;
    }
    if let Some(player) = next.player_mut(number).filter(|p| p.is_alive()) {
        let r = &mut player.rect;
        match direction {
            Direction::Left => r.x = (r.x - PLAYER_SPEED).max(0.0),
            Direction::Right => r.x = (r.x + PLAYER_SPEED).min(WIDTH - r.w),
            Direction::Up => r.y = (r.y - PLAYER_SPEED).max(0.0),
            Direction::Down => r.y = (r.y + PLAYER_SPEED).min(HEIGHT - r.h),
        }
    }
    next
}

/// Pointer control: player 1 is centred on the pointer, kept on screen.
pub fn point_player(state: &RunState, x: f32, y: f32) -> RunState {
    let mut next = state.clone();
    if !state.mouse_control || !accepts_play_input(state) {
        return next;
    }
    if let Some(player) = next.player_mut(1).filter(|p| p.is_alive()) {
        let (hw, hh) = (player.rect.w / 2.0, player.rect.h / 2.0);
        player
            .rect
            .set_center(x.clamp(hw, WIDTH - hw), y.clamp(hh, HEIGHT - hh));
    }
    next
}

/// Horizontal bullet offsets for a shot level, relative to the ship centre.
pub fn fire_pattern(shot_level: u8, ship_width: f32) -> Vec<f32> {
    let spacing = (ship_width * 0.55).floor();
    match shot_level {
        0 | 1 => vec![0.0],
        2 => vec![-(spacing / 2.0).floor(), (spacing / 2.0).floor()],
        _ => vec![-spacing, 0.0, spacing],
    }
}

/// Fire one volley. Bullets past the in-flight cap are dropped.
pub fn player_shoot(state: &RunState, number: u8) -> RunState {
    let mut next = state.clone();
    let can_fire = state
        .player(number)
        .is_some_and(|p| p.is_alive() && p.bullets.len() < BULLET_LIMIT);
    if !accepts_play_input(state) || !can_fire {
        return next;
    }
    let Some(player) = next.player_mut(number) else {
        return next;
    };

    let center = player.rect.center_x();
    let top = player.rect.y;
    let owner = ProjectileOwner::for_player(player.number);
    for offset in fire_pattern(player.shot_level, player.rect.w) {
        if player.bullets.len() >= BULLET_LIMIT {
            break;
        }
        player.bullets.push(Projectile::new(
            center - PROJECTILE_W / 2.0 + offset,
            top - PROJECTILE_H,
            0.0,
            -BULLET_SPEED,
            owner,
        ));
    }
    next.events.push(GameEvent::Shot);
    next
}

pub fn toggle_pause(state: &RunState) -> RunState {
    RunState {
        paused: !state.paused,
        ..state.clone()
    }
}

pub fn toggle_mouse_control(state: &RunState) -> RunState {
    RunState {
        mouse_control: !state.mouse_control,
        ..state.clone()
    }
}

/// Player two may join at any point of a running game; never leaves.
pub fn add_player_two(state: &RunState) -> RunState {
    let mut next = state.clone();
    if next.is_over() || next.player(2).is_some() {
        return next;
    }
    next.players.push(Player::new(2, P2_START.0, P2_START.1));
    next.player2_active = true;
    info!("player two joined");
    next
}

// ── Per-frame tick (RNG is injected) ───────────────────────────────────

fn off_screen(p: &Projectile) -> bool {
    p.rect.bottom() < 0.0 || p.rect.y > HEIGHT || p.rect.x > WIDTH || p.rect.right() < 0.0
}

/// Advance the simulation by `dt_ms`. All randomness comes through `rng` so
/// callers control determinism (useful for tests with a seeded RNG).
pub fn tick(state: &RunState, dt_ms: u32, rng: &mut impl Rng) -> RunState {
    let mut next = state.clone();
    next.events.clear();

    if next.paused || next.is_over() {
        return next;
    }

    // ── 1. Countdown ─────────────────────────────────────────────────────────
    if let RunStatus::Countdown { remaining_ms } = next.status {
        let left = remaining_ms.saturating_sub(dt_ms);
        next.status = if left == 0 {
            debug!(phase = next.phase, "countdown finished");
            RunStatus::Active
        } else {
            RunStatus::Countdown { remaining_ms: left }
        };
        return next;
    }

    next.clock_ms = next.clock_ms.saturating_add(u64::from(dt_ms));

    // ── 2. Timers & bullets ──────────────────────────────────────────────────
    for player in &mut next.players {
        player.tick_timers(dt_ms);
        for bullet in &mut player.bullets {
            bullet.update();
        }
        player.bullets.retain(|b| !off_screen(b));
    }

    // ── 3. Meteors & power-ups ───────────────────────────────────────────────
    collision::resolve_meteors(&mut next, rng);
    collision::resolve_powerups(&mut next, rng);

    // ── 4. Boss ──────────────────────────────────────────────────────────────
    if next.phase >= BOSS_PHASE {
        next.meteors.clear();
        next.powerups.clear();
        if next.boss.is_none() {
            info!("boss spawned");
            next.boss = Some(Boss::spawn());
            next.events.push(GameEvent::BossSpawned);
        }
        if let Some(boss) = next.boss.as_mut() {
            boss.update(&next.players, dt_ms, rng);
        }
        collision::resolve_boss_projectiles(&mut next);
        collision::resolve_boss_hits(&mut next);

        if next.boss.as_ref().is_some_and(Boss::is_defeated) {
            let bonus = next
                .players
                .iter()
                .fold(0u32, |acc, p| acc.saturating_add(p.lives.saturating_mul(LIFE_BONUS)));
            let final_score = next.phase_score.saturating_add(bonus);
            info!(final_score, "boss defeated");
            next.status = RunStatus::Victory { final_score };
            next.events.push(GameEvent::Victory);
            return next;
        }
    }

    // ── 5. Phase advancement ─────────────────────────────────────────────────
    if let Some(target) = phase_target(next.phase) {
        if next.phase_score >= target {
            let phase = next.phase + 1;
            enter_phase(&mut next, phase, rng);
            return next;
        }
    }

    // ── 6. Defeat ────────────────────────────────────────────────────────────
    if !next.any_alive() {
        let final_score = next.phase_score;
        info!(phase = next.phase, final_score, "all players down");
        next.status = RunStatus::Defeat { final_score };
        next.events.push(GameEvent::Defeat);
    }

    next
}
