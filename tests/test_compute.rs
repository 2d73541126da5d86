use space_escape::compute::*;
use space_escape::constants::{phase_target, BULLET_LIMIT, PHASE_START_DELAY_MS, TICK_MS};
use space_escape::entities::*;

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Live phase-1 run with one player at the start point and an empty field.
fn make_state() -> RunState {
    RunState {
        phase: 1,
        phase_score: 0,
        status: RunStatus::Active,
        players: vec![Player::new(1, 400.0, 520.0)],
        meteors: Vec::new(),
        powerups: Vec::new(),
        boss: None,
        credits: 0,
        paused: false,
        player2_active: false,
        mouse_control: false,
        clock_ms: 0,
        phase_started_at_ms: 0,
        events: Vec::new(),
    }
}

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn meteor(x: f32, y: f32) -> Meteor {
    Meteor {
        rect: Rect::new(x, y, 40.0, 40.0),
        speed: 3.0,
    }
}

// ── Constructors ──────────────────────────────────────────────────────────────

#[test]
fn init_state_starts_phase_one_in_countdown() {
    let s = init_state(&RunOptions::default(), &mut seeded_rng());
    assert_eq!(s.phase, 1);
    assert_eq!(s.phase_score, 0);
    assert_eq!(
        s.status,
        RunStatus::Countdown {
            remaining_ms: PHASE_START_DELAY_MS
        }
    );
    assert_eq!(s.players.len(), 1);
    assert_eq!(s.meteors.len(), 5);
    assert!((7..=12).contains(&s.powerups.len()));
    assert!(s.boss.is_none());
    assert!(s.events.contains(&GameEvent::PhaseStarted(1)));
}

#[test]
fn init_state_with_player_two() {
    let options = RunOptions {
        player2: true,
        ..RunOptions::default()
    };
    let s = init_state(&options, &mut seeded_rng());
    assert_eq!(s.players.len(), 2);
    assert!(s.player2_active);
    let p2 = s.player(2).unwrap();
    assert_eq!(p2.rect.center_x(), 280.0);
    assert_eq!(p2.rect.center_y(), 520.0);
}

#[test]
fn start_run_costs_one_credit() {
    let options = RunOptions::default();
    assert!(start_run(0, &options, &mut seeded_rng()).is_none());

    let s = start_run(3, &options, &mut seeded_rng()).unwrap();
    assert_eq!(s.credits, 2);
}

// ── Countdown ─────────────────────────────────────────────────────────────────

#[test]
fn nothing_moves_during_countdown() {
    let s = init_state(&RunOptions::default(), &mut seeded_rng());
    let next = tick(&s, TICK_MS, &mut seeded_rng());
    assert_eq!(next.meteors, s.meteors);
    assert_eq!(next.powerups, s.powerups);
    assert_eq!(next.clock_ms, 0);
    assert_eq!(
        next.status,
        RunStatus::Countdown {
            remaining_ms: PHASE_START_DELAY_MS - TICK_MS
        }
    );
}

#[test]
fn countdown_ends_after_three_seconds() {
    let mut rng = seeded_rng();
    let mut s = init_state(&RunOptions::default(), &mut rng);
    let mut ticks = 0;
    while matches!(s.status, RunStatus::Countdown { .. }) {
        s = tick(&s, TICK_MS, &mut rng);
        ticks += 1;
    }
    assert_eq!(s.status, RunStatus::Active);
    assert_eq!(ticks, 188);
}

#[test]
fn input_ignored_during_countdown() {
    let mut s = make_state();
    s.status = RunStatus::Countdown { remaining_ms: 1000 };
    let moved = move_player(&s, 1, Direction::Left);
    assert_eq!(moved.players, s.players);
    let shot = player_shoot(&s, 1);
    assert!(shot.players[0].bullets.is_empty());
}

// ── Movement ──────────────────────────────────────────────────────────────────

#[test]
fn move_player_steps_and_clamps() {
    let s = make_state();
    let moved = move_player(&s, 1, Direction::Left);
    assert_eq!(moved.players[0].rect.x, 353.0);

    let mut s = make_state();
    s.players[0].rect.x = 3.0;
    let moved = move_player(&s, 1, Direction::Left);
    assert_eq!(moved.players[0].rect.x, 0.0);

    s.players[0].rect.y = 538.0;
    let moved = move_player(&s, 1, Direction::Down);
    assert_eq!(moved.players[0].rect.bottom(), 600.0);
}

#[test]
fn move_player_does_not_mutate_input() {
    let s = make_state();
    let before = s.clone();
    let _ = move_player(&s, 1, Direction::Up);
    assert_eq!(s, before);
}

#[test]
fn downed_player_cannot_move_or_fire() {
    let mut s = make_state();
    s.players[0].lives = 0;
    let next = player_shoot(&move_player(&s, 1, Direction::Up), 1);
    assert_eq!(next.players[0].rect, s.players[0].rect);
    assert!(next.players[0].bullets.is_empty());
}

#[test]
fn pointer_only_steers_in_mouse_mode() {
    let s = make_state();
    assert_eq!(point_player(&s, 100.0, 100.0).players, s.players);

    let s = toggle_mouse_control(&s);
    let next = point_player(&s, 100.0, 100.0);
    assert_eq!(next.players[0].rect.center_x(), 100.0);
    assert_eq!(next.players[0].rect.center_y(), 100.0);

    let next = point_player(&s, -50.0, 0.0);
    assert_eq!(next.players[0].rect.x, 0.0);
    assert_eq!(next.players[0].rect.y, 0.0);
}

// ── Firing ────────────────────────────────────────────────────────────────────

#[test]
fn fire_pattern_spreads_with_level() {
    assert_eq!(fire_pattern(1, 80.0), vec![0.0]);
    assert_eq!(fire_pattern(2, 80.0), vec![-22.0, 22.0]);
    assert_eq!(fire_pattern(3, 80.0), vec![-44.0, 0.0, 44.0]);
}

#[test]
fn single_shot_leaves_from_ship_nose() {
    let next = player_shoot(&make_state(), 1);
    let bullets = &next.players[0].bullets;
    assert_eq!(bullets.len(), 1);
    assert_eq!(bullets[0].rect.center_x(), 400.0);
    assert_eq!(bullets[0].rect.y, 478.0);
    assert_eq!(bullets[0].vy, -12.0);
    assert_eq!(bullets[0].owner, ProjectileOwner::Player1);
    assert!(next.events.contains(&GameEvent::Shot));
}

#[test]
fn triple_shot_fires_three_bullets() {
    let mut s = make_state();
    s.players[0].shot_level = 3;
    let next = player_shoot(&s, 1);
    let xs: Vec<f32> = next.players[0]
        .bullets
        .iter()
        .map(|b| b.rect.center_x())
        .collect();
    assert_eq!(xs, vec![356.0, 400.0, 444.0]);
}

#[test]
fn bullets_in_flight_are_capped() {
    let mut s = make_state();
    for _ in 0..12 {
        s = player_shoot(&s, 1);
    }
    assert_eq!(s.players[0].bullets.len(), BULLET_LIMIT);

    // A wide volley near the cap is cut short, never exceeding it.
    let mut s = make_state();
    s.players[0].shot_level = 3;
    for _ in 0..3 {
        s = player_shoot(&s, 1);
    }
    assert_eq!(s.players[0].bullets.len(), 9);
    let mut s2 = make_state();
    s2.players[0].shot_level = 3;
    s2.players[0].bullets = s.players[0].bullets[..8].to_vec();
    let next = player_shoot(&s2, 1);
    assert_eq!(next.players[0].bullets.len(), BULLET_LIMIT);
}

#[test]
fn player_two_bullets_are_tagged() {
    let s = add_player_two(&make_state());
    let next = player_shoot(&s, 2);
    assert_eq!(next.players[1].bullets[0].owner, ProjectileOwner::Player2);
    assert!(next.players[0].bullets.is_empty());
}

// ── Tick ──────────────────────────────────────────────────────────────────────

#[test]
fn paused_tick_changes_nothing() {
    let mut s = make_state();
    s.meteors.push(meteor(100.0, 100.0));
    let s = toggle_pause(&s);
    let next = tick(&s, TICK_MS, &mut seeded_rng());
    assert_eq!(next, s);
    assert!(!toggle_pause(&s).paused);
}

#[test]
fn active_tick_advances_clock_and_timers() {
    let mut s = make_state();
    s.players[0].invulnerable_ms = 2000;
    let next = tick(&s, TICK_MS, &mut seeded_rng());
    assert_eq!(next.clock_ms, 16);
    assert_eq!(next.phase_elapsed_ms(), 16);
    assert_eq!(next.players[0].invulnerable_ms, 1984);
}

#[test]
fn bullets_leaving_the_top_are_removed() {
    let mut s = make_state();
    s.players[0]
        .bullets
        .push(Projectile::new(100.0, 5.0, 0.0, -12.0, ProjectileOwner::Player1));
    let s = tick(&s, TICK_MS, &mut seeded_rng());
    assert_eq!(s.players[0].bullets.len(), 1);
    assert_eq!(s.players[0].bullets[0].rect.y, -7.0);
    let s = tick(&s, TICK_MS, &mut seeded_rng());
    assert!(s.players[0].bullets.is_empty());
}

#[test]
fn four_kills_score_eight_without_advancing() {
    let mut s = make_state();
    for x in [0.0, 80.0, 160.0, 240.0] {
        s.meteors.push(meteor(x, 100.0));
        s.players[0]
            .bullets
            .push(Projectile::new(x + 10.0, 125.0, 0.0, -12.0, ProjectileOwner::Player1));
    }
    let next = tick(&s, TICK_MS, &mut seeded_rng());
    assert_eq!(next.phase_score, 8);
    assert_eq!(next.phase, 1);
    assert_eq!(next.status, RunStatus::Active);
    assert!(next.players[0].bullets.is_empty());
}

#[test]
fn reaching_target_enters_next_phase() {
    let mut s = make_state();
    s.phase_score = 48;
    s.players[0].lives = 2;
    s.players[0].shot_level = 3;
    s.meteors.push(meteor(100.0, 100.0));
    s.players[0]
        .bullets
        .push(Projectile::new(110.0, 125.0, 0.0, -12.0, ProjectileOwner::Player1));

    let next = tick(&s, TICK_MS, &mut seeded_rng());
    assert_eq!(next.phase, 2);
    assert_eq!(next.phase_score, 0);
    assert_eq!(next.stage(), Stage::Countdown(2));
    assert_eq!(next.meteors.len(), 8);
    assert!(next.events.contains(&GameEvent::PhaseStarted(2)));
    assert_eq!(next.phase_started_at_ms, next.clock_ms);

    // Lives and shot level carry over.
    assert_eq!(next.players[0].lives, 2);
    assert_eq!(next.players[0].shot_level, 3);
}

#[test]
fn phases_advance_one_at_a_time_up_to_the_boss() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    for expected in 2..=5u8 {
        s.phase_score = phase_target(s.phase).unwrap();
        s = tick(&s, TICK_MS, &mut rng);
        assert_eq!(s.phase, expected);
        assert!(matches!(s.status, RunStatus::Countdown { .. }));
        s = tick(&s, PHASE_START_DELAY_MS, &mut rng);
        assert_eq!(s.status, RunStatus::Active);
    }

    assert_eq!(s.stage(), Stage::BossActive);
    assert!(s.meteors.is_empty());
    assert!(s.powerups.is_empty());
    assert!(s.boss.is_none());

    let s = tick(&s, TICK_MS, &mut rng);
    assert!(s.boss.is_some());
    assert!(s.events.contains(&GameEvent::BossSpawned));
    assert!(s.meteors.is_empty());
    assert_eq!(s.phase, 5);
}

#[test]
fn boss_phase_has_no_score_target() {
    let mut s = make_state();
    s.phase = 5;
    s.phase_score = 10_000;
    let next = tick(&s, TICK_MS, &mut seeded_rng());
    assert_eq!(next.phase, 5);
    assert_eq!(next.status, RunStatus::Active);
}

#[test]
fn everyone_down_is_defeat_with_phase_score() {
    let mut s = make_state();
    s.phase = 3;
    s.phase_score = 12;
    s.players[0].lives = 0;
    let next = tick(&s, TICK_MS, &mut seeded_rng());
    assert_eq!(next.status, RunStatus::Defeat { final_score: 12 });
    assert!(next.events.contains(&GameEvent::Defeat));

    // Terminal: further ticks are no-ops.
    let after = tick(&next, TICK_MS, &mut seeded_rng());
    assert_eq!(after.status, next.status);
    assert!(after.events.is_empty());
}

#[test]
fn one_survivor_keeps_the_run_going() {
    let mut s = add_player_two(&make_state());
    s.players[0].lives = 0;
    let next = tick(&s, TICK_MS, &mut seeded_rng());
    assert_eq!(next.status, RunStatus::Active);
}

#[test]
fn destroying_the_boss_is_victory_with_life_bonus() {
    let mut s = make_state();
    s.phase = 5;
    let mut boss = Boss::spawn();
    boss.hp_left = 0;
    boss.hp_right = 0;
    boss.hp_core = 10;
    s.boss = Some(boss);
    // Moves to y=238, inside the core third of the boss body.
    s.players[0]
        .bullets
        .push(Projectile::new(397.0, 250.0, 0.0, -12.0, ProjectileOwner::Player1));

    let next = tick(&s, TICK_MS, &mut seeded_rng());
    assert_eq!(next.boss.as_ref().unwrap().total_hp(), 0);
    assert_eq!(next.status, RunStatus::Victory { final_score: 35 });
    assert!(next.events.contains(&GameEvent::Victory));

    let after = tick(&next, TICK_MS, &mut seeded_rng());
    assert_eq!(after.status, RunStatus::Victory { final_score: 35 });
    assert!(!after.events.contains(&GameEvent::Victory));
}

#[test]
fn victory_bonus_counts_every_players_lives() {
    let mut s = add_player_two(&make_state());
    s.phase = 5;
    s.phase_score = 40;
    s.players[0].lives = 3;
    s.players[1].lives = 0;
    let mut boss = Boss::spawn();
    boss.hp_left = 0;
    boss.hp_core = 0;
    boss.hp_right = 10;
    s.boss = Some(boss);
    s.players[0]
        .bullets
        .push(Projectile::new(497.0, 250.0, 0.0, -12.0, ProjectileOwner::Player1));

    let next = tick(&s, TICK_MS, &mut seeded_rng());
    assert_eq!(next.status, RunStatus::Victory { final_score: 65 });
}

// ── Session toggles ───────────────────────────────────────────────────────────

#[test]
fn add_player_two_is_idempotent() {
    let s = add_player_two(&make_state());
    assert_eq!(s.players.len(), 2);
    assert!(s.player2_active);
    let again = add_player_two(&s);
    assert_eq!(again.players.len(), 2);
}

#[test]
fn add_player_two_refused_after_run_ends() {
    let mut s = make_state();
    s.status = RunStatus::Defeat { final_score: 0 };
    assert_eq!(add_player_two(&s).players.len(), 1);
}
