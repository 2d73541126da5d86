use space_escape::compute::tick;
use space_escape::constants::{MAX_SAVED_LIVES, MAX_SAVED_SCORE, PHASE_START_DELAY_MS, TICK_MS};
use space_escape::entities::*;
use space_escape::persistence::*;

use std::fs;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

fn make_state() -> RunState {
    let mut p1 = Player::new(1, 400.0, 520.0);
    p1.lives = 3;
    p1.shot_level = 2;
    p1.invulnerable_ms = 750;
    let mut p2 = Player::new(2, 280.0, 520.0);
    p2.lives = 1;

    RunState {
        phase: 3,
        phase_score: 42,
        status: RunStatus::Active,
        players: vec![p1, p2],
        meteors: vec![Meteor {
            rect: Rect::new(120.0, -80.0, 40.0, 40.0),
            speed: 6.0,
        }],
        powerups: vec![PowerUp::new(300.0, -400.0, PowerUpKind::TeleportShield)],
        boss: None,
        credits: 4,
        paused: true,
        player2_active: true,
        mouse_control: true,
        clock_ms: 9_000,
        phase_started_at_ms: 5_000,
        events: Vec::new(),
    }
}

// ── Snapshot round trip ───────────────────────────────────────────────────────

#[test]
fn saved_run_restores_into_countdown() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("save.json");
    let state = make_state();

    save_run(&path, &state).unwrap();
    let restored = load_run(&path, 7).unwrap().unwrap();

    assert_eq!(restored.phase, 3);
    assert_eq!(restored.phase_score, 42);
    assert_eq!(
        restored.status,
        RunStatus::Countdown {
            remaining_ms: PHASE_START_DELAY_MS
        }
    );
    assert_eq!(restored.credits, 7);
    assert!(!restored.paused);
    assert!(restored.player2_active);
    assert!(restored.mouse_control);
    assert_eq!(restored.phase_started_at_ms, 5_000);
    assert!(restored.events.contains(&GameEvent::PhaseStarted(3)));

    assert_eq!(restored.players.len(), 2);
    let p1 = restored.player(1).unwrap();
    assert_eq!(p1.rect, state.players[0].rect);
    assert_eq!(p1.lives, 3);
    assert_eq!(p1.shot_level, 2);
    assert_eq!(p1.invulnerable_ms, 750);
    assert_eq!(restored.player(2).unwrap().lives, 1);

    assert_eq!(restored.meteors, state.meteors);
    assert_eq!(restored.powerups, state.powerups);
    assert!(restored.boss.is_none());
}

#[test]
fn boss_health_survives_a_save() {
    let mut state = make_state();
    state.phase = 5;
    let mut boss = Boss::spawn();
    boss.hp_left = 0;
    boss.hp_core = 120;
    state.boss = Some(boss);

    let restored = restore_snapshot(&make_snapshot(&state), 0);
    let boss = restored.boss.unwrap();
    assert_eq!(boss.hp_left, 0);
    assert_eq!(boss.hp_core, 120);
    assert_eq!(boss.hp_right, 100);
}

#[test]
fn snapshot_uses_the_save_file_keys() {
    let value = serde_json::to_value(make_snapshot(&make_state())).unwrap();
    assert_eq!(value["phase"], 3);
    assert_eq!(value["phase_timer_start"], 5_000);
    assert_eq!(value["players"][0]["inv_rem"], 750);
    assert_eq!(value["players"][0]["shot_level"], 2);
    assert_eq!(value["powerups"][0]["type"], "tp");
    assert_eq!(value["meteors"][0]["speed"], 6.0);
}

// ── Lenient loading ───────────────────────────────────────────────────────────

#[test]
fn empty_object_loads_with_defaults() {
    let snapshot: RunSnapshot = serde_json::from_str("{}").unwrap();
    assert_eq!(snapshot, RunSnapshot::default());

    let state = restore_snapshot(&snapshot, 0);
    assert_eq!(state.phase, 1);
    assert_eq!(state.players.len(), 1);
    assert_eq!(state.players[0].number, 1);
    assert_eq!(state.players[0].lives, 5);
    assert_eq!(state.players[0].rect.center_x(), 400.0);
}

#[test]
fn missing_fields_fall_back_per_entry() {
    let raw = r#"{
        "phase": 2,
        "players": [{"number": 2, "lives": 3}],
        "meteors": [{"x": 10}],
        "powerups": [{"x": 5, "y": -20, "type": "shot"}]
    }"#;
    let snapshot: RunSnapshot = serde_json::from_str(raw).unwrap();
    let state = restore_snapshot(&snapshot, 0);

    assert_eq!(state.players.len(), 1);
    assert_eq!(state.players[0].number, 2);
    assert_eq!(state.players[0].lives, 3);
    assert_eq!(state.players[0].shot_level, 1);
    assert!(state.player2_active);

    assert_eq!(state.meteors[0].rect.x, 10.0);
    assert_eq!(state.meteors[0].rect.y, -50.0);
    assert_eq!(state.meteors[0].speed, 4.0);
    assert_eq!(state.powerups[0].kind, PowerUpKind::ShotBoost);
}

#[test]
fn out_of_range_values_are_clamped() {
    let snapshot = RunSnapshot {
        phase: 9,
        players: vec![
            PlayerSnapshot {
                shot_level: 7,
                ..PlayerSnapshot::default()
            },
            // Duplicate and unknown player numbers are ignored.
            PlayerSnapshot {
                lives: 1,
                ..PlayerSnapshot::default()
            },
            PlayerSnapshot {
                number: 3,
                ..PlayerSnapshot::default()
            },
        ],
        boss: Some(BossSnapshot {
            hp_left: 999,
            hp_core: 999,
            hp_right: 5,
        }),
        ..RunSnapshot::default()
    };
    let state = restore_snapshot(&snapshot, 0);
    assert_eq!(state.phase, 5);
    assert_eq!(state.players.len(), 1);
    assert_eq!(state.players[0].shot_level, 3);
    assert_eq!(state.players[0].lives, 5);
    let boss = state.boss.unwrap();
    assert_eq!((boss.hp_left, boss.hp_core, boss.hp_right), (100, 300, 5));

    let state = restore_snapshot(
        &RunSnapshot {
            phase: 0,
            ..RunSnapshot::default()
        },
        0,
    );
    assert_eq!(state.phase, 1);
}

#[test]
fn extreme_saved_values_are_bounded_and_playable() {
    let raw = r#"{
        "phase": 2,
        "phase_score": 4294967295,
        "players": [{"number": 1, "x": 360, "y": 490, "lives": 4294967295}],
        "meteors": [{"x": 100, "y": 100, "speed": -30}, {"x": 500, "y": -60, "speed": 1e30}]
    }"#;
    let snapshot: RunSnapshot = serde_json::from_str(raw).unwrap();
    let state = restore_snapshot(&snapshot, 0);

    assert_eq!(state.phase_score, MAX_SAVED_SCORE);
    assert_eq!(state.players[0].lives, MAX_SAVED_LIVES);
    assert_eq!(state.meteors[0].speed, 4.0);
    assert_eq!(state.meteors[1].speed, 7.0);

    // Run through the countdown, then land a kill on top of the capped score.
    let mut rng = StdRng::seed_from_u64(42);
    let mut state = tick(&state, PHASE_START_DELAY_MS, &mut rng);
    let meteor = state.meteors[0].rect;
    state.players[0].bullets.push(Projectile::new(
        meteor.x,
        meteor.y + meteor.h,
        0.0,
        0.0,
        ProjectileOwner::Player1,
    ));
    let state = tick(&state, TICK_MS, &mut rng);
    assert!(state.events.contains(&GameEvent::Point));
    assert_eq!(state.phase, 3);
    assert_eq!(state.phase_score, 0);
}

#[test]
fn huge_saved_lives_still_finish_the_boss_fight() {
    let raw = r#"{
        "phase": 5,
        "players": [{"number": 1, "lives": 4294967295}],
        "boss": {"hp_left": 0, "hp_core": 0, "hp_right": 0}
    }"#;
    let snapshot: RunSnapshot = serde_json::from_str(raw).unwrap();
    let state = restore_snapshot(&snapshot, 0);

    let mut rng = StdRng::seed_from_u64(42);
    let state = tick(&state, PHASE_START_DELAY_MS, &mut rng);
    let state = tick(&state, TICK_MS, &mut rng);
    assert_eq!(
        state.status,
        RunStatus::Victory {
            final_score: MAX_SAVED_LIVES * 5
        }
    );
}

#[test]
fn boss_phase_restore_clears_the_field() {
    let mut state = make_state();
    state.phase = 5;
    let restored = restore_snapshot(&make_snapshot(&state), 0);
    assert_eq!(restored.phase, 5);
    assert!(restored.meteors.is_empty());
    assert!(restored.powerups.is_empty());
}

// ── Files ─────────────────────────────────────────────────────────────────────

#[test]
fn missing_save_file_is_not_an_error() {
    let dir = tempdir().unwrap();
    let loaded = load_run(&dir.path().join("nothing.json"), 0).unwrap();
    assert!(loaded.is_none());
}

#[test]
fn corrupt_save_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("save.json");
    fs::write(&path, "{ not json").unwrap();
    let err = load_run(&path, 0).unwrap_err();
    assert!(format!("{err:#}").contains("invalid JSON"));
}

#[test]
fn save_creates_missing_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("save.json");
    save_run(&path, &make_state()).unwrap();
    assert!(path.exists());
}
