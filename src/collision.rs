//! Collision & scoring resolver.
//!
//! Every function mutates the run state in place and is called once per
//! active tick by `compute::tick`, in this order: meteors, power-ups, then
//! (boss phase only) boss projectiles and bullets against the boss.

use rand::Rng;

use crate::constants::{
    BOSS_HIT_DAMAGE, BOSS_HIT_SCORE, HEIGHT, MAX_SHOT_LEVEL, METEOR_SCORE, SAFE_POINT,
    TP_SHIELD_DURATION_MS, WIDTH,
};
use crate::entities::{GameEvent, Meteor, Player, PowerUpKind, RunState};
use crate::spawner::{sample_meteor_speed, spawn_meteor};

/// Put a meteor back above the screen at a fresh column. Speed is kept.
fn reposition_above(meteor: &mut Meteor, rng: &mut impl Rng) {
    meteor.rect.y = rng.gen_range(-200..=-40) as f32;
    meteor.rect.x = rng.gen_range(0..=(WIDTH - meteor.rect.w) as i32) as f32;
}

/// Apply a power-up to the player who caught it.
pub fn apply_powerup(player: &mut Player, kind: PowerUpKind) {
    match kind {
        PowerUpKind::Life => player.lives = player.lives.saturating_add(1),
        PowerUpKind::ShotBoost => {
            player.shot_level = (player.shot_level + 1).clamp(1, MAX_SHOT_LEVEL);
        }
        PowerUpKind::TeleportShield => {
            player.rect.set_center(SAFE_POINT.0, SAFE_POINT.1);
            player.invulnerable_ms = TP_SHIELD_DURATION_MS;
        }
    }
}

/// Move every meteor, then resolve bottom-edge, player and bullet contacts.
pub fn resolve_meteors(state: &mut RunState, rng: &mut impl Rng) {
    let phase = state.phase;
    let RunState {
        meteors,
        players,
        phase_score,
        events,
        ..
    } = state;

    for meteor in meteors.iter_mut() {
        meteor.update();
        if meteor.rect.y > HEIGHT {
            reposition_above(meteor, rng);
            meteor.speed = sample_meteor_speed(phase, rng);
        }

        // Player and bullet contacts are both judged against where the meteor
        // was this tick, so one meteor can cost a life and still score.
        let hit_box = meteor.rect;

        // Downed players are out of play.
        for player in players.iter_mut().filter(|p| p.is_alive()) {
            if hit_box.intersects(&player.rect) && player.take_damage() {
                events.push(GameEvent::Hit);
                reposition_above(meteor, rng);
            }
        }

        // First matching bullet wins; later players' bullets are not checked.
        for player in players.iter_mut() {
            if let Some(bi) = player
                .bullets
                .iter()
                .position(|b| hit_box.intersects(&b.rect))
            {
                player.bullets.remove(bi);
                reposition_above(meteor, rng);
                *phase_score = phase_score.saturating_add(METEOR_SCORE);
                events.push(GameEvent::Point);
                break;
            }
        }
    }
}

/// Move power-ups, drop the ones that left the screen, hand out pickups.
/// Every pickup spawns exactly one replacement meteor.
pub fn resolve_powerups(state: &mut RunState, rng: &mut impl Rng) {
    let phase = state.phase;
    let mut kept = Vec::with_capacity(state.powerups.len());

    for mut powerup in std::mem::take(&mut state.powerups) {
        powerup.update();
        if powerup.rect.y > HEIGHT {
            continue;
        }

        let catcher = state
            .players
            .iter_mut()
            .find(|p| p.is_alive() && powerup.rect.intersects(&p.rect));
        match catcher {
            Some(player) => {
                apply_powerup(player, powerup.kind);
                state.events.push(GameEvent::PowerUp(powerup.kind));
                state.meteors.push(spawn_meteor(phase, -300, -40, rng));
            }
            None => kept.push(powerup),
        }
    }

    state.powerups = kept;
}

/// Boss shots against players. A shot that touches a player is spent even
/// if the player was shielded.
pub fn resolve_boss_projectiles(state: &mut RunState) {
    let RunState {
        boss,
        players,
        events,
        ..
    } = state;
    let Some(boss) = boss.as_mut() else {
        return;
    };

    boss.projectiles.retain(|proj| {
        let mut touched = false;
        for player in players.iter_mut() {
            if player.is_alive() && proj.rect.intersects(&player.rect) {
                touched = true;
                if player.take_damage() {
                    events.push(GameEvent::Hit);
                }
            }
        }
        !touched
    });
}

/// Player bullets against the boss body. The impacted third takes the damage.
pub fn resolve_boss_hits(state: &mut RunState) {
    let RunState {
        boss,
        players,
        phase_score,
        ..
    } = state;
    let Some(boss) = boss.as_mut() else {
        return;
    };

    for player in players.iter_mut() {
        player.bullets.retain(|bullet| {
            if !boss.rect.intersects(&bullet.rect) {
                return true;
            }
            let part = boss.part_at(bullet.rect.center_x());
            boss.take_damage_to_part(part, BOSS_HIT_DAMAGE);
            *phase_score = phase_score.saturating_add(BOSS_HIT_SCORE);
            false
        });
    }
}
