//! Meteor and power-up batch generation.
//!
//! Nothing here fails; all randomness comes through the injected `rng` so a
//! seeded RNG reproduces the same batch.

use rand::Rng;

use crate::constants::{
    MAX_METEORS_BASE, MAX_METEORS_INCREMENT, METEOR_MAX_SPEED, METEOR_SIZE, POWERUP_SIZE, WIDTH,
};
use crate::entities::{Meteor, PowerUp, PowerUpKind, Rect};

/// Inclusive fall-speed range for meteors of a phase.
pub fn meteor_speed_range(phase: u8) -> (u32, u32) {
    let step = u32::from(phase.max(1)) - 1;
    let low = 3 + step;
    let high = METEOR_MAX_SPEED.min(5 + step * 2);
    (low, high.max(low))
}

pub fn meteor_count(phase: u8) -> usize {
    let step = u32::from(phase.max(1)) - 1;
    (MAX_METEORS_BASE + step * MAX_METEORS_INCREMENT) as usize
}

pub fn sample_meteor_speed(phase: u8, rng: &mut impl Rng) -> f32 {
    let (low, high) = meteor_speed_range(phase);
    rng.gen_range(low..=high) as f32
}

fn random_x(rng: &mut impl Rng, size: f32) -> f32 {
    rng.gen_range(0..=(WIDTH - size) as i32) as f32
}

/// A single meteor somewhere in the band `y_min..=y_max` above the screen.
pub fn spawn_meteor(phase: u8, y_min: i32, y_max: i32, rng: &mut impl Rng) -> Meteor {
    let x = random_x(rng, METEOR_SIZE);
    let y = rng.gen_range(y_min..=y_max) as f32;
    let speed = sample_meteor_speed(phase, rng);
    Meteor {
        rect: Rect::new(x, y, METEOR_SIZE, METEOR_SIZE),
        speed,
    }
}

pub fn spawn_meteors(phase: u8, rng: &mut impl Rng) -> Vec<Meteor> {
    (0..meteor_count(phase))
        .map(|_| spawn_meteor(phase, -500, -40, rng))
        .collect()
}

/// Weighted draw: 35% life, 35% shot-boost, 30% teleport-shield.
pub fn pick_powerup_kind(roll: f64) -> PowerUpKind {
    if roll < 0.35 {
        PowerUpKind::Life
    } else if roll < 0.70 {
        PowerUpKind::ShotBoost
    } else {
        PowerUpKind::TeleportShield
    }
}

pub fn spawn_powerups(phase: u8, rng: &mut impl Rng) -> Vec<PowerUp> {
    let count = 3 + usize::from(phase) + rng.gen_range(3..=8);
    (0..count)
        .map(|_| {
            let x = random_x(rng, POWERUP_SIZE);
            let y = rng.gen_range(-1200..=-100) as f32;
            PowerUp::new(x, y, pick_powerup_kind(rng.gen::<f64>()))
        })
        .collect()
}
