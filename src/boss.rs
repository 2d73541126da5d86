//! Boss damage model and firing AI.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::constants::{
    BOSS_CENTER, BOSS_FIRE_CADENCE_MS, BOSS_H, BOSS_MAX_CORE, BOSS_MAX_LEFT, BOSS_MAX_RIGHT,
    BOSS_SHOT_SPEED, BOSS_W, HEIGHT, WIDTH,
};
use crate::entities::{Boss, BossPart, Player, Projectile, ProjectileOwner, Rect};

impl Boss {
    pub fn new(cx: f32, cy: f32) -> Self {
        Boss {
            rect: Rect::from_center(cx, cy, BOSS_W, BOSS_H),
            hp_left: BOSS_MAX_LEFT,
            hp_core: BOSS_MAX_CORE,
            hp_right: BOSS_MAX_RIGHT,
            max_left: BOSS_MAX_LEFT,
            max_core: BOSS_MAX_CORE,
            max_right: BOSS_MAX_RIGHT,
            projectiles: Vec::new(),
            since_last_shot_ms: 0,
            fire_cadence_ms: BOSS_FIRE_CADENCE_MS,
        }
    }

    /// Boss at its usual spot, full health.
    pub fn spawn() -> Self {
        Boss::new(BOSS_CENTER.0, BOSS_CENTER.1)
    }

    pub fn hp(&self, part: BossPart) -> u32 {
        match part {
            BossPart::Left => self.hp_left,
            BossPart::Core => self.hp_core,
            BossPart::Right => self.hp_right,
        }
    }

    pub fn total_hp(&self) -> u32 {
        self.hp_left + self.hp_core + self.hp_right
    }

    pub fn max_total_hp(&self) -> u32 {
        self.max_left + self.max_core + self.max_right
    }

    pub fn is_defeated(&self) -> bool {
        self.total_hp() == 0
    }

    /// Which third of the body a horizontal world position falls in.
    pub fn part_at(&self, x: f32) -> BossPart {
        let rel_x = x - self.rect.x;
        let third = self.rect.w / 3.0;
        if rel_x < third {
            BossPart::Left
        } else if rel_x < 2.0 * third {
            BossPart::Core
        } else {
            BossPart::Right
        }
    }

    /// HP saturates at 0.
    pub fn take_damage_to_part(&mut self, part: BossPart, dmg: u32) {
        let hp = match part {
            BossPart::Left => &mut self.hp_left,
            BossPart::Core => &mut self.hp_core,
            BossPart::Right => &mut self.hp_right,
        };
        *hp = hp.saturating_sub(dmg);
    }

    pub fn alive_parts(&self) -> Vec<BossPart> {
        [BossPart::Left, BossPart::Core, BossPart::Right]
            .into_iter()
            .filter(|&part| self.hp(part) > 0)
            .collect()
    }

    /// Muzzle position for a part: side thirds fire from their own centre line.
    pub fn fire_origin(&self, part: BossPart) -> (f32, f32) {
        let offset = match part {
            BossPart::Left => -self.rect.w / 3.0,
            BossPart::Core => 0.0,
            BossPart::Right => self.rect.w / 3.0,
        };
        (self.rect.center_x() + offset, self.rect.center_y())
    }

    /// One boss tick: maybe fire at a live player, then move and cull shots.
    /// Returns true if a projectile was emitted.
    pub fn update(&mut self, players: &[Player], dt_ms: u32, rng: &mut impl Rng) -> bool {
        self.since_last_shot_ms = self.since_last_shot_ms.saturating_add(dt_ms);
        let mut fired = false;

        if self.since_last_shot_ms > self.fire_cadence_ms {
            let targets: Vec<&Player> = players.iter().filter(|p| p.is_alive()).collect();
            let parts = self.alive_parts();
            if let (Some(&part), Some(target)) = (parts.choose(rng), targets.choose(rng)) {
                let (ox, oy) = self.fire_origin(part);
                let dx = target.rect.center_x() - ox;
                let dy = target.rect.center_y() - oy;
                let dist = match dx.hypot(dy) {
                    d if d == 0.0 => 1.0,
                    d => d,
                };
                self.projectiles.push(Projectile::new(
                    ox,
                    oy,
                    dx / dist * BOSS_SHOT_SPEED,
                    dy / dist * BOSS_SHOT_SPEED,
                    ProjectileOwner::Boss,
                ));
                fired = true;
            }
            self.since_last_shot_ms = 0;
        }

        for proj in &mut self.projectiles {
            proj.update();
        }
        self.projectiles.retain(|p| in_play_area(&p.rect));
        fired
    }
}

/// Lazy culling test for aimed shots: centre inside the world.
fn in_play_area(rect: &Rect) -> bool {
    (0.0..=WIDTH).contains(&rect.center_x()) && (0.0..=HEIGHT).contains(&rect.center_y())
}
