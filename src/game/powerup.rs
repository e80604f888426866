//! Power-up kinds, timed/counted effects, and solo-mode placement

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::arena::{Arena, Wall};
use super::tuning::{
    EFFECT_DURATION_MS, POWERUP_LIFETIME_MS, POWERUP_PLACE_ATTEMPTS, POWERUP_PLACE_MARGIN,
    POWERUP_RADIUS, TRIPLE_CHARGES,
};

/// The four power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    Rapid,
    Shield,
    Speed,
    Triple,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::Rapid,
        PowerUpKind::Shield,
        PowerUpKind::Speed,
        PowerUpKind::Triple,
    ];

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// A power-up sitting in the arena
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerUp {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub kind: PowerUpKind,
    /// Simulation clock at spawn, milliseconds
    pub spawned_at: f64,
}

impl PowerUp {
    pub fn expired(&self, now: f64) -> bool {
        now - self.spawned_at >= POWERUP_LIFETIME_MS as f64
    }
}

/// Active effect state for one entity
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActiveEffects {
    /// Rapid-fire expiry timestamp; 0 when inactive
    pub rapid_until: f64,
    /// Shield absorbs exactly one hit
    pub shield: bool,
    /// Speed-boost expiry timestamp; 0 when inactive
    pub speed_until: f64,
    /// Remaining triple-shot charges
    pub triple_charges: u32,
}

impl ActiveEffects {
    pub fn apply(&mut self, kind: PowerUpKind, now: f64) {
        match kind {
            PowerUpKind::Rapid => self.rapid_until = now + EFFECT_DURATION_MS,
            PowerUpKind::Shield => self.shield = true,
            PowerUpKind::Speed => self.speed_until = now + EFFECT_DURATION_MS,
            PowerUpKind::Triple => self.triple_charges = TRIPLE_CHARGES,
        }
    }

    pub fn rapid_active(&self, now: f64) -> bool {
        self.rapid_until > now
    }

    pub fn speed_active(&self, now: f64) -> bool {
        self.speed_until > now
    }

    /// Consume the shield for one hit. Returns true if a hit was absorbed.
    pub fn consume_shield(&mut self) -> bool {
        std::mem::take(&mut self.shield)
    }
}

/// Pick a spawn position that avoids intact walls, rejection-sampling up
/// to the attempt cap and falling back to the arena center. Solo mode
/// only; the server-side spawner samples without wall rejection.
pub fn place_avoiding_walls<R: Rng>(rng: &mut R, arena: &Arena, walls: &[Wall]) -> (f64, f64) {
    let m = POWERUP_PLACE_MARGIN;
    for _ in 0..POWERUP_PLACE_ATTEMPTS {
        let x = arena.x + m + rng.gen::<f64>() * (arena.w - m * 2.0);
        let y = arena.y + m + rng.gen::<f64>() * (arena.h - m * 2.0);
        let blocked = walls.iter().any(|w| {
            w.intact()
                && x + POWERUP_RADIUS > w.x
                && x - POWERUP_RADIUS < w.x + w.w
                && y + POWERUP_RADIUS > w.y
                && y - POWERUP_RADIUS < w.y + w.h
        });
        if !blocked {
            return (x, y);
        }
    }
    arena.center()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn effects_apply_and_expire() {
        let mut fx = ActiveEffects::default();
        fx.apply(PowerUpKind::Rapid, 1000.0);
        assert!(fx.rapid_active(1000.1));
        assert!(fx.rapid_active(1000.0 + EFFECT_DURATION_MS - 1.0));
        assert!(!fx.rapid_active(1000.0 + EFFECT_DURATION_MS));
    }

    #[test]
    fn shield_absorbs_exactly_one_hit() {
        let mut fx = ActiveEffects::default();
        fx.apply(PowerUpKind::Shield, 0.0);
        assert!(fx.consume_shield());
        assert!(!fx.shield);
        assert!(!fx.consume_shield());
    }

    #[test]
    fn triple_grants_fixed_charges() {
        let mut fx = ActiveEffects::default();
        fx.apply(PowerUpKind::Triple, 0.0);
        assert_eq!(fx.triple_charges, TRIPLE_CHARGES);
    }

    #[test]
    fn powerup_lifetime_boundary() {
        let pu = PowerUp {
            id: 0,
            x: 0.0,
            y: 0.0,
            kind: PowerUpKind::Speed,
            spawned_at: 1000.0,
        };
        assert!(!pu.expired(1000.0 + POWERUP_LIFETIME_MS as f64 - 1.0));
        assert!(pu.expired(1000.0 + POWERUP_LIFETIME_MS as f64));
    }

    #[test]
    fn placement_avoids_intact_walls() {
        let arena = Arena::standard();
        let walls = crate::game::arena::build_walls(crate::game::arena::Layout::Corridors, &arena);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            let (x, y) = place_avoiding_walls(&mut rng, &arena, &walls);
            if (x, y) == arena.center() {
                continue; // fallback position is allowed to touch walls
            }
            for w in walls.iter().filter(|w| w.intact()) {
                let overlaps = x + POWERUP_RADIUS > w.x
                    && x - POWERUP_RADIUS < w.x + w.w
                    && y + POWERUP_RADIUS > w.y
                    && y - POWERUP_RADIUS < w.y + w.h;
                assert!(!overlaps, "power-up at ({x},{y}) overlaps a wall");
            }
        }
    }
}
