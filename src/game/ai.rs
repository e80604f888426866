//! Solo-mode opponent: timer-driven wander/seek/flee movement and
//! jittered ricochet shots aimed at the player.

use rand::Rng;

use super::physics::PhysicsSystem;
use super::tuning::{
    AI_AIM_JITTER_RAD, AI_FLEE_DISTANCE, AI_MAX_SPEED_FRACTION, AI_MOVE_MAX_MS, AI_MOVE_MIN_MS,
    AI_SEEK_CHANCE, AI_SHOOT_INTERVAL_MS, MAX_SHOT_SPEED, MIN_SHOT_SPEED,
};

/// A shot the AI wants to fire this step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiShot {
    pub angle: f64,
    pub speed: f64,
}

/// Movement heading plus an optional shot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiDecision {
    pub move_dir: (f64, f64),
    pub shot: Option<AiShot>,
}

/// State for the AI opponent between steps
#[derive(Debug, Clone)]
pub struct AiController {
    move_timer_ms: f64,
    move_dir: (f64, f64),
    last_shot_at: f64,
}

impl AiController {
    pub fn new() -> Self {
        Self {
            move_timer_ms: 0.0,
            move_dir: (0.0, 0.0),
            last_shot_at: 0.0,
        }
    }

    /// Advance the controller by `dt_ms`. `(sx, sy)` is the AI position,
    /// `(px, py)` the human player's.
    pub fn update<R: Rng>(
        &mut self,
        rng: &mut R,
        now: f64,
        dt_ms: f64,
        sx: f64,
        sy: f64,
        px: f64,
        py: f64,
    ) -> AiDecision {
        self.move_timer_ms -= dt_ms;
        if self.move_timer_ms <= 0.0 {
            self.move_timer_ms = rng.gen_range(AI_MOVE_MIN_MS..AI_MOVE_MAX_MS);
            if rng.gen_bool(AI_SEEK_CHANCE) {
                let (tx, ty) = PhysicsSystem::normalize(px - sx, py - sy);
                let flee = PhysicsSystem::dist(px, py, sx, sy) < AI_FLEE_DISTANCE;
                self.move_dir = if flee { (-tx, -ty) } else { (tx, ty) };
            } else {
                let angle = rng.gen::<f64>() * std::f64::consts::TAU;
                self.move_dir = (angle.cos(), angle.sin());
            }
        }

        let shot = if now - self.last_shot_at > AI_SHOOT_INTERVAL_MS {
            self.last_shot_at = now;
            let to_player = (py - sy).atan2(px - sx);
            let angle = to_player + rng.gen_range(-AI_AIM_JITTER_RAD..AI_AIM_JITTER_RAD);
            let speed = rng.gen_range(MIN_SHOT_SPEED..MAX_SHOT_SPEED * AI_MAX_SPEED_FRACTION);
            Some(AiShot { angle, speed })
        } else {
            None
        };

        AiDecision {
            move_dir: self.move_dir,
            shot,
        }
    }
}

impl Default for AiController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn fires_on_interval_not_before() {
        let mut ai = AiController::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let d1 = ai.update(&mut rng, 100.0, 16.0, 600.0, 300.0, 100.0, 300.0);
        assert!(d1.shot.is_none());
        let d2 = ai.update(
            &mut rng,
            AI_SHOOT_INTERVAL_MS + 1.0,
            16.0,
            600.0,
            300.0,
            100.0,
            300.0,
        );
        assert!(d2.shot.is_some());
        // Interval restarts after a shot
        let d3 = ai.update(
            &mut rng,
            AI_SHOOT_INTERVAL_MS + 100.0,
            16.0,
            600.0,
            300.0,
            100.0,
            300.0,
        );
        assert!(d3.shot.is_none());
    }

    #[test]
    fn shot_speed_stays_in_lower_band() {
        let mut ai = AiController::new();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut now = 0.0;
        for _ in 0..50 {
            now += AI_SHOOT_INTERVAL_MS + 1.0;
            let d = ai.update(&mut rng, now, 16.0, 600.0, 300.0, 100.0, 300.0);
            let shot = d.shot.expect("interval elapsed");
            assert!(shot.speed >= MIN_SHOT_SPEED);
            assert!(shot.speed < MAX_SHOT_SPEED * AI_MAX_SPEED_FRACTION);
        }
    }

    #[test]
    fn heading_is_unit_length_when_moving() {
        let mut ai = AiController::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let d = ai.update(&mut rng, 0.0, 16.0, 600.0, 300.0, 100.0, 300.0);
        let (x, y) = d.move_dir;
        let len = (x * x + y * y).sqrt();
        assert!((len - 1.0).abs() < 1e-9);
    }
}
