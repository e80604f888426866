//! Server-side power-up scheduling for a networked room.
//!
//! The session task owns one spawner per room and folds its deadlines
//! into its select loop, so spawn and expiry timers die with the room.
//! Spawning runs only while a round is live; stopping it leaves the
//! expiry timers of already-spawned power-ups intact.

use std::collections::VecDeque;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

use crate::game::powerup::PowerUpKind;
use crate::game::tuning::{POWERUP_LIFETIME_MS, POWERUP_SPAWN_MAX_MS, POWERUP_SPAWN_MIN_MS};

/// Why a spawner deadline fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnerTick {
    Spawn,
    Expire(u32),
}

/// A power-up currently sitting in a networked arena
#[derive(Debug, Clone, Copy)]
struct ActivePowerUp {
    id: u32,
    kind: PowerUpKind,
    expires_at: Instant,
}

/// Room-scoped power-up spawner
#[derive(Default)]
pub struct PowerUpSpawner {
    next_id: u32,
    /// None while spawning is stopped (no round live)
    next_spawn_at: Option<Instant>,
    /// Oldest first; spawn order matches expiry order
    active: VecDeque<ActivePowerUp>,
}

impl PowerUpSpawner {
    /// A fresh spawner is stopped; `reset` arms it when a round starts
    pub fn new() -> Self {
        Self::default()
    }

    fn spawn_interval<R: Rng>(rng: &mut R) -> Duration {
        Duration::from_millis(rng.gen_range(POWERUP_SPAWN_MIN_MS..POWERUP_SPAWN_MAX_MS))
    }

    /// Earliest pending deadline, or None when nothing is scheduled
    pub fn next_deadline(&self) -> Option<Instant> {
        let expiry = self.active.front().map(|pu| pu.expires_at);
        match (self.next_spawn_at, expiry) {
            (Some(s), Some(e)) => Some(s.min(e)),
            (Some(s), None) => Some(s),
            (None, Some(e)) => Some(e),
            (None, None) => None,
        }
    }

    /// Resolve which deadline fired at `now`
    pub fn due(&self, now: Instant) -> Option<SpawnerTick> {
        if let Some(pu) = self.active.front() {
            let before_spawn = self.next_spawn_at.map_or(true, |s| pu.expires_at <= s);
            if pu.expires_at <= now && before_spawn {
                return Some(SpawnerTick::Expire(pu.id));
            }
        }
        match self.next_spawn_at {
            Some(s) if s <= now => Some(SpawnerTick::Spawn),
            _ => None,
        }
    }

    /// Spawn a power-up somewhere in the arena interior and schedule the
    /// next spawn. Placement samples freely; clients resolve any wall
    /// overlap visually.
    pub fn spawn<R: Rng>(&mut self, rng: &mut R, now: Instant) -> (u32, f64, f64, PowerUpKind) {
        let id = self.next_id;
        self.next_id += 1;
        let kind = PowerUpKind::random(rng);
        let x = 80.0 + rng.gen::<f64>() * 640.0;
        let y = 100.0 + rng.gen::<f64>() * 400.0;
        self.active.push_back(ActivePowerUp {
            id,
            kind,
            expires_at: now + Duration::from_millis(POWERUP_LIFETIME_MS),
        });
        self.next_spawn_at = Some(now + Self::spawn_interval(rng));
        (id, x, y, kind)
    }

    /// Claim a power-up for a collector. First claim wins; the loser's
    /// request finds nothing here and is dropped.
    pub fn take(&mut self, id: u32) -> Option<PowerUpKind> {
        let idx = self.active.iter().position(|pu| pu.id == id)?;
        self.active.remove(idx).map(|pu| pu.kind)
    }

    /// Remove an expired power-up, returning whether it was still active
    pub fn expire(&mut self, id: u32) -> bool {
        self.take(id).is_some()
    }

    /// Stop spawning. Already-spawned power-ups keep their expiry timers.
    pub fn stop(&mut self) {
        self.next_spawn_at = None;
    }

    /// Clear the board and arm the spawn timer (game start, rematch)
    pub fn reset<R: Rng>(&mut self, rng: &mut R, now: Instant) {
        self.active.clear();
        self.next_spawn_at = Some(now + Self::spawn_interval(rng));
    }
}
