//! The per-client simulation engine.
//!
//! One `GameWorld` owns everything a client simulates: both entities, live
//! projectiles, walls, power-ups, and particles. `step` advances it by one
//! frame and reports side effects as events; in networked mode damage is
//! never applied locally, only detected and reported for server
//! arbitration.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::ai::AiController;
use super::arena::{build_walls, Arena, Layout, Wall};
use super::physics::PhysicsSystem;
use super::powerup::{ActiveEffects, PowerUp, PowerUpKind};
use super::tuning::*;

/// Which peer a projectile or entity belongs to, from the simulating
/// client's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Local,
    Remote,
}

/// Simulation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// Single-player against the AI; damage is arbitrated locally
    Solo,
    /// Networked head-to-head; damage round-trips through the server
    Net { my_slot: u8 },
}

/// A player or AI opponent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
    pub hp: i32,
    pub max_hp: i32,
    pub aim_angle: f64,
}

impl Entity {
    fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            radius: PLAYER_RADIUS,
            hp: PLAYER_MAX_HP,
            max_hp: PLAYER_MAX_HP,
            aim_angle: 0.0,
        }
    }
}

/// A live projectile simulated by this client
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
    pub owner: Side,
    pub bounces: u32,
    pub alive: bool,
    pub trail: VecDeque<(f64, f64)>,
}

impl Projectile {
    fn new(id: u64, x: f64, y: f64, vx: f64, vy: f64, owner: Side) -> Self {
        Self {
            id,
            x,
            y,
            vx,
            vy,
            radius: PROJECTILE_RADIUS,
            owner,
            bounces: 0,
            alive: true,
            trail: VecDeque::with_capacity(TRAIL_LENGTH),
        }
    }

    /// Damage this projectile deals on contact; zero until it has bounced
    pub fn damage(&self) -> i32 {
        BASE_DAMAGE * self.bounces as i32
    }

    fn record_trail(&mut self) {
        self.trail.push_front((self.x, self.y));
        self.trail.truncate(TRAIL_LENGTH);
    }
}

/// Decorative simulation state; consumers may render these
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub life: f64,
    pub size: f64,
}

/// One frame of player input
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputFrame {
    pub move_x: f64,
    pub move_y: f64,
    pub aim_angle: f64,
    pub fire_held: bool,
}

/// Side effects of a simulation step, reported outward
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A breakable wall lost a hit point
    WallDamaged { index: usize, hp: i32 },
    /// The wall at this index just broke
    WallBroken { index: usize },
    /// Local projectiles that died this step
    BulletsDestroyed { ids: Vec<u64> },
    /// Networked mode: a bounced projectile touched a player circle;
    /// report to the server, do not apply
    HitDetected {
        target_slot: u8,
        damage: i32,
        bullet_id: u64,
    },
    /// Solo mode: damage applied directly
    DamageApplied { target: Side, damage: i32 },
    /// A shield absorbed a hit and was consumed
    ShieldBlocked,
    /// Solo mode: the local player picked up a power-up
    PowerUpCollected { id: u32, kind: PowerUpKind },
    /// Networked mode: ask the server to collect this power-up
    PowerUpRequested { id: u32 },
    /// Solo mode: HP exhaustion ended the round
    RoundOver { winner: Side },
}

/// The whole of one client's simulated world
pub struct GameWorld {
    pub mode: GameMode,
    pub arena: Arena,
    pub layout: Layout,
    pub walls: Vec<Wall>,
    pub player: Entity,
    pub opponent: Entity,
    /// Active effects on the local player (the AI has none)
    pub effects: ActiveEffects,
    pub projectiles: Vec<Projectile>,
    pub particles: Vec<Particle>,
    pub powerups: Vec<PowerUp>,
    /// Simulation clock in milliseconds since round start
    pub clock_ms: f64,
    pub round_over: bool,
    charging: bool,
    charge_started_at: f64,
    last_shot_at: f64,
    next_bullet_id: u64,
    next_powerup_id: u32,
    powerup_timer_ms: f64,
    pending_collects: Vec<u32>,
    ai: Option<AiController>,
    rng: ChaCha8Rng,
}

impl GameWorld {
    pub fn new(mode: GameMode, layout: Layout, seed: u64) -> Self {
        let arena = Arena::standard();
        let walls = build_walls(layout, &arena);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let left_x = arena.x + 80.0;
        let right_x = arena.x + arena.w - 80.0;
        let mid_y = arena.y + arena.h / 2.0;

        // Slot 1 spawns on the left; in solo mode the player takes the
        // left side and the AI the right.
        let (player, opponent) = match mode {
            GameMode::Net { my_slot: 2 } => (Entity::at(right_x, mid_y), Entity::at(left_x, mid_y)),
            _ => (Entity::at(left_x, mid_y), Entity::at(right_x, mid_y)),
        };

        let my_slot = match mode {
            GameMode::Net { my_slot } => my_slot,
            GameMode::Solo => 0,
        };

        let powerup_timer_ms =
            rng.gen_range(POWERUP_SPAWN_MIN_MS as f64..POWERUP_SPAWN_MAX_MS as f64);

        Self {
            mode,
            arena,
            layout,
            walls,
            player,
            opponent,
            effects: ActiveEffects::default(),
            projectiles: Vec::new(),
            particles: Vec::new(),
            powerups: Vec::new(),
            clock_ms: 0.0,
            round_over: false,
            charging: false,
            charge_started_at: 0.0,
            last_shot_at: f64::MIN,
            next_bullet_id: my_slot as u64 * BULLET_ID_STRIDE,
            next_powerup_id: 0,
            powerup_timer_ms,
            pending_collects: Vec::new(),
            ai: match mode {
                GameMode::Solo => Some(AiController::new()),
                GameMode::Net { .. } => None,
            },
            rng,
        }
    }

    /// Room slot of the local player (1 in solo mode)
    pub fn my_slot(&self) -> u8 {
        match self.mode {
            GameMode::Net { my_slot } => my_slot,
            GameMode::Solo => 1,
        }
    }

    pub fn opponent_slot(&self) -> u8 {
        3 - self.my_slot()
    }

    /// Advance the world by one frame. `dt_ms` is clamped to the maximum
    /// simulation step before use.
    pub fn step(&mut self, dt_ms: f64, input: &InputFrame) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if self.round_over {
            return events;
        }

        let dt = crate::util::time::clamp_frame_delta(dt_ms);
        self.clock_ms += dt;
        let now = self.clock_ms;

        self.step_player_movement(now, input);
        self.step_opponent(now, dt);
        self.step_charge_fire(now, input);
        self.step_projectiles(&mut events);
        self.step_powerups(dt, &mut events);
        self.step_particles();

        events
    }

    fn step_player_movement(&mut self, now: f64, input: &InputFrame) {
        let boost = if self.effects.speed_active(now) {
            SPEED_BOOST_MULT
        } else {
            1.0
        };
        if input.move_x != 0.0 || input.move_y != 0.0 {
            let (nx, ny) = PhysicsSystem::normalize(input.move_x, input.move_y);
            self.player.vx = nx * PLAYER_SPEED * boost;
            self.player.vy = ny * PLAYER_SPEED * boost;
        } else {
            self.player.vx *= FRICTION;
            self.player.vy *= FRICTION;
        }
        self.player.aim_angle = input.aim_angle;

        Self::integrate_entity(&mut self.player, &self.arena, &self.walls);
    }

    fn step_opponent(&mut self, now: f64, dt: f64) {
        let Some(ai) = self.ai.as_mut() else {
            // Networked opponent moves via interpolation in the sync layer
            return;
        };
        let decision = ai.update(
            &mut self.rng,
            now,
            dt,
            self.opponent.x,
            self.opponent.y,
            self.player.x,
            self.player.y,
        );
        self.opponent.vx = decision.move_dir.0 * PLAYER_SPEED * AI_SPEED_FACTOR;
        self.opponent.vy = decision.move_dir.1 * PLAYER_SPEED * AI_SPEED_FACTOR;
        self.opponent.aim_angle =
            (self.player.y - self.opponent.y).atan2(self.player.x - self.opponent.x);

        Self::integrate_entity(&mut self.opponent, &self.arena, &self.walls);

        if let Some(shot) = decision.shot {
            let (vx, vy) = (shot.angle.cos() * shot.speed, shot.angle.sin() * shot.speed);
            let x = self.opponent.x + shot.angle.cos() * (self.opponent.radius + MUZZLE_OFFSET);
            let y = self.opponent.y + shot.angle.sin() * (self.opponent.radius + MUZZLE_OFFSET);
            let id = self.next_bullet_id;
            self.next_bullet_id += 1;
            self.projectiles
                .push(Projectile::new(id, x, y, vx, vy, Side::Remote));
        }
    }

    /// Move an entity by its velocity, clamp to the arena interior, and
    /// resolve against every intact wall
    fn integrate_entity(e: &mut Entity, arena: &Arena, walls: &[Wall]) {
        e.x += e.vx;
        e.y += e.vy;
        let (cx, cy) = PhysicsSystem::clamp_to_arena(e.x, e.y, e.radius, ARENA_CLAMP_INSET, arena);
        e.x = cx;
        e.y = cy;
        for wall in walls.iter().filter(|w| w.intact()) {
            if let Some((px, py)) = PhysicsSystem::push_out_of_wall(e.x, e.y, e.radius, wall) {
                e.x = px;
                e.y = py;
            }
        }
    }

    fn step_charge_fire(&mut self, now: f64, input: &InputFrame) {
        if input.fire_held && !self.charging {
            self.charging = true;
            self.charge_started_at = now;
            return;
        }
        if input.fire_held || !self.charging {
            return;
        }
        // Release: the charge is spent whether or not the shot goes off
        self.charging = false;

        let cooldown = if self.effects.rapid_active(now) {
            SHOOT_COOLDOWN_MS * 0.5
        } else {
            SHOOT_COOLDOWN_MS
        };
        if now - self.last_shot_at < cooldown {
            return;
        }
        self.last_shot_at = now;

        let charge = ((now - self.charge_started_at) / MAX_CHARGE_MS).min(1.0);
        let speed = MIN_SHOT_SPEED + charge * (MAX_SHOT_SPEED - MIN_SHOT_SPEED);
        let angle = self.player.aim_angle;

        if self.effects.triple_charges > 0 {
            self.effects.triple_charges -= 1;
            for offset in [-TRIPLE_SPREAD_RAD, 0.0, TRIPLE_SPREAD_RAD] {
                self.fire_local(angle + offset, speed);
            }
        } else {
            self.fire_local(angle, speed);
        }
    }

    fn fire_local(&mut self, angle: f64, speed: f64) {
        let x = self.player.x + angle.cos() * (self.player.radius + MUZZLE_OFFSET);
        let y = self.player.y + angle.sin() * (self.player.radius + MUZZLE_OFFSET);
        let id = self.next_bullet_id;
        self.next_bullet_id += 1;
        self.projectiles.push(Projectile::new(
            id,
            x,
            y,
            angle.cos() * speed,
            angle.sin() * speed,
            Side::Local,
        ));
    }

    fn step_projectiles(&mut self, events: &mut Vec<EngineEvent>) {
        let mut destroyed: Vec<u64> = Vec::new();
        let mut bursts: Vec<(f64, f64, usize)> = Vec::new();

        for i in 0..self.projectiles.len() {
            let p = &mut self.projectiles[i];
            p.x += p.vx;
            p.y += p.vy;
            p.record_trail();

            // Wall collision: first intact wall wins this step
            let (px, py, pr, pvx, pvy) = (p.x, p.y, p.radius, p.vx, p.vy);
            let mut bounce: Option<(usize, f64, f64, f64, f64)> = None;
            for (wi, wall) in self.walls.iter().enumerate() {
                if !wall.intact() {
                    continue;
                }
                if PhysicsSystem::circle_rect_overlap(px, py, pr, wall) {
                    let (nx, ny, nvx, nvy, _) =
                        PhysicsSystem::reflect_off_wall(px, py, pvx, pvy, pr, wall);
                    bounce = Some((wi, nx, ny, nvx, nvy));
                    break;
                }
            }
            if let Some((wi, nx, ny, nvx, nvy)) = bounce {
                let p = &mut self.projectiles[i];
                p.x = nx;
                p.y = ny;
                p.vx = nvx;
                p.vy = nvy;
                p.bounces += 1;
                bursts.push((nx, ny, PARTICLES_BOUNCE));
                if let Some(hp) = self.walls[wi].damage() {
                    events.push(EngineEvent::WallDamaged { index: wi, hp });
                    if hp <= 0 {
                        let w = &self.walls[wi];
                        bursts.push((w.x + w.w / 2.0, w.y + w.h / 2.0, PARTICLES_WALL_BREAK));
                        events.push(EngineEvent::WallBroken { index: wi });
                    }
                }
            }

            self.resolve_projectile_damage(i, events, &mut bursts);

            let p = &mut self.projectiles[i];
            let a = &self.arena;
            if p.x < a.x - PROJECTILE_OOB_MARGIN
                || p.x > a.x + a.w + PROJECTILE_OOB_MARGIN
                || p.y < a.y - PROJECTILE_OOB_MARGIN
                || p.y > a.y + a.h + PROJECTILE_OOB_MARGIN
            {
                p.alive = false;
            }
            p.vx *= PROJECTILE_DECAY;
            p.vy *= PROJECTILE_DECAY;
            if (p.vx * p.vx + p.vy * p.vy).sqrt() < PROJECTILE_MIN_SPEED {
                p.alive = false;
            }
            if !p.alive {
                destroyed.push(p.id);
            }
        }

        self.projectiles.retain(|p| p.alive);
        for (x, y, n) in bursts {
            self.spawn_particles(x, y, n);
        }
        if !destroyed.is_empty() {
            events.push(EngineEvent::BulletsDestroyed { ids: destroyed });
        }
    }

    /// Bounce-gated damage: projectiles are inert until they have
    /// ricocheted at least once. The opponent circle is checked first,
    /// then the local player (own shots can come back around).
    fn resolve_projectile_damage(
        &mut self,
        i: usize,
        events: &mut Vec<EngineEvent>,
        bursts: &mut Vec<(f64, f64, usize)>,
    ) {
        let p = &self.projectiles[i];
        if p.bounces == 0 || !p.alive {
            return;
        }
        let damage = p.damage();
        let (px, py, pr, id) = (p.x, p.y, p.radius, p.id);

        let o = &self.opponent;
        if PhysicsSystem::circles_overlap(px, py, pr, o.x, o.y, o.radius) {
            bursts.push((o.x, o.y, PARTICLES_HIT));
            match self.mode {
                GameMode::Solo => {
                    self.opponent.hp = (self.opponent.hp - damage).max(0);
                    events.push(EngineEvent::DamageApplied {
                        target: Side::Remote,
                        damage,
                    });
                    if self.opponent.hp == 0 {
                        self.round_over = true;
                        events.push(EngineEvent::RoundOver {
                            winner: Side::Local,
                        });
                    }
                }
                GameMode::Net { .. } => {
                    events.push(EngineEvent::HitDetected {
                        target_slot: self.opponent_slot(),
                        damage,
                        bullet_id: id,
                    });
                }
            }
            self.projectiles[i].alive = false;
            return;
        }

        let me = &self.player;
        if PhysicsSystem::circles_overlap(px, py, pr, me.x, me.y, me.radius) {
            if self.effects.consume_shield() {
                bursts.push((me.x, me.y, PARTICLES_SHIELD_BLOCK));
                events.push(EngineEvent::ShieldBlocked);
            } else {
                bursts.push((me.x, me.y, PARTICLES_HIT));
                match self.mode {
                    GameMode::Solo => {
                        self.player.hp = (self.player.hp - damage).max(0);
                        events.push(EngineEvent::DamageApplied {
                            target: Side::Local,
                            damage,
                        });
                        if self.player.hp == 0 {
                            self.round_over = true;
                            events.push(EngineEvent::RoundOver {
                                winner: Side::Remote,
                            });
                        }
                    }
                    GameMode::Net { .. } => {
                        events.push(EngineEvent::HitDetected {
                            target_slot: self.my_slot(),
                            damage,
                            bullet_id: id,
                        });
                    }
                }
            }
            self.projectiles[i].alive = false;
        }
    }

    fn step_powerups(&mut self, dt: f64, events: &mut Vec<EngineEvent>) {
        let now = self.clock_ms;

        if self.mode == GameMode::Solo {
            self.powerup_timer_ms -= dt;
            if self.powerup_timer_ms <= 0.0 {
                self.spawn_powerup_local(now);
                self.powerup_timer_ms = self
                    .rng
                    .gen_range(POWERUP_SPAWN_MIN_MS as f64..POWERUP_SPAWN_MAX_MS as f64);
            }
            self.powerups.retain(|pu| !pu.expired(now));
        }

        let me = &self.player;
        let mut collected: Vec<(u32, PowerUpKind)> = Vec::new();
        for pu in &self.powerups {
            let close = PhysicsSystem::dist(me.x, me.y, pu.x, pu.y) < me.radius + POWERUP_RADIUS;
            if !close {
                continue;
            }
            match self.mode {
                GameMode::Solo => collected.push((pu.id, pu.kind)),
                GameMode::Net { .. } => {
                    if !self.pending_collects.contains(&pu.id) {
                        events.push(EngineEvent::PowerUpRequested { id: pu.id });
                    }
                }
            }
        }
        match self.mode {
            GameMode::Solo => {
                for (id, kind) in collected {
                    self.powerups.retain(|pu| pu.id != id);
                    self.effects.apply(kind, now);
                    events.push(EngineEvent::PowerUpCollected { id, kind });
                }
            }
            GameMode::Net { .. } => {
                for ev in events.iter() {
                    if let EngineEvent::PowerUpRequested { id } = ev {
                        self.pending_collects.push(*id);
                    }
                }
            }
        }
    }

    fn spawn_powerup_local(&mut self, now: f64) {
        let kind = PowerUpKind::random(&mut self.rng);
        let (x, y) = super::powerup::place_avoiding_walls(&mut self.rng, &self.arena, &self.walls);
        let id = self.next_powerup_id;
        self.next_powerup_id += 1;
        self.powerups.push(PowerUp {
            id,
            x,
            y,
            kind,
            spawned_at: now,
        });
    }

    fn step_particles(&mut self) {
        for p in &mut self.particles {
            p.x += p.vx;
            p.y += p.vy;
            p.life -= PARTICLE_LIFE_DECAY;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    pub fn spawn_particles(&mut self, x: f64, y: f64, count: usize) {
        for _ in 0..count {
            let angle = self.rng.gen::<f64>() * std::f64::consts::TAU;
            let speed = self.rng.gen_range(1.0..4.0);
            self.particles.push(Particle {
                x,
                y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                life: 1.0,
                size: self.rng.gen_range(2.0..5.0),
            });
        }
    }

    /// Wire state of all live local projectiles
    pub fn local_bullet_states(&self) -> Vec<crate::ws::protocol::BulletState> {
        self.projectiles
            .iter()
            .filter(|p| p.owner == Side::Local)
            .map(|p| crate::ws::protocol::BulletState {
                id: p.id,
                x: p.x,
                y: p.y,
                vx: p.vx,
                vy: p.vy,
                bounces: p.bounces,
            })
            .collect()
    }

    /// Remove a power-up (server said collected or expired)
    pub fn remove_powerup(&mut self, id: u32) {
        self.powerups.retain(|pu| pu.id != id);
        self.pending_collects.retain(|&pid| pid != id);
    }

    /// Insert a server-spawned power-up
    pub fn add_powerup(&mut self, id: u32, x: f64, y: f64, kind: PowerUpKind) {
        self.powerups.push(PowerUp {
            id,
            x,
            y,
            kind,
            spawned_at: self.clock_ms,
        });
    }

    /// Test hook: spawn a local projectile directly
    #[cfg(test)]
    pub(crate) fn inject_projectile(&mut self, x: f64, y: f64, vx: f64, vy: f64, bounces: u32) -> u64 {
        let id = self.next_bullet_id;
        self.next_bullet_id += 1;
        let mut p = Projectile::new(id, x, y, vx, vy, Side::Local);
        p.bounces = bounces;
        self.projectiles.push(p);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solo_world() -> GameWorld {
        GameWorld::new(GameMode::Solo, Layout::Open, 42)
    }

    fn net_world(slot: u8) -> GameWorld {
        GameWorld::new(GameMode::Net { my_slot: slot }, Layout::Open, 42)
    }

    fn idle() -> InputFrame {
        InputFrame::default()
    }

    #[test]
    fn bullet_ids_are_namespaced_per_slot() {
        let mut w1 = net_world(1);
        let mut w2 = net_world(2);
        let a = w1.inject_projectile(200.0, 200.0, 1.0, 0.0, 0);
        let b = w2.inject_projectile(200.0, 200.0, 1.0, 0.0, 0);
        assert_eq!(a, BULLET_ID_STRIDE);
        assert_eq!(b, 2 * BULLET_ID_STRIDE);
    }

    #[test]
    fn friction_decays_velocity_without_input() {
        let mut w = solo_world();
        w.player.vx = 2.0;
        w.player.vy = -2.0;
        w.step(16.0, &idle());
        assert!((w.player.vx - 2.0 * FRICTION).abs() < 1e-9);
        assert!((w.player.vy + 2.0 * FRICTION).abs() < 1e-9);
    }

    #[test]
    fn movement_is_normalized_and_scaled() {
        let mut w = solo_world();
        let input = InputFrame {
            move_x: 1.0,
            move_y: 1.0,
            ..Default::default()
        };
        w.step(16.0, &input);
        let speed = (w.player.vx * w.player.vx + w.player.vy * w.player.vy).sqrt();
        assert!((speed - PLAYER_SPEED).abs() < 1e-9);
    }

    #[test]
    fn speed_boost_multiplies_movement() {
        let mut w = solo_world();
        w.effects.apply(PowerUpKind::Speed, 0.0);
        let input = InputFrame {
            move_x: 1.0,
            move_y: 0.0,
            ..Default::default()
        };
        w.step(16.0, &input);
        assert!((w.player.vx - PLAYER_SPEED * SPEED_BOOST_MULT).abs() < 1e-9);
    }

    #[test]
    fn player_stays_clamped_inside_arena() {
        let mut w = solo_world();
        let input = InputFrame {
            move_x: -1.0,
            move_y: 0.0,
            ..Default::default()
        };
        for _ in 0..500 {
            w.step(16.0, &input);
        }
        assert!(w.player.x >= w.arena.x + w.player.radius + ARENA_CLAMP_INSET - 1e-9);
    }

    #[test]
    fn unbounced_projectile_deals_no_damage() {
        let mut w = solo_world();
        let (ox, oy) = (w.opponent.x, w.opponent.y);
        w.inject_projectile(ox - 10.0, oy, 1.0, 0.0, 0);
        let before = w.opponent.hp;
        let events = w.step(16.0, &idle());
        assert_eq!(w.opponent.hp, before);
        assert!(!events
            .iter()
            .any(|e| matches!(e, EngineEvent::DamageApplied { .. })));
    }

    #[test]
    fn damage_scales_with_bounce_count() {
        let mut w = solo_world();
        let (ox, oy) = (w.opponent.x, w.opponent.y);
        w.inject_projectile(ox - 20.0, oy, 1.0, 0.0, 3);
        let before = w.opponent.hp;
        let events = w.step(16.0, &idle());
        assert_eq!(before - w.opponent.hp, BASE_DAMAGE * 3);
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::DamageApplied { target: Side::Remote, damage } if *damage == BASE_DAMAGE * 3)));
    }

    #[test]
    fn net_mode_reports_instead_of_applying() {
        let mut w = net_world(1);
        let (ox, oy) = (w.opponent.x, w.opponent.y);
        let id = w.inject_projectile(ox - 20.0, oy, 1.0, 0.0, 2);
        let before = w.opponent.hp;
        let events = w.step(16.0, &idle());
        assert_eq!(w.opponent.hp, before, "no local application in net mode");
        assert!(events.iter().any(|e| matches!(
            e,
            EngineEvent::HitDetected { target_slot: 2, damage, bullet_id }
                if *damage == BASE_DAMAGE * 2 && *bullet_id == id
        )));
    }

    #[test]
    fn shield_blocks_one_hit_then_clears() {
        let mut w = solo_world();
        w.effects.apply(PowerUpKind::Shield, 0.0);
        let (mx, my) = (w.player.x, w.player.y);
        w.inject_projectile(mx - 20.0, my, 1.0, 0.0, 2);
        let before = w.player.hp;
        let events = w.step(16.0, &idle());
        assert_eq!(w.player.hp, before);
        assert!(!w.effects.shield);
        assert!(events.iter().any(|e| matches!(e, EngineEvent::ShieldBlocked)));

        // Second hit goes through
        w.inject_projectile(w.player.x - 20.0, w.player.y, 1.0, 0.0, 1);
        w.step(16.0, &idle());
        assert_eq!(w.player.hp, before - BASE_DAMAGE);
    }

    #[test]
    fn slow_projectile_is_retired_and_reported() {
        let mut w = solo_world();
        let id = w.inject_projectile(300.0, 300.0, 0.3, 0.0, 0);
        let events = w.step(16.0, &idle());
        assert!(w.projectiles.is_empty());
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::BulletsDestroyed { ids } if ids.contains(&id))));
    }

    #[test]
    fn out_of_bounds_projectile_is_retired() {
        let mut w = solo_world();
        let x = w.arena.x + w.arena.w + PROJECTILE_OOB_MARGIN + 5.0;
        w.inject_projectile(x, 300.0, 2.0, 0.0, 0);
        w.step(16.0, &idle());
        assert!(w.projectiles.is_empty());
    }

    #[test]
    fn trail_is_bounded() {
        let mut w = solo_world();
        w.inject_projectile(100.0, 300.0, 3.0, 0.0, 0);
        for _ in 0..TRAIL_LENGTH * 2 {
            w.step(16.0, &idle());
            if w.projectiles.is_empty() {
                return;
            }
        }
        assert!(w.projectiles[0].trail.len() <= TRAIL_LENGTH);
    }

    #[test]
    fn wall_bounce_damages_and_breaks_wall() {
        let mut w = solo_world();
        // Aim a projectile at the first breakable wall (index 4)
        let wall = w.walls[4];
        let (wx, wy) = (wall.x + wall.w / 2.0, wall.y + wall.h / 2.0);
        let mut broke = false;
        for _ in 0..WALL_HP {
            w.inject_projectile(wx, wy - wall.h / 2.0 - 6.0, 0.0, 4.0, 0);
            let events = w.step(16.0, &idle());
            for e in &events {
                if let EngineEvent::WallDamaged { index, .. } = e {
                    assert_eq!(*index, 4);
                }
                if matches!(e, EngineEvent::WallBroken { index: 4 }) {
                    broke = true;
                }
            }
            // Clear surviving projectiles between shots
            w.projectiles.clear();
        }
        assert!(broke, "wall breaks after {WALL_HP} bounces");
        assert!(!w.walls[4].intact());
    }

    #[test]
    fn charge_maps_linearly_to_shot_speed() {
        let mut w = net_world(1);
        let held = InputFrame {
            fire_held: true,
            ..Default::default()
        };
        w.step(16.0, &held);
        // Hold for the full charge duration
        let mut elapsed = 16.0;
        while elapsed < MAX_CHARGE_MS + 100.0 {
            w.step(50.0, &held);
            elapsed += 50.0;
        }
        w.step(16.0, &idle());
        assert_eq!(w.projectiles.len(), 1);
        let p = &w.projectiles[0];
        let speed = (p.vx * p.vx + p.vy * p.vy).sqrt();
        // One step of decay already applied after the shot went off
        assert!((speed - MAX_SHOT_SPEED).abs() < 0.05);
    }

    #[test]
    fn cooldown_throttles_repeat_fire() {
        let mut w = net_world(1);
        let held = InputFrame {
            fire_held: true,
            ..Default::default()
        };
        w.step(16.0, &held);
        w.step(16.0, &idle());
        assert_eq!(w.projectiles.len(), 1);
        // Immediate re-fire is swallowed by the cooldown
        w.step(16.0, &held);
        w.step(16.0, &idle());
        assert_eq!(w.projectiles.len(), 1);
    }

    #[test]
    fn triple_shot_consumes_a_charge_for_three_projectiles() {
        let mut w = net_world(1);
        w.effects.apply(PowerUpKind::Triple, 0.0);
        let held = InputFrame {
            fire_held: true,
            ..Default::default()
        };
        w.step(16.0, &held);
        w.step(16.0, &idle());
        assert_eq!(w.projectiles.len(), 3);
        assert_eq!(w.effects.triple_charges, TRIPLE_CHARGES - 1);
    }

    #[test]
    fn solo_round_ends_once_on_hp_exhaustion() {
        let mut w = solo_world();
        w.opponent.hp = BASE_DAMAGE;
        let (ox, oy) = (w.opponent.x, w.opponent.y);
        w.inject_projectile(ox - 20.0, oy, 1.0, 0.0, 1);
        let events = w.step(16.0, &idle());
        assert!(events.iter().any(|e| matches!(
            e,
            EngineEvent::RoundOver {
                winner: Side::Local
            }
        )));
        assert!(w.round_over);
        // Further steps are inert
        let events = w.step(16.0, &idle());
        assert!(events.is_empty());
    }

    #[test]
    fn solo_powerup_collection_applies_effect() {
        let mut w = solo_world();
        w.add_powerup(7, w.player.x + 5.0, w.player.y, PowerUpKind::Shield);
        let events = w.step(16.0, &idle());
        assert!(events.iter().any(|e| matches!(
            e,
            EngineEvent::PowerUpCollected {
                id: 7,
                kind: PowerUpKind::Shield
            }
        )));
        assert!(w.effects.shield);
        assert!(w.powerups.is_empty());
    }

    #[test]
    fn net_powerup_collection_is_requested_once() {
        let mut w = net_world(1);
        w.add_powerup(3, w.player.x + 5.0, w.player.y, PowerUpKind::Rapid);
        let events = w.step(16.0, &idle());
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::PowerUpRequested { id: 3 })));
        assert!(!w.effects.rapid_active(w.clock_ms), "no local application");
        // Still overlapping next step, but the request is not repeated
        let events = w.step(16.0, &idle());
        assert!(!events
            .iter()
            .any(|e| matches!(e, EngineEvent::PowerUpRequested { .. })));
        // Server confirmation clears the pending entry
        w.remove_powerup(3);
        assert!(w.powerups.is_empty());
    }

    #[test]
    fn ai_mode_spawns_powerups_on_schedule() {
        let mut w = solo_world();
        let mut elapsed = 0.0;
        while elapsed <= POWERUP_SPAWN_MAX_MS as f64 + 100.0 {
            w.step(50.0, &idle());
            elapsed += 50.0;
        }
        assert!(
            !w.powerups.is_empty() || !w.effects.eq(&ActiveEffects::default()),
            "a power-up spawned (or was already collected) within the max interval"
        );
    }
}
