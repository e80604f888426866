//! Gameplay tuning constants, in logical units and milliseconds.
//! Both peers must agree on these for their simulations to stay close.

/// Logical world size; the arena is inset from this
pub const LOGICAL_W: f64 = 800.0;
pub const LOGICAL_H: f64 = 600.0;

// Players
pub const PLAYER_RADIUS: f64 = 18.0;
pub const PLAYER_SPEED: f64 = 3.5;
pub const PLAYER_MAX_HP: i32 = 100;
/// Velocity retained per step with no movement input
pub const FRICTION: f64 = 0.85;
/// Extra inset keeping entities off the border walls
pub const ARENA_CLAMP_INSET: f64 = 10.0;
/// Movement multiplier while the speed-boost effect is active
pub const SPEED_BOOST_MULT: f64 = 1.5;

// Projectiles
pub const PROJECTILE_RADIUS: f64 = 5.0;
pub const MIN_SHOT_SPEED: f64 = 6.0;
pub const MAX_SHOT_SPEED: f64 = 14.0;
/// Charge time mapping to full shot speed
pub const MAX_CHARGE_MS: f64 = 1500.0;
pub const SHOOT_COOLDOWN_MS: f64 = 400.0;
/// Per-step velocity decay
pub const PROJECTILE_DECAY: f64 = 0.9995;
/// Projectiles slower than this are retired
pub const PROJECTILE_MIN_SPEED: f64 = 0.5;
/// Distance past the arena edge at which a projectile is retired
pub const PROJECTILE_OOB_MARGIN: f64 = 50.0;
pub const TRAIL_LENGTH: usize = 12;
/// Muzzle offset past the firing entity's radius
pub const MUZZLE_OFFSET: f64 = 8.0;
pub const BASE_DAMAGE: i32 = 15;
/// Angular spread of the triple-shot side projectiles
pub const TRIPLE_SPREAD_RAD: f64 = 0.15;

// Walls
pub const WALL_HP: i32 = 3;
pub const BORDER_THICKNESS: f64 = 8.0;

// AI opponent
pub const AI_SHOOT_INTERVAL_MS: f64 = 1800.0;
pub const AI_MOVE_MIN_MS: f64 = 500.0;
pub const AI_MOVE_MAX_MS: f64 = 1500.0;
/// Chance per re-aim that the AI heads toward/away from the player
pub const AI_SEEK_CHANCE: f64 = 0.6;
pub const AI_FLEE_DISTANCE: f64 = 150.0;
pub const AI_AIM_JITTER_RAD: f64 = 1.2;
/// AI shots stay in the lower portion of the speed range
pub const AI_MAX_SPEED_FRACTION: f64 = 0.7;
/// AI moves slightly slower than the player
pub const AI_SPEED_FACTOR: f64 = 0.8;

// Power-ups
pub const POWERUP_SPAWN_MIN_MS: u64 = 10_000;
pub const POWERUP_SPAWN_MAX_MS: u64 = 15_000;
pub const POWERUP_LIFETIME_MS: u64 = 15_000;
pub const POWERUP_RADIUS: f64 = 14.0;
/// Duration of the rapid-fire and speed-boost effects
pub const EFFECT_DURATION_MS: f64 = 8000.0;
pub const TRIPLE_CHARGES: u32 = 3;
/// Placement attempts before falling back to the arena center (solo mode)
pub const POWERUP_PLACE_ATTEMPTS: u32 = 50;
/// Margin from the arena edge for solo-mode placement
pub const POWERUP_PLACE_MARGIN: f64 = 30.0;

// Synchronization cadence
pub const STATE_SYNC_INTERVAL_MS: f64 = 50.0;
pub const BULLET_SYNC_INTERVAL_MS: f64 = 33.0;
/// Interpolation factor per step toward the latest remote entity state
pub const ENTITY_LERP: f64 = 0.2;
/// Steeper factor for remote bullets
pub const BULLET_LERP: f64 = 0.3;

/// Bullet id namespace size per player slot
pub const BULLET_ID_STRIDE: u64 = 100_000;

// Particles
pub const PARTICLE_LIFE_DECAY: f64 = 0.02;
pub const PARTICLES_BOUNCE: usize = 5;
pub const PARTICLES_HIT: usize = 10;
pub const PARTICLES_WALL_BREAK: usize = 15;
pub const PARTICLES_SHIELD_BLOCK: usize = 15;
