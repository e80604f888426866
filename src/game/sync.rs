//! Networked-mode synchronization: outbound relay cadence and inbound
//! application of relayed peer state.
//!
//! Entity and bullet positions are sent on fixed intervals and smoothed
//! on arrival with exponential interpolation. Damage, destruction, and
//! wall events go out immediately; HP is only ever written from
//! server confirmations.

use std::collections::{HashMap, VecDeque};

use crate::ws::protocol::{ClientMsg, ServerMsg};

use super::arena::Layout;
use super::engine::{EngineEvent, GameWorld};
use super::physics::PhysicsSystem;
use super::powerup::PowerUpKind;
use super::tuning::{
    ARENA_CLAMP_INSET, BULLET_LERP, BULLET_SYNC_INTERVAL_MS, ENTITY_LERP, PARTICLES_HIT,
    STATE_SYNC_INTERVAL_MS, TRAIL_LENGTH,
};

/// A peer-owned projectile mirrored for display and smoothed toward the
/// latest relayed position. Never damages anything on this side.
#[derive(Debug, Clone)]
pub struct RemoteBullet {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub bounces: u32,
    pub trail: VecDeque<(f64, f64)>,
    target_x: f64,
    target_y: f64,
}

/// In-round outcomes the caller reacts to (round flow, rematch votes)
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    RoundEnded { winner_slot: u8, local_won: bool },
    RematchRequested,
    RematchStarted { layout: Layout },
    OpponentLeft,
    PowerUpTaken { id: u32, kind: PowerUpKind, slot: u8 },
}

/// Synchronization state for one networked round
#[derive(Debug, Default)]
pub struct NetSync {
    last_state_sent_ms: f64,
    last_bullets_sent_ms: f64,
    opponent_target: Option<(f64, f64)>,
    remote_bullets: HashMap<u64, RemoteBullet>,
}

impl NetSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remote_bullets(&self) -> &HashMap<u64, RemoteBullet> {
        &self.remote_bullets
    }

    /// Translate a step's engine events plus the send cadence into wire
    /// messages. Event-driven messages always go; positional state only
    /// when its interval has elapsed.
    pub fn outbound(&mut self, world: &GameWorld, events: &[EngineEvent]) -> Vec<ClientMsg> {
        let mut out = Vec::new();

        for ev in events {
            match ev {
                EngineEvent::WallDamaged { index, hp } => out.push(ClientMsg::WallHit {
                    index: *index,
                    hp: *hp,
                }),
                EngineEvent::BulletsDestroyed { ids } => {
                    out.push(ClientMsg::BulletDestroy { ids: ids.clone() })
                }
                EngineEvent::HitDetected {
                    target_slot,
                    damage,
                    bullet_id,
                } => out.push(ClientMsg::HitReport {
                    target_slot: *target_slot,
                    damage: *damage,
                    bullet_id: *bullet_id,
                }),
                EngineEvent::PowerUpRequested { id } => {
                    out.push(ClientMsg::PowerupCollect { id: *id })
                }
                _ => {}
            }
        }

        let now = world.clock_ms;
        if now - self.last_state_sent_ms >= STATE_SYNC_INTERVAL_MS {
            self.last_state_sent_ms = now;
            let p = &world.player;
            out.push(ClientMsg::PlayerState {
                x: p.x,
                y: p.y,
                vx: p.vx,
                vy: p.vy,
                aim_angle: p.aim_angle,
            });
        }

        let bullets = world.local_bullet_states();
        if !bullets.is_empty() && now - self.last_bullets_sent_ms >= BULLET_SYNC_INTERVAL_MS {
            self.last_bullets_sent_ms = now;
            out.push(ClientMsg::BulletUpdate { bullets });
        }

        out
    }

    /// Per-frame smoothing of remote state: the opponent entity eases
    /// toward its last relayed position, remote bullets extrapolate by
    /// their velocity and ease toward theirs.
    pub fn interpolate(&mut self, world: &mut GameWorld) {
        if let Some((tx, ty)) = self.opponent_target {
            let o = &mut world.opponent;
            o.x += (tx - o.x) * ENTITY_LERP;
            o.y += (ty - o.y) * ENTITY_LERP;
            let (cx, cy) =
                PhysicsSystem::clamp_to_arena(o.x, o.y, o.radius, ARENA_CLAMP_INSET, &world.arena);
            o.x = cx;
            o.y = cy;
        }

        for b in self.remote_bullets.values_mut() {
            b.target_x += b.vx;
            b.target_y += b.vy;
            b.x += (b.target_x - b.x) * BULLET_LERP;
            b.y += (b.target_y - b.y) * BULLET_LERP;
            b.trail.push_front((b.x, b.y));
            b.trail.truncate(TRAIL_LENGTH);
        }
    }

    /// Apply one in-round server message to the world. Lobby-phase
    /// messages (room creation, join results, game start) are handled
    /// before a round exists and are ignored here.
    pub fn apply(&mut self, msg: &ServerMsg, world: &mut GameWorld) -> Option<SyncEvent> {
        match msg {
            ServerMsg::OpponentState {
                x,
                y,
                vx,
                vy,
                aim_angle,
                ..
            } => {
                self.opponent_target = Some((*x, *y));
                world.opponent.vx = *vx;
                world.opponent.vy = *vy;
                world.opponent.aim_angle = *aim_angle;
                None
            }
            ServerMsg::BulletUpdate { bullets } => {
                for s in bullets {
                    match self.remote_bullets.get_mut(&s.id) {
                        Some(b) => {
                            b.target_x = s.x;
                            b.target_y = s.y;
                            b.vx = s.vx;
                            b.vy = s.vy;
                            b.bounces = s.bounces;
                        }
                        None => {
                            self.remote_bullets.insert(
                                s.id,
                                RemoteBullet {
                                    x: s.x,
                                    y: s.y,
                                    vx: s.vx,
                                    vy: s.vy,
                                    bounces: s.bounces,
                                    trail: VecDeque::with_capacity(TRAIL_LENGTH),
                                    target_x: s.x,
                                    target_y: s.y,
                                },
                            );
                        }
                    }
                }
                None
            }
            ServerMsg::BulletDestroy { ids } => {
                for id in ids {
                    self.remote_bullets.remove(id);
                }
                None
            }
            ServerMsg::WallHit { index, hp } => {
                if let Some(wall) = world.walls.get_mut(*index) {
                    wall.apply_remote_hp(*hp);
                }
                None
            }
            ServerMsg::HitConfirm {
                target_slot,
                new_hp,
                ..
            } => {
                if *target_slot == world.my_slot() {
                    world.player.hp = *new_hp;
                    let (x, y) = (world.player.x, world.player.y);
                    world.spawn_particles(x, y, PARTICLES_HIT);
                } else {
                    world.opponent.hp = *new_hp;
                    let (x, y) = (world.opponent.x, world.opponent.y);
                    world.spawn_particles(x, y, PARTICLES_HIT);
                }
                None
            }
            ServerMsg::RoundEndServer { winner_slot } => {
                world.round_over = true;
                Some(SyncEvent::RoundEnded {
                    winner_slot: *winner_slot,
                    local_won: *winner_slot == world.my_slot(),
                })
            }
            ServerMsg::RematchRequested => Some(SyncEvent::RematchRequested),
            ServerMsg::RematchStart { layout } => {
                Some(SyncEvent::RematchStarted { layout: *layout })
            }
            ServerMsg::OpponentDisconnected => Some(SyncEvent::OpponentLeft),
            ServerMsg::PowerupSpawn { id, x, y, kind } => {
                world.add_powerup(*id, *x, *y, *kind);
                None
            }
            ServerMsg::PowerupCollect { id, kind, slot } => {
                world.remove_powerup(*id);
                if *slot == world.my_slot() {
                    let now = world.clock_ms;
                    world.effects.apply(*kind, now);
                }
                Some(SyncEvent::PowerUpTaken {
                    id: *id,
                    kind: *kind,
                    slot: *slot,
                })
            }
            ServerMsg::PowerupExpire { id } => {
                world.remove_powerup(*id);
                None
            }
            ServerMsg::RoomCreated { .. }
            | ServerMsg::JoinError { .. }
            | ServerMsg::GameStart { .. } => None,
        }
    }
}
