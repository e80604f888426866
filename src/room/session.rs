//! One room's session: seating, state relay, authoritative HP, rematch
//! votes, and the power-up board.
//!
//! Room logic is split in two. `RoomState` is synchronous and channel-free
//! so every decision is unit-testable: it maps (seat, message) to a list
//! of (recipient, reply) pairs. `RoomSession` is the owning task that
//! feeds it from the input channel, runs the spawner deadlines, and
//! delivers replies to the seats' outboxes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::game::arena::Layout;
use crate::game::tuning::PLAYER_MAX_HP;
use crate::stats::StatsStore;
use crate::ws::protocol::{ClientMsg, ServerMsg, SlotAssignment};

use super::spawner::{PowerUpSpawner, SpawnerTick};
use super::{RoomInput, RoomRegistry};

/// Rooms still waiting for a second player are reclaimed after this long
pub const WAITING_ROOM_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    /// One seat filled, waiting for a joiner
    Waiting,
    Playing,
    /// A round ended; only rematch votes move the room forward
    RoundOver,
}

/// Who a reply goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Both,
    Slot(u8),
    NotSlot(u8),
}

impl Recipient {
    pub fn includes(&self, slot: u8) -> bool {
        match self {
            Recipient::Both => true,
            Recipient::Slot(s) => *s == slot,
            Recipient::NotSlot(s) => *s != slot,
        }
    }
}

pub type Outbound = Vec<(Recipient, ServerMsg)>;

/// Result of a join attempt
#[derive(Debug)]
pub enum JoinOutcome {
    Seated { slot: u8, msgs: Outbound },
    Rejected(ServerMsg),
}

/// Synchronous room state and decision logic
pub struct RoomState {
    pub code: String,
    pub phase: RoomPhase,
    pub layout: Layout,
    seats: [Option<Uuid>; 2],
    hp: [i32; 2],
    rematch_votes: [bool; 2],
}

impl RoomState {
    pub fn new(code: String) -> Self {
        Self {
            code,
            phase: RoomPhase::Waiting,
            layout: Layout::Classic,
            seats: [None, None],
            hp: [PLAYER_MAX_HP; 2],
            rematch_votes: [false, false],
        }
    }

    pub fn hp(&self, slot: u8) -> i32 {
        self.hp[slot as usize - 1]
    }

    pub fn slot_of(&self, conn_id: Uuid) -> Option<u8> {
        self.seats
            .iter()
            .position(|s| *s == Some(conn_id))
            .map(|i| i as u8 + 1)
    }

    pub fn seated_players(&self) -> usize {
        self.seats.iter().filter(|s| s.is_some()).count()
    }

    /// Seat a connection. The first seat gets the room-created ack; the
    /// second fills the room and starts the round.
    pub fn join<R: Rng>(&mut self, conn_id: Uuid, rng: &mut R) -> JoinOutcome {
        if self.seats.iter().all(|s| s.is_some()) {
            return JoinOutcome::Rejected(ServerMsg::JoinError {
                message: "Room is full".into(),
            });
        }
        if self.phase != RoomPhase::Waiting || self.slot_of(conn_id).is_some() {
            return JoinOutcome::Rejected(ServerMsg::JoinError {
                message: "Game already in progress".into(),
            });
        }
        if self.seats[0].is_none() {
            self.seats[0] = Some(conn_id);
            return JoinOutcome::Seated {
                slot: 1,
                msgs: vec![(
                    Recipient::Slot(1),
                    ServerMsg::RoomCreated {
                        room_id: self.code.clone(),
                    },
                )],
            };
        }
        self.seats[1] = Some(conn_id);
        self.phase = RoomPhase::Playing;
        self.layout = Layout::random(rng);
        self.hp = [PLAYER_MAX_HP; 2];
        let players = self
            .seats
            .iter()
            .enumerate()
            .filter_map(|(i, s)| {
                s.map(|id| SlotAssignment {
                    id,
                    slot: i as u8 + 1,
                })
            })
            .collect();
        JoinOutcome::Seated {
            slot: 2,
            msgs: vec![(
                Recipient::Both,
                ServerMsg::GameStart {
                    room_id: self.code.clone(),
                    layout: self.layout,
                    players,
                },
            )],
        }
    }

    /// Handle an in-round message from a seated connection. Power-up
    /// collection goes through the session, which owns the board.
    pub fn client_msg(&mut self, slot: u8, msg: ClientMsg) -> Outbound {
        match msg {
            ClientMsg::PlayerState {
                x,
                y,
                vx,
                vy,
                aim_angle,
            } if self.phase != RoomPhase::Waiting => vec![(
                Recipient::NotSlot(slot),
                ServerMsg::OpponentState {
                    slot,
                    x,
                    y,
                    vx,
                    vy,
                    aim_angle,
                },
            )],
            ClientMsg::BulletUpdate { bullets } if self.phase != RoomPhase::Waiting => {
                vec![(Recipient::NotSlot(slot), ServerMsg::BulletUpdate { bullets })]
            }
            ClientMsg::BulletDestroy { ids } if self.phase != RoomPhase::Waiting => {
                vec![(Recipient::NotSlot(slot), ServerMsg::BulletDestroy { ids })]
            }
            ClientMsg::WallHit { index, hp } if self.phase != RoomPhase::Waiting => {
                vec![(Recipient::NotSlot(slot), ServerMsg::WallHit { index, hp })]
            }
            ClientMsg::HitReport {
                target_slot,
                damage,
                bullet_id,
            } => self.arbitrate_hit(target_slot, damage, bullet_id),
            ClientMsg::Rematch => self.vote_rematch(slot).0,
            other => {
                debug!(room = %self.code, slot, msg = ?other, "ignoring message");
                Vec::new()
            }
        }
    }

    /// The single place HP changes. Both peers get the confirmed value;
    /// reaching zero ends the round exactly once.
    fn arbitrate_hit(&mut self, target_slot: u8, damage: i32, bullet_id: u64) -> Outbound {
        if self.phase != RoomPhase::Playing || !(1..=2).contains(&target_slot) || damage <= 0 {
            return Vec::new();
        }
        let idx = target_slot as usize - 1;
        let new_hp = (self.hp[idx] - damage).max(0);
        self.hp[idx] = new_hp;

        let mut out = vec![(
            Recipient::Both,
            ServerMsg::HitConfirm {
                target_slot,
                damage,
                new_hp,
                bullet_id,
            },
        )];
        if new_hp == 0 {
            self.phase = RoomPhase::RoundOver;
            out.push((
                Recipient::Both,
                ServerMsg::RoundEndServer {
                    winner_slot: 3 - target_slot,
                },
            ));
        }
        out
    }

    /// Record a rematch vote. Returns the replies and whether a fresh
    /// round just started (the session resets the power-up board then).
    pub fn vote_rematch(&mut self, slot: u8) -> (Outbound, bool) {
        if self.phase == RoomPhase::Waiting {
            return (Vec::new(), false);
        }
        self.rematch_votes[slot as usize - 1] = true;
        if self.rematch_votes == [true, true] {
            self.rematch_votes = [false, false];
            self.hp = [PLAYER_MAX_HP; 2];
            self.phase = RoomPhase::Playing;
            let mut rng = rand::thread_rng();
            self.layout = Layout::random(&mut rng);
            (
                vec![(
                    Recipient::Both,
                    ServerMsg::RematchStart {
                        layout: self.layout,
                    },
                )],
                true,
            )
        } else {
            (
                vec![(Recipient::NotSlot(slot), ServerMsg::RematchRequested)],
                false,
            )
        }
    }

    /// A seated connection went away: the other peer is told and the
    /// room closes. Returns None when the connection held no seat.
    pub fn disconnect(&mut self, conn_id: Uuid) -> Option<Outbound> {
        let slot = self.slot_of(conn_id)?;
        self.seats[slot as usize - 1] = None;
        Some(vec![(
            Recipient::NotSlot(slot),
            ServerMsg::OpponentDisconnected,
        )])
    }
}

/// The task owning one room
pub struct RoomSession {
    state: RoomState,
    outboxes: [Option<mpsc::Sender<ServerMsg>>; 2],
    input_rx: mpsc::Receiver<RoomInput>,
    spawner: PowerUpSpawner,
    player_count: Arc<AtomicUsize>,
    registry: Arc<RoomRegistry>,
    stats: Option<Arc<StatsStore>>,
    rng: ChaCha8Rng,
}

impl RoomSession {
    pub fn new(
        code: String,
        input_rx: mpsc::Receiver<RoomInput>,
        player_count: Arc<AtomicUsize>,
        registry: Arc<RoomRegistry>,
        stats: Option<Arc<StatsStore>>,
    ) -> Self {
        let rng = ChaCha8Rng::from_entropy();
        Self {
            state: RoomState::new(code),
            outboxes: [None, None],
            input_rx,
            spawner: PowerUpSpawner::new(),
            player_count,
            registry,
            stats,
            rng,
        }
    }

    pub async fn run(mut self) {
        let waiting_deadline = Instant::now() + WAITING_ROOM_TTL;
        loop {
            let deadline = match self.state.phase {
                RoomPhase::Waiting => Some(waiting_deadline),
                _ => self.spawner.next_deadline(),
            };
            tokio::select! {
                input = self.input_rx.recv() => {
                    match input {
                        Some(input) => {
                            if self.handle_input(input).await {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = async {
                    match deadline {
                        Some(d) => sleep_until(d).await,
                        None => std::future::pending().await,
                    }
                } => {
                    if self.handle_deadline().await {
                        break;
                    }
                }
            }
        }
        self.player_count.store(0, Ordering::Relaxed);
        self.registry.remove(&self.state.code);
        info!(room = %self.state.code, "room closed");
    }

    /// Returns true when the room should close
    async fn handle_input(&mut self, input: RoomInput) -> bool {
        match input {
            RoomInput::Join { conn_id, tx } => {
                match self.state.join(conn_id, &mut self.rng) {
                    JoinOutcome::Seated { slot, msgs } => {
                        self.outboxes[slot as usize - 1] = Some(tx);
                        self.player_count.fetch_add(1, Ordering::Relaxed);
                        if self.state.phase == RoomPhase::Playing {
                            info!(room = %self.state.code, layout = self.state.layout.name(), "game started");
                            self.spawner.reset(&mut self.rng, Instant::now());
                        }
                        self.deliver(msgs).await;
                    }
                    JoinOutcome::Rejected(msg) => {
                        let _ = tx.send(msg).await;
                    }
                }
                false
            }
            RoomInput::Client { conn_id, msg } => {
                let Some(slot) = self.state.slot_of(conn_id) else {
                    debug!(room = %self.state.code, %conn_id, "message from unseated connection");
                    return false;
                };
                match msg {
                    ClientMsg::PowerupCollect { id } => {
                        if self.state.phase == RoomPhase::Playing {
                            if let Some(kind) = self.spawner.take(id) {
                                self.deliver(vec![(
                                    Recipient::Both,
                                    ServerMsg::PowerupCollect { id, kind, slot },
                                )])
                                .await;
                            }
                        }
                    }
                    ClientMsg::Rematch => {
                        let (msgs, restarted) = self.state.vote_rematch(slot);
                        if restarted {
                            self.spawner.reset(&mut self.rng, Instant::now());
                            info!(room = %self.state.code, layout = self.state.layout.name(), "rematch started");
                        }
                        self.deliver(msgs).await;
                    }
                    other => {
                        let msgs = self.state.client_msg(slot, other);
                        self.handle_round_ends(&msgs);
                        self.deliver(msgs).await;
                    }
                }
                false
            }
            RoomInput::Disconnect { conn_id } => match self.state.disconnect(conn_id) {
                Some(msgs) => {
                    info!(room = %self.state.code, %conn_id, "player disconnected, closing room");
                    self.deliver(msgs).await;
                    true
                }
                None => false,
            },
        }
    }

    /// Returns true when the room should close
    async fn handle_deadline(&mut self) -> bool {
        let now = Instant::now();
        if self.state.phase == RoomPhase::Waiting {
            warn!(room = %self.state.code, "waiting room expired, reclaiming");
            return true;
        }
        match self.spawner.due(now) {
            Some(SpawnerTick::Spawn) => {
                if self.state.phase != RoomPhase::Playing {
                    self.spawner.stop();
                    return false;
                }
                let (id, x, y, kind) = self.spawner.spawn(&mut self.rng, now);
                self.deliver(vec![(
                    Recipient::Both,
                    ServerMsg::PowerupSpawn { id, x, y, kind },
                )])
                .await;
            }
            Some(SpawnerTick::Expire(id)) => {
                if self.spawner.expire(id) {
                    self.deliver(vec![(Recipient::Both, ServerMsg::PowerupExpire { id })])
                        .await;
                }
            }
            None => {}
        }
        false
    }

    /// HP exhaustion stops the spawn timer with the round; live power-ups
    /// keep their expiry timers.
    fn handle_round_ends(&mut self, msgs: &Outbound) {
        for (_, msg) in msgs {
            if let ServerMsg::RoundEndServer { winner_slot } = msg {
                self.spawner.stop();
                if let Some(stats) = &self.stats {
                    stats.record_round(*winner_slot);
                }
            }
        }
    }

    async fn deliver(&self, msgs: Outbound) {
        for (recipient, msg) in msgs {
            for slot in [1u8, 2u8] {
                if !recipient.includes(slot) {
                    continue;
                }
                if let Some(tx) = &self.outboxes[slot as usize - 1] {
                    // A slow or gone peer must not wedge the room
                    let _ = tx.send(msg.clone()).await;
                }
            }
        }
    }
}
