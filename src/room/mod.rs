//! Room lifecycle: code generation, the registry of live rooms, and the
//! per-room session task.

pub mod session;
pub mod spawner;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use rand::Rng;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::stats::StatsStore;
use crate::ws::protocol::{ClientMsg, ServerMsg};
use session::RoomSession;

/// Room-code alphabet; ambiguous glyphs (0/O, 1/I) are excluded
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const ROOM_CODE_LEN: usize = 4;

/// Input channel depth per room
const ROOM_INPUT_BUFFER: usize = 256;

pub fn generate_room_code<R: Rng>(rng: &mut R) -> String {
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Everything a room task can receive
#[derive(Debug)]
pub enum RoomInput {
    /// A connection wants a seat; `tx` is its private outbox
    Join {
        conn_id: Uuid,
        tx: mpsc::Sender<ServerMsg>,
    },
    /// An in-room message from a seated connection
    Client { conn_id: Uuid, msg: ClientMsg },
    /// The connection's socket closed
    Disconnect { conn_id: Uuid },
}

/// Handle to a running room task
#[derive(Clone)]
pub struct RoomHandle {
    pub code: String,
    pub input_tx: mpsc::Sender<RoomInput>,
    pub player_count: Arc<AtomicUsize>,
}

impl RoomHandle {
    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }
}

/// Registry of all live rooms, keyed by room code
pub struct RoomRegistry {
    rooms: DashMap<String, RoomHandle>,
    stats: Option<Arc<StatsStore>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            stats: None,
        }
    }

    pub fn with_stats(stats: Arc<StatsStore>) -> Self {
        Self {
            rooms: DashMap::new(),
            stats: Some(stats),
        }
    }

    pub fn get(&self, code: &str) -> Option<RoomHandle> {
        self.rooms.get(code).map(|r| r.value().clone())
    }

    pub fn remove(&self, code: &str) -> Option<RoomHandle> {
        self.rooms.remove(code).map(|(_, h)| h)
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn total_players(&self) -> usize {
        self.rooms.iter().map(|r| r.value().player_count()).sum()
    }

    /// Reserve a code no live room is using
    pub fn unique_code<R: Rng>(&self, rng: &mut R) -> String {
        loop {
            let code = generate_room_code(rng);
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }

    /// Create a room and spawn its session task. The caller still has to
    /// send a `RoomInput::Join` for the creator to take slot 1.
    pub fn create_room(self: &Arc<Self>) -> RoomHandle {
        let code = {
            let mut rng = rand::thread_rng();
            self.unique_code(&mut rng)
        };
        let (input_tx, input_rx) = mpsc::channel(ROOM_INPUT_BUFFER);
        let player_count = Arc::new(AtomicUsize::new(0));

        let handle = RoomHandle {
            code: code.clone(),
            input_tx,
            player_count: player_count.clone(),
        };
        self.rooms.insert(code.clone(), handle.clone());

        if let Some(stats) = &self.stats {
            stats.record_room_created();
        }
        let session = RoomSession::new(
            code.clone(),
            input_rx,
            player_count,
            Arc::clone(self),
            self.stats.clone(),
        );
        tokio::spawn(session.run());

        info!(room = %code, "room created");
        handle
    }
}

impl Default for RoomRegistry {
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
    fn codes_use_the_restricted_alphabet() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..200 {
            let code = generate_room_code(&mut rng);
            assert_eq!(code.len(), ROOM_CODE_LEN);
            for b in code.bytes() {
                assert!(ROOM_CODE_ALPHABET.contains(&b), "bad glyph {}", b as char);
                assert!(!b"01OI".contains(&b));
            }
        }
    }

    #[test]
    fn unique_code_skips_collisions() {
        let registry = RoomRegistry::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let taken = generate_room_code(&mut rng);
        registry.rooms.insert(
            taken.clone(),
            RoomHandle {
                code: taken.clone(),
                input_tx: mpsc::channel(1).0,
                player_count: Arc::new(AtomicUsize::new(1)),
            },
        );
        // Same seed would reproduce `taken` first; the registry must move on
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let code = registry.unique_code(&mut rng);
        assert_ne!(code, taken);
    }

    #[test]
    fn registry_counts_rooms_and_players() {
        let registry = RoomRegistry::new();
        assert_eq!(registry.active_rooms(), 0);
        registry.rooms.insert(
            "AAAA".into(),
            RoomHandle {
                code: "AAAA".into(),
                input_tx: mpsc::channel(1).0,
                player_count: Arc::new(AtomicUsize::new(2)),
            },
        );
        assert_eq!(registry.active_rooms(), 1);
        assert_eq!(registry.total_players(), 2);
        assert!(registry.get("AAAA").is_some());
        assert!(registry.get("BBBB").is_none());
        registry.remove("AAAA");
        assert_eq!(registry.active_rooms(), 0);
    }
}
