//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::arena::Layout;
use crate::game::powerup::PowerUpKind;

/// One projectile's state inside a bullet batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BulletState {
    /// Peer-namespaced bullet id (never collides across the two clients)
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Wall bounces so far; gates damage on the receiving side
    pub bounces: u32,
}

/// Slot assignment sent with game-start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotAssignment {
    /// Connection identity (socket id equivalent)
    pub id: Uuid,
    /// Room slot, 1 or 2
    pub slot: u8,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Open a new room; the sender becomes slot 1
    CreateRoom,

    /// Join an existing room by its 4-character code
    JoinRoom { code: String },

    /// Periodic local entity state (relayed to the other peer)
    PlayerState {
        x: f64,
        y: f64,
        vx: f64,
        vy: f64,
        aim_angle: f64,
    },

    /// Periodic batch of live local projectiles
    BulletUpdate { bullets: Vec<BulletState> },

    /// Projectiles that died locally this step
    BulletDestroy { ids: Vec<u64> },

    /// Locally observed wall damage (index is the layout-stable wall id)
    WallHit { index: usize, hp: i32 },

    /// Locally observed hit on a player circle; the server arbitrates
    HitReport {
        target_slot: u8,
        damage: i32,
        bullet_id: u64,
    },

    /// Attempt to collect a power-up by id
    PowerupCollect { id: u32 },

    /// Vote for a rematch
    Rematch,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Room created; sender holds slot 1 and waits for a joiner
    RoomCreated { room_id: String },

    /// Create/join failure, reported to the requester only
    JoinError { message: String },

    /// Both players present; round begins
    GameStart {
        room_id: String,
        layout: Layout,
        players: Vec<SlotAssignment>,
    },

    /// Relayed state of the other peer
    OpponentState {
        slot: u8,
        x: f64,
        y: f64,
        vx: f64,
        vy: f64,
        aim_angle: f64,
    },

    /// Relayed projectile batch from the other peer
    BulletUpdate { bullets: Vec<BulletState> },

    /// Relayed projectile destroy list from the other peer
    BulletDestroy { ids: Vec<u64> },

    /// Relayed wall damage from the other peer
    WallHit { index: usize, hp: i32 },

    /// Authoritative damage confirmation (both peers converge on new_hp)
    HitConfirm {
        target_slot: u8,
        damage: i32,
        new_hp: i32,
        bullet_id: u64,
    },

    /// Round over; hp for the losing slot reached zero
    RoundEndServer { winner_slot: u8 },

    /// The other peer asked for a rematch
    RematchRequested,

    /// Both peers voted; fresh round starts with this layout
    RematchStart { layout: Layout },

    /// The other peer disconnected; the room is gone
    OpponentDisconnected,

    /// Server-spawned power-up
    PowerupSpawn {
        id: u32,
        x: f64,
        y: f64,
        kind: PowerUpKind,
    },

    /// A power-up was collected by `slot`
    PowerupCollect {
        id: u32,
        kind: PowerUpKind,
        slot: u8,
    },

    /// An uncollected power-up timed out
    PowerupExpire { id: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_msg_wire_shape() {
        let msg = ClientMsg::HitReport {
            target_slot: 2,
            damage: 45,
            bullet_id: 100003,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "hit_report");
        assert_eq!(json["target_slot"], 2);
        assert_eq!(json["damage"], 45);
    }

    #[test]
    fn server_msg_layout_is_lowercase() {
        let msg = ServerMsg::RematchStart {
            layout: Layout::Fortress,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "rematch_start");
        assert_eq!(json["layout"], "fortress");
    }

    #[test]
    fn bullet_batch_round_trips() {
        let msg = ClientMsg::BulletUpdate {
            bullets: vec![BulletState {
                id: 200001,
                x: 120.0,
                y: 90.5,
                vx: -3.0,
                vy: 7.25,
                bounces: 2,
            }],
        };
        let json = serde_json::to_string(&msg).unwrap();
        match serde_json::from_str::<ClientMsg>(&json).unwrap() {
            ClientMsg::BulletUpdate { bullets } => {
                assert_eq!(bullets.len(), 1);
                assert_eq!(bullets[0].id, 200001);
                assert_eq!(bullets[0].bounces, 2);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
