//! Ricochet Rivals server library.
//!
//! An authoritative relay server for a two-player arena shooter. Clients
//! run their own simulations ([`game`]); the server seats them in rooms
//! ([`room`]), relays positional state, arbitrates all HP changes, and
//! spawns power-ups. Transport is JSON over WebSocket ([`ws`]).

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod room;
pub mod stats;
pub mod util;
pub mod ws;

pub use app::AppState;
pub use config::Config;
pub use http::build_router;
