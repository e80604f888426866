//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::room::RoomRegistry;
use crate::stats::StatsStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub rooms: Arc<RoomRegistry>,
    pub stats: Arc<StatsStore>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let stats = Arc::new(StatsStore::load(config.stats_path.clone()));
        let rooms = Arc::new(RoomRegistry::with_stats(stats.clone()));

        Self {
            config,
            rooms,
            stats,
        }
    }
}
