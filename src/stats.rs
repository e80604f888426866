//! Round-outcome statistics, persisted as a small JSON file.
//!
//! Best-effort: a missing or corrupt file starts from zeroed counters,
//! and persistence failures are logged without disturbing gameplay.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("failed to write stats file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode stats: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Counters carried across restarts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub rooms_created: u64,
    pub rounds_completed: u64,
    /// Round wins by room slot (index 0 is slot 1)
    pub wins_by_slot: [u64; 2],
}

/// Shared, file-backed statistics store
pub struct StatsStore {
    path: PathBuf,
    inner: Mutex<StatsSnapshot>,
}

impl StatsStore {
    /// Open the store at `path`, starting fresh when the file is missing
    /// or unreadable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let snapshot = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(snap) => snap,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "corrupt stats file, starting fresh");
                    StatsSnapshot::default()
                }
            },
            Err(_) => StatsSnapshot::default(),
        };
        Self {
            path,
            inner: Mutex::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        *self.inner.lock()
    }

    pub fn record_room_created(&self) {
        let snap = {
            let mut inner = self.inner.lock();
            inner.rooms_created += 1;
            *inner
        };
        self.persist(snap);
    }

    pub fn record_round(&self, winner_slot: u8) {
        let snap = {
            let mut inner = self.inner.lock();
            inner.rounds_completed += 1;
            if (1..=2).contains(&winner_slot) {
                inner.wins_by_slot[winner_slot as usize - 1] += 1;
            }
            *inner
        };
        self.persist(snap);
    }

    fn persist(&self, snap: StatsSnapshot) {
        if let Err(e) = write_snapshot(&self.path, &snap) {
            warn!(path = %self.path.display(), error = %e, "failed to persist stats");
        }
    }
}

fn write_snapshot(path: &Path, snap: &StatsSnapshot) -> Result<(), StatsError> {
    let json = serde_json::to_string_pretty(snap)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("rr-stats-{}.json", Uuid::new_v4()))
    }

    #[test]
    fn counters_survive_a_reload() {
        let path = temp_path();
        let store = StatsStore::load(&path);
        store.record_room_created();
        store.record_round(1);
        store.record_round(2);
        store.record_round(2);

        let reloaded = StatsStore::load(&path);
        let snap = reloaded.snapshot();
        assert_eq!(snap.rooms_created, 1);
        assert_eq!(snap.rounds_completed, 3);
        assert_eq!(snap.wins_by_slot, [1, 2]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn corrupt_file_starts_fresh() {
        let path = temp_path();
        std::fs::write(&path, "{not json").unwrap();
        let store = StatsStore::load(&path);
        assert_eq!(store.snapshot(), StatsSnapshot::default());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn out_of_range_winner_still_counts_the_round() {
        let path = temp_path();
        let store = StatsStore::load(&path);
        store.record_round(7);
        let snap = store.snapshot();
        assert_eq!(snap.rounds_completed, 1);
        assert_eq!(snap.wins_by_slot, [0, 0]);
        let _ = std::fs::remove_file(&path);
    }
}
