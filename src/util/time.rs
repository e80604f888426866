//! Time utilities for the simulation and server

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Largest frame delta the simulation accepts, in milliseconds.
/// A stalled client steps at most this far per frame.
pub const MAX_FRAME_DELTA_MS: f64 = 50.0;

/// Clamp a raw frame delta to the maximum simulation step.
pub fn clamp_frame_delta(dt_ms: f64) -> f64 {
    dt_ms.min(MAX_FRAME_DELTA_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_delta_clamps_large_stalls() {
        assert_eq!(clamp_frame_delta(400.0), MAX_FRAME_DELTA_MS);
        assert_eq!(clamp_frame_delta(16.7), 16.7);
    }
}
