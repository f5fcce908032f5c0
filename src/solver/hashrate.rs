// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/solver/hashrate.rs
// Version: 0.9.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// Per-device hash rate tracking: a monotonic attempt counter paired with a
// start instant. The dispatch thread adds, the reporting thread reads; both
// sides see untorn values.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Backdate applied on re-arm so the first dispatch after a reset does not
/// report an inflated rate.
const REARM_BACKDATE: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct HashMeter {
    hash_count: AtomicU64,
    start: Mutex<Instant>,
}

impl HashMeter {
    pub fn new() -> Self {
        Self {
            hash_count: AtomicU64::new(0),
            start: Mutex::new(Instant::now() - REARM_BACKDATE),
        }
    }

    /// Record one completed dispatch's worth of attempts.
    pub fn add(&self, hashes: u64) {
        self.hash_count.fetch_add(hashes, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.hash_count.load(Ordering::Relaxed)
    }

    /// Hashes per second since the last re-arm; 0 when no time has elapsed.
    pub fn rate(&self) -> u64 {
        let start = *self.start.lock().unwrap_or_else(|e| e.into_inner());
        let elapsed = start.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            return 0;
        }
        (self.hash_count.load(Ordering::Relaxed) as f64 / elapsed) as u64
    }

    /// Reset the counter and backdate the clock. Called on new work and on
    /// resume from pause.
    pub fn rearm(&self) {
        let mut start = self.start.lock().unwrap_or_else(|e| e.into_inner());
        *start = Instant::now() - REARM_BACKDATE;
        self.hash_count.store(0, Ordering::Relaxed);
    }
}

impl Default for HashMeter {
    fn default() -> Self {
        Self::new()
    }
}
