// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/solver/work.rs
// Version: 0.9.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// Work partitioning and job staging shared by all device loops. The work
// position hands out disjoint nonce windows; the job board is the
// single-writer/multi-reader slot the orchestrator stages jobs into, with
// an epoch counter that lets loops recognize a superseded dispatch after
// the fact.

use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::types::WorkTemplate;

/// Process-wide nonce-space partitioner.
///
/// Every reservation returns a base offset such that concurrent reservations
/// never overlap; disjointness is the only guarantee, fairness is not.
#[derive(Debug, Default)]
pub struct WorkPosition {
    position: AtomicU64,
}

impl WorkPosition {
    pub fn new() -> Self {
        Self {
            position: AtomicU64::new(0),
        }
    }

    /// Reserve `count` nonces and return the window's base offset.
    pub fn reserve(&self, count: u64) -> u64 {
        self.position.fetch_add(count, Ordering::SeqCst)
    }

    /// Restart the nonce space (new challenge) and return the old position.
    pub fn reset(&self) -> u64 {
        self.position.swap(0, Ordering::SeqCst)
    }

    pub fn current(&self) -> u64 {
        self.position.load(Ordering::SeqCst)
    }
}

/// Single-writer/multi-reader staged-job slot.
///
/// The orchestrator replaces the job wholesale; device loops snapshot it at
/// the top of each iteration, so a push becomes visible no later than the
/// next kernel launch. The epoch only moves forward while the write lock is
/// held, so a snapshot's epoch always matches its template.
#[derive(Debug, Default)]
pub struct JobBoard {
    slot: RwLock<Option<Arc<WorkTemplate>>>,
    epoch: AtomicU64,
}

impl JobBoard {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
            epoch: AtomicU64::new(0),
        }
    }

    /// Stage a new job and return its epoch. In-flight dispatches keep
    /// running; their harvests are recognized as stale by epoch mismatch.
    pub fn stage(&self, template: WorkTemplate) -> u64 {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::new(template));
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current job with its epoch, `None` until the first stage.
    pub fn snapshot(&self) -> Option<(Arc<WorkTemplate>, u64)> {
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        slot.as_ref()
            .map(|template| (Arc::clone(template), self.epoch.load(Ordering::SeqCst)))
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }
}
