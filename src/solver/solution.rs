// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/solver/solution.rs
// Version: 0.9.1
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// The zero-copy solution store shared between host and device. One fixed
// allocation of max_solutions + 1 64-bit slots: slot 0 is the atomic write
// counter, slots 1..=max hold candidate nonces. The portable backend binds
// the same memory as a device buffer (CL_MEM_USE_HOST_PTR), so there is no
// transfer on the hot path; the host drains and resets the counter before
// the next dispatch reuses the buffer.

use std::sync::atomic::{AtomicU64, Ordering};

/// Fixed-capacity host/device shared candidate store.
///
/// Writes follow the kernel protocol: increment the counter, then store the
/// nonce if the claimed index is still in range. Past capacity, candidates
/// are dropped, never queued — the counter may run past `max_solutions`
/// within one dispatch, but the reported count is clamped and the harvest
/// resets it to zero.
#[derive(Debug)]
pub struct SolutionBuffer {
    slots: Box<[AtomicU64]>,
    max_solutions: u32,
}

impl SolutionBuffer {
    pub fn new(max_solutions: u32) -> Self {
        let mut slots = Vec::with_capacity(max_solutions as usize + 1);
        for _ in 0..=max_solutions {
            slots.push(AtomicU64::new(0));
        }
        Self {
            slots: slots.into_boxed_slice(),
            max_solutions,
        }
    }

    pub fn max_solutions(&self) -> u32 {
        self.max_solutions
    }

    /// Total 64-bit slots, counter included. This is the size the device
    /// buffer is created with.
    pub fn slot_count(&self) -> usize {
        self.max_solutions as usize + 1
    }

    /// Raw pointer to the slot array for device-buffer aliasing. The memory
    /// stays valid and pinned for the lifetime of `self`; the device and the
    /// host must not race on it outside the dispatch/harvest protocol.
    pub fn as_ptr(&self) -> *mut u64 {
        // AtomicU64 is layout-compatible with u64
        self.slots.as_ptr() as *mut u64
    }

    /// Non-blocking peek of the candidate count, clamped to capacity.
    pub fn peek_count(&self) -> u32 {
        (self.slots[0].load(Ordering::Acquire) as u32).min(self.max_solutions)
    }

    /// Host-side mirror of the kernel's append: increment-then-store,
    /// dropping on saturation. Returns whether the nonce was stored.
    pub fn try_push(&self, nonce: u64) -> bool {
        let claimed = self.slots[0].fetch_add(1, Ordering::AcqRel);
        if claimed < self.max_solutions as u64 {
            self.slots[claimed as usize + 1].store(nonce, Ordering::Release);
            true
        } else {
            false
        }
    }

    /// Copy out up to `max_solutions` candidates and reset the counter.
    /// The buffer must not be dispatched again before this returns.
    pub fn harvest(&self) -> Vec<u64> {
        let count = self.peek_count();
        let mut nonces = Vec::with_capacity(count as usize);
        for slot in 1..=count as usize {
            nonces.push(self.slots[slot].load(Ordering::Acquire));
        }
        self.reset();
        nonces
    }

    /// Reset the write counter; stale slot contents are harmless because
    /// the counter gates every read.
    pub fn reset(&self) {
        self.slots[0].store(0, Ordering::Release);
    }
}
