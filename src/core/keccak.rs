// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/keccak.rs
// Version: 0.9.1
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// Host-side Keccak-256 helpers: message assembly, midstate construction for
// the device kernel, candidate re-verification, and a CPU reference scanner
// used by tests and diagnostics. The device kernel itself lives under
// kernels/opencl/ and is compiled at device initialization.

use sha3::{Digest, Keccak256};

use crate::core::target::meets_target;
use crate::core::types::{
    ADDRESS_LENGTH, MESSAGE_LENGTH, NONCE_OFFSET_IN_SOLUTION, NONCE_POSITION, SPONGE_WORDS,
    SpongeState, UINT64_LENGTH, UINT256_LENGTH, WorkTemplate,
};

/// Keccak-256 rate in bytes. The 84-byte message fits in a single block.
const RATE: usize = 136;

/// Keccak-256 of arbitrary input.
pub fn keccak256(data: &[u8]) -> [u8; UINT256_LENGTH] {
    let mut digest = [0u8; UINT256_LENGTH];
    digest.copy_from_slice(&Keccak256::digest(data));
    digest
}

/// Splice a 64-bit nonce into a solution template. Little-endian bytes at
/// offset 12, matching the lane the kernel overwrites.
pub fn splice_nonce(solution_template: &[u8; UINT256_LENGTH], nonce: u64) -> [u8; UINT256_LENGTH] {
    let mut solution = *solution_template;
    solution[NONCE_OFFSET_IN_SOLUTION..NONCE_OFFSET_IN_SOLUTION + UINT64_LENGTH]
        .copy_from_slice(&nonce.to_le_bytes());
    solution
}

/// Assemble the 84-byte mined message: challenge ‖ address ‖ solution.
pub fn assemble_message(
    challenge: &[u8; UINT256_LENGTH],
    address: &[u8; ADDRESS_LENGTH],
    solution: &[u8; UINT256_LENGTH],
) -> [u8; MESSAGE_LENGTH] {
    let mut message = [0u8; MESSAGE_LENGTH];
    message[..UINT256_LENGTH].copy_from_slice(challenge);
    message[UINT256_LENGTH..UINT256_LENGTH + ADDRESS_LENGTH].copy_from_slice(address);
    message[UINT256_LENGTH + ADDRESS_LENGTH..].copy_from_slice(solution);
    message
}

/// Absorb a full 84-byte message into a fresh sponge, padding applied.
/// The message is shorter than the rate, so no permutation runs here; the
/// returned state is what the kernel permutes per candidate.
pub fn sponge_from_message(message: &[u8; MESSAGE_LENGTH]) -> SpongeState {
    let mut block = [0u8; RATE];
    block[..MESSAGE_LENGTH].copy_from_slice(message);
    // Keccak pad10*1: domain byte after the message, final bit at the rate edge
    block[MESSAGE_LENGTH] = 0x01;
    block[RATE - 1] |= 0x80;

    let mut state: SpongeState = [0u64; SPONGE_WORDS];
    for (lane, chunk) in state.iter_mut().take(RATE / 8).zip(block.chunks_exact(8)) {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        *lane = u64::from_le_bytes(word);
    }
    state
}

/// Build the device midstate: the fixed message bytes with the nonce lane
/// zeroed. The kernel XORs the per-candidate nonce into lane 8 and runs the
/// permutation, so nonce bytes must not be pre-absorbed here.
pub fn build_midstate(message: &[u8; MESSAGE_LENGTH]) -> SpongeState {
    let mut fixed = *message;
    fixed[NONCE_POSITION..NONCE_POSITION + UINT64_LENGTH].copy_from_slice(&[0u8; UINT64_LENGTH]);
    sponge_from_message(&fixed)
}

/// Re-verify a harvested nonce against the current job on the host.
///
/// Returns the full solution bytes and the Keccak-256 digest when the digest
/// does not exceed the job's target, `None` otherwise. Harvested candidates
/// are never surfaced without passing through here first: the kernel's fast
/// path admits high-64 ties, and the target may have been swapped while the
/// dispatch was in flight.
pub fn verify(
    template: &WorkTemplate,
    nonce: u64,
) -> Option<([u8; UINT256_LENGTH], [u8; UINT256_LENGTH])> {
    let solution = splice_nonce(&template.solution_template, nonce);
    let message = assemble_message(&template.challenge, &template.address, &solution);
    let digest = keccak256(&message);
    if meets_target(&digest, template.high64_target, &template.target) {
        Some((solution, digest))
    } else {
        None
    }
}

/// CPU reference scan over `[work_position, work_position + count)`.
///
/// Mirrors what one kernel launch does: every nonce in the window is hashed
/// and the qualifying ones are returned in scan order. Used by tests and the
/// probe binary; throughput is not a goal here.
pub fn scan_range(template: &WorkTemplate, work_position: u64, count: u64) -> Vec<u64> {
    let mut found = Vec::new();
    for offset in 0..count {
        let nonce = work_position.wrapping_add(offset);
        if verify(template, nonce).is_some() {
            found.push(nonce);
        }
    }
    found
}

// Changelog:
// - v0.9.1 (2026-07-25): Midstate contract pinned down.
//   - build_midstate() zeroes the nonce lane before absorbing, so the
//     kernel's lane injection reproduces the full-message sponge exactly.
//   - Added scan_range() CPU reference scanner for tests and diagnostics.
