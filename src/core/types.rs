// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/types.rs
// Version: 0.9.1
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file defines the core data structures for the solver, located in the
// core subdirectory. It includes the byte-length constants of the mined
// message, the job state shared between the orchestrator and the device
// dispatch loops, and the verified solution record handed back upstream.
//
// Tree Location:
// - src/core/types.rs (core data structures)
// - Depends on: serde, rand, hex

use serde::Serialize;

/// Length of a 32-bit word in bytes.
pub const UINT32_LENGTH: usize = 4;
/// Length of a 64-bit word in bytes.
pub const UINT64_LENGTH: usize = 8;
/// Keccak-f[1600] sponge state size in bytes.
pub const SPONGE_LENGTH: usize = 200;
/// Keccak-f[1600] sponge state size in 64-bit lanes.
pub const SPONGE_WORDS: usize = 25;
/// Ethereum address length in bytes.
pub const ADDRESS_LENGTH: usize = 20;
/// 256-bit quantity length in bytes (challenge, solution, target, digest).
pub const UINT256_LENGTH: usize = 32;
/// Mined message: challenge (32) + minting address (20) + solution (32).
pub const MESSAGE_LENGTH: usize = UINT256_LENGTH + ADDRESS_LENGTH + UINT256_LENGTH;
/// Offset of the iterated 64-bit nonce inside the 32-byte solution.
pub const NONCE_OFFSET_IN_SOLUTION: usize = (UINT256_LENGTH / 2) - (UINT64_LENGTH / 2);
/// Offset of the iterated 64-bit nonce inside the full message. Lane-aligned
/// so the kernel injects it as a single sponge lane.
pub const NONCE_POSITION: usize = UINT256_LENGTH + ADDRESS_LENGTH + NONCE_OFFSET_IN_SOLUTION;
/// Maximum candidate nonces a single dispatch may report; the shared buffer
/// holds one extra leading slot for the atomic write counter.
pub const MAX_SOLUTION_COUNT: u32 = 4;

/// Keccak-f[1600] sponge state as 64-bit little-endian lanes.
pub type SpongeState = [u64; SPONGE_WORDS];

/// Job state staged onto every active device.
///
/// Built once per job by the orchestrator and replaced wholesale on a new
/// challenge or target, never partially mutated; device loops only ever read
/// a snapshot through the job board.
#[derive(Debug, Clone)]
pub struct WorkTemplate {
    /// Current 32-byte challenge.
    pub challenge: [u8; UINT256_LENGTH],
    /// Minting address the reward is bound to.
    pub address: [u8; ADDRESS_LENGTH],
    /// Fixed random solution bytes; the nonce is spliced into bytes 12..20.
    pub solution_template: [u8; UINT256_LENGTH],
    /// Assembled message (challenge ‖ address ‖ solution template).
    pub message: [u8; MESSAGE_LENGTH],
    /// Sponge state holding the fixed message bytes with padding applied and
    /// the nonce lane zeroed; the kernel injects the nonce and permutes.
    pub midstate: SpongeState,
    /// 256-bit big-endian target threshold.
    pub target: [u8; UINT256_LENGTH],
    /// High-order 64 bits of the target, for the kernel's fast reject.
    pub high64_target: u64,
}

impl WorkTemplate {
    /// Create a job with a fresh random solution template.
    pub fn new(
        challenge: [u8; UINT256_LENGTH],
        address: [u8; ADDRESS_LENGTH],
        target: [u8; UINT256_LENGTH],
    ) -> Self {
        let solution_template: [u8; UINT256_LENGTH] = rand::random();
        Self::with_solution_template(challenge, address, solution_template, target)
    }

    /// Create a job reusing a previously generated solution template. The
    /// template is fixed for the lifetime of the process so that harvested
    /// nonces can be reassembled into full solutions at submission time.
    pub fn with_solution_template(
        challenge: [u8; UINT256_LENGTH],
        address: [u8; ADDRESS_LENGTH],
        solution_template: [u8; UINT256_LENGTH],
        target: [u8; UINT256_LENGTH],
    ) -> Self {
        let message = crate::core::keccak::assemble_message(&challenge, &address, &solution_template);
        let midstate = crate::core::keccak::build_midstate(&message);
        let high64_target = crate::core::target::high64_prefix(&target);
        Self {
            challenge,
            address,
            solution_template,
            message,
            midstate,
            target,
            high64_target,
        }
    }
}

/// A harvested nonce that survived host re-verification.
#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    /// Ordinal of the device that found the nonce.
    pub device_ordinal: u32,
    /// The qualifying 64-bit nonce.
    pub nonce: u64,
    /// Full 32-byte solution (template with the nonce spliced in).
    #[serde(serialize_with = "hex_bytes")]
    pub solution: [u8; UINT256_LENGTH],
    /// Keccak-256 digest of the assembled message.
    #[serde(serialize_with = "hex_bytes")]
    pub digest: [u8; UINT256_LENGTH],
    /// Challenge the nonce was mined against.
    #[serde(serialize_with = "hex_bytes")]
    pub challenge: [u8; UINT256_LENGTH],
}

fn hex_bytes<S>(bytes: &[u8; UINT256_LENGTH], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&hex::encode(bytes))
}
