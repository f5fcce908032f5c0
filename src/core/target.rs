// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/target.rs
// Version: 0.9.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// 256-bit target handling for the solver, located in the core subdirectory.
// A candidate qualifies when its digest, read as a big-endian 256-bit
// integer, does not exceed the target. The comparison short-circuits on the
// high-order 64 bits, which is also the only value the midstate kernel sees.

use hex;
use log::warn;
use uint::construct_uint;

use crate::core::types::{UINT64_LENGTH, UINT256_LENGTH};

const LOG_TARGET: &str = "sha3solver::target";

construct_uint! {
    pub struct U256(4);
}

/// High-order 64 bits of a big-endian 256-bit target.
pub fn high64_prefix(target: &[u8; UINT256_LENGTH]) -> u64 {
    let mut prefix = [0u8; UINT64_LENGTH];
    prefix.copy_from_slice(&target[..UINT64_LENGTH]);
    u64::from_be_bytes(prefix)
}

/// Big-endian 256-bit compare with a 64-bit fast path.
///
/// `high64_target` must be the prefix of `target`; the full compare only
/// runs when the leading words tie.
pub fn meets_target(
    digest: &[u8; UINT256_LENGTH],
    high64_target: u64,
    target: &[u8; UINT256_LENGTH],
) -> bool {
    let mut prefix = [0u8; UINT64_LENGTH];
    prefix.copy_from_slice(&digest[..UINT64_LENGTH]);
    let high64_digest = u64::from_be_bytes(prefix);

    if high64_digest > high64_target {
        return false;
    }
    if high64_digest < high64_target {
        return true;
    }
    U256::from_big_endian(digest) <= U256::from_big_endian(target)
}

/// Parse a hex target string (with or without a `0x` prefix) into 32 bytes.
/// Shorter strings are left-padded with zeroes, the way on-chain targets are
/// reported.
pub fn parse_target_hex(target_hex: &str) -> Option<[u8; UINT256_LENGTH]> {
    let trimmed = target_hex.trim().trim_start_matches("0x");
    if trimmed.is_empty() || trimmed.len() > UINT256_LENGTH * 2 {
        warn!(target: LOG_TARGET, "Invalid target hex length: {}", trimmed.len());
        return None;
    }

    let padded = format!("{:0>64}", trimmed);
    match hex::decode(&padded) {
        Ok(bytes) => {
            let mut target = [0u8; UINT256_LENGTH];
            target.copy_from_slice(&bytes);
            Some(target)
        }
        Err(e) => {
            warn!(target: LOG_TARGET, "Failed to decode target hex: {}", e);
            None
        }
    }
}
