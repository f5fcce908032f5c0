// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/mod.rs
// Version: 0.9.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file is the module declaration for the core functionality of the
// solver, located in the core subdirectory. It declares submodules and
// re-exports key types for use throughout the project.

pub mod keccak;
pub mod target;
pub mod types;

// Re-export the most commonly used items
pub use keccak::{assemble_message, build_midstate, keccak256, scan_range, splice_nonce, verify};
pub use target::{high64_prefix, meets_target, parse_target_hex};
pub use types::{Solution, SpongeState, WorkTemplate};
