// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/lib.rs
// Version: 0.9.2
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file serves as the main library entry point for the sha3-solver crate,
// located at the root of the source tree. It exports the core data/hash
// modules and the device solver layer (registry, dispatch, telemetry).
//
// Tree Location:
// - src/lib.rs (root library file)
// - Exports modules: core, solver

pub mod core;
pub mod solver;

// Re-export commonly used types at the crate root for convenience
pub use crate::core::keccak;
pub use crate::core::target;
pub use crate::core::types::{Solution, WorkTemplate};
pub use crate::solver::device::{DeviceFlavor, DeviceInfo, Tunables};
pub use crate::solver::dispatch::{DeviceState, DispatchMode};
pub use crate::solver::error::{MessageCallback, Result, Severity, SolverError};
pub use crate::solver::registry::SolverRegistry;
pub use crate::solver::solution::SolutionBuffer;
pub use crate::solver::telemetry::TelemetrySample;
