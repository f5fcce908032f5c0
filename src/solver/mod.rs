// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/solver/mod.rs
// Version: 0.9.1
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file is the module entry point for the device solver layer: the
// registry, per-device dispatch loops, work sizing, the zero-copy solution
// buffer, hardware telemetry, and the hash rate tracker. Backend modules
// are feature-gated the same way the binaries are built.

pub mod device;
pub mod dispatch;
pub mod error;
pub mod hashrate;
pub mod information;
pub mod registry;
pub mod solution;
pub mod telemetry;
pub mod work;

// Portable OpenCL backend
#[cfg(feature = "gpu")]
pub mod opencl;

// Native CUDA backend (compiles to a no-device stub without the feature)
pub mod cuda;

// Re-export key types
pub use device::{DeviceFlavor, DeviceInfo, Tunables};
pub use dispatch::{DeviceState, DispatchMode};
pub use error::{MessageCallback, Result, Severity, SolverError};
pub use hashrate::HashMeter;
pub use information::write_information_files;
pub use registry::{KERNEL_SOURCE, SolverRegistry};
pub use solution::SolutionBuffer;
pub use telemetry::{METRIC_UNAVAILABLE, NvSmi, TEMPERATURE_UNAVAILABLE, TelemetrySample};
pub use work::{JobBoard, WorkPosition};
