// SHA3 Solver - Free and Open Source Software Statement
//
// File: src/solver/opencl/mod.rs
// Version: 0.9.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// OpenCL module for the portable compute backend - enumeration and dispatch

pub mod device;
pub mod engine;

// Re-export key types
pub use device::OpenClDevice;
pub use engine::OpenClEngine;
