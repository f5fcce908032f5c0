// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/solver/error.rs
// Version: 0.9.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// Solver error taxonomy and the device notice callback. Every fallible
// backend call returns a status through these types; nothing panics across
// the public API, and a single device's failure never halts the fleet.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Severity of a device-scoped asynchronous notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "Info"),
            Severity::Warn => write!(f, "Warn"),
            Severity::Error => write!(f, "Error"),
        }
    }
}

/// Callback for device-scoped notices raised inside dispatch loops.
/// The ordinal is -1 for process-scoped notices.
pub type MessageCallback = Arc<dyn Fn(i32, Severity, &str) + Send + Sync>;

/// Errors surfaced by the solver core. The payload carries the backend's
/// native status text verbatim; build failures include the full diagnostic
/// log.
#[derive(Debug, Error)]
pub enum SolverError {
    /// No usable devices, or the installed runtime is too old. Fatal to the
    /// caller.
    #[error("{0}")]
    Enumeration(String),

    /// A mandatory device property could not be read. Optional telemetry
    /// queries never raise this; they degrade to sentinels.
    #[error("{0}")]
    Query(String),

    /// A state-changing backend call failed (select, reset, allocate, push,
    /// dispatch). Recoverable by caller policy.
    #[error("{0}")]
    Command(String),

    /// Kernel compilation failed on the portable backend. Fatal for the
    /// device; the message contains the verbatim build log.
    #[error("{0}")]
    Build(String),
}

pub type Result<T> = std::result::Result<T, SolverError>;
