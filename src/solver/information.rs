// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/solver/information.rs
// Version: 0.9.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// Device information files: one JSON file per enumerated device with its
// identity, capability, and resolved launch dimensions. External tooling
// (dashboards, orchestrators) reads these instead of linking the backend
// runtimes themselves.
//
// Tree Location:
// - src/solver/information.rs (device information files)
// - Depends on: serde, serde_json, log

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;

use crate::solver::device::{DeviceInfo, Tunables};
use crate::solver::error::{Result, SolverError};

const LOG_TARGET: &str = "sha3solver::information";

/// On-disk record for one device.
#[derive(Debug, Clone, Serialize)]
pub struct InformationFile {
    pub device: DeviceInfo,
    pub tunables: Tunables,
}

/// Write one `device_<ordinal>.json` per device into `directory`, creating
/// it if needed. Returns the written paths in device order.
pub fn write_information_files(
    devices: &[(DeviceInfo, Tunables)],
    directory: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(directory).map_err(|e| {
        SolverError::Command(format!("Failed to create {} ({})", directory.display(), e))
    })?;

    let mut written = Vec::with_capacity(devices.len());
    for (device, tunables) in devices {
        let record = InformationFile {
            device: device.clone(),
            tunables: *tunables,
        };
        let json = serde_json::to_string_pretty(&record).map_err(|e| {
            SolverError::Command(format!("Failed to serialize device information ({})", e))
        })?;
        let path = directory.join(format!("device_{}.json", device.ordinal));
        fs::write(&path, json).map_err(|e| {
            SolverError::Command(format!("Failed to write {} ({})", path.display(), e))
        })?;
        debug!(target: LOG_TARGET, "Wrote {}", path.display());
        written.push(path);
    }

    info!(target: LOG_TARGET,
        "Wrote {} device information file(s) to {}",
        written.len(),
        directory.display()
    );
    Ok(written)
}
