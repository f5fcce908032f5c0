// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/solver/device.rs
// Version: 0.9.1
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// Device identity, backend flavor classification, and work sizing. The
// flavor is resolved exactly once at enumeration time from the platform
// name; nothing downstream re-derives it from strings. Work sizing is pure:
// identical inputs always yield identical launch dimensions, so adaptive
// re-tuning is side-effect free.
//
// Tree Location:
// - src/solver/device.rs (device identity and tunables)
// - Depends on: serde, log

use log::debug;
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "sha3solver::device";

/// Default search-space exponent for discrete devices.
pub const DEFAULT_INTENSITY: f32 = 24.0;
/// Integrated GPUs share memory bandwidth with the host; keep them modest.
pub const INTEGRATED_INTENSITY: f32 = 21.0;
/// Default threads per work group on discrete devices.
pub const DEFAULT_LOCAL_WORK_SIZE: u32 = 128;
/// Integrated GPUs schedule best at a single wavefront.
pub const INTEGRATED_LOCAL_WORK_SIZE: u32 = 64;
/// Intensities past this overflow 32-bit thread math on older hardware.
pub const MAX_INTENSITY: f32 = 40.55;

/// Execution-backend family of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceFlavor {
    /// Native vendor backend (CUDA), or the CUDA OpenCL platform.
    Native,
    /// Portable compute backend on a discrete card (AMD APP).
    PortableDiscrete,
    /// Portable compute backend on an integrated GPU (Intel).
    PortableIntegrated,
}

impl DeviceFlavor {
    /// Classify a device by its platform name. Case-insensitive substring
    /// match, performed once at enumeration; unrecognized platforms are
    /// treated as portable-discrete.
    pub fn classify(platform_name: &str) -> DeviceFlavor {
        let upper = platform_name.to_uppercase();
        if upper.contains("CUDA") {
            DeviceFlavor::Native
        } else if upper.contains("ACCELERATED PARALLEL PROCESSING") {
            DeviceFlavor::PortableDiscrete
        } else if upper.contains("INTEL") {
            DeviceFlavor::PortableIntegrated
        } else {
            DeviceFlavor::PortableDiscrete
        }
    }
}

/// Identity and capability of an enumerated device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    /// Enumeration ordinal, stable for the process lifetime.
    pub ordinal: u32,
    /// PCI bus id, 0 when the platform does not expose one.
    pub pci_bus_id: u32,
    pub vendor: String,
    pub name: String,
    pub platform_name: String,
    pub flavor: DeviceFlavor,
    /// Compute capability tier (major*100 + minor*10) on native devices,
    /// 0 elsewhere.
    pub compute: u32,
    pub max_compute_units: u32,
    pub max_work_group_size: usize,
    pub global_mem_size: u64,
}

impl DeviceInfo {
    /// One-line summary for logs.
    pub fn info_string(&self) -> String {
        format!(
            "{} (CU: {}, WG: {}, MEM: {:.1} GB, Flavor: {:?})",
            self.name,
            self.max_compute_units,
            self.max_work_group_size,
            self.global_mem_size as f64 / (1024.0 * 1024.0 * 1024.0),
            self.flavor
        )
    }
}

/// Flavor-appropriate local work size when the user gave no override.
pub fn default_local_work_size(flavor: DeviceFlavor) -> u32 {
    match flavor {
        DeviceFlavor::PortableIntegrated => INTEGRATED_LOCAL_WORK_SIZE,
        _ => DEFAULT_LOCAL_WORK_SIZE,
    }
}

/// Clamp a user local-work-size override to the device maximum, rounded
/// down to a multiple of 64 and never below 64.
pub fn clamp_local_work_size(requested: u32, max_work_group_size: usize) -> u32 {
    let clamped = requested.min(max_work_group_size as u32);
    ((clamped / 64) * 64).max(64)
}

/// Flavor- and tier-appropriate default intensity. Native devices with a
/// known compute tier get the tuned defaults.
pub fn default_intensity(flavor: DeviceFlavor, compute: u32) -> f32 {
    match flavor {
        DeviceFlavor::PortableIntegrated => INTEGRATED_INTENSITY,
        DeviceFlavor::Native => {
            if compute >= 700 {
                27.0
            } else if compute >= 600 {
                26.0
            } else if compute >= 500 {
                25.0
            } else {
                DEFAULT_INTENSITY
            }
        }
        DeviceFlavor::PortableDiscrete => DEFAULT_INTENSITY,
    }
}

/// Global work size for an intensity: `floor(2^intensity / lws) * lws`.
///
/// Pure and idempotent; always a multiple of `local_work_size` and never
/// above `2^intensity`.
pub fn global_work_size(intensity: f32, local_work_size: u32) -> u64 {
    let intensity = intensity.clamp(1.0, MAX_INTENSITY);
    let total = 2f64.powf(intensity as f64) as u64;
    let lws = local_work_size.max(1) as u64;
    (total / lws) * lws
}

/// Launch dimensions for one device, derived from intensity and capability.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Tunables {
    pub intensity: f32,
    pub local_work_size: u32,
    pub global_work_size: u64,
}

impl Tunables {
    /// Resolve tunables for a device, applying user overrides where given.
    pub fn for_device(
        info: &DeviceInfo,
        user_intensity: Option<f32>,
        user_local_work_size: Option<u32>,
    ) -> Tunables {
        let local_work_size = match user_local_work_size {
            Some(requested) if requested > 0 => {
                clamp_local_work_size(requested, info.max_work_group_size)
            }
            _ => default_local_work_size(info.flavor),
        };
        let intensity = match user_intensity {
            Some(value) if value > 1.0 => value.min(MAX_INTENSITY),
            _ => default_intensity(info.flavor, info.compute),
        };
        let tunables = Tunables {
            intensity,
            local_work_size,
            global_work_size: global_work_size(intensity, local_work_size),
        };
        debug!(target: LOG_TARGET,
            "Tunables for {}: intensity={}, local={}, global={}",
            info.name, tunables.intensity, tunables.local_work_size, tunables.global_work_size
        );
        tunables
    }

    /// Re-derive the global work size after an intensity change (adaptive
    /// throttling path). Safe to call repeatedly.
    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.clamp(1.0, MAX_INTENSITY);
        self.global_work_size = global_work_size(self.intensity, self.local_work_size);
    }
}

/// Native-backend block size by compute tier; grid is derived from the
/// global work size.
pub fn native_block_size(compute: u32) -> u32 {
    match compute {
        520 | 610 | 700 | 720 | 750 => 1024,
        c if c >= 800 => 1024,
        _ => 384,
    }
}

/// Native-backend grid size covering `global_work_size` threads.
pub fn native_grid_size(global_work_size: u64, block_size: u32) -> u32 {
    ((global_work_size + block_size as u64 - 1) / block_size as u64) as u32
}
