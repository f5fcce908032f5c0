// SHA3 Solver - Free and Open Source Software Statement
//
// File: src/solver/opencl/device.rs
// Version: 0.9.1
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// OpenCL device enumeration for the portable backend - probes platforms,
// reads mandatory device properties, and classifies the execution flavor

use log::{debug, info, warn};
use opencl3::{
    device::{CL_DEVICE_TYPE_GPU, Device},
    platform::get_platforms,
};

use crate::solver::device::{DeviceFlavor, DeviceInfo};
use crate::solver::error::{Result, SolverError};

const LOG_TARGET: &str = "sha3solver::opencl::device";

/// An enumerated OpenCL device with its resolved identity.
#[derive(Debug, Clone)]
pub struct OpenClDevice {
    info: DeviceInfo,
    device: Device,
}

impl OpenClDevice {
    /// Probe one device. Mandatory property reads that fail surface as
    /// `QueryError`; vendor-extension reads degrade to defaults.
    pub fn new(device: Device, ordinal: u32, platform_name: String) -> Result<Self> {
        let name = device
            .name()
            .map_err(|e| SolverError::Query(format!("Failed to get CL_DEVICE_NAME ({})", e)))?;
        let vendor = device
            .vendor()
            .map_err(|e| SolverError::Query(format!("Failed to get CL_DEVICE_VENDOR ({})", e)))?;
        let max_work_group_size = device.max_work_group_size().map_err(|e| {
            SolverError::Query(format!("Failed to get CL_DEVICE_MAX_WORK_GROUP_SIZE ({})", e))
        })?;
        let max_compute_units = device.max_compute_units().map_err(|e| {
            SolverError::Query(format!("Failed to get CL_DEVICE_MAX_COMPUTE_UNITS ({})", e))
        })?;
        let global_mem_size = device.global_mem_size().map_err(|e| {
            SolverError::Query(format!("Failed to get CL_DEVICE_GLOBAL_MEM_SIZE ({})", e))
        })?;

        let flavor = DeviceFlavor::classify(&platform_name);

        // NVIDIA extension queries; only meaningful on the CUDA platform
        let (compute, pci_bus_id) = if flavor == DeviceFlavor::Native {
            let major = device.compute_capability_major_nv().unwrap_or(0);
            let minor = device.compute_capability_minor_nv().unwrap_or(0);
            let bus = device.pci_bus_id_nv().unwrap_or(0);
            (major * 100 + minor * 10, bus)
        } else {
            (0, 0)
        };

        debug!(target: LOG_TARGET,
            "Probed OpenCL device {}: {} (CU: {}, WG: {}, flavor: {:?})",
            ordinal, name, max_compute_units, max_work_group_size, flavor
        );

        Ok(Self {
            info: DeviceInfo {
                ordinal,
                pci_bus_id,
                vendor,
                name,
                platform_name,
                flavor,
                compute,
                max_compute_units,
                max_work_group_size,
                global_mem_size,
            },
            device,
        })
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// The underlying OpenCL device handle.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Enumerate all GPU devices across all platforms, ordinals assigned in
    /// platform order. A device whose mandatory properties cannot be read is
    /// skipped with a warning; it never takes down the rest of the fleet.
    pub fn detect_devices() -> Result<Vec<OpenClDevice>> {
        debug!(target: LOG_TARGET, "Starting OpenCL device detection");

        let platforms = get_platforms().map_err(|e| {
            SolverError::Enumeration(format!("OpenCL platform detection failed ({})", e))
        })?;

        if platforms.is_empty() {
            warn!(target: LOG_TARGET, "No OpenCL platforms found");
            return Ok(Vec::new());
        }

        let mut all_devices = Vec::new();
        let mut ordinal = 0u32;

        for platform in platforms {
            let platform_name = platform
                .name()
                .unwrap_or_else(|_| "Unknown".to_string());
            debug!(target: LOG_TARGET, "Checking platform: {}", platform_name);

            match platform.get_devices(CL_DEVICE_TYPE_GPU) {
                Ok(device_ids) => {
                    for device_id in device_ids {
                        let device = Device::new(device_id);
                        match OpenClDevice::new(device, ordinal, platform_name.clone()) {
                            Ok(opencl_device) => {
                                info!(target: LOG_TARGET,
                                    "Detected OpenCL device {}: {} (Platform: {})",
                                    ordinal,
                                    opencl_device.info().name,
                                    platform_name
                                );
                                all_devices.push(opencl_device);
                                ordinal += 1;
                            }
                            Err(e) => {
                                warn!(target: LOG_TARGET,
                                    "Skipping OpenCL device {}: {}", ordinal, e
                                );
                            }
                        }
                    }
                }
                Err(e) => {
                    debug!(target: LOG_TARGET,
                        "No GPU devices on platform {}: {}", platform_name, e
                    );
                }
            }
        }

        Ok(all_devices)
    }

    /// Installed platform runtimes, for the empty-enumeration error text.
    pub fn installed_runtimes() -> String {
        match get_platforms() {
            Ok(platforms) if !platforms.is_empty() => platforms
                .iter()
                .map(|p| {
                    format!(
                        "{} [{}]",
                        p.name().unwrap_or_else(|_| "Unknown".to_string()),
                        p.version().unwrap_or_else(|_| "unknown version".to_string())
                    )
                })
                .collect::<Vec<_>>()
                .join(", "),
            _ => "none".to_string(),
        }
    }
}
