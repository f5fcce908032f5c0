// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/solver/cuda/mod.rs
// Version: 0.9.2
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// Native CUDA backend behind the "cuda" feature. With the feature enabled
// this initializes the driver, enumerates devices, and runs the search
// kernel from a PTX module with a unified (host+device visible) solutions
// buffer. Without the feature the module still compiles and enumeration
// reports no devices, so the portable backend carries the fleet.

#[cfg(feature = "cuda")]
pub use enabled::CudaEngine;

use crate::solver::device::DeviceInfo;
use crate::solver::error::Result;

/// Enumerate native CUDA devices. Empty when the feature is disabled.
pub fn detect_devices(ordinal_base: u32) -> Result<Vec<DeviceInfo>> {
    #[cfg(feature = "cuda")]
    {
        enabled::detect_devices(ordinal_base)
    }
    #[cfg(not(feature = "cuda"))]
    {
        let _ = ordinal_base;
        log::debug!(target: "sha3solver::cuda", "CUDA backend not compiled in; skipping native enumeration");
        Ok(Vec::new())
    }
}

#[cfg(feature = "cuda")]
mod enabled {
    use cust::CudaFlags;
    use cust::context::Context;
    use cust::device::{Device, DeviceAttribute};
    use cust::launch;
    use cust::memory::{CopyDestination, DeviceBuffer, UnifiedBuffer};
    use cust::module::Module;
    use cust::stream::{Stream, StreamFlags};
    use log::{debug, info, warn};

    use crate::core::types::{MESSAGE_LENGTH, SPONGE_WORDS, SpongeState, UINT256_LENGTH};
    use crate::solver::device::{DeviceFlavor, DeviceInfo, native_block_size, native_grid_size};
    use crate::solver::dispatch::DispatchMode;
    use crate::solver::error::{Result, SolverError};

    const LOG_TARGET: &str = "sha3solver::cuda";

    const KERNEL_MIDSTATE: &str = "mine_midstate";
    const KERNEL_MESSAGE: &str = "mine_message";

    /// Enumerate native devices, assigning ordinals after the portable
    /// backend's.
    pub fn detect_devices(ordinal_base: u32) -> Result<Vec<DeviceInfo>> {
        if let Err(e) = cust::init(CudaFlags::empty()) {
            debug!(target: LOG_TARGET, "CUDA driver init failed: {}", e);
            return Ok(Vec::new());
        }

        let count = Device::num_devices()
            .map_err(|e| SolverError::Enumeration(format!("CUDA enumeration failed ({})", e)))?;

        let mut devices = Vec::with_capacity(count as usize);
        for index in 0..count {
            match probe_device(index, ordinal_base + index) {
                Ok(info) => {
                    info!(target: LOG_TARGET, "Detected CUDA device {}: {}", info.ordinal, info.name);
                    devices.push(info);
                }
                Err(e) => {
                    warn!(target: LOG_TARGET, "Skipping CUDA device {}: {}", index, e);
                }
            }
        }
        Ok(devices)
    }

    fn probe_device(index: u32, ordinal: u32) -> Result<DeviceInfo> {
        let device = Device::get_device(index)
            .map_err(|e| SolverError::Query(format!("Failed to open CUDA device ({})", e)))?;
        let name = device
            .name()
            .map_err(|e| SolverError::Query(format!("Failed to get device name ({})", e)))?;
        let global_mem_size = device
            .total_memory()
            .map_err(|e| SolverError::Query(format!("Failed to get device memory ({})", e)))?
            as u64;
        let attr = |a: DeviceAttribute| {
            device
                .get_attribute(a)
                .map_err(|e| SolverError::Query(format!("Failed to get device attribute ({})", e)))
        };
        let major = attr(DeviceAttribute::ComputeCapabilityMajor)? as u32;
        let minor = attr(DeviceAttribute::ComputeCapabilityMinor)? as u32;

        Ok(DeviceInfo {
            ordinal,
            pci_bus_id: attr(DeviceAttribute::PciBusId)? as u32,
            vendor: "NVIDIA Corporation".to_string(),
            name,
            platform_name: "NVIDIA CUDA (native)".to_string(),
            flavor: DeviceFlavor::Native,
            compute: major * 100 + minor * 10,
            max_compute_units: attr(DeviceAttribute::MultiprocessorCount)? as u32,
            max_work_group_size: attr(DeviceAttribute::MaxThreadsPerBlock)? as usize,
            global_mem_size,
        })
    }

    /// Native solver engine for one CUDA device.
    ///
    /// The context is bound at initialization (device select) and dropped on
    /// release; with the driver API, drop-and-recreate is the device reset.
    pub struct CudaEngine {
        info: DeviceInfo,
        device_index: u32,
        context: Option<Context>,
        stream: Option<Stream>,
        module: Option<Module>,
        solutions: Option<UnifiedBuffer<u64>>,
        midstate: Option<DeviceBuffer<u64>>,
        message: Option<DeviceBuffer<u8>>,
        target: Option<DeviceBuffer<u8>>,
        high64: Option<DeviceBuffer<u64>>,
        max_solutions: u32,
        initialized: bool,
    }

    impl CudaEngine {
        pub fn new(info: DeviceInfo, device_index: u32) -> Self {
            Self {
                info,
                device_index,
                context: None,
                stream: None,
                module: None,
                solutions: None,
                midstate: None,
                message: None,
                target: None,
                high64: None,
                max_solutions: 0,
                initialized: false,
            }
        }

        /// Select the device, bind a context and stream, load the PTX
        /// module, and allocate the unified solutions buffer plus the
        /// staging buffers.
        pub fn initialize(&mut self, ptx_source: &str, max_solutions: u32) -> Result<()> {
            cust::init(CudaFlags::empty())
                .map_err(|e| SolverError::Command(format!("CUDA driver init failed ({})", e)))?;
            let device = Device::get_device(self.device_index)
                .map_err(|e| SolverError::Command(format!("Failed to select device ({})", e)))?;
            let context = Context::new(device)
                .map_err(|e| SolverError::Command(format!("Failed to create context ({})", e)))?;
            let stream = Stream::new(StreamFlags::NON_BLOCKING, None)
                .map_err(|e| SolverError::Command(format!("Failed to create stream ({})", e)))?;
            let module = Module::from_ptx(ptx_source, &[])
                .map_err(|e| SolverError::Build(format!("Failed to load PTX module ({})", e)))?;

            let solutions = UnifiedBuffer::new(&0u64, max_solutions as usize + 1).map_err(|e| {
                SolverError::Command(format!("Failed to allocate solutions buffer ({})", e))
            })?;
            let midstate = DeviceBuffer::from_slice(&[0u64; SPONGE_WORDS]).map_err(|e| {
                SolverError::Command(format!("Failed to allocate midstate buffer ({})", e))
            })?;
            let message = DeviceBuffer::from_slice(&[0u8; MESSAGE_LENGTH]).map_err(|e| {
                SolverError::Command(format!("Failed to allocate message buffer ({})", e))
            })?;
            let target = DeviceBuffer::from_slice(&[0u8; UINT256_LENGTH]).map_err(|e| {
                SolverError::Command(format!("Failed to allocate target buffer ({})", e))
            })?;
            let high64 = DeviceBuffer::from_slice(&[0u64]).map_err(|e| {
                SolverError::Command(format!("Failed to allocate target prefix buffer ({})", e))
            })?;

            self.context = Some(context);
            self.stream = Some(stream);
            self.module = Some(module);
            self.solutions = Some(solutions);
            self.midstate = Some(midstate);
            self.message = Some(message);
            self.target = Some(target);
            self.high64 = Some(high64);
            self.max_solutions = max_solutions;
            self.initialized = true;

            info!(target: LOG_TARGET, "CUDA engine initialized for {}", self.info.name);
            Ok(())
        }

        fn not_initialized() -> SolverError {
            SolverError::Command("Engine not initialized".to_string())
        }

        pub fn push_high64_target(&mut self, high64_target: u64) -> Result<()> {
            self.high64
                .as_mut()
                .ok_or_else(Self::not_initialized)?
                .copy_from(&[high64_target])
                .map_err(|e| SolverError::Command(format!("Failed to push high-64 target ({})", e)))
        }

        pub fn push_target(&mut self, target: &[u8; UINT256_LENGTH]) -> Result<()> {
            self.target
                .as_mut()
                .ok_or_else(Self::not_initialized)?
                .copy_from(&target[..])
                .map_err(|e| SolverError::Command(format!("Failed to push target ({})", e)))
        }

        pub fn push_midstate(&mut self, midstate: &SpongeState) -> Result<()> {
            self.midstate
                .as_mut()
                .ok_or_else(Self::not_initialized)?
                .copy_from(&midstate[..])
                .map_err(|e| SolverError::Command(format!("Failed to push midstate ({})", e)))
        }

        pub fn push_message(&mut self, message: &[u8; MESSAGE_LENGTH]) -> Result<()> {
            self.message
                .as_mut()
                .ok_or_else(Self::not_initialized)?
                .copy_from(&message[..])
                .map_err(|e| SolverError::Command(format!("Failed to push message ({})", e)))
        }

        /// Launch one search window and synchronize the stream.
        pub fn dispatch(
            &mut self,
            mode: DispatchMode,
            work_position: u64,
            global_work_size: u64,
            _local_work_size: u32,
            max_solution_count: u32,
        ) -> Result<()> {
            if !self.initialized {
                return Err(Self::not_initialized());
            }

            let block = native_block_size(self.info.compute);
            let grid = native_grid_size(global_work_size, block);

            let module = self.module.as_ref().ok_or_else(Self::not_initialized)?;
            let stream = self.stream.as_ref().ok_or_else(Self::not_initialized)?;
            let solutions_ptr = self
                .solutions
                .as_mut()
                .ok_or_else(Self::not_initialized)?
                .as_unified_ptr();

            match mode {
                DispatchMode::Midstate => {
                    let function = module.get_function(KERNEL_MIDSTATE).map_err(|e| {
                        SolverError::Command(format!("Failed to get kernel ({})", e))
                    })?;
                    let midstate = self.midstate.as_mut().ok_or_else(Self::not_initialized)?;
                    let high64 = self.high64.as_mut().ok_or_else(Self::not_initialized)?;
                    unsafe {
                        launch!(function<<<grid, block, 0, stream>>>(
                            midstate.as_device_ptr(),
                            high64.as_device_ptr(),
                            solutions_ptr,
                            max_solution_count,
                            work_position
                        ))
                        .map_err(|e| SolverError::Command(format!("Kernel launch failed ({})", e)))?;
                    }
                }
                DispatchMode::FullMessage => {
                    let function = module.get_function(KERNEL_MESSAGE).map_err(|e| {
                        SolverError::Command(format!("Failed to get kernel ({})", e))
                    })?;
                    let message = self.message.as_mut().ok_or_else(Self::not_initialized)?;
                    let target = self.target.as_mut().ok_or_else(Self::not_initialized)?;
                    unsafe {
                        launch!(function<<<grid, block, 0, stream>>>(
                            message.as_device_ptr(),
                            target.as_device_ptr(),
                            solutions_ptr,
                            max_solution_count,
                            work_position
                        ))
                        .map_err(|e| SolverError::Command(format!("Kernel launch failed ({})", e)))?;
                    }
                }
            }

            stream
                .synchronize()
                .map_err(|e| SolverError::Command(format!("Stream sync failed ({})", e)))
        }

        /// Non-blocking peek of the unified counter slot.
        pub fn peek_solution_count(&self) -> u32 {
            self.solutions
                .as_ref()
                .map(|s| (s[0] as u32).min(self.max_solutions))
                .unwrap_or(0)
        }

        /// Copy out the harvested nonces and reset the counter.
        pub fn harvest_solutions(&mut self) -> Vec<u64> {
            let max = self.max_solutions;
            match self.solutions.as_mut() {
                Some(buffer) => {
                    let count = (buffer[0] as u32).min(max) as usize;
                    let nonces = buffer[1..=count].to_vec();
                    buffer[0] = 0;
                    nonces
                }
                None => Vec::new(),
            }
        }

        pub fn is_initialized(&self) -> bool {
            self.initialized
        }

        pub fn info(&self) -> &DeviceInfo {
            &self.info
        }

        /// Free device objects and drop the context (device reset).
        pub fn release(&mut self) {
            self.module = None;
            self.solutions = None;
            self.midstate = None;
            self.message = None;
            self.target = None;
            self.high64 = None;
            self.stream = None;
            self.context = None;
            self.initialized = false;
            debug!(target: LOG_TARGET, "CUDA engine released for {}", self.info.name);
        }
    }
}
