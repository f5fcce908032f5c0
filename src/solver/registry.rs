// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/solver/registry.rs
// Version: 0.9.2
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// The device registry: owns the enumerated fleet, the process-wide kernel
// source, the staged job, the nonce-space partitioner, and the solution
// stream. The kernel source is embedded at compile time and shared by
// reference into every device initializer - loaded once, never re-read.
// One device failing never halts the fleet; its loop reports through the
// registered callback and winds down alone.
//
// Tree Location:
// - src/solver/registry.rs (device registry and fleet control)
// - Depends on: crossbeam, log

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crossbeam::channel::{Receiver, Sender, unbounded};
use log::{debug, info, warn};

use crate::core::types::{MAX_SOLUTION_COUNT, Solution, WorkTemplate};
use crate::solver::device::{DeviceInfo, Tunables};
use crate::solver::dispatch::{
    BackendProbe, DeviceState, DispatchMode, LoopContext, StateCell, run_loop,
};
use crate::solver::error::{MessageCallback, Result, Severity, SolverError};
use crate::solver::hashrate::HashMeter;
use crate::solver::solution::SolutionBuffer;
use crate::solver::telemetry::{
    METRIC_UNAVAILABLE, NvSmi, TEMPERATURE_UNAVAILABLE, TelemetrySample,
};
use crate::solver::work::{JobBoard, WorkPosition};

#[cfg(feature = "gpu")]
use crate::solver::opencl::{OpenClDevice, OpenClEngine};

const LOG_TARGET: &str = "sha3solver::registry";

/// Process-wide immutable search-kernel source, shared by reference into
/// every portable-backend initializer.
pub static KERNEL_SOURCE: &str = include_str!("../../kernels/opencl/sha3_solver.cl");

/// One enumerated device with everything the registry tracks for it.
struct ManagedDevice {
    info: DeviceInfo,
    probe: BackendProbe,
    tunables: Tunables,
    mode: DispatchMode,
    buffer: Option<Arc<SolutionBuffer>>,
    meter: Arc<HashMeter>,
    telemetry: Option<NvSmi>,
    mining: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    state: Arc<StateCell>,
    handle: Option<JoinHandle<()>>,
}

/// Registry of initialized devices plus the shared solve state.
pub struct SolverRegistry {
    devices: Vec<ManagedDevice>,
    callback: MessageCallback,
    job: Arc<JobBoard>,
    position: Arc<WorkPosition>,
    solution_tx: Sender<Solution>,
    solution_rx: Receiver<Solution>,
    #[cfg(feature = "cuda")]
    native_kernel: Option<Arc<String>>,
}

impl SolverRegistry {
    /// Enumerate all devices across the compiled backends without building
    /// a registry. Fails with `EnumerationError` when nothing is found,
    /// embedding the installed runtimes in the message.
    pub fn enumerate() -> Result<Vec<DeviceInfo>> {
        Ok(Self::probe_all()?.into_iter().map(|(info, _)| info).collect())
    }

    fn probe_all() -> Result<Vec<(DeviceInfo, BackendProbe)>> {
        let mut probes: Vec<(DeviceInfo, BackendProbe)> = Vec::new();

        #[cfg(feature = "gpu")]
        for device in OpenClDevice::detect_devices()? {
            let info = device.info().clone();
            probes.push((info, BackendProbe::OpenCl(device)));
        }

        #[cfg(feature = "cuda")]
        {
            let base = probes.len() as u32;
            for info in crate::solver::cuda::detect_devices(base)? {
                let device_index = info.ordinal - base;
                probes.push((info.clone(), BackendProbe::Cuda { info, device_index }));
            }
        }

        if probes.is_empty() {
            #[cfg(feature = "gpu")]
            let installed = OpenClDevice::installed_runtimes();
            #[cfg(not(feature = "gpu"))]
            let installed = "none".to_string();
            return Err(SolverError::Enumeration(format!(
                "There are no available device(s) that support this solver \
                 (requires: OpenCL 1.2, installed: {})",
                installed
            )));
        }
        Ok(probes)
    }

    /// Build a registry over every enumerated device, with defaults derived
    /// from each device's flavor and compute tier.
    pub fn new(callback: MessageCallback) -> Result<Self> {
        let probes = Self::probe_all()?;
        let (solution_tx, solution_rx) = unbounded();

        let devices = probes
            .into_iter()
            .map(|(info, probe)| {
                let tunables = Tunables::for_device(&info, None, None);
                ManagedDevice {
                    info,
                    probe,
                    tunables,
                    mode: DispatchMode::Midstate,
                    buffer: None,
                    meter: Arc::new(HashMeter::new()),
                    telemetry: None,
                    mining: Arc::new(AtomicBool::new(false)),
                    paused: Arc::new(AtomicBool::new(false)),
                    state: Arc::new(StateCell::new()),
                    handle: None,
                }
            })
            .collect::<Vec<_>>();

        info!(target: LOG_TARGET, "🔍 Registry created with {} device(s)", devices.len());
        Ok(Self {
            devices,
            callback,
            job: Arc::new(JobBoard::new()),
            position: Arc::new(WorkPosition::new()),
            solution_tx,
            solution_rx,
            #[cfg(feature = "cuda")]
            native_kernel: None,
        })
    }

    /// Registry with a callback that forwards notices to the logger.
    pub fn with_default_callback() -> Result<Self> {
        let callback: MessageCallback = Arc::new(|ordinal, severity, text| match severity {
            Severity::Info => info!(target: LOG_TARGET, "ID {}: {}", ordinal, text),
            Severity::Warn => warn!(target: LOG_TARGET, "ID {}: {}", ordinal, text),
            Severity::Error => log::error!(target: LOG_TARGET, "ID {}: {}", ordinal, text),
        });
        Self::new(callback)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn devices(&self) -> Vec<DeviceInfo> {
        self.devices.iter().map(|d| d.info.clone()).collect()
    }

    fn device(&self, ordinal: u32) -> Result<&ManagedDevice> {
        self.devices
            .iter()
            .find(|d| d.info.ordinal == ordinal)
            .ok_or_else(|| SolverError::Command(format!("Device ordinal {} not found", ordinal)))
    }

    fn device_mut(&mut self, ordinal: u32) -> Result<&mut ManagedDevice> {
        self.devices
            .iter_mut()
            .find(|d| d.info.ordinal == ordinal)
            .ok_or_else(|| SolverError::Command(format!("Device ordinal {} not found", ordinal)))
    }

    /// Override tunables and dispatch mode before a device is started.
    pub fn configure_device(
        &mut self,
        ordinal: u32,
        user_intensity: Option<f32>,
        user_local_work_size: Option<u32>,
        mode: DispatchMode,
    ) -> Result<()> {
        let device = self.device_mut(ordinal)?;
        if device.mining.load(Ordering::SeqCst) {
            return Err(SolverError::Command(format!(
                "Device {} is mining; stop it before re-tuning",
                ordinal
            )));
        }
        device.tunables = Tunables::for_device(&device.info, user_intensity, user_local_work_size);
        device.mode = mode;
        debug!(target: LOG_TARGET,
            "Device {} configured: intensity={}, local={}, global={}, mode={:?}",
            ordinal,
            device.tunables.intensity,
            device.tunables.local_work_size,
            device.tunables.global_work_size,
            mode
        );
        Ok(())
    }

    /// Load the native backend's compiled kernel module from disk, once.
    #[cfg(feature = "cuda")]
    pub fn load_native_kernel(&mut self, path: &std::path::Path) -> Result<()> {
        let ptx = std::fs::read_to_string(path).map_err(|e| {
            SolverError::Build(format!("Failed to read {} ({})", path.display(), e))
        })?;
        self.native_kernel = Some(Arc::new(ptx));
        Ok(())
    }

    /// Initialize one device: allocate the zero-copy solution buffer, probe
    /// the telemetry capability, and validate the kernel build. Compile
    /// failure is fatal for the device and carries the full build log.
    pub fn initialize_device(&mut self, ordinal: u32) -> Result<()> {
        // nvidia-smi indexes native devices by their own ordering
        let smi_index = self.native_index(ordinal);
        #[cfg(feature = "cuda")]
        let native_kernel = self.native_kernel.clone();
        let device = self.device_mut(ordinal)?;
        if device.mining.load(Ordering::SeqCst) {
            return Err(SolverError::Command(format!(
                "Device {} is mining; stop it before re-initializing",
                ordinal
            )));
        }

        let buffer = Arc::new(SolutionBuffer::new(MAX_SOLUTION_COUNT));

        match &device.probe {
            #[cfg(feature = "gpu")]
            BackendProbe::OpenCl(opencl_device) => {
                // Validation build: surfaces BuildError synchronously; the
                // dispatch thread compiles its own engine at start
                let mut engine = OpenClEngine::new(opencl_device.clone())?;
                engine.initialize(KERNEL_SOURCE, Arc::clone(&buffer))?;
                engine.release();
            }
            #[cfg(feature = "cuda")]
            BackendProbe::Cuda { info, device_index } => {
                if let Some(ptx) = native_kernel.as_ref() {
                    let mut engine =
                        crate::solver::cuda::CudaEngine::new(info.clone(), *device_index);
                    engine.initialize(ptx, MAX_SOLUTION_COUNT)?;
                    engine.release();
                }
            }
            #[cfg(not(any(feature = "gpu", feature = "cuda")))]
            _ => {}
        }

        device.telemetry = if device.info.flavor == crate::solver::device::DeviceFlavor::Native {
            NvSmi::probe(smi_index)
        } else {
            None
        };
        device.buffer = Some(buffer);
        device.state.set(DeviceState::Initialized);

        info!(target: LOG_TARGET,
            "✅ Initialized device {}: {}", ordinal, device.info.info_string()
        );
        Ok(())
    }

    /// Index of a native device among native devices, for nvidia-smi.
    fn native_index(&self, ordinal: u32) -> u32 {
        self.devices
            .iter()
            .filter(|d| {
                d.info.flavor == crate::solver::device::DeviceFlavor::Native
                    && d.info.ordinal < ordinal
            })
            .count() as u32
    }

    /// Stage a new job onto the fleet. Visible to every dispatch loop no
    /// later than its next launch; in-flight dispatches finish and their
    /// harvests are discarded as stale. A changed challenge restarts the
    /// nonce space.
    pub fn stage_job(&self, template: WorkTemplate) {
        let challenge_changed = match self.job.snapshot() {
            Some((current, _)) => current.challenge != template.challenge,
            None => true,
        };
        if challenge_changed {
            let scanned = self.position.reset();
            debug!(target: LOG_TARGET,
                "New challenge; nonce space restarted after {} positions", scanned
            );
        }
        let epoch = self.job.stage(template);
        (self.callback.as_ref())(-1, Severity::Info, &format!("New job staged (epoch {})", epoch));
    }

    /// Start one initialized device's dispatch loop on its own thread.
    pub fn start_device(&mut self, ordinal: u32) -> Result<()> {
        #[cfg(feature = "cuda")]
        let native_kernel = self.native_kernel.clone();
        let job = Arc::clone(&self.job);
        let position = Arc::clone(&self.position);
        let solution_tx = self.solution_tx.clone();
        let callback = Arc::clone(&self.callback);

        let device = self.device_mut(ordinal)?;
        let buffer = device.buffer.clone().ok_or_else(|| {
            SolverError::Command(format!("Device {} not initialized", ordinal))
        })?;
        if device.mining.swap(true, Ordering::SeqCst) {
            return Err(SolverError::Command(format!(
                "Device {} is already mining",
                ordinal
            )));
        }

        let ctx = LoopContext {
            ordinal,
            probe: device.probe.clone(),
            kernel_source: KERNEL_SOURCE,
            #[cfg(feature = "cuda")]
            native_kernel,
            tunables: device.tunables,
            mode: device.mode,
            buffer,
            max_solutions: MAX_SOLUTION_COUNT,
            job,
            position,
            meter: Arc::clone(&device.meter),
            mining: Arc::clone(&device.mining),
            paused: Arc::clone(&device.paused),
            state: Arc::clone(&device.state),
            solution_tx,
            callback,
        };

        let handle = std::thread::Builder::new()
            .name(format!("solver-{}", ordinal))
            .spawn(move || run_loop(ctx))
            .map_err(|e| {
                SolverError::Command(format!("Failed to spawn dispatch thread ({})", e))
            })?;
        device.handle = Some(handle);
        Ok(())
    }

    /// Start every initialized device. A device that fails to start is
    /// reported and skipped; the rest of the fleet keeps going.
    pub fn start_all(&mut self) -> Result<()> {
        let ordinals: Vec<u32> = self
            .devices
            .iter()
            .filter(|d| d.buffer.is_some())
            .map(|d| d.info.ordinal)
            .collect();
        if ordinals.is_empty() {
            return Err(SolverError::Command(
                "No initialized devices to start".to_string(),
            ));
        }
        let mut started = 0usize;
        for ordinal in ordinals {
            match self.start_device(ordinal) {
                Ok(()) => started += 1,
                Err(e) => (self.callback.as_ref())(ordinal as i32, Severity::Error, &e.to_string()),
            }
        }
        if started == 0 {
            return Err(SolverError::Command("No devices started".to_string()));
        }
        Ok(())
    }

    /// Stop one device and join its loop.
    pub fn stop_device(&mut self, ordinal: u32) -> Result<()> {
        let device = self.device_mut(ordinal)?;
        device.mining.store(false, Ordering::SeqCst);
        if let Some(handle) = device.handle.take() {
            let _ = handle.join();
        }
        device.buffer = None;
        Ok(())
    }

    /// Stop the fleet and join every loop.
    pub fn stop_all(&mut self) {
        for device in &self.devices {
            device.mining.store(false, Ordering::SeqCst);
        }
        for device in &mut self.devices {
            if let Some(handle) = device.handle.take() {
                let _ = handle.join();
            }
            device.buffer = None;
        }
    }

    /// Pause dispatching without tearing anything down.
    pub fn pause_all(&self, paused: bool) {
        for device in &self.devices {
            device.paused.store(paused, Ordering::SeqCst);
        }
    }

    /// Stream of verified solutions from every device loop.
    pub fn solutions(&self) -> Receiver<Solution> {
        self.solution_rx.clone()
    }

    pub fn device_state(&self, ordinal: u32) -> DeviceState {
        self.device(ordinal)
            .map(|d| d.state.get())
            .unwrap_or(DeviceState::Uninitialized)
    }

    pub fn is_mining(&self, ordinal: u32) -> bool {
        self.device(ordinal)
            .map(|d| d.mining.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    pub fn is_any_mining(&self) -> bool {
        self.devices
            .iter()
            .any(|d| d.mining.load(Ordering::SeqCst))
    }

    /// Hashes per second for one device since its last baseline re-arm.
    pub fn hash_rate(&self, ordinal: u32) -> u64 {
        self.device(ordinal).map(|d| d.meter.rate()).unwrap_or(0)
    }

    pub fn total_hash_rate(&self) -> u64 {
        self.devices.iter().map(|d| d.meter.rate()).sum()
    }

    /// Write per-device information files for external tooling.
    pub fn write_information_files(
        &self,
        directory: &std::path::Path,
    ) -> Result<Vec<std::path::PathBuf>> {
        let records: Vec<_> = self
            .devices
            .iter()
            .map(|d| (d.info.clone(), d.tunables))
            .collect();
        crate::solver::information::write_information_files(&records, directory)
    }

    // ----------------------------------------------------------------
    // Telemetry getters: one call per metric, sentinel on unavailable.
    // Absence of the capability is a normal variant, never an error.
    // ----------------------------------------------------------------

    fn telemetry(&self, ordinal: u32) -> Option<&NvSmi> {
        self.devices
            .iter()
            .find(|d| d.info.ordinal == ordinal)
            .and_then(|d| d.telemetry.as_ref())
    }

    pub fn device_setting_max_core_clock(&self, ordinal: u32) -> i32 {
        self.telemetry(ordinal)
            .map_or(METRIC_UNAVAILABLE, |t| t.setting_max_core_clock())
    }

    pub fn device_setting_max_memory_clock(&self, ordinal: u32) -> i32 {
        self.telemetry(ordinal)
            .map_or(METRIC_UNAVAILABLE, |t| t.setting_max_memory_clock())
    }

    pub fn device_setting_power_limit(&self, ordinal: u32) -> i32 {
        self.telemetry(ordinal)
            .map_or(METRIC_UNAVAILABLE, |t| t.setting_power_limit())
    }

    pub fn device_setting_thermal_limit(&self, ordinal: u32) -> i32 {
        self.telemetry(ordinal)
            .map_or(METRIC_UNAVAILABLE, |t| t.setting_thermal_limit())
    }

    pub fn device_setting_fan_level_percent(&self, ordinal: u32) -> i32 {
        self.telemetry(ordinal)
            .map_or(METRIC_UNAVAILABLE, |t| t.setting_fan_level_percent())
    }

    pub fn device_current_fan_tachometer_rpm(&self, ordinal: u32) -> i32 {
        self.telemetry(ordinal)
            .map_or(METRIC_UNAVAILABLE, |t| t.current_fan_tachometer_rpm())
    }

    pub fn device_current_temperature(&self, ordinal: u32) -> i32 {
        self.telemetry(ordinal)
            .map_or(TEMPERATURE_UNAVAILABLE, |t| t.current_temperature())
    }

    pub fn device_current_core_clock(&self, ordinal: u32) -> i32 {
        self.telemetry(ordinal)
            .map_or(METRIC_UNAVAILABLE, |t| t.current_core_clock())
    }

    pub fn device_current_memory_clock(&self, ordinal: u32) -> i32 {
        self.telemetry(ordinal)
            .map_or(METRIC_UNAVAILABLE, |t| t.current_memory_clock())
    }

    pub fn device_current_utilization_percent(&self, ordinal: u32) -> i32 {
        self.telemetry(ordinal)
            .map_or(METRIC_UNAVAILABLE, |t| t.current_utilization_percent())
    }

    pub fn device_current_pstate(&self, ordinal: u32) -> i32 {
        self.telemetry(ordinal)
            .map_or(METRIC_UNAVAILABLE, |t| t.current_pstate())
    }

    pub fn device_current_throttle_reasons(&self, ordinal: u32) -> String {
        self.telemetry(ordinal)
            .map_or(String::new(), |t| t.current_throttle_reasons())
    }

    /// Full point-in-time sample for one device.
    pub fn telemetry_sample(&self, ordinal: u32) -> TelemetrySample {
        TelemetrySample::collect(self.telemetry(ordinal))
    }
}

impl Drop for SolverRegistry {
    fn drop(&mut self) {
        self.stop_all();
    }
}

// Changelog:
// - v0.9.2 (2026-08-02): Feature-gated native backend.
//   - Native kernel module is loaded once via load_native_kernel() and
//     shared into every native device initializer.
//   - start_all() now skips (and reports) devices that fail to start
//     instead of aborting the fleet.
// - v0.9.0 (2026-07-18): Initial registry.
//   - Enumeration across backends with flavor resolved once, per-device
//     dispatch threads, telemetry getters by ordinal, solution stream.
