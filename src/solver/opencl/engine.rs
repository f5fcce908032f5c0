// SHA3 Solver - Free and Open Source Software Statement
//
// File: src/solver/opencl/engine.rs
// Version: 0.9.2
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// OpenCL solver engine for the portable backend: binds context and queue,
// compiles the search program from the process-wide source with a
// backend-specific preamble, stages job state into device buffers, and
// launches the search kernel over a work-position offset window. The
// solutions buffer aliases the host allocation (CL_MEM_USE_HOST_PTR), so
// harvests read host memory directly after the queue drains.

use std::ptr;
use std::sync::Arc;

use log::{debug, error, info};
use opencl3::{
    command_queue::CommandQueue,
    context::Context,
    kernel::{ExecuteKernel, Kernel},
    memory::{Buffer, CL_MEM_READ_ONLY, CL_MEM_READ_WRITE, CL_MEM_USE_HOST_PTR},
    program::Program,
    types::{CL_TRUE, cl_uchar, cl_uint, cl_ulong},
};

use crate::core::types::{MESSAGE_LENGTH, SPONGE_WORDS, SpongeState, UINT256_LENGTH};
use crate::solver::device::DeviceFlavor;
use crate::solver::dispatch::DispatchMode;
use crate::solver::error::{Result, SolverError};
use crate::solver::opencl::device::OpenClDevice;
use crate::solver::solution::SolutionBuffer;

const LOG_TARGET: &str = "sha3solver::opencl::engine";

/// Kernel entry for midstate dispatches.
const KERNEL_MIDSTATE: &str = "mine_midstate";
/// Kernel entry for full-message dispatches.
const KERNEL_MESSAGE: &str = "mine_message";

pub struct OpenClEngine {
    device: OpenClDevice,
    context: Context,
    queue: Option<CommandQueue>,
    program: Option<Program>,
    kernel_midstate: Option<Kernel>,
    kernel_message: Option<Kernel>,
    solutions_buffer: Option<Buffer<cl_ulong>>,
    midstate_buffer: Option<Buffer<cl_ulong>>,
    message_buffer: Option<Buffer<cl_uchar>>,
    target_buffer: Option<Buffer<cl_uchar>>,
    high64_buffer: Option<Buffer<cl_ulong>>,
    host_solutions: Option<Arc<SolutionBuffer>>,
    initialized: bool,
}

impl OpenClEngine {
    /// Create an engine bound to one device. The context is created here;
    /// queue, program and buffers come with `initialize`.
    pub fn new(device: OpenClDevice) -> Result<Self> {
        debug!(target: LOG_TARGET, "Creating OpenCL engine for {}", device.info().name);
        let context = Context::from_device(device.device()).map_err(|e| {
            SolverError::Command(format!("Failed to create context ({})", e))
        })?;
        Ok(Self {
            device,
            context,
            queue: None,
            program: None,
            kernel_midstate: None,
            kernel_message: None,
            solutions_buffer: None,
            midstate_buffer: None,
            message_buffer: None,
            target_buffer: None,
            high64_buffer: None,
            host_solutions: None,
            initialized: false,
        })
    }

    /// Preamble prepended to the shared kernel source for this device.
    fn source_preamble(&self) -> String {
        let info = self.device.info();
        match info.flavor {
            DeviceFlavor::Native => {
                format!("#define PLATFORM 1\n#define COMPUTE {}\n", info.compute)
            }
            DeviceFlavor::PortableDiscrete => "#define PLATFORM 2\n".to_string(),
            DeviceFlavor::PortableIntegrated => String::new(),
        }
    }

    /// Bind queue and buffers, compile the search program, and alias the
    /// zero-copy solutions store. `kernel_source` is the process-wide
    /// immutable source text; it is never re-read here.
    pub fn initialize(
        &mut self,
        kernel_source: &str,
        host_solutions: Arc<SolutionBuffer>,
    ) -> Result<()> {
        info!(target: LOG_TARGET, "Initializing OpenCL engine for {}", self.device.info().name);

        let queue = CommandQueue::create_default(&self.context, 0).map_err(|e| {
            SolverError::Command(format!("Failed to create command queue ({})", e))
        })?;

        let solutions_buffer = unsafe {
            Buffer::<cl_ulong>::create(
                &self.context,
                CL_MEM_READ_WRITE | CL_MEM_USE_HOST_PTR,
                host_solutions.slot_count(),
                host_solutions.as_ptr() as *mut std::ffi::c_void,
            )
            .map_err(|e| SolverError::Command(format!("Failed to use solutions buffer ({})", e)))?
        };

        let midstate_buffer = unsafe {
            Buffer::<cl_ulong>::create(&self.context, CL_MEM_READ_ONLY, SPONGE_WORDS, ptr::null_mut())
                .map_err(|e| {
                    SolverError::Command(format!("Failed to allocate midstate buffer ({})", e))
                })?
        };

        let message_buffer = unsafe {
            Buffer::<cl_uchar>::create(&self.context, CL_MEM_READ_ONLY, MESSAGE_LENGTH, ptr::null_mut())
                .map_err(|e| {
                    SolverError::Command(format!("Failed to allocate message buffer ({})", e))
                })?
        };

        let target_buffer = unsafe {
            Buffer::<cl_uchar>::create(&self.context, CL_MEM_READ_ONLY, UINT256_LENGTH, ptr::null_mut())
                .map_err(|e| {
                    SolverError::Command(format!("Failed to allocate target buffer ({})", e))
                })?
        };

        let high64_buffer = unsafe {
            Buffer::<cl_ulong>::create(&self.context, CL_MEM_READ_ONLY, 1, ptr::null_mut()).map_err(
                |e| SolverError::Command(format!("Failed to allocate target prefix buffer ({})", e)),
            )?
        };

        // Compile the shared source with this device's preamble
        let source = format!("{}{}", self.source_preamble(), kernel_source);
        let mut program = Program::create_from_source(&self.context, &source)
            .map_err(|e| SolverError::Build(format!("Failed to create program ({})", e)))?;

        if let Err(e) = program.build(self.context.devices(), "") {
            // Surface the full diagnostic log verbatim; never suppress it
            let mut log_text = String::new();
            for device_id in self.context.devices() {
                if let Ok(build_log) = program.get_build_log(*device_id) {
                    log_text.push_str(&build_log);
                }
            }
            error!(target: LOG_TARGET,
                "Kernel build failed for {}: {}", self.device.info().name, e
            );
            return Err(SolverError::Build(format!(
                "Failed to build program ({})\n{}",
                e, log_text
            )));
        }

        let kernel_midstate = Kernel::create(&program, KERNEL_MIDSTATE).map_err(|e| {
            SolverError::Build(format!("Failed to create kernel {} ({})", KERNEL_MIDSTATE, e))
        })?;
        let kernel_message = Kernel::create(&program, KERNEL_MESSAGE).map_err(|e| {
            SolverError::Build(format!("Failed to create kernel {} ({})", KERNEL_MESSAGE, e))
        })?;

        self.queue = Some(queue);
        self.program = Some(program);
        self.kernel_midstate = Some(kernel_midstate);
        self.kernel_message = Some(kernel_message);
        self.solutions_buffer = Some(solutions_buffer);
        self.midstate_buffer = Some(midstate_buffer);
        self.message_buffer = Some(message_buffer);
        self.target_buffer = Some(target_buffer);
        self.high64_buffer = Some(high64_buffer);
        self.host_solutions = Some(host_solutions);
        self.initialized = true;

        info!(target: LOG_TARGET,
            "OpenCL engine initialized for {} (CU: {}, WG: {})",
            self.device.info().name,
            self.device.info().max_compute_units,
            self.device.info().max_work_group_size
        );
        Ok(())
    }

    fn queue_ref(&self) -> Result<&CommandQueue> {
        self.queue
            .as_ref()
            .ok_or_else(|| SolverError::Command("Engine not initialized".to_string()))
    }

    /// Stage the high-order 64 bits of the target (fast-reject prefix).
    pub fn push_high64_target(&mut self, high64_target: u64) -> Result<()> {
        let queue = self
            .queue
            .as_ref()
            .ok_or_else(|| SolverError::Command("Engine not initialized".to_string()))?;
        let buffer = self
            .high64_buffer
            .as_mut()
            .ok_or_else(|| SolverError::Command("Engine not initialized".to_string()))?;
        unsafe {
            queue
                .enqueue_write_buffer(buffer, CL_TRUE, 0, &[high64_target], &[])
                .map_err(|e| {
                    SolverError::Command(format!("Failed to push high-64 target ({})", e))
                })?;
        }
        Ok(())
    }

    /// Stage the full 256-bit target.
    pub fn push_target(&mut self, target: &[u8; UINT256_LENGTH]) -> Result<()> {
        let queue = self
            .queue
            .as_ref()
            .ok_or_else(|| SolverError::Command("Engine not initialized".to_string()))?;
        let buffer = self
            .target_buffer
            .as_mut()
            .ok_or_else(|| SolverError::Command("Engine not initialized".to_string()))?;
        unsafe {
            queue
                .enqueue_write_buffer(buffer, CL_TRUE, 0, &target[..], &[])
                .map_err(|e| SolverError::Command(format!("Failed to push target ({})", e)))?;
        }
        Ok(())
    }

    /// Stage the precomputed midstate.
    pub fn push_midstate(&mut self, midstate: &SpongeState) -> Result<()> {
        let queue = self
            .queue
            .as_ref()
            .ok_or_else(|| SolverError::Command("Engine not initialized".to_string()))?;
        let buffer = self
            .midstate_buffer
            .as_mut()
            .ok_or_else(|| SolverError::Command("Engine not initialized".to_string()))?;
        unsafe {
            queue
                .enqueue_write_buffer(buffer, CL_TRUE, 0, &midstate[..], &[])
                .map_err(|e| SolverError::Command(format!("Failed to push midstate ({})", e)))?;
        }
        Ok(())
    }

    /// Stage the full message template.
    pub fn push_message(&mut self, message: &[u8; MESSAGE_LENGTH]) -> Result<()> {
        let queue = self
            .queue
            .as_ref()
            .ok_or_else(|| SolverError::Command("Engine not initialized".to_string()))?;
        let buffer = self
            .message_buffer
            .as_mut()
            .ok_or_else(|| SolverError::Command("Engine not initialized".to_string()))?;
        unsafe {
            queue
                .enqueue_write_buffer(buffer, CL_TRUE, 0, &message[..], &[])
                .map_err(|e| SolverError::Command(format!("Failed to push message ({})", e)))?;
        }
        Ok(())
    }

    /// Launch one search window of `global_work_size` nonces starting at
    /// `work_position` and wait for the queue to drain. Kernel writes land
    /// in the aliased host solutions store.
    pub fn dispatch(
        &mut self,
        mode: DispatchMode,
        work_position: u64,
        global_work_size: u64,
        local_work_size: u32,
        max_solution_count: u32,
    ) -> Result<()> {
        if !self.initialized {
            return Err(SolverError::Command("Engine not initialized".to_string()));
        }

        let kernel = match mode {
            DispatchMode::Midstate => self.kernel_midstate.as_ref(),
            DispatchMode::FullMessage => self.kernel_message.as_ref(),
        }
        .ok_or_else(|| SolverError::Command("Engine not initialized".to_string()))?;
        let queue = self.queue_ref()?;
        let solutions = self
            .solutions_buffer
            .as_ref()
            .ok_or_else(|| SolverError::Command("Engine not initialized".to_string()))?;

        let max_count: cl_uint = max_solution_count;
        let position: cl_ulong = work_position;

        unsafe {
            let mut exec = ExecuteKernel::new(kernel);
            match mode {
                DispatchMode::Midstate => {
                    exec.set_arg(self.midstate_buffer.as_ref().ok_or_else(|| {
                        SolverError::Command("Engine not initialized".to_string())
                    })?)
                    .set_arg(self.high64_buffer.as_ref().ok_or_else(|| {
                        SolverError::Command("Engine not initialized".to_string())
                    })?);
                }
                DispatchMode::FullMessage => {
                    exec.set_arg(self.message_buffer.as_ref().ok_or_else(|| {
                        SolverError::Command("Engine not initialized".to_string())
                    })?)
                    .set_arg(self.target_buffer.as_ref().ok_or_else(|| {
                        SolverError::Command("Engine not initialized".to_string())
                    })?);
                }
            }
            exec.set_arg(solutions)
                .set_arg(&max_count)
                .set_arg(&position)
                .set_global_work_size(global_work_size as usize)
                .set_local_work_size(local_work_size as usize)
                .enqueue_nd_range(queue)
                .map_err(|e| SolverError::Command(format!("Failed to execute kernel ({})", e)))?;
        }

        queue
            .finish()
            .map_err(|e| SolverError::Command(format!("Failed to finish queue ({})", e)))?;
        Ok(())
    }

    /// Non-blocking peek of the shared counter.
    pub fn peek_solution_count(&self) -> u32 {
        self.host_solutions
            .as_ref()
            .map(|s| s.peek_count())
            .unwrap_or(0)
    }

    /// Drain the shared store and reset its counter.
    pub fn harvest_solutions(&self) -> Vec<u64> {
        self.host_solutions
            .as_ref()
            .map(|s| s.harvest())
            .unwrap_or_default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn device(&self) -> &OpenClDevice {
        &self.device
    }

    /// Tear down device objects. Buffers and queue are released before the
    /// context; the host solutions allocation outlives the aliasing buffer.
    pub fn release(&mut self) {
        self.kernel_midstate = None;
        self.kernel_message = None;
        self.program = None;
        self.solutions_buffer = None;
        self.midstate_buffer = None;
        self.message_buffer = None;
        self.target_buffer = None;
        self.high64_buffer = None;
        self.queue = None;
        self.host_solutions = None;
        self.initialized = false;
        debug!(target: LOG_TARGET, "OpenCL engine released for {}", self.device.info().name);
    }
}
