// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/solver/dispatch.rs
// Version: 0.9.2
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// The per-device dispatch loop. Each device runs this on its own thread
// with a backend engine created in-thread (device APIs are touchy about
// thread affinity). The loop stages new job state no later than the next
// launch, reserves a disjoint work-position window, launches, harvests the
// shared solution store, re-verifies candidates against the current target,
// and discards stale harvests. A failed backend call aborts only this
// device's loop.
//
// Tree Location:
// - src/solver/dispatch.rs (dispatch loop and state machine)
// - Depends on: log, crossbeam

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam::channel::Sender;
use log::{debug, info};
use serde::Serialize;

use crate::core::keccak;
use crate::core::types::{MESSAGE_LENGTH, Solution, SpongeState, UINT256_LENGTH};
use crate::solver::device::Tunables;
use crate::solver::error::{MessageCallback, Result, Severity};
use crate::solver::hashrate::HashMeter;
use crate::solver::solution::SolutionBuffer;
use crate::solver::work::{JobBoard, WorkPosition};

#[cfg(feature = "gpu")]
use crate::solver::opencl::{OpenClDevice, OpenClEngine};

#[cfg(feature = "cuda")]
use crate::solver::cuda::CudaEngine;
#[cfg(feature = "cuda")]
use crate::solver::device::DeviceInfo;

const LOG_TARGET: &str = "sha3solver::dispatch";

/// Sleep while paused or waiting for the first job.
const IDLE_WAIT: Duration = Duration::from_millis(500);

/// How job state reaches the kernel.
///
/// Midstate amortizes the fixed-prefix absorption once on the host; full
/// message recomputes everything on-device. Throughput differs, results do
/// not: both modes scan the same nonce placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DispatchMode {
    Midstate,
    FullMessage,
}

/// Lifecycle of one device:
/// `Uninitialized → Initialized → (Dispatching ⇄ Idle) → Disposed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum DeviceState {
    Uninitialized = 0,
    Initialized = 1,
    Dispatching = 2,
    Idle = 3,
    Disposed = 4,
}

/// Shared, lock-free view of a device's state.
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(DeviceState::Uninitialized as u8))
    }

    pub fn set(&self, state: DeviceState) {
        self.0.store(state as u8, Ordering::Release);
    }

    pub fn get(&self) -> DeviceState {
        match self.0.load(Ordering::Acquire) {
            1 => DeviceState::Initialized,
            2 => DeviceState::Dispatching,
            3 => DeviceState::Idle,
            4 => DeviceState::Disposed,
            _ => DeviceState::Uninitialized,
        }
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

/// What the loop thread needs to rebuild its engine. Backend handles are
/// created inside the loop thread, not shipped across it.
#[derive(Clone)]
pub(crate) enum BackendProbe {
    #[cfg(feature = "gpu")]
    OpenCl(OpenClDevice),
    #[cfg(feature = "cuda")]
    Cuda { info: DeviceInfo, device_index: u32 },
}

/// A live backend engine, dispatch-ready.
pub(crate) enum Engine {
    #[cfg(feature = "gpu")]
    OpenCl(OpenClEngine),
    #[cfg(feature = "cuda")]
    Cuda(CudaEngine),
}

impl Engine {
    fn push_high64_target(&mut self, high64: u64) -> Result<()> {
        match self {
            #[cfg(feature = "gpu")]
            Engine::OpenCl(e) => e.push_high64_target(high64),
            #[cfg(feature = "cuda")]
            Engine::Cuda(e) => e.push_high64_target(high64),
            #[cfg(not(any(feature = "gpu", feature = "cuda")))]
            _ => unreachable!("no backend compiled"),
        }
    }

    fn push_target(&mut self, target: &[u8; UINT256_LENGTH]) -> Result<()> {
        match self {
            #[cfg(feature = "gpu")]
            Engine::OpenCl(e) => e.push_target(target),
            #[cfg(feature = "cuda")]
            Engine::Cuda(e) => e.push_target(target),
            #[cfg(not(any(feature = "gpu", feature = "cuda")))]
            _ => unreachable!("no backend compiled"),
        }
    }

    fn push_midstate(&mut self, midstate: &SpongeState) -> Result<()> {
        match self {
            #[cfg(feature = "gpu")]
            Engine::OpenCl(e) => e.push_midstate(midstate),
            #[cfg(feature = "cuda")]
            Engine::Cuda(e) => e.push_midstate(midstate),
            #[cfg(not(any(feature = "gpu", feature = "cuda")))]
            _ => unreachable!("no backend compiled"),
        }
    }

    fn push_message(&mut self, message: &[u8; MESSAGE_LENGTH]) -> Result<()> {
        match self {
            #[cfg(feature = "gpu")]
            Engine::OpenCl(e) => e.push_message(message),
            #[cfg(feature = "cuda")]
            Engine::Cuda(e) => e.push_message(message),
            #[cfg(not(any(feature = "gpu", feature = "cuda")))]
            _ => unreachable!("no backend compiled"),
        }
    }

    fn dispatch(
        &mut self,
        mode: DispatchMode,
        work_position: u64,
        global_work_size: u64,
        local_work_size: u32,
        max_solution_count: u32,
    ) -> Result<()> {
        match self {
            #[cfg(feature = "gpu")]
            Engine::OpenCl(e) => e.dispatch(
                mode,
                work_position,
                global_work_size,
                local_work_size,
                max_solution_count,
            ),
            #[cfg(feature = "cuda")]
            Engine::Cuda(e) => e.dispatch(
                mode,
                work_position,
                global_work_size,
                local_work_size,
                max_solution_count,
            ),
            #[cfg(not(any(feature = "gpu", feature = "cuda")))]
            _ => unreachable!("no backend compiled"),
        }
    }

    fn peek_solution_count(&self) -> u32 {
        match self {
            #[cfg(feature = "gpu")]
            Engine::OpenCl(e) => e.peek_solution_count(),
            #[cfg(feature = "cuda")]
            Engine::Cuda(e) => e.peek_solution_count(),
            #[cfg(not(any(feature = "gpu", feature = "cuda")))]
            _ => unreachable!("no backend compiled"),
        }
    }

    fn harvest_solutions(&mut self) -> Vec<u64> {
        match self {
            #[cfg(feature = "gpu")]
            Engine::OpenCl(e) => e.harvest_solutions(),
            #[cfg(feature = "cuda")]
            Engine::Cuda(e) => e.harvest_solutions(),
            #[cfg(not(any(feature = "gpu", feature = "cuda")))]
            _ => unreachable!("no backend compiled"),
        }
    }

    fn release(&mut self) {
        match self {
            #[cfg(feature = "gpu")]
            Engine::OpenCl(e) => e.release(),
            #[cfg(feature = "cuda")]
            Engine::Cuda(e) => e.release(),
            #[cfg(not(any(feature = "gpu", feature = "cuda")))]
            _ => unreachable!("no backend compiled"),
        }
    }
}

/// Everything one dispatch loop owns or shares.
pub(crate) struct LoopContext {
    pub ordinal: u32,
    pub probe: BackendProbe,
    pub kernel_source: &'static str,
    #[cfg(feature = "cuda")]
    pub native_kernel: Option<Arc<String>>,
    pub tunables: Tunables,
    pub mode: DispatchMode,
    pub buffer: Arc<SolutionBuffer>,
    pub max_solutions: u32,
    pub job: Arc<JobBoard>,
    pub position: Arc<WorkPosition>,
    pub meter: Arc<HashMeter>,
    pub mining: Arc<AtomicBool>,
    pub paused: Arc<AtomicBool>,
    pub state: Arc<StateCell>,
    pub solution_tx: Sender<Solution>,
    pub callback: MessageCallback,
}

/// Build this thread's engine from the enumeration probe.
fn build_engine(ctx: &LoopContext) -> Result<Engine> {
    match &ctx.probe {
        #[cfg(feature = "gpu")]
        BackendProbe::OpenCl(device) => {
            let mut engine = OpenClEngine::new(device.clone())?;
            engine.initialize(ctx.kernel_source, Arc::clone(&ctx.buffer))?;
            Ok(Engine::OpenCl(engine))
        }
        #[cfg(feature = "cuda")]
        BackendProbe::Cuda { info, device_index } => {
            let ptx = ctx.native_kernel.as_ref().ok_or_else(|| {
                crate::solver::error::SolverError::Build(
                    "No native kernel module loaded".to_string(),
                )
            })?;
            let mut engine = CudaEngine::new(info.clone(), *device_index);
            engine.initialize(ptx, ctx.max_solutions)?;
            Ok(Engine::Cuda(engine))
        }
        #[cfg(not(any(feature = "gpu", feature = "cuda")))]
        _ => unreachable!("no backend compiled"),
    }
}

/// The dispatch loop body. Runs until the mining flag drops or a backend
/// call fails; either way the engine is released and the device ends up
/// `Disposed`.
pub(crate) fn run_loop(ctx: LoopContext) {
    let ordinal = ctx.ordinal as i32;

    let mut engine = match build_engine(&ctx) {
        Ok(engine) => engine,
        Err(e) => {
            (ctx.callback.as_ref())(ordinal, Severity::Error, &e.to_string());
            ctx.mining.store(false, Ordering::SeqCst);
            ctx.state.set(DeviceState::Disposed);
            return;
        }
    };
    ctx.state.set(DeviceState::Initialized);
    (ctx.callback.as_ref())(ordinal, Severity::Info, "Start mining...");
    debug!(target: LOG_TARGET,
        "Device {}: global={} local={} mode={:?}",
        ctx.ordinal, ctx.tunables.global_work_size, ctx.tunables.local_work_size, ctx.mode
    );

    ctx.meter.rearm();

    // Epoch of the job this loop last staged onto the device
    let mut staged_epoch: Option<u64> = None;

    'mining: while ctx.mining.load(Ordering::SeqCst) {
        if ctx.paused.load(Ordering::SeqCst) {
            thread::sleep(IDLE_WAIT);
            ctx.meter.rearm();
            continue;
        }

        // Stage new job state, if any, before the next launch
        let (template, epoch) = match ctx.job.snapshot() {
            Some(snapshot) => snapshot,
            None => {
                thread::sleep(IDLE_WAIT);
                continue;
            }
        };
        if staged_epoch != Some(epoch) {
            let pushed = match ctx.mode {
                DispatchMode::Midstate => engine
                    .push_high64_target(template.high64_target)
                    .and_then(|_| engine.push_midstate(&template.midstate)),
                DispatchMode::FullMessage => engine
                    .push_target(&template.target)
                    .and_then(|_| engine.push_message(&template.message)),
            };
            if let Err(e) = pushed {
                (ctx.callback.as_ref())(ordinal, Severity::Error, &e.to_string());
                break 'mining;
            }
            // Fresh work: re-arm the rate baseline so the first window does
            // not report a spike
            ctx.meter.rearm();
            staged_epoch = Some(epoch);
        }

        let work_position = ctx.position.reserve(ctx.tunables.global_work_size);

        ctx.state.set(DeviceState::Dispatching);
        if let Err(e) = engine.dispatch(
            ctx.mode,
            work_position,
            ctx.tunables.global_work_size,
            ctx.tunables.local_work_size,
            ctx.max_solutions,
        ) {
            (ctx.callback.as_ref())(ordinal, Severity::Error, &e.to_string());
            break 'mining;
        }
        ctx.state.set(DeviceState::Idle);

        // Every scanned nonce counts, solutions or not
        ctx.meter.add(ctx.tunables.global_work_size);

        if engine.peek_solution_count() > 0 {
            let nonces = engine.harvest_solutions();
            let stale = ctx.job.epoch() != epoch;
            if stale {
                (ctx.callback.as_ref())(
                    ordinal,
                    Severity::Warn,
                    &format!("Discarding {} stale solution(s)", nonces.len()),
                );
                continue;
            }
            for nonce in nonces {
                // Zero marks an empty slot
                if nonce == 0 {
                    continue;
                }
                match keccak::verify(&template, nonce) {
                    Some((solution, digest)) => {
                        (ctx.callback.as_ref())(ordinal, Severity::Info, "Solution verified, queuing...");
                        let record = Solution {
                            device_ordinal: ctx.ordinal,
                            nonce,
                            solution,
                            digest,
                            challenge: template.challenge,
                        };
                        if ctx.solution_tx.send(record).is_err() {
                            debug!(target: LOG_TARGET, "Solution receiver dropped; stopping device {}", ctx.ordinal);
                            break 'mining;
                        }
                    }
                    None => {
                        (ctx.callback.as_ref())(
                            ordinal,
                            Severity::Error,
                            "CPU verification failed: invalid solution",
                        );
                    }
                }
            }
        }
    }

    ctx.mining.store(false, Ordering::SeqCst);
    engine.release();
    ctx.state.set(DeviceState::Disposed);
    info!(target: LOG_TARGET, "Device {} mining stopped", ctx.ordinal);
    (ctx.callback.as_ref())(ordinal, Severity::Info, "Mining stopped.");
}
