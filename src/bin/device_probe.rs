// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/bin/device_probe.rs
// Version: 0.9.1
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// Standalone diagnostic: enumerates accelerator devices, prints the device
// report as JSON, samples telemetry, and optionally runs the CPU reference
// scanner through the harvest protocol to sanity-check the solve path
// without touching a GPU.

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, error, info};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use std::path::PathBuf;

use sha3_solver::core::keccak;
use sha3_solver::core::types::{MAX_SOLUTION_COUNT, WorkTemplate};
use sha3_solver::solver::device::{DeviceFlavor, Tunables};
use sha3_solver::solver::information::write_information_files;
use sha3_solver::solver::registry::SolverRegistry;
use sha3_solver::solver::solution::SolutionBuffer;
use sha3_solver::solver::telemetry::{NvSmi, TelemetrySample};

const LOG_TARGET: &str = "sha3solver::device_probe";

#[derive(Parser, Debug)]
#[command(
    name = "device_probe",
    version,
    about = "Enumerate solver devices and sample telemetry",
    long_about = "Lists every accelerator device the solver core can see, with its \
                  resolved backend flavor, capability, and default work sizing. \
                  Telemetry sampling and a CPU self-test of the harvest protocol \
                  are available as flags; neither requires a staged job."
)]
struct Args {
    /// Sample telemetry for every device (sentinels where unavailable)
    #[arg(long, default_value = "false")]
    telemetry: bool,

    /// Run the CPU reference scanner through the solution buffer protocol
    #[arg(long, default_value = "false")]
    self_test: bool,

    /// Write per-device JSON information files into this directory
    #[arg(long, value_name = "DIR")]
    information_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, default_value = "false")]
    debug: bool,
}

fn init_logging(debug: bool) -> Result<()> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} [{t}] {h({l})} {m}{n}")))
        .build();
    let level = if debug { LevelFilter::Debug } else { LevelFilter::Info };
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

/// Exercise the harvest protocol on the host: an all-permissive target makes
/// every nonce qualify, so the buffer must saturate at its capacity and
/// drain clean.
fn run_self_test() {
    info!(target: LOG_TARGET, "Running CPU self-test of the harvest protocol...");

    let template = WorkTemplate::new([0x11u8; 32], [0x22u8; 20], [0xFFu8; 32]);
    let buffer = SolutionBuffer::new(MAX_SOLUTION_COUNT);

    let window = 64u64;
    let found = keccak::scan_range(&template, 1, window);
    for nonce in &found {
        buffer.try_push(*nonce);
    }

    let reported = buffer.peek_count();
    let harvested = buffer.harvest();
    info!(target: LOG_TARGET,
        "Scanned {} nonces: {} qualified, {} reported (cap {}), counter now {}",
        window,
        found.len(),
        reported,
        MAX_SOLUTION_COUNT,
        buffer.peek_count()
    );

    for nonce in harvested {
        match keccak::verify(&template, nonce) {
            Some((_, digest)) => {
                info!(target: LOG_TARGET, "  nonce {:#018x} digest {}", nonce, hex::encode(digest));
            }
            None => {
                error!(target: LOG_TARGET, "  nonce {:#018x} FAILED re-verification", nonce);
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug)?;

    if args.self_test {
        run_self_test();
    }

    let devices = match SolverRegistry::enumerate() {
        Ok(devices) => devices,
        Err(e) => {
            error!(target: LOG_TARGET, "{}", e);
            if args.self_test {
                return Ok(());
            }
            return Err(e.into());
        }
    };

    info!(target: LOG_TARGET, "🔍 Found {} device(s)", devices.len());
    for device in &devices {
        info!(target: LOG_TARGET, "Device {}: {}", device.ordinal, device.info_string());
        println!("{}", serde_json::to_string_pretty(device)?);
    }

    if let Some(dir) = &args.information_dir {
        let records: Vec<_> = devices
            .iter()
            .map(|d| (d.clone(), Tunables::for_device(d, None, None)))
            .collect();
        let written = write_information_files(&records, dir)?;
        info!(target: LOG_TARGET, "📄 Wrote {} information file(s) to {}", written.len(), dir.display());
    }

    if args.telemetry {
        let mut native_index = 0u32;
        for device in &devices {
            // The capability only exists on native-flavor devices, and
            // nvidia-smi indexes those by its own ordering
            let capability = if device.flavor == DeviceFlavor::Native {
                let probed = NvSmi::probe(native_index);
                native_index += 1;
                probed
            } else {
                None
            };
            let sample = TelemetrySample::collect(capability.as_ref());
            info!(target: LOG_TARGET, "Telemetry for device {}:", device.ordinal);
            println!("{}", serde_json::to_string_pretty(&sample)?);
        }
    }

    Ok(())
}
