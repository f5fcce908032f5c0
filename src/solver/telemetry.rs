// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/solver/telemetry.rs
// Version: 0.9.1
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// Best-effort hardware telemetry through the nvidia-smi query interface.
// The capability is probed once per device at initialization and only
// attached where the platform exposes it; absence of the capability, or any
// failed query, resolves to a defined sentinel, never an error. Readings are
// never cached — each call reflects current hardware state.
//
// Tree Location:
// - src/solver/telemetry.rs (vendor telemetry capability)
// - Depends on: serde, log

use std::process::Command;

use log::debug;
use serde::Serialize;

const LOG_TARGET: &str = "sha3solver::telemetry";

/// Sentinel for clock/power/limit/fan/utilization/pstate metrics.
pub const METRIC_UNAVAILABLE: i32 = -1;
/// Sentinel for temperature, which can legitimately be negative.
pub const TEMPERATURE_UNAVAILABLE: i32 = i32::MIN;

/// Vendor management capability for one device, backed by nvidia-smi.
#[derive(Debug, Clone)]
pub struct NvSmi {
    device_index: u32,
}

impl NvSmi {
    /// Probe for the capability on a device. Returns `None` when nvidia-smi
    /// is not installed or does not answer for this index.
    pub fn probe(device_index: u32) -> Option<NvSmi> {
        let capability = NvSmi { device_index };
        if capability.query("name").is_some() {
            debug!(target: LOG_TARGET, "nvidia-smi capability attached to device {}", device_index);
            Some(capability)
        } else {
            debug!(target: LOG_TARGET, "nvidia-smi not available for device {}", device_index);
            None
        }
    }

    /// One query-gpu field, trimmed. `None` on any spawn, exit, or decode
    /// failure.
    fn query(&self, field: &str) -> Option<String> {
        let output = Command::new("nvidia-smi")
            .arg("-i")
            .arg(self.device_index.to_string())
            .arg(format!("--query-gpu={}", field))
            .arg("--format=csv,noheader,nounits")
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let text = String::from_utf8(output.stdout).ok()?;
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.contains("N/A") || trimmed.contains("Not Supported") {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Parse a numeric field, rounding floats the way nvidia-smi reports
    /// wattage.
    fn query_i32(&self, field: &str) -> Option<i32> {
        self.query(field)?.parse::<f64>().ok().map(|v| v as i32)
    }

    pub fn setting_max_core_clock(&self) -> i32 {
        self.query_i32("clocks.max.sm").unwrap_or(METRIC_UNAVAILABLE)
    }

    pub fn setting_max_memory_clock(&self) -> i32 {
        self.query_i32("clocks.max.mem").unwrap_or(METRIC_UNAVAILABLE)
    }

    pub fn setting_power_limit(&self) -> i32 {
        self.query_i32("power.limit").unwrap_or(METRIC_UNAVAILABLE)
    }

    pub fn setting_thermal_limit(&self) -> i32 {
        self.query_i32("temperature.gpu.tlimit")
            .unwrap_or(METRIC_UNAVAILABLE)
    }

    pub fn setting_fan_level_percent(&self) -> i32 {
        self.query_i32("fan.speed").unwrap_or(METRIC_UNAVAILABLE)
    }

    /// The tachometer is not exposed by nvidia-smi; permanently the
    /// sentinel, as on the original NvSMI path.
    pub fn current_fan_tachometer_rpm(&self) -> i32 {
        METRIC_UNAVAILABLE
    }

    pub fn current_temperature(&self) -> i32 {
        self.query_i32("temperature.gpu")
            .unwrap_or(TEMPERATURE_UNAVAILABLE)
    }

    pub fn current_core_clock(&self) -> i32 {
        self.query_i32("clocks.sm").unwrap_or(METRIC_UNAVAILABLE)
    }

    pub fn current_memory_clock(&self) -> i32 {
        self.query_i32("clocks.mem").unwrap_or(METRIC_UNAVAILABLE)
    }

    pub fn current_utilization_percent(&self) -> i32 {
        self.query_i32("utilization.gpu").unwrap_or(METRIC_UNAVAILABLE)
    }

    /// Performance state as a number ("P2" -> 2).
    pub fn current_pstate(&self) -> i32 {
        self.query("pstate")
            .and_then(|p| p.trim_start_matches(['P', 'p']).parse::<i32>().ok())
            .unwrap_or(METRIC_UNAVAILABLE)
    }

    /// Active throttle reasons as reported; empty when unavailable.
    pub fn current_throttle_reasons(&self) -> String {
        self.query("clocks_event_reasons.active")
            .or_else(|| self.query("clocks_throttle_reasons.active"))
            .unwrap_or_default()
    }
}

/// Point-in-time telemetry readings for one device.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TelemetrySample {
    pub core_clock: i32,
    pub memory_clock: i32,
    pub max_core_clock: i32,
    pub max_memory_clock: i32,
    pub power_limit: i32,
    pub thermal_limit: i32,
    pub fan_level_percent: i32,
    pub fan_tachometer_rpm: i32,
    pub temperature: i32,
    pub utilization_percent: i32,
    pub pstate: i32,
    pub throttle_reasons: String,
}

impl TelemetrySample {
    /// Collect a fresh sample; all sentinels when the capability is absent.
    pub fn collect(capability: Option<&NvSmi>) -> TelemetrySample {
        match capability {
            Some(smi) => TelemetrySample {
                core_clock: smi.current_core_clock(),
                memory_clock: smi.current_memory_clock(),
                max_core_clock: smi.setting_max_core_clock(),
                max_memory_clock: smi.setting_max_memory_clock(),
                power_limit: smi.setting_power_limit(),
                thermal_limit: smi.setting_thermal_limit(),
                fan_level_percent: smi.setting_fan_level_percent(),
                fan_tachometer_rpm: smi.current_fan_tachometer_rpm(),
                temperature: smi.current_temperature(),
                utilization_percent: smi.current_utilization_percent(),
                pstate: smi.current_pstate(),
                throttle_reasons: smi.current_throttle_reasons(),
            },
            None => TelemetrySample::unavailable(),
        }
    }

    /// The defined sentinel for every metric.
    pub fn unavailable() -> TelemetrySample {
        TelemetrySample {
            core_clock: METRIC_UNAVAILABLE,
            memory_clock: METRIC_UNAVAILABLE,
            max_core_clock: METRIC_UNAVAILABLE,
            max_memory_clock: METRIC_UNAVAILABLE,
            power_limit: METRIC_UNAVAILABLE,
            thermal_limit: METRIC_UNAVAILABLE,
            fan_level_percent: METRIC_UNAVAILABLE,
            fan_tachometer_rpm: METRIC_UNAVAILABLE,
            temperature: TEMPERATURE_UNAVAILABLE,
            utilization_percent: METRIC_UNAVAILABLE,
            pstate: METRIC_UNAVAILABLE,
            throttle_reasons: String::new(),
        }
    }
}
