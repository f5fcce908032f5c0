// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: tests/telemetry_test.rs
// Version: 0.9.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file contains unit tests for the telemetry sentinel contract: a
// device without the vendor capability answers every metric with the
// documented sentinel, under all call sequences, and never errors.
//
// Tree Location:
// - tests/telemetry_test.rs (telemetry sentinel tests)
// - Depends on: sha3-solver

#[cfg(test)]
mod tests {
    use sha3_solver::solver::telemetry::{
        METRIC_UNAVAILABLE, NvSmi, TEMPERATURE_UNAVAILABLE, TelemetrySample,
    };

    #[test]
    fn test_absent_capability_yields_sentinels() {
        let sample = TelemetrySample::collect(None);
        assert_eq!(sample.core_clock, METRIC_UNAVAILABLE);
        assert_eq!(sample.memory_clock, METRIC_UNAVAILABLE);
        assert_eq!(sample.max_core_clock, METRIC_UNAVAILABLE);
        assert_eq!(sample.max_memory_clock, METRIC_UNAVAILABLE);
        assert_eq!(sample.power_limit, METRIC_UNAVAILABLE);
        assert_eq!(sample.thermal_limit, METRIC_UNAVAILABLE);
        assert_eq!(sample.fan_level_percent, METRIC_UNAVAILABLE);
        assert_eq!(sample.fan_tachometer_rpm, METRIC_UNAVAILABLE);
        assert_eq!(
            sample.temperature, TEMPERATURE_UNAVAILABLE,
            "temperature uses the minimum representable sentinel"
        );
        assert_eq!(sample.utilization_percent, METRIC_UNAVAILABLE);
        assert_eq!(sample.pstate, METRIC_UNAVAILABLE);
        assert_eq!(sample.throttle_reasons, "", "throttle text sentinel is empty");
    }

    #[test]
    fn test_sentinels_stable_across_repeated_calls() {
        // No caching, but also no drift: every call resolves the same way
        let first = TelemetrySample::collect(None);
        for _ in 0..5 {
            assert_eq!(TelemetrySample::collect(None), first);
        }
    }

    #[test]
    fn test_probe_invalid_index_is_absent_not_error() {
        // Whether or not nvidia-smi exists on this host, an out-of-range
        // device index must resolve to an absent capability
        assert!(NvSmi::probe(u32::MAX).is_none());
    }

    #[test]
    fn test_unavailable_matches_collect_none() {
        assert_eq!(TelemetrySample::collect(None), TelemetrySample::unavailable());
    }
}
