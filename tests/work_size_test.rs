// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: tests/work_size_test.rs
// Version: 0.9.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file contains unit tests for work sizing: the launch-dimension math
// that turns a user intensity into a kernel global size. The function must
// be pure so adaptive throttling can re-tune without side effects.
//
// Tree Location:
// - tests/work_size_test.rs (work sizing tests)
// - Depends on: sha3-solver

#[cfg(test)]
mod tests {
    use sha3_solver::solver::device::{
        DEFAULT_INTENSITY, DEFAULT_LOCAL_WORK_SIZE, DeviceFlavor, DeviceInfo,
        INTEGRATED_INTENSITY, INTEGRATED_LOCAL_WORK_SIZE, Tunables, clamp_local_work_size,
        default_intensity, default_local_work_size, global_work_size,
    };

    fn info(flavor: DeviceFlavor, compute: u32, max_work_group_size: usize) -> DeviceInfo {
        DeviceInfo {
            ordinal: 0,
            pci_bus_id: 1,
            vendor: "Test Vendor".to_string(),
            name: "Test Device".to_string(),
            platform_name: "Test Platform".to_string(),
            flavor,
            compute,
            max_compute_units: 16,
            max_work_group_size,
            global_mem_size: 8 * 1024 * 1024 * 1024,
        }
    }

    #[test]
    fn test_global_work_size_multiple_of_local() {
        for intensity in 1..=32 {
            for &lws in &[64u32, 128, 192, 256] {
                let gws = global_work_size(intensity as f32, lws);
                assert_eq!(gws % lws as u64, 0, "gws must be a multiple of lws");
                assert!(
                    gws <= 2u64.pow(intensity),
                    "gws must not exceed 2^intensity"
                );
            }
        }
    }

    #[test]
    fn test_global_work_size_idempotent() {
        let first = global_work_size(24.0, 128);
        for _ in 0..10 {
            assert_eq!(
                global_work_size(24.0, 128),
                first,
                "identical inputs must yield identical outputs"
            );
        }
    }

    #[test]
    fn test_fractional_intensity() {
        let gws = global_work_size(26.33, 128);
        assert_eq!(gws % 128, 0, "fractional intensity still rounds to lws");
        assert!(gws <= 2f64.powf(26.33) as u64, "and never exceeds 2^i");
    }

    #[test]
    fn test_local_work_size_clamp() {
        // Rounded down to a multiple of 64 and clamped to the device max
        assert_eq!(clamp_local_work_size(100, 1024), 64);
        assert_eq!(clamp_local_work_size(256, 1024), 256);
        assert_eq!(clamp_local_work_size(2048, 1024), 1024);
        assert_eq!(clamp_local_work_size(1, 1024), 64, "never below 64");
        assert_eq!(clamp_local_work_size(191, 256), 128);
    }

    #[test]
    fn test_flavor_defaults() {
        assert_eq!(
            default_local_work_size(DeviceFlavor::PortableIntegrated),
            INTEGRATED_LOCAL_WORK_SIZE
        );
        assert_eq!(
            default_local_work_size(DeviceFlavor::PortableDiscrete),
            DEFAULT_LOCAL_WORK_SIZE
        );
        assert_eq!(
            default_intensity(DeviceFlavor::PortableIntegrated, 0),
            INTEGRATED_INTENSITY
        );
        assert_eq!(
            default_intensity(DeviceFlavor::PortableDiscrete, 0),
            DEFAULT_INTENSITY
        );
        // Native tiers
        assert_eq!(default_intensity(DeviceFlavor::Native, 750), 27.0);
        assert_eq!(default_intensity(DeviceFlavor::Native, 610), 26.0);
        assert_eq!(default_intensity(DeviceFlavor::Native, 500), 25.0);
        assert_eq!(default_intensity(DeviceFlavor::Native, 350), DEFAULT_INTENSITY);
    }

    #[test]
    fn test_tunables_for_device() {
        let integrated = Tunables::for_device(
            &info(DeviceFlavor::PortableIntegrated, 0, 256),
            None,
            None,
        );
        assert_eq!(integrated.local_work_size, 64);
        assert_eq!(integrated.intensity, INTEGRATED_INTENSITY);

        // User override clamps against the device maximum
        let clamped = Tunables::for_device(
            &info(DeviceFlavor::PortableDiscrete, 0, 256),
            Some(23.0),
            Some(512),
        );
        assert_eq!(clamped.local_work_size, 256);
        assert_eq!(clamped.intensity, 23.0);
        assert_eq!(
            clamped.global_work_size % clamped.local_work_size as u64,
            0,
            "resolved global size stays aligned"
        );
    }

    #[test]
    fn test_set_intensity_recomputes() {
        let mut tunables =
            Tunables::for_device(&info(DeviceFlavor::PortableDiscrete, 0, 1024), None, None);
        let before = tunables.global_work_size;
        tunables.set_intensity(20.0);
        assert_ne!(tunables.global_work_size, before, "global size follows intensity");
        tunables.set_intensity(DEFAULT_INTENSITY);
        assert_eq!(
            tunables.global_work_size, before,
            "returning to the old intensity restores the old size"
        );
    }

    #[test]
    fn test_flavor_classification() {
        assert_eq!(DeviceFlavor::classify("NVIDIA CUDA"), DeviceFlavor::Native);
        assert_eq!(
            DeviceFlavor::classify("AMD Accelerated Parallel Processing"),
            DeviceFlavor::PortableDiscrete
        );
        assert_eq!(
            DeviceFlavor::classify("Intel(R) OpenCL HD Graphics"),
            DeviceFlavor::PortableIntegrated
        );
        assert_eq!(
            DeviceFlavor::classify("intel(r) opencl"),
            DeviceFlavor::PortableIntegrated,
            "classification is case-insensitive"
        );
        assert_eq!(
            DeviceFlavor::classify("Some Unknown Platform"),
            DeviceFlavor::PortableDiscrete,
            "unrecognized platforms default to portable-discrete"
        );
    }
}
