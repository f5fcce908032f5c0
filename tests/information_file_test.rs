// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: tests/information_file_test.rs
// Version: 0.9.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file contains unit tests for device information file generation:
// one JSON file per device with identity, capability, and launch
// dimensions, readable by external tooling.
//
// Tree Location:
// - tests/information_file_test.rs (information file tests)
// - Depends on: sha3-solver, tempfile, serde_json

#[cfg(test)]
mod tests {
    use sha3_solver::solver::device::{DeviceFlavor, DeviceInfo, Tunables};
    use sha3_solver::solver::information::write_information_files;

    fn device(ordinal: u32, flavor: DeviceFlavor) -> (DeviceInfo, Tunables) {
        let info = DeviceInfo {
            ordinal,
            pci_bus_id: 10 + ordinal,
            vendor: "Test Vendor".to_string(),
            name: format!("Test Device {}", ordinal),
            platform_name: "Test Platform".to_string(),
            flavor,
            compute: 0,
            max_compute_units: 32,
            max_work_group_size: 1024,
            global_mem_size: 8 * 1024 * 1024 * 1024,
        };
        let tunables = Tunables::for_device(&info, None, None);
        (info, tunables)
    }

    #[test]
    fn test_writes_one_file_per_device() {
        let dir = tempfile::tempdir().expect("temp dir");
        let devices = vec![
            device(0, DeviceFlavor::PortableDiscrete),
            device(1, DeviceFlavor::PortableIntegrated),
        ];

        let written = write_information_files(&devices, dir.path()).expect("files written");
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("device_0.json"));
        assert!(written[1].ends_with("device_1.json"));
        for path in &written {
            assert!(path.exists(), "information file must exist on disk");
        }
    }

    #[test]
    fn test_file_contents_round_trip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let devices = vec![device(3, DeviceFlavor::PortableIntegrated)];

        let written = write_information_files(&devices, dir.path()).expect("files written");
        let content = std::fs::read_to_string(&written[0]).expect("readable");
        let value: serde_json::Value = serde_json::from_str(&content).expect("valid JSON");

        assert_eq!(value["device"]["ordinal"], 3);
        assert_eq!(value["device"]["name"], "Test Device 3");
        assert_eq!(value["device"]["flavor"], "PortableIntegrated");
        assert_eq!(
            value["tunables"]["local_work_size"], 64,
            "integrated devices carry the integrated work-size default"
        );
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        let nested = dir.path().join("info").join("devices");
        let devices = vec![device(0, DeviceFlavor::PortableDiscrete)];

        let written = write_information_files(&devices, &nested).expect("nested dir created");
        assert!(written[0].exists());
    }
}
