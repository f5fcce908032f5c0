// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: tests/harvest_test.rs
// Version: 0.9.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// End-to-end tests of the harvest protocol using the CPU reference scanner
// in place of a kernel launch: disjoint work-position partitions never
// double-report, saturation drops rather than overflows, and the counter is
// clean across windows.
//
// Tree Location:
// - tests/harvest_test.rs (harvest protocol tests)
// - Depends on: sha3-solver

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use sha3_solver::core::keccak::scan_range;
    use sha3_solver::core::types::{MAX_SOLUTION_COUNT, WorkTemplate};
    use sha3_solver::solver::solution::SolutionBuffer;
    use sha3_solver::solver::work::WorkPosition;

    fn permissive_template() -> WorkTemplate {
        // All-0xFF target: every candidate qualifies
        WorkTemplate::with_solution_template(
            [0x44u8; 32],
            [0x55u8; 20],
            [0x66u8; 32],
            [0xFFu8; 32],
        )
    }

    #[test]
    fn test_disjoint_partitions_never_duplicate() {
        let template = permissive_template();
        let position = WorkPosition::new();
        let window = 128u64;

        // Two devices reserving their windows, like two dispatch loops
        let base_a = position.reserve(window);
        let base_b = position.reserve(window);
        assert_ne!(base_a, base_b, "reservations must not overlap");

        let found_a: HashSet<u64> = scan_range(&template, base_a, window).into_iter().collect();
        let found_b: HashSet<u64> = scan_range(&template, base_b, window).into_iter().collect();

        assert!(!found_a.is_empty(), "permissive target yields candidates");
        assert!(!found_b.is_empty(), "permissive target yields candidates");
        assert!(
            found_a.is_disjoint(&found_b),
            "two devices on disjoint partitions must never report the same nonce"
        );
    }

    #[test]
    fn test_concurrent_reservations_are_disjoint() {
        let position = Arc::new(WorkPosition::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let position = Arc::clone(&position);
            handles.push(thread::spawn(move || {
                let mut bases = Vec::new();
                for _ in 0..100 {
                    bases.push(position.reserve(1000));
                }
                bases
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for base in handle.join().expect("reserver thread panicked") {
                assert!(
                    seen.insert(base),
                    "base offset {} handed out twice",
                    base
                );
            }
        }
        assert_eq!(position.current(), 8 * 100 * 1000);
    }

    #[test]
    fn test_saturated_window_drops_surplus() {
        let template = permissive_template();
        let buffer = SolutionBuffer::new(MAX_SOLUTION_COUNT);

        // Far more qualifying candidates than the buffer holds
        let found = scan_range(&template, 1, 64);
        assert!(found.len() as u32 > MAX_SOLUTION_COUNT);
        for nonce in &found {
            buffer.try_push(*nonce);
        }

        let harvested = buffer.harvest();
        assert_eq!(
            harvested.len() as u32,
            MAX_SOLUTION_COUNT,
            "one dispatch never reports more than max_solution_count entries"
        );
        assert_eq!(buffer.peek_count(), 0, "harvest resets the counter");
    }

    #[test]
    fn test_impossible_target_reports_nothing() {
        let template = WorkTemplate::with_solution_template(
            [0x44u8; 32],
            [0x55u8; 20],
            [0x66u8; 32],
            [0x00u8; 32],
        );
        let buffer = SolutionBuffer::new(MAX_SOLUTION_COUNT);

        for nonce in scan_range(&template, 0, 256) {
            buffer.try_push(nonce);
        }
        assert_eq!(
            buffer.peek_count(),
            0,
            "a window with no qualifying candidates leaves the counter at 0"
        );
    }

    #[test]
    fn test_windows_are_clean_across_harvests() {
        let template = permissive_template();
        let position = WorkPosition::new();
        let buffer = SolutionBuffer::new(MAX_SOLUTION_COUNT);
        let mut all_reported = HashSet::new();

        for _ in 0..4 {
            let base = position.reserve(16);
            for nonce in scan_range(&template, base, 16) {
                buffer.try_push(nonce);
            }
            for nonce in buffer.harvest() {
                assert!(
                    all_reported.insert(nonce),
                    "nonce {} re-reported from a stale buffer",
                    nonce
                );
            }
            assert_eq!(buffer.peek_count(), 0);
        }
    }

    #[test]
    fn test_reset_restarts_nonce_space() {
        let position = WorkPosition::new();
        position.reserve(5000);
        let scanned = position.reset();
        assert_eq!(scanned, 5000, "reset reports the old position");
        assert_eq!(position.reserve(10), 0, "new challenge starts from zero");
    }
}
