// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: tests/hashrate_test.rs
// Version: 0.9.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file contains unit tests for the hash rate tracker: zero-elapsed
// safety, monotonic behavior in the counter, and concurrent add/read.
//
// Tree Location:
// - tests/hashrate_test.rs (hash rate tests)
// - Depends on: sha3-solver

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use sha3_solver::solver::hashrate::HashMeter;

    #[test]
    fn test_zero_counter_zero_rate() {
        let meter = HashMeter::new();
        assert_eq!(meter.rate(), 0, "no hashes, no rate, no division fault");
        assert_eq!(meter.count(), 0);
    }

    #[test]
    fn test_rate_after_rearm_is_zero() {
        let meter = HashMeter::new();
        meter.add(1_000_000);
        meter.rearm();
        assert_eq!(meter.rate(), 0, "re-arm clears the counter");
    }

    #[test]
    fn test_rate_nondecreasing_in_counter() {
        let meter = HashMeter::new();
        meter.add(1_000_000);
        let first = meter.rate();
        // Swamp any elapsed-time drift between the two reads
        meter.add(1_000_000_000_000);
        let second = meter.rate();
        assert!(first > 0, "counted hashes produce a rate");
        assert!(
            second > first,
            "rate grows with the counter at (near) fixed elapsed time"
        );
    }

    #[test]
    fn test_counter_is_monotonic() {
        let meter = HashMeter::new();
        meter.add(100);
        meter.add(250);
        assert_eq!(meter.count(), 350, "counter only accumulates");
    }

    #[test]
    fn test_concurrent_add_and_read() {
        let meter = Arc::new(HashMeter::new());
        let mut handles = Vec::new();

        for _ in 0..4 {
            let meter = Arc::clone(&meter);
            handles.push(thread::spawn(move || {
                for _ in 0..10_000 {
                    meter.add(17);
                }
            }));
        }
        // Reader thread races the writers; values must never tear
        {
            let meter = Arc::clone(&meter);
            handles.push(thread::spawn(move || {
                for _ in 0..10_000 {
                    let count = meter.count();
                    assert_eq!(count % 17, 0, "count is always a whole number of adds");
                }
            }));
        }
        for handle in handles {
            handle.join().expect("meter thread panicked");
        }
        assert_eq!(meter.count(), 4 * 10_000 * 17);
    }
}
