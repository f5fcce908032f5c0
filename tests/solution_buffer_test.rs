// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: tests/solution_buffer_test.rs
// Version: 0.9.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file contains unit tests for the zero-copy solution buffer and its
// harvest protocol: saturation instead of overflow, drain-then-reset, and
// safety under concurrent appenders.
//
// Tree Location:
// - tests/solution_buffer_test.rs (solution buffer tests)
// - Depends on: sha3-solver

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use sha3_solver::solver::solution::SolutionBuffer;

    #[test]
    fn test_push_and_harvest() {
        let buffer = SolutionBuffer::new(4);
        assert!(buffer.try_push(101));
        assert!(buffer.try_push(102));
        assert_eq!(buffer.peek_count(), 2);

        let harvested = buffer.harvest();
        assert_eq!(harvested, vec![101, 102], "harvest preserves append order");
        assert_eq!(buffer.peek_count(), 0, "counter must be 0 after harvest");
    }

    #[test]
    fn test_saturation_drops_never_overflows() {
        let buffer = SolutionBuffer::new(4);
        let mut stored = 0;
        for nonce in 1..=20u64 {
            if buffer.try_push(nonce) {
                stored += 1;
            }
        }
        assert_eq!(stored, 4, "only max_solutions candidates are stored");
        assert_eq!(
            buffer.peek_count(),
            4,
            "reported count never exceeds max_solutions"
        );

        let harvested = buffer.harvest();
        assert_eq!(harvested, vec![1, 2, 3, 4], "surplus candidates were dropped");
        assert_eq!(buffer.peek_count(), 0);
    }

    #[test]
    fn test_empty_dispatch_leaves_counter_zero() {
        let buffer = SolutionBuffer::new(4);
        assert_eq!(buffer.peek_count(), 0);
        let harvested = buffer.harvest();
        assert!(harvested.is_empty());
        assert_eq!(buffer.peek_count(), 0, "no candidates, counter stays 0");
    }

    #[test]
    fn test_buffer_reusable_after_harvest() {
        let buffer = SolutionBuffer::new(2);
        buffer.try_push(7);
        buffer.try_push(8);
        buffer.try_push(9); // dropped
        assert_eq!(buffer.harvest(), vec![7, 8]);

        // Next dispatch window writes into a clean buffer
        assert!(buffer.try_push(10));
        assert_eq!(buffer.harvest(), vec![10], "no stale entries re-reported");
    }

    #[test]
    fn test_concurrent_appenders_saturate_cleanly() {
        let buffer = Arc::new(SolutionBuffer::new(4));
        let mut handles = Vec::new();
        for t in 0..8u64 {
            let buffer = Arc::clone(&buffer);
            handles.push(thread::spawn(move || {
                for i in 0..100u64 {
                    buffer.try_push(t * 1000 + i + 1);
                }
            }));
        }
        for handle in handles {
            handle.join().expect("appender thread panicked");
        }

        let harvested = buffer.harvest();
        assert_eq!(harvested.len(), 4, "saturated at capacity under contention");
        for nonce in harvested {
            assert_ne!(nonce, 0, "every reported slot holds a real nonce");
        }
        assert_eq!(buffer.peek_count(), 0);
    }

    #[test]
    fn test_slot_layout_for_device_aliasing() {
        let buffer = SolutionBuffer::new(4);
        assert_eq!(buffer.slot_count(), 5, "counter slot plus capacity");
        assert!(!buffer.as_ptr().is_null());
    }
}
