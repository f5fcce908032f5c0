// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: tests/job_board_test.rs
// Version: 0.9.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file contains unit tests for the staged-job slot: wholesale
// replacement, epoch-based staleness detection, and visibility to reader
// threads.
//
// Tree Location:
// - tests/job_board_test.rs (job board tests)
// - Depends on: sha3-solver

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use sha3_solver::core::types::WorkTemplate;
    use sha3_solver::solver::work::JobBoard;

    fn job(challenge_byte: u8) -> WorkTemplate {
        WorkTemplate::with_solution_template(
            [challenge_byte; 32],
            [0x22u8; 20],
            [0x33u8; 32],
            [0xFFu8; 32],
        )
    }

    #[test]
    fn test_empty_board_has_no_snapshot() {
        let board = JobBoard::new();
        assert!(board.snapshot().is_none(), "nothing staged yet");
        assert_eq!(board.epoch(), 0);
    }

    #[test]
    fn test_stage_bumps_epoch() {
        let board = JobBoard::new();
        assert_eq!(board.stage(job(0x01)), 1);
        assert_eq!(board.stage(job(0x02)), 2);

        let (template, epoch) = board.snapshot().expect("job staged");
        assert_eq!(epoch, 2);
        assert_eq!(template.challenge, [0x02u8; 32], "replaced wholesale");
    }

    #[test]
    fn test_in_flight_dispatch_detects_staleness() {
        let board = JobBoard::new();
        board.stage(job(0x01));

        // A dispatch loop snapshots, then a new job lands while it flies
        let (_, dispatch_epoch) = board.snapshot().expect("job staged");
        board.stage(job(0x02));

        assert_ne!(
            board.epoch(),
            dispatch_epoch,
            "the harvested window must be recognized as stale"
        );
    }

    #[test]
    fn test_snapshot_epoch_matches_template() {
        let board = Arc::new(JobBoard::new());
        let mut handles = Vec::new();

        // Writer replaces jobs while readers snapshot; a snapshot's epoch
        // must always belong to its template
        {
            let board = Arc::clone(&board);
            handles.push(thread::spawn(move || {
                for i in 1..=50u8 {
                    board.stage(job(i));
                }
            }));
        }
        for _ in 0..4 {
            let board = Arc::clone(&board);
            handles.push(thread::spawn(move || {
                for _ in 0..200 {
                    if let Some((template, epoch)) = board.snapshot() {
                        assert!(epoch >= 1);
                        assert!(
                            template.challenge[0] >= 1 && template.challenge[0] <= 50,
                            "snapshot sees a fully staged job, never a torn one"
                        );
                        assert_eq!(
                            template.challenge,
                            [template.challenge[0]; 32],
                            "challenge bytes are from a single staged job"
                        );
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().expect("board thread panicked");
        }

        let (template, epoch) = board.snapshot().expect("last job visible");
        assert_eq!(epoch, 50);
        assert_eq!(template.challenge, [50u8; 32]);
    }
}
