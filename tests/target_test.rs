// SHA3 Solver - Free and Open Source Software Statement
//
// This project, sha3-solver, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: tests/target_test.rs
// Version: 0.9.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file contains unit tests for 256-bit target comparison: the
// trivial-accept and impossible-target boundaries, agreement between the
// 64-bit fast path and the full compare, and hex target parsing.
//
// Tree Location:
// - tests/target_test.rs (target comparison tests)
// - Depends on: sha3-solver

#[cfg(test)]
mod tests {
    use sha3_solver::core::keccak::keccak256;
    use sha3_solver::core::target::{high64_prefix, meets_target, parse_target_hex};

    #[test]
    fn test_all_ff_target_accepts_everything() {
        let target = [0xFFu8; 32];
        let high64 = high64_prefix(&target);
        for seed in 0..64u64 {
            let digest = keccak256(&seed.to_le_bytes());
            assert!(
                meets_target(&digest, high64, &target),
                "every digest qualifies under the all-0xFF target"
            );
        }
    }

    #[test]
    fn test_all_zero_target_rejects_everything() {
        let target = [0x00u8; 32];
        let high64 = high64_prefix(&target);
        for seed in 0..64u64 {
            let digest = keccak256(&seed.to_le_bytes());
            assert!(
                !meets_target(&digest, high64, &target),
                "only an exactly-zero digest could qualify under the zero target"
            );
        }
        // The one coincidence the boundary allows
        assert!(meets_target(&[0u8; 32], high64, &target), "zero digest equals zero target");
    }

    #[test]
    fn test_equality_is_accepted() {
        let digest = keccak256(b"boundary");
        let high64 = high64_prefix(&digest);
        assert!(
            meets_target(&digest, high64, &digest),
            "digest equal to target qualifies (<=, not <)"
        );
    }

    #[test]
    fn test_high64_fast_path_agrees_with_full_compare() {
        // A target whose high word dominates most digests
        let mut target = [0u8; 32];
        target[3] = 0x01; // high64 = 0x0000_0001_0000_0000
        let high64 = high64_prefix(&target);

        for seed in 0..256u64 {
            let digest = keccak256(&seed.to_le_bytes());
            let mut prefix = [0u8; 8];
            prefix.copy_from_slice(&digest[..8]);
            let digest_high = u64::from_be_bytes(prefix);

            let expected = if digest_high != high64 {
                digest_high < high64
            } else {
                digest <= target
            };
            assert_eq!(
                meets_target(&digest, high64, &target),
                expected,
                "fast path and full compare must agree for digest {}",
                hex::encode(digest)
            );
        }
    }

    #[test]
    fn test_tie_on_high_word_falls_through() {
        let mut target = [0xABu8; 32];
        let high64 = high64_prefix(&target);

        // Same high word, smaller tail: qualifies
        let mut lower = target;
        lower[31] = 0xAA;
        assert!(meets_target(&lower, high64, &target));

        // Same high word, bigger tail: rejected
        let mut higher = target;
        higher[31] = 0xAC;
        assert!(!meets_target(&higher, high64, &target));

        target[8] = 0xFF;
        assert!(meets_target(&lower, high64_prefix(&target), &target));
    }

    #[test]
    fn test_parse_target_hex() {
        let parsed = parse_target_hex(
            "0x00000000ffff0000000000000000000000000000000000000000000000000000",
        )
        .expect("valid target must parse");
        assert_eq!(parsed[4], 0xFF);
        assert_eq!(parsed[5], 0xFF);
        assert_eq!(high64_prefix(&parsed), 0x00000000FFFF0000);

        // Short strings are left-padded
        let short = parse_target_hex("ff").expect("short target must parse");
        assert_eq!(short[31], 0xFF);
        assert_eq!(short[..31], [0u8; 31]);

        assert!(parse_target_hex("").is_none(), "empty target is invalid");
        assert!(parse_target_hex("zz").is_none(), "non-hex target is invalid");
    }
}
