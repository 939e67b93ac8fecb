//! End-to-end properties of the parallel transform
//!
//! Compares the parallel engine against the serial reference across sizes,
//! worker counts, tiling factors and both affine strategies.

use ec_fwht::random::random_points_par;
use ec_fwht::stage::plan_stage;
use ec_fwht::{
    bn256, grumpkin, transform_serial, AffineStrategy, FwhtCurve, FwhtEngine, FwhtError,
    FwhtOptions,
};
use group::prime::PrimeCurveAffine;
use group::Curve;

fn hardware_threads() -> isize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1) as isize
}

fn sequence<A: FwhtCurve>(n: usize) -> Vec<A> {
    let g = A::generator();
    (1..=n as u64)
        .map(|i| (g * A::ScalarExt::from(i * 7 + 3)).to_affine())
        .collect()
}

#[test]
fn rejects_non_power_of_two_lengths() {
    let engine = FwhtEngine::default();
    for len in [3usize, 5, 6, 1000] {
        let input = vec![bn256::G1Affine::generator(); len];
        assert_eq!(engine.transform(&input, 4), Err(FwhtError::Size { len }));
    }
    assert!(engine.transform::<bn256::G1Affine>(&[], 4).unwrap().is_empty());
}

#[test]
fn double_transform_scales_by_n() {
    let engine = FwhtEngine::default();
    for log_n in [1u32, 3, 6] {
        let n = 1usize << log_n;
        let input = sequence::<bn256::G1Affine>(n);
        let twice = engine
            .transform(&engine.transform(&input, 3).unwrap(), 3)
            .unwrap();
        let scale = bn256::Fr::from(n as u64);
        for (x, y) in input.iter().zip(&twice) {
            assert_eq!((*x * scale).to_affine(), *y);
        }
    }
}

#[test]
fn parallel_matches_serial_across_workers() {
    let cpus = hardware_threads();
    let engine = FwhtEngine::default();
    for log_n in 1..=10u32 {
        let input = random_points_par::<bn256::G1Affine>(1 << log_n, 2, log_n as u64);
        let expected = transform_serial(&input).unwrap();
        for workers in [1, 2, cpus, 4 * cpus] {
            assert_eq!(
                engine.transform(&input, workers).unwrap(),
                expected,
                "n=2^{} workers={}",
                log_n,
                workers
            );
        }
    }
}

#[test]
fn non_positive_workers_use_default_pool() {
    let input = sequence::<bn256::G1Affine>(64);
    let expected = transform_serial(&input).unwrap();
    let engine = FwhtEngine::default();
    assert_eq!(engine.transform(&input, 0).unwrap(), expected);
    assert_eq!(engine.transform(&input, -5).unwrap(), expected);
}

#[test]
fn huge_worker_counts_are_accepted() {
    let engine = FwhtEngine::default();
    for n in [2usize, 4, 256] {
        let input = sequence::<bn256::G1Affine>(n);
        let expected = transform_serial(&input).unwrap();
        for workers in [1isize << 40, isize::MAX] {
            assert_eq!(engine.transform(&input, workers).unwrap(), expected, "n={}", n);
        }
    }
}

#[test]
fn all_identity_input_stays_identity() {
    let input = vec![bn256::G1Affine::identity(); 256];
    for strategy in [AffineStrategy::Batch, AffineStrategy::PerElement] {
        let engine = FwhtEngine::new(FwhtOptions::default().with_strategy(strategy));
        let out = engine.transform(&input, 4).unwrap();
        assert!(out.iter().all(|p| bool::from(p.is_identity())));
    }
}

#[test]
fn point_and_identity_pair() {
    let p = sequence::<bn256::G1Affine>(1)[0];
    let out = FwhtEngine::default()
        .transform(&[p, bn256::G1Affine::identity()], 2)
        .unwrap();
    assert_eq!(out, vec![p, p]);
}

#[test]
fn strategies_agree_with_interspersed_identities() {
    let mut input = sequence::<bn256::G1Affine>(128);
    for i in (0..128).step_by(5) {
        input[i] = bn256::G1Affine::identity();
    }
    // Equal halves produce identities in the output as well.
    input.copy_within(..64, 64);

    let batch = FwhtEngine::new(
        FwhtOptions::default()
            .with_strategy(AffineStrategy::Batch)
            .with_inline_threshold(8),
    );
    let single = FwhtEngine::new(
        FwhtOptions::default()
            .with_strategy(AffineStrategy::PerElement)
            .with_inline_threshold(8),
    );
    let a = batch.transform(&input, 4).unwrap();
    let b = single.transform(&input, 4).unwrap();
    assert_eq!(a, b);
    assert!(a[64..].iter().all(|p| bool::from(p.is_identity())));
}

#[test]
fn tiling_factor_does_not_change_output() {
    let n = 1usize << 9;
    let input = sequence::<bn256::G1Affine>(n);
    let expected = transform_serial(&input).unwrap();

    for factor in [1usize, 3, 16, 64] {
        // The last stage has a single block and must split its columns.
        assert!(plan_stage(n, 8, 6, factor).tiles_columns());

        let engine = FwhtEngine::new(FwhtOptions::default().with_oversubscription(factor));
        assert_eq!(engine.transform(&input, 6).unwrap(), expected, "factor={}", factor);
    }
}

#[test]
fn block_and_column_tilings_agree() {
    let n = 1usize << 10;
    let input = sequence::<bn256::G1Affine>(n);

    // Stage 2 has 128 blocks: enough for 4 tasks, too few for 256.
    assert!(!plan_stage(n, 2, 4, 1).tiles_columns());
    assert!(plan_stage(n, 2, 4, 64).tiles_columns());

    let blocks = FwhtEngine::new(FwhtOptions::default().with_oversubscription(1));
    let columns = FwhtEngine::new(FwhtOptions::default().with_oversubscription(64));
    assert_eq!(blocks.transform(&input, 4).unwrap(), columns.transform(&input, 4).unwrap());
}

#[test]
fn grumpkin_matches_serial() {
    let input = sequence::<grumpkin::G1Affine>(64);
    let expected = transform_serial(&input).unwrap();
    assert_eq!(FwhtEngine::default().transform(&input, 4).unwrap(), expected);

    let engine = FwhtEngine::default();
    let twice = engine
        .transform(&engine.transform(&input, 4).unwrap(), 4)
        .unwrap();
    let scale = grumpkin::Fr::from(64u64);
    assert_eq!((input[5] * scale).to_affine(), twice[5]);
}

#[test]
#[ignore = "slow: full size range, run with --ignored"]
fn parallel_matches_serial_full_range() {
    let cpus = hardware_threads();
    let engine = FwhtEngine::default();
    for log_n in 11..=16u32 {
        let input = random_points_par::<bn256::G1Affine>(1 << log_n, 0, log_n as u64);
        let expected = transform_serial(&input).unwrap();
        for workers in [1, 2, cpus, 4 * cpus] {
            assert_eq!(engine.transform(&input, workers).unwrap(), expected, "n=2^{}", log_n);
        }
    }
}
