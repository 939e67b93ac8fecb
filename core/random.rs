/*
 * Copyright (C) 2026 EC FWHT Contributors
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * This file is part of EC FWHT.
 *
 * EC FWHT is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * EC FWHT is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with EC FWHT.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Random scalars and points for fixtures and benchmarks
//!
//! The `_par` variants are reproducible: index `i` always draws from a
//! ChaCha20 stream keyed by `seed` with stream id `i`, so the output does not
//! depend on the worker count.

use ff::Field;
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use tracing::debug;

use crate::config;
use crate::convert::to_affine_batch;
use crate::curve::FwhtCurve;
use crate::pool::parallel_range;

fn stream_rng(seed: u64, index: usize) -> ChaCha20Rng {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    rng.set_stream(index as u64);
    rng
}

/// `n` uniformly random scalars.
pub fn random_scalars<A: FwhtCurve>(n: usize, mut rng: impl RngCore) -> Vec<A::ScalarExt> {
    (0..n).map(|_| A::ScalarExt::random(&mut rng)).collect()
}

/// `n` random points `s · G` with uniform `s`.
pub fn random_points<A: FwhtCurve>(n: usize, mut rng: impl RngCore) -> Vec<A> {
    let g = A::generator();
    let projective: Vec<A::CurveExt> = (0..n)
        .map(|_| g * A::ScalarExt::random(&mut rng))
        .collect();
    to_affine_batch::<A>(&projective, 1, usize::MAX)
}

/// Parallel, seeded [`random_scalars`].
pub fn random_scalars_par<A: FwhtCurve>(n: usize, workers: isize, seed: u64) -> Vec<A::ScalarExt> {
    let workers = config::resolve_workers(workers);
    parallel_range(n, workers, config::inline_threshold(), |i0, i1| {
        (i0..i1)
            .map(|i| A::ScalarExt::random(stream_rng(seed, i)))
            .collect::<Vec<_>>()
    })
    .into_iter()
    .flatten()
    .collect()
}

/// Parallel, seeded [`random_points`].
pub fn random_points_par<A: FwhtCurve>(n: usize, workers: isize, seed: u64) -> Vec<A> {
    let workers = config::resolve_workers(workers);
    let threshold = config::inline_threshold();
    let g = A::generator();

    let projective: Vec<A::CurveExt> = parallel_range(n, workers, threshold, |i0, i1| {
        (i0..i1)
            .map(|i| g * A::ScalarExt::random(stream_rng(seed, i)))
            .collect::<Vec<_>>()
    })
    .into_iter()
    .flatten()
    .collect();

    debug!("Generated {} random points with {} workers", n, workers);
    to_affine_batch::<A>(&projective, workers, threshold)
}
