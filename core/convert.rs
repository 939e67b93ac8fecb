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

//! Affine ↔ projective coordinate conversion
//!
//! # Batch normalization
//!
//! Normalizing `n` projective points one by one costs `n` field inversions.
//! [`to_affine_batch`] uses Montgomery's trick instead:
//!
//! 1. Skip identities (`Z = 0`); a single zero would zero the running product.
//! 2. Prefix products `p_i = Z_0 · … · Z_i` over the remaining points.
//! 3. Invert `p_{m-1}` once.
//! 4. Sweep backwards: `1/Z_i = inv · p_{i-1}`, then `inv ← inv · Z_i`.
//! 5. Finish every point as `(X/Z, Y/Z)` in parallel.
//!
//! Cost: one inversion plus about `3n` multiplications. Steps 2–4 are
//! sequential; step 5 is embarrassingly parallel.
//!
//! Both output strategies produce identical points: a field inverse is unique,
//! so `X · (1/Z)` does not depend on how `1/Z` was obtained.

use ff::Field;
use group::Curve;
use tracing::debug;

use crate::curve::FwhtCurve;
use crate::pool::parallel_chunks_mut;

/// Affine → projective. Exact; identity maps to identity.
#[inline]
pub fn to_projective<A: FwhtCurve>(p: &A) -> A::CurveExt {
    p.to_curve()
}

/// Projective → affine with one field inversion.
#[inline]
pub fn to_affine_single<A: FwhtCurve>(p: &A::CurveExt) -> A {
    p.to_affine()
}

/// Element-wise [`to_projective`] over `workers` threads.
pub fn to_projective_par<A: FwhtCurve>(
    input: &[A],
    workers: usize,
    inline_threshold: usize,
) -> Vec<A::CurveExt> {
    let mut out = vec![A::CurveExt::default(); input.len()];
    parallel_chunks_mut(&mut out, workers, inline_threshold, |offset, chunk| {
        for (slot, p) in chunk.iter_mut().zip(&input[offset..]) {
            *slot = to_projective(p);
        }
    });
    out
}

/// Element-wise [`to_affine_single`] over `workers` threads.
pub fn to_affine_per_element<A: FwhtCurve>(
    input: &[A::CurveExt],
    workers: usize,
    inline_threshold: usize,
) -> Vec<A> {
    let mut out = vec![A::identity(); input.len()];
    parallel_chunks_mut(&mut out, workers, inline_threshold, |offset, chunk| {
        for (slot, p) in chunk.iter_mut().zip(&input[offset..]) {
            *slot = to_affine_single::<A>(p);
        }
    });
    out
}

/// Inverse of every non-zero scaling coordinate of `input`.
///
/// Entry `i` is `Some(1/Z_i)`, or `None` where `input[i]` is the identity.
/// Performs exactly one field inversion (none when every point is the
/// identity).
pub fn batch_invert_scales<A: FwhtCurve>(input: &[A::CurveExt]) -> Vec<Option<A::Base>> {
    let mut inverses: Vec<Option<A::Base>> = vec![None; input.len()];

    // prefix[k] = product of the first k+1 non-identity scales
    let mut live: Vec<usize> = Vec::with_capacity(input.len());
    let mut prefix: Vec<A::Base> = Vec::with_capacity(input.len());
    let mut acc = A::Base::ONE;
    for (i, p) in input.iter().enumerate() {
        if A::is_projective_identity(p) {
            continue;
        }
        acc *= A::scale(p);
        live.push(i);
        prefix.push(acc);
    }

    if live.is_empty() {
        return inverses;
    }

    // The product of non-zero field elements is non-zero.
    let mut inv = Option::<A::Base>::from(acc.invert()).unwrap_or(A::Base::ZERO);

    for k in (0..live.len()).rev() {
        let i = live[k];
        let z = A::scale(&input[i]);
        inverses[i] = Some(if k == 0 { inv } else { inv * prefix[k - 1] });
        inv *= z;
    }

    inverses
}

/// Projective → affine for a whole vector with a single field inversion.
///
/// Identity inputs map to the affine identity without entering the product
/// chain.
pub fn to_affine_batch<A: FwhtCurve>(
    input: &[A::CurveExt],
    workers: usize,
    inline_threshold: usize,
) -> Vec<A> {
    let inverses = batch_invert_scales::<A>(input);
    debug!(
        "Batch normalization: {} points, {} identities",
        input.len(),
        inverses.iter().filter(|z| z.is_none()).count()
    );

    let mut out = vec![A::identity(); input.len()];
    parallel_chunks_mut(&mut out, workers, inline_threshold, |offset, chunk| {
        let points = &input[offset..];
        let invs = &inverses[offset..];
        for ((slot, p), z_inv) in chunk.iter_mut().zip(points).zip(invs) {
            *slot = match z_inv {
                Some(z_inv) => A::from_inverse(p, z_inv),
                None => A::identity(),
            };
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use group::prime::PrimeCurveAffine;
    use group::Group;
    use halo2curves::bn256::{Fq, Fr, G1Affine, G1};

    fn sample_projective(n: usize) -> Vec<G1> {
        // Sums keep Z != 1 so the batch path has real work to do.
        (0..n)
            .map(|i| G1::generator() * Fr::from(i as u64 + 3) + G1::generator())
            .collect()
    }

    #[test]
    fn test_to_projective_identity() {
        let id = G1Affine::identity();
        assert!(bool::from(to_projective(&id).is_identity()));
        assert_eq!(to_affine_single::<G1Affine>(&G1::identity()), id);
    }

    #[test]
    fn test_single_roundtrip() {
        let p = G1Affine::generator();
        assert_eq!(to_affine_single::<G1Affine>(&to_projective(&p)), p);
    }

    #[test]
    fn test_batch_invert_scales() {
        let mut points = sample_projective(6);
        points[2] = G1::identity();
        let inverses = batch_invert_scales::<G1Affine>(&points);

        assert!(inverses[2].is_none());
        for (p, inv) in points.iter().zip(&inverses) {
            if let Some(inv) = inv {
                assert_eq!(*inv * p.z, Fq::ONE);
            }
        }
    }

    #[test]
    fn test_batch_invert_all_identity() {
        let points = vec![G1::identity(); 5];
        assert!(batch_invert_scales::<G1Affine>(&points)
            .iter()
            .all(Option::is_none));
    }

    #[test]
    fn test_batch_matches_per_element() {
        let points = sample_projective(33);
        let a = to_affine_batch::<G1Affine>(&points, 4, 8);
        let b = to_affine_per_element::<G1Affine>(&points, 4, 8);
        assert_eq!(a, b);
    }

    #[test]
    fn test_batch_matches_per_element_with_identities() {
        let mut points = sample_projective(40);
        for i in [0, 1, 7, 19, 39] {
            points[i] = G1::identity();
        }
        let a = to_affine_batch::<G1Affine>(&points, 3, 4);
        let b = to_affine_per_element::<G1Affine>(&points, 1, 4);
        assert_eq!(a, b);
        assert_eq!(a[7], G1Affine::identity());
    }

    #[test]
    fn test_batch_empty() {
        assert!(to_affine_batch::<G1Affine>(&[], 4, 8).is_empty());
        assert!(to_projective_par::<G1Affine>(&[], 4, 8).is_empty());
    }

    #[test]
    fn test_projective_par_matches_serial() {
        let affine = to_affine_per_element::<G1Affine>(&sample_projective(50), 1, 1024);
        let par = to_projective_par(&affine, 5, 4);
        for (p, a) in par.iter().zip(&affine) {
            assert_eq!(*p, to_projective(a));
        }
    }
}
