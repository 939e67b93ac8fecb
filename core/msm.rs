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

//! Multi-Scalar Multiplication (MSM) helpers
//!
//! Computes `sum(scalars[i] * points[i])`, used by the benchmark driver as a
//! baseline next to the transform.
//!
//! - [`naive_msm`]: one scalar multiplication per term
//! - [`fast_msm`]: `halo2curves` bucket MSM

use group::{Curve, Group};
use thiserror::Error;
#[cfg(feature = "trace")]
use tracing::debug;

use crate::curve::FwhtCurve;

/// Errors specific to MSM operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MsmError {
    /// Scalar and point arrays differ in length
    #[error("points and scalars must have same length: {points} vs {scalars}")]
    LengthMismatch { points: usize, scalars: usize },
}

fn check_lengths(points: usize, scalars: usize) -> Result<(), MsmError> {
    if points != scalars {
        return Err(MsmError::LengthMismatch { points, scalars });
    }
    Ok(())
}

/// MSM by accumulating `scalars[i] * points[i]` term by term.
///
/// Empty input yields the identity.
pub fn naive_msm<A: FwhtCurve>(points: &[A], scalars: &[A::ScalarExt]) -> Result<A, MsmError> {
    check_lengths(points.len(), scalars.len())?;

    let mut acc = A::CurveExt::identity();
    for (p, s) in points.iter().zip(scalars) {
        acc += *p * *s;
    }
    Ok(acc.to_affine())
}

/// MSM through `halo2curves::msm::msm_best`.
///
/// Same contract as [`naive_msm`].
pub fn fast_msm<A: FwhtCurve>(points: &[A], scalars: &[A::ScalarExt]) -> Result<A, MsmError> {
    check_lengths(points.len(), scalars.len())?;
    if points.is_empty() {
        return Ok(A::identity());
    }

    #[cfg(feature = "trace")]
    let start = std::time::Instant::now();

    let acc = halo2curves::msm::msm_best(scalars, points);

    #[cfg(feature = "trace")]
    debug!("MSM completed for {} points in {:?}", points.len(), start.elapsed());

    Ok(acc.to_affine())
}
