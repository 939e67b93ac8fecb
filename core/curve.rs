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

//! Group arithmetic provider
//!
//! The transform is generic over any `halo2curves` short-Weierstrass curve
//! whose projective form is homogeneous `(X : Y : Z)` with affine
//! `(X/Z, Y/Z)`. Group law, negation and single-point normalization come from
//! the `group`/`halo2curves` traits; [`FwhtCurve`] only exposes the scaling
//! coordinate so that batch normalization can share one inversion.
//!
//! The affine identity is the sentinel pair `(0, 0)`; the projective identity
//! has `Z = 0`.

use ff::Field;
use halo2curves::CurveAffine;

pub use halo2curves::bn256;
pub use halo2curves::grumpkin;

/// Affine point type the transform operates on.
pub trait FwhtCurve: CurveAffine {
    /// Scaling coordinate `Z` of a projective point.
    fn scale(p: &Self::CurveExt) -> Self::Base;

    /// Affine form of `p` given `z_inv = 1/Z`.
    ///
    /// Must agree exactly with `p.to_affine()` for every `p` with `Z != 0`.
    fn from_inverse(p: &Self::CurveExt, z_inv: &Self::Base) -> Self;

    /// Whether `p` is the projective identity.
    #[inline]
    fn is_projective_identity(p: &Self::CurveExt) -> bool {
        bool::from(Self::scale(p).is_zero())
    }
}

macro_rules! impl_fwht_curve {
    ($affine:ty) => {
        impl FwhtCurve for $affine {
            #[inline]
            fn scale(p: &Self::CurveExt) -> Self::Base {
                p.z
            }

            #[inline]
            fn from_inverse(p: &Self::CurveExt, z_inv: &Self::Base) -> Self {
                Self {
                    x: p.x * z_inv,
                    y: p.y * z_inv,
                }
            }
        }
    };
}

impl_fwht_curve!(bn256::G1Affine);
impl_fwht_curve!(grumpkin::G1Affine);
