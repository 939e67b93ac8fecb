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

//! Parallel Fast Walsh-Hadamard Transform over elliptic-curve points
//!
//! The transform takes `N = 2^k` affine points, runs `k` butterfly stages
//! over projective coordinates on a pool of scoped worker threads and maps the
//! result back to affine form, by default with a single field inversion.
//!
//! # Modules
//!
//! - [`engine`]: entry points, options and profiling
//! - [`stage`]: per-stage 2D task tiling and execution
//! - [`convert`]: affine ↔ projective conversion, batch normalization
//! - [`pool`]: scoped worker pool and range splitting
//! - [`config`]: environment-driven defaults
//! - [`msm`], [`random`], [`cache`]: benchmark inputs and baselines
//!
//! # Example
//!
//! ```rust,ignore
//! use ec_fwht::{transform, transform_serial};
//! use ec_fwht::bn256::G1Affine;
//!
//! let y = transform(&points, 0)?;
//! assert_eq!(y, transform_serial(&points)?);
//! ```

pub mod butterfly;
pub mod cache;
pub mod config;
pub mod convert;
pub mod curve;
pub mod engine;
pub mod msm;
pub mod pool;
pub mod random;
pub mod stage;

pub use config::AffineStrategy;
pub use curve::{bn256, grumpkin, FwhtCurve};
pub use engine::{
    pad_to_power_of_two, transform, transform_in_place_serial, transform_serial, FwhtEngine,
    FwhtError, FwhtOptions, FwhtProfile,
};
pub use msm::{fast_msm, naive_msm, MsmError};
pub use cache::{CacheError, FixtureCache};
