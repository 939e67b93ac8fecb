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

//! Fast Walsh-Hadamard Transform over curve points
//!
//! Computes `y = H_N · x` where `H_N` is the (unnormalized) Sylvester
//! Hadamard matrix and `x` is a vector of group elements. Applying the
//! transform twice yields `N · x`.
//!
//! # Pipeline
//!
//! 1. Affine → projective, in parallel, into one working buffer.
//! 2. `log2 N` stages of butterflies; each stage is tiled by
//!    [`crate::stage::plan_stage`] and joined before the next starts.
//! 3. Projective → affine with the configured [`AffineStrategy`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use ec_fwht::{FwhtEngine, FwhtOptions};
//!
//! let engine = FwhtEngine::new(FwhtOptions::default());
//! let y = engine.transform(&points, 0)?;          // all hardware threads
//! let (y, profile) = engine.transform_profiled(&points, 8)?;
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use group::prime::PrimeCurveAffine;
use thiserror::Error;
use tracing::debug;

use crate::butterfly::{butterfly, pair_index};
use crate::config::{self, AffineStrategy};
use crate::convert::{to_affine_batch, to_affine_per_element, to_affine_single, to_projective, to_projective_par};
use crate::curve::FwhtCurve;
use crate::stage::run_all_stages;

/// Errors specific to the transform
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FwhtError {
    /// Input length is not a power of two
    #[error("FWHT length must be a power of two, got {len}")]
    Size { len: usize },
}

/// Engine options. Every combination yields identical output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FwhtOptions {
    /// Output conversion strategy
    pub strategy: AffineStrategy,
    /// Stage tasks per worker
    pub oversubscription: usize,
    /// Element count below which conversions run inline
    pub inline_threshold: usize,
}

impl Default for FwhtOptions {
    fn default() -> Self {
        Self {
            strategy: AffineStrategy::Batch,
            oversubscription: config::DEFAULT_OVERSUBSCRIPTION,
            inline_threshold: config::DEFAULT_INLINE_THRESHOLD,
        }
    }
}

impl FwhtOptions {
    /// Options from the `FWHT_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            strategy: config::affine_strategy(),
            oversubscription: config::oversubscription(),
            inline_threshold: config::inline_threshold(),
        }
    }

    pub fn with_strategy(mut self, strategy: AffineStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_oversubscription(mut self, factor: usize) -> Self {
        self.oversubscription = factor.max(1);
        self
    }

    pub fn with_inline_threshold(mut self, threshold: usize) -> Self {
        self.inline_threshold = threshold;
        self
    }
}

/// Wall-clock breakdown of one transform. Observational only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FwhtProfile {
    pub n: usize,
    pub workers: usize,
    pub stages: usize,
    pub strategy: AffineStrategy,
    pub to_projective: Duration,
    pub butterflies: Duration,
    pub per_stage: Vec<Duration>,
    pub to_affine: Duration,
    pub total: Duration,
}

impl fmt::Display for FwhtProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "N={} workers={} stages={} affine={}",
            self.n, self.workers, self.stages, self.strategy
        )?;
        writeln!(f, "  affine -> projective : {:?}", self.to_projective)?;
        writeln!(f, "  butterflies         : {:?}", self.butterflies)?;
        for (r, t) in self.per_stage.iter().enumerate() {
            writeln!(f, "    stage {:>2}          : {:?}", r, t)?;
        }
        writeln!(f, "  projective -> affine : {:?}", self.to_affine)?;
        write!(f, "  total               : {:?}", self.total)
    }
}

/// Parallel FWHT engine.
#[derive(Debug, Clone, Default)]
pub struct FwhtEngine {
    options: FwhtOptions,
}

impl FwhtEngine {
    pub fn new(options: FwhtOptions) -> Self {
        Self { options }
    }

    /// Engine configured from the environment.
    pub fn from_env() -> Self {
        Self::new(FwhtOptions::from_env())
    }

    pub fn options(&self) -> &FwhtOptions {
        &self.options
    }

    /// Transform `input` with `workers` threads (`<= 0`: all hardware threads).
    pub fn transform<A: FwhtCurve>(&self, input: &[A], workers: isize) -> Result<Vec<A>, FwhtError> {
        self.run(input, workers, None)
    }

    /// [`Self::transform`] plus a per-phase timing breakdown.
    pub fn transform_profiled<A: FwhtCurve>(
        &self,
        input: &[A],
        workers: isize,
    ) -> Result<(Vec<A>, FwhtProfile), FwhtError> {
        let mut profile = FwhtProfile::default();
        let out = self.run(input, workers, Some(&mut profile))?;
        Ok((out, profile))
    }

    fn run<A: FwhtCurve>(
        &self,
        input: &[A],
        workers: isize,
        mut profile: Option<&mut FwhtProfile>,
    ) -> Result<Vec<A>, FwhtError> {
        let n = input.len();
        let stages = stage_count(n)?;
        // No stage has more than n/2 butterflies to share out.
        let workers = config::resolve_workers(workers).min((n / 2).max(1));
        let opts = &self.options;

        if let Some(p) = profile.as_deref_mut() {
            p.n = n;
            p.workers = workers;
            p.stages = stages;
            p.strategy = opts.strategy;
            p.per_stage = vec![Duration::ZERO; stages];
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        debug!(
            "FWHT: n={} workers={} stages={} affine={}",
            n, workers, stages, opts.strategy
        );

        let timed = profile.is_some();
        let t_all = timed.then(Instant::now);

        let t0 = timed.then(Instant::now);
        let mut buf = to_projective_par(input, workers, opts.inline_threshold);
        let t_proj = t0.map(|t| t.elapsed());

        let t1 = timed.then(Instant::now);
        let mut per_stage = Vec::with_capacity(if timed { stages } else { 0 });
        let mut t_stage = timed.then(Instant::now);
        run_all_stages(&mut buf, workers, opts.oversubscription, |_| {
            if let Some(t) = t_stage.as_mut() {
                per_stage.push(t.elapsed());
                *t = Instant::now();
            }
        });
        let t_butterfly = t1.map(|t| t.elapsed());

        let t2 = timed.then(Instant::now);
        let out = match opts.strategy {
            AffineStrategy::Batch => to_affine_batch::<A>(&buf, workers, opts.inline_threshold),
            AffineStrategy::PerElement => to_affine_per_element::<A>(&buf, workers, opts.inline_threshold),
        };
        let t_affine = t2.map(|t| t.elapsed());

        if let Some(p) = profile {
            p.to_projective = t_proj.unwrap_or_default();
            p.butterflies = t_butterfly.unwrap_or_default();
            p.per_stage = per_stage;
            p.to_affine = t_affine.unwrap_or_default();
            p.total = t_all.map(|t| t.elapsed()).unwrap_or_default();
        }

        Ok(out)
    }
}

/// `log2 n`, or a size error when `n` is not a power of two. Zero stages for
/// `n <= 1`.
fn stage_count(n: usize) -> Result<usize, FwhtError> {
    match n {
        0 => Ok(0),
        n if n.is_power_of_two() => Ok(n.trailing_zeros() as usize),
        len => Err(FwhtError::Size { len }),
    }
}

/// Transform with options from the environment.
pub fn transform<A: FwhtCurve>(input: &[A], workers: isize) -> Result<Vec<A>, FwhtError> {
    FwhtEngine::from_env().transform(input, workers)
}

/// Single-threaded reference transform.
///
/// Walks butterflies by a flat index per stage instead of the block/column
/// plane and normalizes each point on its own; shares nothing with the
/// parallel scheduler except the butterfly itself.
pub fn transform_serial<A: FwhtCurve>(input: &[A]) -> Result<Vec<A>, FwhtError> {
    let mut out = input.to_vec();
    transform_in_place_serial(&mut out)?;
    Ok(out)
}

/// In-place variant of [`transform_serial`].
pub fn transform_in_place_serial<A: FwhtCurve>(data: &mut [A]) -> Result<(), FwhtError> {
    let n = data.len();
    let stages = stage_count(n)? as u32;
    if n == 0 {
        return Ok(());
    }

    let mut buf: Vec<A::CurveExt> = data.iter().map(to_projective).collect();
    let half = n >> 1;
    for r in 0..stages {
        let dist = 1usize << r;
        for k in 0..half {
            let a = pair_index(k, r);
            let (lo, hi) = buf.split_at_mut(a + dist);
            butterfly(&mut lo[a], &mut hi[0]);
        }
    }

    for (slot, p) in data.iter_mut().zip(&buf) {
        *slot = to_affine_single::<A>(p);
    }
    Ok(())
}

/// Extend `input` with identities up to the next power of two.
///
/// Empty input stays empty.
pub fn pad_to_power_of_two<A: PrimeCurveAffine>(input: &[A]) -> Vec<A> {
    let mut out = input.to_vec();
    if !out.is_empty() {
        out.resize(out.len().next_power_of_two(), A::identity());
    }
    out
}
