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

//! On-disk fixture cache for benchmark inputs
//!
//! Generating `2^20` random points dominates short benchmark runs, so inputs
//! are kept as JSON under `<root>/data`:
//!
//! ```text
//! data/scalars/exp_<e>_scalar.json   { "exp", "n", "scalars_hex": [...] }
//! data/points/exp_<e>_point.json     { "exp", "n", "points_b64": [...] }
//! ```
//!
//! Scalars are big-endian hex without a `0x` prefix. Points are base64 of the
//! uncompressed big-endian coordinates `x ‖ y`; the identity is encoded as
//! all-zero bytes. Decoded points are checked to lie on the curve.

use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose, Engine as _};
use ff::PrimeField;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::curve::FwhtCurve;

/// Errors raised by the fixture cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Declared count disagrees with the entries, or an entry fails to decode
    #[error("cache malformed: {0}")]
    Malformed(String),

    #[error("cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache JSON invalid: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct ScalarFile {
    exp: u32,
    n: usize,
    scalars_hex: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PointFile {
    exp: u32,
    n: usize,
    points_b64: Vec<String>,
}

// ============================================================================
// Field element encoding
// ============================================================================

// halo2curves field representations are little-endian.
fn field_to_be<F: PrimeField>(f: &F) -> Vec<u8> {
    let mut bytes = f.to_repr().as_ref().to_vec();
    bytes.reverse();
    bytes
}

fn field_from_be<F: PrimeField>(be: &[u8]) -> Option<F> {
    let mut repr = F::Repr::default();
    let len = repr.as_ref().len();
    if be.len() > len {
        return None;
    }
    // Left-pad short big-endian input, then flip to little-endian.
    let mut padded = vec![0u8; len - be.len()];
    padded.extend_from_slice(be);
    padded.reverse();
    repr.as_mut().copy_from_slice(&padded);
    Option::from(F::from_repr(repr))
}

fn scalar_to_hex<F: PrimeField>(s: &F) -> String {
    hex::encode(field_to_be(s))
}

fn scalar_from_hex<F: PrimeField>(s: &str) -> Option<F> {
    let s = if s.len() % 2 == 1 { format!("0{}", s) } else { s.to_string() };
    let bytes = hex::decode(s).ok()?;
    field_from_be(&bytes)
}

fn coord_len<A: FwhtCurve>() -> usize {
    <A::Base as PrimeField>::Repr::default().as_ref().len()
}

/// Uncompressed `x ‖ y` big-endian encoding; identity is all zeros.
pub fn encode_point<A: FwhtCurve>(p: &A) -> Vec<u8> {
    let coords: Option<halo2curves::Coordinates<A>> = p.coordinates().into();
    match coords {
        Some(c) => {
            let mut out = field_to_be(c.x());
            out.extend(field_to_be(c.y()));
            out
        }
        None => vec![0u8; 2 * coord_len::<A>()],
    }
}

/// Inverse of [`encode_point`]. Rejects wrong lengths and off-curve points.
pub fn decode_point<A: FwhtCurve>(bytes: &[u8]) -> Option<A> {
    let len = coord_len::<A>();
    if bytes.len() != 2 * len {
        return None;
    }
    if bytes.iter().all(|&b| b == 0) {
        return Some(A::identity());
    }
    let x = field_from_be::<A::Base>(&bytes[..len])?;
    let y = field_from_be::<A::Base>(&bytes[len..])?;
    Option::from(A::from_xy(x, y))
}

// ============================================================================
// Cache
// ============================================================================

/// Fixture cache rooted at a directory (the working directory by default).
#[derive(Debug, Clone)]
pub struct FixtureCache {
    root: PathBuf,
}

impl Default for FixtureCache {
    fn default() -> Self {
        Self::new(".")
    }
}

impl FixtureCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the scalar fixture for `2^exp` elements. Creates the directory.
    pub fn scalar_path(&self, exp: u32) -> Result<PathBuf, CacheError> {
        let dir = self.root.join("data").join("scalars");
        fs::create_dir_all(&dir)?;
        Ok(dir.join(format!("exp_{}_scalar.json", exp)))
    }

    /// Path of the point fixture for `2^exp` elements. Creates the directory.
    pub fn point_path(&self, exp: u32) -> Result<PathBuf, CacheError> {
        let dir = self.root.join("data").join("points");
        fs::create_dir_all(&dir)?;
        Ok(dir.join(format!("exp_{}_point.json", exp)))
    }

    pub fn save_scalars<A: FwhtCurve>(
        &self,
        path: &Path,
        exp: u32,
        scalars: &[A::ScalarExt],
    ) -> Result<(), CacheError> {
        let file = ScalarFile {
            exp,
            n: scalars.len(),
            scalars_hex: scalars.iter().map(scalar_to_hex).collect(),
        };
        fs::write(path, serde_json::to_vec_pretty(&file)?)?;
        Ok(())
    }

    /// Load scalars and the exponent recorded in the file.
    pub fn load_scalars<A: FwhtCurve>(
        &self,
        path: &Path,
    ) -> Result<(Vec<A::ScalarExt>, u32), CacheError> {
        let file: ScalarFile = serde_json::from_slice(&fs::read(path)?)?;
        if file.n != file.scalars_hex.len() {
            return Err(CacheError::Malformed(format!(
                "n={}, got {} scalars",
                file.n,
                file.scalars_hex.len()
            )));
        }
        let scalars = file
            .scalars_hex
            .iter()
            .enumerate()
            .map(|(i, s)| {
                scalar_from_hex(s)
                    .ok_or_else(|| CacheError::Malformed(format!("invalid scalar hex at {}", i)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((scalars, file.exp))
    }

    pub fn save_points<A: FwhtCurve>(
        &self,
        path: &Path,
        exp: u32,
        points: &[A],
    ) -> Result<(), CacheError> {
        let file = PointFile {
            exp,
            n: points.len(),
            points_b64: points
                .iter()
                .map(|p| general_purpose::STANDARD.encode(encode_point(p)))
                .collect(),
        };
        fs::write(path, serde_json::to_vec_pretty(&file)?)?;
        Ok(())
    }

    /// Load points and the exponent recorded in the file.
    pub fn load_points<A: FwhtCurve>(&self, path: &Path) -> Result<(Vec<A>, u32), CacheError> {
        let file: PointFile = serde_json::from_slice(&fs::read(path)?)?;
        if file.n != file.points_b64.len() {
            return Err(CacheError::Malformed(format!(
                "n={}, got {} points",
                file.n,
                file.points_b64.len()
            )));
        }
        let points = file
            .points_b64
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let raw = general_purpose::STANDARD
                    .decode(s)
                    .map_err(|e| CacheError::Malformed(format!("invalid point b64 at {}: {}", i, e)))?;
                decode_point(&raw)
                    .ok_or_else(|| CacheError::Malformed(format!("invalid point at {}", i)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((points, file.exp))
    }

    /// Cached scalars for `exp`, or `generate(n)` saved to the cache.
    ///
    /// The flag is `true` when the cache was used. A cache that fails to
    /// load, or holds a different `n` or `exp`, is regenerated.
    pub fn load_or_create_scalars<A, G>(
        &self,
        exp: u32,
        n: usize,
        generate: G,
    ) -> Result<(Vec<A::ScalarExt>, bool), CacheError>
    where
        A: FwhtCurve,
        G: FnOnce(usize) -> Vec<A::ScalarExt>,
    {
        let path = self.scalar_path(exp)?;
        if path.is_file() {
            match self.load_scalars::<A>(&path) {
                Ok((scalars, file_exp)) if scalars.len() == n && file_exp == exp => {
                    info!("Loaded {} scalars from {}", n, path.display());
                    return Ok((scalars, true));
                }
                Ok(_) => warn!("Scalar cache {} has wrong size; regenerating", path.display()),
                Err(e) => warn!("Scalar cache {} invalid ({}); regenerating", path.display(), e),
            }
        }

        let scalars = generate(n);
        info!("Saving {} scalars to {}", n, path.display());
        self.save_scalars::<A>(&path, exp, &scalars)?;
        Ok((scalars, false))
    }

    /// Cached points for `exp`, or `generate(n)` saved to the cache.
    pub fn load_or_create_points<A, G>(
        &self,
        exp: u32,
        n: usize,
        generate: G,
    ) -> Result<(Vec<A>, bool), CacheError>
    where
        A: FwhtCurve,
        G: FnOnce(usize) -> Vec<A>,
    {
        let path = self.point_path(exp)?;
        if path.is_file() {
            match self.load_points::<A>(&path) {
                Ok((points, file_exp)) if points.len() == n && file_exp == exp => {
                    info!("Loaded {} points from {}", n, path.display());
                    return Ok((points, true));
                }
                Ok(_) => warn!("Point cache {} has wrong size; regenerating", path.display()),
                Err(e) => warn!("Point cache {} invalid ({}); regenerating", path.display(), e),
            }
        }

        let points = generate(n);
        info!("Saving {} points to {}", n, path.display());
        self.save_points(&path, exp, &points)?;
        Ok((points, false))
    }

    /// Scalars and points together; the flag is `true` only if both came
    /// from the cache.
    pub fn load_or_create_inputs<A, GS, GP>(
        &self,
        exp: u32,
        n: usize,
        gen_scalars: GS,
        gen_points: GP,
    ) -> Result<(Vec<A::ScalarExt>, Vec<A>, bool), CacheError>
    where
        A: FwhtCurve,
        GS: FnOnce(usize) -> Vec<A::ScalarExt>,
        GP: FnOnce(usize) -> Vec<A>,
    {
        let (scalars, s_cached) = self.load_or_create_scalars::<A, _>(exp, n, gen_scalars)?;
        let (points, p_cached) = self.load_or_create_points(exp, n, gen_points)?;
        Ok((scalars, points, s_cached && p_cached))
    }
}
