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

//! Process-wide tuning knobs
//!
//! Every knob is read once from the environment and cached. None of them
//! changes numeric results; they only move work between threads.
//!
//! # Environment Variables
//!
//! - `FWHT_WORKERS`: Worker count used when a caller passes `<= 0`
//!   (default: all hardware threads)
//! - `FWHT_OVERSUBSCRIPTION`: Stage tasks per worker (default: 3)
//! - `FWHT_INLINE_THRESHOLD`: Element count below which range work runs
//!   inline (default: 1024)
//! - `FWHT_AFFINE`: Output conversion strategy
//!   - `batch` (default): one inversion for the whole vector
//!   - `per-element`: one inversion per point

use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// How the projective working buffer is mapped back to affine form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AffineStrategy {
    /// Montgomery batch inversion: one field inversion for the vector
    #[default]
    Batch,
    /// One field inversion per element
    PerElement,
}

impl AffineStrategy {
    /// Parse strategy from environment variable FWHT_AFFINE
    pub fn from_env() -> Self {
        std::env::var("FWHT_AFFINE")
            .ok()
            .and_then(|s| match s.to_lowercase().as_str() {
                "batch" | "montgomery" => Some(AffineStrategy::Batch),
                "per-element" | "per_element" | "single" => Some(AffineStrategy::PerElement),
                other => {
                    warn!("Unknown FWHT_AFFINE value '{}', using Batch", other);
                    None
                }
            })
            .unwrap_or_default()
    }
}

impl std::fmt::Display for AffineStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AffineStrategy::Batch => write!(f, "batch"),
            AffineStrategy::PerElement => write!(f, "per-element"),
        }
    }
}

impl std::str::FromStr for AffineStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "batch" => Ok(AffineStrategy::Batch),
            "per-element" | "per_element" => Ok(AffineStrategy::PerElement),
            other => Err(format!("unknown affine strategy '{}'", other)),
        }
    }
}

// ============================================================================
// Cached knobs
// ============================================================================

/// Configured output conversion strategy.
pub fn affine_strategy() -> AffineStrategy {
    static STRATEGY: OnceLock<AffineStrategy> = OnceLock::new();
    *STRATEGY.get_or_init(|| {
        let s = AffineStrategy::from_env();
        if s != AffineStrategy::Batch {
            info!("Affine strategy from FWHT_AFFINE: {}", s);
        }
        s
    })
}

/// Hardware threads available to this process, at least 1.
pub fn hardware_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Default worker count.
///
/// Parsed from `FWHT_WORKERS`; falls back to [`hardware_threads`].
pub fn default_workers() -> usize {
    static WORKERS: OnceLock<usize> = OnceLock::new();
    *WORKERS.get_or_init(|| {
        std::env::var("FWHT_WORKERS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&w| w > 0)
            .map(|w| {
                info!("FWHT_WORKERS={}", w);
                w
            })
            .unwrap_or_else(hardware_threads)
    })
}

/// Stage tasks generated per worker.
///
/// Oversubscription absorbs uneven task cost at stage boundaries.
/// Parsed from `FWHT_OVERSUBSCRIPTION`, clamped to 1..=64. Default: 3.
pub fn oversubscription() -> usize {
    static FACTOR: OnceLock<usize> = OnceLock::new();
    *FACTOR.get_or_init(|| {
        std::env::var("FWHT_OVERSUBSCRIPTION")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .map(|v| {
                let factor = v.clamp(1, 64);
                info!("Stage oversubscription factor: {}", factor);
                factor
            })
            .unwrap_or(DEFAULT_OVERSUBSCRIPTION)
    })
}

/// Element count below which `parallel_range` runs inline.
///
/// Parsed from `FWHT_INLINE_THRESHOLD`. Default: 1024.
pub fn inline_threshold() -> usize {
    static THRESHOLD: OnceLock<usize> = OnceLock::new();
    *THRESHOLD.get_or_init(|| {
        std::env::var("FWHT_INLINE_THRESHOLD")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .map(|v| {
                debug!("FWHT_INLINE_THRESHOLD={}", v);
                v
            })
            .unwrap_or(DEFAULT_INLINE_THRESHOLD)
    })
}

pub const DEFAULT_OVERSUBSCRIPTION: usize = 3;
pub const DEFAULT_INLINE_THRESHOLD: usize = 1024;

/// Coerce a caller-supplied worker count: `<= 0` means "use the default".
#[inline]
pub fn resolve_workers(requested: isize) -> usize {
    if requested <= 0 {
        default_workers()
    } else {
        requested as usize
    }
}

/// Log current configuration.
pub fn log_config() {
    debug!("FWHT Configuration:");
    debug!("  Hardware threads: {}", hardware_threads());
    debug!("  Default workers: {}", default_workers());
    debug!("  Oversubscription: {}", oversubscription());
    debug!("  Inline threshold: {}", inline_threshold());
    debug!("  Affine strategy: {}", affine_strategy());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_display() {
        assert_eq!(AffineStrategy::Batch.to_string(), "batch");
        assert_eq!(AffineStrategy::PerElement.to_string(), "per-element");
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("batch".parse::<AffineStrategy>(), Ok(AffineStrategy::Batch));
        assert_eq!("Per-Element".parse::<AffineStrategy>(), Ok(AffineStrategy::PerElement));
        assert!("fast".parse::<AffineStrategy>().is_err());
    }

    #[test]
    fn test_resolve_workers_coerces_non_positive() {
        assert_eq!(resolve_workers(3), 3);
        assert!(resolve_workers(0) >= 1);
        assert!(resolve_workers(-7) >= 1);
        assert_eq!(resolve_workers(0), default_workers());
    }

    #[test]
    fn test_knob_ranges() {
        assert!((1..=64).contains(&oversubscription()));
        assert!(hardware_threads() >= 1);
    }
}
