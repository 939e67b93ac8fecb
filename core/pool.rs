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

//! Bounded fan-out/join over scoped OS threads
//!
//! Workers are spawned per call with [`std::thread::scope`] and joined before
//! the call returns; there is no persistent global pool. A panic inside any
//! task is re-raised on the calling thread when the scope joins.
//!
//! The pool performs no domain validation.

use std::ops::Range;
use std::thread;

use crossbeam_channel::bounded;

pub use crate::config::resolve_workers;

/// Split `[0, n)` into at most `parts` contiguous, non-empty ranges of
/// near-equal length.
pub fn chunk_bounds(n: usize, parts: usize) -> Vec<Range<usize>> {
    if n == 0 {
        return Vec::new();
    }
    let parts = parts.clamp(1, n);
    let chunk = n.div_ceil(parts);
    (0..n)
        .step_by(chunk)
        .map(|start| start..(start + chunk).min(n))
        .collect()
}

/// Drain `tasks` with `min(workers, tasks.len())` consumer threads.
///
/// Returns once every task has run. With one worker or at most one task the
/// tasks run inline, in order, on the calling thread.
pub fn run_tasks<T, F>(tasks: Vec<T>, workers: usize, f: F)
where
    T: Send,
    F: Fn(T) + Sync,
{
    let consumers = workers.min(tasks.len());
    if consumers <= 1 {
        tasks.into_iter().for_each(f);
        return;
    }

    let (tx, rx) = bounded(tasks.len());
    for task in tasks {
        // Capacity equals the task count and the receiver is alive.
        let _ = tx.send(task);
    }
    drop(tx);

    let f = &f;
    thread::scope(|scope| {
        for _ in 0..consumers {
            let rx = rx.clone();
            scope.spawn(move || {
                for task in rx.iter() {
                    f(task);
                }
            });
        }
    });
}

/// Run `f(start, end)` over contiguous sub-ranges of `[0, n)` and collect the
/// per-range results in range order.
///
/// Ranges below `inline_threshold` elements, or a single worker, run as one
/// inline call `f(0, n)`.
pub fn parallel_range<R, F>(n: usize, workers: usize, inline_threshold: usize, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize, usize) -> R + Sync,
{
    if n == 0 {
        return Vec::new();
    }
    if n < inline_threshold || workers <= 1 {
        return vec![f(0, n)];
    }

    let bounds = chunk_bounds(n, workers);
    let mut results: Vec<Option<R>> = bounds.iter().map(|_| None).collect();
    let jobs: Vec<_> = bounds.into_iter().zip(results.iter_mut()).collect();
    run_tasks(jobs, workers, |(range, slot)| {
        *slot = Some(f(range.start, range.end));
    });
    results.into_iter().flatten().collect()
}

/// Mutable variant of [`parallel_range`]: hands each worker a disjoint
/// sub-slice of `data` together with its starting offset.
pub fn parallel_chunks_mut<T, F>(data: &mut [T], workers: usize, inline_threshold: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync,
{
    let n = data.len();
    if n == 0 {
        return;
    }
    if n < inline_threshold || workers <= 1 {
        f(0, data);
        return;
    }

    let chunk = n.div_ceil(workers.min(n));
    let jobs: Vec<(usize, &mut [T])> = data
        .chunks_mut(chunk)
        .enumerate()
        .map(|(i, slice)| (i * chunk, slice))
        .collect();
    run_tasks(jobs, workers, |(offset, slice)| f(offset, slice));
}
