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

//! Per-stage 2D task tiling
//!
//! Stage `r` of an `N`-point transform pairs index `a = b·block + j` with
//! `c = a + step`, where `step = 2^r`, `block = 2·step`, `b ∈ [0, nb)`,
//! `nb = N / block` and `j ∈ [0, step)`. The `(b, j)` plane is tiled into
//! tasks:
//!
//! - **Early stages** (`nb ≥ target`): many small blocks. Tasks are contiguous
//!   block ranges spanning every column.
//! - **Late stages** (`nb < target`): few large blocks. Tasks span every block
//!   and a contiguous column tile, so parallelism survives the last stages
//!   where `nb` drops to 1.
//!
//! `target = oversubscription × workers`. Every `(b, j)` cell belongs to
//! exactly one task, and distinct cells own distinct `{a, c}` pairs, so the
//! tasks of one stage write disjoint indices. The result is therefore the
//! same for any tiling and any worker count.

use std::marker::PhantomData;
use std::ops::Range;

use group::Group;
use tracing::debug;

use crate::butterfly::butterfly;
use crate::pool::run_tasks;

/// A rectangle of the `(block, column)` plane executed by one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTask {
    /// Block indices `b`
    pub blocks: Range<usize>,
    /// Intra-block offsets `j`
    pub cols: Range<usize>,
}

impl StageTask {
    /// Number of butterflies in the task.
    pub fn len(&self) -> usize {
        self.blocks.len() * self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Geometry and task list of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    pub stage: u32,
    /// Butterfly distance `2^stage`
    pub step: usize,
    /// Elements per block, `2 · step`
    pub block: usize,
    /// Number of blocks, `N / block`
    pub blocks: usize,
    pub tasks: Vec<StageTask>,
}

impl StagePlan {
    /// Whether the plan tiles the column axis.
    pub fn tiles_columns(&self) -> bool {
        self.tasks.iter().any(|t| t.cols != (0..self.step))
    }
}

/// Tile stage `stage` of an `n`-point transform for `workers` workers.
///
/// `n` must be a power of two with `2^(stage+1) <= n`.
pub fn plan_stage(n: usize, stage: u32, workers: usize, oversubscription: usize) -> StagePlan {
    let step = 1usize << stage;
    let block = step << 1;
    let nb = n / block;
    let workers = workers.max(1);
    let target = workers.saturating_mul(oversubscription.max(1));

    let mut tasks;
    if nb >= target {
        let chunk = nb.div_ceil(target);
        tasks = Vec::with_capacity(nb.div_ceil(chunk));
        for b0 in (0..nb).step_by(chunk) {
            tasks.push(StageTask {
                blocks: b0..(b0 + chunk).min(nb),
                cols: 0..step,
            });
        }
    } else {
        let col_tiles = target.div_ceil(nb.max(1)).clamp(1, step);
        let tile = step.div_ceil(col_tiles);
        tasks = Vec::with_capacity(col_tiles);
        for j0 in (0..step).step_by(tile) {
            tasks.push(StageTask {
                blocks: 0..nb,
                cols: j0..(j0 + tile).min(step),
            });
        }
    }

    StagePlan {
        stage,
        step,
        block,
        blocks: nb,
        tasks,
    }
}

/// Shared view of the working buffer for one stage.
///
/// Tasks of a stage own disjoint index sets (see the module docs), which is
/// what makes handing out `&mut` elements from several threads sound.
struct StageBuffer<'a, T> {
    ptr: *mut T,
    len: usize,
    _marker: PhantomData<&'a mut [T]>,
}

// SAFETY: access goes through `pair_mut`, whose contract forbids two threads
// from touching the same index.
unsafe impl<T: Send> Send for StageBuffer<'_, T> {}
unsafe impl<T: Send> Sync for StageBuffer<'_, T> {}

impl<'a, T> StageBuffer<'a, T> {
    fn new(buf: &'a mut [T]) -> Self {
        Self {
            ptr: buf.as_mut_ptr(),
            len: buf.len(),
            _marker: PhantomData,
        }
    }

    /// # Safety
    ///
    /// `a < c < len`, and no other live reference to index `a` or `c` may
    /// exist for the lifetime of the returned borrows.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    unsafe fn pair_mut(&self, a: usize, c: usize) -> (&mut T, &mut T) {
        debug_assert!(a < c && c < self.len);
        (&mut *self.ptr.add(a), &mut *self.ptr.add(c))
    }
}

#[inline]
fn run_task_serial<G: Group>(buf: &mut [G], plan: &StagePlan, task: &StageTask) {
    for b in task.blocks.clone() {
        let base = b * plan.block;
        for j in task.cols.clone() {
            let (lo, hi) = buf.split_at_mut(base + j + plan.step);
            butterfly(&mut lo[base + j], &mut hi[0]);
        }
    }
}

/// Execute one stage in place.
///
/// Returns after every task of the stage has completed.
pub fn run_stage<G: Group>(buf: &mut [G], plan: &StagePlan, workers: usize) {
    debug_assert_eq!(buf.len(), plan.blocks * plan.block);
    debug_assert!(plan.tasks.iter().all(|t| !t.is_empty()));

    if plan.tasks.len() <= 1 || workers <= 1 {
        for task in &plan.tasks {
            run_task_serial(buf, plan, task);
        }
        return;
    }

    let shared = StageBuffer::new(buf);
    let step = plan.step;
    let block = plan.block;
    run_tasks(plan.tasks.iter().collect(), workers, |task: &StageTask| {
        for b in task.blocks.clone() {
            let base = b * block;
            for j in task.cols.clone() {
                let a = base + j;
                // SAFETY: (b, j) cells are unique to this task and map to
                // unique index pairs within the stage.
                let (x, y) = unsafe { shared.pair_mut(a, a + step) };
                butterfly(x, y);
            }
        }
    });
}

/// Run every stage of the transform over `buf` with `workers` workers.
///
/// `on_stage` observes each stage index after its barrier.
pub fn run_all_stages<G, F>(buf: &mut [G], workers: usize, oversubscription: usize, mut on_stage: F)
where
    G: Group,
    F: FnMut(u32),
{
    let n = buf.len();
    if n < 2 {
        return;
    }
    let stages = n.trailing_zeros();
    for r in 0..stages {
        let plan = plan_stage(n, r, workers, oversubscription);
        debug!(
            "stage {}: step={} blocks={} tasks={} largest_task={} column_tiling={}",
            r,
            plan.step,
            plan.blocks,
            plan.tasks.len(),
            plan.tasks.iter().map(StageTask::len).max().unwrap_or(0),
            plan.tiles_columns()
        );
        run_stage(buf, &plan, workers);
        on_stage(r);
    }
}
