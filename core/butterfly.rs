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

//! Radix-2 butterfly over a group

use group::Group;

/// `(a, c) ← (a + c, a + (−c))`.
///
/// Both operands are read before either slot is written.
#[inline]
pub fn butterfly<G: Group>(a: &mut G, c: &mut G) {
    let (ta, tc) = (*a, *c);
    *a = ta + tc;
    *c = ta + (-tc);
}

/// Index of the lower operand of butterfly `k` at stage `r`.
///
/// Equivalent to `b · 2^(r+1) + j` with `b = k >> r`, `j = k mod 2^r`; the
/// partner sits at `+ 2^r`.
#[inline]
pub fn pair_index(k: usize, r: u32) -> usize {
    let mask = (1usize << r) - 1;
    ((k >> r) << (r + 1)) | (k & mask)
}
