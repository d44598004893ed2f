// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Alexandre Severino
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::geometry::Point2;
use crate::numeric::scalar::Scalar;

/// Uniform hash grid used to merge coincident vertices.
///
/// Cells are as wide as the merge tolerance, so every candidate within
/// tolerance lives in the 3x3 block of cells around the query point.
#[derive(Clone, Debug)]
pub struct VertexTool<T: Scalar> {
    tolerance: T,
    hash_inv: f64,
    cells: AHashMap<(i64, i64), SmallVec<[(usize, Point2<T>); 4]>>,
}

impl<T: Scalar> VertexTool<T> {
    pub fn new(tolerance: T) -> Self {
        // clamp to avoid INF
        let mut cell = tolerance.as_f64().max(1e-12);
        if !cell.is_finite() {
            cell = 1e-5;
        }
        VertexTool {
            tolerance,
            hash_inv: 1.0 / cell,
            cells: AHashMap::default(),
        }
    }

    #[inline]
    pub fn tolerance(&self) -> T {
        self.tolerance
    }

    #[inline(always)]
    fn floor_sat_i64(x: f64) -> i64 {
        if !x.is_finite() {
            return if x.is_sign_positive() { i64::MAX } else { i64::MIN };
        }
        let i = x as i64;
        i - ((i as f64 > x) as i64)
    }

    #[inline(always)]
    pub fn position_to_hash_key(&self, pos: &Point2<T>) -> (i64, i64) {
        (
            Self::floor_sat_i64(pos.x.as_f64() * self.hash_inv),
            Self::floor_sat_i64(pos.y.as_f64() * self.hash_inv),
        )
    }

    /// Closest registered vertex within tolerance of `pos`; ties go to the
    /// smallest index so lookups are independent of hash order.
    pub fn find(&self, pos: &Point2<T>) -> Option<usize> {
        let (kx, ky) = self.position_to_hash_key(pos);
        let sq_tol = self.tolerance * self.tolerance;

        let mut best: Option<(T, usize)> = None;
        for dx in -1i64..=1 {
            for dy in -1i64..=1 {
                let key = (kx.saturating_add(dx), ky.saturating_add(dy));
                let Some(bucket) = self.cells.get(&key) else {
                    continue;
                };
                for &(index, p) in bucket {
                    let d = p.square_distance(pos);
                    if d > sq_tol {
                        continue;
                    }
                    best = match best {
                        Some((bd, bi)) if bd < d || (bd == d && bi < index) => Some((bd, bi)),
                        _ => Some((d, index)),
                    };
                }
            }
        }
        best.map(|(_, i)| i)
    }

    pub fn insert(&mut self, index: usize, pos: Point2<T>) {
        let key = self.position_to_hash_key(&pos);
        self.cells.entry(key).or_default().push((index, pos));
    }

    /// Unregisters `index`; returns whether it was registered at `pos`.
    pub fn remove(&mut self, index: usize, pos: &Point2<T>) -> bool {
        let key = self.position_to_hash_key(pos);
        let Some(bucket) = self.cells.get_mut(&key) else {
            return false;
        };
        let before = bucket.len();
        bucket.retain(|(i, _)| *i != index);
        let removed = bucket.len() != before;
        if bucket.is_empty() {
            self.cells.remove(&key);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(|b| b.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
