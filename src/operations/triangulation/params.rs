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

//! Tuning knobs of the triangulation engine.

/// Parameters of a [`Delaun`](super::Delaun) build.
#[derive(Debug, Clone, PartialEq)]
pub struct DelaunParams {
    /// Parametric confusion distance used by the orientation, segment and
    /// boundary-walk tests. Default: 1e-9
    pub precision: f64,

    /// Vertices closer than this are merged into one. Default: 1e-7
    pub merge_tolerance: f64,

    /// Slack on `|p - center|^2 - r^2` when testing circumcircle
    /// containment. Default: 1e-14
    pub circle_tolerance: f64,

    /// Explicit circle cache grid size `(u, v)`. If None, the grid is sized
    /// from the number of vertices.
    pub cells: Option<(usize, usize)>,

    /// Multiplier of the gap between the bounding box of the vertices and
    /// the auxiliary super-mesh. Default: 1.0
    pub super_mesh_scale: f64,

    /// Insert vertices in increasing `x + y` order instead of input order.
    /// Default: true
    pub sort_vertices: bool,
}

impl Default for DelaunParams {
    fn default() -> Self {
        Self {
            precision: 1e-9,
            merge_tolerance: 1e-7,
            circle_tolerance: 1e-14,
            cells: None,
            super_mesh_scale: 1.0,
            sort_vertices: true,
        }
    }
}

impl DelaunParams {
    #[must_use]
    pub const fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    #[must_use]
    pub const fn with_merge_tolerance(mut self, tolerance: f64) -> Self {
        self.merge_tolerance = tolerance;
        self
    }

    #[must_use]
    pub const fn with_circle_tolerance(mut self, tolerance: f64) -> Self {
        self.circle_tolerance = tolerance;
        self
    }

    /// Sets an explicit circle cache grid size.
    #[must_use]
    pub const fn with_cells(mut self, cells_u: usize, cells_v: usize) -> Self {
        self.cells = Some((cells_u, cells_v));
        self
    }

    #[must_use]
    pub const fn with_super_mesh_scale(mut self, scale: f64) -> Self {
        self.super_mesh_scale = scale;
        self
    }

    #[must_use]
    pub const fn with_sort_vertices(mut self, sort: bool) -> Self {
        self.sort_vertices = sort;
        self
    }

    /// Squared tolerance used when locating a vertex inside a triangle.
    pub fn sq_location_tolerance(&self) -> f64 {
        2.0 * self.merge_tolerance * self.merge_tolerance
    }

    /// Circle cache grid size for `nb_vertices` vertices.
    pub fn grid_size(&self, nb_vertices: usize) -> (usize, usize) {
        let scaler = if nb_vertices > 100 { 5 } else { 2 };
        match self.cells {
            Some((u, v)) => (u.max(scaler), v.max(scaler)),
            None => {
                let side = (nb_vertices as f64).sqrt().ceil() as usize;
                (side.max(scaler), side.max(scaler))
            }
        }
    }
}
