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

use smallvec::SmallVec;

use crate::geometry::{Aabb2, Circle2, Point2, Vector2};
use crate::kernel::circumcircle;
use crate::mesh::MeshData;
use crate::numeric::scalar::Scalar;

/// Circles whose bounding square covers more cells than this are kept in
/// a single overflow list instead of the grid.
const MAX_CELL_SPAN: usize = 64;

#[derive(Clone, Copy, Debug)]
struct CircleEntry<T: Scalar> {
    circle: Circle2<T>,
    // inclusive cell range: (u_min, u_max, v_min, v_max), None for overflow
    span: Option<(usize, usize, usize, usize)>,
}

/// Circumcircle cache keyed by triangle index.
///
/// Circles are registered in every cell of a uniform grid overlapped by
/// their bounding square. Cell coordinates are clamped to the grid, so a
/// query point lying outside the grid is answered by the border cells.
/// Circles spanning many cells (super-mesh triangles, slivers along the
/// insertion front) go to an overflow list checked by every query, which
/// keeps registration cost bounded by [`MAX_CELL_SPAN`].
#[derive(Clone, Debug)]
pub struct CircleTool<T: Scalar> {
    sq_tolerance: T,
    origin: Point2<T>,
    cell_size: Vector2<T>,
    nb_cells: (usize, usize),
    cells: Vec<SmallVec<[usize; 8]>>,
    overflow: Vec<usize>,
    circles: Vec<Option<CircleEntry<T>>>,
    nb_circles: usize,
}

impl<T: Scalar> CircleTool<T> {
    /// `sq_tolerance` is the slack on `|p - center|^2 - r^2` below which a
    /// point counts as inside a circle.
    pub fn new(sq_tolerance: T) -> Self {
        CircleTool {
            sq_tolerance,
            origin: Point2::default(),
            cell_size: Vector2::new(T::one(), T::one()),
            nb_cells: (1, 1),
            cells: vec![SmallVec::new()],
            overflow: Vec::new(),
            circles: Vec::new(),
            nb_circles: 0,
        }
    }

    /// Resets the cache to an empty grid of `cells_u x cells_v` cells over `bbox`.
    pub fn init(&mut self, bbox: &Aabb2<T>, cells_u: usize, cells_v: usize) {
        let nu = cells_u.max(1);
        let nv = cells_v.max(1);
        let extent = bbox.extent();

        let du = extent.x / T::lit(nu as f64);
        let dv = extent.y / T::lit(nv as f64);
        self.cell_size = Vector2::new(
            if du > T::zero() { du } else { T::one() },
            if dv > T::zero() { dv } else { T::one() },
        );
        self.origin = if bbox.is_void() { Point2::default() } else { bbox.min };
        self.nb_cells = (nu, nv);
        self.cells = vec![SmallVec::new(); nu * nv];
        self.overflow.clear();
        self.circles.clear();
        self.nb_circles = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nb_circles
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nb_circles == 0
    }

    #[inline]
    fn clamp_cell(value: T, n: usize) -> usize {
        let f = value.floor().as_f64();
        if !(f > 0.0) {
            0
        } else if f >= (n - 1) as f64 {
            n - 1
        } else {
            f as usize
        }
    }

    #[inline]
    fn cell_u(&self, x: T) -> usize {
        Self::clamp_cell((x - self.origin.x) / self.cell_size.x, self.nb_cells.0)
    }

    #[inline]
    fn cell_v(&self, y: T) -> usize {
        Self::clamp_cell((y - self.origin.y) / self.cell_size.y, self.nb_cells.1)
    }

    /// Computes and registers the circumcircle of triangle `abc` under
    /// `triangle`. Returns false (and registers nothing) for a degenerate
    /// triangle.
    pub fn bind(&mut self, triangle: usize, a: &Point2<T>, b: &Point2<T>, c: &Point2<T>) -> bool {
        match circumcircle(a, b, c) {
            Some(circle) => {
                self.bind_circle(triangle, circle);
                true
            }
            None => false,
        }
    }

    pub fn bind_circle(&mut self, triangle: usize, circle: Circle2<T>) {
        self.delete(triangle);

        let r = circle.radius();
        let span = (
            self.cell_u(circle.center.x - r),
            self.cell_u(circle.center.x + r),
            self.cell_v(circle.center.y - r),
            self.cell_v(circle.center.y + r),
        );
        let covered = (span.1 - span.0 + 1) * (span.3 - span.2 + 1);
        let span = if covered > MAX_CELL_SPAN {
            self.overflow.push(triangle);
            None
        } else {
            for v in span.2..=span.3 {
                for u in span.0..=span.1 {
                    self.cells[v * self.nb_cells.0 + u].push(triangle);
                }
            }
            Some(span)
        };

        if self.circles.len() <= triangle {
            self.circles.resize(triangle + 1, None);
        }
        self.circles[triangle] = Some(CircleEntry { circle, span });
        self.nb_circles += 1;
    }

    /// Evicts the circle of `triangle`, if any.
    pub fn delete(&mut self, triangle: usize) {
        let Some(entry) = self.circles.get_mut(triangle).and_then(Option::take) else {
            return;
        };
        match entry.span {
            Some((u0, u1, v0, v1)) => {
                for v in v0..=v1 {
                    for u in u0..=u1 {
                        self.cells[v * self.nb_cells.0 + u].retain(|t| *t != triangle);
                    }
                }
            }
            None => {
                if let Some(pos) = self.overflow.iter().position(|&t| t == triangle) {
                    self.overflow.swap_remove(pos);
                }
            }
        }
        self.nb_circles -= 1;
    }

    pub fn circle(&self, triangle: usize) -> Option<&Circle2<T>> {
        self.circles
            .get(triangle)
            .and_then(|e| e.as_ref())
            .map(|e| &e.circle)
    }

    /// Triangles whose circumcircle contains `p`, in index order.
    pub fn select(&self, p: &Point2<T>) -> Vec<usize> {
        let cell = self.cell_v(p.y) * self.nb_cells.0 + self.cell_u(p.x);
        let mut out: Vec<usize> = self.cells[cell]
            .iter()
            .chain(self.overflow.iter())
            .copied()
            .filter(|&t| {
                self.circle(t)
                    .is_some_and(|c| c.contains(p, self.sq_tolerance))
            })
            .collect();
        out.sort_unstable();
        out
    }

    /// Triangles whose circle may reach `bbox`: everything registered in
    /// the cells it overlaps (widened by one cell) plus the overflow list.
    /// Sorted and without duplicates.
    pub fn triangles_near(&self, bbox: &Aabb2<T>) -> Vec<usize> {
        let (nu, nv) = self.nb_cells;
        let u0 = self.cell_u(bbox.min.x).saturating_sub(1);
        let u1 = (self.cell_u(bbox.max.x) + 1).min(nu - 1);
        let v0 = self.cell_v(bbox.min.y).saturating_sub(1);
        let v1 = (self.cell_v(bbox.max.y) + 1).min(nv - 1);

        let mut out: Vec<usize> = self.overflow.clone();
        for v in v0..=v1 {
            for u in u0..=u1 {
                out.extend_from_slice(&self.cells[v * nu + u]);
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Live vertices of `mesh` other than the corners of `triangle` lying
    /// strictly inside its circumcircle widened by `tolerance`.
    pub fn vertices_in_circle(&self, mesh: &MeshData<T>, triangle: usize, tolerance: T) -> Vec<usize> {
        let Some(circle) = self.circle(triangle) else {
            return Vec::new();
        };
        let nodes = mesh.triangle_nodes(triangle);
        mesh.active_vertices()
            .filter(|v| !nodes.contains(v) && !mesh.edges_connected_to(*v).is_empty())
            .filter(|&v| circle.power(&mesh.point(v)) < tolerance)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> CircleTool<f64> {
        let mut tool = CircleTool::new(1e-14);
        let bbox = Aabb2::from_points(&Point2::new(0.0, 0.0), &Point2::new(10.0, 10.0));
        tool.init(&bbox, 5, 5);
        tool
    }

    #[test]
    fn test_bind_and_select() {
        let mut tool = grid();
        assert!(tool.bind(0, &Point2::new(1.0, 1.0), &Point2::new(3.0, 1.0), &Point2::new(1.0, 3.0)));
        assert!(tool.bind(1, &Point2::new(7.0, 7.0), &Point2::new(9.0, 7.0), &Point2::new(7.0, 9.0)));

        assert_eq!(tool.select(&Point2::new(2.0, 2.0)), vec![0]);
        assert_eq!(tool.select(&Point2::new(8.0, 8.0)), vec![1]);
        assert!(tool.select(&Point2::new(5.0, 5.0)).is_empty());
        // on the circle counts as inside
        assert_eq!(tool.select(&Point2::new(3.0, 3.0)), vec![0]);
        assert_eq!(tool.len(), 2);
    }

    #[test]
    fn test_degenerate_triangle_is_rejected() {
        let mut tool = grid();
        assert!(!tool.bind(0, &Point2::new(0.0, 0.0), &Point2::new(1.0, 1.0), &Point2::new(2.0, 2.0)));
        assert!(tool.is_empty());
    }

    #[test]
    fn test_delete() {
        let mut tool = grid();
        tool.bind(3, &Point2::new(1.0, 1.0), &Point2::new(3.0, 1.0), &Point2::new(1.0, 3.0));
        tool.delete(3);
        tool.delete(3);
        assert!(tool.select(&Point2::new(2.0, 2.0)).is_empty());
        assert!(tool.circle(3).is_none());
        assert!(tool.is_empty());
    }

    #[test]
    fn test_large_circle_found_outside_grid() {
        let mut tool = grid();
        tool.bind(0, &Point2::new(-100.0, -100.0), &Point2::new(100.0, -100.0), &Point2::new(0.0, 100.0));
        assert_eq!(tool.select(&Point2::new(5.0, 5.0)), vec![0]);
        assert_eq!(tool.select(&Point2::new(-20.0, 30.0)), vec![0]);
    }

    #[test]
    fn test_wide_circle_goes_to_overflow() {
        let mut tool = CircleTool::new(1e-14);
        let bbox = Aabb2::from_points(&Point2::new(0.0, 0.0), &Point2::new(100.0, 100.0));
        tool.init(&bbox, 20, 20);

        tool.bind(4, &Point2::new(-1e3, -1e3), &Point2::new(1e3, -1e3), &Point2::new(0.0, 1e3));
        tool.bind(7, &Point2::new(1.0, 1.0), &Point2::new(3.0, 1.0), &Point2::new(1.0, 3.0));
        assert_eq!(tool.overflow, vec![4]);
        assert!(tool.cells.iter().all(|c| !c.contains(&4)));
        assert_eq!(tool.cells.iter().filter(|c| c.contains(&7)).count(), 1);

        assert_eq!(tool.select(&Point2::new(2.0, 2.0)), vec![4, 7]);
        assert_eq!(tool.select(&Point2::new(95.0, 40.0)), vec![4]);

        let near = tool.triangles_near(&Aabb2::from_points(&Point2::new(50.0, 50.0), &Point2::new(60.0, 60.0)));
        assert_eq!(near, vec![4]);
        let near = tool.triangles_near(&Aabb2::from_points(&Point2::new(0.0, 0.0), &Point2::new(6.0, 6.0)));
        assert_eq!(near, vec![4, 7]);

        tool.delete(4);
        assert!(tool.overflow.is_empty());
        assert_eq!(tool.select(&Point2::new(2.0, 2.0)), vec![7]);
        assert_eq!(tool.len(), 1);
    }
}
