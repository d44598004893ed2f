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

//! Boundary walks and polygon decomposition.
//!
//! A polygon is a closed chain of edge uses with its interior on the left.
//! [`Delaun::mesh_left_polygon_of`] finds the polygon lying on the left of an
//! edge by walking the mesh graph, clears whatever is inside it and fills it
//! again with triangles.

use std::collections::BTreeSet;

use ahash::AHashSet;
use smallvec::SmallVec;
use tracing::trace;

use crate::error::{DelaunResult, GeometricFailure};
use crate::geometry::{Aabb2, Point2, Vector2};
use crate::kernel::{
    IntFlag, TrianglePoint, int_seg_seg, point_in_or_on_triangle, point_in_polygon, polygon_signed_area,
};
use crate::mesh::{DegreeOfFreedom, Edge, EdgeUse};
use crate::numeric::scalar::Scalar;

use super::delaunay::{Delaun, LoopEdges};

/// Tolerance on angles, in radians.
const ANGULAR_TOLERANCE: f64 = 1e-12;

/// Closed chain of edge uses and the bounding box of each link.
#[derive(Clone, Debug, Default)]
pub(super) struct Polygon<T: Scalar> {
    uses: Vec<EdgeUse>,
    boxes: Vec<Aabb2<T>>,
}

impl<T: Scalar> Polygon<T> {
    fn push(&mut self, link: EdgeUse, bbox: Aabb2<T>) {
        self.uses.push(link);
        self.boxes.push(bbox);
    }

    fn pop(&mut self) -> Option<EdgeUse> {
        self.boxes.pop();
        self.uses.pop()
    }

    #[inline]
    fn len(&self) -> usize {
        self.uses.len()
    }

    fn last(&self) -> Option<EdgeUse> {
        self.uses.last().copied()
    }

    fn base_edge(&self) -> usize {
        self.uses.first().map_or(usize::MAX, |u| u.edge)
    }
}

struct NextLink<T: Scalar> {
    link: EdgeUse,
    node: usize,
    dir: Vector2<T>,
    bbox: Aabb2<T>,
}

impl<T: Scalar> Delaun<T> {
    fn link_box(&self, a: usize, b: usize) -> Aabb2<T> {
        let mut bbox = Aabb2::from_points(&self.point(a), &self.point(b));
        bbox.enlarge(self.precision);
        bbox
    }

    fn polygon_nodes(&self, polygon: &Polygon<T>) -> Vec<usize> {
        polygon
            .uses
            .iter()
            .map(|u| self.mesh.edge(u.edge).oriented(u.forward).0)
            .collect()
    }

    /// Finds the polygon on the left of `edge` (taken forward or backward),
    /// removes the triangles inside it and triangulates it.
    pub(super) fn mesh_left_polygon_of(&mut self, edge: usize, forward: bool) -> DelaunResult<()> {
        let start = *self.mesh.edge(edge);
        if start.is_deleted() {
            return Err(GeometricFailure::OpenPolygon(edge));
        }

        let (first_node, mut pivot) = start.oriented(forward);
        let mut ref_dir = self.point(pivot) - self.point(first_node);
        if ref_dir.square_modulus() < self.precision * self.precision {
            return Ok(());
        }

        let mut polygon = Polygon::default();
        polygon.push(EdgeUse::new(edge, forward), self.link_box(first_node, pivot));

        let mut dead: AHashSet<usize> = AHashSet::default();
        let mut leprous: AHashSet<usize> = AHashSet::default();
        leprous.insert(edge);
        let mut skip_leprous = true;

        let limit = (self.mesh.nb_edges() + 1).saturating_mul(self.mesh.nb_vertices() + 1);
        let mut steps = 0usize;
        while pivot != first_node {
            steps += 1;
            if steps > limit {
                return Err(GeometricFailure::OpenPolygon(edge));
            }

            let next = self.find_next_polygon_link(
                first_node,
                pivot,
                &ref_dir,
                &polygon,
                skip_leprous,
                &mut leprous,
                &mut dead,
            );
            match next {
                Some(next) => {
                    ref_dir = next.dir;
                    pivot = next.node;
                    polygon.push(next.link, next.bbox);
                    skip_leprous = true;
                }
                None => {
                    // dead end: drop the last link and look again from its start
                    if polygon.len() == 1 {
                        return Err(GeometricFailure::OpenPolygon(edge));
                    }
                    if let Some(back) = polygon.pop() {
                        dead.insert(back.edge);
                        leprous.remove(&back.edge);
                    }
                    let Some(last) = polygon.last() else {
                        return Err(GeometricFailure::OpenPolygon(edge));
                    };
                    let (s, e) = self.mesh.edge(last.edge).oriented(last.forward);
                    pivot = e;
                    ref_dir = self.point(e) - self.point(s);
                    skip_leprous = false;
                }
            }
        }

        if polygon.len() < 3 {
            return Err(GeometricFailure::OpenPolygon(edge));
        }
        let ring: Vec<Point2<T>> = self.polygon_nodes(&polygon).into_iter().map(|v| self.point(v)).collect();
        if !polygon_signed_area(&ring).is_positive() {
            return Err(GeometricFailure::OpenPolygon(edge));
        }
        self.check_simple(&polygon)?;

        trace!(edge, forward, links = polygon.len(), "left polygon found");
        self.cleanup_polygon(&polygon, &ring);
        self.decompose_polygon(polygon)
    }

    /// Picks the link leaving `pivot` that turns most to the left of
    /// `ref_dir` without crossing the polygon built so far.
    #[allow(clippy::too_many_arguments)]
    fn find_next_polygon_link(
        &self,
        first_node: usize,
        pivot: usize,
        ref_dir: &Vector2<T>,
        polygon: &Polygon<T>,
        skip_leprous: bool,
        leprous: &mut AHashSet<usize>,
        dead: &mut AHashSet<usize>,
    ) -> Option<NextLink<T>> {
        let pivot_pt = self.point(pivot);
        let mut max_angle = T::neg_infinity();
        let mut best = None;

        for &e in self.mesh.edges_connected_to(pivot) {
            if dead.contains(&e) {
                continue;
            }
            let is_leprous = leprous.contains(&e);
            if skip_leprous && is_leprous {
                continue;
            }

            let link = *self.mesh.edge(e);
            if link.movability == DegreeOfFreedom::Free && self.mesh.triangles_connected_to(e).is_empty() {
                dead.insert(e);
                continue;
            }

            let other = link.other(pivot);
            let cur_dir = self.point(other) - pivot_pt;
            if cur_dir.square_modulus() < self.precision * self.precision {
                dead.insert(e);
                continue;
            }
            if !is_leprous {
                leprous.insert(e);
            }

            let mut angle = ref_dir.angle(&cur_dir);
            let mut check_point_on_edge = true;
            if link.movability == DegreeOfFreedom::Frontier
                && (angle.abs() - T::PI()).abs() < T::lit(ANGULAR_TOLERANCE)
            {
                // glued frontier links
                check_point_on_edge = false;
                angle = angle.abs();
            }
            if angle <= max_angle {
                continue;
            }

            let check_end_points = other != first_node;
            let bbox = self.link_box(pivot, other);
            if self.check_intersection(&link, polygon, &bbox, check_end_points, check_point_on_edge, true) {
                max_angle = angle;
                best = Some(NextLink {
                    link: EdgeUse::new(e, link.first == pivot),
                    node: other,
                    dir: cur_dir,
                    bbox,
                });
            }
        }
        best
    }

    /// True when `link` does not intersect any link of `polygon`.
    fn check_intersection(
        &self,
        link: &Edge,
        polygon: &Polygon<T>,
        bbox: &Aabb2<T>,
        consider_end_touch: bool,
        consider_point_on_edge: bool,
        skip_last: bool,
    ) -> bool {
        let n = if skip_last { polygon.len().saturating_sub(1) } else { polygon.len() };
        let is_frontier = link.movability == DegreeOfFreedom::Frontier;
        let (s1, e1) = (self.point(link.first), self.point(link.last));

        for i in 0..n {
            if bbox.is_out(&polygon.boxes[i]) {
                continue;
            }
            let other = self.mesh.edge(polygon.uses[i].edge);
            if is_frontier && other.movability == DegreeOfFreedom::Frontier {
                continue;
            }
            let hit = int_seg_seg(
                &s1,
                &e1,
                &self.point(other.first),
                &self.point(other.last),
                consider_end_touch,
                consider_point_on_edge,
                self.precision,
            );
            if hit.flag != IntFlag::NoIntersection {
                return false;
            }
        }
        true
    }

    /// Fails when two non-adjacent links of `polygon` touch or cross.
    fn check_simple(&self, polygon: &Polygon<T>) -> DelaunResult<()> {
        let n = polygon.len();
        for i in 0..n {
            let a = self.mesh.edge(polygon.uses[i].edge);
            let (sa, ea) = (self.point(a.first), self.point(a.last));
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                if polygon.boxes[i].is_out(&polygon.boxes[j]) {
                    continue;
                }
                let b = self.mesh.edge(polygon.uses[j].edge);
                let hit = int_seg_seg(
                    &sa,
                    &ea,
                    &self.point(b.first),
                    &self.point(b.last),
                    false,
                    true,
                    self.precision,
                );
                if hit.flag != IntFlag::NoIntersection {
                    return Err(GeometricFailure::SelfIntersectingPolygon(polygon.base_edge()));
                }
            }
        }
        Ok(())
    }

    /// Deletes every triangle inside `polygon` or crossing one of its links.
    /// Polygon links are kept; other free edges left unused are removed.
    fn cleanup_polygon(&mut self, polygon: &Polygon<T>, ring: &[Point2<T>]) {
        let links: BTreeSet<usize> = polygon.uses.iter().map(|u| u.edge).collect();
        let mut loop_edges = LoopEdges::new();
        let mut front: Vec<usize> = Vec::new();

        for u in &polygon.uses {
            let inner: SmallVec<[usize; 2]> = self
                .mesh
                .triangles_connected_to(u.edge)
                .iter()
                .copied()
                .filter(|&t| self.mesh.triangle(t).orientation_of(u.edge) == Some(u.forward))
                .collect();
            for t in inner {
                self.kill_triangle(t, &links, &mut loop_edges, &mut front);
            }
        }

        self.kill_triangles_on_intersecting_links(polygon, ring, &links, &mut loop_edges, front);
        self.remove_hanging_edges(&loop_edges, Some(&links));
    }

    fn kill_triangle(
        &mut self,
        triangle: usize,
        links: &BTreeSet<usize>,
        loop_edges: &mut LoopEdges,
        front: &mut Vec<usize>,
    ) {
        if self.mesh.triangle(triangle).is_deleted() {
            return;
        }
        front.extend(
            self.mesh
                .triangle(triangle)
                .edges
                .iter()
                .copied()
                .filter(|e| !links.contains(e)),
        );
        self.delete_triangle_keeping(triangle, loop_edges, Some(links));
    }

    /// Floods from the edges in `front` into the triangles that overlap the
    /// polygon interior.
    fn kill_triangles_on_intersecting_links(
        &mut self,
        polygon: &Polygon<T>,
        ring: &[Point2<T>],
        links: &BTreeSet<usize>,
        loop_edges: &mut LoopEdges,
        mut front: Vec<usize>,
    ) {
        while let Some(e) = front.pop() {
            let around: SmallVec<[usize; 2]> = SmallVec::from_slice(self.mesh.triangles_connected_to(e));
            for t in around {
                if self.triangle_meets_polygon(t, polygon, ring) {
                    self.kill_triangle(t, links, loop_edges, &mut front);
                }
            }
        }
    }

    fn triangle_meets_polygon(&self, triangle: usize, polygon: &Polygon<T>, ring: &[Point2<T>]) -> bool {
        let pts = self.mesh.triangle_points(triangle);
        let third = T::lit(3.0);
        let centroid = Point2::new(
            (pts[0].x + pts[1].x + pts[2].x) / third,
            (pts[0].y + pts[1].y + pts[2].y) / third,
        );
        if point_in_polygon(&centroid, ring) {
            return true;
        }

        for i in 0..3 {
            let (p, q) = (pts[i], pts[(i + 1) % 3]);
            let mut bbox = Aabb2::from_points(&p, &q);
            bbox.enlarge(self.precision);
            for (k, u) in polygon.uses.iter().enumerate() {
                if bbox.is_out(&polygon.boxes[k]) {
                    continue;
                }
                let link = self.mesh.edge(u.edge);
                let hit = int_seg_seg(
                    &p,
                    &q,
                    &self.point(link.first),
                    &self.point(link.last),
                    false,
                    false,
                    self.precision,
                );
                if hit.flag == IntFlag::Cross {
                    return true;
                }
            }
        }
        false
    }

    /// Triangulates a closed chain of edge uses whose inside is free of
    /// triangles.
    pub(super) fn mesh_polygon(&mut self, uses: Vec<EdgeUse>) -> DelaunResult<()> {
        let mut polygon = Polygon::default();
        for u in uses {
            let (s, e) = self.mesh.edge(u.edge).oriented(u.forward);
            polygon.push(u, self.link_box(s, e));
        }
        if polygon.len() < 3 {
            return Err(GeometricFailure::OpenPolygon(polygon.base_edge()));
        }
        self.check_simple(&polygon)?;
        self.decompose_polygon(polygon)
    }

    fn decompose_polygon(&mut self, polygon: Polygon<T>) -> DelaunResult<()> {
        let mut stack = vec![polygon];
        while let Some(poly) = stack.pop() {
            self.decompose_simple_polygon(poly, &mut stack)?;
        }
        Ok(())
    }

    /// Cuts one triangle off `poly` on its first link and pushes the
    /// remaining sub-polygons onto `stack`.
    ///
    /// The apex is the polygon vertex strictly left of the first link seeing
    /// it under the widest angle, such that both new diagonals stay inside
    /// the polygon. Ties go to the vertex closest to the link.
    fn decompose_simple_polygon(&mut self, poly: Polygon<T>, stack: &mut Vec<Polygon<T>>) -> DelaunResult<()> {
        let n = poly.len();
        if n < 3 {
            return Err(GeometricFailure::OpenPolygon(poly.base_edge()));
        }
        if n == 3 {
            return self.mesh_elementary_polygon(&poly);
        }

        let base = poly.uses[0];
        let (n0, n1) = self.mesh.edge(base.edge).oriented(base.forward);
        let (p0, p1) = (self.point(n0), self.point(n1));
        let ref_dir = p1 - p0;
        let len = ref_dir.modulus();
        if len < self.precision {
            return Err(GeometricFailure::DegenerateEdge { first: n0, last: n1 });
        }
        let dir = ref_dir / len;
        let nodes = self.polygon_nodes(&poly);
        let angular = T::lit(ANGULAR_TOLERANCE);

        let mut best: Option<(usize, T, T)> = None;
        for (k, &apex) in nodes.iter().enumerate().skip(2) {
            if apex == n0 || apex == n1 {
                continue;
            }
            let pc = self.point(apex);
            let dist = dir.cross(&(pc - p0));
            if dist < self.precision {
                continue;
            }
            let angle = (p0 - pc).angle(&(p1 - pc)).abs();
            if let Some((_, best_angle, best_dist)) = best {
                if angle < best_angle - angular || (angle <= best_angle + angular && dist >= best_dist) {
                    continue;
                }
            }
            if !self.is_valid_apex(&poly, &nodes, n0, n1, apex) {
                continue;
            }
            best = Some((k, angle, dist));
        }

        let Some((k, _, _)) = best else {
            return Err(GeometricFailure::NoValidDiagonal(base.edge));
        };
        let apex = nodes[k];

        let to_apex = self.mesh.add_edge(Edge::free(n1, apex));
        let from_apex = self.mesh.add_edge(Edge::free(apex, n0));
        if self.add_triangle([base, to_apex, from_apex])?.is_none() {
            return Err(GeometricFailure::DegenerateTriangle([n0, n1, apex]));
        }

        if !(k == 2 && poly.uses[1].edge == to_apex.edge) {
            let mut part = Polygon::default();
            part.push(to_apex.reversed(), self.link_box(apex, n1));
            for i in 1..k {
                part.push(poly.uses[i], poly.boxes[i]);
            }
            stack.push(part);
        }
        if !(k == n - 1 && poly.uses[n - 1].edge == from_apex.edge) {
            let mut part = Polygon::default();
            part.push(from_apex.reversed(), self.link_box(n0, apex));
            for i in k..n {
                part.push(poly.uses[i], poly.boxes[i]);
            }
            stack.push(part);
        }
        Ok(())
    }

    /// Both diagonals of the candidate triangle `n0 n1 apex` avoid the
    /// polygon links, and no other polygon vertex lies inside it.
    fn is_valid_apex(&self, poly: &Polygon<T>, nodes: &[usize], n0: usize, n1: usize, apex: usize) -> bool {
        for (a, b) in [(n1, apex), (apex, n0)] {
            let (pa, pb) = (self.point(a), self.point(b));
            let bbox = self.link_box(a, b);
            let key = (a.min(b), a.max(b));
            for (i, u) in poly.uses.iter().enumerate() {
                if bbox.is_out(&poly.boxes[i]) {
                    continue;
                }
                let link = self.mesh.edge(u.edge);
                if link.key() == key {
                    continue;
                }
                let hit = int_seg_seg(
                    &pa,
                    &pb,
                    &self.point(link.first),
                    &self.point(link.last),
                    false,
                    true,
                    self.precision,
                );
                if hit.flag != IntFlag::NoIntersection {
                    return false;
                }
            }
        }

        let (p0, p1, pc) = (self.point(n0), self.point(n1), self.point(apex));
        nodes.iter().all(|&v| {
            v == n0
                || v == n1
                || v == apex
                || point_in_or_on_triangle(&self.point(v), &p0, &p1, &pc, self.precision) != TrianglePoint::In
        })
    }

    fn mesh_elementary_polygon(&mut self, poly: &Polygon<T>) -> DelaunResult<()> {
        let nodes = self.polygon_nodes(poly);
        let nodes = [nodes[0], nodes[1], nodes[2]];
        let [a, b, c] = nodes.map(|v| self.point(v));
        let base = (b - a).modulus();
        if base < self.precision || !((b - a).cross(&(c - a)) / base > self.precision) {
            return Err(GeometricFailure::DegenerateTriangle(nodes));
        }
        match self.add_triangle([poly.uses[0], poly.uses[1], poly.uses[2]])? {
            Some(_) => Ok(()),
            None => Err(GeometricFailure::DegenerateTriangle(nodes)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::GeometricFailure;
    use crate::geometry::Point2;
    use crate::mesh::{DegreeOfFreedom, Edge, MeshData, Vertex};
    use crate::operations::triangulation::{Delaun, DelaunParams};

    #[test]
    fn test_fixed_edge_through_strip() {
        // two rows of points; the diagonal 0-7 crosses several Delaunay edges
        let mut pts = Vec::new();
        for i in 0..4 {
            pts.push(Point2::new(i as f64, 0.0));
        }
        for i in 0..4 {
            pts.push(Point2::new(i as f64 + 0.1, 1.0));
        }
        let mut d = Delaun::from_points(&pts).unwrap();
        let area = d.result().covered_area();

        assert!(d.use_edge(0, 7));
        let e = d.result().find_edge(0, 7).unwrap().edge;
        assert_eq!(d.result().edge(e).movability, DegreeOfFreedom::Fixed);
        assert_eq!(d.result().triangles_connected_to(e).len(), 2);
        assert!((d.result().covered_area() - area).abs() < 1e-9);
        assert!(d.validate().is_valid());
    }

    #[test]
    fn test_frontier_square_cuts_outside() {
        let mut mesh = MeshData::new(1e-7);
        let corners = [(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)];
        let mut ids: Vec<usize> = corners
            .iter()
            .map(|&(x, y)| mesh.add_vertex(Vertex::fixed(x, y), false))
            .collect();
        for i in 0..4 {
            mesh.add_edge(Edge::new(ids[i], ids[(i + 1) % 4], DegreeOfFreedom::Frontier));
        }
        // points outside the frontier
        ids.push(mesh.add_vertex(Vertex::free(3.0, 1.0), false));
        ids.push(mesh.add_vertex(Vertex::free(1.0, 1.0), false));

        let d = Delaun::from_mesh(mesh, &ids, DelaunParams::default()).unwrap();
        assert_eq!(d.result().nb_triangles(), 4);
        assert!((d.result().covered_area() - 4.0_f64).abs() < 1e-12);
        assert_eq!(d.frontier().len(), 4);
    }

    #[test]
    fn test_bowtie_polygon_is_rejected() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        let mut d = Delaun::from_points(&pts).unwrap();
        let triangles = d.result().nb_triangles();

        // 0 -> 2 -> 1 -> 3 -> 0 crosses itself in the middle
        let uses = vec![
            d.mesh.add_edge(Edge::free(0, 2)),
            d.mesh.add_edge(Edge::free(2, 1)),
            d.mesh.add_edge(Edge::free(1, 3)),
            d.mesh.add_edge(Edge::free(3, 0)),
        ];
        let base = uses[0].edge;
        assert_eq!(d.mesh_polygon(uses), Err(GeometricFailure::SelfIntersectingPolygon(base)));
        assert_eq!(d.result().nb_triangles(), triangles);
    }

    /// Concave pentagon whose notch vertex (2, 1) sees the chord 2-4 from
    /// outside the domain.
    fn notched_pentagon() -> Delaun<f64> {
        let mut mesh = MeshData::new(1e-7);
        let corners = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (2.0, 1.0), (0.0, 4.0)];
        let ids: Vec<usize> = corners
            .iter()
            .map(|&(x, y)| mesh.add_vertex(Vertex::fixed(x, y), false))
            .collect();
        for i in 0..5 {
            mesh.add_edge(Edge::new(ids[i], ids[(i + 1) % 5], DegreeOfFreedom::Frontier));
        }
        Delaun::from_mesh(mesh, &ids, DelaunParams::default()).unwrap()
    }

    #[test]
    fn test_failed_constraint_rolls_back_partial_work() {
        let mut d = notched_pentagon();
        assert_eq!(d.result().nb_triangles(), 3);
        assert!((d.result().covered_area() - 10.0).abs() < 1e-12);
        let before = d.result().index_buffers();
        let circles = d.circles.len();

        // the chord passes every crossing check but meshing its sides
        // triangulates outside the frontier
        assert!(d.try_use_edge(2, 4).is_err());
        assert_eq!(d.result().index_buffers(), before);
        assert!(d.result().find_edge(2, 4).is_none());
        assert_eq!(d.circles.len(), circles);
        for t in d.result().active_triangles() {
            assert!(d.circles.circle(t).is_some());
        }

        assert!(!d.use_edge(2, 4));
        assert_eq!(d.unresolved_constraints(), vec![(2, 4)]);
        assert!(d.validate().is_valid());
    }
}
