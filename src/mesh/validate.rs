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

//! Structural and Delaunay checks over a [`MeshData`] store.

use crate::geometry::Point2;
use crate::kernel::{IntFlag, circumcircle, int_seg_seg};
use crate::mesh::basic_types::DegreeOfFreedom;
use crate::mesh::data_structure::MeshData;
use crate::numeric::scalar::Scalar;

/// Counts describing the health of a triangulation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshReport {
    /// Live vertices used by at least one edge.
    pub vertex_count: usize,
    /// Live vertices without any edge.
    pub isolated_vertex_count: usize,
    pub edge_count: usize,
    pub triangle_count: usize,

    pub free_edge_count: usize,
    pub fixed_edge_count: usize,
    pub frontier_edge_count: usize,

    /// Triangles whose signed area is not strictly positive.
    pub non_positive_triangle_count: usize,
    /// Edges whose incident triangles contradict their classification.
    pub adjacency_violation_count: usize,
    /// Live edges without any triangle.
    pub orphan_edge_count: usize,
}

impl MeshReport {
    /// `V - E + T` over connected vertices.
    pub fn euler_characteristic(&self) -> i64 {
        self.vertex_count as i64 - self.edge_count as i64 + self.triangle_count as i64
    }

    /// True when no structural issue was found.
    pub fn is_valid(&self) -> bool {
        self.non_positive_triangle_count == 0 && self.adjacency_violation_count == 0
    }
}

impl std::fmt::Display for MeshReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Triangulation Report:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(
            f,
            "  Edges: {} (free {}, fixed {}, frontier {})",
            self.edge_count, self.free_edge_count, self.fixed_edge_count, self.frontier_edge_count
        )?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;
        writeln!(f, "  Euler characteristic: {}", self.euler_characteristic())?;
        if !self.is_valid() {
            writeln!(f, "  Issues:")?;
            if self.non_positive_triangle_count > 0 {
                writeln!(f, "    Non-positive triangles: {}", self.non_positive_triangle_count)?;
            }
            if self.adjacency_violation_count > 0 {
                writeln!(f, "    Adjacency violations: {}", self.adjacency_violation_count)?;
            }
        }
        Ok(())
    }
}

impl<T: Scalar> MeshData<T> {
    /// Checks the store invariants:
    /// - every live triangle has strictly positive area,
    /// - a free edge in use has exactly two triangles, one on each side,
    /// - a fixed edge has at most one triangle on each side,
    /// - a frontier edge has at most one triangle, on its left.
    pub fn validate(&self) -> MeshReport {
        let mut report = MeshReport::default();

        for v in self.active_vertices() {
            if self.edges_connected_to(v).is_empty() {
                report.isolated_vertex_count += 1;
            } else {
                report.vertex_count += 1;
            }
        }

        for t in self.active_triangles() {
            report.triangle_count += 1;
            if !self.triangle_signed_area(t).is_positive() {
                report.non_positive_triangle_count += 1;
            }
        }

        for e in self.active_edges() {
            report.edge_count += 1;
            let edge = self.edge(e);
            let tris = self.triangles_connected_to(e);
            if tris.is_empty() {
                report.orphan_edge_count += 1;
            }

            let mut forward = 0usize;
            let mut backward = 0usize;
            for &t in tris {
                match self.triangle(t).orientation_of(e) {
                    Some(true) => forward += 1,
                    Some(false) => backward += 1,
                    None => {}
                }
            }

            let ok = match edge.movability {
                DegreeOfFreedom::Free => {
                    report.free_edge_count += 1;
                    tris.is_empty() || (forward == 1 && backward == 1)
                }
                DegreeOfFreedom::Fixed => {
                    report.fixed_edge_count += 1;
                    forward <= 1 && backward <= 1
                }
                DegreeOfFreedom::Frontier => {
                    report.frontier_edge_count += 1;
                    backward == 0 && forward <= 1
                }
                DegreeOfFreedom::Deleted => false,
            };
            if !ok {
                report.adjacency_violation_count += 1;
            }
        }

        report
    }

    /// Counts (triangle, vertex) pairs breaking the empty circumcircle rule.
    ///
    /// A vertex strictly inside the circumcircle of a triangle is tolerated
    /// when a fixed or frontier edge separates it from the triangle, which is
    /// the constrained Delaunay relaxation. `rel_tolerance` scales with the
    /// squared radius so near-cocircular vertices are not reported.
    pub fn delaunay_violations(&self, rel_tolerance: T) -> usize {
        let vertices: Vec<usize> = self
            .active_vertices()
            .filter(|&v| !self.edges_connected_to(v).is_empty())
            .collect();
        let constrained: Vec<(Point2<T>, Point2<T>)> = self
            .active_edges()
            .filter(|&e| self.edge(e).movability.is_constrained())
            .map(|e| {
                let edge = self.edge(e);
                (self.point(edge.first), self.point(edge.last))
            })
            .collect();

        let third = T::one() / T::lit(3.0);
        let mut violations = 0;
        for t in self.active_triangles() {
            let [a, b, c] = self.triangle_points(t);
            let Some(circle) = circumcircle(&a, &b, &c) else {
                continue;
            };
            let slack = rel_tolerance * circle.square_radius.max(T::one());
            let centroid = Point2::new((a.x + b.x + c.x) * third, (a.y + b.y + c.y) * third);
            let nodes = self.triangle_nodes(t);

            for &v in &vertices {
                if nodes.contains(&v) {
                    continue;
                }
                let p = self.point(v);
                if circle.power(&p) >= -slack {
                    continue;
                }
                let hidden = constrained.iter().any(|(s, e)| {
                    int_seg_seg(&centroid, &p, s, e, false, false, T::lit(1e-12)).flag
                        != IntFlag::NoIntersection
                });
                if !hidden {
                    violations += 1;
                }
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::edge::Edge;
    use crate::mesh::vertex::Vertex;

    #[test]
    fn test_report_single_triangle() {
        let mut mesh = MeshData::new(1e-7);
        let a = mesh.add_vertex(Vertex::free(0.0, 0.0), false);
        let b = mesh.add_vertex(Vertex::free(1.0, 0.0), false);
        let c = mesh.add_vertex(Vertex::free(0.0, 1.0), false);
        let ab = mesh.add_edge(Edge::new(a, b, DegreeOfFreedom::Frontier));
        let bc = mesh.add_edge(Edge::new(b, c, DegreeOfFreedom::Frontier));
        let ca = mesh.add_edge(Edge::new(c, a, DegreeOfFreedom::Frontier));
        mesh.add_triangle([ab, bc, ca]).unwrap();

        let report = mesh.validate();
        assert!(report.is_valid(), "{report}");
        assert_eq!(report.euler_characteristic(), 1);
        assert_eq!(report.frontier_edge_count, 3);
        assert_eq!(mesh.delaunay_violations(1e-9), 0);

        let text = format!("{report}");
        assert!(text.contains("  Edges: 3 (free 0, fixed 0, frontier 3)\n"));
        assert!(!text.contains("Issues"));
    }

    #[test]
    fn test_report_flags_free_boundary_edge() {
        let mut mesh = MeshData::new(1e-7);
        let a = mesh.add_vertex(Vertex::free(0.0, 0.0), false);
        let b = mesh.add_vertex(Vertex::free(1.0, 0.0), false);
        let c = mesh.add_vertex(Vertex::free(0.0, 1.0), false);
        let ab = mesh.add_edge(Edge::free(a, b));
        let bc = mesh.add_edge(Edge::new(b, c, DegreeOfFreedom::Frontier));
        let ca = mesh.add_edge(Edge::new(c, a, DegreeOfFreedom::Frontier));
        mesh.add_triangle([ab, bc, ca]).unwrap();

        let report = mesh.validate();
        assert_eq!(report.adjacency_violation_count, 1);
        assert!(!report.is_valid());
    }
}
