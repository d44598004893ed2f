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

use delaun2d::{DegreeOfFreedom, Edge, EdgeUse, GeometricFailure, MeshData, Point2, Vertex};

fn unit_square() -> (MeshData<f64>, [usize; 4], [EdgeUse; 5]) {
    let mut mesh = MeshData::new(1e-7);
    let v = [
        mesh.add_vertex(Vertex::free(0.0, 0.0), false),
        mesh.add_vertex(Vertex::free(1.0, 0.0), false),
        mesh.add_vertex(Vertex::free(1.0, 1.0), false),
        mesh.add_vertex(Vertex::free(0.0, 1.0), false),
    ];
    let e = [
        mesh.add_edge(Edge::free(v[0], v[1])),
        mesh.add_edge(Edge::free(v[1], v[2])),
        mesh.add_edge(Edge::free(v[2], v[3])),
        mesh.add_edge(Edge::free(v[3], v[0])),
        mesh.add_edge(Edge::free(v[0], v[2])),
    ];
    (mesh, v, e)
}

#[test]
fn test_duplicate_vertex_is_merged() {
    let mut mesh = MeshData::<f64>::new(1e-7);
    let a = mesh.add_vertex(Vertex::free(0.0, 0.0), false);
    let b = mesh.add_vertex(Vertex::free(0.0, 0.0), false);
    assert_eq!(a, b);
    assert_eq!(mesh.nb_vertices(), 1);

    let c = mesh.add_vertex(Vertex::free(5e-8, 0.0), false);
    assert_eq!(a, c);
    let d = mesh.add_vertex(Vertex::free(1e-3, 0.0), false);
    assert_ne!(a, d);
    assert_eq!(mesh.nb_vertices(), 2);
}

#[test]
fn test_merge_promotes_fixed() {
    let mut mesh = MeshData::<f64>::new(1e-7);
    let a = mesh.add_vertex(Vertex::free(1.0, 1.0), false);
    let b = mesh.add_vertex(Vertex::fixed(1.0, 1.0).with_location_3d(7), false);
    assert_eq!(a, b);
    assert_eq!(mesh.vertex(a).movability, DegreeOfFreedom::Fixed);
    assert_eq!(mesh.vertex(a).location_3d, Some(7));
}

#[test]
fn test_forced_vertex_is_not_merged() {
    let mut mesh = MeshData::<f64>::new(1e-7);
    let a = mesh.add_vertex(Vertex::free(0.0, 0.0), false);
    let b = mesh.add_vertex(Vertex::free(0.0, 0.0), true);
    assert_ne!(a, b);
    assert_eq!(mesh.find_vertex(&Point2::new(0.0, 0.0)), Some(a));
}

#[test]
fn test_edge_reuse_keeps_orientation() {
    let (mut mesh, v, e) = unit_square();
    let again = mesh.add_edge(Edge::free(v[1], v[0]));
    assert_eq!(again.edge, e[0].edge);
    assert!(!again.forward);
    assert_eq!(mesh.nb_edges(), 5);
    assert_eq!(mesh.find_edge(v[2], v[0]), Some(EdgeUse::new(e[4].edge, false)));
}

#[test]
fn test_triangles_and_adjacency() {
    let (mut mesh, _, e) = unit_square();
    let t0 = mesh.add_triangle([e[0], e[1], e[4].reversed()]).unwrap();
    let t1 = mesh.add_triangle([e[4], e[2], e[3]]).unwrap();
    assert_ne!(t0, t1);
    assert_eq!(mesh.nb_triangles(), 2);
    assert_eq!(mesh.triangles_connected_to(e[4].edge), &[t0, t1]);
    assert!(mesh.triangle_signed_area(t0) > 0.0);
    assert!((mesh.covered_area() - 1.0).abs() < 1e-15);

    // the same triangle again is not duplicated
    let again = mesh.add_triangle([e[1], e[4].reversed(), e[0]]).unwrap();
    assert_eq!(again, t0);
    assert_eq!(mesh.nb_triangles(), 2);
}

#[test]
fn test_broken_triangle_is_rejected() {
    let (mut mesh, _, e) = unit_square();
    let err = mesh.add_triangle([e[0], e[2], e[4]]).unwrap_err();
    assert!(matches!(err, GeometricFailure::BrokenTriangle(_)));
    assert_eq!(mesh.nb_triangles(), 0);
}

#[test]
fn test_removal_rules() {
    let (mut mesh, v, e) = unit_square();
    let t0 = mesh.add_triangle([e[0], e[1], e[4].reversed()]).unwrap();

    // used edge and connected vertex stay
    assert!(!mesh.remove_edge(e[0].edge, false));
    assert!(!mesh.remove_vertex(v[0], false));

    assert!(mesh.remove_triangle(t0));
    assert!(!mesh.remove_triangle(t0));
    assert!(mesh.get_triangle(t0).is_none());

    mesh.set_edge_movability(e[0].edge, DegreeOfFreedom::Frontier);
    assert!(!mesh.remove_edge(e[0].edge, false));
    assert!(mesh.remove_edge(e[0].edge, true));
    assert!(mesh.remove_edge(e[3].edge, false));
    assert!(mesh.remove_edge(e[4].edge, false));
    assert!(mesh.edges_connected_to(v[0]).is_empty());
    assert!(mesh.remove_vertex(v[0], false));
    assert_eq!(mesh.nb_vertices(), 3);
    assert!(mesh.find_edge(v[0], v[1]).is_none());
}

#[test]
fn test_reverse_edge_flips_uses() {
    let (mut mesh, _, e) = unit_square();
    let t0 = mesh.add_triangle([e[0], e[1], e[4].reversed()]).unwrap();
    mesh.reverse_edge(e[4].edge);
    assert_eq!(mesh.triangle(t0).orientation_of(e[4].edge), Some(true));
    assert_eq!(mesh.triangle_nodes(t0), mesh.triangle(t0).nodes);
    assert!(mesh.triangle_signed_area(t0) > 0.0);
}

#[test]
fn test_index_buffers_compact() {
    let (mut mesh, v, e) = unit_square();
    mesh.add_triangle([e[4], e[2], e[3]]).unwrap();
    mesh.remove_edge(e[0].edge, false);
    mesh.remove_edge(e[1].edge, false);
    mesh.remove_vertex(v[1], false);

    let buffers = mesh.index_buffers();
    assert_eq!(buffers.positions.len(), 3);
    assert_eq!(buffers.triangles.len(), 1);
    assert_eq!(buffers.edges.len(), 3);
    for tri in &buffers.triangles {
        assert!(tri.iter().all(|&i| i < buffers.positions.len()));
    }
}

#[test]
fn test_validate_report() {
    let (mut mesh, _, e) = unit_square();
    mesh.add_triangle([e[0], e[1], e[4].reversed()]).unwrap();
    mesh.add_triangle([e[4], e[2], e[3]]).unwrap();
    for u in &e[..4] {
        mesh.set_edge_movability(u.edge, DegreeOfFreedom::Frontier);
    }
    let report = mesh.validate();
    assert!(report.is_valid(), "{report}");
    assert_eq!(report.euler_characteristic(), 1);
    assert_eq!(report.frontier_edge_count, 4);
    assert_eq!(report.free_edge_count, 1);
    assert_eq!(mesh.delaunay_violations(1e-9), 0);
}
