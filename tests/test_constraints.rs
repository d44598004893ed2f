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

use delaun2d::{
    DegreeOfFreedom, Delaun, DelaunParams, Edge, GeometricFailure, MeshData, Point2, Vertex,
};

/// Diamond whose Delaunay diagonal is the short one (1-3).
fn rhombus() -> Vec<Point2<f64>> {
    vec![
        Point2::new(-2.0, 0.0),
        Point2::new(0.0, -1.0),
        Point2::new(2.0, 0.0),
        Point2::new(0.0, 1.0),
    ]
}

fn rhombus_with_fixed_diagonal() -> Delaun<f64> {
    let mut mesh = MeshData::new(1e-7);
    let ids: Vec<usize> = rhombus()
        .into_iter()
        .map(|p| mesh.add_vertex(Vertex::from(p), false))
        .collect();
    mesh.add_edge(Edge::new(ids[0], ids[2], DegreeOfFreedom::Fixed));
    Delaun::from_mesh(mesh, &ids, DelaunParams::default()).unwrap()
}

/// Square `[0, 4]^2` with a square hole `[1, 3]^2`, both bounded by
/// frontier edges, two free vertices in the ring and one in the hole.
fn square_with_hole() -> Delaun<f64> {
    let mut mesh = MeshData::new(1e-7);
    let outer = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)];
    // clockwise, so the domain is on the left
    let inner = [(1.0, 1.0), (1.0, 3.0), (3.0, 3.0), (3.0, 1.0)];

    let mut ids = Vec::new();
    for ring in [&outer, &inner] {
        let ring_ids: Vec<usize> = ring
            .iter()
            .map(|&(x, y)| mesh.add_vertex(Vertex::fixed(x, y), false))
            .collect();
        for i in 0..ring_ids.len() {
            mesh.add_edge(Edge::new(
                ring_ids[i],
                ring_ids[(i + 1) % ring_ids.len()],
                DegreeOfFreedom::Frontier,
            ));
        }
        ids.extend(ring_ids);
    }
    for (x, y) in [(0.5, 2.0), (3.5, 2.0), (2.0, 2.0)] {
        ids.push(mesh.add_vertex(Vertex::free(x, y), false));
    }
    Delaun::from_mesh(mesh, &ids, DelaunParams::default()).unwrap()
}

#[test]
fn test_use_edge_then_again() {
    let mut d = Delaun::from_points(&rhombus()).unwrap();
    assert!(d.result().find_edge(0, 2).is_none());

    assert!(d.use_edge(0, 2));
    assert!(!d.use_edge(0, 2));
    assert!(!d.use_edge(2, 0));

    let e = d.result().find_edge(0, 2).unwrap().edge;
    assert_eq!(d.result().edge(e).movability, DegreeOfFreedom::Fixed);
    assert_eq!(d.result().triangles_connected_to(e).len(), 2);
    assert_eq!(d.result().nb_triangles(), 2);
    assert_eq!(d.result().nb_edges(), 5);
    assert_eq!(d.frontier().len(), 4);
    assert!(d.result().find_edge(1, 3).is_none());
    assert!(d.validate().is_valid());
    assert_eq!(d.nb_unresolved_constraints(), 0);
}

#[test]
fn test_use_edge_promotes_existing_edge() {
    let mut d = Delaun::from_points(&rhombus()).unwrap();
    let e = d.result().find_edge(1, 3).unwrap().edge;
    assert_eq!(d.result().edge(e).movability, DegreeOfFreedom::Free);
    assert_eq!(d.try_use_edge(1, 3), Ok(false));
    assert_eq!(d.result().edge(e).movability, DegreeOfFreedom::Fixed);
}

#[test]
fn test_fixed_edge_given_up_front() {
    let d = rhombus_with_fixed_diagonal();
    let e = d.result().find_edge(0, 2).unwrap().edge;
    assert_eq!(d.internal_edges().into_iter().collect::<Vec<_>>(), vec![e]);
    assert_eq!(d.result().triangles_connected_to(e).len(), 2);
    assert_eq!(d.result().nb_triangles(), 2);
    assert!((d.result().covered_area() - 4.0).abs() < 1e-12);
    // constrained Delaunay: vertices behind the fixed edge do not count
    assert_eq!(d.result().delaunay_violations(1e-9), 0);
}

#[test]
fn test_crossing_constraint_leaves_mesh_untouched() {
    let mut d = rhombus_with_fixed_diagonal();
    let before = d.result().index_buffers();
    let fixed = d.result().find_edge(0, 2).unwrap().edge;

    assert_eq!(
        d.try_use_edge(1, 3),
        Err(GeometricFailure::ConstraintsIntersect {
            first: 1,
            last: 3,
            crossed: fixed
        })
    );
    assert!(!d.use_edge(1, 3));
    assert_eq!(d.result().index_buffers(), before);
    assert_eq!(d.unresolved_constraints(), vec![(1, 3)]);
}

#[test]
fn test_constraint_through_vertex_is_rejected() {
    let pts = [
        Point2::new(0.0, 0.0),
        Point2::new(1.0, 0.0),
        Point2::new(2.0, 0.0),
        Point2::new(1.0, 1.0),
        Point2::new(1.0, -1.0),
    ];
    let mut d = Delaun::from_points(&pts).unwrap();
    let before = d.result().index_buffers();
    assert_eq!(
        d.try_use_edge(0, 2),
        Err(GeometricFailure::VertexOnEdge {
            first: 0,
            last: 2,
            vertex: 1
        })
    );
    assert_eq!(d.result().index_buffers(), before);
}

#[test]
fn test_use_edge_argument_errors() {
    let mut d = Delaun::from_points(&rhombus()).unwrap();
    assert_eq!(d.try_use_edge(0, 42), Err(GeometricFailure::UnknownVertex(42)));
    assert_eq!(d.try_use_edge(1, 1), Err(GeometricFailure::DegenerateEdge { first: 1, last: 1 }));
    assert!(!d.use_edge(0, 42));
    assert_eq!(d.nb_unresolved_constraints(), 1);
}

#[test]
fn test_frontier_with_hole() {
    let d = square_with_hole();
    let mesh = d.result();
    let report = d.validate();

    assert!(report.is_valid(), "{report}");
    assert_eq!(mesh.nb_triangles(), 12);
    assert!((mesh.covered_area() - 12.0).abs() < 1e-9);
    assert_eq!(d.frontier().len(), 8);
    assert!(d.unresolved_constraints().is_empty());

    for t in mesh.active_triangles() {
        let [a, b, c] = mesh.triangle_points(t);
        let (cx, cy) = ((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0);
        let in_hole = cx > 1.0 && cx < 3.0 && cy > 1.0 && cy < 3.0;
        assert!(!in_hole, "triangle {t} lies in the hole");
    }

    // the vertex inside the hole is kept but not connected
    let hole_vertex = mesh.find_vertex(&Point2::new(2.0, 2.0)).unwrap();
    assert!(mesh.edges_connected_to(hole_vertex).is_empty());
    assert_eq!(report.isolated_vertex_count, 1);
}

#[test]
fn test_frontier_edges_keep_domain_on_the_left() {
    let d = square_with_hole();
    for e in d.frontier() {
        let tris = d.result().triangles_connected_to(e);
        assert_eq!(tris.len(), 1);
        assert_eq!(d.result().triangle(tris[0]).orientation_of(e), Some(true));
    }
}

#[test]
fn test_remove_vertex() {
    let pts = [
        Point2::new(0.0, 0.0),
        Point2::new(1.0, 0.0),
        Point2::new(1.0, 1.0),
        Point2::new(0.0, 1.0),
        Point2::new(0.5, 0.5),
    ];
    let mut d = Delaun::from_points(&pts).unwrap();
    assert_eq!(d.result().nb_triangles(), 4);

    // boundary vertices are not removed
    assert!(!d.remove_vertex(0));
    assert_eq!(d.result().nb_triangles(), 4);

    assert!(d.remove_vertex(4));
    assert_eq!(d.result().nb_triangles(), 2);
    assert_eq!(d.result().nb_vertices(), 4);
    assert!((d.result().covered_area() - 1.0_f64).abs() < 1e-12);
    assert!(d.validate().is_valid());

    assert_eq!(d.try_remove_vertex(4), Err(GeometricFailure::UnknownVertex(4)));
    assert!(!d.remove_vertex(4));
}

#[test]
fn test_add_vertices() {
    let mut d =
        Delaun::from_points(&[Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 1.0), Point2::new(0.0, 1.0)])
            .unwrap();

    let added = d
        .add_vertices(&[Vertex::free(0.5, 0.5), Vertex::free(5.0, 5.0), Vertex::free(0.0, 0.0)])
        .unwrap();
    assert_eq!(added, vec![4, 5, 0]);

    let report = d.validate();
    assert!(report.is_valid(), "{report}");
    assert_eq!(report.triangle_count, 4);
    assert_eq!(report.isolated_vertex_count, 1);
    assert_eq!(d.frontier().len(), 4);
    assert_eq!(d.result().delaunay_violations(1e-9), 0);
}

#[test]
fn test_extend_existing_mesh() {
    let d = Delaun::from_points(&[Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 1.0), Point2::new(0.0, 1.0)])
        .unwrap();
    let mut mesh = d.into_result();
    let v = mesh.add_vertex(Vertex::free(0.5, 0.25), false);

    let extended = Delaun::from_mesh(mesh, &[v], DelaunParams::default()).unwrap();
    assert_eq!(extended.result().nb_triangles(), 4);
    assert!((extended.result().covered_area() - 1.0_f64).abs() < 1e-12);
    assert!(extended.validate().is_valid());
}

#[test]
fn test_fixed_edge_survives_insertion() {
    let mut d = rhombus_with_fixed_diagonal();
    let e = d.result().find_edge(0, 2).unwrap().edge;
    d.add_vertices(&[Vertex::free(0.0, 0.5), Vertex::free(0.5, -0.4)]).unwrap();

    assert_eq!(d.result().edge(e).movability, DegreeOfFreedom::Fixed);
    assert_eq!(d.result().triangles_connected_to(e).len(), 2);
    assert!(d.validate().is_valid());
    assert!((d.result().covered_area() - 4.0).abs() < 1e-9);
}
