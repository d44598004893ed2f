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

use std::collections::BTreeSet;

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::error::{DelaunResult, GeometricFailure};
use crate::geometry::Point2;
use crate::kernel::orient2d;
use crate::mesh::basic_types::{DegreeOfFreedom, EdgeUse, IndexBuffers};
use crate::mesh::edge::Edge;
use crate::mesh::spatial_hash::VertexTool;
use crate::mesh::triangle::Triangle;
use crate::mesh::vertex::Vertex;
use crate::numeric::scalar::Scalar;

/// Inverse of one store mutation, recorded while a checkpoint is open.
#[derive(Clone, Copy, Debug)]
enum Undo<T: Scalar> {
    VertexAdded { index: usize, hashed: bool },
    VertexChanged { index: usize, previous: Vertex<T> },
    VertexRemoved { index: usize, previous: DegreeOfFreedom, hashed: bool },
    EdgeAdded(usize),
    EdgeRemoved { index: usize, previous: DegreeOfFreedom, slots: [usize; 2] },
    EdgeMovability { index: usize, previous: DegreeOfFreedom },
    EdgeReversed(usize),
    TriangleAdded(usize),
    TriangleRemoved { index: usize, previous: DegreeOfFreedom, slots: [usize; 3] },
}

/// Indexed store of vertices, edges and triangles.
///
/// Records are appended and never moved: an index handed out by one of the
/// `add_*` methods stays valid (possibly pointing at a `Deleted` record) for
/// the lifetime of the store. The store maintains vertex -> edges and
/// edge -> triangles adjacency and is the only place where topology is
/// created or destroyed.
///
/// Indexing accessors (`vertex`, `edge`, `triangle`, ...) expect indices that
/// were returned by the store; the `get_*` variants are the checked ones.
///
/// Between [`MeshData::checkpoint`] and [`MeshData::commit`] every mutation
/// is journaled, and [`MeshData::rollback`] restores the store exactly,
/// adjacency order included.
#[derive(Clone, Debug)]
pub struct MeshData<T: Scalar> {
    vertices: Vec<Vertex<T>>,
    edges: Vec<Edge>,
    triangles: Vec<Triangle>,

    vertex_edges: Vec<SmallVec<[usize; 8]>>,
    edge_triangles: Vec<SmallVec<[usize; 2]>>,
    edge_lookup: AHashMap<(usize, usize), usize>,
    vertex_tool: VertexTool<T>,
    constrained: BTreeSet<usize>,
    journal: Option<Vec<Undo<T>>>,

    nb_vertices: usize,
    nb_edges: usize,
    nb_triangles: usize,
}

impl<T: Scalar> Default for MeshData<T> {
    fn default() -> Self {
        Self::new(T::lit(1e-7))
    }
}

impl<T: Scalar> MeshData<T> {
    pub fn new(merge_tolerance: T) -> Self {
        MeshData {
            vertices: Vec::new(),
            edges: Vec::new(),
            triangles: Vec::new(),
            vertex_edges: Vec::new(),
            edge_triangles: Vec::new(),
            edge_lookup: AHashMap::default(),
            vertex_tool: VertexTool::new(merge_tolerance),
            constrained: BTreeSet::new(),
            journal: None,
            nb_vertices: 0,
            nb_edges: 0,
            nb_triangles: 0,
        }
    }

    #[inline]
    pub fn merge_tolerance(&self) -> T {
        self.vertex_tool.tolerance()
    }

    // ---------------------------------------------------------------------
    // Journal
    // ---------------------------------------------------------------------

    /// Starts journaling mutations, dropping any journal still open.
    pub fn checkpoint(&mut self) {
        self.journal = Some(Vec::new());
    }

    /// Stops journaling and keeps every change made since `checkpoint`.
    pub fn commit(&mut self) {
        self.journal = None;
    }

    #[inline]
    pub fn is_journaling(&self) -> bool {
        self.journal.is_some()
    }

    #[inline]
    fn record(&mut self, undo: Undo<T>) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(undo);
        }
    }

    /// Triangles added or removed since `checkpoint`.
    pub fn journal_triangles(&self) -> BTreeSet<usize> {
        self.journal
            .iter()
            .flatten()
            .filter_map(|undo| match *undo {
                Undo::TriangleAdded(t) | Undo::TriangleRemoved { index: t, .. } => Some(t),
                _ => None,
            })
            .collect()
    }

    /// Live edges created or bounding a triangle added or removed since
    /// `checkpoint`.
    pub fn journal_edges(&self) -> BTreeSet<usize> {
        let mut out = BTreeSet::new();
        for undo in self.journal.iter().flatten() {
            match *undo {
                Undo::EdgeAdded(e) => {
                    out.insert(e);
                }
                Undo::TriangleAdded(t) | Undo::TriangleRemoved { index: t, .. } => {
                    out.extend(self.triangles[t].edges);
                }
                _ => {}
            }
        }
        out.retain(|&e| !self.edges[e].is_deleted());
        out
    }

    /// Signed areas `(added, removed)` of the triangles added and removed
    /// since `checkpoint`. A triangle both added and removed counts on both
    /// sides.
    pub fn journal_areas(&self) -> (T, T) {
        let mut added = T::zero();
        let mut removed = T::zero();
        for undo in self.journal.iter().flatten() {
            match *undo {
                Undo::TriangleAdded(t) => added = added + self.triangle_signed_area(t),
                Undo::TriangleRemoved { index, .. } => removed = removed + self.triangle_signed_area(index),
                _ => {}
            }
        }
        (added, removed)
    }

    /// Undoes every mutation since `checkpoint`, newest first, and stops
    /// journaling. Does nothing without an open checkpoint.
    pub fn rollback(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };
        for undo in journal.into_iter().rev() {
            match undo {
                Undo::VertexAdded { index, hashed } => {
                    debug_assert_eq!(index + 1, self.vertices.len());
                    let v = self.vertices.pop();
                    self.vertex_edges.pop();
                    if let (true, Some(v)) = (hashed, v) {
                        self.vertex_tool.remove(index, &v.coord);
                    }
                    self.nb_vertices -= 1;
                }
                Undo::VertexChanged { index, previous } => {
                    self.vertices[index] = previous;
                }
                Undo::VertexRemoved { index, previous, hashed } => {
                    self.vertices[index].movability = previous;
                    if hashed {
                        self.vertex_tool.insert(index, self.vertices[index].coord);
                    }
                    self.nb_vertices += 1;
                }
                Undo::EdgeAdded(index) => {
                    debug_assert_eq!(index + 1, self.edges.len());
                    let e = self.edges[index];
                    self.edge_lookup.remove(&e.key());
                    for node in [e.first, e.last] {
                        self.vertex_edges[node].retain(|x| *x != index);
                    }
                    self.edges.pop();
                    self.edge_triangles.pop();
                    self.constrained.remove(&index);
                    self.nb_edges -= 1;
                }
                Undo::EdgeRemoved { index, previous, slots } => {
                    self.edges[index].movability = previous;
                    let e = self.edges[index];
                    self.edge_lookup.insert(e.key(), index);
                    for (node, slot) in [e.first, e.last].into_iter().zip(slots) {
                        let list = &mut self.vertex_edges[node];
                        list.insert(slot.min(list.len()), index);
                    }
                    self.sync_constrained(index);
                    self.nb_edges += 1;
                }
                Undo::EdgeMovability { index, previous } => {
                    self.edges[index].movability = previous;
                    self.sync_constrained(index);
                }
                Undo::EdgeReversed(index) => self.flip_edge(index),
                Undo::TriangleAdded(index) => {
                    debug_assert_eq!(index + 1, self.triangles.len());
                    for e in self.triangles[index].edges {
                        self.edge_triangles[e].retain(|x| *x != index);
                    }
                    self.triangles.pop();
                    self.nb_triangles -= 1;
                }
                Undo::TriangleRemoved { index, previous, slots } => {
                    self.triangles[index].movability = previous;
                    for (e, slot) in self.triangles[index].edges.into_iter().zip(slots) {
                        let list = &mut self.edge_triangles[e];
                        list.insert(slot.min(list.len()), index);
                    }
                    self.nb_triangles += 1;
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // Vertices
    // ---------------------------------------------------------------------

    /// Adds a vertex, or returns the index of a live vertex lying within the
    /// merge tolerance. `is_forced` skips merging and keeps the vertex out of
    /// the merge grid (used for auxiliary vertices).
    pub fn add_vertex(&mut self, mut vertex: Vertex<T>, is_forced: bool) -> usize {
        if vertex.is_deleted() {
            vertex.movability = DegreeOfFreedom::Free;
        }

        if !is_forced {
            if let Some(existing) = self.vertex_tool.find(&vertex.coord) {
                let previous = self.vertices[existing];
                self.record(Undo::VertexChanged { index: existing, previous });
                if vertex.movability == DegreeOfFreedom::Fixed {
                    self.vertices[existing].movability = DegreeOfFreedom::Fixed;
                }
                if self.vertices[existing].location_3d.is_none() {
                    self.vertices[existing].location_3d = vertex.location_3d;
                }
                return existing;
            }
        }

        let index = self.vertices.len();
        self.vertices.push(vertex);
        self.vertex_edges.push(SmallVec::new());
        if !is_forced {
            self.vertex_tool.insert(index, vertex.coord);
        }
        self.record(Undo::VertexAdded { index, hashed: !is_forced });
        self.nb_vertices += 1;
        index
    }

    #[inline]
    pub fn vertex(&self, index: usize) -> &Vertex<T> {
        &self.vertices[index]
    }

    #[inline]
    pub fn point(&self, index: usize) -> Point2<T> {
        self.vertices[index].coord
    }

    pub fn get_vertex(&self, index: usize) -> Option<&Vertex<T>> {
        self.vertices.get(index).filter(|v| !v.is_deleted())
    }

    /// Number of live vertices.
    #[inline]
    pub fn nb_vertices(&self) -> usize {
        self.nb_vertices
    }

    pub fn find_vertex(&self, p: &Point2<T>) -> Option<usize> {
        self.vertex_tool.find(p)
    }

    /// Removes a vertex without edges. Only free vertices are removed unless
    /// `force` is set.
    pub fn remove_vertex(&mut self, index: usize, force: bool) -> bool {
        let v = self.vertices[index];
        if v.is_deleted() || !self.vertex_edges[index].is_empty() {
            return false;
        }
        if !force && v.movability != DegreeOfFreedom::Free {
            return false;
        }

        let hashed = self.vertex_tool.remove(index, &v.coord);
        self.record(Undo::VertexRemoved {
            index,
            previous: v.movability,
            hashed,
        });
        self.vertices[index].movability = DegreeOfFreedom::Deleted;
        self.nb_vertices -= 1;
        true
    }

    pub fn active_vertices(&self) -> impl Iterator<Item = usize> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_deleted())
            .map(|(i, _)| i)
    }

    // ---------------------------------------------------------------------
    // Edges
    // ---------------------------------------------------------------------

    /// Adds an edge, or returns the existing edge over the same two vertices
    /// with the orientation matching the request.
    pub fn add_edge(&mut self, edge: Edge) -> EdgeUse {
        debug_assert_ne!(edge.first, edge.last, "degenerate edge");

        if let Some(&index) = self.edge_lookup.get(&edge.key()) {
            return EdgeUse::new(index, self.edges[index].first == edge.first);
        }

        let index = self.edges.len();
        self.edges.push(edge);
        self.edge_triangles.push(SmallVec::new());
        self.edge_lookup.insert(edge.key(), index);
        self.vertex_edges[edge.first].push(index);
        self.vertex_edges[edge.last].push(index);
        self.sync_constrained(index);
        self.record(Undo::EdgeAdded(index));
        self.nb_edges += 1;
        EdgeUse::new(index, true)
    }

    #[inline]
    pub fn edge(&self, index: usize) -> &Edge {
        &self.edges[index]
    }

    pub fn get_edge(&self, index: usize) -> Option<&Edge> {
        self.edges.get(index).filter(|e| !e.is_deleted())
    }

    #[inline]
    pub fn nb_edges(&self) -> usize {
        self.nb_edges
    }

    /// Live edge between `a` and `b`, oriented `a -> b`.
    pub fn find_edge(&self, a: usize, b: usize) -> Option<EdgeUse> {
        let key = if a < b { (a, b) } else { (b, a) };
        self.edge_lookup
            .get(&key)
            .map(|&i| EdgeUse::new(i, self.edges[i].first == a))
    }

    pub fn set_edge_movability(&mut self, index: usize, movability: DegreeOfFreedom) {
        let previous = self.edges[index].movability;
        self.record(Undo::EdgeMovability { index, previous });
        self.edges[index].movability = movability;
        self.sync_constrained(index);
    }

    fn sync_constrained(&mut self, index: usize) {
        if self.edges[index].movability.is_constrained() {
            self.constrained.insert(index);
        } else {
            self.constrained.remove(&index);
        }
    }

    /// Live fixed and frontier edges.
    #[inline]
    pub fn constrained_edges(&self) -> &BTreeSet<usize> {
        &self.constrained
    }

    /// Swaps the stored orientation of an edge, keeping every triangle that
    /// uses it consistent.
    pub fn reverse_edge(&mut self, index: usize) {
        self.record(Undo::EdgeReversed(index));
        self.flip_edge(index);
    }

    fn flip_edge(&mut self, index: usize) {
        let e = &mut self.edges[index];
        std::mem::swap(&mut e.first, &mut e.last);
        for &t in &self.edge_triangles[index] {
            let tri = &mut self.triangles[t];
            for k in 0..3 {
                if tri.edges[k] == index {
                    tri.orientations[k] = !tri.orientations[k];
                }
            }
        }
    }

    /// Removes an edge no triangle uses. Only free edges are removed unless
    /// `force` is set.
    pub fn remove_edge(&mut self, index: usize, force: bool) -> bool {
        let e = self.edges[index];
        if e.is_deleted() || !self.edge_triangles[index].is_empty() {
            return false;
        }
        if !force && e.movability != DegreeOfFreedom::Free {
            return false;
        }

        self.edge_lookup.remove(&e.key());
        let mut slots = [0usize; 2];
        for (slot, node) in slots.iter_mut().zip([e.first, e.last]) {
            let list = &mut self.vertex_edges[node];
            if let Some(pos) = list.iter().position(|&x| x == index) {
                list.remove(pos);
                *slot = pos;
            }
        }
        self.record(Undo::EdgeRemoved {
            index,
            previous: e.movability,
            slots,
        });
        self.edges[index].movability = DegreeOfFreedom::Deleted;
        self.constrained.remove(&index);
        self.nb_edges -= 1;
        true
    }

    #[inline]
    pub fn edges_connected_to(&self, vertex: usize) -> &[usize] {
        &self.vertex_edges[vertex]
    }

    #[inline]
    pub fn triangles_connected_to(&self, edge: usize) -> &[usize] {
        &self.edge_triangles[edge]
    }

    pub fn active_edges(&self) -> impl Iterator<Item = usize> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.is_deleted())
            .map(|(i, _)| i)
    }

    /// Ordered set of live edges with the given classification.
    pub fn edges_of_type(&self, movability: DegreeOfFreedom) -> BTreeSet<usize> {
        if movability.is_constrained() {
            return self
                .constrained
                .iter()
                .copied()
                .filter(|&i| self.edges[i].movability == movability)
                .collect();
        }
        self.active_edges()
            .filter(|&i| self.edges[i].movability == movability)
            .collect()
    }

    // ---------------------------------------------------------------------
    // Triangles
    // ---------------------------------------------------------------------

    /// Adds a triangle from three chained edge uses. Returns the existing
    /// index when a live triangle over the same edges is already stored.
    ///
    /// An edge bounds at most one triangle on each side: a triangle using an
    /// edge with the orientation of a triangle already attached to it is
    /// rejected with [`GeometricFailure::EdgeSideTaken`].
    pub fn add_triangle(&mut self, uses: [EdgeUse; 3]) -> DelaunResult<usize> {
        let ids = [uses[0].edge, uses[1].edge, uses[2].edge];

        let mut nodes = [0usize; 3];
        for k in 0..3 {
            let (start, end) = self.edges[uses[k].edge].oriented(uses[k].forward);
            let next = uses[(k + 1) % 3];
            let (next_start, _) = self.edges[next.edge].oriented(next.forward);
            if end != next_start {
                return Err(GeometricFailure::BrokenTriangle(ids));
            }
            nodes[k] = start;
        }
        if nodes[0] == nodes[1] || nodes[1] == nodes[2] || nodes[0] == nodes[2] {
            return Err(GeometricFailure::BrokenTriangle(ids));
        }

        let candidate = Triangle::new(uses, nodes);
        if let Some(&existing) = self.edge_triangles[ids[0]]
            .iter()
            .find(|&&t| self.triangles[t].is_same(&candidate))
        {
            return Ok(existing);
        }

        for u in uses {
            let taken = self.edge_triangles[u.edge]
                .iter()
                .any(|&t| self.triangles[t].orientation_of(u.edge) == Some(u.forward));
            if taken || self.edge_triangles[u.edge].len() >= 2 {
                return Err(GeometricFailure::EdgeSideTaken {
                    edge: u.edge,
                    forward: u.forward,
                });
            }
        }

        let index = self.triangles.len();
        self.triangles.push(candidate);
        for e in ids {
            self.edge_triangles[e].push(index);
        }
        self.record(Undo::TriangleAdded(index));
        self.nb_triangles += 1;
        Ok(index)
    }

    /// Marks a triangle deleted and detaches it from its edges. Edges are
    /// left in place; removing them is the caller's decision.
    pub fn remove_triangle(&mut self, index: usize) -> bool {
        let tri = self.triangles[index];
        if tri.is_deleted() {
            return false;
        }
        let mut slots = [0usize; 3];
        for (slot, e) in slots.iter_mut().zip(tri.edges) {
            let list = &mut self.edge_triangles[e];
            if let Some(pos) = list.iter().position(|&x| x == index) {
                list.remove(pos);
                *slot = pos;
            }
        }
        self.record(Undo::TriangleRemoved {
            index,
            previous: tri.movability,
            slots,
        });
        self.triangles[index].movability = DegreeOfFreedom::Deleted;
        self.nb_triangles -= 1;
        true
    }

    #[inline]
    pub fn triangle(&self, index: usize) -> &Triangle {
        &self.triangles[index]
    }

    pub fn get_triangle(&self, index: usize) -> Option<&Triangle> {
        self.triangles.get(index).filter(|t| !t.is_deleted())
    }

    #[inline]
    pub fn nb_triangles(&self) -> usize {
        self.nb_triangles
    }

    #[inline]
    pub fn triangle_nodes(&self, index: usize) -> [usize; 3] {
        self.triangles[index].nodes
    }

    pub fn triangle_points(&self, index: usize) -> [Point2<T>; 3] {
        let [a, b, c] = self.triangles[index].nodes;
        [self.point(a), self.point(b), self.point(c)]
    }

    pub fn triangle_signed_area(&self, index: usize) -> T {
        let [a, b, c] = self.triangle_points(index);
        orient2d(&a, &b, &c) * T::half()
    }

    pub fn active_triangles(&self) -> impl Iterator<Item = usize> + '_ {
        self.triangles
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_deleted())
            .map(|(i, _)| i)
    }

    /// Live triangles having `vertex` as a corner.
    pub fn triangles_around_vertex(&self, vertex: usize) -> BTreeSet<usize> {
        self.vertex_edges[vertex]
            .iter()
            .flat_map(|&e| self.edge_triangles[e].iter().copied())
            .collect()
    }

    /// Sum of the signed areas of all live triangles.
    pub fn covered_area(&self) -> T {
        self.active_triangles()
            .fold(T::zero(), |acc, t| acc + self.triangle_signed_area(t))
    }

    // ---------------------------------------------------------------------
    // Export
    // ---------------------------------------------------------------------

    /// Compacts live vertices, triangles and edges into flat buffers.
    pub fn index_buffers(&self) -> IndexBuffers<T> {
        let mut remap = vec![usize::MAX; self.vertices.len()];
        let mut out = IndexBuffers::default();

        for v in self.active_vertices() {
            remap[v] = out.positions.len();
            out.positions.push(self.vertices[v].coord.coords());
            out.vertex_map.push(v);
        }
        for t in self.active_triangles() {
            let [a, b, c] = self.triangles[t].nodes;
            out.triangles.push([remap[a], remap[b], remap[c]]);
        }
        for e in self.active_edges() {
            let edge = &self.edges[e];
            out.edges.push([remap[edge.first], remap[edge.last]]);
            out.edge_kinds.push(edge.movability);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> (MeshData<f64>, [usize; 4]) {
        let mut mesh = MeshData::new(1e-7);
        let v = [
            mesh.add_vertex(Vertex::free(0.0, 0.0), false),
            mesh.add_vertex(Vertex::free(1.0, 0.0), false),
            mesh.add_vertex(Vertex::free(1.0, 1.0), false),
            mesh.add_vertex(Vertex::free(0.0, 1.0), false),
        ];
        (mesh, v)
    }

    #[test]
    fn test_vertex_merge() {
        let (mut mesh, v) = square();
        let again = mesh.add_vertex(Vertex::fixed(1e-9, -1e-9), false);
        assert_eq!(again, v[0]);
        assert_eq!(mesh.nb_vertices(), 4);
        assert_eq!(mesh.vertex(v[0]).movability, DegreeOfFreedom::Fixed);

        let forced = mesh.add_vertex(Vertex::free(0.0, 0.0), true);
        assert_ne!(forced, v[0]);
        assert_eq!(mesh.nb_vertices(), 5);
    }

    #[test]
    fn test_add_edge_returns_existing() {
        let (mut mesh, v) = square();
        let e = mesh.add_edge(Edge::free(v[0], v[1]));
        assert!(e.forward);
        let again = mesh.add_edge(Edge::free(v[1], v[0]));
        assert_eq!(again.edge, e.edge);
        assert!(!again.forward);
        assert_eq!(mesh.nb_edges(), 1);
        assert_eq!(mesh.find_edge(v[1], v[0]), Some(again));
    }

    #[test]
    fn test_triangle_lifecycle() {
        let (mut mesh, v) = square();
        let e0 = mesh.add_edge(Edge::free(v[0], v[1]));
        let e1 = mesh.add_edge(Edge::free(v[1], v[2]));
        let e2 = mesh.add_edge(Edge::free(v[2], v[0]));

        let t = mesh.add_triangle([e0, e1, e2]).unwrap();
        assert_eq!(mesh.triangle_nodes(t), [v[0], v[1], v[2]]);
        assert_eq!(mesh.triangle_signed_area(t), 0.5);
        assert_eq!(mesh.triangles_connected_to(e0.edge), &[t]);
        // same edges again
        assert_eq!(mesh.add_triangle([e1, e2, e0]).unwrap(), t);
        assert_eq!(mesh.nb_triangles(), 1);

        // edges in use are not removable
        assert!(!mesh.remove_edge(e0.edge, true));
        assert!(mesh.remove_triangle(t));
        assert!(!mesh.remove_triangle(t));
        assert!(mesh.triangles_connected_to(e0.edge).is_empty());
        assert!(mesh.remove_edge(e0.edge, false));
        assert_eq!(mesh.nb_edges(), 2);
        assert!(mesh.find_edge(v[0], v[1]).is_none());
    }

    #[test]
    fn test_edge_side_used_once() {
        let (mut mesh, v) = square();
        let apexes = [
            v[3],
            mesh.add_vertex(Vertex::free(0.5, 2.0), false),
            mesh.add_vertex(Vertex::free(0.2, 3.0), false),
        ];
        let ab = mesh.add_edge(Edge::free(v[0], v[1]));
        let fan = |mesh: &mut MeshData<f64>, apex: usize, base: EdgeUse| {
            let (s, e) = mesh.edge(base.edge).oriented(base.forward);
            let up = mesh.add_edge(Edge::free(e, apex));
            let down = mesh.add_edge(Edge::free(apex, s));
            mesh.add_triangle([base, up, down])
        };

        assert!(fan(&mut mesh, apexes[0], ab).is_ok());
        for &apex in &apexes[1..] {
            assert_eq!(
                fan(&mut mesh, apex, ab),
                Err(GeometricFailure::EdgeSideTaken {
                    edge: ab.edge,
                    forward: true
                })
            );
        }
        assert_eq!(mesh.triangles_connected_to(ab.edge).len(), 1);

        let below = mesh.add_vertex(Vertex::free(0.5, -1.0), false);
        let below_again = mesh.add_vertex(Vertex::free(0.5, -2.0), false);
        assert!(fan(&mut mesh, below, ab.reversed()).is_ok());
        assert!(fan(&mut mesh, below_again, ab.reversed()).is_err());
        assert_eq!(mesh.triangles_connected_to(ab.edge).len(), 2);
        assert_eq!(mesh.nb_triangles(), 2);
    }

    #[test]
    fn test_rollback_restores_store() {
        let (mut mesh, v) = square();
        let e01 = mesh.add_edge(Edge::new(v[0], v[1], DegreeOfFreedom::Frontier));
        let e12 = mesh.add_edge(Edge::new(v[1], v[2], DegreeOfFreedom::Frontier));
        let e23 = mesh.add_edge(Edge::new(v[2], v[3], DegreeOfFreedom::Frontier));
        let e30 = mesh.add_edge(Edge::new(v[3], v[0], DegreeOfFreedom::Frontier));
        let e02 = mesh.add_edge(Edge::free(v[0], v[2]));
        let t0 = mesh.add_triangle([e01, e12, e02.reversed()]).unwrap();
        let t1 = mesh.add_triangle([e02, e23, e30]).unwrap();

        let before = mesh.index_buffers();
        let adjacency: Vec<Vec<usize>> = v.iter().map(|&x| mesh.edges_connected_to(x).to_vec()).collect();
        let constrained = mesh.constrained_edges().clone();

        mesh.checkpoint();
        mesh.remove_triangle(t0);
        mesh.remove_triangle(t1);
        assert!(mesh.remove_edge(e02.edge, false));
        let e13 = mesh.add_edge(Edge::new(v[1], v[3], DegreeOfFreedom::Fixed));
        mesh.add_triangle([e12, e23, e13.reversed()]).unwrap();
        mesh.add_triangle([e01, e13, e30]).unwrap();
        mesh.reverse_edge(e30.edge);
        mesh.set_edge_movability(e01.edge, DegreeOfFreedom::Free);
        mesh.add_vertex(Vertex::free(5.0, 5.0), false);
        mesh.add_vertex(Vertex::fixed(1.0, 1.0), false);
        assert_eq!(mesh.journal_triangles().len(), 4);
        let (added, removed) = mesh.journal_areas();
        assert!((added - removed).abs() < 1e-15);
        mesh.rollback();

        assert!(!mesh.is_journaling());
        assert_eq!(mesh.index_buffers(), before);
        for (k, &x) in v.iter().enumerate() {
            assert_eq!(mesh.edges_connected_to(x), adjacency[k].as_slice());
        }
        assert_eq!(mesh.constrained_edges(), &constrained);
        assert_eq!(mesh.triangles_connected_to(e02.edge), &[t0, t1]);
        assert_eq!(mesh.find_edge(v[0], v[2]), Some(e02));
        assert!(mesh.find_edge(v[1], v[3]).is_none());
        assert_eq!(mesh.vertex(v[2]).movability, DegreeOfFreedom::Free);
        assert!(mesh.find_vertex(&Point2::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn test_broken_triangle_rejected() {
        let (mut mesh, v) = square();
        let e0 = mesh.add_edge(Edge::free(v[0], v[1]));
        let e1 = mesh.add_edge(Edge::free(v[2], v[3]));
        let e2 = mesh.add_edge(Edge::free(v[3], v[0]));
        assert!(matches!(
            mesh.add_triangle([e0, e1, e2]),
            Err(GeometricFailure::BrokenTriangle(_))
        ));
        assert_eq!(mesh.nb_triangles(), 0);
    }

    #[test]
    fn test_constrained_edge_needs_force() {
        let (mut mesh, v) = square();
        let e = mesh.add_edge(Edge::new(v[0], v[2], DegreeOfFreedom::Fixed));
        assert!(!mesh.remove_edge(e.edge, false));
        assert!(mesh.remove_edge(e.edge, true));
        assert!(mesh.edge(e.edge).is_deleted());
    }

    #[test]
    fn test_remove_vertex_requires_no_edges() {
        let (mut mesh, v) = square();
        let e = mesh.add_edge(Edge::free(v[0], v[1]));
        assert!(!mesh.remove_vertex(v[0], false));
        mesh.remove_edge(e.edge, false);
        assert!(mesh.remove_vertex(v[0], false));
        assert_eq!(mesh.nb_vertices(), 3);
        assert!(mesh.find_vertex(&Point2::new(0.0, 0.0)).is_none());
        assert!(mesh.get_vertex(v[0]).is_none());
    }

    #[test]
    fn test_reverse_edge_keeps_triangles_consistent() {
        let (mut mesh, v) = square();
        let e0 = mesh.add_edge(Edge::free(v[0], v[1]));
        let e1 = mesh.add_edge(Edge::free(v[1], v[2]));
        let e2 = mesh.add_edge(Edge::free(v[2], v[0]));
        let t = mesh.add_triangle([e0, e1, e2]).unwrap();

        mesh.reverse_edge(e0.edge);
        assert_eq!(mesh.edge(e0.edge).first, v[1]);
        assert_eq!(mesh.triangle(t).orientation_of(e0.edge), Some(false));
    }

    #[test]
    fn test_index_buffers_compact() {
        let (mut mesh, v) = square();
        let e0 = mesh.add_edge(Edge::free(v[1], v[2]));
        let e1 = mesh.add_edge(Edge::free(v[2], v[3]));
        let e2 = mesh.add_edge(Edge::free(v[3], v[1]));
        mesh.add_triangle([e0, e1, e2]).unwrap();
        assert!(mesh.remove_vertex(v[0], false));

        let buffers = mesh.index_buffers();
        assert_eq!(buffers.positions.len(), 3);
        assert_eq!(buffers.triangles, vec![[0, 1, 2]]);
        assert_eq!(buffers.vertex_map, vec![v[1], v[2], v[3]]);
        assert_eq!(buffers.edges.len(), 3);
    }
}
