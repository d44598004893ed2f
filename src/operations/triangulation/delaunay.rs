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

//! Incremental Delaunay triangulation with constrained edges.
//!
//! [`Delaun`] owns a [`MeshData`] and a [`CircleTool`]. A build bootstraps an
//! auxiliary super-mesh around the input, inserts the vertices one by one
//! (Watson cavity retriangulation), restores fixed and frontier edges,
//! removes everything outside the frontier and finally drops the auxiliary
//! elements. The same object then accepts new vertices, constraint edges and
//! vertex removals.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashSet;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::error::{DelaunResult, GeometricFailure};
use crate::geometry::{Aabb2, Point2};
use crate::kernel::{IntFlag, SegmentPoint, classify_point, int_seg_seg};
use crate::mesh::{DegreeOfFreedom, Edge, EdgeUse, MeshData, MeshReport, Triangle, Vertex};
use crate::numeric::scalar::Scalar;

use super::circle_tool::CircleTool;
use super::params::DelaunParams;

/// Boundary of a cavity: edge index -> orientation of the removed use.
pub(super) type LoopEdges = BTreeMap<usize, bool>;

/// Bounding boxes flatter than this switch the super-mesh to a quad.
const SUPER_QUAD_ASPECT: f64 = 10.0;

/// Lifecycle of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuildState {
    Uninitialized,
    SuperMeshBuilt,
    PointsInserted,
    FrontierAdjusted,
    Cleaned,
}

/// Result of locating a point against one triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointLocation {
    /// The point is inside the triangle or on its boundary.
    pub inside: bool,
    /// Edge of the triangle the point lies on (or close to).
    pub on_edge: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct Delaun<T: Scalar> {
    pub(super) mesh: MeshData<T>,
    pub(super) circles: CircleTool<T>,
    pub(super) params: DelaunParams,
    pub(super) precision: T,
    super_vertices: SmallVec<[usize; 4]>,
    super_edges: SmallVec<[EdgeUse; 4]>,
    init_circles: bool,
    state: BuildState,
    failed_constraints: BTreeSet<(usize, usize)>,
    skipped_vertices: BTreeSet<usize>,
}

impl<T: Scalar> Delaun<T> {
    /// Triangulates `vertices` with default parameters.
    pub fn new(vertices: &[Vertex<T>]) -> DelaunResult<Self> {
        Self::with_params(vertices, DelaunParams::default())
    }

    pub fn with_params(vertices: &[Vertex<T>], params: DelaunParams) -> DelaunResult<Self> {
        let mut mesh = MeshData::new(T::lit(params.merge_tolerance));
        let indices: Vec<usize> = vertices.iter().map(|v| mesh.add_vertex(*v, false)).collect();
        Self::from_mesh(mesh, &indices, params)
    }

    pub fn from_points(points: &[Point2<T>]) -> DelaunResult<Self> {
        let vertices: Vec<Vertex<T>> = points.iter().map(|p| Vertex::from(*p)).collect();
        Self::new(&vertices)
    }

    /// Triangulates `vertex_indices` of an existing store.
    ///
    /// Fixed and frontier edges already present in `mesh` are enforced. When
    /// `mesh` already holds triangles it is taken as a finished
    /// triangulation: its circles are registered and the given vertices are
    /// inserted into it.
    pub fn from_mesh(mesh: MeshData<T>, vertex_indices: &[usize], params: DelaunParams) -> DelaunResult<Self> {
        let mut delaun = Delaun {
            circles: CircleTool::new(T::lit(params.circle_tolerance)),
            precision: T::lit(params.precision),
            mesh,
            params,
            super_vertices: SmallVec::new(),
            super_edges: SmallVec::new(),
            init_circles: false,
            state: BuildState::Uninitialized,
            failed_constraints: BTreeSet::new(),
            skipped_vertices: BTreeSet::new(),
        };

        for &v in vertex_indices {
            if delaun.mesh.get_vertex(v).is_none() {
                return Err(GeometricFailure::UnknownVertex(v));
            }
        }

        if delaun.mesh.nb_triangles() > 0 {
            delaun.init_circles_tool(vertex_indices);
            delaun.state = BuildState::Cleaned;
            delaun.insert_vertices(vertex_indices)?;
        } else {
            delaun.perform(vertex_indices)?;
        }
        Ok(delaun)
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    #[inline]
    pub fn result(&self) -> &MeshData<T> {
        &self.mesh
    }

    pub fn into_result(self) -> MeshData<T> {
        self.mesh
    }

    #[inline]
    pub fn params(&self) -> &DelaunParams {
        &self.params
    }

    #[inline]
    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn get_vertex(&self, index: usize) -> Option<&Vertex<T>> {
        self.mesh.get_vertex(index)
    }

    pub fn get_edge(&self, index: usize) -> Option<&Edge> {
        self.mesh.get_edge(index)
    }

    pub fn get_triangle(&self, index: usize) -> Option<&Triangle> {
        self.mesh.get_triangle(index)
    }

    /// Edges classified as frontier.
    pub fn frontier(&self) -> BTreeSet<usize> {
        self.mesh.edges_of_type(DegreeOfFreedom::Frontier)
    }

    /// Edges classified as fixed.
    pub fn internal_edges(&self) -> BTreeSet<usize> {
        self.mesh.edges_of_type(DegreeOfFreedom::Fixed)
    }

    /// Live edges used by at most one triangle.
    pub fn free_edges(&self) -> BTreeSet<usize> {
        self.mesh
            .active_edges()
            .filter(|&e| self.mesh.triangles_connected_to(e).len() <= 1)
            .collect()
    }

    /// Vertices other than the corners of `triangle` lying inside its
    /// circumcircle widened by `tolerance`.
    pub fn vertices_in_circle(&self, triangle: usize, tolerance: T) -> Vec<usize> {
        self.circles.vertices_in_circle(&self.mesh, triangle, tolerance)
    }

    /// Constraint edges (as sorted vertex pairs) that are not part of the
    /// triangulation: rejected `use_edge` requests and fixed or frontier
    /// edges no triangle uses.
    pub fn unresolved_constraints(&self) -> Vec<(usize, usize)> {
        let mut out = self.failed_constraints.clone();
        for e in self.mesh.active_edges() {
            let edge = self.mesh.edge(e);
            if edge.movability.is_constrained() && self.mesh.triangles_connected_to(e).is_empty() {
                out.insert(edge.key());
            }
        }
        out.into_iter().collect()
    }

    pub fn nb_unresolved_constraints(&self) -> usize {
        self.unresolved_constraints().len()
    }

    /// Vertices that could not be located in any triangle when inserted
    /// (outside the triangulated domain or on a constrained edge). They stay
    /// in the store without edges.
    pub fn skipped_vertices(&self) -> &BTreeSet<usize> {
        &self.skipped_vertices
    }

    pub fn validate(&self) -> MeshReport {
        self.mesh.validate()
    }

    #[inline]
    pub(super) fn point(&self, vertex: usize) -> Point2<T> {
        self.mesh.point(vertex)
    }

    fn is_super_vertex(&self, vertex: usize) -> bool {
        self.super_vertices.contains(&vertex)
    }

    fn is_meshed(&self, vertex: usize) -> bool {
        self.mesh
            .edges_connected_to(vertex)
            .iter()
            .any(|&e| !self.mesh.triangles_connected_to(e).is_empty())
    }

    // ---------------------------------------------------------------------
    // Build
    // ---------------------------------------------------------------------

    fn perform(&mut self, vertex_indices: &[usize]) -> DelaunResult<()> {
        let mut seen = BTreeSet::new();
        let mut indices: Vec<usize> = vertex_indices.iter().copied().filter(|&v| seen.insert(v)).collect();
        if indices.len() < 3 {
            warn!(vertices = indices.len(), "fewer than 3 distinct vertices, nothing to triangulate");
            self.state = BuildState::Cleaned;
            return Ok(());
        }

        let mut bbox = Aabb2::of_points(indices.iter().map(|&v| &self.mesh.vertex(v).coord));
        bbox.enlarge(self.precision);

        if self.params.sort_vertices {
            self.sort_by_diagonal(&mut indices);
        }

        let (cells_u, cells_v) = self.params.grid_size(indices.len());
        self.circles.init(&bbox, cells_u, cells_v);
        self.init_circles = true;

        self.super_mesh(&bbox);
        self.state = BuildState::SuperMeshBuilt;
        debug!(
            vertices = indices.len(),
            cells_u,
            cells_v,
            super_vertices = self.super_vertices.len(),
            "super mesh built"
        );

        self.compute(&indices)?;
        self.state = BuildState::PointsInserted;
        trace!(triangles = self.mesh.nb_triangles(), "vertices inserted");

        self.process_constraints();
        self.state = BuildState::FrontierAdjusted;

        self.remove_aux_elements();
        self.classify_edges();
        self.state = BuildState::Cleaned;

        if self.mesh.nb_triangles() == 0 {
            warn!(vertices = indices.len(), "triangulation is empty, input is degenerate");
        }
        debug!(
            vertices = self.mesh.nb_vertices(),
            edges = self.mesh.nb_edges(),
            triangles = self.mesh.nb_triangles(),
            "triangulation done"
        );
        Ok(())
    }

    fn sort_by_diagonal(&self, indices: &mut [usize]) {
        indices.sort_by(|&a, &b| {
            let ka = self.mesh.vertex(a).coord.diagonal_key();
            let kb = self.mesh.vertex(b).coord.diagonal_key();
            ka.partial_cmp(&kb).unwrap_or(Ordering::Equal)
        });
    }

    /// Registers the circles of every live triangle of a finished mesh.
    fn init_circles_tool(&mut self, extra: &[usize]) {
        let mut bbox = Aabb2::of_points(
            self.mesh
                .active_vertices()
                .filter(|&v| !self.mesh.edges_connected_to(v).is_empty())
                .chain(extra.iter().copied())
                .map(|v| &self.mesh.vertex(v).coord),
        );
        bbox.enlarge(self.precision);

        let (cells_u, cells_v) = self.params.grid_size(self.mesh.nb_vertices());
        self.circles.init(&bbox, cells_u, cells_v);

        let triangles: Vec<usize> = self.mesh.active_triangles().collect();
        for t in triangles {
            let [a, b, c] = self.mesh.triangle_points(t);
            if !self.circles.bind(t, &a, &b, &c) {
                warn!(triangle = t, "degenerate triangle in the input mesh");
            }
        }
        self.init_circles = true;
    }

    /// Builds the auxiliary triangle (or quad, for flat boxes) enclosing
    /// `bbox`. Its boundary edges are the first cavity.
    fn super_mesh(&mut self, bbox: &Aabb2<T>) {
        let ext = bbox.extent();
        let d_min = ext.x.min(ext.y);
        let d_max = ext.x.max(ext.y);
        let scale = T::lit(self.params.super_mesh_scale.max(1.0));
        let (lo, hi) = (bbox.min, bbox.max);

        let corners: SmallVec<[Point2<T>; 4]> = if d_max > T::lit(SUPER_QUAD_ASPECT) * d_min {
            let gap = d_max * scale;
            SmallVec::from_slice(&[
                Point2::new(lo.x - gap, lo.y - gap),
                Point2::new(hi.x + gap, lo.y - gap),
                Point2::new(hi.x + gap, hi.y + gap),
                Point2::new(lo.x - gap, hi.y + gap),
            ])
        } else {
            let delta = (ext.x + ext.y) * scale;
            SmallVec::from_slice(&[
                Point2::new((lo.x + hi.x) * T::half(), hi.y + d_max * scale),
                Point2::new(lo.x - delta, lo.y - d_min * scale),
                Point2::new(hi.x + delta, lo.y - d_min * scale),
            ])
        };

        self.super_vertices = corners
            .iter()
            .map(|p| self.mesh.add_vertex(Vertex::from(*p), true))
            .collect();

        let n = self.super_vertices.len();
        self.super_edges = (0..n)
            .map(|i| {
                self.mesh
                    .add_edge(Edge::free(self.super_vertices[i], self.super_vertices[(i + 1) % n]))
            })
            .collect();
    }

    fn compute(&mut self, indices: &[usize]) -> DelaunResult<()> {
        let mut loop_edges: LoopEdges = self.super_edges.iter().map(|u| (u.edge, u.forward)).collect();
        self.create_triangles(indices[0], &mut loop_edges)?;
        self.create_triangles_on_new_vertices(&indices[1..])
    }

    // ---------------------------------------------------------------------
    // Insertion
    // ---------------------------------------------------------------------

    /// Adds a triangle and registers its circumcircle. A triangle whose
    /// circle cannot be computed is dropped again.
    pub(super) fn add_triangle(&mut self, uses: [EdgeUse; 3]) -> DelaunResult<Option<usize>> {
        let t = self.mesh.add_triangle(uses)?;
        if self.init_circles {
            let [a, b, c] = self.mesh.triangle_points(t);
            if !self.circles.bind(t, &a, &b, &c) {
                trace!(triangle = t, "dropping degenerate triangle");
                self.mesh.remove_triangle(t);
                return Ok(None);
            }
        }
        Ok(Some(t))
    }

    /// Removes a triangle and toggles its edges in `loop_edges`: an edge
    /// seen for the second time is interior to the cavity and is removed.
    pub(super) fn delete_triangle(&mut self, index: usize, loop_edges: &mut LoopEdges) {
        self.delete_triangle_keeping(index, loop_edges, None);
    }

    /// Same as [`Self::delete_triangle`] but never removes an edge of `keep`.
    pub(super) fn delete_triangle_keeping(
        &mut self,
        index: usize,
        loop_edges: &mut LoopEdges,
        keep: Option<&BTreeSet<usize>>,
    ) {
        if self.init_circles {
            self.circles.delete(index);
        }
        let tri = *self.mesh.triangle(index);
        if !self.mesh.remove_triangle(index) {
            return;
        }
        for k in 0..3 {
            let e = tri.edges[k];
            if loop_edges.remove(&e).is_some() {
                if keep.is_none_or(|set| !set.contains(&e)) {
                    self.mesh.remove_edge(e, false);
                }
            } else {
                loop_edges.insert(e, tri.orientations[k]);
            }
        }
    }

    /// Removes the free edges of `loop_edges` left without triangles.
    pub(super) fn remove_hanging_edges(&mut self, loop_edges: &LoopEdges, keep: Option<&BTreeSet<usize>>) {
        for &e in loop_edges.keys() {
            if keep.is_some_and(|set| set.contains(&e)) {
                continue;
            }
            if !self.mesh.edge(e).is_deleted() && self.mesh.triangles_connected_to(e).is_empty() {
                self.mesh.remove_edge(e, false);
            }
        }
    }

    /// Connects `vertex` to every edge of the cavity boundary `poly`.
    ///
    /// Boundary edges that `vertex` does not see from their left side are
    /// closed afterwards by meshing the polygon on their left.
    fn create_triangles(&mut self, vertex: usize, poly: &mut LoopEdges) -> DelaunResult<()> {
        let vp = self.point(vertex);
        let mut loop_uses: Vec<EdgeUse> = Vec::new();
        let mut external: Vec<usize> = Vec::new();

        let boundary: Vec<(usize, bool)> = poly.iter().map(|(&e, &f)| (e, f)).collect();
        for (e, forward) in boundary {
            let (first, last) = self.mesh.edge(e).oriented(forward);
            if first == vertex || last == vertex {
                continue;
            }
            let (pf, pl) = (self.point(first), self.point(last));

            let dir = pl - pf;
            let len = dir.modulus();
            if len < self.precision {
                continue;
            }
            let dir = dir / len;

            let first_dir = pf - vp;
            let last_dir = vp - pl;
            let dist12 = first_dir.cross(&dir);
            let dist23 = dir.cross(&last_dir);
            if dist12.abs() < self.precision || dist23.abs() < self.precision {
                continue;
            }

            let first_use = self.mesh.add_edge(Edge::free(vertex, first));
            let last_use = self.mesh.add_edge(Edge::free(last, vertex));

            if dist12.is_positive() && dist23.is_positive() {
                self.add_triangle([first_use, EdgeUse::new(e, forward), last_use])?;
            } else {
                loop_uses.push(EdgeUse::new(e, forward));
                external.push(if first_dir.square_modulus() > last_dir.square_modulus() {
                    first_use.edge
                } else {
                    last_use.edge
                });
            }
        }

        poly.clear();
        for ext in external {
            if let Some(&t) = self.mesh.triangles_connected_to(ext).first() {
                self.delete_triangle(t, poly);
            }
        }
        self.remove_hanging_edges(poly, None);

        for u in loop_uses {
            if self.mesh.edge(u.edge).is_deleted() {
                continue;
            }
            if let Err(err) = self.mesh_left_polygon_of(u.edge, u.forward) {
                trace!(edge = u.edge, %err, "cavity edge left open");
            }
        }
        Ok(())
    }

    /// Inserts each vertex into the current triangulation. Vertices outside
    /// every triangle are skipped.
    fn create_triangles_on_new_vertices(&mut self, indices: &[usize]) -> DelaunResult<()> {
        let sq_tol = T::lit(self.params.sq_location_tolerance());

        for &v in indices {
            let vertex = *self.mesh.vertex(v);
            let mut candidates = self.circles.select(&vertex.coord);

            let mut start = None;
            for (pos, &t) in candidates.iter().enumerate() {
                let loc = self.contains(t, &vertex.coord, sq_tol);
                if !loc.inside {
                    continue;
                }
                if let Some(e) = loc.on_edge {
                    if self.mesh.edge(e).movability != DegreeOfFreedom::Free
                        && vertex.movability == DegreeOfFreedom::Free
                    {
                        continue;
                    }
                }
                start = Some(pos);
                break;
            }

            let Some(pos) = start else {
                warn!(vertex = v, "vertex lies outside the triangulation, skipped");
                self.skipped_vertices.insert(v);
                continue;
            };
            self.skipped_vertices.remove(&v);

            let mut loop_edges = LoopEdges::new();
            let first = candidates.remove(pos);
            self.delete_triangle(first, &mut loop_edges);

            // flood the cavity across its boundary
            let mut modified = true;
            while modified && !candidates.is_empty() {
                modified = false;
                let next = candidates.iter().position(|&t| {
                    self.mesh.triangle(t).edges.iter().any(|e| loop_edges.contains_key(e))
                });
                if let Some(pos) = next {
                    let t = candidates.remove(pos);
                    self.delete_triangle(t, &mut loop_edges);
                    modified = true;
                }
            }

            self.create_triangles(v, &mut loop_edges)?;
        }
        Ok(())
    }

    /// Inserts already stored vertices into a finished triangulation.
    fn insert_vertices(&mut self, vertex_indices: &[usize]) -> DelaunResult<()> {
        let mut seen = BTreeSet::new();
        let mut fresh: Vec<usize> = vertex_indices
            .iter()
            .copied()
            .filter(|&v| seen.insert(v) && !self.is_meshed(v))
            .collect();
        if fresh.is_empty() {
            return Ok(());
        }
        if self.params.sort_vertices {
            self.sort_by_diagonal(&mut fresh);
        }

        let before = self.mesh.nb_triangles();
        self.create_triangles_on_new_vertices(&fresh)?;
        self.repair_constraints();
        self.classify_edges();
        debug!(
            vertices = fresh.len(),
            triangles_before = before,
            triangles = self.mesh.nb_triangles(),
            "vertices added"
        );
        Ok(())
    }

    /// Adds `vertices` to the store and inserts them into the triangulation.
    /// Returns the store index of each input vertex (merged ones included).
    pub fn add_vertices(&mut self, vertices: &[Vertex<T>]) -> DelaunResult<Vec<usize>> {
        let indices: Vec<usize> = vertices.iter().map(|v| self.mesh.add_vertex(*v, false)).collect();
        if !self.init_circles {
            self.init_circles_tool(&indices);
        }
        self.insert_vertices(&indices)?;
        Ok(indices)
    }

    // ---------------------------------------------------------------------
    // Constraints
    // ---------------------------------------------------------------------

    fn process_constraints(&mut self) {
        self.insert_internal_edges();
        if !self.mesh.edges_of_type(DegreeOfFreedom::Frontier).is_empty() {
            self.frontier_adjust();
        }
    }

    /// Lighter constraint pass for a finished mesh: no cleanup of the
    /// outside, only re-meshing of constraint sides that lost triangles.
    fn repair_constraints(&mut self) {
        self.insert_internal_edges();
        for f in self.mesh.edges_of_type(DegreeOfFreedom::Frontier) {
            if self.mesh.triangles_connected_to(f).is_empty() {
                if let Err(err) = self.mesh_left_polygon_of(f, true) {
                    trace!(edge = f, %err, "frontier edge left open");
                }
            }
        }
    }

    /// Meshes both sides of every fixed edge missing a triangle on that side.
    fn insert_internal_edges(&mut self) {
        for e in self.mesh.edges_of_type(DegreeOfFreedom::Fixed) {
            let tris = self.mesh.triangles_connected_to(e);
            let has_forward = tris
                .iter()
                .any(|&t| self.mesh.triangle(t).orientation_of(e) == Some(true));
            let has_backward = tris
                .iter()
                .any(|&t| self.mesh.triangle(t).orientation_of(e) == Some(false));

            for (missing, forward) in [(!has_forward, true), (!has_backward, false)] {
                if !missing {
                    continue;
                }
                if let Err(err) = self.mesh_left_polygon_of(e, forward) {
                    trace!(edge = e, forward, %err, "fixed edge side left open");
                }
            }
        }
    }

    /// Removes the triangles lying on the outer side of frontier edges and
    /// re-meshes the inner side of frontier edges left without triangles.
    fn frontier_adjust(&mut self) {
        let frontier: Vec<usize> = self.mesh.edges_of_type(DegreeOfFreedom::Frontier).into_iter().collect();
        let mut failed: Vec<usize> = Vec::new();

        for pass in 0..2 {
            let mut loop_edges = LoopEdges::new();
            for &f in &frontier {
                let outer = self
                    .mesh
                    .triangles_connected_to(f)
                    .iter()
                    .copied()
                    .find(|&t| self.mesh.triangle(t).orientation_of(f) == Some(false));
                if let Some(t) = outer {
                    self.delete_triangle(t, &mut loop_edges);
                }
            }
            self.remove_hanging_edges(&loop_edges, None);

            for &f in &frontier {
                if !self.mesh.triangles_connected_to(f).is_empty() {
                    continue;
                }
                if let Err(err) = self.mesh_left_polygon_of(f, true) {
                    trace!(edge = f, pass, %err, "frontier polygon not meshed");
                    if pass == 1 {
                        failed.push(f);
                    }
                }
            }
        }

        self.cleanup_mesh();

        for f in failed {
            if self.mesh.triangles_connected_to(f).is_empty() {
                if let Err(err) = self.mesh_left_polygon_of(f, true) {
                    warn!(edge = f, %err, "frontier edge could not be restored");
                }
            }
        }
    }

    /// Repeatedly deletes triangles hanging on a free boundary edge that are
    /// not held by the frontier.
    fn cleanup_mesh(&mut self) {
        let mut round = 0usize;
        loop {
            round += 1;
            let mut loop_edges = LoopEdges::new();
            let mut doomed: BTreeSet<usize> = BTreeSet::new();

            for e in self.free_edges() {
                let edge = *self.mesh.edge(e);
                if edge.movability == DegreeOfFreedom::Frontier {
                    continue;
                }
                let tris = self.mesh.triangles_connected_to(e);
                let Some(&t) = tris.first() else {
                    loop_edges.insert(e, true);
                    continue;
                };

                let tri = *self.mesh.triangle(t);
                let Some(k) = tri.edges.iter().position(|&x| x == e) else {
                    continue;
                };

                let mut cannot_remove = true;
                for step in 1..=2 {
                    let other = tri.edges[(k + step) % 3];
                    let around = self.mesh.triangles_connected_to(other);
                    if around.len() < 2 {
                        cannot_remove = false;
                        break;
                    }
                    let touches_super = around
                        .iter()
                        .filter(|&&o| o != t)
                        .any(|&o| self.mesh.triangle(o).nodes.iter().any(|&n| self.is_super_vertex(n)));
                    if touches_super {
                        cannot_remove = false;
                        break;
                    }
                }
                if cannot_remove {
                    continue;
                }

                let first_bound = self.is_bound_to_frontier(edge.first, e);
                let last_bound = self.is_bound_to_frontier(edge.last, e);
                if !first_bound || !last_bound {
                    doomed.insert(t);
                }
            }

            let nb_doomed = doomed.len();
            for t in doomed {
                self.delete_triangle(t, &mut loop_edges);
            }
            self.remove_hanging_edges(&loop_edges, None);

            trace!(round, deleted = nb_doomed, "cleanup round");
            if nb_doomed == 0 {
                break;
            }
        }
    }

    /// Walks the edges around `node` through triangles, starting at
    /// `start_edge`, looking for a constrained edge.
    fn is_bound_to_frontier(&self, node: usize, start_edge: usize) -> bool {
        let mut stack = vec![start_edge];
        let mut visited: AHashSet<usize> = AHashSet::default();
        visited.insert(start_edge);

        while let Some(current) = stack.pop() {
            let tris = self.mesh.triangles_connected_to(current);
            if tris.is_empty() {
                return false;
            }
            for &t in tris {
                for &e in &self.mesh.triangle(t).edges {
                    if e == current {
                        continue;
                    }
                    let edge = self.mesh.edge(e);
                    if !edge.has_node(node) {
                        continue;
                    }
                    if edge.movability != DegreeOfFreedom::Free {
                        return true;
                    }
                    if visited.insert(e) {
                        stack.push(e);
                    }
                }
            }
        }
        false
    }

    /// Deletes the super-mesh vertices together with everything touching
    /// them.
    fn remove_aux_elements(&mut self) {
        let mut loop_edges = LoopEdges::new();
        let doomed: BTreeSet<usize> = self
            .super_vertices
            .iter()
            .flat_map(|&v| self.mesh.triangles_around_vertex(v))
            .collect();
        for t in doomed {
            self.delete_triangle(t, &mut loop_edges);
        }
        self.remove_hanging_edges(&loop_edges, None);

        for v in std::mem::take(&mut self.super_vertices) {
            let dangling: SmallVec<[usize; 8]> = SmallVec::from_slice(self.mesh.edges_connected_to(v));
            for e in dangling {
                self.mesh.remove_edge(e, true);
            }
            self.mesh.remove_vertex(v, true);
        }
        self.super_edges.clear();
    }

    /// Final classification: free edges with one triangle become frontier,
    /// oriented so that the triangle uses them forward; free edges without
    /// triangles are dropped.
    fn classify_edges(&mut self) {
        let edges: Vec<usize> = self.mesh.active_edges().collect();
        self.classify_edges_among(edges);
    }

    fn classify_edges_among(&mut self, edges: impl IntoIterator<Item = usize>) {
        for e in edges {
            let movability = self.mesh.edge(e).movability;
            if movability != DegreeOfFreedom::Free {
                continue;
            }
            let tris: SmallVec<[usize; 2]> = SmallVec::from_slice(self.mesh.triangles_connected_to(e));
            match tris.as_slice() {
                [] => {
                    self.mesh.remove_edge(e, false);
                }
                &[t] => {
                    self.mesh.set_edge_movability(e, DegreeOfFreedom::Frontier);
                    if self.mesh.triangle(t).orientation_of(e) == Some(false) {
                        self.mesh.reverse_edge(e);
                    }
                }
                _ => {}
            }
        }
    }

    /// Makes `a-b` a fixed edge of the triangulation.
    ///
    /// Returns `Ok(false)` when the edge already exists (a free edge is
    /// promoted to fixed) and `Ok(true)` when it was inserted. On error the
    /// triangulation is left exactly as it was.
    pub fn try_use_edge(&mut self, a: usize, b: usize) -> DelaunResult<bool> {
        for v in [a, b] {
            if self.mesh.get_vertex(v).is_none() {
                return Err(GeometricFailure::UnknownVertex(v));
            }
        }
        if a == b {
            return Err(GeometricFailure::DegenerateEdge { first: a, last: b });
        }

        let key = (a.min(b), a.max(b));
        if let Some(u) = self.mesh.find_edge(a, b) {
            if self.mesh.edge(u.edge).movability == DegreeOfFreedom::Free {
                self.mesh.set_edge_movability(u.edge, DegreeOfFreedom::Fixed);
            }
            self.failed_constraints.remove(&key);
            return Ok(false);
        }

        for v in [a, b] {
            if !self.is_meshed(v) {
                return Err(GeometricFailure::VertexNotInMesh(v));
            }
        }
        let (pa, pb) = (self.point(a), self.point(b));
        if pa.is_equal(&pb, self.precision) {
            return Err(GeometricFailure::DegenerateEdge { first: a, last: b });
        }
        self.check_new_constraint(a, b, &pa, &pb)?;

        self.mesh.checkpoint();
        match self.enforce_edge(a, b).and_then(|()| self.check_area_kept()) {
            Ok(()) => {
                if self.state == BuildState::Cleaned {
                    let touched = self.mesh.journal_edges();
                    self.classify_edges_among(touched);
                }
                self.mesh.commit();
                self.failed_constraints.remove(&key);
                debug!(a, b, triangles = self.mesh.nb_triangles(), "constraint edge inserted");
                Ok(true)
            }
            Err(err) => {
                self.rollback();
                Err(err)
            }
        }
    }

    /// Fails when the journaled changes removed and added triangles of
    /// different total area.
    fn check_area_kept(&self) -> DelaunResult<()> {
        let (added, removed) = self.mesh.journal_areas();
        let tol = T::lit(1e-9).max(self.precision) * removed.abs().max(T::one());
        if (added - removed).abs() > tol {
            return Err(GeometricFailure::AreaMismatch {
                expected: removed.as_f64(),
                actual: added.as_f64(),
            });
        }
        Ok(())
    }

    /// Undoes the journaled changes and resyncs the circles of the
    /// triangles they touched.
    fn rollback(&mut self) {
        let touched = self.mesh.journal_triangles();
        self.mesh.rollback();
        if !self.init_circles {
            return;
        }
        for t in touched {
            if self.mesh.get_triangle(t).is_some() {
                let [a, b, c] = self.mesh.triangle_points(t);
                self.circles.bind(t, &a, &b, &c);
            } else {
                self.circles.delete(t);
            }
        }
    }

    /// Boolean form of [`Self::try_use_edge`]: failures are logged and
    /// counted as unresolved constraints.
    pub fn use_edge(&mut self, a: usize, b: usize) -> bool {
        match self.try_use_edge(a, b) {
            Ok(inserted) => inserted,
            Err(err) => {
                warn!(a, b, %err, "constraint edge rejected");
                if a != b {
                    self.failed_constraints.insert((a.min(b), a.max(b)));
                }
                false
            }
        }
    }

    /// Rejects a new constraint crossing a constrained edge or passing
    /// through a vertex.
    fn check_new_constraint(&self, a: usize, b: usize, pa: &Point2<T>, pb: &Point2<T>) -> DelaunResult<()> {
        let mut reach = Aabb2::from_points(pa, pb);
        reach.enlarge(self.precision);

        for &e in self.mesh.constrained_edges() {
            let edge = self.mesh.edge(e);
            let (ps, pe) = (self.point(edge.first), self.point(edge.last));
            let mut bounds = Aabb2::from_points(&ps, &pe);
            bounds.enlarge(self.precision);
            if reach.is_out(&bounds) {
                continue;
            }
            let hit = int_seg_seg(pa, pb, &ps, &pe, false, true, self.precision);
            if hit.flag != IntFlag::NoIntersection {
                return Err(GeometricFailure::ConstraintsIntersect {
                    first: a,
                    last: b,
                    crossed: e,
                });
            }
        }

        for v in self.vertices_near(&reach) {
            if v == a || v == b {
                continue;
            }
            if classify_point(pa, pb, &self.point(v), self.precision) == SegmentPoint::Inside {
                return Err(GeometricFailure::VertexOnEdge {
                    first: a,
                    last: b,
                    vertex: v,
                });
            }
        }
        Ok(())
    }

    /// Meshed vertices lying in `bbox`. Every corner of a triangle is on
    /// its circumcircle, so the circle cache cells around `bbox` hold a
    /// triangle for each of them.
    fn vertices_near(&self, bbox: &Aabb2<T>) -> BTreeSet<usize> {
        let in_box = |v: &usize| bbox.contains_point(&self.point(*v));
        if !self.init_circles {
            return self
                .mesh
                .active_vertices()
                .filter(|&v| !self.mesh.edges_connected_to(v).is_empty())
                .filter(in_box)
                .collect();
        }
        self.circles
            .triangles_near(bbox)
            .into_iter()
            .filter(|&t| self.mesh.get_triangle(t).is_some())
            .flat_map(|t| self.mesh.triangle_nodes(t))
            .filter(in_box)
            .collect()
    }

    fn enforce_edge(&mut self, a: usize, b: usize) -> DelaunResult<()> {
        let u = self.mesh.add_edge(Edge::new(a, b, DegreeOfFreedom::Fixed));
        self.mesh_left_polygon_of(u.edge, u.forward)?;

        let has_right = self
            .mesh
            .triangles_connected_to(u.edge)
            .iter()
            .any(|&t| self.mesh.triangle(t).orientation_of(u.edge) == Some(!u.forward));
        if !has_right {
            self.mesh_left_polygon_of(u.edge, !u.forward)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Vertex removal
    // ---------------------------------------------------------------------

    /// Removes an interior free vertex and re-meshes the hole. Returns
    /// `Ok(false)` (and changes nothing) for a vertex that is not part of a
    /// triangle, is fixed, or lies on a constraint or on the boundary.
    pub fn try_remove_vertex(&mut self, vertex: usize) -> DelaunResult<bool> {
        let Some(v) = self.mesh.get_vertex(vertex) else {
            return Err(GeometricFailure::UnknownVertex(vertex));
        };
        if v.movability != DegreeOfFreedom::Free {
            return Ok(false);
        }
        let star = self.mesh.triangles_around_vertex(vertex);
        if star.is_empty() {
            return Ok(false);
        }
        let closed = self.mesh.edges_connected_to(vertex).iter().all(|&e| {
            self.mesh.edge(e).movability == DegreeOfFreedom::Free && self.mesh.triangles_connected_to(e).len() == 2
        });
        if !closed {
            return Ok(false);
        }

        self.mesh.checkpoint();
        match self.remove_star(vertex, star).and_then(|()| self.check_area_kept()) {
            Ok(()) => {
                self.mesh.commit();
                debug!(vertex, triangles = self.mesh.nb_triangles(), "vertex removed");
                Ok(true)
            }
            Err(err) => {
                self.rollback();
                Err(err)
            }
        }
    }

    /// Boolean form of [`Self::try_remove_vertex`].
    pub fn remove_vertex(&mut self, vertex: usize) -> bool {
        match self.try_remove_vertex(vertex) {
            Ok(removed) => removed,
            Err(err) => {
                warn!(vertex, %err, "vertex not removed");
                false
            }
        }
    }

    fn remove_star(&mut self, vertex: usize, star: BTreeSet<usize>) -> DelaunResult<()> {
        let mut loop_edges = LoopEdges::new();
        for t in star {
            self.delete_triangle(t, &mut loop_edges);
        }
        let dangling: SmallVec<[usize; 8]> = SmallVec::from_slice(self.mesh.edges_connected_to(vertex));
        for e in dangling {
            loop_edges.remove(&e);
            self.mesh.remove_edge(e, false);
        }
        self.mesh.remove_vertex(vertex, false);

        let Some((&e0, &f0)) = loop_edges.iter().next() else {
            return Err(GeometricFailure::OpenPolygon(vertex));
        };
        let (start, mut pivot) = self.mesh.edge(e0).oriented(f0);
        let mut polygon = vec![EdgeUse::new(e0, f0)];
        loop_edges.remove(&e0);

        while pivot != start {
            let next = self.mesh.edges_connected_to(pivot).iter().copied().find_map(|e| {
                let forward = *loop_edges.get(&e)?;
                (self.mesh.edge(e).oriented(forward).0 == pivot).then_some(EdgeUse::new(e, forward))
            });
            let Some(u) = next else {
                return Err(GeometricFailure::OpenPolygon(e0));
            };
            loop_edges.remove(&u.edge);
            pivot = self.mesh.edge(u.edge).oriented(u.forward).1;
            polygon.push(u);
        }

        self.mesh_polygon(polygon)
    }

    // ---------------------------------------------------------------------
    // Point location
    // ---------------------------------------------------------------------

    /// Locates `p` against triangle `triangle`.
    ///
    /// `on_edge` reports the closest edge when `p` is within `sq_tolerance`
    /// of it, or a constrained edge when `p` is close relative to the edge
    /// length. A point within tolerance of a constrained edge is never
    /// inside.
    pub fn contains(&self, triangle: usize, p: &Point2<T>, sq_tolerance: T) -> PointLocation {
        let outside = PointLocation {
            inside: false,
            on_edge: None,
        };
        let tri = self.mesh.triangle(triangle);
        let pts = self.mesh.triangle_points(triangle);

        let mut dist = [T::zero(); 3];
        let mut sq_mod = [T::zero(); 3];
        let mut min_dist = T::infinity();
        let mut closest = 0usize;
        for i in 0..3 {
            let edge_vec = pts[(i + 1) % 3] - pts[i];
            sq_mod[i] = edge_vec.square_modulus();
            if sq_mod[i] <= self.precision * self.precision {
                return outside;
            }
            dist[i] = edge_vec.cross(&(*p - pts[i]));
            let d = dist[i] * dist[i] / sq_mod[i];
            if d < min_dist {
                min_dist = d;
                closest = i;
            }
        }

        let closest_edge = tri.edges[closest];
        let constrained = self.mesh.edge(closest_edge).movability != DegreeOfFreedom::Free;

        let mut on_edge = None;
        if min_dist > sq_tolerance {
            if constrained && dist[closest] < sq_mod[closest] / T::lit(5.0) {
                on_edge = Some(closest_edge);
            }
        } else if constrained {
            return outside;
        } else {
            on_edge = Some(closest_edge);
        }

        PointLocation {
            inside: dist.iter().all(|d| *d >= T::zero()),
            on_edge,
        }
    }
}
