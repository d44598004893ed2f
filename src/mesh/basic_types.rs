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

/// Classification shared by vertices, edges and triangles of the store.
///
/// For edges: `Free` edges are ordinary Delaunay edges, `Fixed` edges are
/// mandatory constraints inside the domain and `Frontier` edges bound the
/// domain (domain on their left). For vertices only `Free` and `Fixed` are
/// meaningful. `Deleted` marks records removed from the store; indices of
/// deleted records are never reused within one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum DegreeOfFreedom {
    #[default]
    Free,
    Fixed,
    Frontier,
    Deleted,
}

impl DegreeOfFreedom {
    #[inline]
    pub fn is_deleted(self) -> bool {
        self == DegreeOfFreedom::Deleted
    }

    /// Fixed and frontier edges may not be flipped or removed by the builder.
    #[inline]
    pub fn is_constrained(self) -> bool {
        matches!(self, DegreeOfFreedom::Fixed | DegreeOfFreedom::Frontier)
    }
}

/// One use of an edge: its index and whether it is traversed first -> last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeUse {
    pub edge: usize,
    pub forward: bool,
}

impl EdgeUse {
    #[inline]
    pub fn new(edge: usize, forward: bool) -> Self {
        EdgeUse { edge, forward }
    }

    #[inline]
    pub fn reversed(self) -> Self {
        EdgeUse {
            edge: self.edge,
            forward: !self.forward,
        }
    }
}

/// Compacted copy of the triangulation for downstream consumers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexBuffers<T> {
    pub positions: Vec<[T; 2]>,
    /// Counter-clockwise triangles indexing `positions`.
    pub triangles: Vec<[usize; 3]>,
    pub edges: Vec<[usize; 2]>,
    pub edge_kinds: Vec<DegreeOfFreedom>,
    /// Store index of every compacted vertex.
    pub vertex_map: Vec<usize>,
}
