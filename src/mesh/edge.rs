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

use crate::mesh::basic_types::DegreeOfFreedom;

/// Edge ("link") between two vertices.
///
/// The pair is stored oriented (`first -> last`) but identity is unordered:
/// two edges over the same vertices are the same edge, and triangles record
/// per use whether they traverse it forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub first: usize,
    pub last: usize,
    pub movability: DegreeOfFreedom,
}

impl Edge {
    #[inline]
    pub fn new(first: usize, last: usize, movability: DegreeOfFreedom) -> Self {
        Edge {
            first,
            last,
            movability,
        }
    }

    #[inline]
    pub fn free(first: usize, last: usize) -> Self {
        Self::new(first, last, DegreeOfFreedom::Free)
    }

    /// Unordered identity of the edge.
    #[inline]
    pub fn key(&self) -> (usize, usize) {
        edge_key(self.first, self.last)
    }

    #[inline]
    pub fn is_same(&self, other: &Edge) -> bool {
        self.key() == other.key()
    }

    #[inline]
    pub fn has_node(&self, node: usize) -> bool {
        self.first == node || self.last == node
    }

    /// Opposite end of the edge, assuming `node` is one of its ends.
    #[inline]
    pub fn other(&self, node: usize) -> usize {
        if self.first == node { self.last } else { self.first }
    }

    /// End nodes in traversal order for the given orientation.
    #[inline]
    pub fn oriented(&self, forward: bool) -> (usize, usize) {
        if forward {
            (self.first, self.last)
        } else {
            (self.last, self.first)
        }
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.movability.is_deleted()
    }
}

#[inline]
pub fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}
