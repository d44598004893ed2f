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

use crate::mesh::basic_types::{DegreeOfFreedom, EdgeUse};

/// Triangle ("element") of the store.
///
/// `edges[i]` runs from `nodes[i]` to `nodes[(i + 1) % 3]`; `orientations[i]`
/// tells whether that matches the stored orientation of the edge. Nodes are
/// kept counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub edges: [usize; 3],
    pub orientations: [bool; 3],
    pub nodes: [usize; 3],
    pub movability: DegreeOfFreedom,
}

impl Triangle {
    pub fn new(uses: [EdgeUse; 3], nodes: [usize; 3]) -> Self {
        Triangle {
            edges: [uses[0].edge, uses[1].edge, uses[2].edge],
            orientations: [uses[0].forward, uses[1].forward, uses[2].forward],
            nodes,
            movability: DegreeOfFreedom::Free,
        }
    }

    #[inline]
    pub fn edge_use(&self, i: usize) -> EdgeUse {
        EdgeUse::new(self.edges[i], self.orientations[i])
    }

    /// Orientation with which this triangle uses `edge`, if at all.
    #[inline]
    pub fn orientation_of(&self, edge: usize) -> Option<bool> {
        (0..3)
            .find(|&i| self.edges[i] == edge)
            .map(|i| self.orientations[i])
    }

    #[inline]
    pub fn has_node(&self, node: usize) -> bool {
        self.nodes.contains(&node)
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.movability.is_deleted()
    }

    /// Same three edges, regardless of rotation.
    pub fn is_same(&self, other: &Triangle) -> bool {
        let mut a = self.edges;
        let mut b = other.edges;
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_of() {
        let t = Triangle::new(
            [EdgeUse::new(4, true), EdgeUse::new(9, false), EdgeUse::new(2, true)],
            [0, 1, 2],
        );
        assert_eq!(t.orientation_of(9), Some(false));
        assert_eq!(t.orientation_of(4), Some(true));
        assert_eq!(t.orientation_of(5), None);
        assert_eq!(t.edge_use(1).reversed(), EdgeUse::new(9, true));
    }

    #[test]
    fn test_is_same_ignores_rotation() {
        let a = Triangle::new(
            [EdgeUse::new(1, true), EdgeUse::new(2, true), EdgeUse::new(3, true)],
            [0, 1, 2],
        );
        let b = Triangle::new(
            [EdgeUse::new(2, true), EdgeUse::new(3, true), EdgeUse::new(1, true)],
            [1, 2, 0],
        );
        assert!(a.is_same(&b));
    }
}
