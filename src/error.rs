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

//! Error types of the triangulation engine.
//!
//! Degenerate geometry is an expected, recoverable condition: every failure
//! here is reported after the mesh has been restored to its last consistent
//! state.

use thiserror::Error;

/// Reasons an operation on the triangulation could not complete.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometricFailure {
    /// Fewer than three distinct vertices were supplied.
    #[error("triangulation needs at least 3 distinct vertices, got {0}")]
    TooFewVertices(usize),

    /// The index does not name a live vertex of the store.
    #[error("vertex {0} does not exist")]
    UnknownVertex(usize),

    /// The vertex exists but no triangle uses it.
    #[error("vertex {0} is not part of the triangulation")]
    VertexNotInMesh(usize),

    /// Both ends of an edge coincide within tolerance.
    #[error("edge {first}-{last} is degenerate")]
    DegenerateEdge { first: usize, last: usize },

    /// A new constraint would cross an existing fixed or frontier edge.
    #[error("edge {first}-{last} crosses constrained edge {crossed}")]
    ConstraintsIntersect {
        first: usize,
        last: usize,
        crossed: usize,
    },

    /// A vertex lies in the interior of a requested constraint edge.
    #[error("vertex {vertex} lies on edge {first}-{last}")]
    VertexOnEdge {
        first: usize,
        last: usize,
        vertex: usize,
    },

    /// The boundary walk could not close a polygon on the requested side.
    #[error("no closed polygon on the left of edge {0}")]
    OpenPolygon(usize),

    /// The cavity boundary crosses itself.
    #[error("polygon starting at edge {0} is self-intersecting")]
    SelfIntersectingPolygon(usize),

    /// No diagonal could be inserted while decomposing a polygon.
    #[error("no valid diagonal for polygon starting at edge {0}")]
    NoValidDiagonal(usize),

    /// Re-meshing did not cover the same area as the removed triangles.
    #[error("re-meshed area {actual} differs from removed area {expected}")]
    AreaMismatch { expected: f64, actual: f64 },

    /// Edges handed to the store do not chain into a triangle.
    #[error("edges {0:?} do not form a closed triangle")]
    BrokenTriangle([usize; 3]),

    /// The edge already bounds a triangle on the requested side.
    #[error("edge {edge} already has a triangle on its {} side", side_name(.forward))]
    EdgeSideTaken { edge: usize, forward: bool },

    /// A triangle was rejected because it has no circumcircle.
    #[error("triangle over vertices {0:?} is degenerate")]
    DegenerateTriangle([usize; 3]),
}

fn side_name(forward: &bool) -> &'static str {
    if *forward { "left" } else { "right" }
}

/// Result type for triangulation operations.
pub type DelaunResult<T> = std::result::Result<T, GeometricFailure>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GeometricFailure::TooFewVertices(2);
        assert_eq!(
            format!("{err}"),
            "triangulation needs at least 3 distinct vertices, got 2"
        );

        let err = GeometricFailure::ConstraintsIntersect {
            first: 1,
            last: 4,
            crossed: 9,
        };
        assert!(format!("{err}").contains("crosses constrained edge 9"));

        let err = GeometricFailure::EdgeSideTaken {
            edge: 3,
            forward: false,
        };
        assert_eq!(format!("{err}"), "edge 3 already has a triangle on its right side");
    }
}
