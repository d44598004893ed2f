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

mod delaunay;
mod polygon;

pub mod circle_tool;
pub mod params;

pub use circle_tool::CircleTool;
pub use delaunay::{BuildState, Delaun, PointLocation};
pub use params::DelaunParams;

use crate::error::{DelaunResult, GeometricFailure};
use crate::geometry::Point2;
use crate::mesh::IndexBuffers;
use crate::numeric::scalar::Scalar;

pub trait Triangulate2D<T: Scalar> {
    /// Triangulates a point set into flat buffers. Fails with
    /// [`GeometricFailure::TooFewVertices`] when fewer than 3 distinct
    /// points remain after merging.
    fn triangulate(points: &[Point2<T>]) -> DelaunResult<IndexBuffers<T>>;
}

impl<T: Scalar> Triangulate2D<T> for Delaun<T> {
    fn triangulate(points: &[Point2<T>]) -> DelaunResult<IndexBuffers<T>> {
        let delaun = Delaun::from_points(points)?;
        let distinct = delaun.result().nb_vertices();
        if distinct < 3 {
            return Err(GeometricFailure::TooFewVertices(distinct));
        }
        Ok(delaun.result().index_buffers())
    }
}
