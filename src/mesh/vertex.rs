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

use crate::geometry::Point2;
use crate::mesh::basic_types::DegreeOfFreedom;
use crate::numeric::scalar::Scalar;

/// Vertex of the parametric plane.
///
/// `location_3d` is an opaque handle owned by the caller (typically the index
/// of the 3D point the vertex was evaluated from); the triangulation only
/// carries it along.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex<T: Scalar> {
    pub coord: Point2<T>,
    pub location_3d: Option<usize>,
    pub movability: DegreeOfFreedom,
}

impl<T: Scalar> Vertex<T> {
    pub fn new(x: T, y: T, movability: DegreeOfFreedom) -> Self {
        Vertex {
            coord: Point2::new(x, y),
            location_3d: None,
            movability,
        }
    }

    pub fn free(x: T, y: T) -> Self {
        Self::new(x, y, DegreeOfFreedom::Free)
    }

    pub fn fixed(x: T, y: T) -> Self {
        Self::new(x, y, DegreeOfFreedom::Fixed)
    }

    pub fn with_location_3d(mut self, location: usize) -> Self {
        self.location_3d = Some(location);
        self
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.movability.is_deleted()
    }
}

impl<T: Scalar> From<Point2<T>> for Vertex<T> {
    fn from(coord: Point2<T>) -> Self {
        Vertex {
            coord,
            location_3d: None,
            movability: DegreeOfFreedom::Free,
        }
    }
}

impl<T: Scalar> From<[T; 2]> for Vertex<T> {
    fn from(coords: [T; 2]) -> Self {
        Vertex::from(Point2::from_vals(coords))
    }
}
