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
use crate::numeric::scalar::Scalar;

/// Circumcircle of a triangle, kept with its squared radius because every
/// containment query compares squared distances.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle2<T: Scalar> {
    pub center: Point2<T>,
    pub square_radius: T,
}

impl<T: Scalar> Circle2<T> {
    pub fn new(center: Point2<T>, radius: T) -> Self {
        Circle2 {
            center,
            square_radius: radius * radius,
        }
    }

    #[inline]
    pub fn radius(&self) -> T {
        self.square_radius.sqrt()
    }

    /// `|p - center|^2 - r^2`: negative inside, positive outside.
    #[inline]
    pub fn power(&self, p: &Point2<T>) -> T {
        self.center.square_distance(p) - self.square_radius
    }

    /// Inclusive containment; `sq_tolerance` widens the circle so that
    /// near-cocircular points are treated as lying on it.
    #[inline]
    pub fn contains(&self, p: &Point2<T>, sq_tolerance: T) -> bool {
        self.power(p) <= sq_tolerance
    }
}
