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

use std::ops::{Add, Sub};

use crate::geometry::Vector2;
use crate::numeric::scalar::Scalar;

/// Point of the parametric plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2<T: Scalar> {
    pub x: T,
    pub y: T,
}

impl<T: Scalar> Point2<T> {
    #[inline]
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn from_vals(coords: [T; 2]) -> Self {
        Self::new(coords[0], coords[1])
    }

    #[inline]
    pub fn coords(&self) -> [T; 2] {
        [self.x, self.y]
    }

    #[inline]
    pub fn square_distance(&self, other: &Point2<T>) -> T {
        (*other - *self).square_modulus()
    }

    #[inline]
    pub fn distance(&self, other: &Point2<T>) -> T {
        self.square_distance(other).sqrt()
    }

    /// True when both coordinates agree within `eps`.
    #[inline]
    pub fn is_equal(&self, other: &Point2<T>, eps: T) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }

    #[inline]
    pub fn midpoint(&self, other: &Point2<T>) -> Point2<T> {
        let h = T::half();
        Point2::new((self.x + other.x) * h, (self.y + other.y) * h)
    }

    /// Key used when vertices are sorted before insertion.
    #[inline]
    pub fn diagonal_key(&self) -> T {
        self.x + self.y
    }
}

impl<T: Scalar> Sub for Point2<T> {
    type Output = Vector2<T>;
    fn sub(self, rhs: Point2<T>) -> Vector2<T> {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl<T: Scalar> Add<Vector2<T>> for Point2<T> {
    type Output = Point2<T>;
    fn add(self, rhs: Vector2<T>) -> Point2<T> {
        Point2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<T: Scalar> Sub<Vector2<T>> for Point2<T> {
    type Output = Point2<T>;
    fn sub(self, rhs: Vector2<T>) -> Point2<T> {
        Point2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl<T: Scalar> From<[T; 2]> for Point2<T> {
    fn from(coords: [T; 2]) -> Self {
        Point2::from_vals(coords)
    }
}

impl<T: Scalar> From<(T, T)> for Point2<T> {
    fn from((x, y): (T, T)) -> Self {
        Point2::new(x, y)
    }
}
