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

use crate::geometry::{Point2, Vector2};
use crate::numeric::scalar::Scalar;

/// An axis-aligned bounding box of the parametric plane.
///
/// A freshly created box is void (min > max) and grows with [`Aabb2::add`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb2<T: Scalar> {
    pub min: Point2<T>,
    pub max: Point2<T>,
}

impl<T: Scalar> Default for Aabb2<T> {
    fn default() -> Self {
        Self::void()
    }
}

impl<T: Scalar> Aabb2<T> {
    pub fn new(min: Point2<T>, max: Point2<T>) -> Self {
        Aabb2 { min, max }
    }

    pub fn void() -> Self {
        Aabb2 {
            min: Point2::new(T::infinity(), T::infinity()),
            max: Point2::new(T::neg_infinity(), T::neg_infinity()),
        }
    }

    /// Build the smallest box containing two points.
    pub fn from_points(a: &Point2<T>, b: &Point2<T>) -> Self {
        Aabb2 {
            min: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn of_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Point2<T>>,
    {
        let mut bb = Self::void();
        for p in points {
            bb.add(p);
        }
        bb
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn add(&mut self, p: &Point2<T>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    /// Grows the box by `gap` on every side.
    pub fn enlarge(&mut self, gap: T) {
        if self.is_void() {
            return;
        }
        self.min.x = self.min.x - gap;
        self.min.y = self.min.y - gap;
        self.max.x = self.max.x + gap;
        self.max.y = self.max.y + gap;
    }

    pub fn union(&self, other: &Aabb2<T>) -> Aabb2<T> {
        let mut out = *self;
        if !other.is_void() {
            out.add(&other.min);
            out.add(&other.max);
        }
        out
    }

    /// True when the boxes are disjoint.
    #[inline]
    pub fn is_out(&self, other: &Aabb2<T>) -> bool {
        self.max.x < other.min.x
            || other.max.x < self.min.x
            || self.max.y < other.min.y
            || other.max.y < self.min.y
    }

    #[inline]
    pub fn contains_point(&self, p: &Point2<T>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn center(&self) -> Point2<T> {
        self.min.midpoint(&self.max)
    }

    pub fn extent(&self) -> Vector2<T> {
        if self.is_void() {
            Vector2::default()
        } else {
            self.max - self.min
        }
    }

    /// Return the axis index with largest extent.
    pub fn longest_axis(&self) -> usize {
        let e = self.extent();
        if e.y > e.x { 1 } else { 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_box_grows() {
        let mut bb = Aabb2::<f64>::void();
        assert!(bb.is_void());
        bb.add(&Point2::new(1.0, -1.0));
        bb.add(&Point2::new(-2.0, 3.0));
        assert!(!bb.is_void());
        assert_eq!(bb.min, Point2::new(-2.0, -1.0));
        assert_eq!(bb.max, Point2::new(1.0, 3.0));
        assert_eq!(bb.longest_axis(), 1);
    }

    #[test]
    fn test_is_out() {
        let a = Aabb2::from_points(&Point2::new(0.0, 0.0), &Point2::new(1.0, 1.0));
        let b = Aabb2::from_points(&Point2::new(1.0, 1.0), &Point2::new(2.0, 2.0));
        let c = Aabb2::from_points(&Point2::new(1.5, 0.0), &Point2::new(2.0, 0.5));
        assert!(!a.is_out(&b));
        assert!(a.is_out(&c));
    }

    #[test]
    fn test_enlarge() {
        let mut a = Aabb2::from_points(&Point2::new(0.0, 0.0), &Point2::new(1.0, 2.0));
        a.enlarge(0.5);
        assert_eq!(a.min, Point2::new(-0.5, -0.5));
        assert_eq!(a.extent(), Vector2::new(2.0, 3.0));
    }
}
