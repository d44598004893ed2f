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

use crate::geometry::{Circle2, Point2};
use crate::kernel::orientation::orient2d;
use crate::numeric::scalar::Scalar;

/// Outcome of a segment/segment intersection test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntFlag {
    NoIntersection,
    /// Segments cross at a single interior point.
    Cross,
    /// Segments share an end point and nothing else.
    EndPointTouch,
    /// An end point of one segment lies in the interior of the other.
    PointOnSegment,
    /// Collinear segments overlapping on a sub-segment.
    Glued,
    /// Collinear segments describing the same support.
    Same,
}

/// Position of a point relative to a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentPoint {
    Out,
    Inside,
    EndPoint,
}

impl SegmentPoint {
    #[inline]
    fn weight(self) -> i32 {
        match self {
            SegmentPoint::Out => 0,
            SegmentPoint::Inside => 1,
            SegmentPoint::EndPoint => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrianglePoint {
    In,
    OnEdge,
    OnVertex,
    Off,
}

/// Result of intersecting two supporting lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineIntersection<T: Scalar> {
    Parallel,
    Same,
    /// Intersection point and its parameter on each segment (0 at start, 1 at end).
    Cross { point: Point2<T>, params: [T; 2] },
}

/// Segment intersection outcome with the intersection point when one exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentIntersection<T: Scalar> {
    pub flag: IntFlag,
    pub point: Option<Point2<T>>,
}

impl<T: Scalar> SegmentIntersection<T> {
    fn none() -> Self {
        SegmentIntersection {
            flag: IntFlag::NoIntersection,
            point: None,
        }
    }

    fn of(flag: IntFlag, point: Option<Point2<T>>) -> Self {
        SegmentIntersection { flag, point }
    }
}

pub fn are_equal<T: Scalar>(p1: &Point2<T>, p2: &Point2<T>, eps: T) -> bool {
    p1.is_equal(p2, eps)
}

pub fn are_collinear<T: Scalar>(a: &Point2<T>, b: &Point2<T>, c: &Point2<T>, eps: T) -> bool {
    let ab = *b - *a;
    let ac = *c - *a;
    let scale = ab.modulus().max(ac.modulus());
    if scale <= eps {
        return true;
    }
    (ab.cross(&ac) / scale).abs() <= eps
}

/// Classifies `p` against the segment `start -> end` with tolerance `prec`.
pub fn classify_point<T: Scalar>(
    start: &Point2<T>,
    end: &Point2<T>,
    p: &Point2<T>,
    prec: T,
) -> SegmentPoint {
    let dir = *end - *start;
    let to_p = *p - *start;

    let cross = dir.cross(&to_p).abs();
    if cross > prec {
        let sq_dist = cross * cross / dir.square_modulus();
        if sq_dist > prec * prec {
            return SegmentPoint::Out;
        }
    }

    // opposite direction on either axis
    if dir.x * to_p.x < T::zero() || dir.y * to_p.y < T::zero() {
        return SegmentPoint::Out;
    }

    if dir.square_modulus() < to_p.square_modulus() {
        return SegmentPoint::Out;
    }

    if p.is_equal(start, prec) || p.is_equal(end, prec) {
        return SegmentPoint::EndPoint;
    }

    SegmentPoint::Inside
}

pub fn is_point_on_segment<T: Scalar>(
    p: &Point2<T>,
    start: &Point2<T>,
    end: &Point2<T>,
    prec: T,
) -> bool {
    classify_point(start, end, p, prec) != SegmentPoint::Out
}

/// Intersection of the lines supporting `s1 -> e1` and `s2 -> e2`.
pub fn int_lin_lin<T: Scalar>(
    s1: &Point2<T>,
    e1: &Point2<T>,
    s2: &Point2<T>,
    e2: &Point2<T>,
) -> LineIntersection<T> {
    let d1 = *e1 - *s1;
    let d2 = *e2 - *s2;
    let o1o2 = *s2 - *s1;

    let cross_d1d2 = d1.cross(&d2);
    let cross_d1d3 = o1o2.cross(&d2);

    let resolution = T::min_positive_value();
    if cross_d1d2.abs() < resolution {
        return if cross_d1d3.abs() < resolution {
            LineIntersection::Same
        } else {
            LineIntersection::Parallel
        };
    }

    let t1 = cross_d1d3 / cross_d1d2;
    let t2 = o1o2.cross(&d1) / cross_d1d2;
    LineIntersection::Cross {
        point: *s1 + d1 * t1,
        params: [t1, t2],
    }
}

/// Intersects two segments.
///
/// `consider_end_point_touch` reports segments sharing an end point as
/// [`IntFlag::EndPointTouch`]; `consider_point_on_segment` reports an end
/// point lying on the other segment as [`IntFlag::PointOnSegment`].
/// Otherwise those configurations are [`IntFlag::NoIntersection`].
pub fn int_seg_seg<T: Scalar>(
    s1: &Point2<T>,
    e1: &Point2<T>,
    s2: &Point2<T>,
    e2: &Point2<T>,
    consider_end_point_touch: bool,
    consider_point_on_segment: bool,
    prec: T,
) -> SegmentIntersection<T> {
    let hash = [
        classify_point(s1, e1, s2, prec),
        classify_point(s1, e1, e2, prec),
        classify_point(s2, e2, s1, prec),
        classify_point(s2, e2, e1, prec),
    ];

    // shared vertex
    if hash[0] == SegmentPoint::EndPoint || hash[1] == SegmentPoint::EndPoint {
        return if consider_end_point_touch {
            SegmentIntersection::of(IntFlag::EndPointTouch, None)
        } else {
            SegmentIntersection::none()
        };
    }

    let pos_hash: i32 = hash.iter().map(|h| h.weight()).sum();
    if pos_hash == 1 {
        if !consider_point_on_segment {
            return SegmentIntersection::none();
        }
        let point = if hash[0] == SegmentPoint::Inside {
            *s2
        } else if hash[1] == SegmentPoint::Inside {
            *e2
        } else if hash[2] == SegmentPoint::Inside {
            *s1
        } else {
            *e1
        };
        return SegmentIntersection::of(IntFlag::PointOnSegment, Some(point));
    } else if pos_hash == 2 {
        return SegmentIntersection::of(IntFlag::Glued, None);
    }

    match int_lin_lin(s1, e1, s2, e2) {
        LineIntersection::Parallel => SegmentIntersection::none(),
        LineIntersection::Same => {
            if pos_hash < -2 {
                SegmentIntersection::of(IntFlag::Same, None)
            } else if pos_hash == -1 {
                SegmentIntersection::of(IntFlag::Glued, None)
            } else {
                SegmentIntersection::none()
            }
        }
        LineIntersection::Cross { point, params } => {
            let end = T::one() - prec;
            if params.iter().any(|&t| t < prec || t > end) {
                SegmentIntersection::none()
            } else {
                SegmentIntersection::of(IntFlag::Cross, Some(point))
            }
        }
    }
}

/// Circumcircle of `abc`, or `None` when the triangle is degenerate.
pub fn circumcircle<T: Scalar>(a: &Point2<T>, b: &Point2<T>, c: &Point2<T>) -> Option<Circle2<T>> {
    let ab = *b - *a;
    let ac = *c - *a;
    let cross = ab.cross(&ac);

    let scale = ab.modulus() * ac.modulus();
    if !(cross.abs() > T::epsilon() * scale) {
        return None;
    }

    let ab2 = ab.square_modulus();
    let ac2 = ac.square_modulus();
    let d = cross + cross;
    let ux = (ac.y * ab2 - ab.y * ac2) / d;
    let uy = (ab.x * ac2 - ac.x * ab2) / d;
    if !ux.is_finite() || !uy.is_finite() {
        return None;
    }

    Some(Circle2 {
        center: Point2::new(a.x + ux, a.y + uy),
        square_radius: ux * ux + uy * uy,
    })
}

/// Locates `p` against triangle `abc` (any winding), with tolerance `eps` on
/// the distance to each edge.
pub fn point_in_or_on_triangle<T: Scalar>(
    p: &Point2<T>,
    a: &Point2<T>,
    b: &Point2<T>,
    c: &Point2<T>,
    eps: T,
) -> TrianglePoint {
    let sign = if orient2d(a, b, c) < T::zero() {
        -T::one()
    } else {
        T::one()
    };

    let mut on = 0;
    for (s, e) in [(a, b), (b, c), (c, a)] {
        let dir = *e - *s;
        let len = dir.modulus();
        if !(len > T::zero()) {
            return TrianglePoint::Off;
        }
        let dist = sign * dir.cross(&(*p - *s)) / len;
        if dist < -eps {
            return TrianglePoint::Off;
        }
        if dist <= eps {
            on += 1;
        }
    }

    match on {
        0 => TrianglePoint::In,
        1 => TrianglePoint::OnEdge,
        _ => TrianglePoint::OnVertex,
    }
}

/// Shoelace area of a closed ring (positive for counter-clockwise rings).
pub fn polygon_signed_area<T: Scalar>(ring: &[Point2<T>]) -> T {
    let n = ring.len();
    if n < 3 {
        return T::zero();
    }
    let mut twice = T::zero();
    for i in 0..n {
        let p = &ring[i];
        let q = &ring[(i + 1) % n];
        twice = twice + (p.x * q.y - q.x * p.y);
    }
    twice * T::half()
}

/// Even-odd test of `p` against a closed ring (last point connects to first).
pub fn point_in_polygon<T: Scalar>(p: &Point2<T>, ring: &[Point2<T>]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (&ring[i], &ring[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
