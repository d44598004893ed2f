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

use std::fmt::Debug;

use num_traits::{Float, FloatConst};

/// Coordinate type of the triangulation.
///
/// Every predicate in this crate is tolerance driven, so the coordinate type
/// only has to behave like an IEEE float.
pub trait Scalar: Float + FloatConst + Debug + Default + Send + Sync + 'static {
    /// Converts an `f64` literal into the scalar type.
    fn lit(v: f64) -> Self;

    /// Lossy widening used by the spatial hashes.
    fn as_f64(self) -> f64;

    fn from_num_den(num: i32, den: i32) -> Self {
        Self::lit(num as f64 / den as f64)
    }

    #[inline]
    fn half() -> Self {
        Self::from_num_den(1, 2)
    }

    #[inline]
    fn is_positive(&self) -> bool {
        *self > Self::zero()
    }

    #[inline]
    fn is_negative(&self) -> bool {
        *self < Self::zero()
    }
}

impl Scalar for f64 {
    #[inline(always)]
    fn lit(v: f64) -> Self {
        v
    }

    #[inline(always)]
    fn as_f64(self) -> f64 {
        self
    }
}

impl Scalar for f32 {
    #[inline(always)]
    fn lit(v: f64) -> Self {
        v as f32
    }

    #[inline(always)]
    fn as_f64(self) -> f64 {
        self as f64
    }
}
