// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Kinematic quantities used when checking whether a vehicle can clear an
//! intersection exit: `Velocity` (m/s), `Acceleration` (m/s²) and
//! `Distance` (m).

use crate::time::TimeDelta;
use num_traits::Zero;
use std::{
    fmt::Display,
    ops::{Add, AddAssign, Mul, Sub, SubAssign},
};

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Velocity(f64);

impl Velocity {
    #[inline]
    pub const fn new(meters_per_second: f64) -> Self {
        Velocity(meters_per_second)
    }

    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn min(self, other: Velocity) -> Velocity {
        Velocity(self.0.min(other.0))
    }
}

impl Display for Velocity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3} m/s", self.0)
    }
}

impl Mul<TimeDelta> for Velocity {
    type Output = Distance;

    #[inline]
    fn mul(self, rhs: TimeDelta) -> Self::Output {
        Distance(self.0 * rhs.value())
    }
}

impl Mul<Velocity> for TimeDelta {
    type Output = Distance;

    #[inline]
    fn mul(self, rhs: Velocity) -> Self::Output {
        rhs * self
    }
}

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Acceleration(f64);

impl Acceleration {
    #[inline]
    pub const fn new(meters_per_second_squared: f64) -> Self {
        Acceleration(meters_per_second_squared)
    }

    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn magnitude(self) -> f64 {
        self.0.abs()
    }
}

impl Display for Acceleration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3} m/s^2", self.0)
    }
}

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Distance(f64);

impl Distance {
    #[inline]
    pub const fn new(meters: f64) -> Self {
        Distance(meters)
    }

    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3} m", self.0)
    }
}

impl Zero for Distance {
    #[inline]
    fn zero() -> Self {
        Distance(0.0)
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl Add for Distance {
    type Output = Distance;

    #[inline]
    fn add(self, rhs: Distance) -> Self::Output {
        Distance(self.0 + rhs.0)
    }
}

impl AddAssign for Distance {
    #[inline]
    fn add_assign(&mut self, rhs: Distance) {
        self.0 += rhs.0;
    }
}

impl Sub for Distance {
    type Output = Distance;

    #[inline]
    fn sub(self, rhs: Distance) -> Self::Output {
        Distance(self.0 - rhs.0)
    }
}

impl SubAssign for Distance {
    #[inline]
    fn sub_assign(&mut self, rhs: Distance) {
        self.0 -= rhs.0;
    }
}

impl std::iter::Sum for Distance {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Distance::zero(), |acc, d| acc + d)
    }
}

/// Distance needed to brake from `velocity` to a standstill.
///
/// The sign of `max_deceleration` is ignored. A zero deceleration yields an
/// infinite distance.
#[inline]
pub fn stopping_distance(velocity: Velocity, max_deceleration: Acceleration) -> Distance {
    let v = velocity.value();
    Distance::new(v * v / (2.0 * max_deceleration.magnitude()))
}
