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

//! # Simulation Time
//!
//! Time in the crossing simulator is continuous and measured in seconds.
//! Two newtypes keep points and durations apart:
//!
//! - `TimePoint`: an absolute instant on the simulation clock.
//! - `TimeDelta`: a signed span between two instants.
//!
//! Only the physically meaningful combinations are provided:
//! `TimePoint - TimePoint = TimeDelta`, `TimePoint ± TimeDelta = TimePoint`,
//! and `TimeDelta ± TimeDelta = TimeDelta`.

use num_traits::Zero;
use std::{
    cmp::Ordering,
    fmt::Display,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct TimePoint(f64);

impl TimePoint {
    #[inline]
    pub const fn new(seconds: f64) -> Self {
        TimePoint(seconds)
    }

    #[inline]
    pub const fn zero() -> Self {
        TimePoint(0.0)
    }

    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// Total order over time points, with NaN sorted last.
    #[inline]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }

    #[inline]
    pub fn max(self, other: Self) -> Self {
        TimePoint(self.0.max(other.0))
    }

    #[inline]
    pub fn min(self, other: Self) -> Self {
        TimePoint(self.0.min(other.0))
    }
}

impl Display for TimePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TimePoint({:.3})", self.0)
    }
}

impl From<f64> for TimePoint {
    #[inline]
    fn from(v: f64) -> Self {
        TimePoint(v)
    }
}

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct TimeDelta(f64);

impl TimeDelta {
    #[inline]
    pub const fn new(seconds: f64) -> Self {
        TimeDelta(seconds)
    }

    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn abs(self) -> Self {
        TimeDelta(self.0.abs())
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0.0
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    #[inline]
    pub fn clamp(self, min: TimeDelta, max: TimeDelta) -> TimeDelta {
        assert!(min <= max, "min must be <= max");
        if self < min {
            min
        } else if self > max {
            max
        } else {
            self
        }
    }
}

impl Display for TimeDelta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TimeDelta({:.3})", self.0)
    }
}

impl From<f64> for TimeDelta {
    #[inline]
    fn from(v: f64) -> Self {
        TimeDelta(v)
    }
}

impl Zero for TimeDelta {
    #[inline]
    fn zero() -> Self {
        TimeDelta(0.0)
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl Add<TimeDelta> for TimePoint {
    type Output = TimePoint;

    #[inline]
    fn add(self, rhs: TimeDelta) -> Self::Output {
        TimePoint(self.0 + rhs.0)
    }
}

impl AddAssign<TimeDelta> for TimePoint {
    #[inline]
    fn add_assign(&mut self, rhs: TimeDelta) {
        self.0 += rhs.0;
    }
}

impl Sub<TimeDelta> for TimePoint {
    type Output = TimePoint;

    #[inline]
    fn sub(self, rhs: TimeDelta) -> Self::Output {
        TimePoint(self.0 - rhs.0)
    }
}

impl SubAssign<TimeDelta> for TimePoint {
    #[inline]
    fn sub_assign(&mut self, rhs: TimeDelta) {
        self.0 -= rhs.0;
    }
}

impl Sub<TimePoint> for TimePoint {
    type Output = TimeDelta;

    #[inline]
    fn sub(self, rhs: TimePoint) -> Self::Output {
        TimeDelta(self.0 - rhs.0)
    }
}

impl Add for TimeDelta {
    type Output = TimeDelta;

    #[inline]
    fn add(self, rhs: TimeDelta) -> Self::Output {
        TimeDelta(self.0 + rhs.0)
    }
}

impl AddAssign for TimeDelta {
    #[inline]
    fn add_assign(&mut self, rhs: TimeDelta) {
        self.0 += rhs.0;
    }
}

impl Sub for TimeDelta {
    type Output = TimeDelta;

    #[inline]
    fn sub(self, rhs: TimeDelta) -> Self::Output {
        TimeDelta(self.0 - rhs.0)
    }
}

impl SubAssign for TimeDelta {
    #[inline]
    fn sub_assign(&mut self, rhs: TimeDelta) {
        self.0 -= rhs.0;
    }
}

impl Mul<f64> for TimeDelta {
    type Output = TimeDelta;

    #[inline]
    fn mul(self, rhs: f64) -> Self::Output {
        TimeDelta(self.0 * rhs)
    }
}

impl Neg for TimeDelta {
    type Output = TimeDelta;

    #[inline]
    fn neg(self) -> Self::Output {
        TimeDelta(-self.0)
    }
}

impl std::iter::Sum for TimeDelta {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(TimeDelta::zero(), |acc, d| acc + d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_minus_point_is_delta() {
        let a = TimePoint::new(5.0);
        let b = TimePoint::new(4.0);
        assert_eq!(a - b, TimeDelta::new(1.0));
        assert_eq!(b - a, TimeDelta::new(-1.0));
    }

    #[test]
    fn test_point_plus_delta() {
        let mut t = TimePoint::new(1.5);
        t += TimeDelta::new(2.0);
        assert_eq!(t, TimePoint::new(3.5));
        assert_eq!(t - TimeDelta::new(0.5), TimePoint::new(3.0));
    }

    #[test]
    fn test_delta_zero_and_sum() {
        assert!(TimeDelta::zero().is_zero());
        let total: TimeDelta = [1.0, 2.0, 0.5].into_iter().map(TimeDelta::new).sum();
        assert_eq!(total, TimeDelta::new(3.5));
    }

    #[test]
    fn test_delta_clamp() {
        let lo = TimeDelta::new(0.0);
        let hi = TimeDelta::new(1.0);
        assert_eq!(TimeDelta::new(-3.0).clamp(lo, hi), lo);
        assert_eq!(TimeDelta::new(3.0).clamp(lo, hi), hi);
        assert_eq!(TimeDelta::new(0.25).clamp(lo, hi), TimeDelta::new(0.25));
    }

    #[test]
    #[should_panic(expected = "min must be <= max")]
    fn test_delta_clamp_inverted_bounds_panics() {
        let _ = TimeDelta::new(0.5).clamp(TimeDelta::new(1.0), TimeDelta::new(0.0));
    }

    #[test]
    fn test_total_cmp_orders_nan_last() {
        let a = TimePoint::new(1.0);
        let nan = TimePoint::new(f64::NAN);
        assert_eq!(a.total_cmp(&nan), Ordering::Less);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", TimePoint::new(1.0)), "TimePoint(1.000)");
        assert_eq!(format!("{}", TimeDelta::new(0.01)), "TimeDelta(0.010)");
    }
}
