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

use crate::err::VehicleSpecError;
use crossing_core::{Acceleration, Distance, TimeDelta};

/// The parts of a vehicle's specification the admission layer needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleSpec {
    length: Distance,
    max_deceleration: Acceleration,
}

impl VehicleSpec {
    pub fn new(length: Distance, max_deceleration: Acceleration) -> Result<Self, VehicleSpecError> {
        if length.value() <= 0.0 || !length.is_finite() {
            return Err(VehicleSpecError::NonPositiveLength(length));
        }
        let decel = max_deceleration.value();
        if decel == 0.0 || !decel.is_finite() {
            return Err(VehicleSpecError::ZeroDeceleration);
        }
        Ok(Self {
            length,
            max_deceleration,
        })
    }

    #[inline]
    pub fn length(&self) -> Distance {
        self.length
    }

    #[inline]
    pub fn max_deceleration(&self) -> Acceleration {
        self.max_deceleration
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelerationSegment {
    acceleration: Acceleration,
    duration: TimeDelta,
}

impl AccelerationSegment {
    #[inline]
    pub fn new(acceleration: Acceleration, duration: TimeDelta) -> Self {
        Self {
            acceleration,
            duration,
        }
    }

    #[inline]
    pub fn acceleration(&self) -> Acceleration {
        self.acceleration
    }

    #[inline]
    pub fn duration(&self) -> TimeDelta {
        self.duration
    }
}

/// Piecewise-constant acceleration a vehicle must follow through the
/// intersection interior once its reservation is confirmed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccelerationProfile(Vec<AccelerationSegment>);

impl AccelerationProfile {
    #[inline]
    pub fn new(segments: Vec<AccelerationSegment>) -> Self {
        Self(segments)
    }

    /// A profile holding the current velocity for `duration`.
    #[inline]
    pub fn constant(duration: TimeDelta) -> Self {
        Self(vec![AccelerationSegment::new(
            Acceleration::new(0.0),
            duration,
        )])
    }

    #[inline]
    pub fn segments(&self) -> &[AccelerationSegment] {
        &self.0
    }

    #[inline]
    pub fn total_duration(&self) -> TimeDelta {
        self.0.iter().map(|s| s.duration()).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_spec_rejects_non_positive_length() {
        let err = VehicleSpec::new(Distance::new(0.0), Acceleration::new(-4.0)).unwrap_err();
        assert_eq!(err, VehicleSpecError::NonPositiveLength(Distance::new(0.0)));
    }

    #[test]
    fn test_vehicle_spec_rejects_zero_deceleration() {
        let err = VehicleSpec::new(Distance::new(4.5), Acceleration::new(0.0)).unwrap_err();
        assert_eq!(err, VehicleSpecError::ZeroDeceleration);
    }

    #[test]
    fn test_vehicle_spec_accepts_either_sign_of_deceleration() {
        assert!(VehicleSpec::new(Distance::new(4.5), Acceleration::new(-4.0)).is_ok());
        assert!(VehicleSpec::new(Distance::new(4.5), Acceleration::new(4.0)).is_ok());
    }

    #[test]
    fn test_profile_total_duration() {
        let p = AccelerationProfile::new(vec![
            AccelerationSegment::new(Acceleration::new(1.0), TimeDelta::new(0.5)),
            AccelerationSegment::new(Acceleration::new(0.0), TimeDelta::new(1.5)),
        ]);
        assert_eq!(p.total_duration(), TimeDelta::new(2.0));
        assert!(AccelerationProfile::default().is_empty());
    }
}
