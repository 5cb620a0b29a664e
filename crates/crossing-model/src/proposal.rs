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

use crate::id::LaneId;
use crossing_core::{TimePoint, Velocity};

/// A candidate space-time crossing offered by a vehicle.
///
/// A vehicle usually sends several proposals ordered by its own preference;
/// the admission layer grants the first one that fits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proposal {
    arrival_time: TimePoint,
    arrival_velocity: Velocity,
    arrival_lane: LaneId,
    departure_lane: LaneId,
    max_turn_velocity: Velocity,
}

impl Proposal {
    #[inline]
    pub fn new(
        arrival_time: TimePoint,
        arrival_velocity: Velocity,
        arrival_lane: LaneId,
        departure_lane: LaneId,
        max_turn_velocity: Velocity,
    ) -> Self {
        Self {
            arrival_time,
            arrival_velocity,
            arrival_lane,
            departure_lane,
            max_turn_velocity,
        }
    }

    #[inline]
    pub fn arrival_time(&self) -> TimePoint {
        self.arrival_time
    }

    #[inline]
    pub fn arrival_velocity(&self) -> Velocity {
        self.arrival_velocity
    }

    #[inline]
    pub fn arrival_lane(&self) -> LaneId {
        self.arrival_lane
    }

    #[inline]
    pub fn departure_lane(&self) -> LaneId {
        self.departure_lane
    }

    #[inline]
    pub fn max_turn_velocity(&self) -> Velocity {
        self.max_turn_velocity
    }

    #[inline]
    pub(crate) fn is_finite(&self) -> bool {
        self.arrival_time.is_finite()
            && self.arrival_velocity.value().is_finite()
            && self.max_turn_velocity.value().is_finite()
    }
}
