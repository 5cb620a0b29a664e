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

//! Intersection-to-vehicle replies.

use crate::{
    id::{IntersectionId, LaneId, RequestId, ReservationId, Vin},
    vehicle::AccelerationProfile,
};
use crossing_core::{Distance, TimeDelta, TimePoint, Velocity};
use std::fmt::Display;

/// Why a request was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RejectReason {
    /// Every proposal arrives at or before the current time.
    ArrivalTimeTooLate,
    /// Every remaining proposal arrives beyond the reservation horizon.
    ArrivalTimeTooLarge,
    /// No proposal found room in both the interior and the exit zone.
    NoClearPath,
    /// The vehicle already holds a confirmed reservation.
    ConfirmedAnotherRequest,
}

impl RejectReason {
    pub const ALL: [RejectReason; 4] = [
        RejectReason::ArrivalTimeTooLate,
        RejectReason::ArrivalTimeTooLarge,
        RejectReason::NoClearPath,
        RejectReason::ConfirmedAnotherRequest,
    ];
}

impl Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RejectReason::ArrivalTimeTooLate => "ARRIVAL_TIME_TOO_LATE",
            RejectReason::ArrivalTimeTooLarge => "ARRIVAL_TIME_TOO_LARGE",
            RejectReason::NoClearPath => "NO_CLEAR_PATH",
            RejectReason::ConfirmedAnotherRequest => "CONFIRMED_ANOTHER_REQUEST",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Confirm {
    sender: IntersectionId,
    vin: Vin,
    reservation_id: ReservationId,
    request_id: RequestId,
    arrival_time: TimePoint,
    early_error: TimeDelta,
    late_error: TimeDelta,
    arrival_velocity: Velocity,
    arrival_lane: LaneId,
    departure_lane: LaneId,
    max_zone_size: Distance,
    acceleration_profile: AccelerationProfile,
}

impl Confirm {
    #[allow(clippy::too_many_arguments)]
    #[inline]
    pub fn new(
        sender: IntersectionId,
        vin: Vin,
        reservation_id: ReservationId,
        request_id: RequestId,
        arrival_time: TimePoint,
        early_error: TimeDelta,
        late_error: TimeDelta,
        arrival_velocity: Velocity,
        arrival_lane: LaneId,
        departure_lane: LaneId,
        max_zone_size: Distance,
        acceleration_profile: AccelerationProfile,
    ) -> Self {
        Self {
            sender,
            vin,
            reservation_id,
            request_id,
            arrival_time,
            early_error,
            late_error,
            arrival_velocity,
            arrival_lane,
            departure_lane,
            max_zone_size,
            acceleration_profile,
        }
    }

    #[inline]
    pub fn sender(&self) -> IntersectionId {
        self.sender
    }

    #[inline]
    pub fn vin(&self) -> Vin {
        self.vin
    }

    #[inline]
    pub fn reservation_id(&self) -> ReservationId {
        self.reservation_id
    }

    #[inline]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[inline]
    pub fn arrival_time(&self) -> TimePoint {
        self.arrival_time
    }

    #[inline]
    pub fn early_error(&self) -> TimeDelta {
        self.early_error
    }

    #[inline]
    pub fn late_error(&self) -> TimeDelta {
        self.late_error
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
    pub fn max_zone_size(&self) -> Distance {
        self.max_zone_size
    }

    #[inline]
    pub fn acceleration_profile(&self) -> &AccelerationProfile {
        &self.acceleration_profile
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reject {
    sender: IntersectionId,
    vin: Vin,
    request_id: RequestId,
    retry_after: TimePoint,
    reason: RejectReason,
}

impl Reject {
    #[inline]
    pub fn new(
        sender: IntersectionId,
        vin: Vin,
        request_id: RequestId,
        retry_after: TimePoint,
        reason: RejectReason,
    ) -> Self {
        Self {
            sender,
            vin,
            request_id,
            retry_after,
            reason,
        }
    }

    #[inline]
    pub fn sender(&self) -> IntersectionId {
        self.sender
    }

    #[inline]
    pub fn vin(&self) -> Vin {
        self.vin
    }

    #[inline]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Earliest time the vehicle may send another request.
    #[inline]
    pub fn retry_after(&self) -> TimePoint {
        self.retry_after
    }

    #[inline]
    pub fn reason(&self) -> RejectReason {
        self.reason
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum I2VMessage {
    Confirm(Confirm),
    Reject(Reject),
}

impl I2VMessage {
    #[inline]
    pub fn vin(&self) -> Vin {
        match self {
            I2VMessage::Confirm(m) => m.vin(),
            I2VMessage::Reject(m) => m.vin(),
        }
    }

    #[inline]
    pub fn as_confirm(&self) -> Option<&Confirm> {
        match self {
            I2VMessage::Confirm(c) => Some(c),
            I2VMessage::Reject(_) => None,
        }
    }

    #[inline]
    pub fn as_reject(&self) -> Option<&Reject> {
        match self {
            I2VMessage::Confirm(_) => None,
            I2VMessage::Reject(r) => Some(r),
        }
    }
}

impl From<Confirm> for I2VMessage {
    fn from(value: Confirm) -> Self {
        I2VMessage::Confirm(value)
    }
}

impl From<Reject> for I2VMessage {
    fn from(value: Reject) -> Self {
        I2VMessage::Reject(value)
    }
}
