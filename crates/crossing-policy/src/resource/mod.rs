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

//! Contracts of the collaborators that own the shared space-time resources.
//!
//! The admission layer never touches resource state directly. It asks a
//! manager whether a candidate fits (`query`, side-effect free), commits a
//! plan it got back from that query (`accept`), and releases whatever a
//! vehicle holds (`cancel`, `away`).
//!
//! `accept` hands back a ticket that must equal the requesting VIN; the
//! policy treats any other value as an invariant violation.

pub mod memory;

use crossing_core::{Distance, TimePoint, Velocity};
use crossing_model::prelude::{
    AccelerationProfile, IntersectionId, LaneId, Proposal, VehicleSpec, Vin,
};
use std::fmt::Display;

/// Which kind of manager a failure or call refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Grid,
    ClearanceZone,
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Grid => write!(f, "reservation grid"),
            ResourceKind::ClearanceZone => write!(f, "clearance zone"),
        }
    }
}

/// A manager refused to commit a plan it produced itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AcceptError {
    vin: Vin,
    resource: ResourceKind,
}

impl AcceptError {
    #[inline]
    pub fn new(vin: Vin, resource: ResourceKind) -> Self {
        Self { vin, resource }
    }

    #[inline]
    pub fn vin(&self) -> Vin {
        self.vin
    }

    #[inline]
    pub fn resource(&self) -> ResourceKind {
        self.resource
    }
}

impl Display for AcceptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "The {} refused to accept the plan of {}",
            self.resource, self.vin
        )
    }
}

impl std::error::Error for AcceptError {}

/// Candidate crossing of the intersection interior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridQuery {
    vin: Vin,
    proposal: Proposal,
    spec: VehicleSpec,
    accelerating: bool,
}

impl GridQuery {
    #[inline]
    pub fn new(vin: Vin, proposal: Proposal, spec: VehicleSpec) -> Self {
        Self {
            vin,
            proposal,
            spec,
            accelerating: true,
        }
    }

    #[inline]
    pub fn vin(&self) -> Vin {
        self.vin
    }

    #[inline]
    pub fn arrival_time(&self) -> TimePoint {
        self.proposal.arrival_time()
    }

    #[inline]
    pub fn arrival_velocity(&self) -> Velocity {
        self.proposal.arrival_velocity()
    }

    #[inline]
    pub fn arrival_lane(&self) -> LaneId {
        self.proposal.arrival_lane()
    }

    #[inline]
    pub fn departure_lane(&self) -> LaneId {
        self.proposal.departure_lane()
    }

    #[inline]
    pub fn max_turn_velocity(&self) -> Velocity {
        self.proposal.max_turn_velocity()
    }

    #[inline]
    pub fn spec(&self) -> &VehicleSpec {
        &self.spec
    }

    /// Whether the vehicle may accelerate inside the intersection.
    #[inline]
    pub fn accelerating(&self) -> bool {
        self.accelerating
    }
}

/// Candidate occupation of the clearance zone past the exit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneQuery {
    vin: Vin,
    entry_time: TimePoint,
    entry_velocity: Velocity,
    vehicle_length: Distance,
    stopping_distance: Distance,
}

impl ZoneQuery {
    #[inline]
    pub fn new(
        vin: Vin,
        entry_time: TimePoint,
        entry_velocity: Velocity,
        vehicle_length: Distance,
        stopping_distance: Distance,
    ) -> Self {
        Self {
            vin,
            entry_time,
            entry_velocity,
            vehicle_length,
            stopping_distance,
        }
    }

    #[inline]
    pub fn vin(&self) -> Vin {
        self.vin
    }

    #[inline]
    pub fn entry_time(&self) -> TimePoint {
        self.entry_time
    }

    #[inline]
    pub fn entry_velocity(&self) -> Velocity {
        self.entry_velocity
    }

    #[inline]
    pub fn vehicle_length(&self) -> Distance {
        self.vehicle_length
    }

    #[inline]
    pub fn stopping_distance(&self) -> Distance {
        self.stopping_distance
    }

    /// Room the vehicle needs in the zone: its own length plus the distance
    /// it needs to brake to a standstill.
    #[inline]
    pub fn footprint(&self) -> Distance {
        self.vehicle_length + self.stopping_distance
    }
}

pub trait GridPlan {
    fn vin(&self) -> Vin;
    fn exit_time(&self) -> TimePoint;
    fn exit_velocity(&self) -> Velocity;
    fn acceleration_profile(&self) -> &AccelerationProfile;
}

pub trait ZonePlan {
    fn vin(&self) -> Vin;
}

/// Space-time occupancy of the intersection interior.
pub trait GridManager {
    type Plan: GridPlan;

    fn query(&self, query: &GridQuery) -> Option<Self::Plan>;
    fn accept(&mut self, plan: Self::Plan) -> Result<Vin, AcceptError>;
    /// Releases everything `vin` holds. Must be a no-op for unknown VINs.
    fn cancel(&mut self, vin: Vin);
}

/// Occupancy of the exit lane just past the intersection.
pub trait ClearanceZoneManager {
    type Plan: ZonePlan;

    fn max_size(&self) -> Distance;
    fn query(&self, query: &ZoneQuery) -> Option<Self::Plan>;
    fn accept(&mut self, plan: Self::Plan) -> Result<Vin, AcceptError>;
    /// Releases everything `vin` holds. Must be a no-op for unknown VINs.
    fn cancel(&mut self, vin: Vin);
    /// Releases `vin` because it drove out of the zone.
    fn away(&mut self, vin: Vin);
}

pub trait Clock {
    fn now(&self) -> TimePoint;
}

pub trait IntersectionTopology {
    fn id(&self) -> IntersectionId;
    /// All lanes feeding or leaving the intersection, in ascending order.
    fn lanes(&self) -> Vec<LaneId>;
}

/// The intersection controller as seen from a policy: it owns the grid and
/// one clearance zone per departure lane.
pub trait IntersectionManager: Clock + IntersectionTopology {
    type Grid: GridManager;
    type Zone: ClearanceZoneManager;

    fn grid_manager(&self) -> &Self::Grid;
    fn grid_manager_mut(&mut self) -> &mut Self::Grid;
    fn clearance_zone(&self, lane: LaneId) -> Option<&Self::Zone>;
    fn clearance_zone_mut(&mut self, lane: LaneId) -> Option<&mut Self::Zone>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossing_core::Acceleration;

    #[test]
    fn test_grid_query_reads_through_proposal() {
        let prop = Proposal::new(
            TimePoint::new(5.0),
            Velocity::new(10.0),
            LaneId::new(2),
            LaneId::new(6),
            Velocity::new(7.0),
        );
        let spec = VehicleSpec::new(Distance::new(4.0), Acceleration::new(-4.0)).unwrap();
        let q = GridQuery::new(Vin::new(9), prop, spec);
        assert_eq!(q.arrival_lane(), LaneId::new(2));
        assert_eq!(q.departure_lane(), LaneId::new(6));
        assert_eq!(q.max_turn_velocity(), Velocity::new(7.0));
        assert!(q.accelerating());
    }

    #[test]
    fn test_zone_footprint() {
        let q = ZoneQuery::new(
            Vin::new(1),
            TimePoint::new(6.0),
            Velocity::new(4.0),
            Distance::new(4.5),
            Distance::new(2.0),
        );
        assert_eq!(q.footprint(), Distance::new(6.5));
    }

    #[test]
    fn test_accept_error_display() {
        let e = AcceptError::new(Vin::new(3), ResourceKind::ClearanceZone);
        assert_eq!(
            e.to_string(),
            "The clearance zone refused to accept the plan of Vin(3)"
        );
    }
}
