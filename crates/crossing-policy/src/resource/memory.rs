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

//! Small in-memory resource managers.
//!
//! `IntervalGridManager` reduces the interior to one time window per
//! movement (arrival lane to departure lane). Two windows conflict when they
//! overlap, unless both vehicles follow the same movement and are at least
//! one headway apart. `LaneClearanceZone` treats the exit lane as a
//! length budget shared by every vehicle currently owning part of it.

use crate::resource::{
    AcceptError, ClearanceZoneManager, Clock, GridManager, GridPlan, GridQuery,
    IntersectionManager, IntersectionTopology, ResourceKind, ZonePlan, ZoneQuery,
};
use crossing_core::{Distance, TimeDelta, TimePoint, Velocity};
use crossing_model::prelude::{AccelerationProfile, IntersectionId, LaneId, Vin};
use num_traits::Zero;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct IntervalGridPlan {
    vin: Vin,
    arrival_lane: LaneId,
    departure_lane: LaneId,
    entry_time: TimePoint,
    exit_time: TimePoint,
    exit_velocity: Velocity,
    profile: AccelerationProfile,
}

impl IntervalGridPlan {
    #[inline]
    pub fn entry_time(&self) -> TimePoint {
        self.entry_time
    }

    #[inline]
    pub fn arrival_lane(&self) -> LaneId {
        self.arrival_lane
    }

    #[inline]
    pub fn departure_lane(&self) -> LaneId {
        self.departure_lane
    }
}

impl GridPlan for IntervalGridPlan {
    #[inline]
    fn vin(&self) -> Vin {
        self.vin
    }

    #[inline]
    fn exit_time(&self) -> TimePoint {
        self.exit_time
    }

    #[inline]
    fn exit_velocity(&self) -> Velocity {
        self.exit_velocity
    }

    #[inline]
    fn acceleration_profile(&self) -> &AccelerationProfile {
        &self.profile
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct GridSlot {
    vin: Vin,
    arrival_lane: LaneId,
    departure_lane: LaneId,
    entry_time: TimePoint,
    exit_time: TimePoint,
}

impl GridSlot {
    #[inline]
    fn conflicts_with(&self, other: &GridSlot, headway: TimeDelta) -> bool {
        let same_movement =
            self.arrival_lane == other.arrival_lane && self.departure_lane == other.departure_lane;
        if same_movement {
            return (self.entry_time - other.entry_time).abs() < headway;
        }
        self.entry_time < other.exit_time && other.entry_time < self.exit_time
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntervalGridManager {
    crossing_time: TimeDelta,
    headway: TimeDelta,
    slots: Vec<GridSlot>,
}

impl IntervalGridManager {
    pub fn new(crossing_time: TimeDelta, headway: TimeDelta) -> Self {
        Self {
            crossing_time,
            headway,
            slots: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn holds(&self, vin: Vin) -> bool {
        self.slots.iter().any(|s| s.vin == vin)
    }

    /// Drops every window that ended at or before `now`.
    pub fn expire_before(&mut self, now: TimePoint) -> usize {
        let before = self.slots.len();
        self.slots.retain(|s| s.exit_time > now);
        before - self.slots.len()
    }

    #[inline]
    fn is_free(&self, slot: &GridSlot) -> bool {
        !self
            .slots
            .iter()
            .any(|s| s.vin != slot.vin && s.conflicts_with(slot, self.headway))
    }
}

impl GridManager for IntervalGridManager {
    type Plan = IntervalGridPlan;

    fn query(&self, query: &GridQuery) -> Option<Self::Plan> {
        let entry_time = query.arrival_time();
        let exit_time = entry_time + self.crossing_time;
        let slot = GridSlot {
            vin: query.vin(),
            arrival_lane: query.arrival_lane(),
            departure_lane: query.departure_lane(),
            entry_time,
            exit_time,
        };
        if !self.is_free(&slot) {
            return None;
        }
        Some(IntervalGridPlan {
            vin: query.vin(),
            arrival_lane: query.arrival_lane(),
            departure_lane: query.departure_lane(),
            entry_time,
            exit_time,
            exit_velocity: query.arrival_velocity().min(query.max_turn_velocity()),
            profile: AccelerationProfile::constant(self.crossing_time),
        })
    }

    fn accept(&mut self, plan: Self::Plan) -> Result<Vin, AcceptError> {
        let slot = GridSlot {
            vin: plan.vin,
            arrival_lane: plan.arrival_lane,
            departure_lane: plan.departure_lane,
            entry_time: plan.entry_time,
            exit_time: plan.exit_time,
        };
        if !self.is_free(&slot) {
            return Err(AcceptError::new(plan.vin, ResourceKind::Grid));
        }
        self.slots.push(slot);
        Ok(plan.vin)
    }

    fn cancel(&mut self, vin: Vin) {
        self.slots.retain(|s| s.vin != vin);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneZonePlan {
    vin: Vin,
    footprint: Distance,
}

impl LaneZonePlan {
    #[inline]
    pub fn footprint(&self) -> Distance {
        self.footprint
    }
}

impl ZonePlan for LaneZonePlan {
    #[inline]
    fn vin(&self) -> Vin {
        self.vin
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaneClearanceZone {
    max_size: Distance,
    occupants: Vec<(Vin, Distance)>,
}

impl LaneClearanceZone {
    pub fn new(max_size: Distance) -> Self {
        Self {
            max_size,
            occupants: Vec::new(),
        }
    }

    #[inline]
    pub fn used(&self) -> Distance {
        self.occupants.iter().map(|(_, d)| *d).sum()
    }

    #[inline]
    pub fn holds(&self, vin: Vin) -> bool {
        self.occupants.iter().any(|(v, _)| *v == vin)
    }

    #[inline]
    fn fits(&self, footprint: Distance) -> bool {
        footprint.is_finite() && self.used() + footprint <= self.max_size
    }

    #[inline]
    fn release(&mut self, vin: Vin) {
        self.occupants.retain(|(v, _)| *v != vin);
    }
}

impl ClearanceZoneManager for LaneClearanceZone {
    type Plan = LaneZonePlan;

    #[inline]
    fn max_size(&self) -> Distance {
        self.max_size
    }

    fn query(&self, query: &ZoneQuery) -> Option<Self::Plan> {
        let footprint = query.footprint();
        if !self.fits(footprint) {
            return None;
        }
        Some(LaneZonePlan {
            vin: query.vin(),
            footprint,
        })
    }

    fn accept(&mut self, plan: Self::Plan) -> Result<Vin, AcceptError> {
        if !self.fits(plan.footprint) {
            return Err(AcceptError::new(plan.vin, ResourceKind::ClearanceZone));
        }
        self.occupants.push((plan.vin, plan.footprint));
        Ok(plan.vin)
    }

    fn cancel(&mut self, vin: Vin) {
        self.release(vin);
    }

    fn away(&mut self, vin: Vin) {
        self.release(vin);
    }
}

/// A self-contained intersection: one interval grid plus one clearance zone
/// per lane, driven by an explicit clock.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleIntersection {
    id: IntersectionId,
    now: TimePoint,
    grid: IntervalGridManager,
    zones: BTreeMap<LaneId, LaneClearanceZone>,
}

impl SimpleIntersection {
    pub fn new(
        id: IntersectionId,
        lanes: impl IntoIterator<Item = LaneId>,
        grid: IntervalGridManager,
        zone_size: Distance,
    ) -> Self {
        let zones = lanes
            .into_iter()
            .map(|l| (l, LaneClearanceZone::new(zone_size)))
            .collect();
        Self {
            id,
            now: TimePoint::zero(),
            grid,
            zones,
        }
    }

    /// Moves the clock forward and lets finished grid windows expire.
    pub fn advance(&mut self, dt: TimeDelta) {
        if dt.is_zero() {
            return;
        }
        self.now += dt;
        self.grid.expire_before(self.now);
    }

    #[inline]
    pub fn set_time(&mut self, now: TimePoint) {
        self.now = now;
        self.grid.expire_before(now);
    }
}

impl Clock for SimpleIntersection {
    #[inline]
    fn now(&self) -> TimePoint {
        self.now
    }
}

impl IntersectionTopology for SimpleIntersection {
    #[inline]
    fn id(&self) -> IntersectionId {
        self.id
    }

    fn lanes(&self) -> Vec<LaneId> {
        self.zones.keys().copied().collect()
    }
}

impl IntersectionManager for SimpleIntersection {
    type Grid = IntervalGridManager;
    type Zone = LaneClearanceZone;

    #[inline]
    fn grid_manager(&self) -> &Self::Grid {
        &self.grid
    }

    #[inline]
    fn grid_manager_mut(&mut self) -> &mut Self::Grid {
        &mut self.grid
    }

    #[inline]
    fn clearance_zone(&self, lane: LaneId) -> Option<&Self::Zone> {
        self.zones.get(&lane)
    }

    #[inline]
    fn clearance_zone_mut(&mut self, lane: LaneId) -> Option<&mut Self::Zone> {
        self.zones.get_mut(&lane)
    }
}
