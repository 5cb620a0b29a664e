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

//! A scripted intersection whose managers record every call they receive.

use crate::resource::{
    AcceptError, ClearanceZoneManager, Clock, GridManager, GridPlan, GridQuery,
    IntersectionManager, IntersectionTopology, ResourceKind, ZonePlan, ZoneQuery,
};
use crossing_core::{Acceleration, Distance, TimeDelta, TimePoint, Velocity};
use crossing_model::prelude::{
    AccelerationProfile, IntersectionId, LaneId, Proposal, Request, RequestId, VehicleSpec, Vin,
};
use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Call {
    GridQuery(Vin),
    GridAccept(Vin),
    GridCancel(Vin),
    ZoneQuery(LaneId, Vin),
    ZoneAccept(LaneId, Vin),
    ZoneCancel(LaneId, Vin),
    ZoneAway(LaneId, Vin),
}

type CallLog = Rc<RefCell<Vec<Call>>>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScriptedGridPlan {
    vin: Vin,
    exit_time: TimePoint,
    exit_velocity: Velocity,
    profile: AccelerationProfile,
}

impl GridPlan for ScriptedGridPlan {
    fn vin(&self) -> Vin {
        self.vin
    }

    fn exit_time(&self) -> TimePoint {
        self.exit_time
    }

    fn exit_velocity(&self) -> Velocity {
        self.exit_velocity
    }

    fn acceleration_profile(&self) -> &AccelerationProfile {
        &self.profile
    }
}

#[derive(Debug)]
pub(crate) struct ScriptedGrid {
    log: CallLog,
    pub(crate) feasible: bool,
    /// Proposals arriving before this instant are refused.
    pub(crate) earliest: Option<TimePoint>,
    /// Refuse once this many vehicles hold the grid.
    pub(crate) capacity: Option<usize>,
    pub(crate) exit_velocity: Velocity,
    pub(crate) ticket_override: Option<Vin>,
    held: Vec<Vin>,
}

impl ScriptedGrid {
    pub(crate) fn held(&self) -> &[Vin] {
        &self.held
    }
}

impl GridManager for ScriptedGrid {
    type Plan = ScriptedGridPlan;

    fn query(&self, query: &GridQuery) -> Option<Self::Plan> {
        self.log.borrow_mut().push(Call::GridQuery(query.vin()));
        if !self.feasible
            || self.earliest.is_some_and(|t| query.arrival_time() < t)
            || self.capacity.is_some_and(|c| self.held.len() >= c)
        {
            return None;
        }
        Some(ScriptedGridPlan {
            vin: query.vin(),
            exit_time: query.arrival_time() + TimeDelta::new(1.0),
            exit_velocity: self.exit_velocity,
            profile: AccelerationProfile::constant(TimeDelta::new(1.0)),
        })
    }

    fn accept(&mut self, plan: Self::Plan) -> Result<Vin, AcceptError> {
        self.log.borrow_mut().push(Call::GridAccept(plan.vin));
        self.held.push(plan.vin);
        Ok(self.ticket_override.unwrap_or(plan.vin))
    }

    fn cancel(&mut self, vin: Vin) {
        self.log.borrow_mut().push(Call::GridCancel(vin));
        self.held.retain(|v| *v != vin);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScriptedZonePlan {
    vin: Vin,
}

impl ZonePlan for ScriptedZonePlan {
    fn vin(&self) -> Vin {
        self.vin
    }
}

#[derive(Debug)]
pub(crate) struct ScriptedZone {
    lane: LaneId,
    log: CallLog,
    max_size: Distance,
    pub(crate) feasible: bool,
    pub(crate) ticket_override: Option<Vin>,
    pub(crate) accept_fails: bool,
    /// Stopping distance seen by the last query.
    pub(crate) last_stopping_distance: RefCell<Option<Distance>>,
    held: Vec<Vin>,
}

impl ScriptedZone {
    pub(crate) fn held(&self) -> &[Vin] {
        &self.held
    }
}

impl ClearanceZoneManager for ScriptedZone {
    type Plan = ScriptedZonePlan;

    fn max_size(&self) -> Distance {
        self.max_size
    }

    fn query(&self, query: &ZoneQuery) -> Option<Self::Plan> {
        self.log
            .borrow_mut()
            .push(Call::ZoneQuery(self.lane, query.vin()));
        *self.last_stopping_distance.borrow_mut() = Some(query.stopping_distance());
        self.feasible.then_some(ScriptedZonePlan { vin: query.vin() })
    }

    fn accept(&mut self, plan: Self::Plan) -> Result<Vin, AcceptError> {
        self.log
            .borrow_mut()
            .push(Call::ZoneAccept(self.lane, plan.vin));
        if self.accept_fails {
            return Err(AcceptError::new(plan.vin, ResourceKind::ClearanceZone));
        }
        self.held.push(plan.vin);
        Ok(self.ticket_override.unwrap_or(plan.vin))
    }

    fn cancel(&mut self, vin: Vin) {
        self.log.borrow_mut().push(Call::ZoneCancel(self.lane, vin));
        self.held.retain(|v| *v != vin);
    }

    fn away(&mut self, vin: Vin) {
        self.log.borrow_mut().push(Call::ZoneAway(self.lane, vin));
        self.held.retain(|v| *v != vin);
    }
}

#[derive(Debug)]
pub(crate) struct ScriptedIntersection {
    now: TimePoint,
    lanes: Vec<LaneId>,
    log: CallLog,
    pub(crate) grid: ScriptedGrid,
    pub(crate) zones: BTreeMap<LaneId, ScriptedZone>,
}

impl ScriptedIntersection {
    /// Every lane gets a clearance zone of 40 m. The grid admits anything.
    pub(crate) fn new(lanes: &[u32]) -> Self {
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));
        let lanes: Vec<LaneId> = lanes.iter().copied().map(LaneId::new).collect();
        let zones = lanes
            .iter()
            .map(|&lane| {
                (
                    lane,
                    ScriptedZone {
                        lane,
                        log: Rc::clone(&log),
                        max_size: Distance::new(40.0),
                        feasible: true,
                        ticket_override: None,
                        accept_fails: false,
                        last_stopping_distance: RefCell::new(None),
                        held: Vec::new(),
                    },
                )
            })
            .collect();
        let grid = ScriptedGrid {
            log: Rc::clone(&log),
            feasible: true,
            earliest: None,
            capacity: None,
            exit_velocity: Velocity::new(3.0),
            ticket_override: None,
            held: Vec::new(),
        };
        Self {
            now: TimePoint::zero(),
            lanes,
            log,
            grid,
            zones,
        }
    }

    pub(crate) fn set_now(&mut self, now: f64) {
        self.now = TimePoint::new(now);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.log.borrow_mut().clear();
    }

    pub(crate) fn zone(&self, lane: u32) -> &ScriptedZone {
        &self.zones[&LaneId::new(lane)]
    }

    pub(crate) fn zone_mut(&mut self, lane: u32) -> &mut ScriptedZone {
        self.zones
            .get_mut(&LaneId::new(lane))
            .expect("scripted lane")
    }
}

impl Clock for ScriptedIntersection {
    fn now(&self) -> TimePoint {
        self.now
    }
}

impl IntersectionTopology for ScriptedIntersection {
    fn id(&self) -> IntersectionId {
        IntersectionId::new(1)
    }

    fn lanes(&self) -> Vec<LaneId> {
        self.lanes.clone()
    }
}

impl IntersectionManager for ScriptedIntersection {
    type Grid = ScriptedGrid;
    type Zone = ScriptedZone;

    fn grid_manager(&self) -> &Self::Grid {
        &self.grid
    }

    fn grid_manager_mut(&mut self) -> &mut Self::Grid {
        &mut self.grid
    }

    fn clearance_zone(&self, lane: LaneId) -> Option<&Self::Zone> {
        self.zones.get(&lane)
    }

    fn clearance_zone_mut(&mut self, lane: LaneId) -> Option<&mut Self::Zone> {
        self.zones.get_mut(&lane)
    }
}

/// A proposal arriving at `arrival` at 10 m/s, crossing `from` to `to`.
pub(crate) fn proposal(arrival: f64, from: u32, to: u32) -> Proposal {
    Proposal::new(
        TimePoint::new(arrival),
        Velocity::new(10.0),
        LaneId::new(from),
        LaneId::new(to),
        Velocity::new(5.0),
    )
}

pub(crate) fn spec() -> VehicleSpec {
    VehicleSpec::new(Distance::new(4.0), Acceleration::new(-3.0)).expect("valid spec")
}

pub(crate) fn request(vin: u32, request_id: u32, proposals: &[(f64, u32, u32)]) -> Request {
    let proposals = proposals
        .iter()
        .map(|&(t, from, to)| proposal(t, from, to))
        .collect();
    Request::new(Vin::new(vin), RequestId::new(request_id), proposals, spec())
        .expect("valid request")
}
