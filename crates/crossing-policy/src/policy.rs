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

//! The admission procedure and reservation lifecycle of one intersection.
//!
//! `PolicyCore` owns the ledger and talks to the intersection's resource
//! managers. The request handlers only see it through `PolicyCallback`,
//! which keeps the decision of *when* to evaluate a request apart from *how*
//! it is evaluated.

use crate::{
    config::PolicyConfig,
    err::{InvariantViolation, PolicyError, TicketMismatchError},
    filter::{FilterResult, ProposalFilter},
    handler::RequestHandler,
    ledger::{ReservationLedger, ReservationRecord},
    resource::{
        AcceptError, ClearanceZoneManager, GridManager, GridPlan, GridQuery, IntersectionManager,
        ResourceKind, ZoneQuery,
    },
    stats::{PolicyCounters, PolicySnapshot, StatCollector},
};
use crossing_core::{TimeDelta, TimePoint, stopping_distance};
use crossing_model::prelude::{
    Away, Cancel, Confirm, Done, I2VMessage, LaneId, Proposal, Reject, RejectReason, Request,
    RequestId, ReservationId, V2IMessage, Vin,
};
use std::collections::HashMap;
use tracing::{debug, error, instrument, trace, warn};

/// A proposal together with the grid and clearance-zone plans that make it
/// feasible. Produced by `find_reserve_param`, consumed by `send_confirm`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReserveParam<G, Z> {
    vin: Vin,
    proposal: Proposal,
    grid_plan: G,
    zone_plan: Z,
}

impl<G, Z> ReserveParam<G, Z> {
    #[inline]
    pub fn new(vin: Vin, proposal: Proposal, grid_plan: G, zone_plan: Z) -> Self {
        Self {
            vin,
            proposal,
            grid_plan,
            zone_plan,
        }
    }

    #[inline]
    pub fn vin(&self) -> Vin {
        self.vin
    }

    #[inline]
    pub fn proposal(&self) -> &Proposal {
        &self.proposal
    }

    #[inline]
    pub fn grid_plan(&self) -> &G {
        &self.grid_plan
    }

    #[inline]
    pub fn zone_plan(&self) -> &Z {
        &self.zone_plan
    }
}

/// The reply the policy sent for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdmissionOutcome {
    Confirmed(ReservationId),
    Rejected(RejectReason),
}

impl AdmissionOutcome {
    #[inline]
    pub fn is_confirmed(&self) -> bool {
        matches!(self, AdmissionOutcome::Confirmed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseOutcome {
    /// The record was removed and its resources released. `vin` is the VIN
    /// on record, which wins over the one carried by the message.
    Released {
        vin: Vin,
        reservation_id: ReservationId,
    },
    /// The record exists and stays in place.
    Acknowledged {
        vin: Vin,
        reservation_id: ReservationId,
    },
    NotFound(ReservationId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageOutcome {
    Admitted(AdmissionOutcome),
    /// The handler holds the request until the batch boundary.
    Buffered,
    Release(ReleaseOutcome),
}

/// What a request handler may ask of the policy.
pub trait PolicyCallback {
    type ReserveParam;

    fn current_time(&self) -> TimePoint;
    fn lanes(&self) -> Vec<LaneId>;
    fn has_reservation(&self, vin: Vin) -> bool;
    fn filter_proposals(&mut self, request: &Request) -> FilterResult;

    /// Tries the proposals in order and stops at the first one both the grid
    /// and the departure lane's clearance zone can serve.
    fn find_reserve_param(
        &self,
        request: &Request,
        proposals: &[Proposal],
    ) -> Option<Self::ReserveParam>;

    fn send_confirm(
        &mut self,
        request_id: RequestId,
        param: Self::ReserveParam,
    ) -> Result<ReservationId, PolicyError>;

    fn send_reject(&mut self, vin: Vin, request_id: RequestId, reason: RejectReason);
}

type ParamOf<M> = ReserveParam<
    <<M as IntersectionManager>::Grid as GridManager>::Plan,
    <<M as IntersectionManager>::Zone as ClearanceZoneManager>::Plan,
>;

fn check_ticket(
    resource: ResourceKind,
    expected: Vin,
    actual: Vin,
) -> Result<(), InvariantViolation> {
    if expected == actual {
        return Ok(());
    }
    Err(TicketMismatchError::new(resource, expected, actual).into())
}

fn invariant_violation(violation: InvariantViolation) -> PolicyError {
    error!(%violation, "invariant violated");
    if cfg!(debug_assertions) {
        panic!("Invariant violated: {violation}");
    }
    PolicyError::Invariant(violation)
}

#[derive(Debug)]
pub struct PolicyCore<M> {
    im: M,
    config: PolicyConfig,
    filter: ProposalFilter,
    ledger: ReservationLedger,
    outbox: Vec<I2VMessage>,
    counters: PolicyCounters,
    current_proposals: HashMap<Vin, Proposal>,
}

impl<M: IntersectionManager> PolicyCore<M> {
    pub fn new(im: M, config: PolicyConfig) -> Self {
        Self {
            filter: ProposalFilter::new(config.max_future_reservation),
            im,
            config,
            ledger: ReservationLedger::new(),
            outbox: Vec::new(),
            counters: PolicyCounters::default(),
            current_proposals: HashMap::new(),
        }
    }

    #[inline]
    pub fn intersection(&self) -> &M {
        &self.im
    }

    #[inline]
    pub fn intersection_mut(&mut self) -> &mut M {
        &mut self.im
    }

    #[inline]
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    #[inline]
    pub fn ledger(&self) -> &ReservationLedger {
        &self.ledger
    }

    #[inline]
    pub fn counters(&self) -> &PolicyCounters {
        &self.counters
    }

    #[inline]
    pub fn outbox(&self) -> &[I2VMessage] {
        &self.outbox
    }

    #[inline]
    pub fn drain_outbox(&mut self) -> Vec<I2VMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// The first proposal of `vin` that survived filtering, while the
    /// vehicle is being handled or holds a reservation.
    #[inline]
    pub fn current_proposal(&self, vin: Vin) -> Option<&Proposal> {
        self.current_proposals.get(&vin)
    }

    /// Releases what `vin` was granted by a confirm that could not complete,
    /// then reports the violation.
    fn abort_grant(
        &mut self,
        vin: Vin,
        lane: LaneId,
        zone_accepted: bool,
        violation: InvariantViolation,
    ) -> PolicyError {
        self.im.grid_manager_mut().cancel(vin);
        if zone_accepted && let Some(zone) = self.im.clearance_zone_mut(lane) {
            zone.cancel(vin);
        }
        debug!(%vin, %lane, "partial grant released");
        invariant_violation(violation)
    }

    /// Releases both resources after a cancel.
    pub fn process_cancel(&mut self, msg: &Cancel) -> ReleaseOutcome {
        let id = msg.reservation_id();
        let Some(record) = self.lookup(id, msg.vin(), "Cancel") else {
            return ReleaseOutcome::NotFound(id);
        };
        let vin = record.vin();
        self.im.grid_manager_mut().cancel(vin);
        match self.im.clearance_zone_mut(record.departure_lane()) {
            Some(zone) => zone.cancel(vin),
            None => error!(lane = %record.departure_lane(), %vin, "no clearance zone to cancel"),
        }
        self.forget(id, vin);
        self.counters.cancelled += 1;
        debug!(%vin, reservation = %id, "reservation cancelled");
        ReleaseOutcome::Released {
            vin,
            reservation_id: id,
        }
    }

    /// Grid reservations expire by themselves, so a done notice only
    /// acknowledges the record.
    pub fn process_done(&mut self, msg: &Done) -> ReleaseOutcome {
        let id = msg.reservation_id();
        let Some(record) = self.lookup(id, msg.vin(), "Done") else {
            return ReleaseOutcome::NotFound(id);
        };
        self.counters.done += 1;
        debug!(vin = %record.vin(), reservation = %id, "vehicle left the interior");
        ReleaseOutcome::Acknowledged {
            vin: record.vin(),
            reservation_id: id,
        }
    }

    pub fn process_away(&mut self, msg: &Away) -> ReleaseOutcome {
        let id = msg.reservation_id();
        let Some(record) = self.lookup(id, msg.vin(), "Away") else {
            return ReleaseOutcome::NotFound(id);
        };
        let vin = record.vin();
        match self.im.clearance_zone_mut(record.departure_lane()) {
            Some(zone) => zone.away(vin),
            None => error!(lane = %record.departure_lane(), %vin, "no clearance zone to release"),
        }
        self.forget(id, vin);
        self.counters.away += 1;
        debug!(%vin, reservation = %id, "vehicle left the clearance zone");
        ReleaseOutcome::Released {
            vin,
            reservation_id: id,
        }
    }

    fn lookup(
        &mut self,
        id: ReservationId,
        claimed: Vin,
        kind: &'static str,
    ) -> Option<ReservationRecord> {
        let Some(record) = self.ledger.get(id).copied() else {
            warn!(reservation = %id, vin = %claimed, kind, "record not found");
            self.counters.not_found += 1;
            return None;
        };
        if record.vin() != claimed {
            warn!(
                reservation = %id,
                on_record = %record.vin(),
                claimed = %claimed,
                kind,
                "VIN does not match the record"
            );
            self.counters.vin_mismatches += 1;
        }
        Some(record)
    }

    fn forget(&mut self, id: ReservationId, vin: Vin) {
        if let Err(e) = self.ledger.remove(id) {
            warn!(error = %e, "ledger out of sync");
        }
        self.current_proposals.remove(&vin);
    }
}

impl<M: IntersectionManager> PolicyCallback for PolicyCore<M> {
    type ReserveParam = ParamOf<M>;

    #[inline]
    fn current_time(&self) -> TimePoint {
        self.im.now()
    }

    #[inline]
    fn lanes(&self) -> Vec<LaneId> {
        self.im.lanes()
    }

    #[inline]
    fn has_reservation(&self, vin: Vin) -> bool {
        self.ledger.contains_vin(vin)
    }

    fn filter_proposals(&mut self, request: &Request) -> FilterResult {
        let result = self
            .filter
            .filter(request.proposals(), self.current_time());
        if let Some(first) = result.proposals().and_then(|p| p.first()) {
            self.current_proposals.insert(request.vin(), *first);
        }
        result
    }

    fn find_reserve_param(
        &self,
        request: &Request,
        proposals: &[Proposal],
    ) -> Option<Self::ReserveParam> {
        let vin = request.vin();
        let spec = request.spec();
        for proposal in proposals {
            let query = GridQuery::new(vin, *proposal, *spec);
            let Some(grid_plan) = self.im.grid_manager().query(&query) else {
                continue;
            };
            let lane = proposal.departure_lane();
            let Some(zone) = self.im.clearance_zone(lane) else {
                error!(%vin, %lane, "no clearance zone manager for departure lane");
                continue;
            };
            let stop = stopping_distance(grid_plan.exit_velocity(), spec.max_deceleration());
            let zone_query = ZoneQuery::new(
                vin,
                grid_plan.exit_time(),
                grid_plan.exit_velocity(),
                spec.length(),
                stop,
            );
            if let Some(zone_plan) = zone.query(&zone_query) {
                return Some(ReserveParam::new(vin, *proposal, grid_plan, zone_plan));
            }
        }
        None
    }

    fn send_confirm(
        &mut self,
        request_id: RequestId,
        param: Self::ReserveParam,
    ) -> Result<ReservationId, PolicyError> {
        let ReserveParam {
            vin,
            proposal,
            grid_plan,
            zone_plan,
        } = param;
        if self.ledger.contains_vin(vin) {
            return Err(invariant_violation(InvariantViolation::DuplicateGrant(vin)));
        }
        let lane = proposal.departure_lane();
        let max_zone_size = match self.im.clearance_zone(lane) {
            Some(zone) => zone.max_size(),
            None => {
                return Err(invariant_violation(
                    InvariantViolation::MissingClearanceZone(lane),
                ));
            }
        };
        let profile = grid_plan.acceleration_profile().clone();

        let ticket = self
            .im
            .grid_manager_mut()
            .accept(grid_plan)
            .map_err(|e| invariant_violation(e.into()))?;
        check_ticket(ResourceKind::Grid, vin, ticket)
            .map_err(|v| self.abort_grant(vin, lane, false, v))?;

        let zone_ticket = match self.im.clearance_zone_mut(lane) {
            Some(zone) => zone.accept(zone_plan),
            None => Err(AcceptError::new(vin, ResourceKind::ClearanceZone)),
        };
        let zone_ticket =
            zone_ticket.map_err(|e| self.abort_grant(vin, lane, false, e.into()))?;
        check_ticket(ResourceKind::ClearanceZone, vin, zone_ticket)
            .map_err(|v| self.abort_grant(vin, lane, true, v))?;

        let id = self
            .ledger
            .allocate_id()
            .map_err(|e| self.abort_grant(vin, lane, true, e.into()))?;
        let confirm = Confirm::new(
            self.im.id(),
            vin,
            id,
            request_id,
            proposal.arrival_time(),
            self.config.early_error,
            self.config.late_error,
            proposal.arrival_velocity(),
            proposal.arrival_lane(),
            lane,
            max_zone_size,
            profile,
        );
        if let Err(e) = self.ledger.insert(id, ReservationRecord::new(vin, lane)) {
            return Err(self.abort_grant(vin, lane, true, e.into()));
        }
        self.outbox.push(confirm.into());
        self.current_proposals.insert(vin, proposal);
        self.counters.confirmed += 1;
        debug!(%vin, reservation = %id, arrival = %proposal.arrival_time(), "confirmed");
        Ok(id)
    }

    fn send_reject(&mut self, vin: Vin, request_id: RequestId, reason: RejectReason) {
        let now = self.current_time();
        self.outbox
            .push(Reject::new(self.im.id(), vin, request_id, now, reason).into());
        if !self.ledger.contains_vin(vin) {
            self.current_proposals.remove(&vin);
        }
        self.counters.record_reject(reason);
        debug!(%vin, %reason, "rejected");
    }
}

/// The intersection controller's policy: a `PolicyCore` driven by a
/// request handler, reporting to a statistics collector.
#[derive(Debug)]
pub struct Policy<M, H, S = ()> {
    core: PolicyCore<M>,
    handler: H,
    stats: S,
}

impl<M, H> Policy<M, H>
where
    M: IntersectionManager,
    H: RequestHandler,
{
    pub fn new(im: M, handler: H) -> Self {
        Self::with_config(im, handler, PolicyConfig::default())
    }

    pub fn with_config(im: M, mut handler: H, config: PolicyConfig) -> Self {
        handler.attach(&im.lanes());
        Self {
            core: PolicyCore::new(im, config),
            handler,
            stats: (),
        }
    }
}

impl<M, H, S> Policy<M, H, S>
where
    M: IntersectionManager,
    H: RequestHandler,
    S: StatCollector,
{
    pub fn with_stat_collector<S2: StatCollector>(self, stats: S2) -> Policy<M, H, S2> {
        Policy {
            core: self.core,
            handler: self.handler,
            stats,
        }
    }

    #[inline]
    pub fn core(&self) -> &PolicyCore<M> {
        &self.core
    }

    #[inline]
    pub fn intersection(&self) -> &M {
        self.core.intersection()
    }

    #[inline]
    pub fn intersection_mut(&mut self) -> &mut M {
        self.core.intersection_mut()
    }

    #[inline]
    pub fn ledger(&self) -> &ReservationLedger {
        self.core.ledger()
    }

    #[inline]
    pub fn counters(&self) -> &PolicyCounters {
        self.core.counters()
    }

    #[inline]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    #[inline]
    pub fn stats(&self) -> &S {
        &self.stats
    }

    #[inline]
    pub fn current_proposal(&self, vin: Vin) -> Option<&Proposal> {
        self.core.current_proposal(vin)
    }

    #[inline]
    pub fn drain_outbox(&mut self) -> Vec<I2VMessage> {
        self.core.drain_outbox()
    }

    pub fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot {
            intersection: self.core.im.id(),
            time: self.core.current_time(),
            outstanding: self.core.ledger.len(),
            pending: self.handler.pending(),
            counters: self.core.counters.clone(),
        }
    }

    /// Routes one inbound message. Requests go to the request handler, the
    /// lifecycle notices to the release procedures.
    #[instrument(skip_all, fields(intersection = %self.core.im.id(), vin = %msg.vin(), kind = %msg.kind()))]
    pub fn process_v2i_message(&mut self, msg: V2IMessage) -> Result<MessageOutcome, PolicyError> {
        match msg {
            V2IMessage::Request(request) => {
                match self.handler.process_request(request, &mut self.core)? {
                    Some(outcome) => Ok(MessageOutcome::Admitted(outcome)),
                    None => Ok(MessageOutcome::Buffered),
                }
            }
            V2IMessage::Cancel(m) => Ok(MessageOutcome::Release(self.core.process_cancel(&m))),
            V2IMessage::Done(m) => Ok(MessageOutcome::Release(self.core.process_done(&m))),
            V2IMessage::Away(m) => Ok(MessageOutcome::Release(self.core.process_away(&m))),
            V2IMessage::Unsupported(m) => {
                error!(kind = m.kind(), "unsupported message kind");
                Err(PolicyError::UnsupportedMessage(m))
            }
        }
    }

    /// Signals that every message of the current timestep was delivered.
    #[instrument(skip_all, fields(intersection = %self.core.im.id(), pending = self.handler.pending()))]
    pub fn process_v2i_message_done(&mut self) -> Result<Vec<(Vin, AdmissionOutcome)>, PolicyError> {
        self.handler.process_batch_done(&mut self.core)
    }

    #[instrument(skip_all, fields(intersection = %self.core.im.id(), dt = %time_step))]
    pub fn act(&mut self, time_step: TimeDelta) -> Result<Vec<(Vin, AdmissionOutcome)>, PolicyError> {
        let outcomes = self.handler.act(&mut self.core, time_step)?;
        let snapshot = self.snapshot();
        trace!(outstanding = snapshot.outstanding, "collecting statistics");
        self.stats.collect(&snapshot);
        Ok(outcomes)
    }
}
