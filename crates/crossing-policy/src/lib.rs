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

//! # Crossing Policy (`crossing-policy`)
//!
//! Admission control and arbitration for one intersection.
//!
//! ## Key Components
//!
//! - **`ProposalFilter`**: drops proposals arriving too soon or too far
//!   ahead.
//! - **`GridManager`**, **`ClearanceZoneManager`**: the query / accept /
//!   cancel contract of the resources a grant consumes, with the in-memory
//!   `IntervalGridManager` and `LaneClearanceZone`.
//! - **`ReservationLedger`**: outstanding grants, at most one per VIN.
//! - **`Policy`**: message dispatch, the admission procedure and the
//!   release procedures for cancel, done and away notices.
//! - **`FcfsRequestHandler`**, **`PriorityRequestHandler`**: evaluate each
//!   request on arrival, or batch a timestep and arbitrate between lanes.

pub mod config;
pub mod err;
pub mod filter;
pub mod handler;
pub mod ledger;
pub mod policy;
pub mod resource;
pub mod stats;

#[cfg(test)]
mod testing;

pub mod prelude {
    pub use crate::config::{
        PolicyConfig, PolicyConfigBuildError, PolicyConfigBuilder, PriorityConfig,
    };
    pub use crate::err::{InvariantViolation, PolicyError, TicketMismatchError};
    pub use crate::filter::{FilterResult, ProposalFilter, standard_proposals_filter};
    pub use crate::handler::{
        RequestHandler,
        fcfs::FcfsRequestHandler,
        priority::{
            AccumulatedPriority, LanePriorityRule, LaneSnapshot, PriorityRequestHandler,
            ProximityWeighted, SeedOnly,
        },
    };
    pub use crate::ledger::{LedgerError, ReservationLedger, ReservationRecord};
    pub use crate::policy::{
        AdmissionOutcome, MessageOutcome, Policy, PolicyCallback, PolicyCore, ReleaseOutcome,
        ReserveParam,
    };
    pub use crate::resource::{
        AcceptError, ClearanceZoneManager, Clock, GridManager, GridPlan, GridQuery,
        IntersectionManager, IntersectionTopology, ResourceKind, ZonePlan, ZoneQuery,
        memory::{IntervalGridManager, LaneClearanceZone, SimpleIntersection},
    };
    pub use crate::stats::{PolicyCounters, PolicySnapshot, RecordingStatCollector, StatCollector};
}
