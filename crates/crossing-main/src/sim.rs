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

//! One intersection, one policy, one stream of vehicles.

use crate::traffic::{TrafficConfig, VehicleArrival};
use crossing_core::{Distance, TimeDelta, TimePoint};
use crossing_model::prelude::{
    Away, Cancel, Done, I2VMessage, IntersectionId, LaneId, Proposal, Request, RequestId,
    ReservationId, V2IMessage, Vin,
};
use crossing_policy::prelude::{
    IntervalGridManager, Policy, PolicyConfig, PolicyCounters, PolicyError,
    RecordingStatCollector, RequestHandler, SimpleIntersection,
};
use serde::Serialize;
use statrs::statistics::{Data, Distribution, Max, OrderStatistics};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub traffic: TrafficConfig,
    pub policy: PolicyConfig,
    pub time_step: TimeDelta,
    /// Extra simulated time after the last spawn to let queues drain.
    pub drain: TimeDelta,
    pub crossing_time: TimeDelta,
    pub headway: TimeDelta,
    pub zone_size: Distance,
    /// Time a vehicle spends in the clearance zone after leaving the grid.
    pub clearance_time: TimeDelta,
    /// Alternative arrival times offered per request.
    pub proposals_per_request: usize,
    pub proposal_spacing: TimeDelta,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            traffic: TrafficConfig::default(),
            policy: PolicyConfig::default(),
            time_step: TimeDelta::new(0.1),
            drain: TimeDelta::new(120.0),
            crossing_time: TimeDelta::new(1.6),
            headway: TimeDelta::new(0.6),
            zone_size: Distance::new(45.0),
            clearance_time: TimeDelta::new(1.5),
            proposals_per_request: 4,
            proposal_spacing: TimeDelta::new(0.5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Approaching,
    Granted {
        reservation: ReservationId,
        done_at: TimePoint,
        away_at: TimePoint,
        done_sent: bool,
    },
    Finished,
}

#[derive(Debug, Clone)]
struct Vehicle {
    arrival: VehicleArrival,
    free_flow: TimePoint,
    phase: Phase,
    next_request: u32,
    cancel_pending: bool,
    delay: Option<f64>,
}

impl Vehicle {
    fn new(arrival: VehicleArrival, approach: Distance) -> Self {
        Self {
            free_flow: arrival.free_flow_arrival(approach),
            cancel_pending: arrival.cancels_first_grant,
            arrival,
            phase: Phase::Approaching,
            next_request: 0,
            delay: None,
        }
    }

    fn request(&mut self, now: TimePoint, cfg: &SimConfig) -> Option<V2IMessage> {
        let earliest = self.free_flow.max(now + cfg.time_step);
        let proposals: Vec<Proposal> = (0..cfg.proposals_per_request)
            .map(|k| {
                Proposal::new(
                    earliest + cfg.proposal_spacing * k as f64,
                    self.arrival.velocity,
                    self.arrival.arrival_lane,
                    self.arrival.departure_lane,
                    self.arrival.velocity,
                )
            })
            .collect();
        let id = RequestId::new(self.next_request);
        self.next_request += 1;
        match Request::new(self.arrival.vin, id, proposals, self.arrival.spec) {
            Ok(request) => Some(request.into()),
            Err(error) => {
                warn!(
                    vin = %self.arrival.vin,
                    request = %id,
                    %error,
                    "request could not be built"
                );
                None
            }
        }
    }

    /// Messages this vehicle sends at `now`.
    fn step(&mut self, now: TimePoint, cfg: &SimConfig) -> Vec<V2IMessage> {
        let vin = self.arrival.vin;
        match self.phase {
            Phase::Approaching if now >= self.arrival.spawn_time => {
                self.request(now, cfg).into_iter().collect()
            }
            Phase::Approaching | Phase::Finished => Vec::new(),
            Phase::Granted { reservation, .. } if self.cancel_pending => {
                self.cancel_pending = false;
                self.phase = Phase::Approaching;
                self.delay = None;
                vec![Cancel::new(reservation, vin).into()]
            }
            Phase::Granted {
                reservation,
                away_at,
                ..
            } if now >= away_at => {
                self.phase = Phase::Finished;
                vec![Away::new(reservation, vin).into()]
            }
            Phase::Granted {
                reservation,
                done_at,
                away_at,
                done_sent: false,
            } if now >= done_at => {
                self.phase = Phase::Granted {
                    reservation,
                    done_at,
                    away_at,
                    done_sent: true,
                };
                vec![Done::new(reservation, vin).into()]
            }
            Phase::Granted { .. } => Vec::new(),
        }
    }

    fn receive(&mut self, msg: &I2VMessage, cfg: &SimConfig) {
        let Some(confirm) = msg.as_confirm() else {
            return;
        };
        let done_at = confirm.arrival_time() + confirm.acceleration_profile().total_duration();
        self.phase = Phase::Granted {
            reservation: confirm.reservation_id(),
            done_at,
            away_at: done_at + cfg.clearance_time,
            done_sent: false,
        };
        self.delay = Some((confirm.arrival_time() - self.free_flow).value());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DelayStats {
    pub mean: f64,
    pub std_dev: f64,
    pub p50: f64,
    pub p90: f64,
    pub max: f64,
}

impl DelayStats {
    pub fn from_samples(samples: Vec<f64>) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let mut data = Data::new(samples);
        Self {
            mean: data.mean().unwrap_or(0.0),
            std_dev: data.std_dev().unwrap_or(0.0),
            p50: data.quantile(0.5),
            p90: data.quantile(0.9),
            max: data.max(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub intersection: u32,
    pub handler: String,
    pub seed: u64,
    pub vehicles: usize,
    pub completed: usize,
    pub confirmed: u64,
    pub rejected: BTreeMap<String, u64>,
    pub cancelled: u64,
    pub not_found: u64,
    pub simulated_seconds: f64,
    /// Completed vehicles per simulated second.
    pub throughput: f64,
    pub delay: DelayStats,
}

fn rejected_by_reason(counters: &PolicyCounters) -> BTreeMap<String, u64> {
    counters
        .rejected
        .iter()
        .map(|(reason, n)| (reason.to_string(), *n))
        .collect()
}

/// Runs `arrivals` through a fresh intersection governed by `handler`.
#[instrument(skip_all, fields(intersection = id.value(), handler = label))]
pub fn simulate<H: RequestHandler>(
    id: IntersectionId,
    label: &str,
    seed: u64,
    cfg: &SimConfig,
    arrivals: &[VehicleArrival],
    handler: H,
) -> Result<RunSummary, PolicyError> {
    let im = SimpleIntersection::new(
        id,
        (0..cfg.traffic.lanes).map(LaneId::new),
        IntervalGridManager::new(cfg.crossing_time, cfg.headway),
        cfg.zone_size,
    );
    let mut policy = Policy::with_config(im, handler, cfg.policy.clone())
        .with_stat_collector(RecordingStatCollector::new());

    let mut vehicles: HashMap<Vin, Vehicle> = arrivals
        .iter()
        .map(|a| (a.vin, Vehicle::new(a.clone(), cfg.traffic.approach_distance)))
        .collect();
    let mut order: Vec<Vin> = arrivals.iter().map(|a| a.vin).collect();
    order.sort();

    let end = cfg.traffic.horizon + cfg.drain;
    let mut now = TimePoint::zero();
    while now <= end {
        policy.intersection_mut().set_time(now);

        for vin in &order {
            let Some(vehicle) = vehicles.get_mut(vin) else {
                continue;
            };
            for msg in vehicle.step(now, cfg) {
                policy.process_v2i_message(msg)?;
            }
        }
        policy.process_v2i_message_done()?;
        policy.act(cfg.time_step)?;

        for msg in policy.drain_outbox() {
            if let Some(vehicle) = vehicles.get_mut(&msg.vin()) {
                vehicle.receive(&msg, cfg);
            }
        }

        if vehicles.values().all(|v| v.phase == Phase::Finished) {
            break;
        }
        now += cfg.time_step;
    }

    let delays: Vec<f64> = vehicles
        .values()
        .filter(|v| v.phase == Phase::Finished)
        .filter_map(|v| v.delay)
        .collect();
    let completed = delays.len();
    let simulated_seconds = now.value();
    let counters = policy.counters().clone();
    debug!(
        samples = policy.stats().samples().len(),
        "statistics collected"
    );

    let summary = RunSummary {
        intersection: id.value(),
        handler: label.to_string(),
        seed,
        vehicles: arrivals.len(),
        completed,
        confirmed: counters.confirmed,
        rejected: rejected_by_reason(&counters),
        cancelled: counters.cancelled,
        not_found: counters.not_found,
        simulated_seconds,
        throughput: if simulated_seconds > 0.0 {
            completed as f64 / simulated_seconds
        } else {
            0.0
        },
        delay: DelayStats::from_samples(delays),
    };
    info!(
        completed = summary.completed,
        vehicles = summary.vehicles,
        mean_delay = summary.delay.mean,
        "run finished"
    );
    Ok(summary)
}
