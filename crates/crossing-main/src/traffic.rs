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

//! Random vehicle traffic for the demo driver.

use crossing_core::{Acceleration, Distance, TimeDelta, TimePoint, Velocity};
use crossing_model::prelude::{LaneId, VehicleSpec, VehicleSpecError, Vin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, ExpError};
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub struct TrafficConfig {
    pub lanes: u32,
    /// Mean arrivals per second on each lane.
    pub arrival_rate: f64,
    /// Vehicles stop spawning at this instant.
    pub horizon: TimePoint,
    /// Distance a vehicle covers between spawning and the stop line.
    pub approach_distance: Distance,
    pub min_velocity: Velocity,
    pub max_velocity: Velocity,
    /// Share of vehicles that give up their first grant.
    pub cancel_probability: f64,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            lanes: 4,
            arrival_rate: 0.15,
            horizon: TimePoint::new(120.0),
            approach_distance: Distance::new(60.0),
            min_velocity: Velocity::new(8.0),
            max_velocity: Velocity::new(15.0),
            cancel_probability: 0.05,
        }
    }
}

#[derive(Debug)]
pub enum TrafficError {
    Rate(ExpError),
    Spec(VehicleSpecError),
}

impl Display for TrafficError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrafficError::Rate(e) => write!(f, "Invalid arrival rate: {}", e),
            TrafficError::Spec(e) => write!(f, "Invalid vehicle: {}", e),
        }
    }
}

impl std::error::Error for TrafficError {}

impl From<ExpError> for TrafficError {
    fn from(e: ExpError) -> Self {
        TrafficError::Rate(e)
    }
}

impl From<VehicleSpecError> for TrafficError {
    fn from(e: VehicleSpecError) -> Self {
        TrafficError::Spec(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleArrival {
    pub vin: Vin,
    pub spawn_time: TimePoint,
    pub arrival_lane: LaneId,
    pub departure_lane: LaneId,
    pub velocity: Velocity,
    pub spec: VehicleSpec,
    pub cancels_first_grant: bool,
}

impl VehicleArrival {
    /// When the vehicle would reach the stop line without ever waiting.
    #[inline]
    pub fn free_flow_arrival(&self, approach: Distance) -> TimePoint {
        self.spawn_time + TimeDelta::new(approach.value() / self.velocity.value())
    }
}

/// Poisson arrivals on every lane, merged in spawn order.
pub fn generate(config: &TrafficConfig, seed: u64) -> Result<Vec<VehicleArrival>, TrafficError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let gaps = Exp::new(config.arrival_rate)?;
    let mut arrivals = Vec::new();
    for lane in 0..config.lanes {
        let mut t = gaps.sample(&mut rng);
        while t < config.horizon.value() {
            let turn = rng.random_range(1..config.lanes.max(2));
            let length = Distance::new(rng.random_range(4.0..6.0));
            let decel = Acceleration::new(-rng.random_range(3.0..5.0));
            arrivals.push(VehicleArrival {
                vin: Vin::new(0),
                spawn_time: TimePoint::new(t),
                arrival_lane: LaneId::new(lane),
                departure_lane: LaneId::new((lane + turn) % config.lanes.max(1)),
                velocity: Velocity::new(
                    rng.random_range(config.min_velocity.value()..=config.max_velocity.value()),
                ),
                spec: VehicleSpec::new(length, decel)?,
                cancels_first_grant: rng.random_bool(config.cancel_probability.clamp(0.0, 1.0)),
            });
            t += gaps.sample(&mut rng);
        }
    }
    arrivals.sort_by(|a, b| {
        a.spawn_time
            .total_cmp(&b.spawn_time)
            .then(a.arrival_lane.cmp(&b.arrival_lane))
    });
    for (i, a) in arrivals.iter_mut().enumerate() {
        a.vin = Vin::new(i as u32);
    }
    Ok(arrivals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_reproducible() {
        let cfg = TrafficConfig::default();
        assert_eq!(generate(&cfg, 7).unwrap(), generate(&cfg, 7).unwrap());
    }

    #[test]
    fn test_arrivals_are_sorted_and_valid() {
        let cfg = TrafficConfig::default();
        let arrivals = generate(&cfg, 11).unwrap();
        assert!(!arrivals.is_empty());
        for w in arrivals.windows(2) {
            assert!(w[0].spawn_time <= w[1].spawn_time);
        }
        for (i, a) in arrivals.iter().enumerate() {
            assert_eq!(a.vin, Vin::new(i as u32));
            assert_ne!(a.arrival_lane, a.departure_lane);
            assert!(a.spawn_time < cfg.horizon);
            assert!(a.departure_lane.value() < cfg.lanes);
        }
    }

    #[test]
    fn test_invalid_rate_is_reported() {
        let cfg = TrafficConfig {
            arrival_rate: -1.0,
            ..TrafficConfig::default()
        };
        assert!(matches!(generate(&cfg, 1), Err(TrafficError::Rate(_))));
    }
}
