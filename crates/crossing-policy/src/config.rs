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

use crossing_core::TimeDelta;
use crossing_model::prelude::LaneId;
use std::{collections::BTreeMap, fmt::Display};

/// How far into the future a proposal may arrive and still be considered.
pub const DEFAULT_MAX_FUTURE_RESERVATION: TimeDelta = TimeDelta::new(10.0);
/// Tolerance granted to a vehicle arriving ahead of its confirmed time.
pub const DEFAULT_EARLY_ERROR: TimeDelta = TimeDelta::new(0.01);
/// Tolerance granted to a vehicle arriving behind its confirmed time.
pub const DEFAULT_LATE_ERROR: TimeDelta = TimeDelta::new(0.01);

pub const FAVORED_LANE_SEED: f64 = 10_000_000.0;
pub const DEFAULT_LANE_SEED: f64 = -1_000_000.0;
pub const DEFAULT_BACKOFF_FACTOR: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PolicyConfigBuildError {
    NonPositiveHorizon(TimeDelta),
    NegativeTolerance(TimeDelta),
    ZeroBackoffFactor,
    NonFiniteSeed(Option<LaneId>),
}

impl Display for PolicyConfigBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use PolicyConfigBuildError::*;
        match self {
            NonPositiveHorizon(d) => write!(f, "Reservation horizon must be positive, got {}", d),
            NegativeTolerance(d) => write!(f, "Arrival tolerance must be non-negative, got {}", d),
            ZeroBackoffFactor => write!(f, "Backoff factor must be at least 1"),
            NonFiniteSeed(Some(lane)) => write!(f, "Seed for {} is not finite", lane),
            NonFiniteSeed(None) => write!(f, "Default lane seed is not finite"),
        }
    }
}

impl std::error::Error for PolicyConfigBuildError {}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyConfig {
    pub max_future_reservation: TimeDelta,
    pub early_error: TimeDelta,
    pub late_error: TimeDelta,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_future_reservation: DEFAULT_MAX_FUTURE_RESERVATION,
            early_error: DEFAULT_EARLY_ERROR,
            late_error: DEFAULT_LATE_ERROR,
        }
    }
}

/// Builder for `PolicyConfig`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolicyConfigBuilder {
    config: PolicyConfig,
}

impl PolicyConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_future_reservation(mut self, horizon: TimeDelta) -> Self {
        self.config.max_future_reservation = horizon;
        self
    }

    pub fn early_error(mut self, tolerance: TimeDelta) -> Self {
        self.config.early_error = tolerance;
        self
    }

    pub fn late_error(mut self, tolerance: TimeDelta) -> Self {
        self.config.late_error = tolerance;
        self
    }

    pub fn build(self) -> Result<PolicyConfig, PolicyConfigBuildError> {
        use PolicyConfigBuildError::*;
        let c = self.config;
        if !c.max_future_reservation.is_positive() || !c.max_future_reservation.is_finite() {
            return Err(NonPositiveHorizon(c.max_future_reservation));
        }
        for tolerance in [c.early_error, c.late_error] {
            if tolerance.is_negative() || !tolerance.is_finite() {
                return Err(NegativeTolerance(tolerance));
            }
        }
        Ok(c)
    }
}

/// Knobs of the priority-based arbitration.
///
/// Every lane starts a round from its seed in `lane_seeds`, or from
/// `default_seed` when it has no entry. Vehicles that lose a round get their
/// message priority multiplied by `backoff_factor`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityConfig {
    pub lane_seeds: BTreeMap<LaneId, f64>,
    pub default_seed: f64,
    pub backoff_factor: u64,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            lane_seeds: BTreeMap::new(),
            default_seed: DEFAULT_LANE_SEED,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl PriorityConfig {
    pub fn new(
        lane_seeds: BTreeMap<LaneId, f64>,
        default_seed: f64,
        backoff_factor: u64,
    ) -> Result<Self, PolicyConfigBuildError> {
        if backoff_factor == 0 {
            return Err(PolicyConfigBuildError::ZeroBackoffFactor);
        }
        if !default_seed.is_finite() {
            return Err(PolicyConfigBuildError::NonFiniteSeed(None));
        }
        if let Some((lane, _)) = lane_seeds.iter().find(|(_, s)| !s.is_finite()) {
            return Err(PolicyConfigBuildError::NonFiniteSeed(Some(*lane)));
        }
        Ok(Self {
            lane_seeds,
            default_seed,
            backoff_factor,
        })
    }

    /// One lane always outranks every other lane.
    pub fn with_favored_lane(lane: LaneId) -> Self {
        let mut cfg = Self::default();
        cfg.lane_seeds.insert(lane, FAVORED_LANE_SEED);
        cfg
    }

    #[inline]
    pub fn seed_for(&self, lane: LaneId) -> f64 {
        self.lane_seeds
            .get(&lane)
            .copied()
            .unwrap_or(self.default_seed)
    }
}
