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

use crossing_core::TimePoint;
use crossing_model::prelude::{IntersectionId, RejectReason};
use std::collections::BTreeMap;

/// Running totals of every reply and release the policy has handled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PolicyCounters {
    pub confirmed: u64,
    pub rejected: BTreeMap<RejectReason, u64>,
    pub cancelled: u64,
    pub done: u64,
    pub away: u64,
    pub not_found: u64,
    pub vin_mismatches: u64,
}

impl PolicyCounters {
    #[inline]
    pub fn record_reject(&mut self, reason: RejectReason) {
        *self.rejected.entry(reason).or_insert(0) += 1;
    }

    #[inline]
    pub fn rejected_for(&self, reason: RejectReason) -> u64 {
        self.rejected.get(&reason).copied().unwrap_or(0)
    }

    #[inline]
    pub fn total_rejected(&self) -> u64 {
        self.rejected.values().sum()
    }

    /// Number of replies sent so far.
    #[inline]
    pub fn replies(&self) -> u64 {
        self.confirmed + self.total_rejected()
    }
}

/// What the policy looked like at the end of one `act`.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicySnapshot {
    pub intersection: IntersectionId,
    pub time: TimePoint,
    pub outstanding: usize,
    pub pending: usize,
    pub counters: PolicyCounters,
}

pub trait StatCollector {
    fn collect(&mut self, snapshot: &PolicySnapshot);
}

impl StatCollector for () {
    #[inline]
    fn collect(&mut self, _snapshot: &PolicySnapshot) {}
}

/// Keeps every snapshot it is handed, in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordingStatCollector {
    samples: Vec<PolicySnapshot>,
}

impl RecordingStatCollector {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn samples(&self) -> &[PolicySnapshot] {
        &self.samples
    }

    #[inline]
    pub fn latest(&self) -> Option<&PolicySnapshot> {
        self.samples.last()
    }

    /// Confirms per second between the first and the latest sample.
    pub fn throughput(&self) -> Option<f64> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        let span = (last.time - first.time).value();
        if span <= 0.0 {
            return None;
        }
        Some((last.counters.confirmed - first.counters.confirmed) as f64 / span)
    }
}

impl StatCollector for RecordingStatCollector {
    fn collect(&mut self, snapshot: &PolicySnapshot) {
        self.samples.push(snapshot.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(t: f64, confirmed: u64) -> PolicySnapshot {
        PolicySnapshot {
            intersection: IntersectionId::new(0),
            time: TimePoint::new(t),
            outstanding: 0,
            pending: 0,
            counters: PolicyCounters {
                confirmed,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_counters_reject_totals() {
        let mut c = PolicyCounters::default();
        c.record_reject(RejectReason::NoClearPath);
        c.record_reject(RejectReason::NoClearPath);
        c.record_reject(RejectReason::ArrivalTimeTooLate);
        c.confirmed = 4;
        assert_eq!(c.rejected_for(RejectReason::NoClearPath), 2);
        assert_eq!(c.rejected_for(RejectReason::ArrivalTimeTooLarge), 0);
        assert_eq!(c.total_rejected(), 3);
        assert_eq!(c.replies(), 7);
    }

    #[test]
    fn test_recording_collector_throughput() {
        let mut r = RecordingStatCollector::new();
        assert_eq!(r.throughput(), None);
        r.collect(&snap(0.0, 0));
        assert_eq!(r.throughput(), None);
        r.collect(&snap(1.0, 2));
        r.collect(&snap(4.0, 8));
        assert_eq!(r.samples().len(), 3);
        assert_eq!(r.latest().map(|s| s.counters.confirmed), Some(8));
        assert_eq!(r.throughput(), Some(2.0));
    }
}
