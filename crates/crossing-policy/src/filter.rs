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

//! Pre-screening of a vehicle's proposals before any resource manager is
//! consulted.

use crossing_core::{TimeDelta, TimePoint};
use crossing_model::prelude::{Proposal, RejectReason};

#[derive(Debug, Clone, PartialEq)]
pub enum FilterResult {
    /// The surviving proposals, in their original order. Never empty.
    Remaining(Vec<Proposal>),
    Rejected(RejectReason),
}

impl FilterResult {
    #[inline]
    pub fn is_no_proposal_left(&self) -> bool {
        matches!(self, FilterResult::Rejected(_))
    }

    #[inline]
    pub fn proposals(&self) -> Option<&[Proposal]> {
        match self {
            FilterResult::Remaining(p) => Some(p),
            FilterResult::Rejected(_) => None,
        }
    }

    #[inline]
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            FilterResult::Remaining(_) => None,
            FilterResult::Rejected(r) => Some(*r),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProposalFilter {
    max_future_reservation: TimeDelta,
}

impl ProposalFilter {
    #[inline]
    pub fn new(max_future_reservation: TimeDelta) -> Self {
        Self {
            max_future_reservation,
        }
    }

    #[inline]
    pub fn max_future_reservation(&self) -> TimeDelta {
        self.max_future_reservation
    }

    #[inline]
    pub fn filter(&self, proposals: &[Proposal], now: TimePoint) -> FilterResult {
        standard_proposals_filter(proposals, now, self.max_future_reservation)
    }
}

/// Drops proposals arriving at or before `now`, then proposals arriving
/// after `now + max_future_reservation`.
///
/// The first stage that empties the list decides the reject reason.
pub fn standard_proposals_filter(
    proposals: &[Proposal],
    now: TimePoint,
    max_future_reservation: TimeDelta,
) -> FilterResult {
    let mut remaining: Vec<Proposal> = proposals
        .iter()
        .filter(|p| p.arrival_time() > now)
        .copied()
        .collect();
    if remaining.is_empty() {
        return FilterResult::Rejected(RejectReason::ArrivalTimeTooLate);
    }

    let horizon = now + max_future_reservation;
    remaining.retain(|p| p.arrival_time() <= horizon);
    if remaining.is_empty() {
        return FilterResult::Rejected(RejectReason::ArrivalTimeTooLarge);
    }

    FilterResult::Remaining(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossing_core::Velocity;
    use crossing_model::prelude::LaneId;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn p(t: f64) -> Proposal {
        Proposal::new(
            TimePoint::new(t),
            Velocity::new(10.0),
            LaneId::new(0),
            LaneId::new(1),
            Velocity::new(5.0),
        )
    }

    fn filter() -> ProposalFilter {
        ProposalFilter::new(TimeDelta::new(10.0))
    }

    #[test]
    fn test_keeps_feasible_proposal() {
        let r = filter().filter(&[p(5.0)], TimePoint::new(4.0));
        assert_eq!(r, FilterResult::Remaining(vec![p(5.0)]));
    }

    #[test]
    fn test_arrival_equal_to_now_is_too_late() {
        let r = filter().filter(&[p(4.0), p(3.0)], TimePoint::new(4.0));
        assert_eq!(r, FilterResult::Rejected(RejectReason::ArrivalTimeTooLate));
    }

    #[test]
    fn test_arrival_beyond_horizon_is_too_large() {
        let r = filter().filter(&[p(14.5), p(20.0)], TimePoint::new(4.0));
        assert_eq!(r, FilterResult::Rejected(RejectReason::ArrivalTimeTooLarge));
    }

    #[test]
    fn test_arrival_exactly_at_horizon_survives() {
        let r = filter().filter(&[p(14.0)], TimePoint::new(4.0));
        assert_eq!(r.proposals(), Some(&[p(14.0)][..]));
    }

    #[test]
    fn test_too_late_wins_over_too_large_when_all_are_late() {
        let r = filter().filter(&[p(1.0)], TimePoint::new(4.0));
        assert_eq!(r.reason(), Some(RejectReason::ArrivalTimeTooLate));
    }

    #[test]
    fn test_mixed_list_preserves_order_of_survivors() {
        let input = [p(3.0), p(9.0), p(30.0), p(5.0), p(4.0)];
        let r = filter().filter(&input, TimePoint::new(4.0));
        assert_eq!(r, FilterResult::Remaining(vec![p(9.0), p(5.0)]));
    }

    #[test]
    fn test_empty_input_is_too_late() {
        let r = filter().filter(&[], TimePoint::new(0.0));
        assert!(r.is_no_proposal_left());
        assert_eq!(r.reason(), Some(RejectReason::ArrivalTimeTooLate));
    }

    #[test]
    fn test_survivors_always_within_window() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let f = filter();
        for _ in 0..500 {
            let now = TimePoint::new(rng.random_range(0.0..100.0));
            let n = rng.random_range(1..6);
            let props: Vec<Proposal> = (0..n)
                .map(|_| p(now.value() + rng.random_range(-5.0..20.0)))
                .collect();
            if let FilterResult::Remaining(kept) = f.filter(&props, now) {
                assert!(!kept.is_empty());
                for k in kept {
                    assert!(k.arrival_time() > now);
                    assert!(k.arrival_time() <= now + f.max_future_reservation());
                }
            }
        }
    }
}
