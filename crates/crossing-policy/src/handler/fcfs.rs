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

use crate::{
    err::PolicyError,
    filter::FilterResult,
    handler::RequestHandler,
    policy::{AdmissionOutcome, PolicyCallback},
};
use crossing_core::TimeDelta;
use crossing_model::prelude::{RejectReason, Request, Vin};
use tracing::instrument;

/// Runs the single-shot admission procedure for one request.
///
/// A vehicle already holding a reservation is turned away. Otherwise the
/// proposals are filtered and the first feasible one is granted.
#[instrument(level = "debug", skip_all, fields(vin = %request.vin(), request = %request.request_id()))]
pub fn admit<P>(request: &Request, policy: &mut P) -> Result<AdmissionOutcome, PolicyError>
where
    P: PolicyCallback + ?Sized,
{
    let vin = request.vin();
    let request_id = request.request_id();
    if policy.has_reservation(vin) {
        let reason = RejectReason::ConfirmedAnotherRequest;
        policy.send_reject(vin, request_id, reason);
        return Ok(AdmissionOutcome::Rejected(reason));
    }

    let proposals = match policy.filter_proposals(request) {
        FilterResult::Remaining(p) => p,
        FilterResult::Rejected(reason) => {
            policy.send_reject(vin, request_id, reason);
            return Ok(AdmissionOutcome::Rejected(reason));
        }
    };

    match policy.find_reserve_param(request, &proposals) {
        Some(param) => {
            let id = policy.send_confirm(request_id, param)?;
            Ok(AdmissionOutcome::Confirmed(id))
        }
        None => {
            let reason = RejectReason::NoClearPath;
            policy.send_reject(vin, request_id, reason);
            Ok(AdmissionOutcome::Rejected(reason))
        }
    }
}

/// Evaluates every request the moment it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FcfsRequestHandler;

impl FcfsRequestHandler {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl RequestHandler for FcfsRequestHandler {
    #[inline]
    fn act<P: PolicyCallback>(
        &mut self,
        _policy: &mut P,
        _time_step: TimeDelta,
    ) -> Result<Vec<(Vin, AdmissionOutcome)>, PolicyError> {
        Ok(Vec::new())
    }

    #[inline]
    fn process_request<P: PolicyCallback>(
        &mut self,
        request: Request,
        policy: &mut P,
    ) -> Result<Option<AdmissionOutcome>, PolicyError> {
        admit(&request, policy).map(Some)
    }

    #[inline]
    fn process_batch_done<P: PolicyCallback>(
        &mut self,
        _policy: &mut P,
    ) -> Result<Vec<(Vin, AdmissionOutcome)>, PolicyError> {
        Ok(Vec::new())
    }

    #[inline]
    fn pending(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::PolicyConfig,
        policy::{MessageOutcome, Policy, PolicyCore},
        testing::{ScriptedIntersection, request},
    };
    use crossing_model::prelude::ReservationId;

    fn core(now: f64) -> PolicyCore<ScriptedIntersection> {
        let mut im = ScriptedIntersection::new(&[0, 1]);
        im.set_now(now);
        PolicyCore::new(im, PolicyConfig::default())
    }

    #[test]
    fn test_too_late_and_too_large() {
        let mut p = core(4.0);
        assert_eq!(
            admit(&request(1, 1, &[(4.0, 0, 1)]), &mut p).unwrap(),
            AdmissionOutcome::Rejected(RejectReason::ArrivalTimeTooLate)
        );
        assert_eq!(
            admit(&request(2, 1, &[(14.5, 0, 1)]), &mut p).unwrap(),
            AdmissionOutcome::Rejected(RejectReason::ArrivalTimeTooLarge)
        );
        assert_eq!(
            admit(&request(3, 1, &[(14.0, 0, 1)]), &mut p).unwrap(),
            AdmissionOutcome::Confirmed(ReservationId::new(0))
        );
        assert!(p.intersection().calls().len() >= 2);
    }

    #[test]
    fn test_filter_rejection_skips_resource_managers() {
        let mut p = core(4.0);
        admit(&request(1, 1, &[(3.0, 0, 1), (2.0, 0, 1)]), &mut p).unwrap();
        assert!(p.intersection().calls().is_empty());
        assert_eq!(p.outbox().len(), 1);
    }

    #[test]
    fn test_requests_resolve_in_arrival_order() {
        let mut im = ScriptedIntersection::new(&[0, 1, 2]);
        im.set_now(1.0);
        im.grid.capacity = Some(1);
        let mut policy = Policy::new(im, FcfsRequestHandler::new());

        let a = policy
            .process_v2i_message(request(2, 1, &[(2.0, 0, 1)]).into())
            .unwrap();
        let b = policy
            .process_v2i_message(request(1, 1, &[(2.0, 2, 1)]).into())
            .unwrap();
        assert!(matches!(
            a,
            MessageOutcome::Admitted(AdmissionOutcome::Confirmed(_))
        ));
        assert_eq!(
            b,
            MessageOutcome::Admitted(AdmissionOutcome::Rejected(RejectReason::NoClearPath))
        );
        assert!(policy.process_v2i_message_done().unwrap().is_empty());
        assert_eq!(policy.handler().pending(), 0);
    }
}
