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

//! Strategies deciding when, and in which order, requests are evaluated.

pub mod fcfs;
pub mod priority;

use crate::{
    err::PolicyError,
    policy::{AdmissionOutcome, PolicyCallback},
};
use crossing_core::TimeDelta;
use crossing_model::prelude::{LaneId, Request, Vin};

pub trait RequestHandler {
    /// Called once with the intersection's lanes before any message.
    fn attach(&mut self, _lanes: &[LaneId]) {}

    /// Advances the handler by one simulation step.
    fn act<P: PolicyCallback>(
        &mut self,
        policy: &mut P,
        time_step: TimeDelta,
    ) -> Result<Vec<(Vin, AdmissionOutcome)>, PolicyError>;

    /// Handles one request. `None` means the request was buffered.
    fn process_request<P: PolicyCallback>(
        &mut self,
        request: Request,
        policy: &mut P,
    ) -> Result<Option<AdmissionOutcome>, PolicyError>;

    /// Resolves everything buffered during the current timestep.
    fn process_batch_done<P: PolicyCallback>(
        &mut self,
        policy: &mut P,
    ) -> Result<Vec<(Vin, AdmissionOutcome)>, PolicyError>;

    /// Number of buffered requests.
    fn pending(&self) -> usize;
}
