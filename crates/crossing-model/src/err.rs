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

use crate::id::{RequestId, Vin};
use crossing_core::Distance;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VehicleSpecError {
    NonPositiveLength(Distance),
    ZeroDeceleration,
}

impl Display for VehicleSpecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VehicleSpecError::NonPositiveLength(l) => {
                write!(f, "Vehicle length must be positive, got {}", l)
            }
            VehicleSpecError::ZeroDeceleration => {
                write!(f, "Vehicle maximum deceleration must be non-zero and finite")
            }
        }
    }
}

impl std::error::Error for VehicleSpecError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmptyProposalsError {
    vin: Vin,
    request_id: RequestId,
}

impl EmptyProposalsError {
    #[inline]
    pub fn new(vin: Vin, request_id: RequestId) -> Self {
        Self { vin, request_id }
    }

    #[inline]
    pub fn vin(&self) -> Vin {
        self.vin
    }

    #[inline]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }
}

impl Display for EmptyProposalsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Request {} from {} carries no proposals",
            self.request_id, self.vin
        )
    }
}

impl std::error::Error for EmptyProposalsError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NonFiniteProposalError {
    vin: Vin,
    index: usize,
}

impl NonFiniteProposalError {
    #[inline]
    pub fn new(vin: Vin, index: usize) -> Self {
        Self { vin, index }
    }

    #[inline]
    pub fn vin(&self) -> Vin {
        self.vin
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Display for NonFiniteProposalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Proposal #{} from {} has a non-finite arrival time or velocity",
            self.index, self.vin
        )
    }
}

impl std::error::Error for NonFiniteProposalError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestBuildError {
    EmptyProposals(EmptyProposalsError),
    NonFiniteProposal(NonFiniteProposalError),
}

impl Display for RequestBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestBuildError::EmptyProposals(e) => write!(f, "{e}"),
            RequestBuildError::NonFiniteProposal(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RequestBuildError {}

impl From<EmptyProposalsError> for RequestBuildError {
    fn from(value: EmptyProposalsError) -> Self {
        RequestBuildError::EmptyProposals(value)
    }
}

impl From<NonFiniteProposalError> for RequestBuildError {
    fn from(value: NonFiniteProposalError) -> Self {
        RequestBuildError::NonFiniteProposal(value)
    }
}
