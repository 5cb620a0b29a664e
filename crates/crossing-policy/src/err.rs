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
    ledger::LedgerError,
    resource::{AcceptError, ResourceKind},
};
use crossing_model::prelude::{LaneId, UnsupportedMessage, Vin};
use std::fmt::Display;

/// A resource manager answered `accept` with a ticket for a different VIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TicketMismatchError {
    resource: ResourceKind,
    expected: Vin,
    actual: Vin,
}

impl TicketMismatchError {
    #[inline]
    pub fn new(resource: ResourceKind, expected: Vin, actual: Vin) -> Self {
        Self {
            resource,
            expected,
            actual,
        }
    }

    #[inline]
    pub fn resource(&self) -> ResourceKind {
        self.resource
    }

    #[inline]
    pub fn expected(&self) -> Vin {
        self.expected
    }

    #[inline]
    pub fn actual(&self) -> Vin {
        self.actual
    }
}

impl Display for TicketMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "The {} issued a ticket for {} while granting {}",
            self.resource, self.actual, self.expected
        )
    }
}

impl std::error::Error for TicketMismatchError {}

/// Conditions that never occur while the policy and its resource managers
/// honor their contracts. Continuing past one risks double-booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvariantViolation {
    DuplicateGrant(Vin),
    TicketMismatch(TicketMismatchError),
    AcceptFailed(AcceptError),
    MissingClearanceZone(LaneId),
    Ledger(LedgerError),
}

impl Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvariantViolation::DuplicateGrant(vin) => {
                write!(f, "Attempted a second grant for {}", vin)
            }
            InvariantViolation::TicketMismatch(e) => write!(f, "{}", e),
            InvariantViolation::AcceptFailed(e) => write!(f, "{}", e),
            InvariantViolation::MissingClearanceZone(lane) => {
                write!(f, "No clearance zone manager for {}", lane)
            }
            InvariantViolation::Ledger(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for InvariantViolation {}

impl From<TicketMismatchError> for InvariantViolation {
    fn from(e: TicketMismatchError) -> Self {
        InvariantViolation::TicketMismatch(e)
    }
}

impl From<AcceptError> for InvariantViolation {
    fn from(e: AcceptError) -> Self {
        InvariantViolation::AcceptFailed(e)
    }
}

impl From<LedgerError> for InvariantViolation {
    fn from(e: LedgerError) -> Self {
        InvariantViolation::Ledger(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The message kind is outside the protocol. The controller must stop.
    UnsupportedMessage(UnsupportedMessage),
    Invariant(InvariantViolation),
}

impl Display for PolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyError::UnsupportedMessage(m) => write!(
                f,
                "Unsupported message kind `{}` from {}",
                m.kind(),
                m.vin()
            ),
            PolicyError::Invariant(e) => write!(f, "Invariant violated: {}", e),
        }
    }
}

impl std::error::Error for PolicyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PolicyError::UnsupportedMessage(_) => None,
            PolicyError::Invariant(e) => Some(e),
        }
    }
}

impl From<InvariantViolation> for PolicyError {
    fn from(e: InvariantViolation) -> Self {
        PolicyError::Invariant(e)
    }
}

impl From<UnsupportedMessage> for PolicyError {
    fn from(m: UnsupportedMessage) -> Self {
        PolicyError::UnsupportedMessage(m)
    }
}
