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

//! Vehicle-to-intersection messages.

use crate::{
    err::{EmptyProposalsError, NonFiniteProposalError, RequestBuildError},
    id::{RequestId, ReservationId, Vin},
    proposal::Proposal,
    vehicle::VehicleSpec,
};
use std::fmt::Display;

/// Priority a fresh request starts with before any arbitration backoff.
pub const DEFAULT_REQUEST_PRIORITY: u64 = 1;

/// A vehicle asks for a reservation.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    vin: Vin,
    request_id: RequestId,
    proposals: Vec<Proposal>,
    spec: VehicleSpec,
    priority: u64,
}

impl Request {
    pub fn new(
        vin: Vin,
        request_id: RequestId,
        proposals: Vec<Proposal>,
        spec: VehicleSpec,
    ) -> Result<Self, RequestBuildError> {
        if proposals.is_empty() {
            return Err(EmptyProposalsError::new(vin, request_id).into());
        }
        if let Some(index) = proposals.iter().position(|p| !p.is_finite()) {
            return Err(NonFiniteProposalError::new(vin, index).into());
        }
        Ok(Self {
            vin,
            request_id,
            proposals,
            spec,
            priority: DEFAULT_REQUEST_PRIORITY,
        })
    }

    #[inline]
    pub fn with_priority(mut self, priority: u64) -> Self {
        self.priority = priority;
        self
    }

    #[inline]
    pub fn vin(&self) -> Vin {
        self.vin
    }

    #[inline]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[inline]
    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    /// The vehicle's most preferred proposal. Always present.
    #[inline]
    pub fn first_proposal(&self) -> &Proposal {
        &self.proposals[0]
    }

    #[inline]
    pub fn spec(&self) -> &VehicleSpec {
        &self.spec
    }

    #[inline]
    pub fn priority(&self) -> u64 {
        self.priority
    }

    #[inline]
    pub fn set_priority(&mut self, priority: u64) {
        self.priority = priority;
    }
}

macro_rules! reservation_notice {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            reservation_id: ReservationId,
            vin: Vin,
        }

        impl $name {
            #[inline]
            pub fn new(reservation_id: ReservationId, vin: Vin) -> Self {
                Self { reservation_id, vin }
            }

            #[inline]
            pub fn reservation_id(&self) -> ReservationId {
                self.reservation_id
            }

            #[inline]
            pub fn vin(&self) -> Vin {
                self.vin
            }
        }
    };
}

reservation_notice!(
    /// The vehicle gives up a reservation it holds.
    Cancel
);
reservation_notice!(
    /// The vehicle has left the intersection interior.
    Done
);
reservation_notice!(
    /// The vehicle has left the clearance zone past the exit.
    Away
);

/// A message the transport delivered whose kind no policy understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedMessage {
    vin: Vin,
    kind: String,
}

impl UnsupportedMessage {
    #[inline]
    pub fn new(vin: Vin, kind: impl Into<String>) -> Self {
        Self {
            vin,
            kind: kind.into(),
        }
    }

    #[inline]
    pub fn vin(&self) -> Vin {
        self.vin
    }

    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum V2IMessageKind {
    Request,
    Cancel,
    Done,
    Away,
    Unsupported,
}

impl Display for V2IMessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            V2IMessageKind::Request => "Request",
            V2IMessageKind::Cancel => "Cancel",
            V2IMessageKind::Done => "Done",
            V2IMessageKind::Away => "Away",
            V2IMessageKind::Unsupported => "Unsupported",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum V2IMessage {
    Request(Request),
    Cancel(Cancel),
    Done(Done),
    Away(Away),
    Unsupported(UnsupportedMessage),
}

impl V2IMessage {
    #[inline]
    pub fn vin(&self) -> Vin {
        match self {
            V2IMessage::Request(m) => m.vin(),
            V2IMessage::Cancel(m) => m.vin(),
            V2IMessage::Done(m) => m.vin(),
            V2IMessage::Away(m) => m.vin(),
            V2IMessage::Unsupported(m) => m.vin(),
        }
    }

    #[inline]
    pub fn kind(&self) -> V2IMessageKind {
        match self {
            V2IMessage::Request(_) => V2IMessageKind::Request,
            V2IMessage::Cancel(_) => V2IMessageKind::Cancel,
            V2IMessage::Done(_) => V2IMessageKind::Done,
            V2IMessage::Away(_) => V2IMessageKind::Away,
            V2IMessage::Unsupported(_) => V2IMessageKind::Unsupported,
        }
    }
}

impl From<Request> for V2IMessage {
    fn from(value: Request) -> Self {
        V2IMessage::Request(value)
    }
}

impl From<Cancel> for V2IMessage {
    fn from(value: Cancel) -> Self {
        V2IMessage::Cancel(value)
    }
}

impl From<Done> for V2IMessage {
    fn from(value: Done) -> Self {
        V2IMessage::Done(value)
    }
}

impl From<Away> for V2IMessage {
    fn from(value: Away) -> Self {
        V2IMessage::Away(value)
    }
}
