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

//! # Crossing Model (`crossing-model`)
//!
//! The vocabulary of the vehicle-to-intersection reservation protocol.
//!
//! ## Key Data Structures
//!
//! - **`Vin`**, **`RequestId`**, **`ReservationId`**, **`LaneId`**,
//!   **`IntersectionId`**: transparent numeric identifiers.
//! - **`Proposal`**: one candidate crossing (arrival time, velocity, lanes).
//! - **`Request`**: a vehicle's ordered list of proposals plus its
//!   `VehicleSpec` and a mutable arbitration priority.
//! - **`Cancel`**, **`Done`**, **`Away`**: lifecycle notices that reference
//!   a granted reservation.
//! - **`Confirm`**, **`Reject`**: the intersection's replies.

pub mod err;
pub mod i2v;
pub mod id;
pub mod proposal;
pub mod v2i;
pub mod vehicle;

pub mod prelude {
    pub use crate::err::{
        EmptyProposalsError, NonFiniteProposalError, RequestBuildError, VehicleSpecError,
    };
    pub use crate::i2v::{Confirm, I2VMessage, Reject, RejectReason};
    pub use crate::id::{IntersectionId, LaneId, RequestId, ReservationId, Vin};
    pub use crate::proposal::Proposal;
    pub use crate::v2i::{
        Away, Cancel, DEFAULT_REQUEST_PRIORITY, Done, Request, UnsupportedMessage, V2IMessage,
        V2IMessageKind,
    };
    pub use crate::vehicle::{AccelerationProfile, AccelerationSegment, VehicleSpec};
}
