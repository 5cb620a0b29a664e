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

//! Bookkeeping of outstanding grants.
//!
//! The ledger maps each reservation id to the record needed to release the
//! vehicle's resources later, and keeps a reverse index from VIN to
//! reservation id. A VIN is present at most once.

use crossing_model::prelude::{LaneId, ReservationId, Vin};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReservationRecord {
    vin: Vin,
    departure_lane: LaneId,
}

impl ReservationRecord {
    #[inline]
    pub fn new(vin: Vin, departure_lane: LaneId) -> Self {
        Self {
            vin,
            departure_lane,
        }
    }

    #[inline]
    pub fn vin(&self) -> Vin {
        self.vin
    }

    #[inline]
    pub fn departure_lane(&self) -> LaneId {
        self.departure_lane
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerError {
    /// The VIN already holds a reservation.
    VinAlreadyReserved(Vin),
    /// The reservation id is already in use.
    IdInUse(ReservationId),
    /// No record exists for the reservation id.
    RecordNotFound(ReservationId),
    /// Every reservation id has been handed out.
    IdsExhausted,
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::VinAlreadyReserved(vin) => {
                write!(f, "{} already holds a reservation", vin)
            }
            LedgerError::IdInUse(id) => write!(f, "{} is already in use", id),
            LedgerError::RecordNotFound(id) => write!(f, "No record for {}", id),
            LedgerError::IdsExhausted => write!(f, "No reservation ids left"),
        }
    }
}

impl std::error::Error for LedgerError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationLedger {
    records: HashMap<ReservationId, ReservationRecord>,
    by_vin: HashMap<Vin, ReservationId>,
    next_id: Option<ReservationId>,
}

impl Default for ReservationLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ReservationLedger {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            by_vin: HashMap::new(),
            next_id: Some(ReservationId::new(0)),
        }
    }

    /// An empty ledger whose next allocation yields `next`.
    #[cfg(test)]
    pub(crate) fn starting_at(next: ReservationId) -> Self {
        Self {
            next_id: Some(next),
            ..Self::new()
        }
    }

    /// Hands out a fresh reservation id. Ids are never reused within one
    /// ledger, whether or not the grant is eventually recorded.
    #[inline]
    pub fn allocate_id(&mut self) -> Result<ReservationId, LedgerError> {
        let id = self.next_id.ok_or(LedgerError::IdsExhausted)?;
        self.next_id = id.next();
        Ok(id)
    }

    pub fn insert(
        &mut self,
        id: ReservationId,
        record: ReservationRecord,
    ) -> Result<(), LedgerError> {
        if self.by_vin.contains_key(&record.vin()) {
            return Err(LedgerError::VinAlreadyReserved(record.vin()));
        }
        if self.records.contains_key(&id) {
            return Err(LedgerError::IdInUse(id));
        }
        self.by_vin.insert(record.vin(), id);
        self.records.insert(id, record);
        debug_assert_eq!(self.records.len(), self.by_vin.len());
        Ok(())
    }

    #[inline]
    pub fn get(&self, id: ReservationId) -> Option<&ReservationRecord> {
        self.records.get(&id)
    }

    #[inline]
    pub fn reservation_of(&self, vin: Vin) -> Option<ReservationId> {
        self.by_vin.get(&vin).copied()
    }

    #[inline]
    pub fn contains_vin(&self, vin: Vin) -> bool {
        self.by_vin.contains_key(&vin)
    }

    pub fn remove(&mut self, id: ReservationId) -> Result<ReservationRecord, LedgerError> {
        let record = self
            .records
            .remove(&id)
            .ok_or(LedgerError::RecordNotFound(id))?;
        let removed = self.by_vin.remove(&record.vin());
        debug_assert_eq!(removed, Some(id));
        Ok(record)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (ReservationId, &ReservationRecord)> + '_ {
        self.records.iter().map(|(id, r)| (*id, r))
    }
}
