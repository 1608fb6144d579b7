use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{BookingFilter, Ledger};
use crate::engine::{BookingError, LedgerError, Rejected};
use crate::models::{Booking, NewBooking};

/// Process-local ledger, used when no database is configured and in tests.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    bookings: Arc<Mutex<Vec<Booking>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.bookings.lock().await.len()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn commit_if_no_overlap(&self, booking: NewBooking) -> Result<Booking, BookingError> {
        booking.validate()?;

        // Check and insert under one guard.
        let mut bookings = self.bookings.lock().await;

        if let Some(slot) = bookings.iter().find_map(|b| b.overlaps(&booking.slots)) {
            return Err(Rejected::Conflict(slot).into());
        }

        let booking = booking.into_booking(Uuid::new_v4(), Utc::now());
        bookings.push(booking.clone());
        Ok(booking)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, LedgerError> {
        let mut bookings = self.bookings.lock().await;
        let before = bookings.len();
        bookings.retain(|b| b.id != id);
        Ok(bookings.len() != before)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Booking>, LedgerError> {
        let bookings = self.bookings.lock().await;
        Ok(bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn query(&self, filter: BookingFilter) -> Result<Vec<Booking>, LedgerError> {
        let bookings = self.bookings.lock().await;
        let mut found: Vec<Booking> = bookings.iter().filter(|b| filter.matches(b)).cloned().collect();
        found.sort_by_key(|b| b.slots.first().copied());
        Ok(found)
    }
}
