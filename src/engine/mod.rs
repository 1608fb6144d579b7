//! Slot selection and booking consistency.
//!
//! The engine owns no transport concerns: it turns intents into draft
//! mutations, render models and ledger commits. Drafts live in an injected
//! [`SessionStore`], bookings in an injected [`Ledger`].

mod availability;
mod committer;
mod error;
mod pagination;

use std::sync::Arc;

use crate::bot_state::{SessionKey, SessionStore};
use crate::database::Ledger;
use crate::models::{PageCursor, SelectionState, Slot, SlotGrid, SlotStatus};

pub use error::{BookingError, LedgerError, Rejected};

/// Default number of slot buttons on one page.
pub const DEFAULT_PAGE_SIZE: usize = 9;

#[derive(Clone)]
pub struct BookingEngine {
    ledger: Arc<dyn Ledger>,
    sessions: Arc<dyn SessionStore>,
    page_size: usize,
}

impl BookingEngine {
    pub fn new(ledger: Arc<dyn Ledger>, sessions: Arc<dyn SessionStore>, page_size: usize) -> Self {
        Self {
            ledger,
            sessions,
            page_size: page_size.max(1),
        }
    }

    pub async fn selection(&self, key: SessionKey) -> SelectionState {
        self.sessions.get_or_create(key).await
    }

    /// Marks or unmarks `slot` in the draft of `key`.
    ///
    /// Adding a slot someone else already booked is refused up front; the
    /// ledger still re-checks on confirm.
    pub async fn toggle(&self, key: SessionKey, slot: Slot) -> Result<SelectionState, BookingError> {
        if !SlotGrid::contains(&slot) {
            return Err(Rejected::OffGrid(slot).into());
        }

        let mut selection = self.sessions.get_or_create(key).await;

        if !selection.contains(&slot)
            && self.status(&slot, &selection).await? == SlotStatus::HeldByOther
        {
            return Err(Rejected::Conflict(slot).into());
        }

        selection.toggle(slot)?;
        self.sessions.save(key, selection.clone()).await;
        Ok(selection)
    }

    /// Records which message shows the slot keyboard of `key`.
    pub async fn remember_page(&self, key: SessionKey, cursor: PageCursor) {
        let mut selection = self.sessions.get_or_create(key).await;
        selection.cursor = Some(cursor);
        self.sessions.save(key, selection).await;
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{engine, key, slot};
    use super::*;

    #[tokio::test]
    async fn toggle_persists_draft_between_calls() {
        let (engine, _) = engine();
        engine.toggle(key(1), slot("2024-06-01 09:00")).await.unwrap();
        let selection = engine.toggle(key(1), slot("2024-06-01 09:30")).await.unwrap();
        assert_eq!(selection.slots().len(), 2);

        let err = engine.toggle(key(1), slot("2024-06-01 10:30")).await.unwrap_err();
        assert!(matches!(err, BookingError::Rejected(Rejected::NonContiguous)));
        assert_eq!(engine.selection(key(1)).await, selection);
    }

    #[tokio::test]
    async fn drafts_are_isolated_per_user() {
        let (engine, _) = engine();
        engine.toggle(key(1), slot("2024-06-01 09:00")).await.unwrap();
        engine.toggle(key(2), slot("2024-06-01 15:00")).await.unwrap();
        assert_eq!(engine.selection(key(1)).await.slots(), &[slot("2024-06-01 09:00")]);
        assert_eq!(engine.selection(key(2)).await.slots(), &[slot("2024-06-01 15:00")]);
    }

    #[tokio::test]
    async fn off_grid_slot_is_refused() {
        let (engine, _) = engine();
        let err = engine.toggle(key(1), slot("2024-06-01 09:15")).await.unwrap_err();
        assert!(matches!(err, BookingError::Rejected(Rejected::OffGrid(_))));
        assert!(engine.selection(key(1)).await.is_empty());
    }

    #[tokio::test]
    async fn booked_slot_cannot_be_selected() {
        let (engine, _) = engine();
        engine.toggle(key(1), slot("2024-06-01 09:00")).await.unwrap();
        engine.confirm(key(1), &test_support::identity(1)).await.unwrap();

        let err = engine.toggle(key(2), slot("2024-06-01 09:00")).await.unwrap_err();
        assert!(matches!(err, BookingError::Rejected(Rejected::Conflict(_))));
    }
}
