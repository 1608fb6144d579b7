use teloxide::types::UserId;
use uuid::Uuid;

use super::{BookingEngine, BookingError, LedgerError, Rejected};
use crate::bot_state::SessionKey;
use crate::database::BookingFilter;
use crate::models::{Booking, NewBooking, UserIdentity};

impl BookingEngine {
    /// Turns the draft of `key` into a booking owned by `owner`.
    ///
    /// The draft is cleared after a commit and after a lost race; a ledger
    /// failure keeps it so the user can simply press confirm again.
    pub async fn confirm(&self, key: SessionKey, owner: &UserIdentity) -> Result<Booking, BookingError> {
        let selection = self.sessions.get_or_create(key).await;
        let request = NewBooking {
            owner: owner.clone(),
            slots: selection.slots().to_vec(),
        };
        request.validate()?;

        match self.ledger.commit_if_no_overlap(request).await {
            Ok(booking) => {
                self.sessions.clear(key).await;
                log::info!(
                    "✅ Booking {} confirmed for user {}: {}",
                    booking.id,
                    booking.user_id,
                    booking.time_frame()
                );
                Ok(booking)
            }
            Err(BookingError::Rejected(Rejected::Conflict(slot))) => {
                self.sessions.clear(key).await;
                log::warn!("Booking for user {} lost slot {} to another booking", owner.user_id, slot);
                Err(Rejected::Conflict(slot).into())
            }
            Err(e) => Err(e),
        }
    }

    /// Deletes booking `id` if `requester` owns it.
    pub async fn cancel(&self, id: Uuid, requester: UserId) -> Result<Booking, BookingError> {
        let booking = self.ledger.find(id).await?.ok_or(Rejected::NotFound)?;

        if booking.user_id != requester {
            log::warn!("User {} tried to cancel booking {} owned by {}", requester, id, booking.user_id);
            return Err(Rejected::NotOwner.into());
        }

        if !self.ledger.delete(id).await? {
            return Err(Rejected::NotFound.into());
        }

        log::info!("✅ Booking {} cancelled by user {}", id, requester);
        Ok(booking)
    }

    pub async fn list_for(&self, user: UserId) -> Result<Vec<Booking>, LedgerError> {
        self.ledger.query(BookingFilter::Owner(user)).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::bot_state::InMemorySessionStore;
    use crate::database::{InMemoryLedger, Ledger};
    use crate::engine::test_support::{engine, identity, key, slot};
    use crate::engine::DEFAULT_PAGE_SIZE;

    #[tokio::test]
    async fn empty_selection_never_writes() {
        let (engine, ledger) = engine();
        let err = engine.confirm(key(1), &identity(1)).await.unwrap_err();
        assert!(matches!(err, BookingError::Rejected(Rejected::EmptySelection)));
        assert_eq!(ledger.len().await, 0);
    }

    #[tokio::test]
    async fn confirm_commits_exact_selection_and_clears_draft() {
        let (engine, ledger) = engine();
        engine.toggle(key(1), slot("2024-06-01 09:00")).await.unwrap();
        engine.toggle(key(1), slot("2024-06-01 09:30")).await.unwrap();

        let booking = engine.confirm(key(1), &identity(1)).await.unwrap();

        assert!(engine.selection(key(1)).await.is_empty());
        let stored = ledger.find(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.slots, vec![slot("2024-06-01 09:00"), slot("2024-06-01 09:30")]);
        assert_eq!(stored.display_name, "Player 1");
        assert_eq!(booking.time_frame(), "2024-06-01 09:00, 2024-06-01 09:30");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_overlapping_confirms_yield_one_booking() {
        let (engine, ledger) = engine();
        engine.toggle(key(1), slot("2024-06-01 18:00")).await.unwrap();
        engine.toggle(key(1), slot("2024-06-01 18:30")).await.unwrap();
        engine.toggle(key(2), slot("2024-06-01 18:30")).await.unwrap();
        engine.toggle(key(2), slot("2024-06-01 19:00")).await.unwrap();

        let first = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.confirm(key(1), &identity(1)).await })
        };
        let second = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.confirm(key(2), &identity(2)).await })
        };
        let results = [first.await.unwrap(), second.await.unwrap()];

        let committed = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(BookingError::Rejected(Rejected::Conflict(s))) if *s == slot("2024-06-01 18:30")))
            .count();
        assert_eq!((committed, conflicts), (1, 1));
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn lost_race_clears_draft() {
        let ledger = InMemoryLedger::new();
        let sessions = Arc::new(InMemorySessionStore::new());
        let engine = BookingEngine::new(Arc::new(ledger.clone()), sessions, DEFAULT_PAGE_SIZE);

        engine.toggle(key(1), slot("2024-06-01 12:00")).await.unwrap();
        // someone else commits the slot after it was selected
        ledger
            .commit_if_no_overlap(NewBooking {
                owner: identity(2),
                slots: vec![slot("2024-06-01 12:00")],
            })
            .await
            .unwrap();

        let err = engine.confirm(key(1), &identity(1)).await.unwrap_err();
        assert!(matches!(err, BookingError::Rejected(Rejected::Conflict(_))));
        assert!(engine.selection(key(1)).await.is_empty());
        assert_eq!(ledger.len().await, 1);
    }

    struct UnreachableLedger;

    #[async_trait]
    impl Ledger for UnreachableLedger {
        async fn commit_if_no_overlap(&self, _booking: NewBooking) -> Result<Booking, BookingError> {
            Err(LedgerError::Unavailable("connection refused".to_string()).into())
        }

        async fn delete(&self, _id: Uuid) -> Result<bool, LedgerError> {
            Err(LedgerError::Unavailable("connection refused".to_string()))
        }

        async fn find(&self, _id: Uuid) -> Result<Option<Booking>, LedgerError> {
            Err(LedgerError::Unavailable("connection refused".to_string()))
        }

        async fn query(&self, _filter: BookingFilter) -> Result<Vec<Booking>, LedgerError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn ledger_failure_keeps_draft_for_retry() {
        let engine = BookingEngine::new(
            Arc::new(UnreachableLedger),
            Arc::new(InMemorySessionStore::new()),
            DEFAULT_PAGE_SIZE,
        );
        engine.toggle(key(1), slot("2024-06-01 12:00")).await.unwrap();

        let err = engine.confirm(key(1), &identity(1)).await.unwrap_err();
        assert!(matches!(err, BookingError::Ledger(LedgerError::Unavailable(_))));
        assert_eq!(engine.selection(key(1)).await.slots(), &[slot("2024-06-01 12:00")]);
    }

    #[tokio::test]
    async fn cancel_removes_booking_from_owner_listing() {
        let (engine, _) = engine();
        engine.toggle(key(1), slot("2024-06-01 08:00")).await.unwrap();
        let booking = engine.confirm(key(1), &identity(1)).await.unwrap();
        assert_eq!(engine.list_for(UserId(1)).await.unwrap().len(), 1);

        engine.cancel(booking.id, UserId(1)).await.unwrap();
        assert!(engine.list_for(UserId(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancel_checks_owner_and_existence() {
        let (engine, ledger) = engine();
        engine.toggle(key(1), slot("2024-06-01 08:00")).await.unwrap();
        let booking = engine.confirm(key(1), &identity(1)).await.unwrap();

        let err = engine.cancel(booking.id, UserId(2)).await.unwrap_err();
        assert!(matches!(err, BookingError::Rejected(Rejected::NotOwner)));
        assert_eq!(ledger.len().await, 1);

        let err = engine.cancel(Uuid::new_v4(), UserId(1)).await.unwrap_err();
        assert!(matches!(err, BookingError::Rejected(Rejected::NotFound)));
    }

    #[tokio::test]
    async fn list_for_user_without_bookings_is_empty() {
        let (engine, _) = engine();
        assert!(engine.list_for(UserId(42)).await.unwrap().is_empty());
    }
}
