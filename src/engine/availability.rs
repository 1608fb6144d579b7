use super::{BookingEngine, LedgerError};
use crate::database::BookingFilter;
use crate::models::{SelectionState, Slot, SlotStatus};

impl BookingEngine {
    /// Who holds `slot` right now, as far as the last ledger read knows.
    pub async fn status(&self, slot: &Slot, selection: &SelectionState) -> Result<SlotStatus, LedgerError> {
        if selection.contains(slot) {
            return Ok(SlotStatus::HeldByMe);
        }

        let holders = self.ledger.query(BookingFilter::ContainsSlot(*slot)).await?;
        Ok(if holders.is_empty() {
            SlotStatus::Free
        } else {
            SlotStatus::HeldByOther
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::test_support::{engine, identity, key, slot};
    use crate::models::SlotStatus;

    #[tokio::test]
    async fn distinguishes_mine_others_and_free() {
        let (engine, _) = engine();
        engine.toggle(key(1), slot("2024-06-01 09:00")).await.unwrap();
        engine.confirm(key(1), &identity(1)).await.unwrap();
        engine.toggle(key(2), slot("2024-06-01 10:00")).await.unwrap();

        let mine = engine.selection(key(2)).await;
        assert_eq!(
            engine.status(&slot("2024-06-01 10:00"), &mine).await.unwrap(),
            SlotStatus::HeldByMe
        );
        assert_eq!(
            engine.status(&slot("2024-06-01 09:00"), &mine).await.unwrap(),
            SlotStatus::HeldByOther
        );
        assert_eq!(
            engine.status(&slot("2024-06-01 11:00"), &mine).await.unwrap(),
            SlotStatus::Free
        );
    }

    #[tokio::test]
    async fn own_committed_booking_reads_as_taken() {
        let (engine, _) = engine();
        engine.toggle(key(1), slot("2024-06-01 09:00")).await.unwrap();
        engine.confirm(key(1), &identity(1)).await.unwrap();

        let draft = engine.selection(key(1)).await;
        assert_eq!(
            engine.status(&slot("2024-06-01 09:00"), &draft).await.unwrap(),
            SlotStatus::HeldByOther
        );
    }
}
