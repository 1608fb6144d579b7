use teloxide::types::{ChatId, UserId};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Slot;
use crate::engine::Rejected;

/// Who is asking: the transport-provided identity of a user in a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub display_name: String,
}

/// A committed court reservation.
///
/// `slots` is non-empty, sorted and contiguous; no two bookings in the
/// ledger share a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub display_name: String,
    pub slots: Vec<Slot>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn contains(&self, slot: &Slot) -> bool {
        self.slots.binary_search(slot).is_ok()
    }

    pub fn overlaps(&self, slots: &[Slot]) -> Option<Slot> {
        slots.iter().copied().find(|slot| self.contains(slot))
    }

    /// `2024-06-01 09:00, 2024-06-01 09:30`
    pub fn time_frame(&self) -> String {
        self.slots
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A booking about to be written; the ledger assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub owner: UserIdentity,
    pub slots: Vec<Slot>,
}

impl NewBooking {
    /// A booking must cover at least one slot and its slots must form one run.
    pub fn validate(&self) -> Result<(), Rejected> {
        if self.slots.is_empty() {
            return Err(Rejected::EmptySelection);
        }
        if !self.slots.windows(2).all(|pair| pair[1].is_adjacent(&pair[0]) && pair[0] < pair[1]) {
            return Err(Rejected::NonContiguous);
        }
        Ok(())
    }

    pub fn into_booking(self, id: Uuid, created_at: DateTime<Utc>) -> Booking {
        Booking {
            id,
            user_id: self.owner.user_id,
            chat_id: self.owner.chat_id,
            display_name: self.owner.display_name,
            slots: self.slots,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(slots: &[&str]) -> NewBooking {
        NewBooking {
            owner: UserIdentity {
                user_id: UserId(1),
                chat_id: ChatId(1),
                display_name: "Player 1".to_string(),
            },
            slots: slots.iter().map(|s| s.parse().unwrap()).collect(),
        }
    }

    #[test]
    fn empty_or_gapped_requests_are_invalid() {
        assert_eq!(request(&[]).validate(), Err(Rejected::EmptySelection));
        assert_eq!(
            request(&["2024-06-01 09:00", "2024-06-01 11:00"]).validate(),
            Err(Rejected::NonContiguous)
        );
        assert_eq!(
            request(&["2024-06-01 09:30", "2024-06-01 09:00"]).validate(),
            Err(Rejected::NonContiguous)
        );
        assert_eq!(request(&["2024-06-01 09:00", "2024-06-01 09:30"]).validate(), Ok(()));
    }
}
