use chrono::NaiveDate;
use teloxide::types::MessageId;

use super::Slot;
use crate::engine::Rejected;

/// Where the selection keyboard was last rendered, for in-place edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub message_id: MessageId,
    pub date: NaiveDate,
    pub page: usize,
}

/// A user's draft: the slots marked but not yet confirmed.
///
/// The slots are kept sorted and always form one contiguous run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    slots: Vec<Slot>,
    pub cursor: Option<PageCursor>,
}

impl SelectionState {
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, slot: &Slot) -> bool {
        self.slots.binary_search(slot).is_ok()
    }

    /// Adds `slot` if it extends the run, removes it if it is an endpoint.
    ///
    /// Removing an interior slot is refused so the draft never splits.
    pub fn toggle(&mut self, slot: Slot) -> Result<(), Rejected> {
        match self.slots.binary_search(&slot) {
            Ok(index) => {
                if index != 0 && index != self.slots.len() - 1 {
                    return Err(Rejected::WouldSplit(slot));
                }
                self.slots.remove(index);
                Ok(())
            }
            Err(index) => {
                if !self.slots.is_empty() && !self.slots.iter().any(|s| s.is_adjacent(&slot)) {
                    return Err(Rejected::NonContiguous);
                }
                self.slots.insert(index, slot);
                Ok(())
            }
        }
    }

    /// Drops every selected slot; the page cursor survives for later edits.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    #[cfg(test)]
    pub fn is_contiguous(&self) -> bool {
        self.slots.windows(2).all(|pair| pair[0].is_adjacent(&pair[1]))
    }
}
