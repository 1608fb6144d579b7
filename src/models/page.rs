use chrono::NaiveDate;

use super::Slot;

/// Number of slot buttons per keyboard row.
pub const SLOTS_PER_ROW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Free,
    HeldByMe,
    HeldByOther,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotCell {
    pub slot: Slot,
    pub status: SlotStatus,
}

/// One page of the slot grid as it should be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub date: NaiveDate,
    pub page: usize,
    pub cells: Vec<SlotCell>,
    pub has_previous: bool,
    pub has_next: bool,
    pub can_confirm: bool,
}

impl PageView {
    pub fn rows(&self) -> impl Iterator<Item = &[SlotCell]> {
        self.cells.chunks(SLOTS_PER_ROW)
    }
}
