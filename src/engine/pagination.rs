use std::ops::Range;

use chrono::NaiveDate;

use super::{BookingEngine, LedgerError};
use crate::models::{PageView, SelectionState, Slot, SlotCell, SlotGrid};

/// Index range of page `page` over `total` items, the page actually used
/// (clamped to the last one), and whether previous / next pages exist.
pub fn window(total: usize, page: usize, page_size: usize) -> (Range<usize>, usize, bool, bool) {
    let page_size = page_size.max(1);
    let last_page = total.saturating_sub(1) / page_size;
    let page = page.min(last_page);
    let start = page * page_size;
    let end = (start + page_size).min(total);
    (start..end, page, page > 0, end < total)
}

impl BookingEngine {
    /// Index of the page of its day that shows `slot`.
    pub fn page_of(&self, slot: &Slot) -> usize {
        SlotGrid::generate(slot.date())
            .iter()
            .position(|s| s == slot)
            .map_or(0, |index| index / self.page_size)
    }

    /// Builds one page of the day's slot grid with fresh availability.
    pub async fn page(
        &self,
        date: NaiveDate,
        selection: &SelectionState,
        page: usize,
    ) -> Result<PageView, LedgerError> {
        let grid = SlotGrid::generate(date);
        let (range, page, has_previous, has_next) = window(grid.len(), page, self.page_size);

        let mut cells = Vec::with_capacity(range.len());
        for slot in &grid[range] {
            cells.push(SlotCell {
                slot: *slot,
                status: self.status(slot, selection).await?,
            });
        }

        Ok(PageView {
            date,
            page,
            cells,
            has_previous,
            has_next,
            can_confirm: !selection.is_empty(),
        })
    }
}
