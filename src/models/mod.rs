pub mod booking;
pub mod intent;
pub mod page;
pub mod selection;
pub mod slot;

pub use booking::{Booking, NewBooking, UserIdentity};
pub use intent::Intent;
pub use page::{PageView, SlotCell, SlotStatus};
pub use selection::{PageCursor, SelectionState};
pub use slot::{Slot, SlotGrid};
