use thiserror::Error;

use crate::models::Slot;

/// A request the engine refused; state is left as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("Please select a continuous time interval.")]
    NonContiguous,
    #[error("Removing {0} would split your selection. Deselect from either end instead.")]
    WouldSplit(Slot),
    #[error("{0} is not a bookable time.")]
    OffGrid(Slot),
    #[error("No time slots selected.")]
    EmptySelection,
    #[error("The time slot {0} has already been booked by someone else.")]
    Conflict(Slot),
    #[error("Booking not found.")]
    NotFound,
    #[error("This booking belongs to another user.")]
    NotOwner,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("database error: {0}")]
    Database(sqlx::Error),
    /// The pool could not hand out a connection; retrying later may work.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                LedgerError::Unavailable(err.to_string())
            }
            err => LedgerError::Database(err),
        }
    }
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error(transparent)]
    Rejected(#[from] Rejected),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<sqlx::Error> for BookingError {
    fn from(err: sqlx::Error) -> Self {
        BookingError::Ledger(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_exhaustion_is_reported_as_unavailable() {
        assert!(matches!(
            LedgerError::from(sqlx::Error::PoolTimedOut),
            LedgerError::Unavailable(_)
        ));
        assert!(matches!(
            BookingError::from(sqlx::Error::PoolClosed),
            BookingError::Ledger(LedgerError::Unavailable(_))
        ));
        assert!(matches!(
            LedgerError::from(sqlx::Error::RowNotFound),
            LedgerError::Database(_)
        ));
    }
}
