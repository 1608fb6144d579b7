pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use teloxide::types::{ChatId, UserId};
use uuid::Uuid;

use crate::engine::{BookingError, LedgerError, Rejected};
use crate::models::{Booking, NewBooking, Slot};

pub use memory::InMemoryLedger;

/// The two query shapes the engine relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingFilter {
    Owner(UserId),
    ContainsSlot(Slot),
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        match self {
            BookingFilter::Owner(user_id) => booking.user_id == *user_id,
            BookingFilter::ContainsSlot(slot) => booking.contains(slot),
        }
    }
}

/// Durable store of all bookings.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Writes `booking` unless one of its slots is already taken, in which
    /// case nothing is written and `Rejected::Conflict` names the slot.
    /// Empty or gapped requests are refused before anything is written.
    async fn commit_if_no_overlap(&self, booking: NewBooking) -> Result<Booking, BookingError>;

    /// Returns false when no booking had that id.
    async fn delete(&self, id: Uuid) -> Result<bool, LedgerError>;

    async fn find(&self, id: Uuid) -> Result<Option<Booking>, LedgerError>;

    /// Matching bookings ordered by their first slot.
    async fn query(&self, filter: BookingFilter) -> Result<Vec<Booking>, LedgerError>;
}

#[derive(Clone, Debug)]
pub struct Database {
    pub pool: PgPool,
}

#[derive(Debug, FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: i64,
    chat_id: i64,
    display_name: String,
    created_at: DateTime<Utc>,
    slots: Vec<NaiveDateTime>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            user_id: UserId(row.user_id as u64),
            chat_id: ChatId(row.chat_id),
            display_name: row.display_name,
            slots: row.slots.into_iter().map(Slot::from).collect(),
            created_at: row.created_at,
        }
    }
}

const SELECT_BOOKINGS: &str = r#"
    SELECT b.id, b.user_id, b.chat_id, b.display_name, b.created_at,
           array_agg(s.slot_at ORDER BY s.slot_at) AS slots
    FROM bookings b
    JOIN booking_slots s ON s.booking_id = b.id
"#;

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, LedgerError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(1800))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Database { pool })
    }

    pub async fn init(&self) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_id BIGINT NOT NULL,
                chat_id BIGINT NOT NULL,
                display_name TEXT NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // One row per occupied slot; the primary key is what makes two
        // bookings of the same slot impossible.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS booking_slots (
                slot_at TIMESTAMP PRIMARY KEY,
                booking_id UUID NOT NULL REFERENCES bookings (id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookings_user_id ON bookings (user_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_booking_slots_booking_id ON booking_slots (booking_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl Ledger for Database {
    async fn commit_if_no_overlap(&self, booking: NewBooking) -> Result<Booking, BookingError> {
        // A booking row without slot rows would never show up in SELECT_BOOKINGS.
        booking.validate()?;

        let mut tx = self.pool.begin().await?;

        let (id, created_at): (Uuid, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO bookings (user_id, chat_id, display_name) VALUES ($1, $2, $3) RETURNING id, created_at",
        )
        .bind(booking.owner.user_id.0 as i64)
        .bind(booking.owner.chat_id.0)
        .bind(&booking.owner.display_name)
        .fetch_one(&mut *tx)
        .await?;

        for slot in &booking.slots {
            let inserted = sqlx::query(
                "INSERT INTO booking_slots (slot_at, booking_id) VALUES ($1, $2) ON CONFLICT (slot_at) DO NOTHING",
            )
            .bind(slot.starts_at())
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if inserted == 0 {
                tx.rollback().await?;
                return Err(Rejected::Conflict(*slot).into());
            }
        }

        tx.commit().await?;
        Ok(booking.into_booking(id, created_at))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, LedgerError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Booking>, LedgerError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "{SELECT_BOOKINGS} WHERE b.id = $1 GROUP BY b.id"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Booking::from))
    }

    async fn query(&self, filter: BookingFilter) -> Result<Vec<Booking>, LedgerError> {
        let rows = match filter {
            BookingFilter::Owner(user_id) => {
                sqlx::query_as::<_, BookingRow>(&format!(
                    "{SELECT_BOOKINGS} WHERE b.user_id = $1 GROUP BY b.id ORDER BY MIN(s.slot_at)"
                ))
                .bind(user_id.0 as i64)
                .fetch_all(&self.pool)
                .await?
            }
            BookingFilter::ContainsSlot(slot) => {
                sqlx::query_as::<_, BookingRow>(&format!(
                    "{SELECT_BOOKINGS} WHERE b.id IN (SELECT booking_id FROM booking_slots WHERE slot_at = $1) \
                     GROUP BY b.id ORDER BY MIN(s.slot_at)"
                ))
                .bind(slot.starts_at())
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(Booking::from).collect())
    }
}
