//! Types and functions for storing and loading bookings from the database.

use super::booking_state::{BookingState, BookingStatus};
use crate::infra::{
    database::{Repository, Tx},
    error::ApiResult,
    pagination::PaginationParams,
};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use tracing::{instrument, Instrument};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// A request to book an item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_period"))]
pub struct NewBooking {
    /// The item to book.
    #[schema(example = 1)]
    pub item_id: i64,
    /// When the booking starts. Must not be in the past.
    #[schema(value_type = String, example = "2030-01-01T12:00:00")]
    pub start: NaiveDateTime,
    /// When the booking ends. Must be after the start.
    #[schema(value_type = String, example = "2030-01-02T12:00:00")]
    pub end: NaiveDateTime,
}

fn validate_period(booking: &NewBooking) -> Result<(), ValidationError> {
    let now = Utc::now().naive_utc();
    if booking.start < now {
        return Err(ValidationError::new("start_in_past"));
    }
    if booking.end <= booking.start {
        return Err(ValidationError::new("end_not_after_start"));
    }
    Ok(())
}

/// A booking joined with the names of its item and booker.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct Booking {
    pub id: i64,
    #[sqlx(rename = "start_date")]
    pub start: NaiveDateTime,
    #[sqlx(rename = "end_date")]
    pub end: NaiveDateTime,
    pub status: BookingStatus,
    pub item_id: i64,
    pub item_name: String,
    pub item_owner_id: i64,
    pub booker_id: i64,
    pub booker_name: String,
}

/// The item a booking is for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookedItem {
    /// The item's id.
    pub id: i64,
    /// The item's name.
    pub name: String,
}

/// The user who made a booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Booker {
    /// The user's id.
    pub id: i64,
    /// The user's name.
    pub name: String,
}

/// A booking as shown to its booker and to the item owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookingView {
    /// The booking's id.
    #[schema(example = 1)]
    pub id: i64,
    /// When the booking starts.
    #[schema(value_type = String, example = "2030-01-01T12:00:00")]
    pub start: NaiveDateTime,
    /// When the booking ends.
    #[schema(value_type = String, example = "2030-01-02T12:00:00")]
    pub end: NaiveDateTime,
    /// The approval status.
    pub status: BookingStatus,
    /// The booked item.
    pub item: BookedItem,
    /// The booker.
    pub booker: Booker,
}

impl From<Booking> for BookingView {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            start: b.start,
            end: b.end,
            status: b.status,
            item: BookedItem {
                id: b.item_id,
                name: b.item_name,
            },
            booker: Booker {
                id: b.booker_id,
                name: b.booker_name,
            },
        }
    }
}

/// A booking as shown next to an item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingShort {
    /// The booking's id.
    pub id: i64,
    /// The booker's id.
    pub booker_id: i64,
    /// When the booking starts.
    #[schema(value_type = String)]
    pub start: NaiveDateTime,
    /// When the booking ends.
    #[schema(value_type = String)]
    pub end: NaiveDateTime,
}

impl From<Booking> for BookingShort {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            booker_id: b.booker_id,
            start: b.start,
            end: b.end,
        }
    }
}

/// A booking ready to be stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingRecord {
    pub item_id: i64,
    pub booker_id: i64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Whose bookings to list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookingParty {
    /// Bookings made by this user.
    Booker(i64),
    /// Bookings of items owned by this user.
    Owner(i64),
}

/// Anything that can store bookings.
#[async_trait::async_trait]
pub trait BookingRepository: Send {
    /// Stores a new booking in the [`BookingStatus::Waiting`] status.
    async fn create_booking(&mut self, booking: BookingRecord) -> ApiResult<Booking>;
    /// Fetches a booking.
    async fn fetch_booking(&mut self, id: i64) -> ApiResult<Option<Booking>>;
    /// Moves a booking from `from` to `to`.
    ///
    /// Returns `None` if the booking is no longer in status `from`.
    async fn transition_booking(
        &mut self,
        id: i64,
        from: BookingStatus,
        to: BookingStatus,
    ) -> ApiResult<Option<Booking>>;
    /// Lists bookings of one party matching a state, newest start first.
    async fn list_bookings(
        &mut self,
        party: BookingParty,
        state: BookingState,
        now: NaiveDateTime,
        page: PaginationParams,
    ) -> ApiResult<Vec<Booking>>;
    /// The latest booking of an item that ended before `now`.
    async fn last_booking(&mut self, item_id: i64, now: NaiveDateTime)
        -> ApiResult<Option<Booking>>;
    /// The earliest booking of an item that starts after `now`.
    async fn next_booking(&mut self, item_id: i64, now: NaiveDateTime)
        -> ApiResult<Option<Booking>>;
    /// Whether a user has a booking of an item that ended before `now`.
    async fn has_finished_booking(
        &mut self,
        booker_id: i64,
        item_id: i64,
        now: NaiveDateTime,
    ) -> ApiResult<bool>;
}

const SELECT_BOOKINGS: &str = r#"
    SELECT b.id, b.start_date, b.end_date, b.status,
           i.id AS item_id, i.name AS item_name, i.owner_id AS item_owner_id,
           u.id AS booker_id, u.name AS booker_name
    FROM bookings b
    JOIN items i ON i.id = b.item_id
    JOIN users u ON u.id = b.booker_id
"#;

/// Appends the condition selecting bookings in `state`.
fn push_state_filter(qb: &mut QueryBuilder<'_, Postgres>, state: BookingState, now: NaiveDateTime) {
    match state {
        BookingState::All => {}
        BookingState::Current => {
            qb.push(" AND b.start_date < ")
                .push_bind(now)
                .push(" AND b.end_date > ")
                .push_bind(now);
        }
        BookingState::Past => {
            qb.push(" AND b.end_date < ").push_bind(now);
        }
        BookingState::Future => {
            qb.push(" AND b.start_date > ").push_bind(now);
        }
        BookingState::Waiting => {
            qb.push(" AND b.status = ").push_bind(BookingStatus::Waiting);
        }
        BookingState::Rejected => {
            qb.push(" AND b.status = ").push_bind(BookingStatus::Rejected);
        }
    }
}

#[async_trait::async_trait]
impl BookingRepository for Repository<Tx> {
    #[instrument(skip(self))]
    async fn create_booking(&mut self, booking: BookingRecord) -> ApiResult<Booking> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
                WITH b AS (
                    INSERT INTO bookings (item_id, booker_id, start_date, end_date, status)
                    VALUES ($1, $2, $3, $4, 'WAITING')
                    RETURNING *
                )
                SELECT b.id, b.start_date, b.end_date, b.status,
                       i.id AS item_id, i.name AS item_name, i.owner_id AS item_owner_id,
                       u.id AS booker_id, u.name AS booker_name
                FROM b
                JOIN items i ON i.id = b.item_id
                JOIN users u ON u.id = b.booker_id
            "#,
        )
        .bind(booking.item_id)
        .bind(booking.booker_id)
        .bind(booking.start)
        .bind(booking.end)
        .fetch_one(&mut *self.executor)
        .await?;
        tracing::info!("Created booking {:?}", booking);
        Ok(booking)
    }

    #[instrument(skip(self))]
    async fn fetch_booking(&mut self, id: i64) -> ApiResult<Option<Booking>> {
        let booking = QueryBuilder::<Postgres>::new(SELECT_BOOKINGS)
            .push(" WHERE b.id = ")
            .push_bind(id)
            .build_query_as::<Booking>()
            .fetch_optional(&mut *self.executor)
            .instrument(tracing::info_span!("fetch_optional"))
            .await?;
        tracing::debug!("Found booking: {:?}", booking);
        Ok(booking)
    }

    #[instrument(skip(self))]
    async fn transition_booking(
        &mut self,
        id: i64,
        from: BookingStatus,
        to: BookingStatus,
    ) -> ApiResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
                WITH b AS (
                    UPDATE bookings SET status = $3
                    WHERE id = $1 AND status = $2
                    RETURNING *
                )
                SELECT b.id, b.start_date, b.end_date, b.status,
                       i.id AS item_id, i.name AS item_name, i.owner_id AS item_owner_id,
                       u.id AS booker_id, u.name AS booker_name
                FROM b
                JOIN items i ON i.id = b.item_id
                JOIN users u ON u.id = b.booker_id
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(&mut *self.executor)
        .await?;
        tracing::info!("Transitioned booking {} from {} to {}", id, from, to);
        Ok(booking)
    }

    #[instrument(skip(self))]
    async fn list_bookings(
        &mut self,
        party: BookingParty,
        state: BookingState,
        now: NaiveDateTime,
        page: PaginationParams,
    ) -> ApiResult<Vec<Booking>> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_BOOKINGS);
        match party {
            BookingParty::Booker(id) => qb.push(" WHERE b.booker_id = ").push_bind(id),
            BookingParty::Owner(id) => qb.push(" WHERE i.owner_id = ").push_bind(id),
        };
        push_state_filter(&mut qb, state, now);
        qb.push(" ORDER BY b.start_date DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let bookings = qb
            .build_query_as::<Booking>()
            .fetch_all(&mut *self.executor)
            .instrument(tracing::info_span!("fetch_all"))
            .await?;
        tracing::info!("Listed {} bookings", bookings.len());
        Ok(bookings)
    }

    #[instrument(skip(self))]
    async fn last_booking(
        &mut self,
        item_id: i64,
        now: NaiveDateTime,
    ) -> ApiResult<Option<Booking>> {
        let booking = QueryBuilder::<Postgres>::new(SELECT_BOOKINGS)
            .push(" WHERE b.item_id = ")
            .push_bind(item_id)
            .push(" AND b.end_date < ")
            .push_bind(now)
            .push(" AND b.status <> ")
            .push_bind(BookingStatus::Rejected)
            .push(" ORDER BY b.start_date DESC LIMIT 1")
            .build_query_as::<Booking>()
            .fetch_optional(&mut *self.executor)
            .await?;
        Ok(booking)
    }

    #[instrument(skip(self))]
    async fn next_booking(
        &mut self,
        item_id: i64,
        now: NaiveDateTime,
    ) -> ApiResult<Option<Booking>> {
        let booking = QueryBuilder::<Postgres>::new(SELECT_BOOKINGS)
            .push(" WHERE b.item_id = ")
            .push_bind(item_id)
            .push(" AND b.start_date > ")
            .push_bind(now)
            .push(" AND b.status <> ")
            .push_bind(BookingStatus::Rejected)
            .push(" ORDER BY b.start_date ASC LIMIT 1")
            .build_query_as::<Booking>()
            .fetch_optional(&mut *self.executor)
            .await?;
        Ok(booking)
    }

    #[instrument(skip(self))]
    async fn has_finished_booking(
        &mut self,
        booker_id: i64,
        item_id: i64,
        now: NaiveDateTime,
    ) -> ApiResult<bool> {
        let found: bool = sqlx::query_scalar(
            r#"
                SELECT EXISTS (
                    SELECT 1 FROM bookings
                    WHERE booker_id = $1 AND item_id = $2 AND end_date < $3
                )
            "#,
        )
        .bind(booker_id)
        .bind(item_id)
        .bind(now)
        .fetch_one(&mut *self.executor)
        .await?;
        Ok(found)
    }
}
