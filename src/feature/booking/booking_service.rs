//! The booking rules: who may book what, and who may decide on a booking.

use super::{
    booking_repository::{BookingParty, BookingRecord, BookingRepository, BookingView, NewBooking},
    booking_state::{BookingState, BookingStatus},
};
use crate::{
    feature::{item::item_repository::ItemRepository, user::user_repository::UserRepository},
    infra::{
        error::{ApiResult, ClientError},
        pagination::PaginationParams,
    },
};
use chrono::NaiveDateTime;
use tracing::instrument;

/// Books an item for the booker.
///
/// The checks run in a fixed order so that the first violated rule
/// decides the error.
#[instrument(skip(repository))]
pub async fn create_booking<R>(
    repository: &mut R,
    booker_id: i64,
    new_booking: NewBooking,
    now: NaiveDateTime,
) -> ApiResult<BookingView>
where
    R: UserRepository + ItemRepository + BookingRepository,
{
    let item = repository
        .fetch_item(new_booking.item_id)
        .await?
        .ok_or_else(|| ClientError::NotFound(format!("item {} not found", new_booking.item_id)))?;
    repository
        .fetch_user(booker_id)
        .await?
        .ok_or_else(|| ClientError::NotFound(format!("user {booker_id} not found")))?;
    if item.owner_id == booker_id {
        tracing::warn!("User {} tried to book their own item {}", booker_id, item.id);
        return Err(ClientError::NotFound("cannot book your own item".to_string()))?;
    }
    if !item.available {
        return Err(ClientError::BadRequest(format!(
            "item {} is not available",
            item.id
        )))?;
    }
    if new_booking.end <= new_booking.start {
        return Err(ClientError::BadRequest(
            "booking must end after it starts".to_string(),
        ))?;
    }
    if new_booking.start < now {
        return Err(ClientError::BadRequest(
            "booking cannot start in the past".to_string(),
        ))?;
    }
    let booking = repository
        .create_booking(BookingRecord {
            item_id: item.id,
            booker_id,
            start: new_booking.start,
            end: new_booking.end,
        })
        .await?;
    tracing::info!("User {} booked item {}", booker_id, item.id);
    Ok(booking.into())
}

/// Approves or rejects a waiting booking on behalf of the item owner.
#[instrument(skip(repository))]
pub async fn change_status<R: BookingRepository>(
    repository: &mut R,
    user_id: i64,
    booking_id: i64,
    approved: bool,
) -> ApiResult<BookingView> {
    let booking = repository
        .fetch_booking(booking_id)
        .await?
        .ok_or_else(|| ClientError::NotFound(format!("booking {booking_id} not found")))?;
    if booking.item_owner_id != user_id {
        tracing::warn!("User {} does not own booking {}", user_id, booking_id);
        return Err(ClientError::NotFound(format!(
            "booking {booking_id} not found"
        )))?;
    }
    match booking.status {
        BookingStatus::Waiting => {}
        BookingStatus::Approved => {
            return Err(ClientError::BadRequest("already approved".to_string()))?;
        }
        BookingStatus::Rejected => {
            return Err(ClientError::BadRequest("already rejected".to_string()))?;
        }
    }
    let target = BookingStatus::decided(approved);
    let booking = repository
        .transition_booking(booking_id, BookingStatus::Waiting, target)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Booking {} was decided concurrently", booking_id);
            ClientError::BadRequest(format!("booking {booking_id} was already decided"))
        })?;
    Ok(booking.into())
}

/// Reads a booking visible to `user_id`, that is, one they made or one of their items.
#[instrument(skip(repository))]
pub async fn get_booking<R: BookingRepository>(
    repository: &mut R,
    user_id: i64,
    booking_id: i64,
) -> ApiResult<BookingView> {
    let booking = repository
        .fetch_booking(booking_id)
        .await?
        .filter(|b| b.booker_id == user_id || b.item_owner_id == user_id)
        .ok_or_else(|| ClientError::NotFound(format!("booking {booking_id} not found")))?;
    Ok(booking.into())
}

/// Lists the bookings of a booker or of an owner's items.
#[instrument(skip(repository))]
pub async fn list_bookings<R>(
    repository: &mut R,
    party: BookingParty,
    state: BookingState,
    now: NaiveDateTime,
    page: PaginationParams,
) -> ApiResult<Vec<BookingView>>
where
    R: UserRepository + BookingRepository,
{
    let user_id = match party {
        BookingParty::Booker(id) | BookingParty::Owner(id) => id,
    };
    repository
        .fetch_user(user_id)
        .await?
        .ok_or_else(|| ClientError::NotFound(format!("user {user_id} not found")))?;
    let bookings = repository
        .list_bookings(party, state, now, page)
        .await?;
    Ok(bookings.into_iter().map(BookingView::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        feature::{
            booking::booking_repository::Booking, item::item_repository::Item, mock::MockRepository,
            user::user_repository::User,
        },
        infra::error::ApiError,
    };
    use chrono::{Duration, NaiveDate};
    use mockall::predicate::eq;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    fn drill(available: bool) -> Item {
        Item {
            id: 10,
            name: "Drill".to_string(),
            description: "A cordless drill".to_string(),
            available,
            owner_id: 1,
            request_id: None,
        }
    }

    fn user(id: i64) -> User {
        User {
            id,
            name: format!("user {id}"),
            email: format!("user{id}@example.com"),
        }
    }

    fn booking(status: BookingStatus) -> Booking {
        Booking {
            id: 100,
            start: now() + Duration::days(1),
            end: now() + Duration::days(2),
            status,
            item_id: 10,
            item_name: "Drill".to_string(),
            item_owner_id: 1,
            booker_id: 2,
            booker_name: "user 2".to_string(),
        }
    }

    fn tomorrow() -> NewBooking {
        NewBooking {
            item_id: 10,
            start: now() + Duration::days(1),
            end: now() + Duration::days(2),
        }
    }

    fn repo_with(item: Item) -> MockRepository {
        let mut repo = MockRepository::new();
        repo.expect_fetch_item()
            .with(eq(10))
            .return_once(move |_| Ok(Some(item)));
        repo.expect_fetch_user()
            .returning(|id| Ok(Some(user(id))));
        repo
    }

    fn is_not_found<T>(result: &ApiResult<T>) -> bool {
        matches!(result, Err(ApiError::ClientError(ClientError::NotFound(_))))
    }

    fn is_bad_request<T>(result: &ApiResult<T>) -> bool {
        matches!(result, Err(ApiError::ClientError(ClientError::BadRequest(_))))
    }

    #[tokio::test]
    async fn booking_is_created_waiting() {
        let mut repo = repo_with(drill(true));
        let expected = BookingRecord {
            item_id: 10,
            booker_id: 2,
            start: now() + Duration::days(1),
            end: now() + Duration::days(2),
        };
        repo.expect_create_booking()
            .with(eq(expected))
            .return_once(|_| Ok(booking(BookingStatus::Waiting)));
        let view = create_booking(&mut repo, 2, tomorrow(), now()).await.unwrap();
        assert_eq!(100, view.id);
        assert_eq!(BookingStatus::Waiting, view.status);
        assert_eq!(now() + Duration::days(1), view.start);
        assert_eq!(now() + Duration::days(2), view.end);
        assert_eq!(2, view.booker.id);
        assert_eq!(10, view.item.id);
    }

    #[tokio::test]
    async fn owner_cannot_book_own_item() {
        let mut repo = repo_with(drill(true));
        let result = create_booking(&mut repo, 1, tomorrow(), now()).await;
        assert!(is_not_found(&result));
    }

    #[tokio::test]
    async fn unavailable_item_cannot_be_booked() {
        let mut repo = repo_with(drill(false));
        let result = create_booking(&mut repo, 2, tomorrow(), now()).await;
        assert!(is_bad_request(&result));
    }

    #[tokio::test]
    async fn booking_must_end_after_start() {
        let mut repo = repo_with(drill(true));
        let new_booking = NewBooking {
            end: now() + Duration::days(1),
            ..tomorrow()
        };
        let result = create_booking(&mut repo, 2, new_booking, now()).await;
        assert!(is_bad_request(&result));
    }

    #[tokio::test]
    async fn booking_cannot_start_in_the_past() {
        let mut repo = repo_with(drill(true));
        let new_booking = NewBooking {
            start: now() - Duration::hours(1),
            ..tomorrow()
        };
        let result = create_booking(&mut repo, 2, new_booking, now()).await;
        assert!(is_bad_request(&result));
    }

    #[tokio::test]
    async fn missing_item_is_checked_first() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_item().return_once(|_| Ok(None));
        repo.expect_fetch_user().never();
        let result = create_booking(&mut repo, 2, tomorrow(), now()).await;
        assert!(is_not_found(&result));
    }

    #[tokio::test]
    async fn missing_booker_is_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_item()
            .return_once(|_| Ok(Some(drill(false))));
        repo.expect_fetch_user().return_once(|_| Ok(None));
        let result = create_booking(&mut repo, 2, tomorrow(), now()).await;
        assert!(is_not_found(&result));
    }

    #[tokio::test]
    async fn owner_approves_waiting_booking() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_booking()
            .with(eq(100))
            .return_once(|_| Ok(Some(booking(BookingStatus::Waiting))));
        repo.expect_transition_booking()
            .with(eq(100), eq(BookingStatus::Waiting), eq(BookingStatus::Approved))
            .return_once(|_, _, _| Ok(Some(booking(BookingStatus::Approved))));
        let view = change_status(&mut repo, 1, 100, true).await.unwrap();
        assert_eq!(BookingStatus::Approved, view.status);
    }

    #[tokio::test]
    async fn owner_rejects_waiting_booking() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_booking()
            .return_once(|_| Ok(Some(booking(BookingStatus::Waiting))));
        repo.expect_transition_booking()
            .with(eq(100), eq(BookingStatus::Waiting), eq(BookingStatus::Rejected))
            .return_once(|_, _, _| Ok(Some(booking(BookingStatus::Rejected))));
        let view = change_status(&mut repo, 1, 100, false).await.unwrap();
        assert_eq!(BookingStatus::Rejected, view.status);
    }

    #[tokio::test]
    async fn approving_twice_fails() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_booking()
            .return_once(|_| Ok(Some(booking(BookingStatus::Approved))));
        repo.expect_transition_booking().never();
        let result = change_status(&mut repo, 1, 100, true).await;
        match result {
            Err(ApiError::ClientError(ClientError::BadRequest(msg))) => {
                assert_eq!("already approved", msg)
            }
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejected_booking_cannot_be_approved() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_booking()
            .return_once(|_| Ok(Some(booking(BookingStatus::Rejected))));
        repo.expect_transition_booking().never();
        let result = change_status(&mut repo, 1, 100, true).await;
        assert!(is_bad_request(&result));
    }

    #[tokio::test]
    async fn lost_race_is_a_bad_request() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_booking()
            .return_once(|_| Ok(Some(booking(BookingStatus::Waiting))));
        repo.expect_transition_booking()
            .return_once(|_, _, _| Ok(None));
        let result = change_status(&mut repo, 1, 100, true).await;
        assert!(is_bad_request(&result));
    }

    #[tokio::test]
    async fn only_owner_may_decide() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_booking()
            .return_once(|_| Ok(Some(booking(BookingStatus::Waiting))));
        repo.expect_transition_booking().never();
        let result = change_status(&mut repo, 2, 100, true).await;
        assert!(is_not_found(&result));
    }

    #[tokio::test]
    async fn booker_and_owner_see_booking() {
        for user_id in [1, 2] {
            let mut repo = MockRepository::new();
            repo.expect_fetch_booking()
                .return_once(|_| Ok(Some(booking(BookingStatus::Waiting))));
            let view = get_booking(&mut repo, user_id, 100).await.unwrap();
            assert_eq!(100, view.id);
        }
    }

    #[tokio::test]
    async fn strangers_do_not_see_booking() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_booking()
            .return_once(|_| Ok(Some(booking(BookingStatus::Waiting))));
        let result = get_booking(&mut repo, 3, 100).await;
        assert!(is_not_found(&result));
    }

    #[tokio::test]
    async fn listing_requires_existing_user() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_user().return_once(|_| Ok(None));
        repo.expect_list_bookings().never();
        let result = list_bookings(
            &mut repo,
            BookingParty::Booker(7),
            BookingState::All,
            now(),
            PaginationParams::default(),
        )
        .await;
        assert!(is_not_found(&result));
    }

    #[tokio::test]
    async fn listing_passes_filter_through() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_user()
            .returning(|id| Ok(Some(user(id))));
        repo.expect_list_bookings()
            .with(
                eq(BookingParty::Owner(1)),
                eq(BookingState::Past),
                eq(now()),
                eq(PaginationParams::new(0, 5)),
            )
            .return_once(|_, _, _, _| Ok(vec![booking(BookingStatus::Approved)]));
        let views = list_bookings(
            &mut repo,
            BookingParty::Owner(1),
            BookingState::Past,
            now(),
            PaginationParams::new(0, 5),
        )
        .await
        .unwrap();
        assert_eq!(1, views.len());
        assert_eq!("Drill", views[0].item.name);
    }
}
