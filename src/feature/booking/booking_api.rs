//! The booking API implementation.

use super::{
    booking_repository::{BookingParty, BookingView, NewBooking},
    booking_service,
    booking_state::StateParams,
};
use crate::infra::{
    database::{DbPool, Repository},
    error::{ApiResult, ClientError},
    extract::{Json, Query},
    pagination::PaginationParams,
    security::Sharer,
    state::AppState,
    validation::Valid,
};
use axum::{extract::State, Router};
use axum_extra::routing::{RouterExt, TypedPath};
use chrono::Utc;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::IntoParams;

/// The booking API endpoints.
pub fn routes() -> Router<AppState> {
    Router::new()
        .typed_post(create_booking)
        .typed_get(list_bookings)
        .typed_get(list_owner_bookings)
        .typed_get(get_booking)
        .typed_patch(change_status)
}

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/bookings", rejection(ClientError))]
pub(crate) struct Bookings;

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/bookings/owner", rejection(ClientError))]
pub(crate) struct BookingsOwner;

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/bookings/:id", rejection(ClientError))]
pub(crate) struct BookingsId(pub i64);

/// The owner's decision on a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApprovalParams {
    /// Whether to approve or reject the booking.
    pub approved: bool,
}

/// Books an item.
#[utoipa::path(
    post,
    path = "/bookings",
    request_body = NewBooking,
    params(("X-Sharer-User-Id" = i64, Header, description = "The acting user")),
    responses(
        (status = 201, description = "Created", body = BookingView),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn create_booking(
    Bookings: Bookings,
    sharer: Sharer,
    db: State<DbPool>,
    Json(new_booking): Json<NewBooking>,
) -> ApiResult<(StatusCode, Json<BookingView>)> {
    let now = Utc::now().naive_utc();
    let mut repo = Repository::begin(&db).await?;
    let booking =
        booking_service::create_booking(&mut repo, sharer.id(), new_booking, now).await?;
    repo.commit().await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Approves or rejects a booking of one of your items.
#[utoipa::path(
    patch,
    path = "/bookings/{id}",
    params(
        ("X-Sharer-User-Id" = i64, Header, description = "The acting user"),
        ApprovalParams,
    ),
    responses(
        (status = 200, description = "Ok", body = BookingView),
        (status = 400, description = "Already decided", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn change_status(
    BookingsId(id): BookingsId,
    sharer: Sharer,
    db: State<DbPool>,
    Query(params): Query<ApprovalParams>,
) -> ApiResult<Json<BookingView>> {
    let mut repo = Repository::begin(&db).await?;
    let booking =
        booking_service::change_status(&mut repo, sharer.id(), id, params.approved).await?;
    repo.commit().await?;
    Ok(Json(booking))
}

/// Gets a booking you made, or a booking of one of your items.
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    params(("X-Sharer-User-Id" = i64, Header, description = "The acting user")),
    responses(
        (status = 200, description = "Ok", body = BookingView),
        (status = 404, description = "Not Found", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn get_booking(
    BookingsId(id): BookingsId,
    sharer: Sharer,
    db: State<DbPool>,
) -> ApiResult<Json<BookingView>> {
    let mut repo = Repository::begin(&db).await?;
    let booking = booking_service::get_booking(&mut repo, sharer.id(), id).await?;
    Ok(Json(booking))
}

/// Lists the bookings you made.
#[utoipa::path(
    get,
    path = "/bookings",
    params(
        ("X-Sharer-User-Id" = i64, Header, description = "The acting user"),
        StateParams,
        PaginationParams,
    ),
    responses(
        (status = 200, description = "Ok", body = [BookingView]),
        (status = 400, description = "Unknown state", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn list_bookings(
    Bookings: Bookings,
    sharer: Sharer,
    db: State<DbPool>,
    Query(state): Query<StateParams>,
    Query(page): Query<PaginationParams>,
) -> ApiResult<Json<Vec<BookingView>>> {
    list(&db, BookingParty::Booker(sharer.id()), state, page).await
}

/// Lists the bookings of your items.
#[utoipa::path(
    get,
    path = "/bookings/owner",
    params(
        ("X-Sharer-User-Id" = i64, Header, description = "The acting user"),
        StateParams,
        PaginationParams,
    ),
    responses(
        (status = 200, description = "Ok", body = [BookingView]),
        (status = 400, description = "Unknown state", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn list_owner_bookings(
    BookingsOwner: BookingsOwner,
    sharer: Sharer,
    db: State<DbPool>,
    Query(state): Query<StateParams>,
    Query(page): Query<PaginationParams>,
) -> ApiResult<Json<Vec<BookingView>>> {
    list(&db, BookingParty::Owner(sharer.id()), state, page).await
}

async fn list(
    db: &DbPool,
    party: BookingParty,
    state: StateParams,
    page: PaginationParams,
) -> ApiResult<Json<Vec<BookingView>>> {
    let state = state.parse()?;
    let page = Valid::new(page)?.into_inner();
    let now = Utc::now().naive_utc();
    let mut repo = Repository::begin(db).await?;
    let bookings = booking_service::list_bookings(&mut repo, party, state, now, page).await?;
    Ok(Json(bookings))
}
