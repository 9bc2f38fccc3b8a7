//! Gateway endpoints for bookings.

use super::client::{ServerClient, ServerResponse};
use crate::{
    feature::booking::{
        booking_api::{ApprovalParams, Bookings, BookingsId, BookingsOwner},
        booking_repository::NewBooking,
        booking_state::StateParams,
    },
    infra::{
        error::ApiResult,
        extract::{Json, Query},
        pagination::PaginationParams,
        security::Sharer,
        state::GatewayState,
        validation::Valid,
    },
};
use axum::{extract::State, Router};
use axum_extra::routing::RouterExt;
use http::Method;
use tracing::instrument;

/// The booking endpoints of the gateway.
pub fn routes() -> Router<GatewayState> {
    Router::new()
        .typed_post(create_booking)
        .typed_get(list_bookings)
        .typed_get(list_owner_bookings)
        .typed_get(get_booking)
        .typed_patch(change_status)
}

#[instrument(skip(client))]
async fn create_booking(
    bookings: Bookings,
    sharer: Sharer,
    State(client): State<ServerClient>,
    Json(new_booking): Json<NewBooking>,
) -> ApiResult<ServerResponse> {
    let new_booking = Valid::new(new_booking)?;
    client
        .request(Method::POST, bookings)
        .sharer(sharer)
        .json(new_booking.inner())
        .send()
        .await
}

#[instrument(skip(client))]
async fn change_status(
    path: BookingsId,
    sharer: Sharer,
    State(client): State<ServerClient>,
    Query(approval): Query<ApprovalParams>,
) -> ApiResult<ServerResponse> {
    client
        .request(Method::PATCH, path)
        .sharer(sharer)
        .query(&approval)
        .send()
        .await
}

#[instrument(skip(client))]
async fn get_booking(
    path: BookingsId,
    sharer: Sharer,
    State(client): State<ServerClient>,
) -> ApiResult<ServerResponse> {
    client
        .request(Method::GET, path)
        .sharer(sharer)
        .send()
        .await
}

#[instrument(skip(client))]
async fn list_bookings(
    bookings: Bookings,
    sharer: Sharer,
    State(client): State<ServerClient>,
    Query(state): Query<StateParams>,
    Query(page): Query<PaginationParams>,
) -> ApiResult<ServerResponse> {
    list(&client, bookings.to_string(), sharer, state, page).await
}

#[instrument(skip(client))]
async fn list_owner_bookings(
    path: BookingsOwner,
    sharer: Sharer,
    State(client): State<ServerClient>,
    Query(state): Query<StateParams>,
    Query(page): Query<PaginationParams>,
) -> ApiResult<ServerResponse> {
    list(&client, path.to_string(), sharer, state, page).await
}

/// Rejects unknown states and bad pages before the server sees them.
async fn list(
    client: &ServerClient,
    path: String,
    sharer: Sharer,
    state: StateParams,
    page: PaginationParams,
) -> ApiResult<ServerResponse> {
    state.parse()?;
    let page = Valid::new(page)?;
    client
        .request(Method::GET, path)
        .sharer(sharer)
        .query(&state)
        .query(page.inner())
        .send()
        .await
}
