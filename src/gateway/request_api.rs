//! Gateway endpoints for item requests.

use super::client::{ServerClient, ServerResponse};
use crate::{
    feature::request::{
        request_api::{Requests, RequestsAll, RequestsId},
        request_repository::NewItemRequest,
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

/// The item request endpoints of the gateway.
pub fn routes() -> Router<GatewayState> {
    Router::new()
        .typed_post(create_request)
        .typed_get(list_own_requests)
        .typed_get(list_other_requests)
        .typed_get(get_request)
}

#[instrument(skip(client))]
async fn create_request(
    requests: Requests,
    sharer: Sharer,
    State(client): State<ServerClient>,
    Json(new_request): Json<NewItemRequest>,
) -> ApiResult<ServerResponse> {
    let new_request = Valid::new(new_request)?;
    client
        .request(Method::POST, requests)
        .sharer(sharer)
        .json(new_request.inner())
        .send()
        .await
}

#[instrument(skip(client))]
async fn list_own_requests(
    requests: Requests,
    sharer: Sharer,
    State(client): State<ServerClient>,
) -> ApiResult<ServerResponse> {
    client
        .request(Method::GET, requests)
        .sharer(sharer)
        .send()
        .await
}

#[instrument(skip(client))]
async fn list_other_requests(
    path: RequestsAll,
    sharer: Sharer,
    State(client): State<ServerClient>,
    Query(page): Query<PaginationParams>,
) -> ApiResult<ServerResponse> {
    let page = Valid::new(page)?;
    client
        .request(Method::GET, path)
        .sharer(sharer)
        .query(page.inner())
        .send()
        .await
}

#[instrument(skip(client))]
async fn get_request(
    path: RequestsId,
    sharer: Sharer,
    State(client): State<ServerClient>,
) -> ApiResult<ServerResponse> {
    client
        .request(Method::GET, path)
        .sharer(sharer)
        .send()
        .await
}
