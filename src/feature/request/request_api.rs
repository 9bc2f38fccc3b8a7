//! The item request API implementation.

use super::{
    request_repository::{ItemRequestView, NewItemRequest},
    request_service,
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
use serde::Deserialize;
use tracing::instrument;

/// The item request API endpoints.
pub fn routes() -> Router<AppState> {
    Router::new()
        .typed_post(create_request)
        .typed_get(list_own_requests)
        .typed_get(list_other_requests)
        .typed_get(get_request)
}

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/requests", rejection(ClientError))]
pub(crate) struct Requests;

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/requests/all", rejection(ClientError))]
pub(crate) struct RequestsAll;

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/requests/:id", rejection(ClientError))]
pub(crate) struct RequestsId(pub i64);

/// Asks other users for an item.
#[utoipa::path(
    post,
    path = "/requests",
    request_body = NewItemRequest,
    params(("X-Sharer-User-Id" = i64, Header, description = "The acting user")),
    responses(
        (status = 201, description = "Created", body = ItemRequestView),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn create_request(
    Requests: Requests,
    sharer: Sharer,
    db: State<DbPool>,
    Json(new_request): Json<NewItemRequest>,
) -> ApiResult<(StatusCode, Json<ItemRequestView>)> {
    let new_request = Valid::new(new_request)?.into_inner();
    let now = Utc::now().naive_utc();
    let mut repo = Repository::begin(&db).await?;
    let request = request_service::create_request(&mut repo, sharer.id(), new_request, now).await?;
    repo.commit().await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Lists your requests, newest first.
#[utoipa::path(
    get,
    path = "/requests",
    params(("X-Sharer-User-Id" = i64, Header, description = "The acting user")),
    responses(
        (status = 200, description = "Ok", body = [ItemRequestView]),
        (status = 404, description = "Not Found", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn list_own_requests(
    Requests: Requests,
    sharer: Sharer,
    db: State<DbPool>,
) -> ApiResult<Json<Vec<ItemRequestView>>> {
    let mut repo = Repository::begin(&db).await?;
    let requests = request_service::list_own_requests(&mut repo, sharer.id()).await?;
    Ok(Json(requests))
}

/// Lists the requests of other users, newest first.
#[utoipa::path(
    get,
    path = "/requests/all",
    params(
        ("X-Sharer-User-Id" = i64, Header, description = "The acting user"),
        PaginationParams,
    ),
    responses(
        (status = 200, description = "Ok", body = [ItemRequestView]),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn list_other_requests(
    RequestsAll: RequestsAll,
    sharer: Sharer,
    db: State<DbPool>,
    Query(page): Query<PaginationParams>,
) -> ApiResult<Json<Vec<ItemRequestView>>> {
    let page = Valid::new(page)?.into_inner();
    let mut repo = Repository::begin(&db).await?;
    let requests = request_service::list_other_requests(&mut repo, sharer.id(), page).await?;
    Ok(Json(requests))
}

/// Gets a request with the items offered for it.
#[utoipa::path(
    get,
    path = "/requests/{id}",
    params(("X-Sharer-User-Id" = i64, Header, description = "The acting user")),
    responses(
        (status = 200, description = "Ok", body = ItemRequestView),
        (status = 404, description = "Not Found", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn get_request(
    RequestsId(id): RequestsId,
    sharer: Sharer,
    db: State<DbPool>,
) -> ApiResult<Json<ItemRequestView>> {
    let mut repo = Repository::begin(&db).await?;
    let request = request_service::get_request(&mut repo, sharer.id(), id).await?;
    Ok(Json(request))
}
