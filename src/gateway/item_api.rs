//! Gateway endpoints for items and comments.

use super::client::{ServerClient, ServerResponse};
use crate::{
    feature::item::{
        comment_repository::NewComment,
        item_api::{Items, ItemsId, ItemsIdComment, ItemsSearch, SearchParams},
        item_repository::{ItemPatch, NewItem},
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

/// The item endpoints of the gateway.
pub fn routes() -> Router<GatewayState> {
    Router::new()
        .typed_post(create_item)
        .typed_get(list_items)
        .typed_get(search_items)
        .typed_get(get_item)
        .typed_patch(update_item)
        .typed_post(add_comment)
}

#[instrument(skip(client))]
async fn create_item(
    items: Items,
    sharer: Sharer,
    State(client): State<ServerClient>,
    Json(new_item): Json<NewItem>,
) -> ApiResult<ServerResponse> {
    let new_item = Valid::new(new_item)?;
    client
        .request(Method::POST, items)
        .sharer(sharer)
        .json(new_item.inner())
        .send()
        .await
}

#[instrument(skip(client))]
async fn list_items(
    items: Items,
    sharer: Sharer,
    State(client): State<ServerClient>,
    Query(page): Query<PaginationParams>,
) -> ApiResult<ServerResponse> {
    let page = Valid::new(page)?;
    client
        .request(Method::GET, items)
        .sharer(sharer)
        .query(page.inner())
        .send()
        .await
}

#[instrument(skip(client))]
async fn search_items(
    path: ItemsSearch,
    State(client): State<ServerClient>,
    Query(search): Query<SearchParams>,
    Query(page): Query<PaginationParams>,
) -> ApiResult<ServerResponse> {
    let page = Valid::new(page)?;
    client
        .request(Method::GET, path)
        .query(&search)
        .query(page.inner())
        .send()
        .await
}

#[instrument(skip(client))]
async fn get_item(
    path: ItemsId,
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
async fn update_item(
    path: ItemsId,
    sharer: Sharer,
    State(client): State<ServerClient>,
    Json(patch): Json<ItemPatch>,
) -> ApiResult<ServerResponse> {
    client
        .request(Method::PATCH, path)
        .sharer(sharer)
        .json(&patch)
        .send()
        .await
}

#[instrument(skip(client))]
async fn add_comment(
    path: ItemsIdComment,
    sharer: Sharer,
    State(client): State<ServerClient>,
    Json(new_comment): Json<NewComment>,
) -> ApiResult<ServerResponse> {
    let new_comment = Valid::new(new_comment)?;
    client
        .request(Method::POST, path)
        .sharer(sharer)
        .json(new_comment.inner())
        .send()
        .await
}
