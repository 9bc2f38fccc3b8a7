//! The item API implementation.

use crate::{
    feature::item::{
        comment_repository::{CommentView, NewComment},
        item_repository::{Item, ItemPatch, NewItem},
        item_service::{self, ItemView},
    },
    infra::{
        database::{DbPool, Repository},
        error::{ApiResult, ClientError},
        extract::{Json, Query},
        pagination::PaginationParams,
        security::Sharer,
        state::AppState,
        validation::Valid,
    },
};
use axum::{extract::State, Router};
use axum_extra::routing::{RouterExt, TypedPath};
use chrono::Utc;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::IntoParams;

/// The item API endpoints.
pub fn routes() -> Router<AppState> {
    Router::new()
        .typed_post(create_item)
        .typed_get(list_items)
        .typed_get(search_items)
        .typed_get(get_item)
        .typed_patch(update_item)
        .typed_post(add_comment)
}

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/items", rejection(ClientError))]
pub(crate) struct Items;

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/items/search", rejection(ClientError))]
pub(crate) struct ItemsSearch;

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/items/:id", rejection(ClientError))]
pub(crate) struct ItemsId(pub i64);

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/items/:id/comment", rejection(ClientError))]
pub(crate) struct ItemsIdComment(pub i64);

/// The text to search for.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Matched against names and descriptions, ignoring case.
    #[serde(default)]
    pub text: String,
}

/// Creates a new item.
#[utoipa::path(
    post,
    path = "/items",
    request_body = NewItem,
    params(("X-Sharer-User-Id" = i64, Header, description = "The acting user")),
    responses(
        (status = 201, description = "Created", body = Item),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn create_item(
    Items: Items,
    sharer: Sharer,
    db: State<DbPool>,
    Json(new_item): Json<NewItem>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    let new_item = Valid::new(new_item)?.into_inner();
    let mut repo = Repository::begin(&db).await?;
    let item = item_service::create_item(&mut repo, sharer.id(), new_item).await?;
    repo.commit().await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Updates the given fields of one of your items.
#[utoipa::path(
    patch,
    path = "/items/{id}",
    request_body = ItemPatch,
    params(("X-Sharer-User-Id" = i64, Header, description = "The acting user")),
    responses(
        (status = 200, description = "Ok", body = Item),
        (status = 404, description = "Not Found", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn update_item(
    ItemsId(id): ItemsId,
    sharer: Sharer,
    db: State<DbPool>,
    Json(patch): Json<ItemPatch>,
) -> ApiResult<Json<Item>> {
    let mut repo = Repository::begin(&db).await?;
    let item = item_service::update_item(&mut repo, sharer.id(), id, patch).await?;
    repo.commit().await?;
    Ok(Json(item))
}

/// Gets an item with its comments.
#[utoipa::path(
    get,
    path = "/items/{id}",
    params(("X-Sharer-User-Id" = i64, Header, description = "The acting user")),
    responses(
        (status = 200, description = "Ok", body = ItemView),
        (status = 404, description = "Not Found", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn get_item(
    ItemsId(id): ItemsId,
    sharer: Sharer,
    db: State<DbPool>,
) -> ApiResult<Json<ItemView>> {
    let now = Utc::now().naive_utc();
    let mut repo = Repository::begin(&db).await?;
    let item = item_service::get_item(&mut repo, sharer.id(), id, now).await?;
    Ok(Json(item))
}

/// Lists your items.
#[utoipa::path(
    get,
    path = "/items",
    params(
        ("X-Sharer-User-Id" = i64, Header, description = "The acting user"),
        PaginationParams,
    ),
    responses(
        (status = 200, description = "Ok", body = [ItemView]),
        (status = 404, description = "Not Found", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn list_items(
    Items: Items,
    sharer: Sharer,
    db: State<DbPool>,
    Query(page): Query<PaginationParams>,
) -> ApiResult<Json<Vec<ItemView>>> {
    let page = Valid::new(page)?.into_inner();
    let now = Utc::now().naive_utc();
    let mut repo = Repository::begin(&db).await?;
    let items = item_service::list_owner_items(&mut repo, sharer.id(), page, now).await?;
    Ok(Json(items))
}

/// Searches available items by name and description.
#[utoipa::path(
    get,
    path = "/items/search",
    params(SearchParams, PaginationParams),
    responses(
        (status = 200, description = "Ok", body = [Item]),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn search_items(
    ItemsSearch: ItemsSearch,
    db: State<DbPool>,
    Query(search): Query<SearchParams>,
    Query(page): Query<PaginationParams>,
) -> ApiResult<Json<Vec<Item>>> {
    let page = Valid::new(page)?.into_inner();
    let mut repo = Repository::begin(&db).await?;
    let items = item_service::search_items(&mut repo, &search.text, page).await?;
    Ok(Json(items))
}

/// Comments on an item you have borrowed.
#[utoipa::path(
    post,
    path = "/items/{id}/comment",
    request_body = NewComment,
    params(("X-Sharer-User-Id" = i64, Header, description = "The acting user")),
    responses(
        (status = 200, description = "Ok", body = CommentView),
        (status = 400, description = "No completed rental", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn add_comment(
    ItemsIdComment(id): ItemsIdComment,
    sharer: Sharer,
    db: State<DbPool>,
    Json(new_comment): Json<NewComment>,
) -> ApiResult<Json<CommentView>> {
    let new_comment = Valid::new(new_comment)?.into_inner();
    let now = Utc::now().naive_utc();
    let mut repo = Repository::begin(&db).await?;
    let comment = item_service::add_comment(&mut repo, sharer.id(), id, new_comment, now).await?;
    repo.commit().await?;
    Ok(Json(comment))
}
