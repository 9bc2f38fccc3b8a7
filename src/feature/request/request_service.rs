//! A service for publishing and browsing item requests.

use super::request_repository::{ItemRequest, ItemRequestView, NewItemRequest, RequestRepository};
use crate::{
    feature::{item::item_repository::ItemRepository, user::user_repository::UserRepository},
    infra::{
        error::{ApiResult, ClientError},
        pagination::PaginationParams,
    },
};
use chrono::NaiveDateTime;
use tracing::instrument;

async fn require_user<R: UserRepository>(repository: &mut R, id: i64) -> ApiResult<()> {
    repository
        .fetch_user(id)
        .await?
        .ok_or_else(|| ClientError::NotFound(format!("user {id} not found")))?;
    Ok(())
}

/// Looks up the items answering `requests` and attaches them.
async fn with_items<R: ItemRepository>(
    repository: &mut R,
    requests: Vec<ItemRequest>,
) -> ApiResult<Vec<ItemRequestView>> {
    if requests.is_empty() {
        return Ok(Vec::new());
    }
    let ids = requests.iter().map(|r| r.id).collect();
    let items = repository.list_request_items(ids).await?;
    Ok(requests
        .into_iter()
        .map(|r| ItemRequestView::new(r, &items))
        .collect())
}

/// Publishes a request.
#[instrument(skip(repository))]
pub async fn create_request<R>(
    repository: &mut R,
    requester_id: i64,
    new_request: NewItemRequest,
    now: NaiveDateTime,
) -> ApiResult<ItemRequestView>
where
    R: UserRepository + RequestRepository,
{
    require_user(repository, requester_id).await?;
    let request = repository
        .create_request(requester_id, new_request.description, now)
        .await?;
    Ok(ItemRequestView::new(request, &[]))
}

/// Lists the requests a user made, newest first.
#[instrument(skip(repository))]
pub async fn list_own_requests<R>(
    repository: &mut R,
    requester_id: i64,
) -> ApiResult<Vec<ItemRequestView>>
where
    R: UserRepository + ItemRepository + RequestRepository,
{
    require_user(repository, requester_id).await?;
    let requests = repository.list_own_requests(requester_id).await?;
    with_items(repository, requests).await
}

/// Lists the requests other users made, newest first.
#[instrument(skip(repository))]
pub async fn list_other_requests<R>(
    repository: &mut R,
    user_id: i64,
    page: PaginationParams,
) -> ApiResult<Vec<ItemRequestView>>
where
    R: UserRepository + ItemRepository + RequestRepository,
{
    require_user(repository, user_id).await?;
    let requests = repository.list_other_requests(user_id, page).await?;
    with_items(repository, requests).await
}

/// Reads a request with the items answering it.
#[instrument(skip(repository))]
pub async fn get_request<R>(
    repository: &mut R,
    user_id: i64,
    request_id: i64,
) -> ApiResult<ItemRequestView>
where
    R: UserRepository + ItemRepository + RequestRepository,
{
    require_user(repository, user_id).await?;
    let request = repository
        .fetch_request(request_id)
        .await?
        .ok_or_else(|| ClientError::NotFound(format!("request {request_id} not found")))?;
    let items = repository.list_request_items(vec![request.id]).await?;
    Ok(ItemRequestView::new(request, &items))
}
