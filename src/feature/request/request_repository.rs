//! Types and functions for storing and loading item requests.

use crate::{
    feature::item::item_repository::Item,
    infra::{
        database::{Repository, Tx},
        error::ApiResult,
        pagination::PaginationParams,
        validation::not_blank,
    },
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{instrument, Instrument};
use utoipa::ToSchema;
use validator::Validate;

/// A new request for an item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
pub struct NewItemRequest {
    /// What the requester is looking for.
    #[schema(example = "Looking for a ladder")]
    #[validate(custom(function = "not_blank"), length(max = 200))]
    pub description: String,
}

/// A stored item request.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct ItemRequest {
    pub id: i64,
    pub description: String,
    pub requester_id: i64,
    pub created: NaiveDateTime,
}

/// An item request together with the items offered in response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequestView {
    /// The request's id.
    #[schema(example = 1)]
    pub id: i64,
    /// What the requester is looking for.
    pub description: String,
    /// The user who made the request.
    pub requester_id: i64,
    /// When the request was made.
    #[schema(value_type = String, example = "2030-01-01T12:00:00")]
    pub created: NaiveDateTime,
    /// Items created in response to this request.
    pub items: Vec<Item>,
}

impl ItemRequestView {
    /// Attaches the items answering `request`, picked from `items`.
    pub fn new(request: ItemRequest, items: &[Item]) -> Self {
        let items = items
            .iter()
            .filter(|i| i.request_id == Some(request.id))
            .cloned()
            .collect();
        Self {
            id: request.id,
            description: request.description,
            requester_id: request.requester_id,
            created: request.created,
            items,
        }
    }
}

/// Anything that can store item requests.
#[async_trait::async_trait]
pub trait RequestRepository: Send {
    /// Stores a request made by `requester_id` at `created`.
    async fn create_request(
        &mut self,
        requester_id: i64,
        description: String,
        created: NaiveDateTime,
    ) -> ApiResult<ItemRequest>;
    /// Fetches a request.
    async fn fetch_request(&mut self, id: i64) -> ApiResult<Option<ItemRequest>>;
    /// Lists the requests made by a user, newest first.
    async fn list_own_requests(&mut self, requester_id: i64) -> ApiResult<Vec<ItemRequest>>;
    /// Lists the requests made by everyone except a user, newest first.
    async fn list_other_requests(
        &mut self,
        requester_id: i64,
        page: PaginationParams,
    ) -> ApiResult<Vec<ItemRequest>>;
}

#[async_trait::async_trait]
impl RequestRepository for Repository<Tx> {
    #[instrument(skip(self))]
    async fn create_request(
        &mut self,
        requester_id: i64,
        description: String,
        created: NaiveDateTime,
    ) -> ApiResult<ItemRequest> {
        let request = sqlx::query_as::<_, ItemRequest>(
            r#"
                INSERT INTO requests (description, requester_id, created)
                VALUES ($1, $2, $3)
                RETURNING id, description, requester_id, created
            "#,
        )
        .bind(description)
        .bind(requester_id)
        .bind(created)
        .fetch_one(&mut *self.executor)
        .await?;
        tracing::info!("Created request {:?}", request);
        Ok(request)
    }

    #[instrument(skip(self))]
    async fn fetch_request(&mut self, id: i64) -> ApiResult<Option<ItemRequest>> {
        let request = sqlx::query_as::<_, ItemRequest>(
            "SELECT id, description, requester_id, created FROM requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.executor)
        .instrument(tracing::info_span!("fetch_optional"))
        .await?;
        Ok(request)
    }

    #[instrument(skip(self))]
    async fn list_own_requests(&mut self, requester_id: i64) -> ApiResult<Vec<ItemRequest>> {
        let requests = sqlx::query_as::<_, ItemRequest>(
            r#"
                SELECT id, description, requester_id, created FROM requests
                WHERE requester_id = $1
                ORDER BY created DESC, id DESC
            "#,
        )
        .bind(requester_id)
        .fetch_all(&mut *self.executor)
        .await?;
        Ok(requests)
    }

    #[instrument(skip(self))]
    async fn list_other_requests(
        &mut self,
        requester_id: i64,
        page: PaginationParams,
    ) -> ApiResult<Vec<ItemRequest>> {
        let requests = sqlx::query_as::<_, ItemRequest>(
            r#"
                SELECT id, description, requester_id, created FROM requests
                WHERE requester_id <> $1
                ORDER BY created DESC, id DESC
                LIMIT $2 OFFSET $3
            "#,
        )
        .bind(requester_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *self.executor)
        .instrument(tracing::info_span!("fetch_all"))
        .await?;
        tracing::info!("Listed {} requests", requests.len());
        Ok(requests)
    }
}
