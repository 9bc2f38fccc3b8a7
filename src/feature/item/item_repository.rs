//! Types and functions for storing and loading items from the database.

use crate::infra::{
    database::{Repository, Tx},
    error::ApiResult,
    pagination::PaginationParams,
    validation::{blank_as_none, not_blank},
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, Instrument};
use utoipa::ToSchema;
use validator::Validate;

/// A new item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    /// The item's name.
    #[schema(example = "Drill")]
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    /// The item's description.
    #[schema(example = "A cordless drill")]
    #[validate(custom(function = "not_blank"))]
    pub description: String,
    /// Whether the item can be booked.
    pub available: bool,
    /// The request this item answers, if any.
    #[serde(default)]
    pub request_id: Option<i64>,
}

/// Changes to an item. Absent or blank fields are left as they are.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
pub struct ItemPatch {
    /// A new name.
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// A new description.
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// A new availability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

/// An existing item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// The item's id.
    #[schema(example = 1)]
    pub id: i64,
    /// The item's name.
    #[schema(example = "Drill")]
    pub name: String,
    /// The item's description.
    #[schema(example = "A cordless drill")]
    pub description: String,
    /// Whether the item can be booked.
    pub available: bool,
    /// The user who owns the item.
    pub owner_id: i64,
    /// The request this item answers, if any.
    pub request_id: Option<i64>,
}

/// Anything that can store items.
#[async_trait::async_trait]
pub trait ItemRepository: Send {
    /// Creates a new item owned by `owner_id`.
    async fn create_item(&mut self, owner_id: i64, new_item: NewItem) -> ApiResult<Item>;
    /// Fetches an item.
    async fn fetch_item(&mut self, id: i64) -> ApiResult<Option<Item>>;
    /// Applies a patch to an item.
    async fn update_item(&mut self, id: i64, patch: ItemPatch) -> ApiResult<Item>;
    /// Lists the items of an owner ordered by id.
    async fn list_owner_items(
        &mut self,
        owner_id: i64,
        page: PaginationParams,
    ) -> ApiResult<Vec<Item>>;
    /// Finds available items whose name or description contains `text`, ignoring case.
    async fn search_items(&mut self, text: String, page: PaginationParams)
        -> ApiResult<Vec<Item>>;
    /// Lists the items created in response to any of the given requests.
    async fn list_request_items(&mut self, request_ids: Vec<i64>) -> ApiResult<Vec<Item>>;
}

#[async_trait::async_trait]
impl ItemRepository for Repository<Tx> {
    #[instrument(skip(self))]
    async fn create_item(&mut self, owner_id: i64, new_item: NewItem) -> ApiResult<Item> {
        tracing::info!("Creating item {:?}", new_item);
        let item = sqlx::query_as::<_, Item>(
            r#"
                INSERT INTO items (name, description, available, owner_id, request_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, name, description, available, owner_id, request_id
            "#,
        )
        .bind(new_item.name)
        .bind(new_item.description)
        .bind(new_item.available)
        .bind(owner_id)
        .bind(new_item.request_id)
        .fetch_one(&mut *self.executor)
        .await?;
        tracing::info!("Created item {:?}", item);
        Ok(item)
    }

    #[instrument(skip(self))]
    async fn fetch_item(&mut self, id: i64) -> ApiResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
                SELECT id, name, description, available, owner_id, request_id FROM items
                WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.executor)
        .instrument(tracing::info_span!("fetch_optional"))
        .await?;
        tracing::debug!("Found item: {:?}", item);
        Ok(item)
    }

    #[instrument(skip(self))]
    async fn update_item(&mut self, id: i64, patch: ItemPatch) -> ApiResult<Item> {
        let item = sqlx::query_as::<_, Item>(
            r#"
                UPDATE items
                SET name = COALESCE($2, name),
                    description = COALESCE($3, description),
                    available = COALESCE($4, available)
                WHERE id = $1
                RETURNING id, name, description, available, owner_id, request_id
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.available)
        .fetch_one(&mut *self.executor)
        .await?;
        tracing::info!("Updated item {:?}", item);
        Ok(item)
    }

    #[instrument(skip(self))]
    async fn list_owner_items(
        &mut self,
        owner_id: i64,
        page: PaginationParams,
    ) -> ApiResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
                SELECT id, name, description, available, owner_id, request_id FROM items
                WHERE owner_id = $1
                ORDER BY id
                LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *self.executor)
        .instrument(tracing::info_span!("fetch_all"))
        .await?;
        tracing::info!("Listed {} items", items.len());
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn search_items(
        &mut self,
        text: String,
        page: PaginationParams,
    ) -> ApiResult<Vec<Item>> {
        let pattern = format!("%{}%", escape_like(&text.to_lowercase()));
        let items = sqlx::query_as::<_, Item>(
            r#"
                SELECT id, name, description, available, owner_id, request_id FROM items
                WHERE available
                  AND (LOWER(name) LIKE $1 ESCAPE '\' OR LOWER(description) LIKE $1 ESCAPE '\')
                ORDER BY id
                LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *self.executor)
        .instrument(tracing::info_span!("fetch_all"))
        .await?;
        tracing::info!("Found {} items matching {:?}", items.len(), text);
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn list_request_items(&mut self, request_ids: Vec<i64>) -> ApiResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
                SELECT id, name, description, available, owner_id, request_id FROM items
                WHERE request_id = ANY($1)
                ORDER BY id
            "#,
        )
        .bind(request_ids)
        .fetch_all(&mut *self.executor)
        .await?;
        Ok(items)
    }
}

/// Escapes the wildcards of a `LIKE` pattern.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
