//! A service for interacting with items and their comments.

use super::{
    comment_repository::{Comment, CommentRepository, CommentView, NewComment},
    item_repository::{Item, ItemPatch, ItemRepository, NewItem},
};
use crate::{
    feature::{
        booking::booking_repository::{BookingRepository, BookingShort},
        request::request_repository::RequestRepository,
        user::user_repository::UserRepository,
    },
    infra::{
        error::{ApiResult, ClientError},
        pagination::PaginationParams,
    },
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

/// An item with its comments, and for its owner, the surrounding bookings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    /// The item's id.
    #[schema(example = 1)]
    pub id: i64,
    /// The item's name.
    pub name: String,
    /// The item's description.
    pub description: String,
    /// Whether the item can be booked.
    pub available: bool,
    /// The user who owns the item.
    pub owner_id: i64,
    /// The request this item answers, if any.
    pub request_id: Option<i64>,
    /// The latest booking that has ended. Only shown to the owner.
    pub last_booking: Option<BookingShort>,
    /// The earliest booking that has not started. Only shown to the owner.
    pub next_booking: Option<BookingShort>,
    /// Comments left by former borrowers.
    pub comments: Vec<CommentView>,
}

impl ItemView {
    fn new(item: Item, comments: Vec<CommentView>) -> Self {
        Self {
            id: item.id,
            name: item.name,
            description: item.description,
            available: item.available,
            owner_id: item.owner_id,
            request_id: item.request_id,
            last_booking: None,
            next_booking: None,
            comments,
        }
    }
}

async fn require_user<R: UserRepository>(repository: &mut R, id: i64) -> ApiResult<()> {
    repository
        .fetch_user(id)
        .await?
        .ok_or_else(|| ClientError::NotFound(format!("user {id} not found")))?;
    Ok(())
}

async fn require_item<R: ItemRepository>(repository: &mut R, id: i64) -> ApiResult<Item> {
    let item = repository
        .fetch_item(id)
        .await?
        .ok_or_else(|| ClientError::NotFound(format!("item {id} not found")))?;
    Ok(item)
}

/// Adds the owner-only bookings to `view`.
async fn with_bookings<R: BookingRepository>(
    repository: &mut R,
    mut view: ItemView,
    now: NaiveDateTime,
) -> ApiResult<ItemView> {
    view.last_booking = repository.last_booking(view.id, now).await?.map(Into::into);
    view.next_booking = repository.next_booking(view.id, now).await?.map(Into::into);
    Ok(view)
}

fn comments_of(item_id: i64, comments: &[Comment]) -> Vec<CommentView> {
    comments
        .iter()
        .filter(|c| c.item_id == item_id)
        .cloned()
        .map(CommentView::from)
        .collect()
}

/// Creates a new item, optionally in response to a request.
#[instrument(skip(repository))]
pub async fn create_item<R>(repository: &mut R, owner_id: i64, new_item: NewItem) -> ApiResult<Item>
where
    R: UserRepository + ItemRepository + RequestRepository,
{
    require_user(repository, owner_id).await?;
    if let Some(request_id) = new_item.request_id {
        repository
            .fetch_request(request_id)
            .await?
            .ok_or_else(|| ClientError::NotFound(format!("request {request_id} not found")))?;
    }
    repository.create_item(owner_id, new_item).await
}

/// Updates the fields of an item that are present in `patch`.
///
/// Only the owner may do this, everyone else is told the item does not exist.
#[instrument(skip(repository))]
pub async fn update_item<R: ItemRepository>(
    repository: &mut R,
    user_id: i64,
    item_id: i64,
    patch: ItemPatch,
) -> ApiResult<Item> {
    let item = require_item(repository, item_id).await?;
    if item.owner_id != user_id {
        tracing::warn!("User {} does not own item {}", user_id, item_id);
        return Err(ClientError::NotFound(format!("item {item_id} not found")))?;
    }
    repository.update_item(item_id, patch).await
}

/// Reads an item with its comments.
#[instrument(skip(repository))]
pub async fn get_item<R>(
    repository: &mut R,
    user_id: i64,
    item_id: i64,
    now: NaiveDateTime,
) -> ApiResult<ItemView>
where
    R: ItemRepository + CommentRepository + BookingRepository,
{
    let item = require_item(repository, item_id).await?;
    let comments = repository.list_comments(vec![item_id]).await?;
    let is_owner = item.owner_id == user_id;
    let view = ItemView::new(item, comments_of(item_id, &comments));
    if is_owner {
        with_bookings(repository, view, now).await
    } else {
        Ok(view)
    }
}

/// Lists the items of an owner with their bookings and comments.
#[instrument(skip(repository))]
pub async fn list_owner_items<R>(
    repository: &mut R,
    owner_id: i64,
    page: PaginationParams,
    now: NaiveDateTime,
) -> ApiResult<Vec<ItemView>>
where
    R: UserRepository + ItemRepository + CommentRepository + BookingRepository,
{
    require_user(repository, owner_id).await?;
    let items = repository.list_owner_items(owner_id, page).await?;
    let ids = items.iter().map(|i| i.id).collect();
    let comments = repository.list_comments(ids).await?;
    let mut views = Vec::with_capacity(items.len());
    for item in items {
        let comments = comments_of(item.id, &comments);
        views.push(with_bookings(repository, ItemView::new(item, comments), now).await?);
    }
    Ok(views)
}

/// Finds available items by name or description.
#[instrument(skip(repository))]
pub async fn search_items<R: ItemRepository>(
    repository: &mut R,
    text: &str,
    page: PaginationParams,
) -> ApiResult<Vec<Item>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    repository.search_items(text.to_string(), page).await
}

/// Comments on an item the author has borrowed before.
#[instrument(skip(repository))]
pub async fn add_comment<R>(
    repository: &mut R,
    author_id: i64,
    item_id: i64,
    new_comment: NewComment,
    now: NaiveDateTime,
) -> ApiResult<CommentView>
where
    R: UserRepository + ItemRepository + CommentRepository + BookingRepository,
{
    require_user(repository, author_id).await?;
    require_item(repository, item_id).await?;
    if !repository.has_finished_booking(author_id, item_id, now).await? {
        tracing::warn!("User {} never finished borrowing item {}", author_id, item_id);
        return Err(ClientError::BadRequest(
            "no completed rental found".to_string(),
        ))?;
    }
    let comment = repository
        .create_comment(item_id, author_id, new_comment.text, now)
        .await?;
    Ok(comment.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        feature::{
            booking::{booking_repository::Booking, booking_state::BookingStatus},
            mock::MockRepository,
            request::request_repository::ItemRequest,
            user::user_repository::User,
        },
        infra::error::ApiError,
    };
    use chrono::{Duration, NaiveDate};
    use mockall::predicate::eq;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 6, 1)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .unwrap()
    }

    fn drill() -> Item {
        Item {
            id: 10,
            name: "Drill".to_string(),
            description: "A cordless drill".to_string(),
            available: true,
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

    fn booking(id: i64, days: i64) -> Booking {
        Booking {
            id,
            start: now() + Duration::days(days),
            end: now() + Duration::days(days + 1),
            status: BookingStatus::Approved,
            item_id: 10,
            item_name: "Drill".to_string(),
            item_owner_id: 1,
            booker_id: 2,
            booker_name: "user 2".to_string(),
        }
    }

    fn comment() -> Comment {
        Comment {
            id: 3,
            text: "Great drill".to_string(),
            item_id: 10,
            author_id: 2,
            author_name: "user 2".to_string(),
            created: now(),
        }
    }

    fn is_not_found<T>(result: &ApiResult<T>) -> bool {
        matches!(result, Err(ApiError::ClientError(ClientError::NotFound(_))))
    }

    #[tokio::test]
    async fn owner_sees_last_and_next_booking() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_item().return_once(|_| Ok(Some(drill())));
        repo.expect_list_comments()
            .with(eq(vec![10]))
            .return_once(|_| Ok(vec![comment()]));
        repo.expect_last_booking()
            .with(eq(10), eq(now()))
            .return_once(|_, _| Ok(Some(booking(1, -3))));
        repo.expect_next_booking()
            .with(eq(10), eq(now()))
            .return_once(|_, _| Ok(Some(booking(2, 3))));
        let view = get_item(&mut repo, 1, 10, now()).await.unwrap();
        assert_eq!(Some(1), view.last_booking.map(|b| b.id));
        assert_eq!(Some(2), view.next_booking.map(|b| b.id));
        assert_eq!("user 2", view.comments[0].author_name);
    }

    #[tokio::test]
    async fn others_do_not_see_bookings() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_item().return_once(|_| Ok(Some(drill())));
        repo.expect_list_comments().return_once(|_| Ok(vec![comment()]));
        repo.expect_last_booking().never();
        repo.expect_next_booking().never();
        let view = get_item(&mut repo, 2, 10, now()).await.unwrap();
        assert_eq!(None, view.last_booking);
        assert_eq!(None, view.next_booking);
        assert_eq!(1, view.comments.len());
    }

    #[tokio::test]
    async fn only_owner_may_update() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_item().return_once(|_| Ok(Some(drill())));
        repo.expect_update_item().never();
        let result = update_item(&mut repo, 2, 10, ItemPatch::default()).await;
        assert!(is_not_found(&result));
    }

    #[tokio::test]
    async fn owner_patch_is_passed_through() {
        let mut repo = MockRepository::new();
        let patch = ItemPatch {
            available: Some(false),
            ..ItemPatch::default()
        };
        repo.expect_fetch_item().return_once(|_| Ok(Some(drill())));
        repo.expect_update_item()
            .with(eq(10), eq(patch.clone()))
            .return_once(|_, _| {
                Ok(Item {
                    available: false,
                    ..drill()
                })
            });
        let item = update_item(&mut repo, 1, 10, patch).await.unwrap();
        assert!(!item.available);
        assert_eq!("Drill", item.name);
    }

    #[tokio::test]
    async fn item_for_missing_request_is_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_user().returning(|id| Ok(Some(user(id))));
        repo.expect_fetch_request()
            .with(eq(4))
            .return_once(|_| Ok(None));
        repo.expect_create_item().never();
        let new_item = NewItem {
            name: "Ladder".to_string(),
            description: "Tall".to_string(),
            available: true,
            request_id: Some(4),
        };
        let result = create_item(&mut repo, 1, new_item).await;
        assert!(is_not_found(&result));
    }

    #[tokio::test]
    async fn item_answers_request() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_user().returning(|id| Ok(Some(user(id))));
        repo.expect_fetch_request().return_once(|id| {
            Ok(Some(ItemRequest {
                id,
                description: "Need a ladder".to_string(),
                requester_id: 2,
                created: now(),
            }))
        });
        repo.expect_create_item().return_once(|owner_id, new_item| {
            Ok(Item {
                id: 11,
                name: new_item.name,
                description: new_item.description,
                available: new_item.available,
                owner_id,
                request_id: new_item.request_id,
            })
        });
        let new_item = NewItem {
            name: "Ladder".to_string(),
            description: "Tall".to_string(),
            available: true,
            request_id: Some(4),
        };
        let item = create_item(&mut repo, 1, new_item).await.unwrap();
        assert_eq!(Some(4), item.request_id);
        assert_eq!(1, item.owner_id);
    }

    #[tokio::test]
    async fn blank_search_is_empty() {
        let mut repo = MockRepository::new();
        repo.expect_search_items().never();
        let items = search_items(&mut repo, "  ", PaginationParams::default())
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn comment_needs_finished_booking() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_user().returning(|id| Ok(Some(user(id))));
        repo.expect_fetch_item().return_once(|_| Ok(Some(drill())));
        repo.expect_has_finished_booking()
            .with(eq(2), eq(10), eq(now()))
            .return_once(|_, _, _| Ok(false));
        repo.expect_create_comment().never();
        let new_comment = NewComment {
            text: "Nice".to_string(),
        };
        let result = add_comment(&mut repo, 2, 10, new_comment, now()).await;
        match result {
            Err(ApiError::ClientError(ClientError::BadRequest(msg))) => {
                assert_eq!("no completed rental found", msg)
            }
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn comment_after_rental_is_stored() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_user().returning(|id| Ok(Some(user(id))));
        repo.expect_fetch_item().return_once(|_| Ok(Some(drill())));
        repo.expect_has_finished_booking()
            .return_once(|_, _, _| Ok(true));
        repo.expect_create_comment()
            .with(eq(10), eq(2), eq("Great drill".to_string()), eq(now()))
            .return_once(|_, _, _, _| Ok(comment()));
        let new_comment = NewComment {
            text: "Great drill".to_string(),
        };
        let view = add_comment(&mut repo, 2, 10, new_comment, now()).await.unwrap();
        assert_eq!("Great drill", view.text);
        assert_eq!("user 2", view.author_name);
    }

    #[tokio::test]
    async fn owner_list_attaches_comments_per_item() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_user().returning(|id| Ok(Some(user(id))));
        repo.expect_list_owner_items().return_once(|_, _| {
            Ok(vec![
                drill(),
                Item {
                    id: 12,
                    ..drill()
                },
            ])
        });
        repo.expect_list_comments()
            .with(eq(vec![10, 12]))
            .return_once(|_| Ok(vec![comment()]));
        repo.expect_last_booking().returning(|_, _| Ok(None));
        repo.expect_next_booking().returning(|_, _| Ok(None));
        let views = list_owner_items(&mut repo, 1, PaginationParams::default(), now())
            .await
            .unwrap();
        assert_eq!(2, views.len());
        assert_eq!(1, views[0].comments.len());
        assert!(views[1].comments.is_empty());
    }
}
