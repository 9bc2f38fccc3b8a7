//! A mock implementing every repository trait, for service tests.

use super::{
    booking::{
        booking_repository::{Booking, BookingParty, BookingRecord, BookingRepository},
        booking_state::{BookingState, BookingStatus},
    },
    item::{
        comment_repository::{Comment, CommentRepository},
        item_repository::{Item, ItemPatch, ItemRepository, NewItem},
    },
    request::request_repository::{ItemRequest, RequestRepository},
    user::user_repository::{NewUser, User, UserPatch, UserRepository},
};
use crate::infra::{error::ApiResult, pagination::PaginationParams};
use chrono::NaiveDateTime;

mockall::mock! {
    pub Repository {}

    #[async_trait::async_trait]
    impl UserRepository for Repository {
        async fn create_user(&mut self, new_user: NewUser) -> ApiResult<User>;
        async fn fetch_user(&mut self, id: i64) -> ApiResult<Option<User>>;
        async fn list_users(&mut self) -> ApiResult<Vec<User>>;
        async fn update_user(&mut self, id: i64, patch: UserPatch) -> ApiResult<Option<User>>;
        async fn delete_user(&mut self, id: i64) -> ApiResult<bool>;
    }

    #[async_trait::async_trait]
    impl ItemRepository for Repository {
        async fn create_item(&mut self, owner_id: i64, new_item: NewItem) -> ApiResult<Item>;
        async fn fetch_item(&mut self, id: i64) -> ApiResult<Option<Item>>;
        async fn update_item(&mut self, id: i64, patch: ItemPatch) -> ApiResult<Item>;
        async fn list_owner_items(
            &mut self,
            owner_id: i64,
            page: PaginationParams,
        ) -> ApiResult<Vec<Item>>;
        async fn search_items(
            &mut self,
            text: String,
            page: PaginationParams,
        ) -> ApiResult<Vec<Item>>;
        async fn list_request_items(&mut self, request_ids: Vec<i64>) -> ApiResult<Vec<Item>>;
    }

    #[async_trait::async_trait]
    impl CommentRepository for Repository {
        async fn create_comment(
            &mut self,
            item_id: i64,
            author_id: i64,
            text: String,
            created: NaiveDateTime,
        ) -> ApiResult<Comment>;
        async fn list_comments(&mut self, item_ids: Vec<i64>) -> ApiResult<Vec<Comment>>;
    }

    #[async_trait::async_trait]
    impl BookingRepository for Repository {
        async fn create_booking(&mut self, booking: BookingRecord) -> ApiResult<Booking>;
        async fn fetch_booking(&mut self, id: i64) -> ApiResult<Option<Booking>>;
        async fn transition_booking(
            &mut self,
            id: i64,
            from: BookingStatus,
            to: BookingStatus,
        ) -> ApiResult<Option<Booking>>;
        async fn list_bookings(
            &mut self,
            party: BookingParty,
            state: BookingState,
            now: NaiveDateTime,
            page: PaginationParams,
        ) -> ApiResult<Vec<Booking>>;
        async fn last_booking(
            &mut self,
            item_id: i64,
            now: NaiveDateTime,
        ) -> ApiResult<Option<Booking>>;
        async fn next_booking(
            &mut self,
            item_id: i64,
            now: NaiveDateTime,
        ) -> ApiResult<Option<Booking>>;
        async fn has_finished_booking(
            &mut self,
            booker_id: i64,
            item_id: i64,
            now: NaiveDateTime,
        ) -> ApiResult<bool>;
    }

    #[async_trait::async_trait]
    impl RequestRepository for Repository {
        async fn create_request(
            &mut self,
            requester_id: i64,
            description: String,
            created: NaiveDateTime,
        ) -> ApiResult<ItemRequest>;
        async fn fetch_request(&mut self, id: i64) -> ApiResult<Option<ItemRequest>>;
        async fn list_own_requests(&mut self, requester_id: i64) -> ApiResult<Vec<ItemRequest>>;
        async fn list_other_requests(
            &mut self,
            requester_id: i64,
            page: PaginationParams,
        ) -> ApiResult<Vec<ItemRequest>>;
    }
}
