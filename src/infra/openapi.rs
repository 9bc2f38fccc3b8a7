//! OpenAPI configuration.

use crate::feature::{
    booking::{booking_api, booking_repository, booking_state},
    info::info_api,
    item::{comment_repository, item_api, item_repository, item_service},
    request::{request_api, request_repository},
    user::{user_api, user_repository},
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

/// OpenApi configuration.
#[derive(OpenApi)]
#[openapi(
    paths(
        info_api::info,
        user_api::create_user,
        user_api::list_users,
        user_api::get_user,
        user_api::update_user,
        user_api::delete_user,
        item_api::create_item,
        item_api::list_items,
        item_api::search_items,
        item_api::get_item,
        item_api::update_item,
        item_api::add_comment,
        booking_api::create_booking,
        booking_api::change_status,
        booking_api::get_booking,
        booking_api::list_bookings,
        booking_api::list_owner_bookings,
        request_api::create_request,
        request_api::list_own_requests,
        request_api::list_other_requests,
        request_api::get_request,
    ),
    components(
        schemas(
            info_api::AppInfo,
            user_repository::NewUser,
            user_repository::UserPatch,
            user_repository::User,
            item_repository::NewItem,
            item_repository::ItemPatch,
            item_repository::Item,
            item_service::ItemView,
            comment_repository::NewComment,
            comment_repository::CommentView,
            booking_repository::NewBooking,
            booking_repository::BookingView,
            booking_repository::BookingShort,
            booking_repository::BookedItem,
            booking_repository::Booker,
            booking_state::BookingStatus,
            request_repository::NewItemRequest,
            request_repository::ItemRequestView,
            crate::infra::error::ErrorBody
        )
    ),
    modifiers(&SharerAddon)
)]
#[derive(Clone, Copy, Debug)]
pub struct ApiDoc;

/// Describes the header carrying the acting user.
struct SharerAddon;

impl Modify for SharerAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "sharer",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Sharer-User-Id"))),
            )
        }
    }
}
