//! Gateway endpoints for users.

use super::client::{ServerClient, ServerResponse};
use crate::{
    feature::user::{
        user_api::{Users, UsersId},
        user_repository::{NewUser, UserPatch},
    },
    infra::{error::ApiResult, extract::Json, state::GatewayState, validation::Valid},
};
use axum::{extract::State, Router};
use axum_extra::routing::RouterExt;
use http::Method;
use tracing::instrument;

/// The user endpoints of the gateway.
pub fn routes() -> Router<GatewayState> {
    Router::new()
        .typed_post(create_user)
        .typed_get(list_users)
        .typed_get(get_user)
        .typed_patch(update_user)
        .typed_delete(delete_user)
}

#[instrument(skip(client))]
async fn create_user(
    users: Users,
    State(client): State<ServerClient>,
    Json(new_user): Json<NewUser>,
) -> ApiResult<ServerResponse> {
    let new_user = Valid::new(new_user)?;
    client
        .request(Method::POST, users)
        .json(new_user.inner())
        .send()
        .await
}

#[instrument(skip(client))]
async fn list_users(users: Users, State(client): State<ServerClient>) -> ApiResult<ServerResponse> {
    client.request(Method::GET, users).send().await
}

#[instrument(skip(client))]
async fn get_user(path: UsersId, State(client): State<ServerClient>) -> ApiResult<ServerResponse> {
    client.request(Method::GET, path).send().await
}

#[instrument(skip(client))]
async fn update_user(
    path: UsersId,
    State(client): State<ServerClient>,
    Json(patch): Json<UserPatch>,
) -> ApiResult<ServerResponse> {
    let patch = Valid::new(patch)?;
    client
        .request(Method::PATCH, path)
        .json(patch.inner())
        .send()
        .await
}

#[instrument(skip(client))]
async fn delete_user(path: UsersId, State(client): State<ServerClient>) -> ApiResult<ServerResponse> {
    client.request(Method::DELETE, path).send().await
}
