//! The user API implementation.

use super::{
    user_repository::{NewUser, User, UserPatch},
    user_service,
};
use crate::infra::{
    database::{DbPool, Repository},
    error::{ApiResult, ClientError},
    extract::Json,
    state::AppState,
    validation::Valid,
};
use axum::{extract::State, Router};
use axum_extra::routing::{RouterExt, TypedPath};
use http::StatusCode;
use serde::Deserialize;
use tracing::instrument;

/// The user API endpoints.
pub fn routes() -> Router<AppState> {
    Router::new()
        .typed_post(create_user)
        .typed_get(list_users)
        .typed_get(get_user)
        .typed_patch(update_user)
        .typed_delete(delete_user)
}

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/users", rejection(ClientError))]
pub(crate) struct Users;

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/users/:id", rejection(ClientError))]
pub(crate) struct UsersId(pub i64);

/// Creates a new user.
#[utoipa::path(
    post,
    path = "/users",
    request_body = NewUser,
    responses(
        (status = 201, description = "Created", body = User),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 409, description = "Email already in use", body = ErrorBody),
    )
)]
#[instrument(skip_all)]
pub(crate) async fn create_user(
    Users: Users,
    db: State<DbPool>,
    Json(new_user): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let new_user = Valid::new(new_user)?;
    let mut repo = Repository::begin(&db).await?;
    let user = user_service::create_user(&mut repo, new_user).await?;
    repo.commit().await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Lists all users.
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Ok", body = [User]),
    )
)]
#[instrument(skip_all)]
pub(crate) async fn list_users(Users: Users, db: State<DbPool>) -> ApiResult<Json<Vec<User>>> {
    let mut repo = Repository::begin(&db).await?;
    let users = user_service::list_users(&mut repo).await?;
    Ok(Json(users))
}

/// Gets a user.
#[utoipa::path(
    get,
    path = "/users/{id}",
    responses(
        (status = 200, description = "Ok", body = User),
        (status = 404, description = "Not Found", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn get_user(UsersId(id): UsersId, db: State<DbPool>) -> ApiResult<Json<User>> {
    let mut repo = Repository::begin(&db).await?;
    let user = user_service::read_user(&mut repo, id).await?;
    Ok(Json(user))
}

/// Updates the given fields of a user.
#[utoipa::path(
    patch,
    path = "/users/{id}",
    request_body = UserPatch,
    responses(
        (status = 200, description = "Ok", body = User),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 409, description = "Email already in use", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn update_user(
    UsersId(id): UsersId,
    db: State<DbPool>,
    Json(patch): Json<UserPatch>,
) -> ApiResult<Json<User>> {
    let patch = Valid::new(patch)?;
    let mut repo = Repository::begin(&db).await?;
    let user = user_service::update_user(&mut repo, id, patch).await?;
    repo.commit().await?;
    Ok(Json(user))
}

/// Deletes a user.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn delete_user(UsersId(id): UsersId, db: State<DbPool>) -> ApiResult<StatusCode> {
    let mut repo = Repository::begin(&db).await?;
    user_service::delete_user(&mut repo, id).await?;
    repo.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
