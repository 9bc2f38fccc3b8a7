//! Types and functions for storing and loading users from the database.

use crate::infra::{
    database::{Repository, Tx},
    error::{ApiError, ApiResult, ClientError},
    validation::{blank_as_none, not_blank},
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, Instrument};
use utoipa::ToSchema;
use validator::Validate;

/// A new user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
pub struct NewUser {
    /// The user's name.
    #[schema(example = "Alice")]
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    /// The user's email, unique among users.
    #[schema(example = "alice@example.com")]
    #[validate(email)]
    pub email: String,
}

/// Changes to a user. Absent or blank fields are left as they are.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
pub struct UserPatch {
    /// A new name.
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// A new email.
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<String>,
}

/// An existing user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct User {
    /// The user's id.
    #[schema(example = 1)]
    pub id: i64,
    /// The user's name.
    #[schema(example = "Alice")]
    pub name: String,
    /// The user's email.
    #[schema(example = "alice@example.com")]
    pub email: String,
}

/// Anything that can store users.
#[async_trait::async_trait]
pub trait UserRepository: Send {
    /// Creates a new user.
    async fn create_user(&mut self, new_user: NewUser) -> ApiResult<User>;
    /// Fetches a user.
    async fn fetch_user(&mut self, id: i64) -> ApiResult<Option<User>>;
    /// Lists all users.
    async fn list_users(&mut self) -> ApiResult<Vec<User>>;
    /// Applies a patch to a user, returning `None` if there is no such user.
    async fn update_user(&mut self, id: i64, patch: UserPatch) -> ApiResult<Option<User>>;
    /// Deletes a user, returning whether it existed.
    async fn delete_user(&mut self, id: i64) -> ApiResult<bool>;
}

/// Reports unique violations on the email column as a conflict.
fn email_taken(email: String) -> impl FnOnce(sqlx::Error) -> ApiError {
    move |e| {
        let unique = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if unique {
            ClientError::Conflict(format!("user with email {email} already exists")).into()
        } else {
            e.into()
        }
    }
}

#[async_trait::async_trait]
impl UserRepository for Repository<Tx> {
    #[instrument(skip(self))]
    async fn create_user(&mut self, new_user: NewUser) -> ApiResult<User> {
        tracing::info!("Creating user {:?}", new_user);
        let user = sqlx::query_as::<_, User>(
            r#"
                INSERT INTO users (name, email)
                VALUES ($1, $2)
                RETURNING id, name, email
            "#,
        )
        .bind(new_user.name)
        .bind(new_user.email.clone())
        .fetch_one(&mut *self.executor)
        .await
        .map_err(email_taken(new_user.email))?;
        tracing::info!("Created user {:?}", user);
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn fetch_user(&mut self, id: i64) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
                SELECT id, name, email FROM users
                WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.executor)
        .instrument(tracing::info_span!("fetch_optional"))
        .await?;
        tracing::debug!("Found user: {:?}", user);
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn list_users(&mut self) -> ApiResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
                SELECT id, name, email FROM users
                ORDER BY id
            "#,
        )
        .fetch_all(&mut *self.executor)
        .instrument(tracing::info_span!("fetch_all"))
        .await?;
        tracing::info!("Listed {} users", users.len());
        Ok(users)
    }

    #[instrument(skip(self))]
    async fn update_user(&mut self, id: i64, patch: UserPatch) -> ApiResult<Option<User>> {
        let email = patch.email.clone().unwrap_or_default();
        let user = sqlx::query_as::<_, User>(
            r#"
                UPDATE users
                SET name = COALESCE($2, name), email = COALESCE($3, email)
                WHERE id = $1
                RETURNING id, name, email
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.email)
        .fetch_optional(&mut *self.executor)
        .await
        .map_err(email_taken(email))?;
        tracing::info!("Updated user: {:?}", user);
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn delete_user(&mut self, id: i64) -> ApiResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
