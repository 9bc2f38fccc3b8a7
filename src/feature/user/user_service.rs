//! A service for interacting with users.

use super::user_repository::{NewUser, User, UserPatch, UserRepository};
use crate::infra::{
    error::{ApiResult, ClientError},
    validation::Valid,
};
use tracing::instrument;

/// Creates a new user.
#[instrument(skip(repository))]
pub async fn create_user<R: UserRepository>(
    repository: &mut R,
    new_user: Valid<NewUser>,
) -> ApiResult<User> {
    repository.create_user(new_user.into_inner()).await
}

/// Reads a user, failing if there is no such user.
#[instrument(skip(repository))]
pub async fn read_user<R: UserRepository>(repository: &mut R, id: i64) -> ApiResult<User> {
    repository.fetch_user(id).await?.ok_or_else(|| {
        tracing::warn!("User {} not found", id);
        ClientError::NotFound(format!("user {id} not found")).into()
    })
}

/// Lists all users.
#[instrument(skip(repository))]
pub async fn list_users<R: UserRepository>(repository: &mut R) -> ApiResult<Vec<User>> {
    repository.list_users().await
}

/// Updates the fields of a user that are present in `patch`.
#[instrument(skip(repository))]
pub async fn update_user<R: UserRepository>(
    repository: &mut R,
    id: i64,
    patch: Valid<UserPatch>,
) -> ApiResult<User> {
    repository
        .update_user(id, patch.into_inner())
        .await?
        .ok_or_else(|| ClientError::NotFound(format!("user {id} not found")).into())
}

/// Deletes a user.
#[instrument(skip(repository))]
pub async fn delete_user<R: UserRepository>(repository: &mut R, id: i64) -> ApiResult<()> {
    if !repository.delete_user(id).await? {
        tracing::warn!("User {} not found", id);
        return Err(ClientError::NotFound(format!("user {id} not found")))?;
    }
    tracing::info!("Deleted user {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{feature::mock::MockRepository, infra::error::ApiError};
    use mockall::predicate::eq;

    fn alice() -> User {
        User {
            id: 1,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_fetch_user()
            .with(eq(9))
            .return_once(|_| Ok(None));
        let result = read_user(&mut repo, 9).await;
        assert!(matches!(
            result,
            Err(ApiError::ClientError(ClientError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn patch_is_passed_through() {
        let mut repo = MockRepository::new();
        let patch = UserPatch {
            name: Some("Alicia".to_string()),
            email: None,
        };
        repo.expect_update_user()
            .with(eq(1), eq(patch.clone()))
            .return_once(|_, _| {
                Ok(Some(User {
                    name: "Alicia".to_string(),
                    ..alice()
                }))
            });
        let user = update_user(&mut repo, 1, Valid::new(patch).unwrap())
            .await
            .unwrap();
        assert_eq!("Alicia", user.name);
        assert_eq!("alice@example.com", user.email);
    }

    #[tokio::test]
    async fn blank_patch_changes_nothing() {
        let patch: UserPatch = serde_json::from_str(r#"{"name": "", "email": "  "}"#).unwrap();
        assert_eq!(UserPatch::default(), patch);
    }

    #[test]
    fn patch_with_bad_email_is_invalid() {
        let patch = UserPatch {
            name: None,
            email: Some("not-an-email".to_string()),
        };
        assert!(Valid::new(patch).is_err());
    }

    #[tokio::test]
    async fn deleting_missing_user_is_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_delete_user().return_once(|_| Ok(false));
        let result = delete_user(&mut repo, 3).await;
        assert!(matches!(
            result,
            Err(ApiError::ClientError(ClientError::NotFound(_)))
        ));
    }
}
