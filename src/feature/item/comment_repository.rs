//! Comments left on items by former borrowers.

use crate::infra::{
    database::{Repository, Tx},
    error::ApiResult,
    validation::not_blank,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use validator::Validate;

/// A new comment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
pub struct NewComment {
    /// What the author has to say.
    #[schema(example = "Worked great")]
    #[validate(custom(function = "not_blank"))]
    pub text: String,
}

/// A stored comment joined with its author's name.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub item_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub created: NaiveDateTime,
}

/// A comment as shown next to an item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    /// The comment's id.
    pub id: i64,
    /// The comment.
    pub text: String,
    /// The name of the user who wrote it.
    pub author_name: String,
    /// When it was written.
    #[schema(value_type = String, example = "2030-01-01T12:00:00")]
    pub created: NaiveDateTime,
}

impl From<Comment> for CommentView {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            text: c.text,
            author_name: c.author_name,
            created: c.created,
        }
    }
}

/// Anything that can store comments.
#[async_trait::async_trait]
pub trait CommentRepository: Send {
    /// Stores a comment on `item_id` written by `author_id` at `created`.
    async fn create_comment(
        &mut self,
        item_id: i64,
        author_id: i64,
        text: String,
        created: NaiveDateTime,
    ) -> ApiResult<Comment>;
    /// Lists the comments of the given items, oldest first.
    async fn list_comments(&mut self, item_ids: Vec<i64>) -> ApiResult<Vec<Comment>>;
}

#[async_trait::async_trait]
impl CommentRepository for Repository<Tx> {
    #[instrument(skip(self))]
    async fn create_comment(
        &mut self,
        item_id: i64,
        author_id: i64,
        text: String,
        created: NaiveDateTime,
    ) -> ApiResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
                WITH c AS (
                    INSERT INTO comments (text, item_id, author_id, created)
                    VALUES ($1, $2, $3, $4)
                    RETURNING *
                )
                SELECT c.id, c.text, c.item_id, c.author_id, u.name AS author_name, c.created
                FROM c JOIN users u ON u.id = c.author_id
            "#,
        )
        .bind(text)
        .bind(item_id)
        .bind(author_id)
        .bind(created)
        .fetch_one(&mut *self.executor)
        .await?;
        tracing::info!("Created comment {:?}", comment);
        Ok(comment)
    }

    #[instrument(skip(self))]
    async fn list_comments(&mut self, item_ids: Vec<i64>) -> ApiResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
                SELECT c.id, c.text, c.item_id, c.author_id, u.name AS author_name, c.created
                FROM comments c JOIN users u ON u.id = c.author_id
                WHERE c.item_id = ANY($1)
                ORDER BY c.created, c.id
            "#,
        )
        .bind(item_ids)
        .fetch_all(&mut *self.executor)
        .await?;
        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn blank_comment_is_invalid() {
        let comment = NewComment {
            text: "\t ".to_string(),
        };
        assert!(comment.validate().is_err());
    }

    #[test]
    fn view_uses_author_name() {
        let created = NaiveDate::from_ymd_opt(2030, 1, 1)
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .unwrap();
        let view = CommentView::from(Comment {
            id: 1,
            text: "Nice".to_string(),
            item_id: 2,
            author_id: 3,
            author_name: "Bob".to_string(),
            created,
        });
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!("Bob", json["authorName"]);
        assert_eq!("2030-01-01T08:30:00", json["created"]);
    }
}
