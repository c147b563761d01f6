use time::OffsetDateTime;

use crate::{
    application::repos::{CreateCommentParams, RepoError},
    domain::entities::CommentRecord,
};

use super::{DbSession, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    content: String,
    author_name: String,
    article_id: i64,
    created_at: OffsetDateTime,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            content: row.content,
            author_name: row.author_name,
            article_id: row.article_id,
            created_at: row.created_at,
        }
    }
}

impl DbSession {
    /// Comments of one article, oldest first.
    pub async fn comments_for_article(
        &mut self,
        article_id: i64,
    ) -> Result<Vec<CommentRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, content, author_name, article_id, created_at
            FROM comments
            WHERE article_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(article_id)
        .fetch_all(self.statement())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    pub async fn insert_comment(
        &mut self,
        params: &CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            INSERT INTO comments (content, author_name, article_id)
            VALUES ($1, $2, $3)
            RETURNING id, content, author_name, article_id, created_at
            "#,
        )
        .bind(&params.content)
        .bind(&params.author_name)
        .bind(params.article_id)
        .fetch_one(self.statement())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}
