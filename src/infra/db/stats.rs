use crate::application::repos::RepoError;

use super::{DbSession, map_sqlx_error};

/// Row counts reported by the metrics endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentTotals {
    pub articles: i64,
    pub comments: i64,
    pub users: i64,
}

impl DbSession {
    pub async fn content_totals(&mut self) -> Result<ContentTotals, RepoError> {
        let articles = self.count_rows("SELECT COUNT(*) FROM articles").await?;
        let comments = self.count_rows("SELECT COUNT(*) FROM comments").await?;
        let users = self.count_rows("SELECT COUNT(*) FROM users").await?;

        Ok(ContentTotals {
            articles,
            comments,
            users,
        })
    }

    async fn count_rows(&mut self, sql: &'static str) -> Result<i64, RepoError> {
        sqlx::query_scalar(sql)
            .fetch_one(self.statement())
            .await
            .map_err(map_sqlx_error)
    }
}
