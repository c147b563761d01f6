use std::collections::HashMap;

use crate::{application::repos::RepoError, domain::entities::TagRecord};

use super::{DbSession, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct TagRow {
    id: i64,
    name: String,
}

impl From<TagRow> for TagRecord {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ArticleTagRow {
    article_id: i64,
    id: i64,
    name: String,
}

impl DbSession {
    /// Tags of many articles in one statement, grouped by article id.
    pub async fn tags_for_articles(
        &mut self,
        article_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<TagRecord>>, RepoError> {
        let rows = sqlx::query_as::<_, ArticleTagRow>(
            r#"
            SELECT atg.article_id, t.id, t.name
            FROM article_tags atg
            INNER JOIN tags t ON t.id = atg.tag_id
            WHERE atg.article_id = ANY($1)
            ORDER BY t.name, t.id
            "#,
        )
        .bind(article_ids)
        .fetch_all(self.statement())
        .await
        .map_err(map_sqlx_error)?;

        let mut grouped: HashMap<i64, Vec<TagRecord>> = HashMap::new();
        for row in rows {
            grouped.entry(row.article_id).or_default().push(TagRecord {
                id: row.id,
                name: row.name,
            });
        }
        Ok(grouped)
    }

    pub async fn tags_for_article(&mut self, article_id: i64) -> Result<Vec<TagRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT t.id, t.name
            FROM article_tags atg
            INNER JOIN tags t ON t.id = atg.tag_id
            WHERE atg.article_id = $1
            ORDER BY t.name, t.id
            "#,
        )
        .bind(article_id)
        .fetch_all(self.statement())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TagRecord::from).collect())
    }

    /// Return a record for every name, inserting the ones that do not exist yet.
    pub async fn ensure_tags(&mut self, names: &[String]) -> Result<Vec<TagRecord>, RepoError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            INSERT INTO tags (name)
            SELECT * FROM UNNEST($1::text[])
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name
            "#,
        )
        .bind(names)
        .fetch_all(self.statement())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TagRecord::from).collect())
    }

    pub async fn attach_tags(&mut self, article_id: i64, tag_ids: &[i64]) -> Result<(), RepoError> {
        if tag_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO article_tags (article_id, tag_id)
            SELECT $1, tag_id FROM UNNEST($2::bigint[]) AS tag_id
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(article_id)
        .bind(tag_ids)
        .execute(self.statement())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    pub async fn detach_all_tags(&mut self, article_id: i64) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM article_tags WHERE article_id = $1")
            .bind(article_id)
            .execute(self.statement())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
