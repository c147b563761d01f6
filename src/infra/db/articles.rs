use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::{
    application::{
        pagination::{ListParams, SortField, SortOrder},
        repos::{CreateArticleParams, RepoError, UpdateArticleParams},
    },
    domain::entities::{ArticleRecord, AuthoredArticle, UserRecord},
};

use super::{DbSession, convert_count, map_sqlx_error};

const AUTHORED_ARTICLE_COLUMNS: &str = "a.id, a.title, a.slug, a.summary, a.view_count, \
    a.is_published, a.published_at, a.created_at, a.updated_at, a.user_id, \
    u.id AS author_id, u.username AS author_username, u.email AS author_email, \
    u.display_name AS author_display_name, u.bio AS author_bio, \
    u.created_at AS author_created_at";

#[derive(sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    title: String,
    slug: String,
    summary: Option<String>,
    view_count: i64,
    is_published: bool,
    published_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    user_id: i64,
}

impl From<ArticleRow> for ArticleRecord {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            summary: row.summary,
            view_count: row.view_count,
            is_published: row.is_published,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            user_id: row.user_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AuthoredArticleRow {
    #[sqlx(flatten)]
    article: ArticleRow,
    author_id: i64,
    author_username: String,
    author_email: String,
    author_display_name: Option<String>,
    author_bio: Option<String>,
    author_created_at: OffsetDateTime,
}

impl From<AuthoredArticleRow> for AuthoredArticle {
    fn from(row: AuthoredArticleRow) -> Self {
        Self {
            article: row.article.into(),
            author: UserRecord {
                id: row.author_id,
                username: row.author_username,
                email: row.author_email,
                display_name: row.author_display_name,
                bio: row.author_bio,
                created_at: row.author_created_at,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
struct ArticleWithContentRow {
    #[sqlx(flatten)]
    authored: AuthoredArticleRow,
    content: String,
}

#[derive(sqlx::FromRow)]
struct EditableArticleRow {
    #[sqlx(flatten)]
    article: ArticleRow,
    content: String,
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::CreatedAt => "a.created_at",
        SortField::PublishedAt => "a.published_at",
        SortField::ViewCount => "a.view_count",
        SortField::Title => "a.title",
    }
}

fn sort_direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

impl DbSession {
    pub async fn count_published_articles(&mut self) -> Result<u64, RepoError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE is_published = TRUE")
                .fetch_one(self.statement())
                .await
                .map_err(map_sqlx_error)?;
        convert_count(total)
    }

    /// One page of published articles with their authors joined in.
    pub async fn list_published_articles(
        &mut self,
        params: &ListParams,
    ) -> Result<Vec<AuthoredArticle>, RepoError> {
        let direction = sort_direction(params.sort_order);

        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(AUTHORED_ARTICLE_COLUMNS);
        qb.push(
            " FROM articles a INNER JOIN users u ON u.id = a.user_id \
             WHERE a.is_published = TRUE ORDER BY ",
        );
        qb.push(sort_column(params.sort_by));
        qb.push(" ");
        qb.push(direction);
        qb.push(" NULLS LAST, a.id ");
        qb.push(direction);
        qb.push(" LIMIT ");
        qb.push_bind(params.limit());
        qb.push(" OFFSET ");
        qb.push_bind(params.offset());

        let rows = qb
            .build_query_as::<AuthoredArticleRow>()
            .fetch_all(self.statement())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(AuthoredArticle::from).collect())
    }

    pub async fn article_exists(&mut self, id: i64) -> Result<bool, RepoError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM articles WHERE id = $1")
            .bind(id)
            .fetch_optional(self.statement())
            .await
            .map_err(map_sqlx_error)?;
        Ok(found.is_some())
    }

    pub async fn increment_view_count(&mut self, id: i64) -> Result<(), RepoError> {
        sqlx::query("UPDATE articles SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(self.statement())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Article, body and author in a single joined statement.
    pub async fn find_article_with_author(
        &mut self,
        id: i64,
    ) -> Result<Option<(AuthoredArticle, String)>, RepoError> {
        let sql = format!(
            "SELECT {AUTHORED_ARTICLE_COLUMNS}, a.content \
             FROM articles a INNER JOIN users u ON u.id = a.user_id WHERE a.id = $1"
        );
        let row = sqlx::query_as::<_, ArticleWithContentRow>(&sql)
            .bind(id)
            .fetch_optional(self.statement())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(|row| (AuthoredArticle::from(row.authored), row.content)))
    }

    /// Lock the article row for the rest of the transaction.
    pub async fn find_article_for_update(
        &mut self,
        id: i64,
    ) -> Result<Option<(ArticleRecord, String)>, RepoError> {
        let row = sqlx::query_as::<_, EditableArticleRow>(
            r#"
            SELECT id, title, slug, summary, view_count, is_published, published_at,
                   created_at, updated_at, user_id, content
            FROM articles
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(self.statement())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| (ArticleRecord::from(row.article), row.content)))
    }

    /// Whether another article already uses `slug`.
    pub async fn slug_taken(&mut self, slug: &str, except: Option<i64>) -> Result<bool, RepoError> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM articles
                WHERE slug = $1 AND ($2::bigint IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(slug)
        .bind(except)
        .fetch_one(self.statement())
        .await
        .map_err(map_sqlx_error)?;
        Ok(taken)
    }

    pub async fn insert_article(&mut self, params: &CreateArticleParams) -> Result<i64, RepoError> {
        sqlx::query_scalar(
            r#"
            INSERT INTO articles (title, slug, content, summary, is_published, published_at, user_id)
            VALUES ($1, $2, $3, $4, $5, CASE WHEN $5 THEN now() END, $6)
            RETURNING id
            "#,
        )
        .bind(&params.title)
        .bind(&params.slug)
        .bind(&params.content)
        .bind(&params.summary)
        .bind(params.is_published)
        .bind(params.user_id)
        .fetch_one(self.statement())
        .await
        .map_err(map_sqlx_error)
    }

    pub async fn update_article(&mut self, params: &UpdateArticleParams) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            UPDATE articles
            SET title = $2,
                slug = $3,
                content = $4,
                summary = $5,
                is_published = $6,
                published_at = CASE WHEN $7 THEN now() ELSE published_at END,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(params.id)
        .bind(&params.title)
        .bind(&params.slug)
        .bind(&params.content)
        .bind(&params.summary)
        .bind(params.is_published)
        .bind(params.stamp_published_at)
        .execute(self.statement())
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns `false` when no article had that id.
    pub async fn delete_article(&mut self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(self.statement())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    /// Articles written by one user, newest first, without authors or tags.
    pub async fn articles_by_user(&mut self, user_id: i64) -> Result<Vec<ArticleRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT id, title, slug, summary, view_count, is_published, published_at,
                   created_at, updated_at, user_id
            FROM articles
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.statement())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ArticleRecord::from).collect())
    }
}
