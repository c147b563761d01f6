use time::OffsetDateTime;

use crate::{
    application::repos::{CreateUserParams, RepoError},
    domain::entities::UserRecord,
};

use super::{DbSession, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    display_name: Option<String>,
    bio: Option<String>,
    created_at: OffsetDateTime,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            display_name: row.display_name,
            bio: row.bio,
            created_at: row.created_at,
        }
    }
}

impl DbSession {
    pub async fn list_users(&mut self) -> Result<Vec<UserRecord>, RepoError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, display_name, bio, created_at
            FROM users
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(self.statement())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    pub async fn find_user(&mut self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, display_name, bio, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.statement())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(UserRecord::from))
    }

    pub async fn insert_user(&mut self, params: &CreateUserParams) -> Result<UserRecord, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, display_name, bio)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, display_name, bio, created_at
            "#,
        )
        .bind(&params.username)
        .bind(&params.email)
        .bind(&params.display_name)
        .bind(&params.bio)
        .fetch_one(self.statement())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}
