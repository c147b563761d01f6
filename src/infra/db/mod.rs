//! Postgres-backed persistence: pool management, request sessions and the
//! statements each service needs.

mod articles;
mod comments;
mod counter;
mod session;
mod stats;
mod tags;
mod users;
mod util;

pub use counter::QueryCounter;
pub use session::DbSession;
pub use stats::ContentTotals;
pub use util::map_sqlx_error;

use std::{sync::Arc, time::Duration};

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::application::repos::RepoError;

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a session whose statements are charged to `queries`.
    pub async fn begin(&self, queries: &QueryCounter) -> Result<DbSession, RepoError> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(DbSession::new(tx, queries.clone()))
    }

    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn convert_count(value: i64) -> Result<u64, RepoError> {
    value
        .try_into()
        .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
}
