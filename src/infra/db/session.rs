use sqlx::{PgConnection, Postgres, Transaction};

use crate::application::repos::RepoError;

use super::{QueryCounter, map_sqlx_error};

/// One request's unit of work: a transaction plus the request's statement counter.
///
/// Every statement is issued through [`DbSession::statement`], which counts
/// it before handing out the connection. Dropping a session without calling
/// [`DbSession::commit`] rolls the transaction back.
pub struct DbSession {
    tx: Transaction<'static, Postgres>,
    queries: QueryCounter,
}

impl DbSession {
    pub(crate) fn new(tx: Transaction<'static, Postgres>, queries: QueryCounter) -> Self {
        Self { tx, queries }
    }

    /// Connection for exactly one statement.
    pub(crate) fn statement(&mut self) -> &mut PgConnection {
        self.queries.record();
        &mut self.tx
    }

    pub fn queries(&self) -> &QueryCounter {
        &self.queries
    }

    pub async fn commit(self) -> Result<(), RepoError> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    pub async fn rollback(self) -> Result<(), RepoError> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}
