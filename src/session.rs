use crate::error::StoreError;
use crate::registry::GuildDb;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Started,
    InTransaction,
    Committed,
    Aborted,
}

/// Exclusive transactional context on one guild connection.
///
/// Owned by the single transaction invocation that opened it. Dropping the
/// session closes it; if its transaction was never committed or aborted the
/// underlying connection is discarded instead of going back to the pool.
pub struct GuildSession {
    db: GuildDb,
    conn: Option<PoolConnection<Sqlite>>,
    state: SessionState,
}

impl GuildSession {
    /// Acquire a connection from the guild pool and open a write transaction on it.
    pub(crate) async fn start(db: &GuildDb) -> Result<Self, StoreError> {
        let conn = db.pool().acquire().await?;
        db.record_session_opened();
        let mut session = Self {
            db: db.clone(),
            conn: Some(conn),
            state: SessionState::Started,
        };
        debug!(guild_id = %db.guild_id(), "session started");

        // IMMEDIATE takes the write lock up front, so concurrent transactions
        // on one guild serialize instead of failing on lock upgrade.
        sqlx::query("BEGIN IMMEDIATE")
            .execute(session.conn()?)
            .await?;
        session.state = SessionState::InTransaction;
        debug!(guild_id = %db.guild_id(), "transaction started");
        Ok(session)
    }

    pub fn guild_id(&self) -> &str {
        self.db.guild_id()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn conn(&mut self) -> Result<&mut SqliteConnection, StoreError> {
        self.conn.as_deref_mut().ok_or(StoreError::SessionClosed)
    }

    pub(crate) async fn commit(&mut self) -> Result<(), StoreError> {
        self.finish("COMMIT", SessionState::Committed).await
    }

    pub(crate) async fn abort(&mut self) -> Result<(), StoreError> {
        self.finish("ROLLBACK", SessionState::Aborted).await
    }

    async fn finish(&mut self, statement: &'static str, next: SessionState) -> Result<(), StoreError> {
        if self.state != SessionState::InTransaction {
            return Err(StoreError::SessionClosed);
        }
        sqlx::query(statement).execute(self.conn()?).await?;
        self.state = next;
        debug!(guild_id = %self.guild_id(), state = ?next, "transaction finished");
        Ok(())
    }
}

impl Drop for GuildSession {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if matches!(self.state, SessionState::Started | SessionState::InTransaction) {
                warn!(
                    guild_id = %self.db.guild_id(),
                    state = ?self.state,
                    "session closed with an open transaction; discarding its connection"
                );
                drop(conn.detach());
            }
        }
        self.db.record_session_closed();
        debug!(guild_id = %self.db.guild_id(), "session closed");
    }
}
