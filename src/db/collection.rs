//! Typed access to one guild collection.
//!
//! Every operation takes an `Option<&mut GuildSession>`. With a session the
//! statement runs on the session's connection inside its open transaction;
//! without one it runs directly on the guild pool as a standalone statement.

use crate::db::schema::collection_table;
use crate::error::StoreError;
use crate::registry::GuildDb;
use crate::session::GuildSession;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::query::Query;
use sqlx::{Row, Sqlite};
use std::fmt;
use std::marker::PhantomData;
use tracing::warn;

/// Logical collections every guild database carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionName {
    Characters,
    Players,
    Sessions,
    Utils,
    Announcements,
    BuildingMessages,
    Feats,
    Bounties,
}

impl CollectionName {
    pub const ALL: [CollectionName; 8] = [
        CollectionName::Characters,
        CollectionName::Players,
        CollectionName::Sessions,
        CollectionName::Utils,
        CollectionName::Announcements,
        CollectionName::BuildingMessages,
        CollectionName::Feats,
        CollectionName::Bounties,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CollectionName::Characters => "characters",
            CollectionName::Players => "players",
            CollectionName::Sessions => "sessions",
            CollectionName::Utils => "utils",
            CollectionName::Announcements => "announcements",
            CollectionName::BuildingMessages => "building_messages",
            CollectionName::Feats => "feats",
            CollectionName::Bounties => "bounties",
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A JSON document stored in a guild collection, keyed by its id.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    const COLLECTION: CollectionName;

    fn id(&self) -> &str;
}

/// Predicate over document fields. Dotted field names address nested values;
/// the field `id` is the document key.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Eq(String, Value),
    In(String, Vec<Value>),
    Gte(String, Value),
    Lte(String, Value),
    Exists(String),
    And(Vec<Filter>),
}

impl Filter {
    pub fn id(id: impl Into<String>) -> Self {
        Filter::Eq("id".to_string(), Value::String(id.into()))
    }

    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(field.to_string(), value.into())
    }

    pub fn is_in<V: Into<Value>>(field: &str, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(field.to_string(), values.into_iter().map(Into::into).collect())
    }

    pub fn gte(field: &str, value: impl Into<Value>) -> Self {
        Filter::Gte(field.to_string(), value.into())
    }

    pub fn lte(field: &str, value: impl Into<Value>) -> Self {
        Filter::Lte(field.to_string(), value.into())
    }

    pub fn exists(field: &str) -> Self {
        Filter::Exists(field.to_string())
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    /// Render as a SQL boolean expression, appending positional parameters to `binds`.
    pub(crate) fn to_sql(&self, binds: &mut Vec<String>) -> Result<String, StoreError> {
        Ok(match self {
            Filter::All => "1 = 1".to_string(),
            Filter::Eq(field, Value::Null) => format!("{} IS NULL", field_expr(field, binds)?),
            Filter::Eq(field, value) => {
                let expr = field_expr(field, binds)?;
                binds.push(value.to_string());
                format!("{expr} = json_extract(?, '$')")
            }
            Filter::In(field, values) => {
                let expr = field_expr(field, binds)?;
                binds.push(Value::Array(values.clone()).to_string());
                format!("{expr} IN (SELECT value FROM json_each(?))")
            }
            Filter::Gte(field, value) => {
                let expr = field_expr(field, binds)?;
                binds.push(value.to_string());
                format!("{expr} >= json_extract(?, '$')")
            }
            Filter::Lte(field, value) => {
                let expr = field_expr(field, binds)?;
                binds.push(value.to_string());
                format!("{expr} <= json_extract(?, '$')")
            }
            Filter::Exists(field) => format!("{} IS NOT NULL", field_expr(field, binds)?),
            Filter::And(filters) if filters.is_empty() => "1 = 1".to_string(),
            Filter::And(filters) => filters
                .iter()
                .map(|f| f.to_sql(binds).map(|sql| format!("({sql})")))
                .collect::<Result<Vec<_>, _>>()?
                .join(" AND "),
        })
    }
}

fn field_expr(field: &str, binds: &mut Vec<String>) -> Result<String, StoreError> {
    if field == "id" {
        return Ok("id".to_string());
    }
    binds.push(json_path(field.split('.'))?);
    Ok("json_extract(body, ?)".to_string())
}

/// Build a JSON path with every segment quoted, e.g. `$."inventory"."Long sword"`.
pub(crate) fn json_path<'a>(segments: impl IntoIterator<Item = &'a str>) -> Result<String, StoreError> {
    let mut path = String::from("$");
    for segment in segments {
        if segment.is_empty() || segment.contains('"') {
            return Err(StoreError::InvalidIdentifier(segment.to_string()));
        }
        path.push_str(&format!(".\"{segment}\""));
    }
    Ok(path)
}

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteResult {
    pub affected: u64,
}

impl WriteResult {
    /// At least one document was written.
    pub fn is_successful(&self) -> bool {
        self.affected > 0
    }

    /// Exactly one document was written.
    pub fn is_single(&self) -> bool {
        self.affected == 1
    }
}

fn prepare<'q>(sql: &'q str, binds: &'q [String]) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    binds
        .iter()
        .fold(sqlx::query(sql), |query, value| query.bind(value.as_str()))
}

/// Runs `$body` against the session's connection when one is supplied,
/// otherwise against the guild pool.
macro_rules! with_executor {
    ($self:ident, $session:expr, |$exec:ident| $body:expr) => {
        match $session {
            Some(session) => {
                $self.check_session(session)?;
                let $exec = session.conn()?;
                $body
            }
            None => {
                let $exec = $self.db.pool();
                $body
            }
        }
    };
}

pub struct Collection<T> {
    db: GuildDb,
    table: String,
    _doc: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            table: self.table.clone(),
            _doc: PhantomData,
        }
    }
}

impl<T: Document> Collection<T> {
    pub(crate) fn new(db: GuildDb) -> Self {
        let table = collection_table(db.database(), T::COLLECTION);
        Self {
            db,
            table,
            _doc: PhantomData,
        }
    }

    pub fn name(&self) -> CollectionName {
        T::COLLECTION
    }

    fn check_session(&self, session: &GuildSession) -> Result<(), StoreError> {
        if session.guild_id() != self.db.guild_id() {
            return Err(StoreError::SessionMismatch {
                session: session.guild_id().to_string(),
                target: self.db.guild_id().to_string(),
            });
        }
        Ok(())
    }

    fn decode(row: SqliteRow) -> Result<T, StoreError> {
        let body: String = row.try_get("body")?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn find_one(
        &self,
        filter: &Filter,
        session: Option<&mut GuildSession>,
    ) -> Result<Option<T>, StoreError> {
        let mut binds = Vec::new();
        let sql = format!(
            r#"SELECT body FROM "{}" WHERE {} ORDER BY id LIMIT 1"#,
            self.table,
            filter.to_sql(&mut binds)?
        );
        let row = with_executor!(self, session, |exec| {
            prepare(&sql, &binds).fetch_optional(exec).await?
        });
        row.map(Self::decode).transpose()
    }

    pub async fn find_by_id(
        &self,
        id: &str,
        session: Option<&mut GuildSession>,
    ) -> Result<Option<T>, StoreError> {
        self.find_one(&Filter::id(id), session).await
    }

    /// Like `find_by_id`, failing with `ResourceNotFound` when absent.
    pub async fn get(&self, id: &str, session: Option<&mut GuildSession>) -> Result<T, StoreError> {
        self.find_by_id(id, session)
            .await?
            .ok_or_else(|| StoreError::not_found(id, self.name().as_str()))
    }

    pub async fn find(
        &self,
        filter: &Filter,
        session: Option<&mut GuildSession>,
    ) -> Result<Vec<T>, StoreError> {
        let mut binds = Vec::new();
        let sql = format!(
            r#"SELECT body FROM "{}" WHERE {} ORDER BY id"#,
            self.table,
            filter.to_sql(&mut binds)?
        );
        let rows = with_executor!(self, session, |exec| {
            prepare(&sql, &binds).fetch_all(exec).await?
        });
        rows.into_iter().map(Self::decode).collect()
    }

    pub async fn count(
        &self,
        filter: &Filter,
        session: Option<&mut GuildSession>,
    ) -> Result<u64, StoreError> {
        let mut binds = Vec::new();
        let sql = format!(
            r#"SELECT COUNT(*) AS n FROM "{}" WHERE {}"#,
            self.table,
            filter.to_sql(&mut binds)?
        );
        let row = with_executor!(self, session, |exec| {
            prepare(&sql, &binds).fetch_one(exec).await?
        });
        let n: i64 = row.try_get("n")?;
        Ok(n.max(0) as u64)
    }

    /// Insert a new document; fails if its id is already taken.
    pub async fn insert_one(
        &self,
        doc: &T,
        session: Option<&mut GuildSession>,
    ) -> Result<WriteResult, StoreError> {
        let binds = [doc.id().to_string(), serde_json::to_string(doc)?];
        let sql = format!(r#"INSERT INTO "{}" (id, body) VALUES (?, ?)"#, self.table);
        let done = with_executor!(self, session, |exec| {
            prepare(&sql, &binds).execute(exec).await?
        });
        Ok(WriteResult {
            affected: done.rows_affected(),
        })
    }

    /// Replace the stored copy of `doc`, matched by id. Nothing is written if absent.
    pub async fn replace_one(
        &self,
        doc: &T,
        session: Option<&mut GuildSession>,
    ) -> Result<WriteResult, StoreError> {
        let binds = [serde_json::to_string(doc)?, doc.id().to_string()];
        let sql = format!(r#"UPDATE "{}" SET body = ? WHERE id = ?"#, self.table);
        let done = with_executor!(self, session, |exec| {
            prepare(&sql, &binds).execute(exec).await?
        });
        Ok(WriteResult {
            affected: done.rows_affected(),
        })
    }

    /// Insert or replace `doc`, keyed by id.
    pub async fn upsert_one(
        &self,
        doc: &T,
        session: Option<&mut GuildSession>,
    ) -> Result<WriteResult, StoreError> {
        let binds = [doc.id().to_string(), serde_json::to_string(doc)?];
        let sql = format!(
            r#"INSERT INTO "{}" (id, body) VALUES (?, ?)
               ON CONFLICT(id) DO UPDATE SET body = excluded.body"#,
            self.table
        );
        let done = with_executor!(self, session, |exec| {
            prepare(&sql, &binds).execute(exec).await?
        });
        Ok(WriteResult {
            affected: done.rows_affected(),
        })
    }

    /// Remove the nested field at `path` from every document carrying it.
    pub async fn unset_all(
        &self,
        path: &[&str],
        session: Option<&mut GuildSession>,
    ) -> Result<WriteResult, StoreError> {
        let path = json_path(path.iter().copied())?;
        let binds = [path.clone(), path];
        let sql = format!(
            r#"UPDATE "{}" SET body = json_remove(body, ?) WHERE json_extract(body, ?) IS NOT NULL"#,
            self.table
        );
        let done = with_executor!(self, session, |exec| {
            prepare(&sql, &binds).execute(exec).await?
        });
        Ok(WriteResult {
            affected: done.rows_affected(),
        })
    }

    pub async fn delete_many(
        &self,
        filter: &Filter,
        session: Option<&mut GuildSession>,
    ) -> Result<WriteResult, StoreError> {
        let mut binds = Vec::new();
        let sql = format!(
            r#"DELETE FROM "{}" WHERE {}"#,
            self.table,
            filter.to_sql(&mut binds)?
        );
        let done = with_executor!(self, session, |exec| {
            prepare(&sql, &binds).execute(exec).await?
        });
        Ok(WriteResult {
            affected: done.rows_affected(),
        })
    }

    /// Read the document `id`, apply `modify` to a copy and write the copy back.
    ///
    /// Both steps share one session: the caller's when supplied, otherwise a
    /// short-lived one opened and closed here, so the update is always atomic.
    /// Fails with `ResourceNotFound` if the document does not exist.
    pub async fn modify_one<F>(
        &self,
        id: &str,
        session: Option<&mut GuildSession>,
        modify: F,
    ) -> Result<WriteResult, StoreError>
    where
        F: FnOnce(T) -> T + Send,
    {
        if let Some(session) = session {
            return self.read_modify_write(id, session, modify).await;
        }

        let mut own = GuildSession::start(&self.db).await?;
        match self.read_modify_write(id, &mut own, modify).await {
            Ok(written) => {
                own.commit().await?;
                Ok(written)
            }
            Err(e) => {
                if let Err(abort_err) = own.abort().await {
                    warn!(
                        guild_id = %self.db.guild_id(),
                        error = %abort_err,
                        "rollback after failed update also failed"
                    );
                }
                Err(e)
            }
        }
    }

    async fn read_modify_write<F>(
        &self,
        id: &str,
        session: &mut GuildSession,
        modify: F,
    ) -> Result<WriteResult, StoreError>
    where
        F: FnOnce(T) -> T + Send,
    {
        let current = self.get(id, Some(&mut *session)).await?;
        let updated = modify(current);
        self.replace_one(&updated, Some(session)).await
    }
}
