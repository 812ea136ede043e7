//! Guild registry: one pool and one database namespace per guild.
//!
//! Built once from the credential directory and never mutated afterwards, so
//! lookups are plain reads on a `HashMap` shared by every task.

use crate::config::Config;
use crate::db::collection::{Collection, CollectionName, Document};
use crate::db::directory::{CredentialDirectory, SqlitePool};
use crate::db::models::TenantCredential;
use crate::db::schema::{collection_ddl, is_valid_database_name};
use crate::error::StoreError;
use futures::future::join_all;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, info, warn};

/// Sessions opened and closed against one guild since bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub opened: u64,
    pub closed: u64,
}

impl SessionStats {
    pub fn open(&self) -> u64 {
        self.opened.saturating_sub(self.closed)
    }
}

struct GuildDbInner {
    guild_id: String,
    database: String,
    pool: SqlitePool,
    sessions_opened: AtomicU64,
    sessions_closed: AtomicU64,
}

/// Handle on a single guild's database. Cheap to clone.
#[derive(Clone)]
pub struct GuildDb {
    inner: Arc<GuildDbInner>,
}

impl GuildDb {
    async fn open(credential: TenantCredential, cfg: &Config) -> Result<Self, StoreError> {
        if !is_valid_database_name(&credential.database) {
            return Err(StoreError::InvalidIdentifier(credential.database));
        }
        let connect_opts = SqliteConnectOptions::from_str(&credential.connection_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(cfg.busy_timeout());
        let pool = SqlitePoolOptions::new()
            .max_connections(cfg.max_connections_per_guild)
            .connect_with(connect_opts)
            .await?;

        let db = Self {
            inner: Arc::new(GuildDbInner {
                guild_id: credential.guild_id,
                database: credential.database,
                pool,
                sessions_opened: AtomicU64::new(0),
                sessions_closed: AtomicU64::new(0),
            }),
        };
        db.ensure_collections().await?;
        Ok(db)
    }

    async fn ensure_collections(&self) -> Result<(), StoreError> {
        for name in CollectionName::ALL {
            sqlx::query(&collection_ddl(self.database(), name))
                .execute(self.pool())
                .await?;
        }
        Ok(())
    }

    pub fn guild_id(&self) -> &str {
        &self.inner.guild_id
    }

    pub fn database(&self) -> &str {
        &self.inner.database
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    pub fn collection<T: Document>(&self) -> Collection<T> {
        Collection::new(self.clone())
    }

    pub fn session_stats(&self) -> SessionStats {
        SessionStats {
            opened: self.inner.sessions_opened.load(Ordering::Acquire),
            closed: self.inner.sessions_closed.load(Ordering::Acquire),
        }
    }

    pub(crate) fn record_session_opened(&self) {
        self.inner.sessions_opened.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_session_closed(&self) {
        self.inner.sessions_closed.fetch_add(1, Ordering::AcqRel);
    }

    async fn close(&self) {
        self.inner.pool.close().await;
    }
}

impl fmt::Debug for GuildDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuildDb")
            .field("guild_id", &self.guild_id())
            .field("database", &self.database())
            .field("sessions", &self.session_stats())
            .finish()
    }
}

pub struct GuildRegistry {
    guilds: HashMap<String, GuildDb>,
}

impl GuildRegistry {
    pub fn empty() -> Self {
        Self {
            guilds: HashMap::new(),
        }
    }

    /// Read the credential directory and open every guild it lists.
    ///
    /// An unreachable or unreadable directory leaves the registry empty, so
    /// every later lookup is rejected.
    pub async fn bootstrap(cfg: &Config) -> Self {
        let credentials = match CredentialDirectory::connect(&cfg.admin_database_url).await {
            Ok(directory) => {
                let listed = directory.list_credentials().await;
                directory.close().await;
                listed
            }
            Err(e) => Err(e),
        };

        match credentials {
            Ok(records) => Self::from_credentials(records, cfg).await,
            Err(e) => {
                error!(
                    url = %cfg.admin_database_url,
                    error = %e,
                    "credential directory unavailable; no guild will be served"
                );
                Self::empty()
            }
        }
    }

    /// Open one pool per credential record. Records that fail to open are
    /// logged and left out; a repeated guild id keeps its first record.
    pub async fn from_credentials(records: Vec<TenantCredential>, cfg: &Config) -> Self {
        let mut seen = HashSet::new();
        let unique: Vec<TenantCredential> = records
            .into_iter()
            .filter(|record| {
                let first = seen.insert(record.guild_id.clone());
                if !first {
                    warn!(guild_id = %record.guild_id, "duplicate credential record ignored");
                }
                first
            })
            .collect();

        let opened = join_all(unique.into_iter().map(|record| async move {
            let guild_id = record.guild_id.clone();
            (guild_id, GuildDb::open(record, cfg).await)
        }))
        .await;

        let mut guilds = HashMap::with_capacity(opened.len());
        for (guild_id, result) in opened {
            match result {
                Ok(db) => {
                    guilds.insert(guild_id, db);
                }
                Err(e) => {
                    warn!(guild_id = %guild_id, error = %e, "failed to open guild database; skipping");
                }
            }
        }

        info!(guilds = guilds.len(), "guild registry ready");
        Self { guilds }
    }

    /// Database handle of `guild_id`, or `TenantNotFound`.
    pub fn guild_db(&self, guild_id: &str) -> Result<&GuildDb, StoreError> {
        self.guilds
            .get(guild_id)
            .ok_or_else(|| StoreError::TenantNotFound(guild_id.to_string()))
    }

    pub fn contains(&self, guild_id: &str) -> bool {
        self.guilds.contains_key(guild_id)
    }

    /// Registered guild ids, sorted.
    pub fn guild_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.guilds.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.guilds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guilds.is_empty()
    }

    /// Close every guild pool. Lookups keep resolving, but new sessions fail.
    pub async fn shutdown(&self) {
        join_all(self.guilds.values().map(|db| db.close())).await;
        info!(guilds = self.guilds.len(), "guild connections closed");
    }
}
