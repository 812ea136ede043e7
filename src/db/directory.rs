use crate::db::models::TenantCredential;
use crate::error::StoreError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

/// Read-only view over the administrative database listing every guild.
#[derive(Clone)]
pub struct CredentialDirectory {
    pool: SqlitePool,
}

impl CredentialDirectory {
    /// Open the directory. A missing database file is an error, never created here.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let connect_opts = SqliteConnectOptions::from_str(url)?
            .create_if_missing(false)
            .read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_opts)
            .await?;
        Ok(Self { pool })
    }

    pub async fn list_credentials(&self) -> Result<Vec<TenantCredential>, StoreError> {
        let rows = sqlx::query_as::<_, TenantCredential>(
            "SELECT guild_id, connection_url, database FROM credentials ORDER BY guild_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
