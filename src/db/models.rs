use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of the credential directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct TenantCredential {
    pub guild_id: String,
    pub connection_url: String,
    pub database: String,
}

impl TenantCredential {
    pub fn new(
        guild_id: impl Into<String>,
        connection_url: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            guild_id: guild_id.into(),
            connection_url: connection_url.into(),
            database: database.into(),
        }
    }
}
