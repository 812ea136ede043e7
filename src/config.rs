use crate::error::StoreError;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime configuration, read from `GUILDSTORE_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// sqlx URL of the administrative database holding tenant credentials.
    pub admin_database_url: String,
    pub loglevel: String,
    /// Upper bound on a single unit of work; the session is aborted past it.
    pub transaction_timeout_secs: u64,
    pub max_connections_per_guild: u32,
    pub busy_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            admin_database_url: "sqlite:data/admin.sqlite".to_string(),
            loglevel: "info".to_string(),
            transaction_timeout_secs: 30,
            max_connections_per_guild: 5,
            busy_timeout_ms: 5_000,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, StoreError> {
        Ok(Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("GUILDSTORE_"))
            .extract()?)
    }

    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_secs(self.transaction_timeout_secs)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_an_empty_environment() {
        figment::Jail::expect_with(|_jail| {
            let cfg = Config::load().map_err(|e| e.to_string())?;
            assert_eq!(cfg, Config::default());
            assert_eq!(cfg.transaction_timeout(), Duration::from_secs(30));
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("GUILDSTORE_ADMIN_DATABASE_URL", "sqlite:/tmp/admin.sqlite");
            jail.set_env("GUILDSTORE_TRANSACTION_TIMEOUT_SECS", "3");
            let cfg = Config::load().map_err(|e| e.to_string())?;
            assert_eq!(cfg.admin_database_url, "sqlite:/tmp/admin.sqlite");
            assert_eq!(cfg.transaction_timeout(), Duration::from_secs(3));
            assert_eq!(cfg.max_connections_per_guild, 5);
            Ok(())
        });
    }
}
