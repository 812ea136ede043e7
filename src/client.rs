//! Entry point for guild data access.
//!
//! `GuildClient` resolves guilds through the registry and runs multi-step
//! work atomically through [`GuildClient::transaction`]:
//!
//! ```text
//! Idle -> SessionStarted -> TransactionStarted -> Committing -> Committed --> SessionClosed
//!                                             \-> Aborting   -> Aborted  --/
//! ```
//!
//! The session is closed on every path, including errors and timeouts.

use crate::config::Config;
use crate::error::StoreError;
use crate::registry::{GuildDb, GuildRegistry};
use crate::scopes::{
    BountyScope, CharacterScope, FeatScope, GameSessionScope, PlayerScope, UtilityScope,
};
use crate::session::GuildSession;
use crate::transaction::{ErrorReporter, TracingReporter, TransactionOutcome};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Clone)]
pub struct GuildClient {
    registry: Arc<GuildRegistry>,
    reporter: Arc<dyn ErrorReporter>,
    transaction_timeout: Duration,
}

impl GuildClient {
    /// Bootstrap the registry from the credential directory named in `cfg`.
    pub async fn connect(cfg: &Config) -> Self {
        Self::new(GuildRegistry::bootstrap(cfg).await, cfg)
    }

    pub fn new(registry: GuildRegistry, cfg: &Config) -> Self {
        Self {
            registry: Arc::new(registry),
            reporter: Arc::new(TracingReporter),
            transaction_timeout: cfg.transaction_timeout(),
        }
    }

    /// Replace the hook receiving errors swallowed by aborted transactions.
    pub fn with_reporter(mut self, reporter: impl ErrorReporter + 'static) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    pub fn registry(&self) -> &GuildRegistry {
        &self.registry
    }

    pub fn guild_db(&self, guild_id: &str) -> Result<&GuildDb, StoreError> {
        self.registry.guild_db(guild_id)
    }

    pub fn characters(&self) -> CharacterScope {
        CharacterScope::new(self.clone())
    }

    pub fn players(&self) -> PlayerScope {
        PlayerScope::new(self.clone())
    }

    pub fn sessions(&self) -> GameSessionScope {
        GameSessionScope::new(self.clone())
    }

    pub fn utility(&self) -> UtilityScope {
        UtilityScope::new(self.clone())
    }

    pub fn feats(&self) -> FeatScope {
        FeatScope::new(self.clone())
    }

    pub fn bounties(&self) -> BountyScope {
        BountyScope::new(self.clone())
    }

    /// Run `unit_of_work` inside one transaction on `guild_id`.
    ///
    /// `Ok(true)` from the unit commits; `Ok(false)`, an error, or running past
    /// the configured timeout aborts. Errors from the unit, and store errors
    /// raised while opening the session, are handed to the error reporter and
    /// are not returned. Only an unknown guild, checked before any session is
    /// opened, is returned as `Err`.
    ///
    /// The unit must not call `transaction` again.
    pub async fn transaction<F>(
        &self,
        guild_id: &str,
        unit_of_work: F,
    ) -> Result<TransactionOutcome, StoreError>
    where
        F: for<'s> FnOnce(&'s mut GuildSession) -> BoxFuture<'s, Result<bool, StoreError>>,
    {
        let db = self.registry.guild_db(guild_id)?;
        let mut session = match GuildSession::start(db).await {
            Ok(session) => session,
            Err(e) => {
                // Lock contention, pool exhaustion or a closed pool: nothing ran.
                self.reporter.report(guild_id, &e);
                debug!(guild_id = %guild_id, "transaction aborted before it started");
                return Ok(TransactionOutcome::Aborted);
            }
        };

        let commit = match tokio::time::timeout(self.transaction_timeout, unit_of_work(&mut session))
            .await
        {
            Ok(Ok(commit)) => commit,
            Ok(Err(e)) => {
                self.reporter.report(guild_id, &e);
                false
            }
            Err(_) => {
                self.reporter
                    .report(guild_id, &StoreError::TransactionTimeout(self.transaction_timeout));
                false
            }
        };

        let outcome = if commit {
            match session.commit().await {
                Ok(()) => TransactionOutcome::Committed,
                Err(e) => {
                    self.reporter.report(guild_id, &e);
                    self.abort(guild_id, &mut session).await
                }
            }
        } else {
            self.abort(guild_id, &mut session).await
        };

        drop(session);
        debug!(guild_id = %guild_id, outcome = ?outcome, "transaction complete");
        Ok(outcome)
    }

    async fn abort(&self, guild_id: &str, session: &mut GuildSession) -> TransactionOutcome {
        // A failed rollback leaves the transaction open; dropping the session
        // then discards its connection, which rolls it back.
        if let Err(e) = session.abort().await {
            self.reporter.report(guild_id, &e);
        }
        TransactionOutcome::Aborted
    }

    /// Close every cached guild connection.
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
        info!("guild client shut down");
    }
}
