use crate::error::StoreError;
use tracing::warn;

/// Whether a transaction's writes were applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    Committed,
    Aborted,
}

impl TransactionOutcome {
    pub fn is_committed(self) -> bool {
        self == TransactionOutcome::Committed
    }

    pub fn is_aborted(self) -> bool {
        self == TransactionOutcome::Aborted
    }
}

/// Receives the errors a transaction swallows when it aborts.
///
/// `GuildClient::transaction` never returns the unit of work's error to its
/// caller; this hook is the only place the cause is still visible.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, guild_id: &str, error: &StoreError);
}

/// Default reporter: a `warn` event per discarded error.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, guild_id: &str, error: &StoreError) {
        warn!(guild_id = %guild_id, error = %error, "transaction aborted by error");
    }
}

impl<F> ErrorReporter for F
where
    F: Fn(&str, &StoreError) + Send + Sync,
{
    fn report(&self, guild_id: &str, error: &StoreError) {
        self(guild_id, error)
    }
}
