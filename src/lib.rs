pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod registry;
pub mod scopes;
pub mod session;
pub mod transaction;
pub mod utils;

pub use client::GuildClient;
pub use config::Config;
pub use error::{Result, StoreError};
pub use registry::{GuildDb, GuildRegistry, SessionStats};
pub use session::{GuildSession, SessionState};
pub use transaction::{ErrorReporter, TracingReporter, TransactionOutcome};
