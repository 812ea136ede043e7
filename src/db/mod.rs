//! Database module: credential directory, schema and typed collections.
//!
//! Layout:
//! - `directory.rs`: read-only access to the credential directory
//! - `models.rs`: rows of the credential directory
//! - `schema.rs`: SQL DDL for the directory and per-guild collection tables
//! - `collection.rs`: typed document access over one guild collection

pub mod collection;
pub mod directory;
pub mod models;
pub mod schema;

pub use collection::{Collection, CollectionName, Document, Filter, WriteResult};
pub use directory::{CredentialDirectory, SqlitePool};
pub use models::TenantCredential;
pub use schema::SQLITE_INIT;
