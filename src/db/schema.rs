//! SQL DDL for the credential directory and the per-guild collections.

use crate::db::collection::CollectionName;

/// Credential directory schema:
/// - `guild_id` TEXT PRIMARY KEY, one record per tenant
/// - `connection_url` sqlx SQLite URL of the tenant's store
/// - `database` namespace of the tenant's collections inside that store
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS credentials (
    guild_id TEXT PRIMARY KEY NOT NULL,
    connection_url TEXT NOT NULL,
    database TEXT NOT NULL
);
"#;

/// Table name backing `collection` inside the `database` namespace.
pub fn collection_table(database: &str, collection: CollectionName) -> String {
    format!("{}__{}", database, collection.as_str())
}

/// One table per collection: the document id plus its JSON body.
pub fn collection_ddl(database: &str, collection: CollectionName) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS "{}" (
            id TEXT PRIMARY KEY NOT NULL,
            body TEXT NOT NULL
        )"#,
        collection_table(database, collection)
    )
}

/// Database names end up inside table names, so only `[A-Za-z0-9_]+` is accepted.
pub fn is_valid_database_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
