#![allow(dead_code)]

use guildstore::db::SQLITE_INIT;
use guildstore::models::{Character, ExpTable};
use guildstore::{Config, GuildClient, StoreError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// A guild to register: id, store file name inside the temp dir, database name.
pub struct GuildSpec<'a> {
    pub guild_id: &'a str,
    pub file: &'a str,
    pub database: &'a str,
}

pub fn guild<'a>(guild_id: &'a str, file: &'a str, database: &'a str) -> GuildSpec<'a> {
    GuildSpec {
        guild_id,
        file,
        database,
    }
}

pub fn sqlite_url(path: &Path) -> String {
    format!("sqlite:{}", path.display())
}

/// Create the credential directory at `dir/admin.sqlite` listing `guilds`.
pub async fn seed_directory(dir: &Path, guilds: &[GuildSpec<'_>]) -> String {
    let admin_url = sqlite_url(&dir.join("admin.sqlite"));
    let opts = SqliteConnectOptions::from_str(&admin_url)
        .expect("admin url")
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .expect("failed to create admin database");

    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if !s.is_empty() {
            sqlx::query(s).execute(&pool).await.expect("schema");
        }
    }
    for g in guilds {
        sqlx::query("INSERT INTO credentials (guild_id, connection_url, database) VALUES (?, ?, ?)")
            .bind(g.guild_id)
            .bind(sqlite_url(&dir.join(g.file)))
            .bind(g.database)
            .execute(&pool)
            .await
            .expect("insert credential");
    }
    pool.close().await;
    admin_url
}

pub fn test_config(admin_url: String) -> Config {
    Config {
        admin_database_url: admin_url,
        transaction_timeout_secs: 5,
        ..Config::default()
    }
}

pub struct TestEnv {
    pub dir: TempDir,
    pub client: GuildClient,
    pub reported: Arc<Mutex<Vec<String>>>,
}

/// Bootstrap a client over fresh stores, capturing every reported error.
pub async fn setup(guilds: &[GuildSpec<'_>]) -> TestEnv {
    setup_with(guilds, |cfg| cfg).await
}

pub async fn setup_with(
    guilds: &[GuildSpec<'_>],
    tweak: impl FnOnce(Config) -> Config,
) -> TestEnv {
    let dir = tempfile::tempdir().expect("tempdir");
    let admin_url = seed_directory(dir.path(), guilds).await;
    let cfg = tweak(test_config(admin_url));

    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = reported.clone();
    let client = GuildClient::connect(&cfg)
        .await
        .with_reporter(move |guild_id: &str, error: &StoreError| {
            sink.lock()
                .expect("reporter lock")
                .push(format!("{guild_id}: {error}"));
        });

    TestEnv {
        dir,
        client,
        reported,
    }
}

pub async fn insert_character(client: &GuildClient, guild_id: &str, character: &Character) {
    client
        .guild_db(guild_id)
        .expect("guild registered")
        .collection::<Character>()
        .insert_one(character, None)
        .await
        .expect("insert character");
}

pub fn character_with_money(player: &str, name: &str, money: f64) -> Character {
    let mut c = Character::new(player, name);
    c.money = money;
    c
}

pub async fn insert_exp_table(client: &GuildClient, guild_id: &str) {
    let table = ExpTable::new(BTreeMap::from([
        (0, "1".to_string()),
        (300, "2".to_string()),
        (900, "3".to_string()),
        (2_700, "4".to_string()),
    ]));
    client
        .guild_db(guild_id)
        .expect("guild registered")
        .collection::<ExpTable>()
        .upsert_one(&table, None)
        .await
        .expect("insert exp table");
}
