mod common;

use common::{character_with_money, guild, insert_character, seed_directory, setup, test_config};
use guildstore::db::{CredentialDirectory, Filter, TenantCredential};
use guildstore::models::Character;
use guildstore::{GuildClient, GuildRegistry, StoreError};

#[tokio::test]
async fn registered_guild_resolves_and_unknown_guild_is_rejected() {
    let env = setup(&[guild("guildA", "a.sqlite", "db_a")]).await;

    let db = env.client.guild_db("guildA").expect("guildA is registered");
    assert_eq!(db.guild_id(), "guildA");
    assert_eq!(db.database(), "db_a");

    let err = env.client.guild_db("ghost").err().expect("ghost is unknown");
    assert!(err.is_tenant_not_found());
    assert!(matches!(err, StoreError::TenantNotFound(ref id) if id == "ghost"));
}

#[tokio::test]
async fn registry_lists_every_directory_record() {
    let env = setup(&[
        guild("guildB", "b.sqlite", "db_b"),
        guild("guildA", "a.sqlite", "db_a"),
    ])
    .await;

    let registry = env.client.registry();
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.guild_ids(), vec!["guildA", "guildB"]);
    assert!(registry.contains("guildB"));
    assert!(!registry.contains("guildC"));
}

#[tokio::test]
async fn directory_lists_credentials_in_guild_order() {
    let dir = tempfile::tempdir().unwrap();
    let admin_url = seed_directory(
        dir.path(),
        &[guild("z", "z.sqlite", "db_z"), guild("m", "m.sqlite", "db_m")],
    )
    .await;

    let directory = CredentialDirectory::connect(&admin_url).await.unwrap();
    let records = directory.list_credentials().await.unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.guild_id.as_str()).collect();
    assert_eq!(ids, vec!["m", "z"]);
    assert_eq!(records[0].database, "db_m");
    directory.close().await;
}

#[tokio::test]
async fn unreachable_directory_leaves_the_registry_empty() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-dir").join("admin.sqlite");
    let cfg = test_config(common::sqlite_url(&missing));

    let client = GuildClient::connect(&cfg).await;
    assert!(client.registry().is_empty());
    assert!(client.guild_db("guildA").unwrap_err().is_tenant_not_found());

    let outcome = client
        .transaction("guildA", |_session| Box::pin(async { Ok::<_, StoreError>(true) }))
        .await;
    assert!(outcome.unwrap_err().is_tenant_not_found());
}

#[tokio::test]
async fn empty_directory_rejects_every_guild() {
    let env = setup(&[]).await;
    assert!(env.client.registry().is_empty());
    assert!(env.client.guild_db("anything").unwrap_err().is_tenant_not_found());
}

#[tokio::test]
async fn records_with_unusable_database_names_are_skipped() {
    let env = setup(&[
        guild("good", "good.sqlite", "db_good"),
        guild("bad", "bad.sqlite", "db-bad; --"),
    ])
    .await;

    assert!(env.client.registry().contains("good"));
    assert!(env.client.guild_db("bad").unwrap_err().is_tenant_not_found());
}

#[tokio::test]
async fn duplicate_guild_ids_keep_the_first_record() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(common::sqlite_url(&dir.path().join("unused.sqlite")));
    let store = common::sqlite_url(&dir.path().join("shared.sqlite"));

    let registry = GuildRegistry::from_credentials(
        vec![
            TenantCredential::new("dup", store.clone(), "first"),
            TenantCredential::new("dup", store, "second"),
        ],
        &cfg,
    )
    .await;

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.guild_db("dup").unwrap().database(), "first");
}

#[tokio::test]
async fn guilds_sharing_a_store_file_stay_isolated() {
    let env = setup(&[
        guild("guildA", "shared.sqlite", "db_a"),
        guild("guildB", "shared.sqlite", "db_b"),
    ])
    .await;

    insert_character(&env.client, "guildA", &character_with_money("p1", "Aria", 100.0)).await;

    let in_b = env
        .client
        .guild_db("guildB")
        .unwrap()
        .collection::<Character>()
        .find(&Filter::All, None)
        .await
        .unwrap();
    assert!(in_b.is_empty());

    let in_a = env
        .client
        .characters()
        .get_character("guildA", "p1:Aria", None)
        .await
        .unwrap();
    assert_eq!(in_a.money, 100.0);

    let err = env
        .client
        .characters()
        .get_character("guildB", "p1:Aria", None)
        .await
        .unwrap_err();
    assert!(err.is_resource_not_found());
}

#[tokio::test]
async fn shutdown_closes_guild_connections() {
    let env = setup(&[guild("guildA", "a.sqlite", "db_a")]).await;
    env.client.shutdown().await;

    assert!(env.client.guild_db("guildA").unwrap().pool().is_closed());
    let outcome = env
        .client
        .transaction("guildA", |_session| Box::pin(async { Ok::<_, StoreError>(true) }))
        .await
        .unwrap();
    assert!(outcome.is_aborted());

    let reported = env.reported.lock().unwrap();
    assert_eq!(reported.len(), 1);
    assert!(reported[0].starts_with("guildA: Database error"));
}
