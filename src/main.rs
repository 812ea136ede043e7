use guildstore::{Config, GuildClient};
use mimalloc::MiMalloc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        admin_database_url = %cfg.admin_database_url,
        transaction_timeout_secs = cfg.transaction_timeout_secs,
        max_connections_per_guild = cfg.max_connections_per_guild,
        loglevel = %cfg.loglevel
    );

    let client = GuildClient::connect(&cfg).await;
    let registry = client.registry();
    if registry.is_empty() {
        warn!("no guild registered; every request will be rejected");
    } else {
        info!(guilds = ?registry.guild_ids(), "serving guilds");
    }

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    client.shutdown().await;
    Ok(())
}
