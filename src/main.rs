use anyhow::Context;
use clap::Parser;
use tiny_redis::{
    config::{Cli, ServerConfig},
    server::RedisServer,
};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tiny_redis=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let config = ServerConfig::from_cli(Cli::parse()).context("invalid configuration")?;
    info!(
        address = %config.listen_address(),
        auth = config.password.is_some(),
        replicaof = ?config.replication.as_ref().map(|replication| replication.master_address()),
        "starting tiny-redis"
    );

    let server = RedisServer::bind(config).await?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down");
            shutdown.cancel();
        }
    });

    server.run(cancel).await.context("server stopped")?;

    Ok(())
}
