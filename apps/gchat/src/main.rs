use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

mod cli;

use gchat_common::{API_KEY_ENV, GlobalConfigPatch};
use gchat_core::Relay;
use gchat_router::chat_router;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("gchat failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut patch = GlobalConfigPatch::default();
    patch.overlay(cli.into_patch());
    let config = patch.into_config().context("invalid configuration")?;

    info!(
        host = %config.host,
        port = config.port,
        base_url = %config.base_url,
        model = %config.model,
        stream_model = %config.stream_model,
        api_key_present = config.credential.is_present(),
        proxy = %config.proxy.as_deref().unwrap_or(""),
        "config loaded"
    );
    if !config.credential.is_present() {
        warn!("{API_KEY_ENV} is not set; chat requests will fail until it is provided");
    }

    let bind = config.bind_addr();
    let relay = Relay::from_config(config).context("failed to build upstream client")?;
    let app = chat_router(relay);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(addr = %bind, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("gchat=info,gchat_core=info,gchat_router=info")
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
