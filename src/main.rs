//! cep-race server.
//!
//! Loads configuration, installs tracing, and serves the lookup API.

use anyhow::Context;
use cep_race::api::rest::{AppState, create_router};
use cep_race::application::services::RaceExecutor;
use cep_race::config::{AppConfig, LogConfig, LogFormat};
use cep_race::infrastructure::sources::HttpFetcher;
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Races several CEP services and answers with the first valid result.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file (TOML, YAML, JSON, ...).
    #[arg(short, long, env = "CEP_RACE_CONFIG")]
    config: Option<String>,

    /// Address to listen on, overriding the configuration.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }

    init_tracing(&config.log);

    let addr = config.server.socket_addr()?;
    let registry = config.registry()?;
    info!(
        sources = registry.len(),
        timeout_ms = config.race.timeout_ms,
        "starting cep-race"
    );

    let fetcher = HttpFetcher::new(config.race.timeout_ms)?;
    debug!(backstop_ms = fetcher.timeout_ms(), "http fetcher ready");
    let executor = RaceExecutor::new(Arc::new(registry), Arc::new(fetcher), config.race.clone());
    let router = create_router(Arc::new(AppState::new(executor)));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    info!("shut down");
    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
}
