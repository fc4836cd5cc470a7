//! Sale Attribution — reconstructs which campaign/creative most plausibly
//! drove a purchase from a free-text sale notification.
//!
//! Main entry point that resolves the collaborators and starts the server.

use attribution_api::ApiServer;
use attribution_core::config::AppConfig;
use attribution_engine::AnalysisOrchestrator;
use attribution_integrations::{ConversionRegistrar, HttpEventWindowSource};
use attribution_store::resolve_store;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "sale-attribution")]
#[command(about = "Campaign attribution reconstruction for sale notifications")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "SALE_ATTRIBUTION__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "SALE_ATTRIBUTION__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Minutes on each side of the estimated click instant (overrides config)
    #[arg(long, env = "SALE_ATTRIBUTION__EVENTS__MARGIN_MINUTES")]
    margin_minutes: Option<u32>,

    /// Redis URL for the durable sale store (overrides config)
    #[arg(long, env = "SALE_ATTRIBUTION__STORE__REDIS_URL")]
    redis_url: Option<String>,

    /// Skip the Prometheus exporter
    #[arg(long, default_value_t = false)]
    no_metrics: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sale_attribution=info,attribution_engine=info,attribution_store=info,attribution_integrations=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Sale Attribution starting up");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(margin) = cli.margin_minutes {
        config.events.margin_minutes = margin;
    }
    if let Some(url) = cli.redis_url {
        config.store.redis_url = Some(url);
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        margin_minutes = config.events.margin_minutes,
        "Configuration loaded"
    );

    let events = HttpEventWindowSource::new(&config.events);
    if !events.is_configured() {
        warn!("Event source not configured, analyses will rank zero events");
    }

    let registrar = ConversionRegistrar::new(&config.registration);
    if !registrar.is_configured() {
        info!("Conversion registration not configured");
    }

    let store = resolve_store(&config.store).await;
    info!(backend = store.backend(), "Sale store resolved");

    let orchestrator = Arc::new(AnalysisOrchestrator::new(
        &config,
        Arc::new(events),
        store,
        Arc::new(registrar),
    ));

    let api_server = ApiServer::new(config, orchestrator);

    if !cli.no_metrics {
        if let Err(e) = api_server.start_metrics().await {
            error!(error = %e, "Failed to start metrics exporter");
        }
    }

    info!("Sale Attribution is ready to serve traffic");

    api_server.start_http().await?;

    Ok(())
}
