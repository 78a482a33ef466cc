//! Web3 News Aggregator — Binary Entrypoint
//! Boots the ingestion scheduler and the Axum HTTP surface (health, manual
//! trigger, metrics).

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use web3_news_aggregator::api::{self, AppState};
use web3_news_aggregator::config::AppConfig;
use web3_news_aggregator::enrich;
use web3_news_aggregator::ingest::fetcher::{self, FeedSource};
use web3_news_aggregator::ingest::types::ArticleSource;
use web3_news_aggregator::metrics::Metrics;
use web3_news_aggregator::pipeline::Orchestrator;
use web3_news_aggregator::scheduler;
use web3_news_aggregator::store::RestArticleStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::load()?;
    let metrics = Metrics::init();

    let store = Arc::new(RestArticleStore::new(&config.store)?);
    let enrichment = enrich::build_client_from_config(&config.enrich);

    let client = fetcher::http_client(&config.fetch)?;
    let sources: Vec<Arc<dyn ArticleSource>> = config
        .sources
        .iter()
        .cloned()
        .map(|spec| Arc::new(FeedSource::new(spec, client.clone())) as Arc<dyn ArticleSource>)
        .collect();

    tracing::info!(
        sources = sources.len(),
        enrichment = enrichment.is_some(),
        interval_secs = config.scheduler.interval_secs,
        "starting ingestion service"
    );

    let orchestrator = Arc::new(Orchestrator::new(
        sources,
        store,
        enrichment,
        config.policy.clone(),
        std::time::Duration::from_secs(config.enrich.throttle_secs),
    ));

    scheduler::spawn_cycle_scheduler(config.scheduler, orchestrator.clone());

    let router = api::create_router(AppState { orchestrator }).merge(metrics.router());
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "http surface listening");
    axum::serve(listener, router).await.context("http server")?;

    Ok(())
}
