use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rss_services::config::AggregatorConfig;
use rss_services::fetcher::Fetcher;
use rss_services::routes::{aggregator_router, AggregatorState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "rss_services=info,feed_aggregator=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path =
        std::env::var("AGGREGATOR_CONFIG").unwrap_or_else(|_| "aggregator.toml".to_string());
    let config = AggregatorConfig::load(&config_path)?;
    info!("Loaded {} sources from {}", config.sources.len(), config_path);

    let fetcher = Fetcher::new(Duration::from_secs(config.request_timeout_secs))?;

    let state = Arc::new(AggregatorState {
        fetcher: Arc::new(fetcher),
        channel: config.channel.clone(),
        sources: config.sources.clone(),
        max_items: config.max_items,
    });

    let app = aggregator_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("Feed aggregator listening on http://{}/rss", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
