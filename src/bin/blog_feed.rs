use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rss_services::config::BlogConfig;
use rss_services::db::Database;
use rss_services::routes::{blog_router, BlogState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rss_services=info,blog_feed=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::var("BLOG_CONFIG").unwrap_or_else(|_| "blog.toml".to_string());
    let config = BlogConfig::load(&config_path)?;
    info!("Loaded configuration from {}", config_path);

    // Initialize database
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:blog.db?mode=rwc".to_string());
    let db = Database::new(&database_url).await?;
    db.initialize().await?;
    info!("Database initialized");

    let state = Arc::new(BlogState {
        db: Arc::new(db),
        channel: config.channel.clone(),
        max_items: config.max_items,
    });

    let app = blog_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("Blog feed listening on http://{}/rss", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
