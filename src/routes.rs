use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::config::{ChannelConfig, SourceConfig};
use crate::db::Database;
use crate::feed::{Channel, RssItem};
use crate::fetcher::{merge_items, Fetcher};

pub const RSS_CONTENT_TYPE: &str = "application/rss+xml";
pub const XML_CONTENT_TYPE: &str = "application/xml";

pub struct BlogState {
    pub db: Arc<Database>,
    pub channel: ChannelConfig,
    pub max_items: Option<i64>,
}

pub struct AggregatorState {
    pub fetcher: Arc<Fetcher>,
    pub channel: ChannelConfig,
    pub sources: Vec<SourceConfig>,
    pub max_items: Option<usize>,
}

// Wrapper for XML responses
struct XmlFeed {
    content_type: &'static str,
    channel: Channel,
}

impl IntoResponse for XmlFeed {
    fn into_response(self) -> Response {
        match self.channel.to_xml() {
            Ok(xml) => ([(header::CONTENT_TYPE, self.content_type)], xml).into_response(),
            Err(err) => AppError(err.context("Failed to render feed")).into_response(),
        }
    }
}

/// Handler error. Only the outermost context message reaches the client.
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request failed: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}

pub fn blog_router(state: Arc<BlogState>) -> Router {
    Router::new()
        .route("/rss", get(blog_rss))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn aggregator_router(state: Arc<AggregatorState>) -> Router {
    Router::new()
        .route("/rss", get(aggregated_rss))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Route handlers
pub async fn blog_rss(State(state): State<Arc<BlogState>>) -> Result<impl IntoResponse, AppError> {
    let posts = state
        .db
        .fetch_posts(state.max_items)
        .await
        .context("Failed to fetch posts")?;

    let items = posts.into_iter().map(RssItem::from).collect();

    Ok(XmlFeed {
        content_type: RSS_CONTENT_TYPE,
        channel: Channel::new(&state.channel, items),
    })
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

pub async fn aggregated_rss(
    State(state): State<Arc<AggregatorState>>,
    Query(query): Query<FeedQuery>,
) -> impl IntoResponse {
    let batches = state.fetcher.fetch_all(&state.sources).await;
    let items = merge_items(batches, query.limit.or(state.max_items));

    XmlFeed {
        content_type: XML_CONTENT_TYPE,
        channel: Channel::new(&state.channel, items),
    }
}

pub async fn health() -> impl IntoResponse {
    "OK"
}
