use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use feed_rs::parser;
use futures::future::join_all;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SourceConfig;
use crate::feed::{ItemSource, RssItem};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} when fetching {url}")]
    Status { status: StatusCode, url: String },

    #[error("Failed to parse feed: {0}")]
    Parse(#[from] parser::ParseFeedError),
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("RssServices/1.0 (Feed Aggregator)")
            .build()?;

        Ok(Self { client })
    }

    /// Fetch every source concurrently and wait for all of them.
    ///
    /// Sources that fail are logged and contribute nothing. The returned
    /// batches are in the same order as `sources`.
    pub async fn fetch_all(&self, sources: &[SourceConfig]) -> Vec<Vec<RssItem>> {
        let results = join_all(sources.iter().map(|source| self.fetch_source(source))).await;

        let mut batches = Vec::with_capacity(sources.len());
        for (source, result) in sources.iter().zip(results) {
            match result {
                Ok(items) => batches.push(items),
                Err(e) => warn!("Dropping source '{}' ({}): {}", source.name, source.url, e),
            }
        }

        info!(
            "Fetched {} of {} sources",
            batches.len(),
            sources.len()
        );
        batches
    }

    pub async fn fetch_source(&self, source: &SourceConfig) -> Result<Vec<RssItem>, FetchError> {
        debug!("Fetching feed: {} ({})", source.name, source.url);

        let response = self.client.get(&source.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: source.url.clone(),
            });
        }

        let bytes = response.bytes().await?;
        let parsed = parse_feed(&bytes)?;

        let items = Self::items_from_feed(source, parsed);
        debug!("Parsed {} items from '{}'", items.len(), source.name);
        Ok(items)
    }

    /// Convert parsed entries into items tagged with their source.
    pub fn items_from_feed(source: &SourceConfig, feed: feed_rs::model::Feed) -> Vec<RssItem> {
        let mut items = Vec::with_capacity(feed.entries.len());

        for entry in feed.entries {
            let title = entry
                .title
                .as_ref()
                .map(|t| t.content.clone())
                .unwrap_or_else(|| "Untitled".to_string());

            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();

            if link.is_empty() {
                warn!("Skipping entry with no link from '{}': {}", source.name, title);
                continue;
            }

            let description = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body));

            let pub_date: Option<DateTime<Utc>> = entry.published.or(entry.updated);

            let guid = if entry.id.is_empty() {
                None
            } else {
                Some(entry.id)
            };

            items.push(RssItem {
                title,
                link,
                description,
                pub_date,
                guid,
                source: Some(ItemSource {
                    name: source.name.clone(),
                    url: source.url.clone(),
                }),
            });
        }

        items
    }
}

/// Parse an upstream feed body.
///
/// Entries without an upstream id keep an empty one instead of a generated
/// hash, so only real guids are re-served.
pub fn parse_feed(bytes: &[u8]) -> Result<feed_rs::model::Feed, parser::ParseFeedError> {
    parser::Builder::new()
        .id_generator(|_, _, _| String::new())
        .build()
        .parse(bytes)
}

/// Flatten per-source batches into one list, newest first.
///
/// The first occurrence of a link wins. Items without a date sort after
/// dated ones; ties keep their batch order.
pub fn merge_items(batches: Vec<Vec<RssItem>>, max_items: Option<usize>) -> Vec<RssItem> {
    let mut seen = HashSet::new();
    let mut items: Vec<RssItem> = batches
        .into_iter()
        .flatten()
        .filter(|item| seen.insert(item.link.clone()))
        .collect();

    items.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));

    if let Some(max) = max_items {
        items.truncate(max);
    }
    items
}
