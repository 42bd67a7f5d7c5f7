use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;

/// Metadata for the `<channel>` element of a served feed.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChannelConfig {
    #[serde(default = "default_channel_title")]
    pub title: String,
    #[serde(default = "default_channel_link")]
    pub link: String,
    #[serde(default = "default_channel_description")]
    pub description: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            title: default_channel_title(),
            link: default_channel_link(),
            description: default_channel_description(),
        }
    }
}

fn default_channel_title() -> String {
    "My Blog".to_string()
}

fn default_channel_link() -> String {
    "https://example.com".to_string()
}

fn default_channel_description() -> String {
    "Latest blog posts".to_string()
}

/// Configuration for the blog feed service.
#[derive(Debug, Deserialize, Clone)]
pub struct BlogConfig {
    #[serde(default = "default_blog_bind")]
    pub bind: String,
    /// Maximum number of posts in the feed; unlimited when absent
    #[serde(default)]
    pub max_items: Option<i64>,
    #[serde(default)]
    pub channel: ChannelConfig,
}

fn default_blog_bind() -> String {
    "0.0.0.0:8080".to_string()
}

/// Configuration for the feed aggregator service.
#[derive(Debug, Deserialize, Clone)]
pub struct AggregatorConfig {
    #[serde(default = "default_aggregator_bind")]
    pub bind: String,
    /// Per-source request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub max_items: Option<usize>,
    #[serde(default)]
    pub channel: ChannelConfig,
    pub sources: Vec<SourceConfig>,
}

fn default_aggregator_bind() -> String {
    "0.0.0.0:8081".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
}

fn load_toml<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

impl BlogConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        load_toml(path)
    }

    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

impl AggregatorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        load_toml(path)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
