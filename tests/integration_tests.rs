//! Integration tests for the RSS services
//!
//! These tests drive both services end to end: configuration files,
//! the SQLite-backed blog feed, and the aggregator against mock upstreams.

mod common {
    use tempfile::TempDir;

    /// Create a temporary directory for test databases
    pub fn create_temp_dir() -> TempDir {
        tempfile::tempdir().expect("Failed to create temp directory")
    }

    /// Create a test database path
    pub fn create_db_path(temp_dir: &TempDir) -> String {
        let db_path = temp_dir.path().join("test.db");
        format!("sqlite:{}?mode=rwc", db_path.display())
    }

    pub fn rss_document(items: &[(&str, &str, &str)]) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <rss version="2.0"><channel><title>Upstream</title>"#,
        );
        for (title, link, pub_date) in items {
            xml.push_str(&format!(
                "<item><title>{}</title><link>{}</link><pubDate>{}</pubDate></item>",
                title, link, pub_date
            ));
        }
        xml.push_str("</channel></rss>");
        xml
    }
}

#[cfg(test)]
mod config_integration_tests {
    use rss_services::config::{AggregatorConfig, BlogConfig};

    #[test]
    fn test_load_shipped_blog_config() {
        let config = BlogConfig::load("blog.toml");
        assert!(config.is_ok(), "Failed to load blog.toml: {:?}", config.err());

        let config = config.unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert!(!config.channel.title.is_empty());
    }

    #[test]
    fn test_load_shipped_aggregator_config() {
        let config = AggregatorConfig::load("aggregator.toml");
        assert!(
            config.is_ok(),
            "Failed to load aggregator.toml: {:?}",
            config.err()
        );

        let config = config.unwrap();
        assert!(!config.sources.is_empty(), "aggregator.toml should list sources");
        assert!(config.request_timeout_secs > 0);
    }
}

#[cfg(test)]
mod blog_feed_tests {
    use super::common::*;
    use axum_test::TestServer;
    use chrono::{TimeZone, Utc};
    use rss_services::config::ChannelConfig;
    use rss_services::db::Database;
    use rss_services::routes::{blog_router, BlogState};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_posts_persist_and_serve() {
        let temp_dir = create_temp_dir();
        let db_url = create_db_path(&temp_dir);

        {
            let db = Database::new(&db_url).await.unwrap();
            db.initialize().await.unwrap();
            db.insert_post(
                "Persistent Post",
                "https://example.com/persistent",
                "Survives a reopen",
                Utc.with_ymd_and_hms(2024, 12, 9, 12, 0, 0).unwrap(),
            )
            .await
            .unwrap();
        }

        // Reopen without reinitializing
        let db = Database::new(&db_url).await.unwrap();
        let state = Arc::new(BlogState {
            db: Arc::new(db),
            channel: ChannelConfig::default(),
            max_items: None,
        });
        let server = TestServer::new(blog_router(state)).unwrap();

        let response = server.get("/rss").await;
        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "application/rss+xml");

        let body = response.text();
        assert!(body.contains("<title>Persistent Post</title>"));
        assert!(body.contains("<pubDate>Mon, 09 Dec 2024 12:00:00 +0000</pubDate>"));

        let parsed = feed_rs::parser::parse(body.as_bytes()).unwrap();
        assert_eq!(parsed.entries.len(), 1);
    }
}

#[cfg(test)]
mod aggregator_tests {
    use super::common::*;
    use axum_test::TestServer;
    use rss_services::config::{ChannelConfig, SourceConfig};
    use rss_services::fetcher::Fetcher;
    use rss_services::routes::{aggregator_router, AggregatorState};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_feed(server: &MockServer, route: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/rss+xml")
                    .set_body_string(body),
            )
            .mount(server)
            .await;
    }

    fn source(server: &MockServer, name: &str, route: &str) -> SourceConfig {
        SourceConfig {
            name: name.to_string(),
            url: format!("{}{}", server.uri(), route),
        }
    }

    fn test_server(sources: Vec<SourceConfig>, max_items: Option<usize>) -> TestServer {
        let state = Arc::new(AggregatorState {
            fetcher: Arc::new(Fetcher::new(Duration::from_secs(5)).unwrap()),
            channel: ChannelConfig {
                title: "Aggregated".to_string(),
                link: "https://agg.example.com".to_string(),
                description: "Everything".to_string(),
            },
            sources,
            max_items,
        });
        TestServer::new(aggregator_router(state)).unwrap()
    }

    async fn upstream() -> MockServer {
        let server = MockServer::start().await;
        mount_feed(
            &server,
            "/alpha",
            rss_document(&[
                ("Alpha old", "https://alpha.example.com/1", "Sun, 08 Dec 2024 08:00:00 GMT"),
                ("Alpha new", "https://alpha.example.com/2", "Mon, 09 Dec 2024 11:00:00 GMT"),
            ]),
        )
        .await;
        mount_feed(
            &server,
            "/beta",
            rss_document(&[(
                "Beta mid",
                "https://beta.example.com/1",
                "Mon, 09 Dec 2024 09:00:00 GMT",
            )]),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_merges_sources_newest_first() {
        let server = upstream().await;
        let app = test_server(
            vec![source(&server, "Alpha", "/alpha"), source(&server, "Beta", "/beta")],
            None,
        );

        let response = app.get("/rss").await;
        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "application/xml");

        let body = response.text();
        let new = body.find("Alpha new").unwrap();
        let mid = body.find("Beta mid").unwrap();
        let old = body.find("Alpha old").unwrap();
        assert!(new < mid && mid < old);
        assert!(body.contains(&format!(r#"<source url="{}/beta">Beta</source>"#, server.uri())));
    }

    #[tokio::test]
    async fn test_failed_source_is_dropped() {
        let server = upstream().await;
        let app = test_server(
            vec![
                source(&server, "Broken", "/broken"),
                source(&server, "Beta", "/beta"),
            ],
            None,
        );

        let response = app.get("/rss").await;
        response.assert_status_ok();

        let parsed = feed_rs::parser::parse(response.text().as_bytes()).unwrap();
        assert_eq!(parsed.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_all_sources_failing_yields_empty_feed() {
        let server = upstream().await;
        let app = test_server(vec![source(&server, "Broken", "/broken")], None);

        let response = app.get("/rss").await;
        response.assert_status_ok();
        assert!(!response.text().contains("<item>"));
    }

    #[tokio::test]
    async fn test_limit_query_overrides_config() {
        let server = upstream().await;
        let app = test_server(
            vec![source(&server, "Alpha", "/alpha"), source(&server, "Beta", "/beta")],
            Some(1),
        );

        let body = app.get("/rss").await.text();
        assert_eq!(body.matches("<item>").count(), 1);

        let body = app.get("/rss").add_query_param("limit", 2).await.text();
        assert_eq!(body.matches("<item>").count(), 2);
    }

    #[tokio::test]
    async fn test_each_source_fetched_once_per_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/once"))
            .respond_with(ResponseTemplate::new(200).set_body_string(rss_document(&[(
                "Only",
                "https://once.example.com/1",
                "Mon, 09 Dec 2024 09:00:00 GMT",
            )])))
            .expect(1)
            .mount(&server)
            .await;

        let app = test_server(vec![source(&server, "Once", "/once")], None);
        app.get("/rss").await.assert_status_ok();

        server.verify().await;
    }
}
