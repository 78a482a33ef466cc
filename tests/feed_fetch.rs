// tests/feed_fetch.rs
//! Fetch behavior against a local HTTP server: happy path, non-200 and
//! garbage bodies all stay inside the source boundary.

use std::sync::Arc;

use axum::{routing::get, Router};
use web3_news_aggregator::ingest::fetcher::{http_client, FeedSource, FetchConfig};
use web3_news_aggregator::ingest::types::{ArticleSource, FeedSpec};
use web3_news_aggregator::ingest::{aggregate_all, dedup_by_url};

const FEED_XML: &str = include_str!("fixtures/web3_feed.xml");

async fn spawn_feed_server() -> String {
    let app = Router::new()
        .route(
            "/feed.xml",
            get(|| async {
                (
                    [("content-type", "application/rss+xml")],
                    FEED_XML.to_string(),
                )
            }),
        )
        .route(
            "/bad",
            get(|| async {
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "server exploded",
                )
            }),
        )
        .route("/garbage", get(|| async { "not a feed at all {]" }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn spec(name: &str, url: String) -> FeedSpec {
    FeedSpec {
        name: name.to_string(),
        url,
        tag: None,
        limit: 15,
    }
}

#[tokio::test]
async fn fetches_and_cleans_entries() {
    let base = spawn_feed_server().await;
    let client = http_client(&FetchConfig::default()).unwrap();
    let source = FeedSource::new(spec("fixture", format!("{base}/feed.xml")), client);

    let entries = source.fetch_latest().await.unwrap();
    let entries = dedup_by_url(entries);

    // 4 items: one is non-English, one is a duplicate URL.
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| !e.raw_text.contains('<')));
    assert!(entries.iter().all(|e| e.title.chars().count() <= 200));
    assert!(entries.iter().all(|e| e.raw_text.chars().count() <= 3000));
    assert!(entries
        .iter()
        .all(|e| !e.url.is_empty() && e.source == "fixture"));
}

#[tokio::test]
async fn non_success_status_yields_empty_batch() {
    let base = spawn_feed_server().await;
    let client = http_client(&FetchConfig::default()).unwrap();
    let source = FeedSource::new(spec("bad", format!("{base}/bad")), client);

    let entries = source.fetch_latest().await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn unparsable_body_yields_empty_batch() {
    let base = spawn_feed_server().await;
    let client = http_client(&FetchConfig::default()).unwrap();
    let source = FeedSource::new(spec("garbage", format!("{base}/garbage")), client);

    let entries = source.fetch_latest().await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn unreachable_host_yields_empty_batch() {
    let client = http_client(&FetchConfig {
        timeout_secs: 2,
        ..FetchConfig::default()
    })
    .unwrap();
    // Nothing listens on this port.
    let source = FeedSource::new(
        spec("offline", "http://127.0.0.1:9/feed.xml".to_string()),
        client,
    );
    let entries = source.fetch_latest().await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn aggregation_merges_and_dedups_across_sources() {
    let base = spawn_feed_server().await;
    let client = http_client(&FetchConfig::default()).unwrap();

    // The same feed twice plus a failing endpoint: output must still be
    // URL-unique and the failure must not suppress the good source.
    let sources: Vec<Arc<dyn ArticleSource>> = vec![
        Arc::new(FeedSource::new(
            spec("a", format!("{base}/feed.xml")),
            client.clone(),
        )),
        Arc::new(FeedSource::new(
            spec("b", format!("{base}/feed.xml")),
            client.clone(),
        )),
        Arc::new(FeedSource::new(spec("c", format!("{base}/bad")), client)),
    ];

    let merged = aggregate_all(&sources).await;
    let mut urls: Vec<&str> = merged.iter().map(|e| e.url.as_str()).collect();
    let total = urls.len();
    urls.sort();
    urls.dedup();
    assert_eq!(urls.len(), total, "aggregated output must be URL-unique");
    assert_eq!(total, 2);
}
