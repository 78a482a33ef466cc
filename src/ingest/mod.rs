// src/ingest/mod.rs
pub mod fetcher;
pub mod types;

use std::collections::HashSet;
use std::sync::Arc;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use tokio::task::JoinSet;
use tracing::warn;

use crate::ingest::types::{ArticleSource, RawEntry};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_entries_total",
            "Feed entries parsed across all sources."
        );
        describe_counter!(
            "ingest_skipped_total",
            "Entries dropped by the language gate or missing fields."
        );
        describe_counter!(
            "ingest_dedup_total",
            "Entries removed by in-batch URL deduplication."
        );
        describe_counter!("ingest_source_errors_total", "Source fetch/parse errors.");
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
        describe_counter!("cycle_runs_total", "Completed ingestion cycles.");
        describe_counter!("cycle_stored_total", "Records stored across all cycles.");
        describe_counter!(
            "enrich_fallback_total",
            "Enrichment calls that fell back to defaults."
        );
        describe_gauge!("cycle_last_run_ts", "Unix ts when the last cycle finished.");
    });
}

/// Run every configured source concurrently and merge the results.
///
/// Each source runs in its own task; a failing or panicking source is
/// logged and skipped without touching its siblings. The merged batch is
/// deduplicated by exact URL, first occurrence wins. Output order carries
/// no meaning.
pub async fn aggregate_all(sources: &[Arc<dyn ArticleSource>]) -> Vec<RawEntry> {
    ensure_metrics_described();

    let mut tasks: JoinSet<(String, anyhow::Result<Vec<RawEntry>>)> = JoinSet::new();
    for source in sources {
        let source = source.clone();
        tasks.spawn(async move {
            let name = source.name().to_string();
            (name, source.fetch_latest().await)
        });
    }

    let mut merged = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(mut batch))) => merged.append(&mut batch),
            Ok((name, Err(e))) => {
                warn!(source = %name, error = ?e, "source failed");
                counter!("ingest_source_errors_total").increment(1);
            }
            Err(e) => {
                warn!(error = ?e, "source task died");
                counter!("ingest_source_errors_total").increment(1);
            }
        }
    }

    dedup_by_url(merged)
}

/// Drop entries whose URL was already seen, preserving insertion order.
pub fn dedup_by_url(entries: Vec<RawEntry>) -> Vec<RawEntry> {
    let mut seen: HashSet<String> = HashSet::with_capacity(entries.len());
    let mut out = Vec::with_capacity(entries.len());
    let mut dropped = 0usize;
    for entry in entries {
        if seen.insert(entry.url.clone()) {
            out.push(entry);
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        counter!("ingest_dedup_total").increment(dropped as u64);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(url: &str, title: &str) -> RawEntry {
        RawEntry {
            title: title.to_string(),
            url: url.to_string(),
            raw_text: "text".to_string(),
            source: "test".to_string(),
            ecosystem_tag: "web3".to_string(),
            published_at: Utc::now(),
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence_in_order() {
        let batch = vec![
            entry("https://a.example/1", "first"),
            entry("https://a.example/2", "second"),
            entry("https://a.example/1", "duplicate of first"),
        ];
        let out = dedup_by_url(batch);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "first");
        assert_eq!(out[1].url, "https://a.example/2");
    }

    struct StaticSource(Vec<RawEntry>);

    #[async_trait::async_trait]
    impl ArticleSource for StaticSource {
        async fn fetch_latest(&self) -> anyhow::Result<Vec<RawEntry>> {
            Ok(self.0.clone())
        }
        fn name(&self) -> &str {
            "static"
        }
    }

    struct FailingSource;

    #[async_trait::async_trait]
    impl ArticleSource for FailingSource {
        async fn fetch_latest(&self) -> anyhow::Result<Vec<RawEntry>> {
            anyhow::bail!("boom")
        }
        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn failing_source_does_not_affect_siblings() {
        let sources: Vec<Arc<dyn ArticleSource>> = vec![
            Arc::new(StaticSource(vec![entry("https://a.example/1", "one")])),
            Arc::new(FailingSource),
            Arc::new(StaticSource(vec![entry("https://a.example/2", "two")])),
        ];
        let out = aggregate_all(&sources).await;
        assert_eq!(out.len(), 2);
    }

    #[tokio::test]
    async fn cross_source_urls_are_deduplicated() {
        let sources: Vec<Arc<dyn ArticleSource>> = vec![
            Arc::new(StaticSource(vec![entry("https://a.example/same", "one")])),
            Arc::new(StaticSource(vec![entry("https://a.example/same", "two")])),
        ];
        let out = aggregate_all(&sources).await;
        assert_eq!(out.len(), 1);
    }
}
