// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// One cleaned candidate article as produced by a source fetch. Lives only
/// within a single ingestion cycle; persistence happens via
/// `store::ArticleRecord`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RawEntry {
    pub title: String,
    /// Canonical article URL; the dedup key within and across cycles.
    pub url: String,
    pub raw_text: String,
    /// Short source tag, e.g. "medium", "ethereum".
    pub source: String,
    /// Lowercase ecosystem tag (fixed per source or keyword-detected).
    pub ecosystem_tag: String,
    /// Best-effort publication time; falls back to fetch time.
    pub published_at: DateTime<Utc>,
}

/// Configuration of one feed endpoint.
#[derive(Debug, Clone, serde::Deserialize, PartialEq, Eq)]
pub struct FeedSpec {
    pub name: String,
    pub url: String,
    /// Fixed ecosystem tag for single-topic sources; mixed-topic sources
    /// leave this unset and get keyword detection per entry.
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    15
}

#[async_trait::async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<RawEntry>>;
    fn name(&self) -> &str;
}
