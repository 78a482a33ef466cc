// src/store.rs
//! Article store client. The store itself is an external collaborator; this
//! module only knows two operations: look a URL up and insert a record.
//!
//! The production implementation talks to a PostgREST-style endpoint with
//! service-role (write) credentials, kept separate from whatever public
//! read key the serving layer uses. `MemoryStore` backs the tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ENV_STORE_URL: &str = "STORE_URL";
pub const ENV_STORE_SERVICE_KEY: &str = "STORE_SERVICE_KEY";

/// The persisted article shape. Written exactly once per unique URL; this
/// pipeline never updates a stored row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArticleRecord {
    pub title: String,
    pub url: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub published_at: DateTime<Utc>,
    pub summary: String,
    pub ecosystem_tag: String,
    pub legitimacy_score: f64,
    pub sentiment_score: i32,
    pub is_processed: bool,
}

/// Minimal projection returned by the existence lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleRef {
    pub id: String,
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Look up a record by its canonical URL.
    async fn find_by_url(&self, url: &str) -> Result<Option<ArticleRef>>;
    /// Insert a new record; fails on conflict or transport error.
    async fn insert(&self, record: &ArticleRecord) -> Result<()>;
}

/// Store connection settings, part of the application config.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the store, e.g. `https://project.supabase.co`.
    pub base_url: String,
    /// Service-role key with write access.
    pub service_key: String,
}

/// PostgREST-backed store client.
pub struct RestArticleStore {
    http: reqwest::Client,
    endpoint: String,
    service_key: String,
}

impl RestArticleStore {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("web3-news-aggregator/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .context("building store http client")?;
        let endpoint = format!("{}/rest/v1/articles", config.base_url.trim_end_matches('/'));
        Ok(Self {
            http,
            endpoint,
            service_key: config.service_key.clone(),
        })
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

#[async_trait]
impl ArticleStore for RestArticleStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<ArticleRef>> {
        let filter = format!("eq.{url}");
        let resp = self
            .authed(self.http.get(&self.endpoint))
            .query(&[("select", "id"), ("url", filter.as_str()), ("limit", "1")])
            .send()
            .await
            .context("store lookup request")?;

        if !resp.status().is_success() {
            return Err(anyhow!("store lookup returned {}", resp.status()));
        }
        let mut rows: Vec<ArticleRef> = resp.json().await.context("store lookup body")?;
        Ok(rows.pop())
    }

    async fn insert(&self, record: &ArticleRecord) -> Result<()> {
        let resp = self
            .authed(self.http.post(&self.endpoint))
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .context("store insert request")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("store insert returned {status}: {body}"));
        }
        Ok(())
    }
}

/// In-memory store used by tests; optionally fails inserts for chosen URLs.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<String, ArticleRecord>>,
    failing_urls: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a stored URL, as if a previous cycle had inserted it.
    pub fn with_existing_url(self, url: &str) -> Self {
        let record = ArticleRecord {
            title: "existing".to_string(),
            url: url.to_string(),
            source: "seed".to_string(),
            created_at: Utc::now(),
            published_at: Utc::now(),
            summary: String::new(),
            ecosystem_tag: "web3".to_string(),
            legitimacy_score: 0.5,
            sentiment_score: 5,
            is_processed: false,
        };
        self.rows.lock().unwrap().insert(url.to_string(), record);
        self
    }

    pub fn with_failing_url(mut self, url: &str) -> Self {
        self.failing_urls.push(url.to_string());
        self
    }

    pub fn records(&self) -> Vec<ArticleRecord> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    pub fn get(&self, url: &str) -> Option<ArticleRecord> {
        self.rows.lock().unwrap().get(url).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<ArticleRef>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(url)
            .map(|_| ArticleRef { id: url.to_string() }))
    }

    async fn insert(&self, record: &ArticleRecord) -> Result<()> {
        if self.failing_urls.iter().any(|u| u == &record.url) {
            return Err(anyhow!("simulated insert failure for {}", record.url));
        }
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&record.url) {
            return Err(anyhow!("duplicate url {}", record.url));
        }
        rows.insert(record.url.clone(), record.clone());
        Ok(())
    }
}
