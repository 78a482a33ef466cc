// src/ingest/fetcher.rs
//! HTTP feed source: fetches one RSS/Atom/JSON endpoint, parses it and
//! emits cleaned, language-gated `RawEntry` candidates.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use metrics::{counter, histogram};
use tracing::{debug, warn};

use crate::ingest::types::{ArticleSource, FeedSpec, RawEntry};
use crate::language::{LanguageFilter, DEFAULT_MIN_CONFIDENCE};
use crate::normalize;
use crate::{ecosystem, ingest};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_TEXT_CHARS: usize = 3000;

/// HTTP client settings shared by all feed sources.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Realistic browser user-agent; several feed hosts reject obvious bots.
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Bind the client to an IPv4 local address. Some feed hosts publish
    /// AAAA records but fail to connect over IPv6 in constrained networks;
    /// scoping the policy to this client keeps the rest of the process
    /// unaffected.
    pub ipv4_only: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            timeout_secs: 30,
            ipv4_only: true,
        }
    }
}

/// Build the shared reqwest client for feed fetching.
pub fn http_client(config: &FetchConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs));
    if config.ipv4_only {
        builder = builder.local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }
    builder.build().context("building feed http client")
}

/// One configured feed endpoint, fetched over HTTP.
pub struct FeedSource {
    spec: FeedSpec,
    client: reqwest::Client,
    language: LanguageFilter,
}

impl FeedSource {
    pub fn new(spec: FeedSpec, client: reqwest::Client) -> Self {
        Self {
            spec,
            client,
            language: LanguageFilter::new(),
        }
    }
}

#[async_trait]
impl ArticleSource for FeedSource {
    /// Fetch and parse the feed. A failed fetch or an unparsable body is
    /// logged and yields an empty batch; it never propagates.
    async fn fetch_latest(&self) -> Result<Vec<RawEntry>> {
        let resp = match self.client.get(&self.spec.url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(source = %self.spec.name, url = %self.spec.url, error = ?e, "feed fetch failed");
                counter!("ingest_source_errors_total").increment(1);
                return Ok(Vec::new());
            }
        };

        if !resp.status().is_success() {
            warn!(
                source = %self.spec.name,
                url = %self.spec.url,
                status = resp.status().as_u16(),
                "feed returned non-success status"
            );
            counter!("ingest_source_errors_total").increment(1);
            return Ok(Vec::new());
        }

        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(source = %self.spec.name, error = ?e, "reading feed body failed");
                counter!("ingest_source_errors_total").increment(1);
                return Ok(Vec::new());
            }
        };

        Ok(parse_feed_body(
            &self.spec,
            &self.language,
            &body,
            Utc::now(),
        ))
    }

    fn name(&self) -> &str {
        &self.spec.name
    }
}

/// Parse a feed body into cleaned candidates. Malformed documents yield an
/// empty batch; malformed entries are skipped individually.
pub fn parse_feed_body(
    spec: &FeedSpec,
    language: &LanguageFilter,
    body: &str,
    now: DateTime<Utc>,
) -> Vec<RawEntry> {
    let t0 = std::time::Instant::now();
    ingest::ensure_metrics_described();

    let feed = match feed_rs::parser::parse(body.as_bytes()) {
        Ok(feed) => feed,
        Err(e) => {
            warn!(source = %spec.name, error = ?e, "feed body did not parse");
            counter!("ingest_source_errors_total").increment(1);
            return Vec::new();
        }
    };

    let mut out = Vec::new();
    for entry in feed.entries.into_iter().take(spec.limit) {
        counter!("ingest_entries_total").increment(1);
        match build_entry(spec, language, entry, now) {
            Some(raw) => out.push(raw),
            None => {
                counter!("ingest_skipped_total").increment(1);
            }
        }
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms").record(ms);
    debug!(source = %spec.name, kept = out.len(), "parsed feed");
    out
}

fn build_entry(
    spec: &FeedSpec,
    language: &LanguageFilter,
    entry: Entry,
    now: DateTime<Utc>,
) -> Option<RawEntry> {
    let url = entry.links.first().map(|l| l.href.clone())?;
    let raw_title = entry.title.as_ref().map(|t| t.content.clone())?;

    let text = normalize::clean(entry_text(&entry).unwrap_or_default());
    let title = normalize::clean(&raw_title);

    if !language.should_include(&title, &text, DEFAULT_MIN_CONFIDENCE) {
        debug!(source = %spec.name, %url, "skipping non-English entry");
        return None;
    }

    let title = normalize::truncate(&title, MAX_TITLE_CHARS);
    let text = normalize::truncate(&text, MAX_TEXT_CHARS);

    let ecosystem_tag = match &spec.tag {
        Some(tag) => tag.to_lowercase(),
        None => ecosystem::detect_ecosystem(&format!("{} {}", title, text)).to_string(),
    };

    Some(RawEntry {
        title,
        url,
        raw_text: text,
        source: spec.name.clone(),
        ecosystem_tag,
        published_at: entry_timestamp(&entry, now),
    })
}

/// Ordered fallback over the fields feeds actually use for the body:
/// structured content first, then the summary (RSS `<description>` lands
/// here), then a media description.
pub fn entry_text(entry: &Entry) -> Option<&str> {
    if let Some(body) = entry.content.as_ref().and_then(|c| c.body.as_deref()) {
        return Some(body);
    }
    if let Some(summary) = entry.summary.as_ref() {
        return Some(&summary.content);
    }
    entry
        .media
        .iter()
        .find_map(|m| m.description.as_ref())
        .map(|t| t.content.as_str())
}

/// Publication time: published, then updated, then `now`. Raw date strings
/// are already handled leniently by the feed parser; a missing or bad date
/// never drops the entry.
pub fn entry_timestamp(entry: &Entry, now: DateTime<Utc>) -> DateTime<Utc> {
    entry.published.or(entry.updated).unwrap_or(now)
}
