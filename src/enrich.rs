// src/enrich.rs
//! LLM enrichment gateway: provider abstraction over a single
//! prompt/response call that turns an article into a summary, sentiment,
//! ecosystem tag and legitimacy estimate.
//!
//! Every failure mode (network, quota, non-JSON output) surfaces as `None`
//! from the client; callers substitute `Enrichment::fallback()`. Nothing in
//! here may abort an ingestion cycle.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Bound on the text shipped to the model, to respect its context window.
const INPUT_CHAR_BUDGET: usize = 4000;

pub const ENV_TEST_MODE: &str = "ENRICH_TEST_MODE";
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";

const DEFAULT_MODEL: &str = "gemini-flash-latest";

/// Structured fields expected back from the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Enrichment {
    pub summary: String,
    pub sentiment_score: i32,
    pub ecosystem_tag: String,
    pub legitimacy_score: f64,
}

impl Enrichment {
    /// Defaults used whenever the enrichment call fails.
    pub fn fallback() -> Self {
        Self {
            summary: "Analysis unavailable.".to_string(),
            sentiment_score: 5,
            ecosystem_tag: "general".to_string(),
            legitimacy_score: 0.5,
        }
    }

    /// Clamp model output into the documented ranges.
    fn normalized(mut self) -> Self {
        self.sentiment_score = self.sentiment_score.clamp(1, 10);
        self.legitimacy_score = self.legitimacy_score.clamp(0.0, 1.0);
        self
    }
}

#[async_trait]
pub trait EnrichmentClient: Send + Sync {
    /// Analyze an article; `None` on any failure.
    async fn analyze(&self, title: &str, text: &str) -> Option<Enrichment>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynEnrichmentClient = Arc<dyn EnrichmentClient>;

/// Enrichment settings, part of the application config.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub enabled: bool,
    pub api_key: String,
    pub model: String,
    /// Pause between successive enrichment calls within one cycle.
    pub throttle_secs: u64,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            throttle_secs: 2,
        }
    }
}

/// Factory: build a client according to config and environment.
///
/// * `ENRICH_TEST_MODE=mock` returns a deterministic mock client.
/// * Disabled config or a missing API key returns `None`; the pipeline then
///   persists heuristic defaults without attempting calls.
pub fn build_client_from_config(config: &EnrichConfig) -> Option<DynEnrichmentClient> {
    if std::env::var(ENV_TEST_MODE)
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Some(Arc::new(MockClient::fixed(Enrichment {
            summary: "Neutral summary (mock).".to_string(),
            sentiment_score: 5,
            ecosystem_tag: "general".to_string(),
            legitimacy_score: 0.5,
        })));
    }
    if !config.enabled {
        return None;
    }
    if config.api_key.is_empty() {
        warn!("enrichment enabled but no API key set; running without enrichment");
        return None;
    }
    Some(Arc::new(GeminiClient::new(
        config.api_key.clone(),
        Some(&config.model),
    )))
}

// ------------------------------------------------------------
// Gemini provider
// ------------------------------------------------------------

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model_override: Option<&str>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("web3-news-aggregator/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(20))
            .build()
            .expect("reqwest client");
        let model = model_override.unwrap_or(DEFAULT_MODEL).to_string();
        Self {
            http,
            api_key,
            model,
        }
    }

    fn prompt(title: &str, text: &str) -> String {
        let full = format!("{}\n\n{}", title, text);
        let mut body: String = full.chars().take(INPUT_CHAR_BUDGET).collect();
        if full.chars().count() > INPUT_CHAR_BUDGET {
            body.push_str(" (truncated)");
        }
        format!(
            "You are a Web3 intelligence analyst. Analyze this article.\n\n\
             {body}\n\n\
             Respond ONLY with a valid JSON object containing:\n\
             1. \"summary\": A 2-sentence summary.\n\
             2. \"sentiment_score\": Integer 1-10 (1=Bearish, 10=Bullish).\n\
             3. \"ecosystem_tag\": One of [ethereum, solana, base, defi, nft, regulation, general].\n\
             4. \"legitimacy_score\": Float 0.0 to 1.0 (0.0 = Scam/Spam, 1.0 = Highly Trusted Source)."
        )
    }
}

#[async_trait]
impl EnrichmentClient for GeminiClient {
    async fn analyze(&self, title: &str, text: &str) -> Option<Enrichment> {
        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }
        #[derive(Serialize)]
        struct Content<'a> {
            parts: Vec<Part<'a>>,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            contents: Vec<Content<'a>>,
        }
        #[derive(Deserialize)]
        struct Resp {
            candidates: Vec<Candidate>,
        }
        #[derive(Deserialize)]
        struct Candidate {
            content: RespContent,
        }
        #[derive(Deserialize)]
        struct RespContent {
            parts: Vec<RespPart>,
        }
        #[derive(Deserialize)]
        struct RespPart {
            text: String,
        }

        let prompt = Self::prompt(title, text);
        let req = Req {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&req)
            .send()
            .await
            .ok()?;

        if !resp.status().is_success() {
            warn!(status = resp.status().as_u16(), "enrichment call rejected");
            return None;
        }

        let body: Resp = resp.json().await.ok()?;
        let raw = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())?;
        parse_enrichment(raw)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

/// Parse the model's answer: strip code fences, then require a single JSON
/// object with the expected fields. Anything else is a miss.
pub fn parse_enrichment(raw: &str) -> Option<Enrichment> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str::<Enrichment>(&cleaned)
        .ok()
        .map(Enrichment::normalized)
}

fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

// ------------------------------------------------------------
// Test/wiring clients
// ------------------------------------------------------------

/// Always answers `None`; stands in for a dead or unconfigured provider.
pub struct DisabledClient;

#[async_trait]
impl EnrichmentClient for DisabledClient {
    async fn analyze(&self, _title: &str, _text: &str) -> Option<Enrichment> {
        None
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic client for tests and local runs.
pub struct MockClient {
    fixed: Enrichment,
}

impl MockClient {
    pub fn fixed(fixed: Enrichment) -> Self {
        Self { fixed }
    }
}

#[async_trait]
impl EnrichmentClient for MockClient {
    async fn analyze(&self, _title: &str, _text: &str) -> Option<Enrichment> {
        Some(self.fixed.clone().normalized())
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
