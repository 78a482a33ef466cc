// src/pipeline.rs
//! Ingestion orchestrator. One cycle walks
//! fetch -> store-dedup -> enrich -> persist and returns the number of
//! records actually written. Cycles never run concurrently: the scheduler
//! path waits on the cycle gate, the manual trigger reports busy instead.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use metrics::{counter, gauge};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::ecosystem;
use crate::enrich::{DynEnrichmentClient, Enrichment};
use crate::ingest;
use crate::ingest::types::{ArticleSource, RawEntry};
use crate::legitimacy::LegitimacyChecker;
use crate::store::{ArticleRecord, ArticleStore};

/// When to call the enrichment service for a candidate.
///
/// The conditional variant skips candidates whose heuristic tag is already
/// specific and whose cleaned text is long enough to stand as a summary,
/// cutting external-call volume. Treat this as a tunable policy, not a law.
#[derive(Debug, Clone)]
pub struct EnrichmentPolicy {
    /// Enrich every candidate, ignoring the heuristics below.
    pub always: bool,
    /// Minimum cleaned-text length that counts as "summary already good".
    pub min_summary_chars: usize,
}

impl Default for EnrichmentPolicy {
    fn default() -> Self {
        Self {
            always: false,
            min_summary_chars: 160,
        }
    }
}

impl EnrichmentPolicy {
    pub fn should_enrich(&self, entry: &RawEntry) -> bool {
        if self.always {
            return true;
        }
        !(ecosystem::is_specific(&entry.ecosystem_tag)
            && entry.raw_text.chars().count() >= self.min_summary_chars)
    }
}

pub struct Orchestrator {
    sources: Vec<Arc<dyn ArticleSource>>,
    store: Arc<dyn ArticleStore>,
    enrichment: Option<DynEnrichmentClient>,
    policy: EnrichmentPolicy,
    /// Pause between successive enrichment calls; skipped before the first
    /// call of a batch. A deliberate quota throttle, not incidental latency.
    throttle: Duration,
    checker: LegitimacyChecker,
    cycle_gate: Mutex<()>,
}

impl Orchestrator {
    pub fn new(
        sources: Vec<Arc<dyn ArticleSource>>,
        store: Arc<dyn ArticleStore>,
        enrichment: Option<DynEnrichmentClient>,
        policy: EnrichmentPolicy,
        throttle: Duration,
    ) -> Self {
        Self {
            sources,
            store,
            enrichment,
            policy,
            throttle,
            checker: LegitimacyChecker::new(),
            cycle_gate: Mutex::new(()),
        }
    }

    /// Run one full cycle, waiting for any in-flight cycle to finish first.
    pub async fn run_cycle(&self) -> usize {
        let _guard = self.cycle_gate.lock().await;
        self.run_cycle_inner().await
    }

    /// Run one cycle unless one is already in flight.
    pub async fn try_run_cycle(&self) -> Option<usize> {
        let Ok(_guard) = self.cycle_gate.try_lock() else {
            return None;
        };
        Some(self.run_cycle_inner().await)
    }

    async fn run_cycle_inner(&self) -> usize {
        let candidates = ingest::aggregate_all(&self.sources).await;
        if candidates.is_empty() {
            info!("no articles found this cycle");
            return 0;
        }
        info!(candidates = candidates.len(), "starting enrich/persist pass");

        let mut stored = 0usize;
        let mut enrich_calls = 0usize;
        for entry in candidates {
            let url = entry.url.clone();
            match self.process_candidate(entry, &mut enrich_calls).await {
                Ok(true) => stored += 1,
                Ok(false) => {}
                // One bad record never aborts the cycle.
                Err(e) => warn!(%url, error = ?e, "candidate failed"),
            }
        }

        counter!("cycle_runs_total").increment(1);
        counter!("cycle_stored_total").increment(stored as u64);
        gauge!("cycle_last_run_ts").set(Utc::now().timestamp() as f64);
        info!(stored, "cycle finished");
        stored
    }

    async fn process_candidate(
        &self,
        entry: RawEntry,
        enrich_calls: &mut usize,
    ) -> Result<bool> {
        // Authoritative cross-cycle dedup; the in-batch URL dedup only
        // avoids redundant work within this cycle.
        if self.store.find_by_url(&entry.url).await?.is_some() {
            debug!(url = %entry.url, "already stored, skipping");
            return Ok(false);
        }

        let (enrichment, processed) = self.enrich_candidate(&entry, enrich_calls).await;

        let record = ArticleRecord {
            title: entry.title,
            url: entry.url,
            source: entry.source,
            created_at: Utc::now(),
            published_at: entry.published_at,
            summary: enrichment.summary,
            // Lowercased so tag-based filtering stays case-insensitive.
            ecosystem_tag: enrichment.ecosystem_tag.to_lowercase(),
            legitimacy_score: enrichment.legitimacy_score,
            sentiment_score: enrichment.sentiment_score,
            is_processed: processed,
        };

        self.store.insert(&record).await?;
        info!(url = %record.url, score = record.legitimacy_score, "stored article");
        Ok(true)
    }

    /// Returns the enrichment to persist and whether it came from the
    /// external service (as opposed to heuristic defaults).
    async fn enrich_candidate(
        &self,
        entry: &RawEntry,
        enrich_calls: &mut usize,
    ) -> (Enrichment, bool) {
        let client = match &self.enrichment {
            Some(client) if self.policy.should_enrich(entry) => client,
            _ => return (self.heuristic_enrichment(entry), false),
        };

        if *enrich_calls > 0 && !self.throttle.is_zero() {
            tokio::time::sleep(self.throttle).await;
        }
        *enrich_calls += 1;

        match client.analyze(&entry.title, &entry.raw_text).await {
            Some(enrichment) => (enrichment, true),
            None => {
                counter!("enrich_fallback_total").increment(1);
                let mut fallback = Enrichment::fallback();
                // Keep the heuristic category rather than the generic one.
                fallback.ecosystem_tag = entry.ecosystem_tag.clone();
                (fallback, false)
            }
        }
    }

    fn heuristic_enrichment(&self, entry: &RawEntry) -> Enrichment {
        let summary = if entry.raw_text.is_empty() {
            entry.title.clone()
        } else {
            entry.raw_text.clone()
        };
        Enrichment {
            summary,
            sentiment_score: 5,
            ecosystem_tag: entry.ecosystem_tag.clone(),
            legitimacy_score: self.checker.score(
                &entry.title,
                &entry.raw_text,
                &entry.url,
                entry.published_at,
                Utc::now(),
            ),
        }
    }
}
