// src/legitimacy.rs
//! Heuristic legitimacy scoring: domain trust, content-quality keywords and
//! freshness combined into a single score in [0, 1].
//!
//! Pure functions of their inputs (plus an explicit `now` for freshness) so
//! the score is deterministic and testable. Scoring never aborts the
//! pipeline; anything unusable degrades to a neutral value.

use chrono::{DateTime, Utc};
use url::Url;

const SCAM_KEYWORDS: &[&str] = &[
    "free",
    "giveaway",
    "airdrop",
    "limited time",
    "urgent",
    "guaranteed",
    "100% return",
    "double your",
    "secret",
    "don't miss",
    "last chance",
    "exclusive",
    "click here",
    "sign up now",
    "limited supply",
    "once in a lifetime",
    "discount",
];

const TRUSTED_AUTHORS: &[&str] = &[
    "vitalik",
    "buterin",
    "paradigm",
    "a16z",
    "coinbase",
    "base",
    "ethereum",
    "official",
    "foundation",
    "solana",
    "farcaster",
    "snapshot",
    "governance",
];

const TRUSTED_DOMAINS: &[&str] = &[
    "ethereum.org",
    "blog.ethereum.org",
    "vitalik.ca",
    "base.org",
    "docs.base.org",
    "mirror.xyz",
    "farcaster.xyz",
    "warpcast.com",
    "snapshot.org",
    "medium.com",
    "research.paradigm.xyz",
    "a16zcrypto.com",
    "solana.com",
    "solana.org",
    "solana.foundation",
    "arbitrum.io",
    "optimism.io",
    "polygon.technology",
];

const TECHNICAL_TERMS: &[&str] = &[
    "tutorial",
    "guide",
    "explained",
    "research",
    "analysis",
    "technical",
];

// TLDs handed out free and heavily abused by throwaway scam sites.
const DISPOSABLE_TLDS: &[&str] = &[".tk", ".ml", ".ga", ".cf"];

#[derive(Debug, Clone, Default)]
pub struct LegitimacyChecker;

impl LegitimacyChecker {
    pub fn new() -> Self {
        Self
    }

    /// Domain trust: curated list hit -> 1.0, a medium.com publication ->
    /// 0.8, disposable TLD -> 0.1, unknown -> 0.5, unparsable URL -> 0.3.
    pub fn domain_score(&self, raw_url: &str) -> f64 {
        let Ok(parsed) = Url::parse(raw_url) else {
            return 0.3;
        };
        let Some(host) = parsed.host_str() else {
            return 0.3;
        };
        let domain = host
            .to_lowercase()
            .strip_prefix("www.")
            .map(str::to_string)
            .unwrap_or_else(|| host.to_lowercase());

        for trusted in TRUSTED_DOMAINS {
            if domain == *trusted || domain.ends_with(&format!(".{trusted}")) {
                return 1.0;
            }
        }
        if domain.contains("medium.com") {
            return 0.8;
        }
        if DISPOSABLE_TLDS.iter().any(|tld| domain.ends_with(tld)) {
            return 0.1;
        }
        0.5
    }

    /// Content quality: starts at 1.0, loses 0.15 per scam-keyword hit,
    /// gains 0.2 for a trusted-author token and 0.1 for a technical term,
    /// loses 0.2 for a shouting title; clamped to [0.1, 1.0].
    pub fn content_score(&self, title: &str, summary: &str) -> f64 {
        let text = format!("{} {}", title, summary).to_lowercase();
        let mut score = 1.0_f64;

        let scam_hits = SCAM_KEYWORDS.iter().filter(|k| text.contains(**k)).count();
        score -= scam_hits as f64 * 0.15;

        if TRUSTED_AUTHORS.iter().any(|a| text.contains(*a)) {
            score += 0.2;
        }
        if TECHNICAL_TERMS.iter().any(|t| text.contains(*t)) {
            score += 0.1;
        }

        let title_chars = title.chars().count();
        if title_chars > 0 {
            let upper = title.chars().filter(|c| c.is_uppercase()).count();
            if upper as f64 / title_chars as f64 > 0.7 {
                score -= 0.2;
            }
        }

        score.clamp(0.1, 1.0)
    }

    /// Freshness tiers: <=1 day 1.0, <=7 days 0.8, <=30 days 0.6, older
    /// 0.4. A timestamp ahead of `now` scores neutral 0.5.
    pub fn freshness_score(&self, published_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let age = now.signed_duration_since(published_at);
        if age.num_seconds() < 0 {
            return 0.5;
        }
        match age.num_days() {
            0..=1 => 1.0,
            2..=7 => 0.8,
            8..=30 => 0.6,
            _ => 0.4,
        }
    }

    /// Weighted total: 0.5*domain + 0.4*content + 0.1*freshness, rounded to
    /// two decimals.
    pub fn score(
        &self,
        title: &str,
        summary: &str,
        url: &str,
        published_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> f64 {
        let domain = self.domain_score(url);
        let content = self.content_score(title, summary);
        let freshness = self.freshness_score(published_at, now);
        let total = 0.5 * domain + 0.4 * content + 0.1 * freshness;
        (total * 100.0).round() / 100.0
    }
}
