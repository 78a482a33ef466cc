// src/ecosystem.rs
//! Heuristic ecosystem tagging: coarse category labels derived from keyword
//! hits, used when a source has no fixed tag and as the fallback category
//! when enrichment is unavailable.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Catch-all tag for content that matches no ecosystem keyword.
pub const FALLBACK_TAG: &str = "web3";

// Ordered: first table with a hit wins.
const KEYWORD_TABLE: &[(&str, &[&str])] = &[
    ("ethereum", &["ethereum", "eth", "solidity", "evm", "vitalik"]),
    ("solana", &["solana", "sol", "sealevel", "anchor"]),
    ("base", &["base", "coinbase", "optimism"]),
    ("farcaster", &["farcaster", "warpcast", "cast"]),
    ("bitcoin", &["bitcoin", "btc", "lightning"]),
    ("polygon", &["polygon", "matic"]),
    ("arbitrum", &["arbitrum", "rollup"]),
    ("defi", &["defi", "aave", "uniswap", "compound", "maker", "staking"]),
    ("nft", &["nft", "opensea", "collectible"]),
    ("regulation", &["regulation", "sec", "regulatory", "lawsuit"]),
];

fn re_word() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?u)\b\w+\b").unwrap())
}

/// Detect a lowercase ecosystem tag from free text. Matches whole tokens,
/// not substrings, so "solution" does not count as "sol".
pub fn detect_ecosystem(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    let tokens: std::collections::HashSet<&str> = re_word()
        .find_iter(&lower)
        .map(|m| m.as_str())
        .collect();

    for (tag, keywords) in KEYWORD_TABLE {
        if keywords.iter().any(|k| tokens.contains(k)) {
            return tag;
        }
    }
    FALLBACK_TAG
}

/// Whether a tag is specific enough to skip enrichment for categorization
/// purposes. The catch-all tags carry no category signal.
pub fn is_specific(tag: &str) -> bool {
    !matches!(tag, FALLBACK_TAG | "general" | "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_ethereum_from_keywords() {
        assert_eq!(detect_ecosystem("Vitalik on the future of EVM rollouts"), "ethereum");
        assert_eq!(detect_ecosystem("New Solidity release notes"), "ethereum");
    }

    #[test]
    fn detects_defi_tokens() {
        assert_eq!(detect_ecosystem("Aave governance votes on new markets"), "defi");
    }

    #[test]
    fn matches_whole_tokens_only() {
        // "solution" must not hit the "sol" keyword.
        assert_eq!(detect_ecosystem("A scaling solution for payments"), FALLBACK_TAG);
    }

    #[test]
    fn unknown_content_falls_back() {
        assert_eq!(detect_ecosystem("Weekly community newsletter roundup"), FALLBACK_TAG);
    }

    #[test]
    fn specificity_of_tags() {
        assert!(is_specific("ethereum"));
        assert!(!is_specific("web3"));
        assert!(!is_specific("general"));
        assert!(!is_specific(""));
    }
}
