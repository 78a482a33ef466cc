// src/language.rs
//! English-content gate.
//!
//! Two independent checks must both pass: an ASCII-letter ratio over the
//! non-whitespace characters, and a statistical language detector
//! (`whatlang`). Ratio alone passes many Latin-script languages; the
//! detector alone is unreliable on short noisy snippets. Requiring both
//! keeps false positives down on mixed-quality feeds. A detector miss
//! (ambiguous text) counts as rejection, never as an error.

use once_cell::sync::OnceCell;
use regex::Regex;
use whatlang::Lang;

pub const DEFAULT_MIN_ENGLISH_RATIO: f64 = 0.7;
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.6;

const MIN_TEXT_CHARS: usize = 10;
const MIN_COMBINED_CHARS: usize = 20;

fn re_ws() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

#[derive(Debug, Clone, Default)]
pub struct LanguageFilter;

impl LanguageFilter {
    pub fn new() -> Self {
        Self
    }

    /// Whether `text` is primarily English. Texts shorter than 10 chars
    /// after whitespace normalization are rejected outright.
    pub fn is_english(&self, text: &str, min_ratio: f64) -> bool {
        let normalized = re_ws().replace_all(text.trim(), " ").to_string();
        if normalized.chars().count() < MIN_TEXT_CHARS {
            return false;
        }

        let english_chars = normalized
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .count();
        let total_chars = normalized.chars().filter(|c| !c.is_whitespace()).count();
        if total_chars == 0 {
            return false;
        }
        let english_ratio = english_chars as f64 / total_chars as f64;

        let detected_english = whatlang::detect(&normalized)
            .map(|info| info.lang() == Lang::Eng)
            .unwrap_or(false);

        english_ratio >= min_ratio && detected_english
    }

    /// Gate for a feed entry: combined title+summary must be at least 20
    /// chars, then the English check runs with `min_confidence` as the
    /// ratio threshold.
    pub fn should_include(&self, title: &str, summary: &str, min_confidence: f64) -> bool {
        let combined = format!("{} {}", title, summary);
        if combined.trim().chars().count() < MIN_COMBINED_CHARS {
            return false;
        }
        self.is_english(&combined, min_confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_rejected() {
        let f = LanguageFilter::new();
        assert!(!f.is_english("hi", DEFAULT_MIN_ENGLISH_RATIO));
        assert!(!f.is_english("   a b   ", DEFAULT_MIN_ENGLISH_RATIO));
    }

    #[test]
    fn plain_english_passes() {
        let f = LanguageFilter::new();
        let text = "Ethereum developers shipped a new testnet upgrade this week, \
                    improving validator exits and fee estimation.";
        assert!(f.is_english(text, DEFAULT_MIN_ENGLISH_RATIO));
    }

    #[test]
    fn cyrillic_text_is_rejected() {
        let f = LanguageFilter::new();
        let text = "Разработчики выпустили крупное обновление сети на этой неделе";
        assert!(!f.is_english(text, DEFAULT_MIN_ENGLISH_RATIO));
    }

    #[test]
    fn latin_script_non_english_is_rejected_by_detector() {
        let f = LanguageFilter::new();
        // High ASCII ratio, but the detector should call it Spanish.
        let text = "El gobierno anuncia nuevas regulaciones para las criptomonedas \
                    y los mercados financieros durante la semana";
        assert!(!f.is_english(text, DEFAULT_MIN_ENGLISH_RATIO));
    }

    #[test]
    fn should_include_rejects_tiny_combined_text() {
        let f = LanguageFilter::new();
        assert!(!f.should_include("Hi", "there", DEFAULT_MIN_CONFIDENCE));
    }

    #[test]
    fn should_include_accepts_english_pair() {
        let f = LanguageFilter::new();
        assert!(f.should_include(
            "Layer 2 fees drop again",
            "Average transaction fees on major rollups fell sharply after the latest upgrade.",
            DEFAULT_MIN_CONFIDENCE
        ));
    }
}
