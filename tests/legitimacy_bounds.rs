// tests/legitimacy_bounds.rs
//! Property-style fuzz: score components stay inside their documented
//! ranges for arbitrary inputs.

use chrono::{Duration, Utc};
use rand::Rng;
use web3_news_aggregator::legitimacy::LegitimacyChecker;

fn random_text(rng: &mut impl Rng, max_len: usize) -> String {
    let len = rng.random_range(0..=max_len);
    (0..len)
        .map(|_| {
            // printable ASCII plus a sprinkle of non-ASCII
            if rng.random_range(0..10) == 0 {
                'é'
            } else {
                rng.random_range(0x20u8..0x7f) as char
            }
        })
        .collect()
}

fn random_url(rng: &mut impl Rng) -> String {
    match rng.random_range(0..4) {
        0 => format!("https://host{}.example/p", rng.random_range(0..1000)),
        1 => format!("https://sub.domain{}.tk/x", rng.random_range(0..1000)),
        2 => "https://blog.ethereum.org/post".to_string(),
        _ => random_text(rng, 40), // frequently not a URL at all
    }
}

#[test]
fn content_score_stays_in_documented_range() {
    let checker = LegitimacyChecker::new();
    let mut rng = rand::rng();
    for _ in 0..500 {
        let title = random_text(&mut rng, 120);
        let summary = random_text(&mut rng, 600);
        let score = checker.content_score(&title, &summary);
        assert!(
            (0.1..=1.0).contains(&score),
            "content score {score} out of range for title {title:?}"
        );
    }
}

#[test]
fn total_score_stays_in_unit_range() {
    let checker = LegitimacyChecker::new();
    let mut rng = rand::rng();
    let now = Utc::now();
    for _ in 0..500 {
        let title = random_text(&mut rng, 120);
        let summary = random_text(&mut rng, 600);
        let url = random_url(&mut rng);
        let published = now - Duration::days(rng.random_range(-5..400));
        let score = checker.score(&title, &summary, &url, published, now);
        assert!(
            (0.0..=1.0).contains(&score),
            "total score {score} out of range for url {url:?}"
        );
    }
}
