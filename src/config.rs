// src/config.rs
//! Application configuration. Built once in `main` and passed into each
//! component constructor; nothing in the pipeline reads the environment or
//! global state at runtime.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::enrich::{EnrichConfig, ENV_API_KEY};
use crate::ingest::fetcher::FetchConfig;
use crate::ingest::types::FeedSpec;
use crate::pipeline::EnrichmentPolicy;
use crate::scheduler::SchedulerCfg;
use crate::store::{StoreConfig, ENV_STORE_SERVICE_KEY, ENV_STORE_URL};

pub const ENV_SOURCES_PATH: &str = "SOURCES_CONFIG_PATH";
pub const DEFAULT_SOURCES_PATH: &str = "config/sources.toml";

pub const ENV_ENRICH_ENABLED: &str = "ENRICH_ENABLED";
pub const ENV_ENRICH_ALWAYS: &str = "ENRICH_ALWAYS";
pub const ENV_ENRICH_THROTTLE_SECS: &str = "ENRICH_THROTTLE_SECS";
pub const ENV_SCHED_INTERVAL_SECS: &str = "SCHED_INTERVAL_SECS";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sources: Vec<FeedSpec>,
    pub fetch: FetchConfig,
    pub store: StoreConfig,
    pub enrich: EnrichConfig,
    pub policy: EnrichmentPolicy,
    pub scheduler: SchedulerCfg,
    pub bind_addr: String,
}

impl AppConfig {
    /// Assemble the full configuration from the environment and the source
    /// list file. Store credentials are required; everything else has
    /// defaults.
    pub fn load() -> Result<Self> {
        let sources = load_sources_default()?;

        let store = StoreConfig {
            base_url: std::env::var(ENV_STORE_URL)
                .context("STORE_URL must be set (article store base URL)")?,
            service_key: std::env::var(ENV_STORE_SERVICE_KEY)
                .context("STORE_SERVICE_KEY must be set (write credentials)")?,
        };

        let enrich = EnrichConfig {
            enabled: env_bool(ENV_ENRICH_ENABLED, false),
            api_key: std::env::var(ENV_API_KEY).unwrap_or_default(),
            throttle_secs: env_u64(ENV_ENRICH_THROTTLE_SECS, 2),
            ..Default::default()
        };

        let policy = EnrichmentPolicy {
            always: env_bool(ENV_ENRICH_ALWAYS, false),
            ..Default::default()
        };

        let scheduler = SchedulerCfg {
            interval_secs: env_u64(ENV_SCHED_INTERVAL_SECS, 30 * 60),
        };

        let bind_addr =
            std::env::var(ENV_BIND_ADDR).unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        Ok(Self {
            sources,
            fetch: FetchConfig::default(),
            store,
            enrich,
            policy,
            scheduler,
            bind_addr,
        })
    }
}

/// Load the source list from an explicit TOML file.
pub fn load_sources_from(path: &Path) -> Result<Vec<FeedSpec>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    parse_sources(&content)
}

/// Load the source list using env var + fallbacks:
/// 1) $SOURCES_CONFIG_PATH (must exist when set)
/// 2) config/sources.toml
/// 3) the built-in default Web3 source set
pub fn load_sources_default() -> Result<Vec<FeedSpec>> {
    if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        }
        return Err(anyhow!("SOURCES_CONFIG_PATH points to non-existent path"));
    }
    let default = PathBuf::from(DEFAULT_SOURCES_PATH);
    if default.exists() {
        return load_sources_from(&default);
    }
    Ok(default_sources())
}

fn parse_sources(content: &str) -> Result<Vec<FeedSpec>> {
    #[derive(serde::Deserialize)]
    struct SourcesFile {
        sources: Vec<FeedSpec>,
    }
    let parsed: SourcesFile = toml::from_str(content).context("parsing sources toml")?;
    if parsed.sources.is_empty() {
        return Err(anyhow!("sources file lists no sources"));
    }
    Ok(parsed.sources)
}

/// The stock source set: Medium topic feeds, the major ecosystem blogs and
/// a few research outlets.
pub fn default_sources() -> Vec<FeedSpec> {
    let spec = |name: &str, url: &str, tag: Option<&str>, limit: usize| FeedSpec {
        name: name.to_string(),
        url: url.to_string(),
        tag: tag.map(str::to_string),
        limit,
    };
    vec![
        spec("medium", "https://medium.com/feed/tag/web3", None, 15),
        spec("medium", "https://medium.com/feed/tag/blockchain", None, 15),
        spec("medium", "https://medium.com/feed/tag/ethereum", None, 15),
        spec("medium", "https://medium.com/feed/tag/defi", None, 15),
        spec("medium", "https://medium.com/feed/tag/solana", None, 15),
        spec("medium", "https://medium.com/feed/tag/cryptocurrency", None, 15),
        spec("ethereum", "https://blog.ethereum.org/feed.xml", Some("ethereum"), 15),
        spec("solana", "https://solana.com/news/rss", Some("solana"), 10),
        spec("solana", "https://solana.ghost.io/rss/", Some("solana"), 10),
        spec("base", "https://base.org/blog/rss.xml", Some("base"), 10),
        spec("research", "https://research.paradigm.xyz/feed.xml", None, 8),
        spec("research", "https://a16zcrypto.com/feed/", None, 8),
        spec("research", "https://variant.fund/feed/", None, 8),
    ]
}

fn env_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    const SAMPLE: &str = r#"
[[sources]]
name = "ethereum"
url = "https://blog.ethereum.org/feed.xml"
tag = "ethereum"
limit = 5

[[sources]]
name = "medium"
url = "https://medium.com/feed/tag/web3"
"#;

    #[test]
    fn parses_sources_with_defaults() {
        let sources = parse_sources(SAMPLE).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].tag.as_deref(), Some("ethereum"));
        assert_eq!(sources[0].limit, 5);
        assert_eq!(sources[1].tag, None);
        assert_eq!(sources[1].limit, 15); // default limit
    }

    #[test]
    fn empty_sources_file_is_rejected() {
        assert!(parse_sources("sources = []").is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_path_takes_precedence_and_missing_path_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("sources.toml");
        fs::write(&p, SAMPLE).unwrap();

        env::set_var(ENV_SOURCES_PATH, p.display().to_string());
        let sources = load_sources_default().unwrap();
        assert_eq!(sources.len(), 2);

        env::set_var(ENV_SOURCES_PATH, tmp.path().join("missing.toml"));
        assert!(load_sources_default().is_err());
        env::remove_var(ENV_SOURCES_PATH);
    }

    #[serial_test::serial]
    #[test]
    fn falls_back_to_builtin_defaults_without_any_file() {
        // Isolate CWD so a real config/ in the repo does not interfere.
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_SOURCES_PATH);

        let sources = load_sources_default().unwrap();
        assert!(!sources.is_empty());
        assert!(sources.iter().any(|s| s.name == "ethereum"));

        env::set_current_dir(&old).unwrap();
    }

    #[test]
    fn env_bool_parsing() {
        assert!(!env_bool("NOT_SET_ANYWHERE_XYZ", false));
        assert!(env_bool("NOT_SET_ANYWHERE_XYZ", true));
    }
}
