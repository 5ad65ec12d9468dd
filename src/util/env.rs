//! Environment helpers: centralized dotenv loading, ergonomic getters and the
//! resolved `PipelineConfig` every stage reads from.
//! Call `init_env()` once early in each binary (or rely on lazy Once).
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Once;
use tracing::info;

static INIT: Once = Once::new();

pub const DEFAULT_DB_URL: &str = "sqlite://data/pocket_meta.sqlite";
pub const DEFAULT_SOURCE_BASE_URL: &str = "https://play.limitlesstcg.com";
pub const DEFAULT_CORPUS_DIR: &str = "data/tournaments";

/// Load .env exactly once. Safe to call many times.
///
/// The working directory wins; a checked-in `.env` next to the manifest is
/// the fallback for `cargo run --bin pm` from elsewhere.
pub fn init_env() {
    INIT.call_once(|| {
        if dotenv::dotenv().is_err() {
            let fallback = format!("{}/.env", env!("CARGO_MANIFEST_DIR"));
            if dotenv::from_filename(&fallback).is_ok() {
                info!(path = %fallback, "loaded fallback .env");
            }
        }
    });
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Clone,
{
    init_env();
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Boolean flag; accepts 1/true/on/yes (case-insensitive) as true.
pub fn env_flag(key: &str, default: bool) -> bool {
    init_env();
    match std::env::var(key) {
        Ok(raw) => {
            let v = raw.trim().to_ascii_lowercase();
            matches!(v.as_str(), "1" | "true" | "on" | "yes")
        }
        Err(_) => default,
    }
}

/// Comma separated list; blank entries are dropped.
pub fn env_list(key: &str) -> Vec<String> {
    env_opt(key).map(|raw| split_list(&raw)).unwrap_or_default()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Database URL (specific -> generic -> default). Returns first found.
pub fn db_url() -> String {
    for k in ["POCKET_META_DB_URL", "DATABASE_URL"] {
        if let Some(v) = env_opt(k) {
            info!(target = "env", key = k, "database URL taken from env");
            return v;
        }
    }
    DEFAULT_DB_URL.to_string()
}

/// Everything the pipeline stages need, resolved once per run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub db_url: String,
    pub db_max_connections: u32,
    pub source_base_url: String,
    pub corpus_dir: PathBuf,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    /// Tournaments (or card URLs) in flight at once. Rounds of a single
    /// tournament are always fetched in order regardless of this value.
    pub crawl_concurrency: usize,
    pub refetch_known_cards: bool,
    /// Extension tags ranked after the built-in ordinal table, in order.
    pub extra_extensions: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            db_url: DEFAULT_DB_URL.to_string(),
            db_max_connections: 4,
            source_base_url: DEFAULT_SOURCE_BASE_URL.to_string(),
            corpus_dir: PathBuf::from(DEFAULT_CORPUS_DIR),
            http_timeout_secs: 15,
            user_agent: format!("pocket-meta/{}", env!("CARGO_PKG_VERSION")),
            crawl_concurrency: 1,
            refetch_known_cards: false,
            extra_extensions: Vec::new(),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        init_env();
        let defaults = Self::default();
        Self {
            db_url: db_url(),
            db_max_connections: env_parse("DB_MAX_CONNS", defaults.db_max_connections).max(1),
            source_base_url: env_opt("LIMITLESS_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.source_base_url),
            corpus_dir: env_opt("CORPUS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.corpus_dir),
            http_timeout_secs: env_parse("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs),
            user_agent: env_opt("HTTP_USER_AGENT").unwrap_or(defaults.user_agent),
            crawl_concurrency: env_parse("CRAWL_CONCURRENCY", defaults.crawl_concurrency).max(1),
            refetch_known_cards: env_flag("REFETCH_KNOWN_CARDS", defaults.refetch_known_cards),
            extra_extensions: env_list("EXTRA_EXTENSIONS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_drops_blanks_and_trims() {
        assert_eq!(split_list(" A3a, ,A3b ,"), vec!["A3a", "A3b"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn defaults_are_sequential_and_skip_known_cards() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.crawl_concurrency, 1);
        assert!(!cfg.refetch_known_cards);
        assert_eq!(cfg.source_base_url, DEFAULT_SOURCE_BASE_URL);
        assert!(cfg.user_agent.starts_with("pocket-meta/"));
    }
}
