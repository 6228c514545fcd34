// src/config.rs
use crate::errors::ConfigError;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_AGGREGATOR_URL: &str = "https://api.repliers.io/";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://cdn.repliers.io/";
pub const DEFAULT_DB_PATH: &str = "listings.sqlite3";
pub const DEFAULT_SOURCE_PAGE_SIZE: usize = 500;
pub const DEFAULT_MAX_SOURCE_ROWS: usize = 10_000;

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub base_url: Url,
    pub api_key: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Score cut-offs for address-grouped listings without a shared MLS number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DedupeSettings {
    /// At or above: merge.
    pub duplicate_threshold: f64,
    /// At or above (but below the threshold): report as a possible duplicate.
    pub possible_duplicate_floor: f64,
}

impl Default for DedupeSettings {
    fn default() -> Self {
        Self {
            duplicate_threshold: 0.7,
            possible_duplicate_floor: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database_path: String,
    /// `None` when no API key is configured; the service then reads the
    /// database only.
    pub aggregator: Option<AggregatorConfig>,
    pub image_base_url: String,
    /// `None` disables the search cache.
    pub cache_ttl: Option<Duration>,
    pub dedupe: DedupeSettings,
    /// Rows requested per page when reading a source.
    pub source_page_size: usize,
    /// Hard stop on rows read from one source for one search.
    pub max_source_rows: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DB_PATH.to_string(),
            aggregator: None,
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            cache_ttl: Some(Duration::from_secs(5 * 60)),
            dedupe: DedupeSettings::default(),
            source_page_size: DEFAULT_SOURCE_PAGE_SIZE,
            max_source_rows: DEFAULT_MAX_SOURCE_ROWS,
        }
    }
}

fn parse_var<T: FromStr>(key: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError> {
    match value {
        None => Ok(None),
        Some(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests never have to
    /// touch the process environment.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = ServiceConfig::default();

        if let Some(path) = get("LISTINGS_DB_PATH") {
            cfg.database_path = path;
        }

        if let Some(api_key) = get("AGGREGATOR_API_KEY") {
            let base = get("AGGREGATOR_BASE_URL").unwrap_or_else(|| DEFAULT_AGGREGATOR_URL.to_string());
            let timeout_secs =
                parse_var::<u64>("AGGREGATOR_TIMEOUT_SECS", get("AGGREGATOR_TIMEOUT_SECS"))?.unwrap_or(30);
            cfg.aggregator = Some(AggregatorConfig {
                base_url: Url::parse(&base)?,
                api_key,
                timeout_secs,
            });
        }

        if let Some(base) = get("AGGREGATOR_IMAGE_BASE_URL") {
            cfg.image_base_url = base;
        }

        if let Some(ttl) = parse_var::<u64>("LISTING_CACHE_TTL_SECS", get("LISTING_CACHE_TTL_SECS"))? {
            cfg.cache_ttl = (ttl > 0).then(|| Duration::from_secs(ttl));
        }

        if let Some(t) = parse_var::<f64>("LISTING_DUPLICATE_THRESHOLD", get("LISTING_DUPLICATE_THRESHOLD"))? {
            cfg.dedupe.duplicate_threshold = t;
        }
        if let Some(f) = parse_var::<f64>(
            "LISTING_POSSIBLE_DUPLICATE_FLOOR",
            get("LISTING_POSSIBLE_DUPLICATE_FLOOR"),
        )? {
            cfg.dedupe.possible_duplicate_floor = f;
        }

        if let Some(n) = parse_var::<usize>("LISTING_SOURCE_PAGE_SIZE", get("LISTING_SOURCE_PAGE_SIZE"))? {
            cfg.source_page_size = n.max(1);
        }
        if let Some(n) = parse_var::<usize>("LISTING_MAX_SOURCE_ROWS", get("LISTING_MAX_SOURCE_ROWS"))? {
            cfg.max_source_rows = n;
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let cfg = ServiceConfig::from_vars(vars(&[])).unwrap();
        assert!(cfg.aggregator.is_none());
        assert_eq!(cfg.database_path, DEFAULT_DB_PATH);
        assert_eq!(cfg.cache_ttl, Some(Duration::from_secs(300)));
        assert_eq!(cfg.dedupe, DedupeSettings::default());
        assert_eq!(cfg.source_page_size, DEFAULT_SOURCE_PAGE_SIZE);
        assert_eq!(cfg.max_source_rows, DEFAULT_MAX_SOURCE_ROWS);
    }

    #[test]
    fn source_paging_from_env() {
        let cfg = ServiceConfig::from_vars(vars(&[
            ("LISTING_SOURCE_PAGE_SIZE", "0"),
            ("LISTING_MAX_SOURCE_ROWS", "2500"),
        ]))
        .unwrap();
        assert_eq!(cfg.source_page_size, 1);
        assert_eq!(cfg.max_source_rows, 2500);
    }

    #[test]
    fn aggregator_needs_a_key() {
        let cfg = ServiceConfig::from_vars(vars(&[("AGGREGATOR_BASE_URL", "https://x.test/")])).unwrap();
        assert!(cfg.aggregator.is_none());

        let cfg = ServiceConfig::from_vars(vars(&[
            ("AGGREGATOR_API_KEY", "secret"),
            ("AGGREGATOR_TIMEOUT_SECS", "12"),
        ]))
        .unwrap();
        let agg = cfg.aggregator.unwrap();
        assert_eq!(agg.base_url.as_str(), DEFAULT_AGGREGATOR_URL);
        assert_eq!(agg.timeout_secs, 12);
    }

    #[test]
    fn zero_ttl_disables_cache() {
        let cfg = ServiceConfig::from_vars(vars(&[("LISTING_CACHE_TTL_SECS", "0")])).unwrap();
        assert_eq!(cfg.cache_ttl, None);
    }

    #[test]
    fn bad_numbers_are_errors() {
        let err = ServiceConfig::from_vars(vars(&[("LISTING_CACHE_TTL_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "LISTING_CACHE_TTL_SECS", .. }));

        let err = ServiceConfig::from_vars(vars(&[
            ("AGGREGATOR_API_KEY", "k"),
            ("AGGREGATOR_BASE_URL", "not a url"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Url(_)));
    }
}
