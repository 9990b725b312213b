use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
/// Session slot key holding the unscoped snapshot.
pub const PRELOADED_NEWS_KEY: &str = "preloaded_news";

/// Settings shared by the client, cache and feed engine.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub api_url: String,
    pub preload_limit: usize,
    pub sidebar_limit: usize,
    pub page_size: usize,
    pub revalidate_delay: Duration,
    pub sentinel_offset: usize,
    pub map_top_n: usize,
    pub request_timeout: Duration,
    pub session_dir: PathBuf,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            preload_limit: 500,
            sidebar_limit: 5,
            page_size: 20,
            revalidate_delay: Duration::from_secs(2),
            sentinel_offset: 5,
            map_top_n: 5,
            request_timeout: Duration::from_secs(30),
            session_dir: env::temp_dir().join("newsmap-session"),
        }
    }
}

impl FeedConfig {
    /// Defaults overridden by `NEWSMAP_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup("NEWSMAP_API_URL") {
            config.api_url = url;
        }
        if let Some(dir) = lookup("NEWSMAP_SESSION_DIR") {
            config.session_dir = PathBuf::from(dir);
        }
        if let Some(size) = parse_var(&lookup, "NEWSMAP_PAGE_SIZE")? {
            config.page_size = size;
        }
        if let Some(limit) = parse_var(&lookup, "NEWSMAP_PRELOAD_LIMIT")? {
            config.preload_limit = limit;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "NEWSMAP_REVALIDATE_DELAY_MS")? {
            config.revalidate_delay = Duration::from_millis(ms);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::Config("page size must be at least 1".to_string()));
        }
        if self.sentinel_offset == 0 {
            return Err(Error::Config("sentinel offset must be at least 1".to_string()));
        }
        if self.api_url.trim().is_empty() {
            return Err(Error::Config("api url must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("invalid value for {}: {:?}", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = FeedConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, FeedConfig::default());
        assert_eq!(config.page_size, 20);
        assert_eq!(config.revalidate_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_env_overrides() {
        let config = FeedConfig::from_lookup(lookup(&[
            ("NEWSMAP_API_URL", "http://news.local"),
            ("NEWSMAP_PAGE_SIZE", "10"),
            ("NEWSMAP_REVALIDATE_DELAY_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "http://news.local");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.revalidate_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values() {
        let err = FeedConfig::from_lookup(lookup(&[("NEWSMAP_PAGE_SIZE", "many")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = FeedConfig::from_lookup(lookup(&[("NEWSMAP_PAGE_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_sentinel_offset_rejected() {
        let config = FeedConfig {
            sentinel_offset: 0,
            ..FeedConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        assert!(FeedConfig { sentinel_offset: 1, ..config }.validate().is_ok());
    }
}
