use std::{env, fmt::Display, str::FromStr, time::Duration};

use crate::features::review::queue::{MAX_REVIEW_PAGE_SIZE, REVIEW_PAGE_SIZE};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub templates_glob: String,
    pub static_dir: String,
    pub db_pool_size: u32,
    pub review_page_size: i64,
    pub store_timeout: Duration,
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let page_size: i64 = parse_or(&lookup, "REVIEW_PAGE_SIZE", REVIEW_PAGE_SIZE);
        let timeout_ms: u64 = parse_or(&lookup, "STORE_TIMEOUT_MS", 5000);

        Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "ketabyar.db".into()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:5000".into()),
            templates_glob: lookup("TEMPLATES_GLOB").unwrap_or_else(|| "templates/**/*.html".into()),
            static_dir: lookup("STATIC_DIR").unwrap_or_else(|| "static".into()),
            db_pool_size: parse_or(&lookup, "DB_POOL_SIZE", 8).max(1),
            review_page_size: page_size.clamp(1, MAX_REVIEW_PAGE_SIZE),
            store_timeout: Duration::from_millis(timeout_ms.max(1)),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            log::warn!("Invalid {key} value {raw:?} ({e}), using default: {default}");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.database_url, "ketabyar.db");
        assert_eq!(config.review_page_size, 10);
        assert_eq!(config.store_timeout, Duration::from_secs(5));
    }

    #[test]
    fn page_size_is_clamped_and_garbage_ignored() {
        assert_eq!(config_from(&[("REVIEW_PAGE_SIZE", "500")]).review_page_size, 50);
        assert_eq!(config_from(&[("REVIEW_PAGE_SIZE", "0")]).review_page_size, 1);
        assert_eq!(config_from(&[("REVIEW_PAGE_SIZE", "many")]).review_page_size, 10);
        assert_eq!(config_from(&[("STORE_TIMEOUT_MS", "250")]).store_timeout, Duration::from_millis(250));
    }
}
