//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use blogicum_core::DEFAULT_PAGE_SIZE;
use blogicum_infra::database::DatabaseConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Absent when `DATABASE_URL` is unset: the in-memory store is used.
    pub database: Option<DatabaseConfig>,
    pub posts_per_page: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: parse_var("DB_MAX_CONNECTIONS").unwrap_or(100),
            min_connections: parse_var("DB_MIN_CONNECTIONS").unwrap_or(10),
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT").unwrap_or(8080),
            database,
            posts_per_page: parse_var("POSTS_PER_PAGE")
                .filter(|&n: &u64| n > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
