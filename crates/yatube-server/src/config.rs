use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub page_size: usize,
    pub index_cache_ttl: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = var("YATUBE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("YATUBE_JWT_SECRET is unset or still a placeholder; set it in your .env file");
        }

        let host = var("YATUBE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("YATUBE_PORT")
            .unwrap_or_else(|| "8000".into())
            .parse()
            .context("YATUBE_PORT must be a port number")?;
        let db_path: PathBuf = var("YATUBE_DB_PATH")
            .unwrap_or_else(|| "yatube.db".into())
            .into();

        let page_size: usize = var("YATUBE_PAGE_SIZE")
            .unwrap_or_else(|| "10".into())
            .parse()
            .context("YATUBE_PAGE_SIZE must be a positive integer")?;
        if page_size == 0 {
            bail!("YATUBE_PAGE_SIZE must be at least 1");
        }

        let cache_secs: u64 = var("YATUBE_INDEX_CACHE_SECS")
            .unwrap_or_else(|| "20".into())
            .parse()
            .context("YATUBE_INDEX_CACHE_SECS must be a number of seconds")?;

        Ok(Self {
            host,
            port,
            db_path,
            jwt_secret,
            page_size,
            index_cache_ttl: Duration::from_secs(cache_secs),
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}
