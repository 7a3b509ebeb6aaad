use std::{env, time::Duration};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BACKEND_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub backend_url: String,
    /// Applied to every backend call on its own, including each fan-out fetch.
    pub fetch_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT),
            backend_url: env::var("BACKEND_URL")
                .ok()
                .map(|value| value.trim().trim_end_matches('/').to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            fetch_timeout: env::var("BACKEND_TIMEOUT_SECS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }

    pub fn new(backend_url: impl Into<String>, fetch_timeout: Duration) -> Self {
        Self {
            port: DEFAULT_PORT,
            backend_url: backend_url.into().trim_end_matches('/').to_string(),
            fetch_timeout,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_BACKEND_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}
