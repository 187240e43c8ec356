use anyhow::{anyhow, Context, Result};

use crate::extraction::validation::DriftPolicy;

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Application configuration loaded from environment variables.
/// Startup fails if `OPENAI_API_KEY` is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub llm_timeout_secs: u64,
    /// Extra attempts after the first failed one; 0 disables retrying.
    pub llm_max_retries: u32,
    pub drift_policy: DriftPolicy,
    /// Sessions untouched for this long are evicted.
    pub session_idle_minutes: i64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            openai_api_key: lookup("OPENAI_API_KEY")
                .filter(|k| !k.trim().is_empty())
                .context("Required environment variable 'OPENAI_API_KEY' is not set")?,
            openai_model: var("OPENAI_MODEL", DEFAULT_MODEL),
            openai_base_url: var("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            llm_timeout_secs: var("LLM_TIMEOUT_SECS", "120")
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            llm_max_retries: var("LLM_MAX_RETRIES", "2")
                .parse::<u32>()
                .context("LLM_MAX_RETRIES must be a non-negative integer")?,
            drift_policy: var("SCHEMA_DRIFT_POLICY", "reconcile")
                .parse::<DriftPolicy>()
                .map_err(|e| anyhow!(e))?,
            session_idle_minutes: var("SESSION_IDLE_MINUTES", "60")
                .parse::<i64>()
                .ok()
                .filter(|m| *m > 0)
                .context("SESSION_IDLE_MINUTES must be a positive number of minutes")?,
            port: var("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG", "info"),
        })
    }
}
