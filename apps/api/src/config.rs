use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Matcher webhook that judges whether the form agrees with the PDF.
/// Fixed for deployments; only tests point `MatcherConfig::url` elsewhere.
pub const DEFAULT_MATCHER_URL: &str = "https://aldoapp.app.n8n.cloud/webhook/compare-form-pdf";

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Highest accepted `MATCHER_MAX_RETRIES`.
pub const MAX_MATCHER_RETRIES: u32 = 10;

/// What happens to a stored upload once its submission is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Every upload stays on disk, accepted or not.
    Keep,
    /// Uploads that did not produce a record are deleted before responding.
    DiscardRejected,
}

impl std::str::FromStr for RetentionPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(RetentionPolicy::Keep),
            "discard-rejected" | "discard_rejected" => Ok(RetentionPolicy::DiscardRejected),
            other => bail!("unknown upload retention policy '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub uploads_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub retention: RetentionPolicy,
    pub matcher: MatcherConfig,
}

#[derive(Debug, Clone)]
pub struct MatcherConfig {
    pub url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    /// First retry delay; doubles on every further attempt.
    pub backoff_base: Duration,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_MATCHER_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff_base: Duration::from_millis(500),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let max_retries = check_retries(parse_env("MATCHER_MAX_RETRIES", 3u32)?)?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: parse_env("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            uploads_dir: PathBuf::from(
                std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string()),
            ),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            retention: parse_env("UPLOAD_RETENTION", RetentionPolicy::Keep)?,
            matcher: MatcherConfig {
                timeout: Duration::from_secs(parse_env("MATCHER_TIMEOUT_SECS", 30u64)?),
                max_retries,
                ..MatcherConfig::default()
            },
        })
    }
}

fn check_retries(max_retries: u32) -> Result<u32> {
    if !(1..=MAX_MATCHER_RETRIES).contains(&max_retries) {
        bail!("MATCHER_MAX_RETRIES must be between 1 and {MAX_MATCHER_RETRIES}, got {max_retries}");
    }
    Ok(max_retries)
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} is invalid ('{raw}'): {e}")),
        Err(_) => Ok(default),
    }
}
