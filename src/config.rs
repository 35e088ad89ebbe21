use std::time::Duration;

use crate::error::{AppError, Result};

pub const GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

/// Total AI call attempts per `generate_all` (first try + one retry).
pub const AI_MAX_ATTEMPTS: u32 = 2;

/// Fixed pause between AI attempts.
pub const AI_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Connect/read timeout for the AI endpoint.
pub const AI_TIMEOUT: Duration = Duration::from_secs(30);

/// Generation parameters sent with every AI request.
pub mod generation {
    pub const TEMPERATURE: f64 = 0.7;
    pub const TOP_K: u32 = 40;
    pub const TOP_P: f64 = 0.95;
    pub const MAX_OUTPUT_TOKENS: u32 = 2048;
}

/// How long `stop()` waits for an in-flight pass before aborting it.
pub const SCHEDULER_STOP_GRACE: Duration = Duration::from_secs(5);

/// Upper bound on concurrently running manual refresh passes.
pub const MANUAL_PASS_WORKERS: usize = 2;

/// Politeness delay before each page fetch.
pub const SCRAPE_REQUEST_DELAY: Duration = Duration::from_secs(3);

/// Timeout for a single page fetch.
pub const SCRAPE_TIMEOUT: Duration = Duration::from_secs(15);

/// Channel capacity for pass reports.
pub const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(AppError::Config(format!("APP_THEME must be light or dark, got '{other}'"))),
        }
    }
}

/// One step of the `fetch_all` fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Ai,
    Scrape,
    Synth,
}

impl ProviderKind {
    fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ai" => Ok(ProviderKind::Ai),
            "scrape" => Ok(ProviderKind::Scrape),
            "synth" => Ok(ProviderKind::Synth),
            other => Err(AppError::Config(format!("unknown provider '{other}' in PROVIDER_CHAIN"))),
        }
    }
}

/// Bundled page-scrape engines, in preference order when listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Http,
}

impl EngineKind {
    fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(EngineKind::Http),
            other => Err(AppError::Config(format!("unknown engine '{other}' in SCRAPE_ENGINES"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Gemini key (GEMINI_API_KEY). None when absent, empty, or a placeholder.
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,
    /// Minutes between scheduled refresh passes (AUTO_REFRESH_INTERVAL)
    pub auto_refresh_minutes: u64,
    pub theme: Theme,
    /// Ordered fallback chain for fetch_all (PROVIDER_CHAIN, comma-separated).
    pub provider_chain: Vec<ProviderKind>,
    /// Ordered scrape engines (SCRAPE_ENGINES, default `http`). Set empty to disable scraping.
    pub scrape_engines: Vec<EngineKind>,
    /// Fixed seed for reproducible synthesis (SYNTH_SEED)
    pub synth_seed: Option<u64>,
    /// Pause between products inside a refresh pass (REFRESH_PRODUCT_DELAY_MS)
    pub refresh_product_delay: Duration,
    /// Price points older than this are pruned after each pass (HISTORY_RETENTION_DAYS)
    pub history_retention_days: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key-value source. `from_env` is the production lookup.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let auto_refresh_minutes = get("AUTO_REFRESH_INTERVAL")
            .unwrap_or_else(|| "60".to_string())
            .parse::<u64>()
            .map_err(|_| AppError::Config("AUTO_REFRESH_INTERVAL must be whole minutes".to_string()))?;
        if auto_refresh_minutes == 0 {
            return Err(AppError::Config("AUTO_REFRESH_INTERVAL must be at least 1".to_string()));
        }

        let provider_chain = get("PROVIDER_CHAIN")
            .unwrap_or_else(|| "ai,scrape,synth".to_string())
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(ProviderKind::parse)
            .collect::<Result<Vec<_>>>()?;

        let scrape_engines = get("SCRAPE_ENGINES")
            .unwrap_or_else(|| "http".to_string())
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(EngineKind::parse)
            .collect::<Result<Vec<_>>>()?;

        let synth_seed = match get("SYNTH_SEED") {
            Some(s) => Some(
                s.trim()
                    .parse::<u64>()
                    .map_err(|_| AppError::Config("SYNTH_SEED must be an unsigned integer".to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            db_path: get("DB_PATH").unwrap_or_else(|| "priceverse.db".to_string()),
            api_port: get("API_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            gemini_api_key: get("GEMINI_API_KEY").filter(|k| is_usable_key(k)),
            gemini_api_url: get("GEMINI_API_URL").unwrap_or_else(|| GEMINI_API_URL.to_string()),
            auto_refresh_minutes,
            theme: Theme::parse(&get("APP_THEME").unwrap_or_else(|| "dark".to_string()))?,
            provider_chain,
            scrape_engines,
            synth_seed,
            refresh_product_delay: Duration::from_millis(
                get("REFRESH_PRODUCT_DELAY_MS")
                    .unwrap_or_else(|| "2000".to_string())
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| {
                        AppError::Config("REFRESH_PRODUCT_DELAY_MS must be whole milliseconds".to_string())
                    })?,
            ),
            history_retention_days: get("HISTORY_RETENTION_DAYS")
                .unwrap_or_else(|| "365".to_string())
                .trim()
                .parse::<u32>()
                .map_err(|_| AppError::Config("HISTORY_RETENTION_DAYS must be whole days".to_string()))?,
        })
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.auto_refresh_minutes.saturating_mul(60))
    }
}

/// Placeholder keys shipped in sample configs ("YOUR_API_KEY_HERE") count as missing.
pub fn is_usable_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && !key.to_uppercase().contains("YOUR")
}
