use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which AI backend serves enrichment. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiMode {
    /// Remote Gemini API with server-side schema enforcement
    Gemini,
    /// Locally hosted model (Ollama-compatible `/api/generate`)
    Local,
}

impl FromStr for AiMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "" => Ok(Self::Gemini),
            "local" => Ok(Self::Local),
            other => anyhow::bail!("AI_MODE must be 'gemini' or 'local', got '{}'", other),
        }
    }
}

/// Outbound call budgets.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Page scrape, short-link expansion, places lookup
    pub lookup: Duration,
    pub image_download: Duration,
    pub remote_ai: Duration,
    pub local_ai: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            lookup: Duration::from_secs(10),
            image_download: Duration::from_secs(5),
            remote_ai: Duration::from_secs(60),
            local_ai: Duration::from_secs(120),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub places_api_key: Option<String>,
    pub gemini_model: String,

    pub ai_mode: AiMode,
    pub local_model_url: String,
    pub local_model_name: String,

    pub feat_image_analysis: bool,
    pub feat_place_search: bool,
    pub feat_screenshot_analysis: bool,

    pub max_reviews_for_ai: usize,
    pub rate_limit_per_minute: usize,
    pub max_message_age: Duration,
    pub search_result_limit: usize,

    pub image_dir: String,
    pub log_level: String,
    pub timeouts: Timeouts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            places_api_key: None,
            gemini_model: "gemini-2.0-flash".to_string(),
            ai_mode: AiMode::Gemini,
            local_model_url: "http://localhost:11434/api/generate".to_string(),
            local_model_name: "llama3.2-vision".to_string(),
            feat_image_analysis: false,
            feat_place_search: true,
            feat_screenshot_analysis: true,
            max_reviews_for_ai: 5,
            rate_limit_per_minute: 5,
            max_message_age: Duration::from_secs(120),
            search_result_limit: 3,
            image_dir: "data/images".to_string(),
            log_level: "info".to_string(),
            timeouts: Timeouts::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Missing credentials are not an error; the affected source degrades instead.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = Self::default();
        let gemini_api_key = non_empty_var("GEMINI_API_KEY");
        let places_api_key = non_empty_var("GOOGLE_PLACES_API_KEY").or_else(|| gemini_api_key.clone());

        Ok(Self {
            gemini_api_key,
            places_api_key,
            gemini_model: env::var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            ai_mode: env::var("AI_MODE")
                .unwrap_or_else(|_| "gemini".to_string())
                .parse()?,
            local_model_url: env::var("LOCAL_MODEL_URL").unwrap_or(defaults.local_model_url),
            local_model_name: env::var("LOCAL_MODEL_NAME").unwrap_or(defaults.local_model_name),
            feat_image_analysis: parse_var("FEAT_IMAGE_ANALYSIS", defaults.feat_image_analysis)?,
            feat_place_search: parse_var("FEAT_PLACE_SEARCH", defaults.feat_place_search)?,
            feat_screenshot_analysis: parse_var(
                "FEAT_SCREENSHOT_ANALYSIS",
                defaults.feat_screenshot_analysis,
            )?,
            max_reviews_for_ai: parse_var("MAX_REVIEWS_FOR_AI", defaults.max_reviews_for_ai)?,
            rate_limit_per_minute: parse_var(
                "RATE_LIMIT_PER_MINUTE",
                defaults.rate_limit_per_minute,
            )?,
            max_message_age: Duration::from_secs(parse_var(
                "MAX_MESSAGE_AGE_SECONDS",
                defaults.max_message_age.as_secs(),
            )?),
            search_result_limit: parse_var("SEARCH_RESULT_LIMIT", defaults.search_result_limit)?,
            image_dir: env::var("IMAGE_DIR").unwrap_or(defaults.image_dir),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            timeouts: Timeouts::default(),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .to_lowercase()
            .parse()
            .with_context(|| format!("{} must be a valid value, got '{}'", key, raw)),
        _ => Ok(default),
    }
}
