// ABOUTME: Configuration module for the auto-slides application
// ABOUTME: Provides configuration settings, environment variable handling and client construction

use crate::errors::{Result, SlidesError};
use crate::http::RetryPolicy;
use crate::image_service::{ImageSearch, NoImages, PexelsClient, DEFAULT_PEXELS_BASE_URL};
use crate::pacing::CancelToken;
use crate::text_service::{GeminiClient, Paced, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use log::warn;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TEMPLATE_DIR: &str = "template";
const DEFAULT_TIMEOUT_MS: u64 = 30000; // 30 seconds
// 15 requests per minute
const DEFAULT_TEXT_MIN_INTERVAL_MS: u64 = 4000;
const DEFAULT_HTTP_MAX_ATTEMPTS: u32 = 3;

/// Global configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub pexels_api_key: Option<String>,
    pub pexels_base_url: String,
    pub template_dir: PathBuf,
    pub request_timeout_ms: u64,
    pub text_min_interval_ms: u64,
    pub http_max_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            pexels_api_key: None,
            pexels_base_url: DEFAULT_PEXELS_BASE_URL.to_string(),
            template_dir: PathBuf::from(DEFAULT_TEMPLATE_DIR),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            text_min_interval_ms: DEFAULT_TEXT_MIN_INTERVAL_MS,
            http_max_attempts: DEFAULT_HTTP_MAX_ATTEMPTS,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("Ignoring invalid value for {}: {:?}", name, raw);
            default
        }),
        Err(_) => default,
    }
}

impl Config {
    /// Create a new configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            gemini_model: non_empty_var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: non_empty_var("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            pexels_api_key: non_empty_var("PEXELS_API_KEY"),
            pexels_base_url: non_empty_var("PEXELS_BASE_URL").unwrap_or(defaults.pexels_base_url),
            template_dir: non_empty_var("TEMPLATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.template_dir),
            request_timeout_ms: parsed_var("REQUEST_TIMEOUT_MS", DEFAULT_TIMEOUT_MS),
            text_min_interval_ms: parsed_var("TEXT_MIN_INTERVAL_MS", DEFAULT_TEXT_MIN_INTERVAL_MS),
            http_max_attempts: parsed_var("HTTP_MAX_ATTEMPTS", DEFAULT_HTTP_MAX_ATTEMPTS),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.http_max_attempts)
    }

    /// Build the rate-limited text client. Fails when no Gemini key is configured.
    pub fn text_client(&self, cancel: &CancelToken) -> Result<Paced<GeminiClient>> {
        let api_key = self.gemini_api_key.as_deref().ok_or_else(|| {
            SlidesError::ConfigError("GEMINI_API_KEY is not set".to_string())
        })?;
        let client = GeminiClient::new(
            api_key,
            &self.gemini_model,
            &self.gemini_base_url,
            self.request_timeout(),
        )?
        .with_retry(self.retry_policy())
        .with_cancel(cancel.clone());

        Ok(Paced::new(
            client,
            Duration::from_millis(self.text_min_interval_ms),
            cancel.clone(),
        ))
    }

    /// Build the image search client. Without a Pexels key slides get no images.
    pub fn image_search(&self, cancel: &CancelToken) -> Result<Box<dyn ImageSearch>> {
        match self.pexels_api_key.as_deref() {
            Some(api_key) => {
                let client =
                    PexelsClient::new(api_key, &self.pexels_base_url, self.request_timeout())?
                        .with_retry(self.retry_policy())
                        .with_cancel(cancel.clone());
                Ok(Box::new(client))
            }
            None => {
                warn!("PEXELS_API_KEY is not set, slides will be generated without images");
                Ok(Box::new(NoImages))
            }
        }
    }
}
