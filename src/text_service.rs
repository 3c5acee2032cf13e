// ABOUTME: Generative-text service client for outlines and code samples
// ABOUTME: Defines the TextGenerator seam, a Gemini client and a rate-limited wrapper

use crate::errors::{Result, SlidesError};
use crate::http::{build_client, send_with_retry, RetryPolicy};
use crate::pacing::{CancelToken, RateLimiter};
use log::{debug, info};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Instruction used to request a code sample for a topic.
pub const CODE_INSTRUCTION: &str = "I am giving you a topic. return a short sample code snippet \
for the given topic. do not write anything else.";

/// A service that answers an instruction about a topic with free text.
pub trait TextGenerator {
    fn summarize(&self, instruction: &str, topic: &str) -> Result<String>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for &T {
    fn summarize(&self, instruction: &str, topic: &str) -> Result<String> {
        (**self).summarize(instruction, topic)
    }
}

impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    fn summarize(&self, instruction: &str, topic: &str) -> Result<String> {
        (**self).summarize(instruction, topic)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    retry: RetryPolicy,
    cancel: CancelToken,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            retry: RetryPolicy::default(),
            cancel: CancelToken::new(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn endpoint(&self) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        ))
        .map_err(|e| SlidesError::ConfigError(format!("Invalid Gemini URL: {}", e)))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

impl TextGenerator for GeminiClient {
    fn summarize(&self, instruction: &str, topic: &str) -> Result<String> {
        let url = self.endpoint()?;
        let body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart {
                    text: format!("{} Topic: {}", instruction, topic),
                }],
            }],
        };

        info!("Requesting text from {} for topic '{}'", self.model, topic);
        let response = send_with_retry("Gemini generateContent", self.retry, &self.cancel, || {
            self.client.post(url.clone()).json(&body).send()
        })?;

        let parsed: GenerateResponse = response.json().map_err(SlidesError::FetchError)?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<String>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(SlidesError::UpstreamError(format!(
                "Empty response from {} for topic '{}'",
                self.model, topic
            )));
        }
        debug!("Received {} characters for topic '{}'", text.len(), topic);
        Ok(text)
    }
}

/// A text generator whose calls are spaced by a [`RateLimiter`].
pub struct Paced<G> {
    inner: G,
    limiter: RateLimiter,
    cancel: CancelToken,
}

impl<G: TextGenerator> Paced<G> {
    pub fn new(inner: G, min_interval: Duration, cancel: CancelToken) -> Self {
        Self {
            inner,
            limiter: RateLimiter::new(min_interval),
            cancel,
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

impl<G: TextGenerator> TextGenerator for Paced<G> {
    fn summarize(&self, instruction: &str, topic: &str) -> Result<String> {
        self.limiter.acquire(&self.cancel)?;
        self.inner.summarize(instruction, topic)
    }
}
