/// Blocking client for Ollama's `/api/generate` and `/api/tags` endpoints.
///
/// Callers depend on `OllamaClientTrait` so the answerer can be driven by stub
/// backends; `OllamaClient` is the real implementation.
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Default Ollama endpoint used when neither the builder nor `OLLAMA_HOST` provide one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default request timeout for a single generation call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur when interacting with the Ollama API.
#[derive(Debug, Error)]
pub enum OllamaError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Ollama API-specific errors
    #[error("Ollama API error: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl OllamaError {
    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            OllamaError::Timeout(error)
        } else {
            OllamaError::Network(error)
        }
    }
}

/// Sampling options forwarded to the model with every generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerateOptions {
    /// Sampling temperature. Low values favour grounded, repeatable answers.
    pub temperature: f32,
    /// Upper bound on generated tokens; `None` lets the backend decide.
    pub max_output_tokens: Option<u32>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_output_tokens: Some(800),
        }
    }
}

/// Bounded retry with exponential backoff.
///
/// `max_retries = 0` means a single attempt and no retry at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_secs(1),
        }
    }

    /// Delay before retry number `attempt` (0-based): base, 2x base, 4x base, ...
    fn delay_for(&self, attempt: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt as u32).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: RequestOptions,
}

#[derive(Debug, Serialize)]
struct RequestOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
    #[serde(default)]
    size: u64,
}

/// Builder for constructing `OllamaClient` instances.
///
/// # Examples
///
/// ```
/// use docqa::ollama::OllamaClientBuilder;
///
/// let client = OllamaClientBuilder::new()
///     .base_url("http://localhost:11434")
///     .build()
///     .expect("Failed to create client");
/// ```
#[derive(Debug, Default)]
pub struct OllamaClientBuilder {
    base_url: Option<String>,
    request_timeout: Option<Duration>,
    retry: Option<RetryPolicy>,
}

impl OllamaClientBuilder {
    /// Creates a new `OllamaClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL for the Ollama API.
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL (e.g., "http://localhost:11434")
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the overall timeout for a single HTTP request.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the retry policy applied to generation requests.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Builds the `OllamaClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// If `base_url()` was not called, this method will check the `OLLAMA_HOST`
    /// environment variable. If not set, it defaults to `http://localhost:11434`.
    ///
    /// # Errors
    ///
    /// Returns `OllamaError::InvalidUrl` if the base URL does not parse, or
    /// `OllamaError::Network` if the underlying HTTP client cannot be created.
    pub fn build(self) -> Result<OllamaClient, OllamaError> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => std::env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        };
        let base_url = normalize_base_url(&base_url)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(OllamaError::Network)?;

        Ok(OllamaClient {
            client,
            base_url,
            retry: self.retry.unwrap_or_default(),
        })
    }
}

/// Accepts `host:port` the way the Ollama CLI does, defaulting the scheme to
/// `http`, and rejects anything that is not an http(s) URL.
fn normalize_base_url(raw: &str) -> Result<String, OllamaError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let base_url = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let url = reqwest::Url::parse(&base_url)
        .map_err(|e| OllamaError::InvalidUrl(format!("{}: {}", base_url, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(OllamaError::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            base_url,
            url.scheme()
        )));
    }
    Ok(base_url)
}

/// Synchronous HTTP client for interacting with the Ollama API.
///
/// It should be constructed using `OllamaClientBuilder`.
pub struct OllamaClient {
    client: reqwest::blocking::Client,
    base_url: String,
    retry: RetryPolicy,
}

/// Trait for inference backend operations.
///
/// This is the single capability the query answerer needs from a model
/// backend, and the seam where tests substitute deterministic stubs.
pub trait OllamaClientTrait: Send + Sync {
    /// Generates text for `prompt` with the given model and sampling options.
    ///
    /// # Errors
    ///
    /// Returns an `OllamaError` if the backend is unreachable, times out,
    /// or answers with something other than a generated response.
    fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, OllamaError>;
}

impl OllamaClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the retry policy configured for this client.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Lists available models from the Ollama API, sorted by size (largest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the `/api/tags` endpoint cannot be reached or decoded.
    pub fn list_models(&self) -> Result<Vec<String>, OllamaError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(OllamaError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(OllamaError::Http {
                status: response.status().as_u16(),
            });
        }

        let body = response.text().map_err(OllamaError::from_reqwest)?;
        let tags: TagsResponse = serde_json::from_str(&body).map_err(OllamaError::Serialization)?;

        let mut models: Vec<(String, u64)> =
            tags.models.into_iter().map(|m| (m.name, m.size)).collect();
        models.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(models.into_iter().map(|(name, _)| name).collect())
    }

    fn generate_internal(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, OllamaError> {
        let url = format!("{}/api/generate", self.base_url);
        let request_body = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: RequestOptions {
                temperature: options.temperature,
                num_predict: options.max_output_tokens,
            },
        };

        retry_with_backoff(&self.retry, || {
            let response = self
                .client
                .post(&url)
                .json(&request_body)
                .send()
                .map_err(OllamaError::from_reqwest)?;

            let status = response.status();
            if !status.is_success() {
                return Err(OllamaError::Http {
                    status: status.as_u16(),
                });
            }

            let body = response.text().map_err(OllamaError::from_reqwest)?;
            parse_generate_response(&body)
        })
    }
}

impl OllamaClientTrait for OllamaClient {
    fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, OllamaError> {
        self.generate_internal(model, prompt, options)
    }
}

/// Extracts the generated text from an `/api/generate` response body.
fn parse_generate_response(body: &str) -> Result<String, OllamaError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(OllamaError::Serialization)?;

    if let Some(message) = parsed.error {
        return Err(OllamaError::Api { message });
    }

    parsed.response.ok_or_else(|| OllamaError::Api {
        message: "Missing 'response' field in API response".to_string(),
    })
}

/// Runs `f`, retrying transient failures according to `policy`.
///
/// Only transient errors (HTTP 5xx, network errors, timeouts) are retried;
/// client errors and malformed responses are returned immediately.
///
/// # Errors
///
/// Returns the last error if every attempt fails.
pub fn retry_with_backoff<F, T>(policy: &RetryPolicy, mut f: F) -> Result<T, OllamaError>
where
    F: FnMut() -> Result<T, OllamaError>,
{
    let mut last_error = match f() {
        Ok(result) => return Ok(result),
        Err(e) if !should_retry(&e) => return Err(e),
        Err(e) => e,
    };

    for attempt in 0..policy.max_retries {
        let delay = policy.delay_for(attempt);
        debug!(attempt = attempt + 1, ?delay, error = %last_error, "retrying Ollama request");
        thread::sleep(delay);

        match f() {
            Ok(result) => return Ok(result),
            Err(e) if !should_retry(&e) => return Err(e),
            Err(e) => last_error = e,
        }
    }

    if policy.max_retries > 0 {
        warn!(retries = policy.max_retries, error = %last_error, "Ollama request failed after retries");
    }
    Err(last_error)
}

/// Returns `true` for transient errors (HTTP 5xx, network errors, timeouts).
fn should_retry(error: &OllamaError) -> bool {
    match error {
        OllamaError::Network(_) => true,
        OllamaError::Timeout(_) => true,
        OllamaError::Http { status } => (500..600).contains(status),
        OllamaError::Serialization(_) => false,
        OllamaError::Api { .. } => false,
        OllamaError::InvalidUrl(_) => false,
    }
}
