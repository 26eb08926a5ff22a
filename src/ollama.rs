/// Ollama HTTP client module.
///
/// This module provides a blocking HTTP client for the Ollama API, including
/// error handling, optional bounded retry, and timeout configuration.
mod client;

pub use client::{
    DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT, GenerateOptions, OllamaClient, OllamaClientBuilder,
    OllamaClientTrait, OllamaError, RetryPolicy, retry_with_backoff,
};
