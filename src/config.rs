//! Runtime configuration.
//!
//! Values come from environment variables (a `.env` file is honoured by the
//! binary), with command-line flags applied on top by the caller.
//!
//! | Variable | Default |
//! |---|---|
//! | `DOCQA_DOCS_DIR` | `./docs` |
//! | `OLLAMA_HOST` | `http://localhost:11434` |
//! | `OLLAMA_MODEL` | `qwen2.5:3b` |
//! | `DOCQA_TEMPERATURE` | `0.1` |
//! | `DOCQA_MAX_OUTPUT_TOKENS` | `800` (`0` = unbounded) |
//! | `DOCQA_TIMEOUT_SECS` | `120` |
//! | `DOCQA_MAX_RETRIES` | `0` |
//! | `DOCQA_LANGUAGE` | `Chinese` |
//! | `DOCQA_CASE_INSENSITIVE_EXT` | `false` |
//! | `DOCQA_RECURSIVE` | `false` |
//! | `DOCQA_PROMPT_TEMPLATE` | unset |
//! | `DOCQA_BIND` | `0.0.0.0:8808` |

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};

use crate::answerer::{PromptTemplate, QueryAnswerer, QueryAnswererBuilder};
use crate::ollama::{GenerateOptions, OllamaClient, OllamaClientBuilder, RetryPolicy};
use crate::store::{DocumentStore, LoadOptions, LoadReport};

pub const DEFAULT_DOCS_DIR: &str = "./docs";
pub const DEFAULT_MODEL: &str = "qwen2.5:3b";
pub const DEFAULT_BIND: &str = "0.0.0.0:8808";

/// Fully resolved settings for one process.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub docs_dir: PathBuf,
    /// `None` lets the client fall back to its own default.
    pub ollama_host: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
    pub request_timeout: Duration,
    pub max_retries: usize,
    pub language: String,
    pub case_insensitive_extensions: bool,
    pub recursive: bool,
    pub prompt_template: Option<PathBuf>,
    pub bind: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from(DEFAULT_DOCS_DIR),
            ollama_host: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.1,
            max_output_tokens: Some(800),
            request_timeout: Duration::from_secs(120),
            max_retries: 0,
            language: "Chinese".to_string(),
            case_insensitive_extensions: false,
            recursive: false,
            prompt_template: None,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl Config {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, treating empty values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get("DOCQA_DOCS_DIR") {
            config.docs_dir = PathBuf::from(dir);
        }
        config.ollama_host = get("OLLAMA_HOST");
        if let Some(model) = get("OLLAMA_MODEL") {
            config.model = model;
        }
        if let Some(raw) = get("DOCQA_TEMPERATURE") {
            config.temperature = parse_var("DOCQA_TEMPERATURE", &raw)?;
        }
        if let Some(raw) = get("DOCQA_MAX_OUTPUT_TOKENS") {
            let tokens: u32 = parse_var("DOCQA_MAX_OUTPUT_TOKENS", &raw)?;
            config.max_output_tokens = (tokens > 0).then_some(tokens);
        }
        if let Some(raw) = get("DOCQA_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse_var("DOCQA_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = get("DOCQA_MAX_RETRIES") {
            config.max_retries = parse_var("DOCQA_MAX_RETRIES", &raw)?;
        }
        if let Some(language) = get("DOCQA_LANGUAGE") {
            config.language = language;
        }
        if let Some(raw) = get("DOCQA_CASE_INSENSITIVE_EXT") {
            config.case_insensitive_extensions = parse_bool("DOCQA_CASE_INSENSITIVE_EXT", &raw)?;
        }
        if let Some(raw) = get("DOCQA_RECURSIVE") {
            config.recursive = parse_bool("DOCQA_RECURSIVE", &raw)?;
        }
        config.prompt_template = get("DOCQA_PROMPT_TEMPLATE").map(PathBuf::from);
        if let Some(bind) = get("DOCQA_BIND") {
            config.bind = bind;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that parsing alone does not catch.
    pub fn validate(&self) -> Result<()> {
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            bail!("Temperature must be a non-negative number, got {}", self.temperature);
        }
        if self.request_timeout.is_zero() {
            bail!("Request timeout must be at least one second");
        }
        if self.model.trim().is_empty() {
            bail!("Model name cannot be empty");
        }
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            case_insensitive_extensions: self.case_insensitive_extensions,
            recursive: self.recursive,
            ..LoadOptions::default()
        }
    }

    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            ..RetryPolicy::none()
        }
    }

    /// Default template in the configured language, or the custom template file.
    pub fn prompt_template(&self) -> Result<PromptTemplate> {
        match &self.prompt_template {
            Some(path) => PromptTemplate::from_file(path, self.language.clone()),
            None => Ok(PromptTemplate::with_language(self.language.clone())),
        }
    }

    /// Loads the documents directory.
    pub fn load_documents(&self) -> Result<LoadReport> {
        DocumentStore::load(&self.docs_dir, &self.load_options()).with_context(|| {
            format!("Failed to load documents from {}", self.docs_dir.display())
        })
    }

    /// Builds the HTTP client for the configured Ollama host.
    pub fn ollama_client(&self) -> Result<OllamaClient> {
        let mut builder = OllamaClientBuilder::new()
            .request_timeout(self.request_timeout)
            .retry_policy(self.retry_policy());
        if let Some(host) = &self.ollama_host {
            builder = builder.base_url(host.clone());
        }
        builder.build().context("Failed to create Ollama client")
    }

    /// Wires a loaded store and the Ollama client into a `QueryAnswerer`.
    pub fn build_answerer(&self, store: Arc<DocumentStore>) -> Result<QueryAnswerer> {
        let client = Arc::new(self.ollama_client()?);
        QueryAnswererBuilder::new()
            .client(client)
            .store(store)
            .model(self.model.clone())
            .options(self.generate_options())
            .template(self.prompt_template()?)
            .build()
            .map_err(anyhow::Error::from)
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("Invalid value for {key}: {raw:?} ({e})"))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("Invalid value for {key}: {raw:?} (expected true or false)"),
    }
}
