//! Question answering over the whole document store.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::DEFAULT_MODEL;
use crate::ollama::{GenerateOptions, OllamaClientTrait};
use crate::store::DocumentStore;

use super::prompt::PromptTemplate;
use super::types::{AnswerError, AnswerResult, BuildError};

/// Advisory answer returned when the store holds no documents.
pub const NO_DOCUMENTS_MESSAGE: &str =
    "No documents available; add documents before asking questions.";

/// Prefix of the answer text when the backend call fails.
pub const BACKEND_ERROR_PREFIX: &str = "Error";

/// Builder for constructing `QueryAnswerer` instances.
#[derive(Default)]
pub struct QueryAnswererBuilder {
    client: Option<Arc<dyn OllamaClientTrait>>,
    store: Option<Arc<DocumentStore>>,
    model: Option<String>,
    options: Option<GenerateOptions>,
    template: Option<PromptTemplate>,
    no_documents_message: Option<String>,
    error_prefix: Option<String>,
}

impl QueryAnswererBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the inference backend.
    pub fn client(mut self, client: Arc<dyn OllamaClientTrait>) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the loaded document store.
    pub fn store(mut self, store: Arc<DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the model name sent with every request.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets temperature and output bound.
    pub fn options(mut self, options: GenerateOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn template(mut self, template: PromptTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Overrides the advisory answer used when no documents are loaded.
    pub fn no_documents_message(mut self, message: impl Into<String>) -> Self {
        self.no_documents_message = Some(message.into());
        self
    }

    /// Overrides the prefix placed before backend error descriptions.
    pub fn error_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.error_prefix = Some(prefix.into());
        self
    }

    /// Builds the `QueryAnswerer`.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Missing` if the client or store was not set.
    pub fn build(self) -> Result<QueryAnswerer, BuildError> {
        Ok(QueryAnswerer {
            client: self.client.ok_or(BuildError::Missing("client"))?,
            store: self.store.ok_or(BuildError::Missing("store"))?,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            options: self.options.unwrap_or_default(),
            template: self.template.unwrap_or_default(),
            no_documents_message: self
                .no_documents_message
                .unwrap_or_else(|| NO_DOCUMENTS_MESSAGE.to_string()),
            error_prefix: self
                .error_prefix
                .unwrap_or_else(|| BACKEND_ERROR_PREFIX.to_string()),
        })
    }
}

/// Answers questions from the full document set using an LLM.
///
/// Stateless between calls: the store is immutable, so any number of threads
/// may call [`QueryAnswerer::answer`] concurrently through a shared reference.
pub struct QueryAnswerer {
    client: Arc<dyn OllamaClientTrait>,
    store: Arc<DocumentStore>,
    model: String,
    options: GenerateOptions,
    template: PromptTemplate,
    no_documents_message: String,
    error_prefix: String,
}

impl QueryAnswerer {
    /// Creates a `QueryAnswerer` with default model, options and template.
    pub fn new(client: Arc<dyn OllamaClientTrait>, store: Arc<DocumentStore>) -> Self {
        Self {
            client,
            store,
            model: DEFAULT_MODEL.to_string(),
            options: GenerateOptions::default(),
            template: PromptTemplate::default(),
            no_documents_message: NO_DOCUMENTS_MESSAGE.to_string(),
            error_prefix: BACKEND_ERROR_PREFIX.to_string(),
        }
    }

    /// Answers `question` from the loaded documents.
    ///
    /// An empty store yields the advisory answer without calling the backend.
    /// A failed backend call is not an error: the result carries a normalized
    /// message and `AnswerOutcome::BackendFailure`. The call is made once and
    /// never retried here.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::InvalidInput` if the question is empty or whitespace-only.
    pub fn answer(&self, question: &str) -> Result<AnswerResult, AnswerError> {
        if question.trim().is_empty() {
            return Err(AnswerError::InvalidInput);
        }

        let document_count = self.store.len();
        if document_count == 0 {
            info!("no documents loaded; returning advisory answer");
            return Ok(AnswerResult::no_documents(
                question.to_string(),
                self.no_documents_message.clone(),
                self.model.clone(),
            ));
        }

        let prompt = self.build_prompt(question);
        debug!(
            model = %self.model,
            documents = document_count,
            prompt_chars = prompt.chars().count(),
            "sending prompt to inference backend"
        );

        match self.client.generate(&self.model, &prompt, &self.options) {
            Ok(answer) => Ok(AnswerResult::answered(
                question.to_string(),
                answer,
                document_count,
                self.model.clone(),
            )),
            Err(e) => {
                warn!(model = %self.model, error = %e, "inference backend call failed");
                Ok(AnswerResult::backend_failure(
                    question.to_string(),
                    format!("{}: {}", self.error_prefix, e),
                    document_count,
                    self.model.clone(),
                ))
            }
        }
    }

    /// The exact prompt that `answer` would send for `question`.
    pub fn build_prompt(&self, question: &str) -> String {
        self.template.render(question, self.store.get_all())
    }

    /// Number of documents currently available.
    pub fn document_count(&self) -> usize {
        self.store.len()
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}
