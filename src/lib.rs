//! docqa - ask questions about a small folder of text documents.
//!
//! The whole corpus is placed into one grounded prompt and answered by an
//! Ollama-hosted model. No retrieval index is involved.

pub mod answerer;
pub mod config;
pub mod doctor;
pub mod ollama;
pub mod server;
pub mod store;

pub use answerer::{
    AnswerError, AnswerOutcome, AnswerResult, BuildError, QueryAnswerer, QueryAnswererBuilder,
};
pub use config::Config;
pub use ollama::{GenerateOptions, OllamaClient, OllamaClientBuilder, OllamaClientTrait, OllamaError};
pub use store::{Document, DocumentStore, LoadOptions, LoadReport, LoadStatus, StoreError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_accessible_from_crate_root() {
        let store = DocumentStore::from_documents(vec![Document::new("a.txt", "hello world")]);
        assert!(store.is_ok());

        let config = Config::default();
        assert_eq!(config.model, config::DEFAULT_MODEL);

        assert_eq!(AnswerOutcome::Answered.to_string(), "answered");
    }
}
