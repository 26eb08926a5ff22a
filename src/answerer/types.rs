//! Types for question answering results.

use thiserror::Error;

/// Errors reported to the caller instead of being folded into the answer text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnswerError {
    /// The question was empty or whitespace-only.
    #[error("Question cannot be empty")]
    InvalidInput,
}

/// Errors from `QueryAnswererBuilder::build`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    /// A required component was never set.
    #[error("Query answerer misconfigured: {0} must be set")]
    Missing(&'static str),
}

/// How an answer was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The backend generated the answer.
    Answered,
    /// No documents are loaded; the answer is the advisory message and the backend was not called.
    NoDocuments,
    /// The backend call failed; the answer is a normalized error message.
    BackendFailure,
}

impl std::fmt::Display for AnswerOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Answered => write!(f, "answered"),
            Self::NoDocuments => write!(f, "no_documents"),
            Self::BackendFailure => write!(f, "backend_failure"),
        }
    }
}

/// Result of answering one question. Built fresh per call and never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerResult {
    /// The question exactly as asked
    question: String,
    /// Model reply, advisory text, or normalized error message
    answer: String,
    /// Documents in the store at answer time
    document_count: usize,
    outcome: AnswerOutcome,
    /// Model the prompt was sent to
    model: String,
}

impl AnswerResult {
    /// Creates a result carrying the model's reply verbatim.
    pub fn answered(question: String, answer: String, document_count: usize, model: String) -> Self {
        Self {
            question,
            answer,
            document_count,
            outcome: AnswerOutcome::Answered,
            model,
        }
    }

    /// Creates the advisory result returned when no documents are loaded.
    pub fn no_documents(question: String, advisory: String, model: String) -> Self {
        Self {
            question,
            answer: advisory,
            document_count: 0,
            outcome: AnswerOutcome::NoDocuments,
            model,
        }
    }

    /// Creates a result whose answer describes a failed backend call.
    pub fn backend_failure(
        question: String,
        message: String,
        document_count: usize,
        model: String,
    ) -> Self {
        Self {
            question,
            answer: message,
            document_count,
            outcome: AnswerOutcome::BackendFailure,
            model,
        }
    }

    /// Returns the original question.
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Returns the answer text.
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Returns the number of documents that were loaded when answering.
    pub fn document_count(&self) -> usize {
        self.document_count
    }

    pub fn outcome(&self) -> AnswerOutcome {
        self.outcome
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns true if the answer came from the backend.
    pub fn is_answered(&self) -> bool {
        self.outcome == AnswerOutcome::Answered
    }
}
