//! Grounded question answering over the loaded documents.
//!
//! `QueryAnswerer` assembles every document into one prompt, asks the
//! inference backend once, and folds backend failures into the result.

mod prompt;
mod query_answerer;
mod types;

pub use prompt::{DEFAULT_TEMPLATE, PromptTemplate, format_documents};
pub use query_answerer::{
    BACKEND_ERROR_PREFIX, NO_DOCUMENTS_MESSAGE, QueryAnswerer, QueryAnswererBuilder,
};
pub use types::{AnswerError, AnswerOutcome, AnswerResult, BuildError};
