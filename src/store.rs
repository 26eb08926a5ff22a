//! In-memory document store.
//!
//! The store is built once from a directory of `.txt`/`.md` files and is
//! immutable afterwards, so it can be shared across threads behind an `Arc`
//! and read without locking. Reloading means building a new store.

mod document;
mod loader;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use document::Document;
pub use loader::{LoadFailure, LoadOptions, LoadReport, LoadStatus};

/// Errors that prevent a store from being built at all.
///
/// Per-file read failures are not errors; they are reported in `LoadReport::failures`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to create documents directory {}: {source}", .path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read documents directory {}: {source}", .path.display())]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Documents path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Duplicate document name: {0}")]
    DuplicateName(String),
}

/// Immutable, load-ordered set of documents with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentStore {
    documents: Vec<Document>,
}

impl DocumentStore {
    /// Loads every accepted file under `dir`.
    ///
    /// # Errors
    ///
    /// Fails only when the directory itself cannot be created or read.
    /// Unreadable individual files are skipped and listed in the report.
    pub fn load(dir: impl AsRef<Path>, options: &LoadOptions) -> Result<LoadReport, StoreError> {
        loader::load_directory(dir.as_ref(), options)
    }

    /// Builds a store from already-read documents, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateName` if two documents share a name.
    pub fn from_documents(documents: Vec<Document>) -> Result<Self, StoreError> {
        let mut seen = HashSet::with_capacity(documents.len());
        for doc in &documents {
            if !seen.insert(doc.name()) {
                return Err(StoreError::DuplicateName(doc.name().to_string()));
            }
        }
        Ok(Self { documents })
    }

    /// Snapshot of every document in load order.
    pub fn get_all(&self) -> &[Document] {
        &self.documents
    }

    /// Looks up a document by name.
    pub fn get(&self, name: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.name() == name)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Total size of all document contents in bytes.
    pub fn total_bytes(&self) -> usize {
        self.documents.iter().map(|d| d.content().len()).sum()
    }
}
