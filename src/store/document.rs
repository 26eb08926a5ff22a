//! The `Document` type held by the store.

/// A single loaded text document.
///
/// `name` is the path of the source file relative to the documents
/// directory and is unique within a store. Content is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    name: String,
    content: String,
}

impl Document {
    /// Creates a document from its name and full text.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Returns the document name (source filename).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the full, unmodified document text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of characters left after trimming surrounding whitespace.
    pub(crate) fn meaningful_chars(&self) -> usize {
        self.content.trim().chars().count()
    }
}
