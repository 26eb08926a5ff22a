//! Grounded prompt construction.
//!
//! The prompt is a pure function of the template, the question and the
//! documents: the same inputs always give a byte-identical prompt.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::store::Document;

/// Default grounding prompt.
///
/// Placeholders: `{documents}`, `{question}`, `{language}`.
pub const DEFAULT_TEMPLATE: &str = r#"You are a precise document analysis assistant. The complete content of the available documents follows:

{documents}

USER QUESTION:
{question}

RULES:
1. Answer ONLY from information explicitly written in the documents above
2. Make no assumptions or inferences about the user's personal circumstances
3. If the documents contain no information about the user personally, say so explicitly
4. Only describe the policies stated in the documents; never judge whether the user qualifies for them
5. Quote numbers and details exactly as written; never alter them
6. Respond in {language}

Answer based on the document content:"#;

const REQUIRED_PLACEHOLDERS: [&str; 2] = ["{documents}", "{question}"];

/// A prompt template with its response language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    language: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            language: "Chinese".to_string(),
        }
    }
}

impl PromptTemplate {
    /// Creates a template, checking that it has the required placeholders.
    pub fn new(template: impl Into<String>, language: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in REQUIRED_PLACEHOLDERS {
            if !template.contains(placeholder) {
                bail!("Prompt template is missing the {placeholder} placeholder");
            }
        }
        Ok(Self {
            template,
            language: language.into(),
        })
    }

    /// Reads a custom template from a file.
    pub fn from_file(path: &Path, language: impl Into<String>) -> Result<Self> {
        let template = fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt template: {}", path.display()))?;
        Self::new(template, language)
    }

    /// Returns a copy of the default template answering in `language`.
    pub fn with_language(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Self::default()
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Renders the full prompt for `question` over `documents`.
    pub fn render(&self, question: &str, documents: &[Document]) -> String {
        let documents_block = format_documents(documents);
        fill_placeholders(&self.template, |key| match key {
            "documents" => Some(documents_block.as_str()),
            "question" => Some(question),
            "language" => Some(self.language.as_str()),
            _ => None,
        })
    }
}

/// One labeled block per document, separated by a blank line.
pub fn format_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| format!("【{}】\n{}", doc.name(), doc.content()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Single-pass `{key}` substitution.
///
/// Substituted values are never rescanned, so braces inside documents or the
/// question come through untouched. Unknown keys are left as written.
fn fill_placeholders<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match lookup(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<Document> {
        vec![
            Document::new("A.txt", "annual leave is 10 days"),
            Document::new("B.txt", "sick leave is 5 days"),
        ]
    }

    #[test]
    fn format_documents_labels_each_block() {
        let block = format_documents(&docs());
        assert_eq!(
            block,
            "【A.txt】\nannual leave is 10 days\n\n【B.txt】\nsick leave is 5 days"
        );
    }

    #[test]
    fn render_contains_documents_question_and_rules() {
        let prompt = PromptTemplate::default().render("how many annual leave days?", &docs());

        assert!(prompt.contains("【A.txt】\nannual leave is 10 days"));
        assert!(prompt.contains("【B.txt】\nsick leave is 5 days"));
        assert!(prompt.contains("how many annual leave days?"));
        assert!(prompt.contains("explicitly written in the documents"));
        assert!(prompt.contains("never alter them"));
        assert!(prompt.contains("Respond in Chinese"));
        assert!(!prompt.contains("{documents}"));
        assert!(!prompt.contains("{question}"));
    }

    #[test]
    fn render_is_deterministic() {
        let template = PromptTemplate::default();
        let first = template.render("q", &docs());
        let second = template.render("q", &docs());
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn language_is_configurable() {
        let prompt = PromptTemplate::with_language("English").render("q", &docs());
        assert!(prompt.contains("Respond in English"));
    }

    #[test]
    fn placeholders_inside_documents_are_not_expanded() {
        let documents = vec![Document::new("tricky.md", "literal {question} and {language}")];
        let prompt = PromptTemplate::default().render("real question", &documents);

        assert!(prompt.contains("literal {question} and {language}"));
        assert_eq!(prompt.matches("real question").count(), 1);
    }

    #[test]
    fn custom_template_requires_placeholders() {
        assert!(PromptTemplate::new("no placeholders here", "English").is_err());
        assert!(PromptTemplate::new("{documents} only", "English").is_err());

        let template = PromptTemplate::new("Q: {question}\nDocs:\n{documents}\n{unknown}", "English")
            .unwrap();
        let prompt = template.render("why?", &docs());
        assert!(prompt.starts_with("Q: why?\nDocs:\n【A.txt】"));
        assert!(prompt.ends_with("{unknown}"));
    }

    #[test]
    fn unterminated_brace_is_kept() {
        let out = fill_placeholders("a {b", |_| Some("x"));
        assert_eq!(out, "a {b");
    }

    #[test]
    fn from_file_reads_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        fs::write(&path, "{documents}\n---\n{question}").unwrap();

        let template = PromptTemplate::from_file(&path, "English").unwrap();
        assert_eq!(template.render("q", &docs()).lines().last(), Some("q"));
    }
}
