//! Directory scanning and admission rules for the document store.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{Document, DocumentStore, StoreError};

/// Options controlling which files are read and which are admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Accepted file extensions, without the leading dot.
    pub extensions: Vec<String>,
    /// Match extensions ignoring ASCII case (`NOTES.TXT` accepted as `txt`).
    pub case_insensitive_extensions: bool,
    /// Descend into subdirectories.
    pub recursive: bool,
    /// A document is admitted only if its trimmed content has more than this many characters.
    pub min_content_chars: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["txt".to_string(), "md".to_string()],
            case_insensitive_extensions: false,
            recursive: false,
            min_content_chars: 5,
        }
    }
}

impl LoadOptions {
    fn accepts(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(OsStr::to_str) else {
            return false;
        };
        self.extensions.iter().any(|accepted| {
            if self.case_insensitive_extensions {
                accepted.eq_ignore_ascii_case(ext)
            } else {
                accepted == ext
            }
        })
    }
}

/// Outcome of a load, for status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// The directory did not exist and was created; the store is empty.
    DirectoryCreated,
    /// The directory exists but no document was admitted.
    NoDocuments,
    /// At least one document was admitted.
    Loaded,
}

/// A file that matched the extension filter but could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub name: String,
    pub reason: String,
}

/// The populated store together with what happened while loading it.
#[derive(Debug)]
pub struct LoadReport {
    pub status: LoadStatus,
    pub store: DocumentStore,
    /// Files whose extension matched.
    pub found: usize,
    /// Files admitted into the store.
    pub loaded: usize,
    /// Files read successfully but dropped for having too little content.
    pub skipped: usize,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    fn created(store: DocumentStore) -> Self {
        Self {
            status: LoadStatus::DirectoryCreated,
            store,
            found: 0,
            loaded: 0,
            skipped: 0,
            failures: Vec::new(),
        }
    }
}

/// Scans `dir` and builds a store from the accepted files.
///
/// A missing directory is created and yields an empty store. A file that
/// cannot be read as UTF-8 text is logged, recorded in `failures` and
/// skipped; it never aborts the load of the remaining files.
pub(super) fn load_directory(dir: &Path, options: &LoadOptions) -> Result<LoadReport, StoreError> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|source| StoreError::CreateDirectory {
            path: dir.to_path_buf(),
            source,
        })?;
        info!(dir = %dir.display(), "documents directory created; add .txt or .md files and reload");
        return Ok(LoadReport::created(DocumentStore::default()));
    }

    if !dir.is_dir() {
        return Err(StoreError::NotADirectory(dir.to_path_buf()));
    }

    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(true)
        .sort_by_file_name();

    let mut documents = Vec::new();
    let mut seen = HashSet::new();
    let mut found = 0;
    let mut skipped = 0;
    let mut failures = Vec::new();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(StoreError::ReadDirectory {
                    path: dir.to_path_buf(),
                    source: err,
                });
            }
            Err(err) => {
                let name = err
                    .path()
                    .map(|p| document_name(dir, p))
                    .unwrap_or_else(|| "<unknown>".to_string());
                warn!(%name, error = %err, "failed to scan directory entry");
                failures.push(LoadFailure {
                    name,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() || !options.accepts(entry.path()) {
            continue;
        }
        found += 1;

        let name = document_name(dir, entry.path());
        if !seen.insert(name.clone()) {
            // Distinct non-UTF-8 file names can map to the same lossy name.
            warn!(%name, path = %entry.path().display(), "document name already taken");
            failures.push(LoadFailure {
                name,
                reason: "another file already uses this document name".to_string(),
            });
            continue;
        }
        match fs::read_to_string(entry.path()) {
            Ok(content) => {
                let document = Document::new(name, content);
                if document.meaningful_chars() > options.min_content_chars {
                    debug!(name = document.name(), bytes = document.content().len(), "document loaded");
                    documents.push(document);
                } else {
                    debug!(name = document.name(), "document dropped: too little content");
                    skipped += 1;
                }
            }
            Err(err) => {
                warn!(%name, error = %err, "failed to load document");
                failures.push(LoadFailure {
                    name,
                    reason: err.to_string(),
                });
            }
        }
    }

    let store = DocumentStore::from_documents(documents)?;
    let loaded = store.len();
    let status = if loaded == 0 {
        LoadStatus::NoDocuments
    } else {
        LoadStatus::Loaded
    };

    info!(
        dir = %dir.display(),
        found,
        loaded,
        skipped,
        failed = failures.len(),
        "documents loaded"
    );

    Ok(LoadReport {
        status,
        store,
        found,
        loaded,
        skipped,
        failures,
    })
}

/// Path of `path` relative to `root`, `/`-separated.
fn document_name(root: &Path, path: &Path) -> String {
    let relative: PathBuf = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_match_exact_lowercase_extensions() {
        let options = LoadOptions::default();
        assert!(options.accepts(Path::new("policy.txt")));
        assert!(options.accepts(Path::new("notes.md")));
        assert!(!options.accepts(Path::new("POLICY.TXT")));
        assert!(!options.accepts(Path::new("report.pdf")));
        assert!(!options.accepts(Path::new("README")));
    }

    #[test]
    fn case_insensitive_option_accepts_uppercase_extensions() {
        let options = LoadOptions {
            case_insensitive_extensions: true,
            ..Default::default()
        };
        assert!(options.accepts(Path::new("POLICY.TXT")));
        assert!(options.accepts(Path::new("Notes.Md")));
        assert!(!options.accepts(Path::new("image.png")));
    }

    #[test]
    fn document_name_is_relative_and_slash_separated() {
        let root = Path::new("/srv/docs");
        assert_eq!(document_name(root, Path::new("/srv/docs/a.txt")), "a.txt");
        assert_eq!(
            document_name(root, &Path::new("/srv/docs").join("hr").join("leave.md")),
            "hr/leave.md"
        );
    }
}
