//! Health checks for docqa.
//!
//! Provides the `doctor` command functionality:
//! - Documents directory state and load results
//! - Ollama connectivity and configured model availability

use std::path::Path;

use crate::config::Config;
use crate::store::{LoadReport, LoadStatus};

// ANSI color codes for terminal output
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Health status for a component.
#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    /// Component is healthy
    Ok,
    /// Component has a warning but is functional
    Warning(String),
    /// Component is not functional
    Error(String),
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, HealthStatus::Ok)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, HealthStatus::Error(_))
    }
}

/// Documents directory health information.
#[derive(Debug)]
pub struct DocumentsHealth {
    pub status: HealthStatus,
    pub dir: String,
    pub found: usize,
    pub loaded: usize,
    pub skipped: usize,
    pub failures: Vec<String>,
    pub total_bytes: usize,
}

/// Ollama connectivity information.
#[derive(Debug)]
pub struct OllamaHealth {
    pub status: HealthStatus,
    pub base_url: String,
    pub model: String,
    pub models: Vec<String>,
}

/// Runs every check, prints the report, and returns whether all checks passed without errors.
pub fn run_health_checks(config: &Config) -> bool {
    let docs = check_documents_health(&config.docs_dir, config.load_documents());
    let ollama = check_ollama_health(config);

    print_health_report(&docs, &ollama);

    !docs.status.is_error() && !ollama.status.is_error()
}

/// Summarizes a load attempt of `dir`.
pub fn check_documents_health(dir: &Path, load: anyhow::Result<LoadReport>) -> DocumentsHealth {
    let dir = dir.display().to_string();
    let report = match load {
        Ok(report) => report,
        Err(e) => {
            return DocumentsHealth {
                status: HealthStatus::Error(format!("{e:#}")),
                dir,
                found: 0,
                loaded: 0,
                skipped: 0,
                failures: Vec::new(),
                total_bytes: 0,
            };
        }
    };

    let failures: Vec<String> = report
        .failures
        .iter()
        .map(|f| format!("{}: {}", f.name, f.reason))
        .collect();

    let status = match report.status {
        LoadStatus::DirectoryCreated => {
            HealthStatus::Warning("Directory was missing and has been created".to_string())
        }
        LoadStatus::NoDocuments => HealthStatus::Warning("No documents loaded".to_string()),
        LoadStatus::Loaded if !failures.is_empty() => {
            HealthStatus::Warning(format!("{} file(s) failed to load", failures.len()))
        }
        LoadStatus::Loaded => HealthStatus::Ok,
    };

    DocumentsHealth {
        status,
        dir,
        found: report.found,
        loaded: report.loaded,
        skipped: report.skipped,
        failures,
        total_bytes: report.store.total_bytes(),
    }
}

fn check_ollama_health(config: &Config) -> OllamaHealth {
    let client = match config.ollama_client() {
        Ok(c) => c,
        Err(e) => {
            return OllamaHealth {
                status: HealthStatus::Error(format!("{e:#}")),
                base_url: String::new(),
                model: config.model.clone(),
                models: Vec::new(),
            };
        }
    };

    let base_url = client.base_url().to_string();
    match client.list_models() {
        Ok(models) => OllamaHealth {
            status: model_status(&config.model, &models),
            base_url,
            model: config.model.clone(),
            models,
        },
        Err(e) => OllamaHealth {
            status: HealthStatus::Error(format!("Connection failed: {}", e)),
            base_url,
            model: config.model.clone(),
            models: Vec::new(),
        },
    }
}

/// Checks that the configured model is installed.
///
/// A name without a tag (`qwen2.5`) matches the `latest` tag, as Ollama resolves it.
pub fn model_status(model: &str, installed: &[String]) -> HealthStatus {
    if installed.is_empty() {
        return HealthStatus::Warning("No models installed".to_string());
    }
    let wanted = if model.contains(':') {
        model.to_string()
    } else {
        format!("{model}:latest")
    };
    if installed.iter().any(|m| *m == wanted || m == model) {
        HealthStatus::Ok
    } else {
        HealthStatus::Warning(format!("Model {model} is not installed (ollama pull {model})"))
    }
}

// ============================================================================
// Pretty Printing
// ============================================================================

fn status_symbol(status: &HealthStatus) -> &'static str {
    match status {
        HealthStatus::Ok => "\u{2713}",
        HealthStatus::Warning(_) => "!",
        HealthStatus::Error(_) => "\u{2717}",
    }
}

fn status_color(status: &HealthStatus) -> &'static str {
    match status {
        HealthStatus::Ok => GREEN,
        HealthStatus::Warning(_) => YELLOW,
        HealthStatus::Error(_) => RED,
    }
}

fn status_text(status: &HealthStatus, ok: &str) -> String {
    match status {
        HealthStatus::Ok => ok.to_string(),
        HealthStatus::Warning(w) => w.clone(),
        HealthStatus::Error(e) => e.clone(),
    }
}

fn print_health_report(docs: &DocumentsHealth, ollama: &OllamaHealth) {
    println!("{}docqa doctor{}", BOLD, RESET);
    println!();

    println!("{}Documents{}", BOLD, RESET);
    println!(
        "  {}{}{} Status: {}",
        status_color(&docs.status),
        status_symbol(&docs.status),
        RESET,
        status_text(&docs.status, "OK")
    );
    println!("    {}Path: {}{}", DIM, docs.dir, RESET);
    println!(
        "    {}Found: {}  Loaded: {}  Skipped: {}  Failed: {}{}",
        DIM,
        docs.found,
        docs.loaded,
        docs.skipped,
        docs.failures.len(),
        RESET
    );
    if docs.loaded > 0 {
        println!("    {}Corpus size: {} bytes{}", DIM, docs.total_bytes, RESET);
    }
    for failure in &docs.failures {
        println!("    {}{}{}", RED, failure, RESET);
    }
    println!();

    println!("{}Ollama{}", BOLD, RESET);
    println!(
        "  {}{}{} Status: {}",
        status_color(&ollama.status),
        status_symbol(&ollama.status),
        RESET,
        status_text(&ollama.status, "Connected")
    );
    if !ollama.base_url.is_empty() {
        println!("    {}URL: {}{}", DIM, ollama.base_url, RESET);
    }
    println!("    {}Model: {}{}", DIM, ollama.model, RESET);
    if !ollama.models.is_empty() {
        let models_display = if ollama.models.len() > 3 {
            format!(
                "{}, ... ({} more)",
                ollama.models[..3].join(", "),
                ollama.models.len() - 3
            )
        } else {
            ollama.models.join(", ")
        };
        println!("    {}Installed: {}{}", DIM, models_display, RESET);
    }
}
