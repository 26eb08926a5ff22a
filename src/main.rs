use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docqa::{AnswerError, Config, LoadStatus, QueryAnswerer, doctor, server};
use tracing::warn;

/// docqa - answer questions about a folder of text documents
#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Answer questions about local .txt/.md documents with an Ollama model")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory containing the documents (default: ./docs or DOCQA_DOCS_DIR)
    #[arg(short, long, global = true, value_name = "DIR")]
    docs_dir: Option<PathBuf>,

    /// Ollama model name (default: qwen2.5:3b or OLLAMA_MODEL)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Ollama base URL (default: http://localhost:11434 or OLLAMA_HOST)
    #[arg(long, global = true, value_name = "URL")]
    host: Option<String>,

    /// Language the answers should be written in
    #[arg(long, global = true)]
    language: Option<String>,

    /// Also load documents from subdirectories
    #[arg(long, global = true)]
    recursive: bool,

    /// Match .txt/.md extensions ignoring case
    #[arg(long, global = true)]
    ignore_ext_case: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Answer a single question and exit
    Ask {
        /// The question to ask
        #[arg(value_name = "QUESTION")]
        question: String,
    },

    /// Interactive question loop
    Chat,

    /// Start the HTTP API
    Serve {
        /// Address to listen on (default: 0.0.0.0:8808 or DOCQA_BIND)
        #[arg(short, long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// List the documents that would be loaded
    Docs,

    /// Check the documents directory and Ollama connectivity
    Doctor,
}

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "退出"];

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Determines if an error is a user error (vs internal error).
fn is_user_error(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<AnswerError>(),
        Some(AnswerError::InvalidInput)
    )
}

fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::Ask { question } => handle_ask(&config, &question),
        Commands::Chat => handle_chat(&config),
        Commands::Serve { bind } => handle_serve(&config, bind),
        Commands::Docs => handle_docs(&config),
        Commands::Doctor => handle_doctor(&config),
    }
}

/// Environment first, then command-line overrides.
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env().context("Invalid configuration")?;

    if let Some(dir) = &cli.docs_dir {
        config.docs_dir = dir.clone();
    }
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if let Some(host) = &cli.host {
        config.ollama_host = Some(host.clone());
    }
    if let Some(language) = &cli.language {
        config.language = language.clone();
    }
    config.recursive |= cli.recursive;
    config.case_insensitive_extensions |= cli.ignore_ext_case;

    config.validate()?;
    Ok(config)
}

/// Loads the documents once and wires them into an answerer.
fn build_answerer(config: &Config) -> Result<QueryAnswerer> {
    let report = config.load_documents()?;
    match report.status {
        LoadStatus::DirectoryCreated => warn!(
            dir = %config.docs_dir.display(),
            "documents directory created; put .txt or .md files in it and restart"
        ),
        LoadStatus::NoDocuments => warn!(dir = %config.docs_dir.display(), "no documents found"),
        LoadStatus::Loaded => {}
    }
    config.build_answerer(Arc::new(report.store))
}

fn handle_ask(config: &Config, question: &str) -> Result<()> {
    if question.trim().is_empty() {
        return Err(AnswerError::InvalidInput.into());
    }
    let answerer = build_answerer(config)?;
    let result = answerer.answer(question)?;
    println!("{}", result.answer());
    Ok(())
}

fn handle_chat(config: &Config) -> Result<()> {
    let answerer = build_answerer(config)?;

    println!(
        "docqa ready: {} document(s), model {}",
        answerer.document_count(),
        answerer.model()
    );
    println!("Type a question, or '{}' to leave.", EXIT_WORDS.join("' / '"));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\n> ");
        io::stdout().flush().context("Failed to write prompt")?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let question = line.context("Failed to read from stdin")?;
        let question = question.trim();

        if question.is_empty() {
            continue;
        }
        if is_exit_word(question) {
            break;
        }

        match answerer.answer(question) {
            Ok(result) => println!("\n{}", result.answer()),
            Err(e) => eprintln!("{e}"),
        }
    }

    println!("Bye.");
    Ok(())
}

fn is_exit_word(input: &str) -> bool {
    let lowered = input.to_lowercase();
    EXIT_WORDS.contains(&lowered.as_str())
}

fn handle_serve(config: &Config, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| config.bind.clone());

    // Built outside the runtime: the blocking HTTP client must not be created
    // or dropped on an async worker thread.
    let answerer = Arc::new(build_answerer(config)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let result = runtime.block_on(server::serve(&bind, answerer.clone()));
    drop(runtime);

    result
}

fn handle_docs(config: &Config) -> Result<()> {
    let report = config.load_documents()?;

    println!("Documents in {}", config.docs_dir.display());
    if report.status == LoadStatus::DirectoryCreated {
        println!("  (directory did not exist and has been created)");
    }
    for doc in report.store.get_all() {
        println!("  {:<40} {:>8} bytes", doc.name(), doc.content().len());
    }
    for failure in &report.failures {
        println!("  {:<40} FAILED: {}", failure.name, failure.reason);
    }
    println!(
        "found {}, loaded {}, skipped {}, failed {}",
        report.found,
        report.loaded,
        report.skipped,
        report.failures.len()
    );
    Ok(())
}

fn handle_doctor(config: &Config) -> Result<()> {
    if doctor::run_health_checks(config) {
        Ok(())
    } else {
        anyhow::bail!("One or more health checks failed")
    }
}
