/// End-to-end tests: documents on disk -> store -> answerer -> stub backend.
use std::fs;
use std::net::TcpListener;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use docqa::answerer::NO_DOCUMENTS_MESSAGE;
use docqa::{
    AnswerError, AnswerOutcome, DocumentStore, GenerateOptions, LoadOptions, LoadStatus,
    OllamaClientBuilder, OllamaClientTrait, OllamaError, QueryAnswerer, QueryAnswererBuilder,
};
use tempfile::tempdir;

/// Echoes the prompt back and counts calls.
#[derive(Default)]
struct EchoBackend {
    calls: AtomicUsize,
}

impl OllamaClientTrait for EchoBackend {
    fn generate(
        &self,
        _model: &str,
        prompt: &str,
        _options: &GenerateOptions,
    ) -> Result<String, OllamaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(prompt.to_string())
    }
}

/// Fails like an unreachable Ollama server.
struct UnreachableBackend;

impl OllamaClientTrait for UnreachableBackend {
    fn generate(
        &self,
        _model: &str,
        _prompt: &str,
        _options: &GenerateOptions,
    ) -> Result<String, OllamaError> {
        Err(OllamaError::Api {
            message: "connection refused".to_string(),
        })
    }
}

fn write_docs(dir: &Path, docs: &[(&str, &str)]) {
    for (name, content) in docs {
        fs::write(dir.join(name), content).expect("failed to write document");
    }
}

fn answerer_for(dir: &Path, backend: Arc<dyn OllamaClientTrait>) -> Result<QueryAnswerer> {
    let report = DocumentStore::load(dir, &LoadOptions::default())?;
    Ok(QueryAnswererBuilder::new()
        .client(backend)
        .store(Arc::new(report.store))
        .build()?)
}

#[test]
fn loaded_documents_reach_the_prompt_unmodified() -> Result<()> {
    let dir = tempdir()?;
    write_docs(
        dir.path(),
        &[
            ("A.txt", "annual leave is 10 days"),
            ("B.md", "sick leave is 5 days"),
            ("empty.txt", "   \n  "),
        ],
    );
    let backend = Arc::new(EchoBackend::default());
    let answerer = answerer_for(dir.path(), backend.clone())?;

    let result = answerer.answer("how many annual leave days?")?;

    assert_eq!(result.outcome(), AnswerOutcome::Answered);
    assert_eq!(result.document_count(), 2);
    assert_eq!(result.question(), "how many annual leave days?");
    assert!(result.answer().contains("【A.txt】\nannual leave is 10 days"));
    assert!(result.answer().contains("【B.md】\nsick leave is 5 days"));
    assert!(!result.answer().contains("empty.txt"));
    assert!(result.answer().contains("how many annual leave days?"));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

    Ok(())
}

#[test]
fn missing_directory_gives_advisory_answer_without_backend_call() -> Result<()> {
    let dir = tempdir()?;
    let docs = dir.path().join("docs");

    let report = DocumentStore::load(&docs, &LoadOptions::default())?;
    assert_eq!(report.status, LoadStatus::DirectoryCreated);

    let backend = Arc::new(EchoBackend::default());
    let answerer = QueryAnswerer::new(backend.clone(), Arc::new(report.store));
    let result = answerer.answer("any question")?;

    assert_eq!(result.answer(), NO_DOCUMENTS_MESSAGE);
    assert_eq!(result.outcome(), AnswerOutcome::NoDocuments);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);

    Ok(())
}

#[test]
fn blank_questions_are_rejected_before_anything_else() -> Result<()> {
    let dir = tempdir()?;
    write_docs(dir.path(), &[("A.txt", "annual leave is 10 days")]);
    let backend = Arc::new(EchoBackend::default());
    let answerer = answerer_for(dir.path(), backend.clone())?;

    assert_eq!(answerer.answer(""), Err(AnswerError::InvalidInput));
    assert_eq!(answerer.answer("   "), Err(AnswerError::InvalidInput));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);

    Ok(())
}

#[test]
fn backend_failure_is_folded_into_the_answer() -> Result<()> {
    let dir = tempdir()?;
    write_docs(dir.path(), &[("A.txt", "annual leave is 10 days")]);
    let answerer = answerer_for(dir.path(), Arc::new(UnreachableBackend))?;

    let result = answerer.answer("how many annual leave days?")?;

    assert_eq!(result.outcome(), AnswerOutcome::BackendFailure);
    assert!(!result.answer().is_empty());
    assert!(result.answer().starts_with("Error: "));
    assert!(result.answer().contains("connection refused"));

    Ok(())
}

#[test]
fn hung_backend_times_out_into_an_error_answer() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            thread::sleep(Duration::from_secs(10));
            drop(stream);
        }
    });

    let dir = tempdir()?;
    write_docs(dir.path(), &[("A.txt", "annual leave is 10 days")]);
    let client = OllamaClientBuilder::new()
        .base_url(format!("http://{}", addr))
        .request_timeout(Duration::from_secs(1))
        .build()?;
    let answerer = answerer_for(dir.path(), Arc::new(client))?;

    let result = answerer.answer("how many annual leave days?")?;

    assert_eq!(result.outcome(), AnswerOutcome::BackendFailure);
    assert_eq!(result.answer(), "Error: Request timed out");

    Ok(())
}

#[test]
fn same_inputs_give_identical_prompts_across_loads() -> Result<()> {
    let dir = tempdir()?;
    write_docs(
        dir.path(),
        &[("b.txt", "sick leave is 5 days"), ("a.txt", "annual leave is 10 days")],
    );

    let first = answerer_for(dir.path(), Arc::new(EchoBackend::default()))?;
    let second = answerer_for(dir.path(), Arc::new(EchoBackend::default()))?;

    assert_eq!(
        first.build_prompt("how many days?"),
        second.build_prompt("how many days?")
    );

    Ok(())
}

#[test]
fn concurrent_questions_do_not_interfere() -> Result<()> {
    let dir = tempdir()?;
    write_docs(
        dir.path(),
        &[("A.txt", "annual leave is 10 days"), ("B.txt", "sick leave is 5 days")],
    );
    let backend = Arc::new(EchoBackend::default());
    let answerer = Arc::new(answerer_for(dir.path(), backend.clone())?);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let answerer = answerer.clone();
            std::thread::spawn(move || {
                let question = if i % 2 == 0 {
                    "how many annual leave days?".to_string()
                } else {
                    "how many sick leave days?".to_string()
                };
                let result = answerer.answer(&question).expect("valid question");
                (question, result)
            })
        })
        .collect();

    for handle in handles {
        let (question, result) = handle.join().expect("thread panicked");
        assert_eq!(result.question(), question);
        assert_eq!(result.answer(), answerer.build_prompt(&question));
    }
    assert_eq!(backend.calls.load(Ordering::SeqCst), 16);

    Ok(())
}
