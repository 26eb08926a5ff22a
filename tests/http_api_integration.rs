/// HTTP API tests driven through the router without binding a socket.
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use docqa::server::{AskResponse, ErrorResponse, HealthResponse, router};
use docqa::{
    Document, DocumentStore, GenerateOptions, OllamaClientTrait, OllamaError, QueryAnswerer,
};
use serde::de::DeserializeOwned;
use tower::ServiceExt;

struct FixedBackend;

impl OllamaClientTrait for FixedBackend {
    fn generate(
        &self,
        _model: &str,
        _prompt: &str,
        _options: &GenerateOptions,
    ) -> Result<String, OllamaError> {
        Ok("Annual leave is 10 days.".to_string())
    }
}

fn answerer(documents: Vec<Document>) -> Arc<QueryAnswerer> {
    let store = DocumentStore::from_documents(documents).expect("unique names");
    Arc::new(QueryAnswerer::new(Arc::new(FixedBackend), Arc::new(store)))
}

fn leave_answerer() -> Arc<QueryAnswerer> {
    answerer(vec![
        Document::new("A.txt", "annual leave is 10 days"),
        Document::new("B.txt", "sick leave is 5 days"),
    ])
}

async fn json_body<T: DeserializeOwned>(response: Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("body is not the expected JSON")
}

#[tokio::test]
async fn health_reports_loaded_documents() {
    let response = router(leave_answerer())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse = json_body(response).await;
    assert_eq!(health.status, "running");
    assert_eq!(health.documents_loaded, 2);
}

#[tokio::test]
async fn post_ask_returns_answer_json() {
    let request = Request::post("/ask")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"question": "how many annual leave days?"}"#))
        .unwrap();

    let response = router(leave_answerer()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: AskResponse = json_body(response).await;
    assert_eq!(
        body,
        AskResponse {
            question: "how many annual leave days?".to_string(),
            answer: "Annual leave is 10 days.".to_string(),
            document_count: 2,
        }
    );
}

#[tokio::test]
async fn get_ask_reads_query_parameter() {
    let response = router(leave_answerer())
        .oneshot(
            Request::get("/ask?q=annual%20leave")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: AskResponse = json_body(response).await;
    assert_eq!(body.question, "annual leave");
}

#[tokio::test]
async fn blank_question_is_a_client_error() {
    let request = Request::post("/ask")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"question": "   "}"#))
        .unwrap();
    let response = router(leave_answerer()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = json_body(response).await;
    assert!(!body.error.is_empty());

    let response = router(leave_answerer())
        .oneshot(Request::get("/ask").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_a_client_error() {
    let request = Request::post("/ask")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = router(leave_answerer()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_store_answers_with_advisory() {
    let response = router(answerer(Vec::new()))
        .oneshot(Request::get("/ask?q=anything").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: AskResponse = json_body(response).await;
    assert_eq!(body.document_count, 0);
    assert_eq!(body.answer, docqa::answerer::NO_DOCUMENTS_MESSAGE);
}
