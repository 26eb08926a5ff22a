//! HTTP front end over `QueryAnswerer`.
//!
//! Routes:
//! - `GET /` - short service description
//! - `GET /health` - liveness plus loaded document count
//! - `GET /ask?q=...` and `POST /ask {"question": ...}` - answer a question
//!
//! `answer` blocks on the inference backend, so it runs on Tokio's blocking pool.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::answerer::{AnswerError, AnswerResult, QueryAnswerer};

const SERVICE_NAME: &str = "Document Assistant API";

type SharedAnswerer = Arc<QueryAnswerer>;

#[derive(Debug, Deserialize)]
pub struct AskParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

/// JSON body returned for every answered question.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
    pub document_count: usize,
}

impl From<AnswerResult> for AskResponse {
    fn from(result: AnswerResult) -> Self {
        Self {
            question: result.question().to_string(),
            answer: result.answer().to_string(),
            document_count: result.document_count(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub documents_loaded: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Builds the router with CORS and request tracing.
pub fn router(answerer: SharedAnswerer) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/ask", get(ask_get_handler).post(ask_post_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(answerer)
}

/// Serves until Ctrl-C.
pub async fn serve(bind: &str, answerer: SharedAnswerer) -> Result<()> {
    let documents = answerer.document_count();
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;

    info!(addr = %bind, documents, "document assistant API listening");
    axum::serve(listener, router(answerer))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}

async fn index_handler() -> &'static str {
    "Document Assistant API\n\
     GET  /health          service status\n\
     GET  /ask?q=QUESTION  ask a question\n\
     POST /ask             ask a question, body {\"question\": \"...\"}\n"
}

async fn health_handler(State(answerer): State<SharedAnswerer>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "running".to_string(),
        service: SERVICE_NAME.to_string(),
        documents_loaded: answerer.document_count(),
    })
}

async fn ask_get_handler(
    State(answerer): State<SharedAnswerer>,
    Query(params): Query<AskParams>,
) -> Response {
    match params.q {
        Some(q) if !q.trim().is_empty() => answer_question(answerer, q).await,
        _ => error_response(
            StatusCode::BAD_REQUEST,
            "Provide a question with the q parameter, e.g. /ask?q=annual+leave+policy",
        ),
    }
}

async fn ask_post_handler(
    State(answerer): State<SharedAnswerer>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(request)) => answer_question(answerer, request.question).await,
        Err(rejection) => error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid request body: {}", rejection.body_text()),
        ),
    }
}

async fn answer_question(answerer: SharedAnswerer, question: String) -> Response {
    info!(question = %question, "question received");

    let joined = tokio::task::spawn_blocking(move || answerer.answer(&question)).await;
    match joined {
        Ok(Ok(result)) => Json(AskResponse::from(result)).into_response(),
        Ok(Err(AnswerError::InvalidInput)) => {
            error_response(StatusCode::BAD_REQUEST, "Please provide a question")
        }
        Err(e) => {
            error!(error = %e, "answer task panicked");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}
