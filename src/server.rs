//! HTTP API over the normalizer and the orchestrator.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::error::ProcessError;
use crate::llm::ollama::OllamaProvider;
use crate::mail::normalize::{NormalizedEmail, normalize};
use crate::mail::raw::RawMessage;
use crate::pipeline::orchestrator::Orchestrator;
use crate::pipeline::types::{ProcessingReport, ProcessingResult};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Model listing is only available when backed by a real Ollama server.
    pub ollama: Option<Arc<OllamaProvider>>,
}

/// Build the Axum router with the processing routes.
pub fn api_routes(orchestrator: Arc<Orchestrator>, ollama: Option<Arc<OllamaProvider>>) -> Router {
    let state = AppState {
        orchestrator,
        ollama,
    };

    Router::new()
        .route("/health", get(health))
        .route("/api/normalize", post(normalize_message))
        .route("/api/process", post(process_email))
        .route("/api/translate", post(translate_content))
        .route("/api/summarize", post(summarize_content))
        .route("/api/models", get(list_models))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "mail-lens",
        "model": state.orchestrator.model_name(),
    }))
}

// ── Normalization ───────────────────────────────────────────────────────

async fn normalize_message(Json(raw): Json<RawMessage>) -> impl IntoResponse {
    Json(normalize(&raw))
}

// ── Processing ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ProcessBody {
    email: NormalizedEmail,
    mode: String,
}

async fn process_email(
    State(state): State<AppState>,
    Json(body): Json<ProcessBody>,
) -> impl IntoResponse {
    let result = state
        .orchestrator
        .process_named(&body.email, &body.mode)
        .await;
    report_response(&result)
}

#[derive(Debug, Deserialize)]
struct TranslateBody {
    content: String,
    from: Option<String>,
    to: Option<String>,
}

async fn translate_content(
    State(state): State<AppState>,
    Json(body): Json<TranslateBody>,
) -> impl IntoResponse {
    let orchestrator = &state.orchestrator;
    let from = body
        .from
        .as_deref()
        .unwrap_or(orchestrator.default_source_language());
    let to = body.to.as_deref().unwrap_or(orchestrator.target_language());

    match orchestrator.translate(&body.content, from, to).await {
        Ok(translation) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "translation": translation.text,
                "sourceLanguage": translation.source_language,
                "targetLanguage": translation.target_language,
            })),
        ),
        Err(e) => error_response(&e),
    }
}

#[derive(Debug, Deserialize)]
struct SummarizeBody {
    content: String,
    language: Option<String>,
}

async fn summarize_content(
    State(state): State<AppState>,
    Json(body): Json<SummarizeBody>,
) -> impl IntoResponse {
    let orchestrator = &state.orchestrator;
    let language = body
        .language
        .as_deref()
        .unwrap_or(orchestrator.target_language());

    match orchestrator.summarize(&body.content, language).await {
        Ok((analysis, format)) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "analysis": analysis,
                "format": format,
                "language": language,
            })),
        ),
        Err(e) => error_response(&e),
    }
}

// ── Models ──────────────────────────────────────────────────────────────

async fn list_models(State(state): State<AppState>) -> impl IntoResponse {
    let Some(ollama) = state.ollama else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "Model listing not available"})),
        );
    };

    match ollama.list_models().await {
        Ok(models) => {
            info!(count = models.len(), "Listed models");
            (StatusCode::OK, Json(json!({ "models": models })))
        }
        Err(e) => {
            warn!(error = %e, "Model listing failed");
            (StatusCode::BAD_GATEWAY, Json(json!({"error": e.to_string()})))
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn status_for(error: &ProcessError) -> StatusCode {
    match error {
        ProcessError::UnknownMode(_) => StatusCode::BAD_REQUEST,
        ProcessError::EmptyContent => StatusCode::UNPROCESSABLE_ENTITY,
        ProcessError::EndpointFailure(_) => StatusCode::BAD_GATEWAY,
    }
}

fn report_response(result: &ProcessingResult) -> (StatusCode, Json<Value>) {
    let status = match result {
        Ok(_) => StatusCode::OK,
        Err(e) => status_for(e),
    };
    (status, Json(json!(ProcessingReport::from(result))))
}

fn error_response(error: &ProcessError) -> (StatusCode, Json<Value>) {
    (
        status_for(error),
        Json(json!({
            "success": false,
            "error": error.to_string(),
            "errorKind": error.kind(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::error::LlmError;
    use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider};
    use crate::mail::raw::MimeNode;

    /// Echoes a fixed reply, or fails every call.
    struct FixedLlm {
        reply: Option<String>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl LlmProvider for FixedLlm {
        fn model_name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            *self.calls.lock().unwrap() += 1;
            match &self.reply {
                Some(content) => Ok(CompletionResponse {
                    content: content.clone(),
                    model: "fixed".into(),
                }),
                None => Err(LlmError::RequestFailed {
                    provider: "fixed".into(),
                    reason: "connection refused".into(),
                }),
            }
        }
    }

    fn app(reply: Option<&str>) -> (Router, Arc<FixedLlm>) {
        let llm = Arc::new(FixedLlm {
            reply: reply.map(str::to_string),
            calls: Mutex::new(0),
        });
        let orchestrator = Arc::new(Orchestrator::new(llm.clone()));
        (api_routes(orchestrator, None), llm)
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn email_json(plain: &str) -> Value {
        json!({
            "id": "m1",
            "subject": "Marktupdate",
            "from": "info@bolero.be",
            "plainTextBody": plain,
        })
    }

    #[tokio::test]
    async fn health_reports_model() {
        let (app, _) = app(Some("x"));
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"], "fixed");
    }

    #[tokio::test]
    async fn normalize_endpoint_returns_normalized_email() {
        let (app, _) = app(None);
        let raw = RawMessage::new(
            "abc",
            MimeNode::multipart(
                "multipart/alternative",
                vec![MimeNode::text("text/plain", "Hallo")],
            ),
        )
        .with_header("Subject", "Update");

        let (status, body) = post_json(app, "/api/normalize", json!(raw)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "abc");
        assert_eq!(body["subject"], "Update");
        assert_eq!(body["plainTextBody"], "Hallo");
        assert_eq!(body["hasPlainText"], true);
    }

    #[tokio::test]
    async fn process_translate_succeeds() {
        let (app, _) = app(Some("Good afternoon"));
        let (status, body) = post_json(
            app,
            "/api/process",
            json!({"email": email_json("Goedemiddag"), "mode": "translate"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["mode"], "translate");
        assert_eq!(body["translation"], "Good afternoon");
        assert_eq!(body["sourceLanguage"], "Dutch");
    }

    #[tokio::test]
    async fn normalized_output_feeds_process() {
        let raw = RawMessage::new(
            "18f2a",
            MimeNode::multipart(
                "multipart/alternative",
                vec![
                    MimeNode::text("text/plain", "Goedemiddag"),
                    MimeNode::text("text/html", "<p>Goedemiddag</p>"),
                ],
            ),
        )
        .with_thread_id("t-18f2a")
        .with_labels(&["INBOX"])
        .with_header("Subject", "Marktupdate")
        .with_header("From", "Bolero <info@bolero.be>");

        let (app, _) = app(Some("Good afternoon"));
        let (status, email) = post_json(app.clone(), "/api/normalize", json!(raw)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(email["threadId"], "t-18f2a");

        let (status, body) = post_json(
            app,
            "/api/process",
            json!({"email": email, "mode": "translate"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["translation"], "Good afternoon");
    }

    #[tokio::test]
    async fn process_unknown_mode_is_bad_request() {
        let (app, llm) = app(Some("x"));
        let (status, body) = post_json(
            app,
            "/api/process",
            json!({"email": email_json("tekst"), "mode": "bogus-mode"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["errorKind"], "unknown_mode");
        assert_eq!(*llm.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn process_empty_email_is_unprocessable() {
        let (app, _) = app(Some("x"));
        let (status, body) = post_json(
            app,
            "/api/process",
            json!({"email": email_json(""), "mode": "summarize"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "No readable content found in email");
    }

    #[tokio::test]
    async fn endpoint_failure_is_bad_gateway() {
        let (app, _) = app(None);
        let (status, body) = post_json(
            app,
            "/api/process",
            json!({"email": email_json("tekst"), "mode": "translate"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["errorKind"], "endpoint_failure");
    }

    #[tokio::test]
    async fn translate_endpoint_uses_given_languages() {
        let (app, _) = app(Some("Guten Tag"));
        let (status, body) = post_json(
            app,
            "/api/translate",
            json!({"content": "Goedendag", "from": "Dutch", "to": "German"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["translation"], "Guten Tag");
        assert_eq!(body["sourceLanguage"], "Dutch");
        assert_eq!(body["targetLanguage"], "German");
    }

    #[tokio::test]
    async fn summarize_endpoint_degrades_to_plain() {
        let (app, _) = app(Some("Markets were quiet."));
        let (status, body) =
            post_json(app, "/api/summarize", json!({"content": "Rustige markten"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["format"], "plain");
        assert_eq!(body["analysis"]["summary"], "Markets were quiet.");
        assert_eq!(body["language"], "English");
    }

    #[tokio::test]
    async fn models_unavailable_without_ollama() {
        let (app, _) = app(Some("x"));
        let request = Request::builder()
            .uri("/api/models")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
