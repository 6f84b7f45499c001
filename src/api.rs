//! HTTP surface: request/response types, error mapping and the axum router.

use std::sync::Arc;
use std::time::Instant;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::analysis::{AnalysisResult, Analyzer};
use crate::error::ArchaeologistError;
use crate::github::RepositoryMetadata;
use crate::summarizer::ChatAnswer;

const SERVICE_NAME: &str = "Repository Archaeologist API";

/// Request payload for `POST /api/analyze`
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Repository URL, e.g. `https://github.com/owner/name`
    pub repo_url: String,
}

/// Request payload for `POST /api/chat`
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Repository URL
    pub repo_url: String,
    /// Question about the code
    pub question: String,
    /// Optional extra context passed along with the question
    #[serde(default)]
    pub context: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `healthy` while the server answers
    pub status: String,
    /// Crate version
    pub version: String,
    /// Time of the check
    pub timestamp: DateTime<Utc>,
    /// Seconds since the server started
    pub uptime_secs: u64,
    /// Whether a generative backend is configured
    pub summarizer_available: bool,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    analyzer: Arc<Analyzer>,
    started_at: Instant,
}

impl AppState {
    /// Wraps an analyzer for sharing across handlers
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            started_at: Instant::now(),
        }
    }
}

/// Error returned by handlers, rendered as `{"detail": message}`
#[derive(Debug)]
pub struct ApiError(pub ArchaeologistError);

impl From<ArchaeologistError> for ApiError {
    fn from(e: ArchaeologistError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Builds the router with permissive CORS and request tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/analyze", post(analyze_repository))
        .route("/api/chat", post(chat_about_code))
        .route("/api/repo/:owner/:repo/metadata", get(repository_metadata))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "status": "online",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        summarizer_available: state.analyzer.gateway().is_available(),
    })
}

async fn analyze_repository(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<AnalysisResult> {
    Ok(Json(state.analyzer.analyze(&request.repo_url).await?))
}

async fn chat_about_code(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatAnswer> {
    let answer = state
        .analyzer
        .chat(&request.repo_url, &request.question, request.context.as_deref())
        .await?;
    Ok(Json(answer))
}

async fn repository_metadata(
    State(state): State<AppState>,
    Path((owner, repo)): Path<(String, String)>,
) -> ApiResult<RepositoryMetadata> {
    Ok(Json(state.analyzer.metadata(&owner, &repo).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::github::{FileBytes, HostingApi, RepositoryIdentity, TreeEntry};
    use crate::summarizer::SummarizerGateway;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use test_case::test_case;
    use tower::ServiceExt;

    /// Serves a one-file repository for `acme/app`; any other repository is missing
    struct OneFile;

    #[async_trait]
    impl HostingApi for OneFile {
        async fn list_directory(&self, repo: &RepositoryIdentity, _: &str) -> crate::error::Result<Vec<TreeEntry>> {
            if repo.full_name() == "acme/app" {
                Ok(vec![TreeEntry::file("main.go")])
            } else {
                Err(ArchaeologistError::HostingApi { status: 404, message: "Not Found".into() })
            }
        }

        async fn get_file_bytes(&self, _: &RepositoryIdentity, _: &str) -> crate::error::Result<FileBytes> {
            Ok(FileBytes::Blob(b"package main".to_vec()))
        }

        async fn repository_metadata(&self, repo: &RepositoryIdentity) -> crate::error::Result<RepositoryMetadata> {
            if repo.full_name() != "acme/app" {
                return Err(ArchaeologistError::HostingApi { status: 404, message: "Not Found".into() });
            }
            Ok(RepositoryMetadata {
                name: "app".into(),
                full_name: "acme/app".into(),
                description: Some("An app".into()),
                language: Some("Go".into()),
                stars: 3,
                forks: 1,
                url: "https://github.com/acme/app".into(),
            })
        }
    }

    fn app() -> Router {
        let config = Config::default();
        let gateway = SummarizerGateway::new(None, config.summarizer.clone());
        let analyzer = Analyzer::new(Arc::new(OneFile), gateway, &config).unwrap();
        router(AppState::new(analyzer))
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let (status, body) = send(Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "online");

        let (status, body) = send(Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summarizer_available"], false);
    }

    #[tokio::test]
    async fn test_analyze_returns_result() {
        let (status, body) = send(post_json("/api/analyze", json!({"repo_url": "https://github.com/acme/app"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["repo_name"], "app");
        assert_eq!(body["total_files"], 1);
        assert_eq!(body["tech_stack"]["languages"], json!(["Go"]));
    }

    #[test_case("https://bitbucket.org/acme/app", 400 ; "invalid url")]
    #[test_case("https://github.com/acme/missing", 404 ; "hosting not found")]
    #[tokio::test]
    async fn test_analyze_error_mapping(url: &str, expected: u16) {
        let (status, body) = send(post_json("/api/analyze", json!({ "repo_url": url }))).await;
        assert_eq!(status.as_u16(), expected);
        assert!(body["detail"].as_str().is_some_and(|d| !d.is_empty()));
    }

    #[tokio::test]
    async fn test_chat_answers_without_backend() {
        let (status, body) = send(post_json(
            "/api/chat",
            json!({"repo_url": "https://github.com/acme/app", "question": "What is this?"}),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["answer"].as_str().is_some_and(|a| a.contains("1 files")));
        assert_eq!(body["relevant_files"], json!([]));
    }

    #[tokio::test]
    async fn test_metadata_route() {
        let (status, body) = send(Request::get("/api/repo/acme/app/metadata").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["full_name"], "acme/app");
        assert_eq!(body["stars"], 3);
    }

    #[test_case(ArchaeologistError::Validation("x".into()), 400 ; "validation")]
    #[test_case(ArchaeologistError::fetch_failed("none", None), 404 ; "fetch failed")]
    #[test_case(ArchaeologistError::HostingApi { status: 403, message: "rate".into() }, 403 ; "hosting 4xx")]
    #[test_case(ArchaeologistError::HostingApi { status: 503, message: "down".into() }, 502 ; "hosting 5xx")]
    #[test_case(ArchaeologistError::Config("bad".into()), 500 ; "internal")]
    fn test_api_error_status(error: ArchaeologistError, expected: u16) {
        assert_eq!(ApiError(error).into_response().status().as_u16(), expected);
    }
}
