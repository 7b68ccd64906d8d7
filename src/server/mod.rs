//! HTTP接口 - 以SSE推送验证进度

use anyhow::{Context, Result};
use axum::Json;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{Method, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::pipeline::{PipelineContext, PipelineOrchestrator, ProgressEvent};
use crate::transcribe::Transcriber;
use crate::types::InputError;

/// 语音备忘录的最大字节数
const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    orchestrator: PipelineOrchestrator,
    transcriber: Option<Arc<dyn Transcriber>>,
}

impl AppState {
    pub fn new(
        orchestrator: PipelineOrchestrator,
        transcriber: Option<Arc<dyn Transcriber>>,
    ) -> Self {
        Self {
            orchestrator,
            transcriber,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub idea: String,
    #[serde(default)]
    pub category_hint: Option<String>,
}

pub fn router(state: AppState) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    axum::Router::new()
        .route("/health", get(health))
        .route("/api/validate", post(validate))
        .route(
            "/api/transcribe",
            post(transcribe).layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES)),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 启动HTTP服务直到进程退出
pub async fn serve(context: PipelineContext, transcriber: Option<Arc<dyn Transcriber>>) -> Result<()> {
    let bind = context.config.server.bind.clone();
    let state = AppState::new(PipelineOrchestrator::new(context), transcriber);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    tracing::info!("🌐 服务已启动: http://{}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "calls": state.orchestrator.context().monitor.snapshot(),
    }))
}

fn to_sse_event(event: ProgressEvent) -> Event {
    Event::default()
        .event(event.event_name())
        .data(event.payload_json())
}

async fn validate(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> Result<Response, ApiError> {
    let handle = state
        .orchestrator
        .start(&request.idea, request.category_hint.as_deref())
        .map_err(ApiError::from_input)?;
    tracing::debug!("📡 运行 {} 开始推送事件", handle.run_id);

    // 运行结束后发送端被释放，事件流随之关闭
    let stream = ReceiverStream::new(handle.events)
        .map(|event| Ok::<Event, Infallible>(to_sse_event(event)));
    let sse = Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)));
    Ok(sse.into_response())
}

async fn transcribe(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let Some(transcriber) = state.transcriber.as_ref() else {
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Transcription is not enabled on this server.",
        ));
    };
    if body.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "Uploaded audio is empty.",
        ));
    }

    match transcriber.transcribe(body.to_vec()).await {
        Ok(Some(transcript)) => Ok(Json(json!({ "transcript": transcript })).into_response()),
        Ok(None) => Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "No speech could be recognised in the uploaded audio.",
        )),
        Err(e) => {
            tracing::error!("❌ 语音转写失败: {:#}", e);
            Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to transcribe audio: {}", e),
            ))
        }
    }
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn from_input(err: InputError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    #[test]
    fn test_api_error_status() {
        let error = ApiError::from_input(InputError::EmptyIdea);
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.message, "Idea text must not be empty");
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validate_request_hint_is_optional() {
        let request: ValidateRequest =
            serde_json::from_str(r#"{"idea": "A social network for dogs"}"#).unwrap();
        assert_eq!(request.category_hint, None);

        let request: ValidateRequest =
            serde_json::from_str(r#"{"idea": "Budgeting", "category_hint": "fintech"}"#).unwrap();
        assert_eq!(request.category_hint.as_deref(), Some(Category::Fintech.as_str()));
    }
}
