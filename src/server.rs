use std::sync::{Arc, OnceLock};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use regex::Regex;
use serde::Deserialize;

use crate::{
    player_response::PlayerResponseError,
    util::DownloadError,
    worker::{DownloadRequest, Worker, WorkerError},
};

#[derive(Clone)]
pub struct AppState {
    pub worker: Arc<Worker>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WatchParams {
    pub v: Option<String>,
    pub progressive: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<WorkerError> for ApiError {
    fn from(err: WorkerError) -> Self {
        let status = match &err {
            WorkerError::Resolve(PlayerResponseError::Unplayable { .. }) => StatusCode::NOT_FOUND,
            WorkerError::Resolve(_) => StatusCode::BAD_GATEWAY,
            WorkerError::NoStream(_) => StatusCode::NOT_FOUND,
            WorkerError::Download(DownloadError::ReqwestError(_)) => StatusCode::BAD_GATEWAY,
            WorkerError::Download(DownloadError::IoError(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            WorkerError::Merge(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self {
            status,
            message: format!("Failed to download video - {}", err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

fn video_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid video id pattern"))
}

fn parse_flag(value: Option<&str>) -> Option<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("0") | Some("false") | Some("no") | Some("off") => Some(false),
        Some("1") | Some("true") | Some("yes") | Some("on") => Some(true),
        Some(_) => None,
    }
}

impl WatchParams {
    pub fn into_request(self) -> Result<DownloadRequest, ApiError> {
        let video_id = self
            .v
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::bad_request("Invalid video provided."))?;
        if !video_id_pattern().is_match(&video_id) {
            return Err(ApiError::bad_request("Invalid video provided."));
        }

        let force_progressive = parse_flag(self.progressive.as_deref()).ok_or_else(|| {
            ApiError::bad_request("Invalid value for progressive, expected true or false.")
        })?;

        Ok(DownloadRequest {
            video_id,
            force_progressive,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/watch", get(watch)).with_state(state)
}

pub async fn watch(
    State(state): State<AppState>,
    Query(params): Query<WatchParams>,
) -> Result<String, ApiError> {
    let request = params.into_request().map_err(|e| {
        warn!("Rejected request: {}", e.message);
        e
    })?;

    match state.worker.run(&request).await {
        Ok(summary) => {
            summary.log();
            Ok(summary.to_string())
        }
        Err(e) => {
            error!("Failed to download video {}: {}", request.video_id, e);
            Err(e.into())
        }
    }
}
