//! HTTP API server exposing the clipping pipeline.
//!
//! Provides REST endpoints for clipping, channel listing and clip/bundle
//! downloads.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::KlippError;
use crate::orchestrator::{ClipFailure, Orchestrator};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
    clips_root: PathBuf,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let state = Arc::new(AppState {
        orchestrator: Orchestrator::new(&settings),
        clips_root: settings.clips_root(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/clip", post(clip))
        .route("/latest-videos", post(latest_videos))
        .route("/download/{video_id}/{filename}", get(download_clip))
        .route("/download-all/{video_id}", get(download_all))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Klipp API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Clip", "POST /clip");
    Output::kv("Latest Videos", "POST /latest-videos");
    Output::kv("Download Clip", "GET  /download/:video_id/:filename");
    Output::kv("Download All", "GET  /download-all/:video_id");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ClipRequest {
    /// YouTube URL or video ID
    video_url: String,
    /// Phrase to search for
    phrase: String,
    #[serde(default = "default_padding")]
    before: f64,
    #[serde(default = "default_padding")]
    after: f64,
}

fn default_padding() -> f64 {
    2.0
}

#[derive(Serialize)]
struct ClipResponse {
    status: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    clip_urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    download_all_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<ClipFailure>,
}

impl ClipResponse {
    fn error(message: String) -> Self {
        Self {
            status: "error".to_string(),
            message,
            clip_urls: None,
            download_all_url: None,
            errors: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
struct LatestVideosRequest {
    channel_url: String,
    #[serde(default = "default_count")]
    count: usize,
}

fn default_count() -> usize {
    10
}

#[derive(Serialize)]
struct LatestVideosResponse {
    status: String,
    message: String,
    video_urls: Vec<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn clip(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClipRequest>,
) -> impl IntoResponse {
    match state
        .orchestrator
        .request_clips(&req.video_url, &req.phrase, req.before, req.after)
        .await
    {
        Ok(report) if report.match_count == 0 => Json(ClipResponse::error(
            "No matches found for the phrase.".to_string(),
        ))
        .into_response(),
        Ok(report) => {
            let clip_urls = report
                .clips
                .iter()
                .filter_map(|c| c.path.file_name().map(|n| n.to_string_lossy().to_string()))
                .map(|name| format!("/download/{}/{}", report.video_id, name))
                .collect();

            Json(ClipResponse {
                status: "success".to_string(),
                message: format!("Created {} clip(s).", report.clips.len()),
                clip_urls: Some(clip_urls),
                download_all_url: Some(format!("/download-all/{}", report.video_id)),
                errors: report.failures,
            })
            .into_response()
        }
        Err(e @ KlippError::InvalidReference(_)) => (
            StatusCode::BAD_REQUEST,
            Json(ClipResponse::error(e.to_string())),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ClipResponse::error(e.to_string())),
        )
            .into_response(),
    }
}

async fn latest_videos(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LatestVideosRequest>,
) -> impl IntoResponse {
    match state
        .orchestrator
        .list_latest(&req.channel_url, req.count)
        .await
    {
        Ok(urls) => Json(LatestVideosResponse {
            status: "success".to_string(),
            message: format!("Fetched {} videos.", urls.len()),
            video_urls: urls,
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn download_clip(
    State(state): State<Arc<AppState>>,
    Path((video_id, filename)): Path<(String, String)>,
) -> impl IntoResponse {
    if !is_safe_name(&video_id) || !is_safe_name(&filename) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid path".to_string(),
            }),
        )
            .into_response();
    }

    let clip_path = state.clips_root.join(&video_id).join(&filename);
    match tokio::fs::read(&clip_path).await {
        Ok(data) => (
            [
                (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                ),
            ],
            data,
        )
            .into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Clip not found".to_string(),
            }),
        )
            .into_response(),
    }
}

async fn download_all(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> impl IntoResponse {
    if !is_safe_name(&video_id) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid path".to_string(),
            }),
        )
            .into_response();
    }

    let bundle = match state.orchestrator.create_bundle(&video_id).await {
        Ok(bundle) => bundle,
        Err(e @ KlippError::NoClips(_)) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    let archive_name = bundle
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| format!("clips_{}.zip", video_id));

    // Read the archive into the response before the grace delay elapses;
    // the expiry task removes the file independently of this download
    match tokio::fs::read(&bundle.path).await {
        Ok(data) => (
            [
                (header::CONTENT_TYPE, "application/zip".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", archive_name),
                ),
            ],
            data,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to read bundle: {}", e),
            }),
        )
            .into_response(),
    }
}

/// Reject path components that could escape the clips directory.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_safe_name() {
        assert!(is_safe_name("dQw4w9WgXcQ"));
        assert!(is_safe_name("clip_18.mp4"));
        assert!(!is_safe_name(""));
        assert!(!is_safe_name("../etc/passwd"));
        assert!(!is_safe_name("a/b"));
        assert!(!is_safe_name("a\\b"));
    }
}
