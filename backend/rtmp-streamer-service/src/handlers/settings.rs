/// Plugin settings endpoints
///
/// Plugin options can be replaced at runtime; the webcam block is reported
/// for reference but belongs to the host.
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::info;

use crate::config::StreamerSettings;
use crate::error::{AppError, Result};
use crate::AppState;

/// Endpoint: GET /api/plugin/{identifier}/settings
pub async fn get_settings(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    state.authorize(&req)?;
    state.ensure_identifier(&path)?;

    let settings = state.controller.settings();
    Ok(HttpResponse::Ok().json(json!({
        "plugin": settings.streamer().await,
        "webcam": settings.webcam(),
    })))
}

/// Endpoint: PUT /api/plugin/{identifier}/settings
pub async fn update_settings(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    state.authorize(&req)?;
    state.ensure_identifier(&path)?;

    let requested: StreamerSettings = serde_json::from_slice(&body)?;
    let updated = state
        .controller
        .settings()
        .update(requested)
        .await
        .map_err(AppError::BadRequest)?;
    info!(stream_url = %updated.stream_url, "Plugin settings updated");

    Ok(HttpResponse::Ok().json(json!({ "plugin": updated })))
}
