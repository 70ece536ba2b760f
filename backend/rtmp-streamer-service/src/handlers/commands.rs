//! Plugin command endpoint
//!
//! `POST /api/plugin/{identifier}` with `{"command": "startStream" | "stopStream" | "checkStream"}`.
//! The outcome is not in the response; it goes out on the status channel.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::info;

use crate::error::Result;
use crate::models::{StatusEvent, StatusPayload};
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApiCommand {
    StartStream,
    StopStream,
    CheckStream,
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: ApiCommand,
}

pub async fn plugin_command(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    state.authorize(&req)?;
    state.ensure_identifier(&path)?;
    let request: CommandRequest = serde_json::from_slice(&body)?;

    match request.command {
        ApiCommand::StartStream => {
            info!("Start stream command received");
            state.controller.start().await;
        }
        ApiCommand::StopStream => {
            info!("Stop stream command received");
            state.controller.stop().await;
        }
        ApiCommand::CheckStream => {
            info!("Checking stream status");
            state.controller.check_status().await;
        }
    }

    Ok(HttpResponse::NoContent().finish())
}

/// `GET /api/plugin/{identifier}`: current status, nothing published
pub async fn plugin_status(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    state.authorize(&req)?;
    state.ensure_identifier(&path)?;

    let streaming = state.controller.is_streaming().await;
    Ok(HttpResponse::Ok().json(StatusPayload::from(StatusEvent::streaming(streaming))))
}
