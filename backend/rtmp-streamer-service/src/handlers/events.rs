/// Printer event intake
///
/// The host posts its lifecycle events here; the dispatcher decides whether
/// they start or stop the stream.
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::debug;

use crate::error::Result;
use crate::services::lifecycle::{self, EventNotification};
use crate::AppState;

/// Endpoint: POST /api/events
pub async fn printer_event(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    state.authorize(&req)?;
    let notification: EventNotification = serde_json::from_slice(&body)?;
    debug!(event = ?notification.event, "Printer event received");

    let outcome = lifecycle::dispatch(&state.controller, &notification.event).await;

    Ok(HttpResponse::Accepted().json(json!({
        "handled": outcome.is_some(),
        "streaming": outcome.map(|event| event.streaming),
    })))
}
