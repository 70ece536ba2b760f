//! WebSocket push channel
//!
//! `GET /api/plugin/{identifier}/ws` upgrades to a socket that receives every
//! status message published under the plugin identifier, as JSON text.

use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::{Message, MessageStream, Session};
use futures::StreamExt;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::models::PluginMessage;
use crate::AppState;

pub async fn plugin_socket(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Payload,
    state: web::Data<AppState>,
) -> actix_web::Result<HttpResponse> {
    state.authorize(&req)?;
    state.ensure_identifier(&path)?;

    let (response, session, stream) = actix_ws::handle(&req, body)?;
    let updates = state.controller.publisher().subscribe();
    debug!(plugin = %state.identifier, "Status subscriber connected");

    actix_web::rt::spawn(relay_updates(session, stream, updates));
    Ok(response)
}

/// What to do with one item from the status channel
#[derive(Debug, PartialEq, Eq)]
enum Relay {
    Send(String),
    Skip,
    Closed,
}

fn relay_action(update: Result<PluginMessage, RecvError>) -> Relay {
    match update {
        Ok(message) => match message.to_json() {
            Ok(json) => Relay::Send(json),
            Err(e) => {
                warn!("Failed to encode status message: {}", e);
                Relay::Skip
            }
        },
        Err(RecvError::Lagged(skipped)) => {
            debug!(skipped, "Status subscriber lagged behind");
            Relay::Skip
        }
        Err(RecvError::Closed) => Relay::Closed,
    }
}

async fn relay_updates(
    mut session: Session,
    mut stream: MessageStream,
    mut updates: broadcast::Receiver<PluginMessage>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => match relay_action(update) {
                Relay::Send(json) => {
                    if session.text(json).await.is_err() {
                        return;
                    }
                }
                Relay::Skip => {}
                Relay::Closed => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Ping(bytes))) => {
                    if session.pong(&bytes).await.is_err() {
                        return;
                    }
                }
                Some(Ok(Message::Close(reason))) => {
                    let _ = session.close(reason).await;
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket protocol error: {}", e);
                    break;
                }
                None => break,
            },
        }
    }

    let _ = session.close(None).await;
}
