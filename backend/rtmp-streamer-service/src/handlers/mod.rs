//! HTTP handlers for RTMP Streamer Service
//!
//! - Plugin commands and status
//! - Plugin settings
//! - Printer lifecycle events
//! - WebSocket status push

pub mod commands;
pub mod events;
pub mod push;
pub mod settings;

use actix_web::{web, HttpResponse};

pub use commands::{plugin_command, plugin_status, ApiCommand};
pub use events::printer_event;
pub use push::plugin_socket;
pub use settings::{get_settings, update_settings};

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

/// Register every route except `/metrics`
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/api/events", web::post().to(printer_event))
        .service(
            web::scope("/api/plugin/{identifier}")
                .route("", web::post().to(plugin_command))
                .route("", web::get().to(plugin_status))
                .route("/settings", web::get().to(get_settings))
                .route("/settings", web::put().to(update_settings))
                .route("/ws", web::get().to(plugin_socket)),
        );
}
