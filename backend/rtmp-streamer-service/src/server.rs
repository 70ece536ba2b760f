//! HTTP server bootstrap
//!
//! The listener is bound before the power-up hook may spawn a relay, and the
//! relay is stopped on every way out of [`run`], failed runs included.

use actix_web::dev::Service;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use std::time::Instant;
use tracing::info;

use crate::services::lifecycle;
use crate::{handlers, metrics, AppState};

pub async fn run(state: AppState, bind_addr: &str) -> anyhow::Result<()> {
    let controller = state.controller.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .wrap_fn(|req, srv| {
                let method = req.method().to_string();
                let started = Instant::now();
                let fut = srv.call(req);
                async move {
                    let res = fut.await?;
                    metrics::observe_http_request(
                        &method,
                        &metrics::route_label(res.request()),
                        res.status().as_u16(),
                        started.elapsed(),
                    );
                    Ok(res)
                }
            })
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(handlers::configure_routes)
    })
    .bind(bind_addr)
    .with_context(|| format!("Failed to bind on {bind_addr}"))?
    .run();
    info!("HTTP server listening on {}", bind_addr);

    lifecycle::on_startup(&controller).await;

    let result = server.await.context("HTTP server error");

    if controller.is_streaming().await {
        info!("Shutting down, stopping stream");
        controller.stop().await;
    }

    result
}
