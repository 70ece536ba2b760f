use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rtmp_streamer_service::services::{
    SettingsStore, StatusPublisher, StreamController, SystemProcessLauncher,
};
use rtmp_streamer_service::{server, AppState, Config};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    info!("Starting rtmp-streamer-service v{}", env!("CARGO_PKG_VERSION"));
    info!(
        plugin = %config.plugin.identifier,
        ffmpeg = %config.plugin.ffmpeg_path,
        "Plugin configured"
    );
    if config.plugin.api_key.is_none() {
        warn!("API_KEY is not set; every API call will be rejected");
    }

    let settings = SettingsStore::new(config.streamer.clone(), config.webcam.clone());
    let publisher = StatusPublisher::new(
        config.plugin.identifier.clone(),
        config.plugin.status_channel_capacity,
    );
    let controller = StreamController::new(
        config.plugin.ffmpeg_path.clone(),
        settings,
        Arc::new(SystemProcessLauncher::new()),
        publisher,
    );

    let state = AppState::new(controller, config.plugin.api_key.clone());
    server::run(state, &config.bind_addr()).await
}
