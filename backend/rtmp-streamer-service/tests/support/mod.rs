//! Shared fixtures: a launcher that records commands instead of forking

#![allow(dead_code)]

use actix_web::dev::ServerHandle;
use actix_web::{web, App, HttpServer};
use async_trait::async_trait;
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};

use rtmp_streamer_service::config::{StreamerSettings, WebcamSettings};
use rtmp_streamer_service::error::StreamError;
use rtmp_streamer_service::models::StreamHandle;
use rtmp_streamer_service::services::{
    FfmpegCommand, ProcessLauncher, SettingsStore, SpawnedProcess, StatusPublisher,
    StreamController,
};
use rtmp_streamer_service::handlers::configure_routes;
use rtmp_streamer_service::AppState;

pub const API_KEY: &str = "test-api-key";
pub const CAMERA_URL: &str = "http://192.168.0.2/webcam/?action=stream";
pub const RTMP_URL: &str = "rtmp://example/live";

#[derive(Default)]
pub struct RecordingLauncher {
    pub spawned: Mutex<Vec<FfmpegCommand>>,
    pub terminated: Mutex<Vec<StreamHandle>>,
}

impl RecordingLauncher {
    pub fn spawn_count(&self) -> usize {
        self.spawned.lock().unwrap().len()
    }

    pub fn terminate_count(&self) -> usize {
        self.terminated.lock().unwrap().len()
    }

    pub fn last_command(&self) -> Option<FfmpegCommand> {
        self.spawned.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ProcessLauncher for RecordingLauncher {
    async fn spawn(&self, command: &FfmpegCommand) -> Result<SpawnedProcess, StreamError> {
        let mut spawned = self.spawned.lock().unwrap();
        spawned.push(command.clone());
        let pid = 4000 + spawned.len() as u32;
        Ok(SpawnedProcess {
            handle: StreamHandle {
                process_id: pid,
                process_group_id: pid as i32,
            },
            // never exits on its own
            exit: Box::pin(futures::future::pending::<String>()),
        })
    }

    fn terminate_group(&self, handle: &StreamHandle) -> Result<(), StreamError> {
        self.terminated.lock().unwrap().push(*handle);
        Ok(())
    }
}

pub fn streamer_settings() -> StreamerSettings {
    StreamerSettings {
        stream_url: RTMP_URL.into(),
        ..StreamerSettings::default()
    }
}

pub fn build_state(
    launcher: Arc<RecordingLauncher>,
    streamer: StreamerSettings,
    webcam_url: &str,
) -> AppState {
    let settings = SettingsStore::new(
        streamer,
        WebcamSettings {
            stream_url: webcam_url.into(),
            ..WebcamSettings::default()
        },
    );
    let controller = StreamController::new(
        "ffmpeg",
        settings,
        launcher,
        StatusPublisher::new("rtmpstreamer", 32),
    );
    AppState::new(controller, Some(API_KEY.into()))
}

/// Serve the plugin routes on an ephemeral local port
pub fn start_server(state: AppState) -> std::io::Result<(SocketAddr, ServerHandle)> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(configure_routes)
    })
    .workers(1)
    .listen(listener)?
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);
    Ok((addr, handle))
}
