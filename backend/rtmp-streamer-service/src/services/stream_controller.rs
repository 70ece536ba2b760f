//! Stream lifecycle controller
//!
//! Owns the single relay process. `start`, `stop` and `check_status` are
//! serialized through one async mutex, and each publishes exactly one status
//! event. A watcher task per child clears the handle if ffmpeg dies on its own.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::StreamError;
use crate::metrics;
use crate::models::{StatusEvent, StreamConfig, StreamHandle};
use crate::services::ffmpeg_command::FfmpegCommandBuilder;
use crate::services::process::{ExitFuture, ProcessLauncher};
use crate::services::settings_store::SettingsStore;
use crate::services::status_publisher::StatusPublisher;

pub const INVALID_WEBCAM_URL: &str = "Webcam stream url is incorrect. Please configure the webcam \
     stream url as a fully qualified url, like http://192.168.0.2/webcam/?action=stream";

#[derive(Debug, Clone, Copy)]
struct ActiveStream {
    handle: StreamHandle,
    generation: u64,
}

#[derive(Debug, Default)]
struct ControllerState {
    active: Option<ActiveStream>,
    next_generation: u64,
}

struct Inner {
    ffmpeg_path: String,
    settings: SettingsStore,
    launcher: Arc<dyn ProcessLauncher>,
    publisher: StatusPublisher,
    state: Mutex<ControllerState>,
}

#[derive(Clone)]
pub struct StreamController {
    inner: Arc<Inner>,
}

impl StreamController {
    pub fn new(
        ffmpeg_path: impl Into<String>,
        settings: SettingsStore,
        launcher: Arc<dyn ProcessLauncher>,
        publisher: StatusPublisher,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                ffmpeg_path: ffmpeg_path.into(),
                settings,
                launcher,
                publisher,
                state: Mutex::new(ControllerState::default()),
            }),
        }
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.inner.settings
    }

    pub fn publisher(&self) -> &StatusPublisher {
        &self.inner.publisher
    }

    /// Start relaying with a fresh settings snapshot
    pub async fn start(&self) -> StatusEvent {
        let mut state = self.inner.state.lock().await;
        let config = self.inner.settings.snapshot().await;

        if let Err(e) = validate(&config) {
            warn!(source = %config.source_url, "Refusing to start stream: {}", e);
            metrics::record_stream_operation("start", "invalid_config");
            return self.emit(StatusEvent::failed(e.to_string()));
        }

        if let Some(active) = state.active {
            info!(
                pid = active.handle.process_id,
                "Stream already running, not spawning another"
            );
            metrics::record_stream_operation("start", "already_running");
            return self.emit(StatusEvent::streaming(true));
        }

        let command = FfmpegCommandBuilder::for_stream(&self.inner.ffmpeg_path, &config).build();
        debug!(program = %command.program, args = ?command.args, "Launching relay");

        match self.inner.launcher.spawn(&command).await {
            Ok(spawned) => {
                let active = ActiveStream {
                    handle: spawned.handle,
                    generation: state.next_generation,
                };
                state.next_generation += 1;
                state.active = Some(active);
                metrics::set_active_streams(1);
                metrics::record_stream_operation("start", "spawned");
                info!(
                    pid = active.handle.process_id,
                    pgid = active.handle.process_group_id,
                    destination = %config.destination_url,
                    "Stream started"
                );

                self.watch_exit(active, spawned.exit);
                self.emit(StatusEvent::streaming(true))
            }
            Err(e) => {
                error!("Failed to start stream: {}", e);
                metrics::record_stream_operation("start", "spawn_failed");
                self.emit(StatusEvent::failed(e.to_string()))
            }
        }
    }

    /// Terminate the relay's process group, if any
    pub async fn stop(&self) -> StatusEvent {
        let mut state = self.inner.state.lock().await;

        let Some(active) = state.active.take() else {
            debug!("Stop requested with no running stream");
            metrics::record_stream_operation("stop", "idle");
            return self.emit(StatusEvent::streaming(false));
        };
        metrics::set_active_streams(0);

        match self.inner.launcher.terminate_group(&active.handle) {
            Ok(()) => {
                info!(pgid = active.handle.process_group_id, "Stream stopped");
                metrics::record_stream_operation("stop", "terminated");
                self.emit(StatusEvent::streaming(false))
            }
            Err(e) => {
                warn!("Failed to stop stream cleanly: {}", e);
                metrics::record_stream_operation("stop", "signal_failed");
                self.emit(StatusEvent::failed(e.to_string()))
            }
        }
    }

    /// Report whether a relay is running
    pub async fn check_status(&self) -> StatusEvent {
        let state = self.inner.state.lock().await;
        metrics::record_stream_operation("check", "ok");
        self.emit(StatusEvent::streaming(state.active.is_some()))
    }

    /// Current status without publishing anything
    pub async fn is_streaming(&self) -> bool {
        self.inner.state.lock().await.active.is_some()
    }

    pub async fn current_handle(&self) -> Option<StreamHandle> {
        self.inner.state.lock().await.active.map(|a| a.handle)
    }

    fn emit(&self, event: StatusEvent) -> StatusEvent {
        self.inner.publisher.publish(event.clone());
        event
    }

    fn watch_exit(&self, active: ActiveStream, exit: ExitFuture) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let description = exit.await;
            let mut state = inner.state.lock().await;

            match state.active {
                Some(current) if current.generation == active.generation => {
                    state.active = None;
                    metrics::set_active_streams(0);
                    metrics::record_stream_operation("exit", "unexpected");
                    warn!(
                        pid = active.handle.process_id,
                        "Relay process exited on its own: {}", description
                    );
                    inner.publisher.publish(StatusEvent::failed(format!(
                        "ffmpeg exited unexpectedly: {description}"
                    )));
                }
                _ => debug!(pid = active.handle.process_id, "Relay process reaped: {}", description),
            }
        });
    }
}

fn validate(config: &StreamConfig) -> Result<(), StreamError> {
    // The host's webcam setting may be a path relative to its own web server
    if config.source_url.starts_with('/') {
        return Err(StreamError::Configuration(INVALID_WEBCAM_URL.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StreamerSettings, WebcamSettings};
    use crate::services::ffmpeg_command::FfmpegCommand;
    use crate::services::process::SpawnedProcess;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[derive(Default)]
    struct FakeLauncher {
        spawned: StdMutex<Vec<FfmpegCommand>>,
        terminated: StdMutex<Vec<StreamHandle>>,
        exits: StdMutex<Vec<oneshot::Sender<String>>>,
        fail_spawn: bool,
        fail_terminate: bool,
    }

    impl FakeLauncher {
        fn spawn_count(&self) -> usize {
            self.spawned.lock().unwrap().len()
        }

        fn terminate_count(&self) -> usize {
            self.terminated.lock().unwrap().len()
        }

        fn exit_last(&self, description: &str) {
            let sender = self.exits.lock().unwrap().pop().unwrap();
            sender.send(description.to_string()).unwrap();
        }
    }

    #[async_trait]
    impl ProcessLauncher for FakeLauncher {
        async fn spawn(&self, command: &FfmpegCommand) -> Result<SpawnedProcess, StreamError> {
            if self.fail_spawn {
                return Err(StreamError::Spawn {
                    program: command.program.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                });
            }
            let mut spawned = self.spawned.lock().unwrap();
            spawned.push(command.clone());
            let pid = 1000 + spawned.len() as u32;

            let (tx, rx) = oneshot::channel();
            self.exits.lock().unwrap().push(tx);
            Ok(SpawnedProcess {
                handle: StreamHandle {
                    process_id: pid,
                    process_group_id: pid as i32,
                },
                exit: Box::pin(async move {
                    match rx.await {
                        Ok(description) => description,
                        Err(_) => futures::future::pending::<String>().await,
                    }
                }),
            })
        }

        fn terminate_group(&self, handle: &StreamHandle) -> Result<(), StreamError> {
            self.terminated.lock().unwrap().push(*handle);
            if self.fail_terminate {
                return Err(StreamError::Signal {
                    pgid: handle.process_group_id,
                    message: "No such process".into(),
                });
            }
            Ok(())
        }
    }

    fn controller_with(launcher: Arc<FakeLauncher>, source_url: &str) -> StreamController {
        let settings = SettingsStore::new(
            StreamerSettings {
                stream_url: "rtmp://example/live".into(),
                ..StreamerSettings::default()
            },
            WebcamSettings {
                stream_url: source_url.into(),
                ..WebcamSettings::default()
            },
        );
        StreamController::new(
            "ffmpeg",
            settings,
            launcher,
            StatusPublisher::new("rtmpstreamer", 16),
        )
    }

    const CAMERA: &str = "http://192.168.0.2/webcam/?action=stream";

    #[tokio::test]
    async fn test_start_check_stop_scenario() {
        let launcher = Arc::new(FakeLauncher::default());
        let controller = controller_with(launcher.clone(), CAMERA);

        assert_eq!(controller.start().await, StatusEvent::streaming(true));
        let command = launcher.spawned.lock().unwrap()[0].clone();
        assert_eq!(command.arg_value("-filter:v"), Some("null"));
        assert_eq!(command.arg_value("-s"), Some("640x480"));
        assert_eq!(command.arg_value("-framerate"), Some("5"));

        assert_eq!(controller.check_status().await, StatusEvent::streaming(true));
        assert_eq!(controller.stop().await, StatusEvent::streaming(false));
        assert_eq!(launcher.terminate_count(), 1);
        assert!(!controller.is_streaming().await);
    }

    #[tokio::test]
    async fn test_local_path_source_never_spawns() {
        let launcher = Arc::new(FakeLauncher::default());
        let controller = controller_with(launcher.clone(), "/dev/video0");

        let event = controller.start().await;
        assert!(!event.streaming);
        assert!(event
            .error
            .as_deref()
            .unwrap()
            .starts_with("Webcam stream url is incorrect."));
        assert_eq!(launcher.spawn_count(), 0);
        assert!(controller.current_handle().await.is_none());
    }

    #[tokio::test]
    async fn test_double_start_spawns_once() {
        let launcher = Arc::new(FakeLauncher::default());
        let controller = controller_with(launcher.clone(), CAMERA);

        let (first, second) = tokio::join!(controller.start(), controller.start());
        assert!(first.streaming && second.streaming);
        assert_eq!(launcher.spawn_count(), 1);
    }

    #[tokio::test]
    async fn test_stop_when_idle_does_not_signal() {
        let launcher = Arc::new(FakeLauncher::default());
        let controller = controller_with(launcher.clone(), CAMERA);

        assert_eq!(controller.stop().await, StatusEvent::streaming(false));
        assert_eq!(launcher.terminate_count(), 0);
    }

    #[tokio::test]
    async fn test_spawn_failure_reports_error() {
        let launcher = Arc::new(FakeLauncher {
            fail_spawn: true,
            ..FakeLauncher::default()
        });
        let controller = controller_with(launcher, CAMERA);

        let event = controller.start().await;
        assert!(!event.streaming);
        assert_eq!(event.error.as_deref(), Some("failed to start ffmpeg: not found"));
        assert_eq!(controller.check_status().await, StatusEvent::streaming(false));
    }

    #[tokio::test]
    async fn test_signal_failure_still_clears_handle() {
        let launcher = Arc::new(FakeLauncher {
            fail_terminate: true,
            ..FakeLauncher::default()
        });
        let controller = controller_with(launcher.clone(), CAMERA);

        controller.start().await;
        let event = controller.stop().await;
        assert!(!event.streaming);
        assert!(event.error.is_some());
        assert!(!controller.is_streaming().await);

        // a fresh start is possible afterwards
        assert!(controller.start().await.streaming);
        assert_eq!(launcher.spawn_count(), 2);
    }

    #[tokio::test]
    async fn test_every_operation_publishes_once() {
        let launcher = Arc::new(FakeLauncher::default());
        let controller = controller_with(launcher, CAMERA);
        let mut rx = controller.publisher().subscribe();

        controller.check_status().await;
        controller.start().await;
        controller.start().await;
        controller.stop().await;

        let streaming: Vec<bool> = (0..4)
            .map(|_| rx.try_recv().unwrap().data.streaming)
            .collect();
        assert_eq!(streaming, vec![false, true, true, false]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unexpected_exit_clears_handle_and_reports() {
        let launcher = Arc::new(FakeLauncher::default());
        let controller = controller_with(launcher.clone(), CAMERA);
        let mut rx = controller.publisher().subscribe();

        controller.start().await;
        assert!(rx.recv().await.unwrap().data.streaming);

        launcher.exit_last("exit status: 1");
        let msg = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(!msg.data.streaming);
        assert_eq!(
            msg.data.error.as_deref(),
            Some("ffmpeg exited unexpectedly: exit status: 1")
        );
        assert!(!controller.is_streaming().await);
    }

    #[tokio::test]
    async fn test_exit_after_stop_is_silent() {
        let launcher = Arc::new(FakeLauncher::default());
        let controller = controller_with(launcher.clone(), CAMERA);

        controller.start().await;
        controller.stop().await;
        controller.start().await;

        let mut rx = controller.publisher().subscribe();
        // the first child finally exits; the second stream must be untouched
        let first_exit = launcher.exits.lock().unwrap().remove(0);
        first_exit.send("signal: 15 (SIGTERM)".into()).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(controller.is_streaming().await);
        assert!(rx.try_recv().is_err());
    }
}
