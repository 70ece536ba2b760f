//! Service Layer for RTMP Streamer Service
//!
//! - Stream lifecycle (start / stop / status) around one ffmpeg child
//! - ffmpeg argument construction
//! - Status fan-out to subscribers
//! - Printer event dispatch

pub mod ffmpeg_command;
pub mod lifecycle;
pub mod process;
pub mod settings_store;
pub mod status_publisher;
pub mod stream_controller;

pub use ffmpeg_command::{video_filters, FfmpegCommand, FfmpegCommandBuilder};
pub use lifecycle::{EventNotification, PrinterEvent};
pub use process::{ExitFuture, ProcessLauncher, SpawnedProcess};
#[cfg(unix)]
pub use process::SystemProcessLauncher;
pub use settings_store::SettingsStore;
pub use status_publisher::StatusPublisher;
pub use stream_controller::{StreamController, INVALID_WEBCAM_URL};
