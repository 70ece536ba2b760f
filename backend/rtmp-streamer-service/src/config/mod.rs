//! Configuration module for RTMP Streamer Service
//!
//! Everything is read from the environment (a `.env` file is honoured) once at
//! startup and validated before the server binds.

pub mod stream_settings;

pub use stream_settings::{StreamerSettings, WebcamSettings};

use crate::error::AppError;
use crate::models::Resolution;
use dotenvy::dotenv;
use std::env;

pub const DEFAULT_PLUGIN_IDENTIFIER: &str = "rtmpstreamer";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct PluginConfig {
    /// Identifier of the pub/sub channel and the API path segment
    pub identifier: String,
    /// Key callers must present; `None` rejects every caller
    pub api_key: Option<String>,
    pub ffmpeg_path: String,
    pub status_channel_capacity: usize,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub plugin: PluginConfig,
    pub streamer: StreamerSettings,
    pub webcam: WebcamSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("PORT '{v}' is not a valid port")))?,
            None => 8095,
        };
        let server = ServerConfig {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
        };

        let status_channel_capacity = match var("STATUS_CHANNEL_CAPACITY") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    AppError::Config(format!("STATUS_CHANNEL_CAPACITY '{v}' must be positive"))
                })?,
            None => 64,
        };
        let plugin = PluginConfig {
            identifier: var("PLUGIN_IDENTIFIER")
                .unwrap_or_else(|| DEFAULT_PLUGIN_IDENTIFIER.into()),
            api_key: var("API_KEY"),
            ffmpeg_path: var("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".into()),
            status_channel_capacity,
        };

        let defaults = StreamerSettings::default();
        let stream_resolution = match var("RTMP_STREAM_RESOLUTION") {
            Some(v) => v.parse::<Resolution>().map_err(AppError::Config)?,
            None => defaults.stream_resolution,
        };
        let stream_framerate = match var("RTMP_STREAM_FRAMERATE") {
            Some(v) => v.trim().parse::<u32>().map_err(|_| {
                AppError::Config(format!("RTMP_STREAM_FRAMERATE '{v}' is not an integer"))
            })?,
            None => defaults.stream_framerate,
        };
        let streamer = StreamerSettings {
            view_url: var("RTMP_VIEW_URL").unwrap_or_default(),
            stream_url: var("RTMP_STREAM_URL").unwrap_or_default(),
            stream_resolution,
            stream_framerate,
            streaming: flag(var("RTMP_STREAMING")),
            auto_start: flag(var("RTMP_AUTO_START")),
            auto_start_on_power_up: flag(var("RTMP_AUTO_START_ON_POWER_UP")),
        };
        streamer.validate().map_err(AppError::Config)?;

        let webcam = WebcamSettings {
            stream_url: var("WEBCAM_STREAM_URL")
                .unwrap_or_else(|| WebcamSettings::default().stream_url),
            flip_horizontal: flag(var("WEBCAM_FLIP_H")),
            flip_vertical: flag(var("WEBCAM_FLIP_V")),
            rotate_90: flag(var("WEBCAM_ROTATE_90")),
        };

        Ok(Self {
            server,
            plugin,
            streamer,
            webcam,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn flag(value: Option<String>) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case("true") || v.trim() == "1")
        .unwrap_or(false)
}
