//! Data types shared by the stream controller, the settings store and the
//! HTTP layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output frame size, written as `WxH` everywhere it crosses a boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("resolution '{s}' must be formatted as WxH"))?;
        let width = w
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid resolution width in '{s}'"))?;
        let height = h
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid resolution height in '{s}'"))?;
        if width == 0 || height == 0 {
            return Err(format!("resolution '{s}' must have non-zero dimensions"));
        }
        Ok(Self { width, height })
    }
}

impl TryFrom<String> for Resolution {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

/// Snapshot of everything needed to launch one relay.
///
/// Taken when a stream starts; editing settings afterwards does not touch a
/// running stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    pub source_url: String,
    pub resolution: Resolution,
    pub framerate: u32,
    pub destination_url: String,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub rotate_90: bool,
}

/// Identity of the live ffmpeg child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHandle {
    pub process_id: u32,
    pub process_group_id: i32,
}

/// Outcome of a controller operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub streaming: bool,
    pub error: Option<String>,
}

impl StatusEvent {
    pub fn streaming(streaming: bool) -> Self {
        Self {
            streaming,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            streaming: false,
            error: Some(error.into()),
        }
    }
}

/// Wire payload pushed to subscribers: `{status: true, streaming, error?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub status: bool,
    pub streaming: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<StatusEvent> for StatusPayload {
    fn from(event: StatusEvent) -> Self {
        Self {
            status: true,
            streaming: event.streaming,
            error: event.error,
        }
    }
}

/// Message on the plugin's pub/sub channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMessage {
    pub plugin: String,
    pub data: StatusPayload,
    pub timestamp: i64,
}

impl PluginMessage {
    pub fn new(plugin: impl Into<String>, event: StatusEvent) -> Self {
        Self {
            plugin: plugin.into(),
            data: event.into(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
