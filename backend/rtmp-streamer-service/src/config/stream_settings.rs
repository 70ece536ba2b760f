/// Stream Settings
///
/// The plugin's own options (editable at runtime) and the webcam options owned
/// by the printer host, which this service only reads.
use serde::{Deserialize, Serialize};

use crate::models::Resolution;

/// Plugin options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerSettings {
    /// Where viewers watch the stream; display only
    pub view_url: String,
    /// RTMP destination; must be set before a stream can start
    pub stream_url: String,
    /// Output frame size
    pub stream_resolution: Resolution,
    /// Input and output frame rate
    pub stream_framerate: u32,
    /// Legacy flag kept for settings compatibility, never read
    pub streaming: bool,
    /// Start on print start, stop on print done/cancelled
    pub auto_start: bool,
    /// Start once when the service comes up
    pub auto_start_on_power_up: bool,
}

impl Default for StreamerSettings {
    fn default() -> Self {
        Self {
            view_url: String::new(),
            stream_url: String::new(),
            stream_resolution: Resolution::default(),
            stream_framerate: 5,
            streaming: false,
            auto_start: false,
            auto_start_on_power_up: false,
        }
    }
}

impl StreamerSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.stream_framerate == 0 {
            return Err("stream_framerate must be a positive integer".into());
        }
        Ok(())
    }

    pub fn has_destination(&self) -> bool {
        !self.stream_url.trim().is_empty()
    }
}

/// Webcam options owned by the printer host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebcamSettings {
    /// MJPEG stream URL as configured on the host
    pub stream_url: String,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub rotate_90: bool,
}

impl Default for WebcamSettings {
    fn default() -> Self {
        Self {
            stream_url: "/webcam/?action=stream".to_string(),
            flip_horizontal: false,
            flip_vertical: false,
            rotate_90: false,
        }
    }
}
