/// Settings store
///
/// Holds the current plugin settings (replaceable at runtime) next to the
/// host-owned webcam settings, and produces the immutable [`StreamConfig`]
/// snapshot a stream starts from.
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::{StreamerSettings, WebcamSettings};
use crate::models::StreamConfig;

#[derive(Clone)]
pub struct SettingsStore {
    streamer: Arc<RwLock<StreamerSettings>>,
    webcam: Arc<WebcamSettings>,
}

impl SettingsStore {
    pub fn new(streamer: StreamerSettings, webcam: WebcamSettings) -> Self {
        Self {
            streamer: Arc::new(RwLock::new(streamer)),
            webcam: Arc::new(webcam),
        }
    }

    pub async fn streamer(&self) -> StreamerSettings {
        self.streamer.read().await.clone()
    }

    pub fn webcam(&self) -> &WebcamSettings {
        &self.webcam
    }

    /// Replace the plugin settings after validating them
    pub async fn update(&self, settings: StreamerSettings) -> Result<StreamerSettings, String> {
        settings.validate()?;
        let mut current = self.streamer.write().await;
        *current = settings.clone();
        Ok(settings)
    }

    pub async fn snapshot(&self) -> StreamConfig {
        let streamer = self.streamer.read().await;
        StreamConfig {
            source_url: self.webcam.stream_url.clone(),
            resolution: streamer.stream_resolution,
            framerate: streamer.stream_framerate,
            destination_url: streamer.stream_url.clone(),
            flip_horizontal: self.webcam.flip_horizontal,
            flip_vertical: self.webcam.flip_vertical,
            rotate_90: self.webcam.rotate_90,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Resolution;

    #[tokio::test]
    async fn test_snapshot_combines_both_sources() {
        let store = SettingsStore::new(
            StreamerSettings {
                stream_url: "rtmp://example/live".into(),
                stream_resolution: Resolution::new(1280, 720),
                stream_framerate: 10,
                ..StreamerSettings::default()
            },
            WebcamSettings {
                stream_url: "http://cam/stream".into(),
                flip_vertical: true,
                ..WebcamSettings::default()
            },
        );

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.source_url, "http://cam/stream");
        assert_eq!(snapshot.destination_url, "rtmp://example/live");
        assert_eq!(snapshot.resolution, Resolution::new(1280, 720));
        assert_eq!(snapshot.framerate, 10);
        assert!(snapshot.flip_vertical);
        assert!(!snapshot.flip_horizontal);
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_settings() {
        let store = SettingsStore::new(StreamerSettings::default(), WebcamSettings::default());
        let invalid = StreamerSettings {
            stream_framerate: 0,
            ..StreamerSettings::default()
        };
        assert!(store.update(invalid).await.is_err());
        assert_eq!(store.streamer().await.stream_framerate, 5);
    }

    #[tokio::test]
    async fn test_snapshot_is_detached_from_later_updates() {
        let store = SettingsStore::new(StreamerSettings::default(), WebcamSettings::default());
        let before = store.snapshot().await;

        store
            .update(StreamerSettings {
                stream_url: "rtmp://other/live".into(),
                ..StreamerSettings::default()
            })
            .await
            .unwrap();

        assert_eq!(before.destination_url, "");
        assert_eq!(store.snapshot().await.destination_url, "rtmp://other/live");
    }
}
