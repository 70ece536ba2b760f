/// Printer lifecycle dispatcher
///
/// Maps host events onto controller calls according to the auto-start
/// options. Events the plugin does not care about are ignored.
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::StatusEvent;
use crate::services::stream_controller::StreamController;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrinterEvent {
    PrintStarted,
    PrintDone,
    PrintCancelled,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventNotification {
    pub event: PrinterEvent,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

/// Handle one host event; `None` when the event triggered nothing
pub async fn dispatch(controller: &StreamController, event: &PrinterEvent) -> Option<StatusEvent> {
    let settings = controller.settings().streamer().await;
    if !settings.auto_start {
        return None;
    }

    match event {
        PrinterEvent::PrintStarted => {
            info!("Print started, auto starting stream");
            Some(controller.start().await)
        }
        PrinterEvent::PrintDone | PrinterEvent::PrintCancelled => {
            info!(?event, "Print finished, auto stopping stream");
            Some(controller.stop().await)
        }
        PrinterEvent::Other => None,
    }
}

/// Startup hook: start once if configured to stream on power-up
pub async fn on_startup(controller: &StreamController) -> Option<StatusEvent> {
    let settings = controller.settings().streamer().await;
    if settings.auto_start_on_power_up && settings.has_destination() {
        info!("Auto starting stream on start up");
        Some(controller.start().await)
    } else {
        None
    }
}
