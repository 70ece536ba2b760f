/// Status publisher
///
/// Pub/sub sink for controller outcomes. Every message is tagged with the
/// plugin identifier; subscribers (WebSocket sessions, tests) receive them
/// through a tokio broadcast channel.
use tokio::sync::broadcast;
use tracing::debug;

use crate::models::{PluginMessage, StatusEvent};

#[derive(Clone)]
pub struct StatusPublisher {
    identifier: String,
    sender: broadcast::Sender<PluginMessage>,
}

impl StatusPublisher {
    pub fn new(identifier: impl Into<String>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            identifier: identifier.into(),
            sender,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Publish one event; returns how many subscribers received it
    pub fn publish(&self, event: StatusEvent) -> usize {
        let message = PluginMessage::new(self.identifier.clone(), event);
        match self.sender.send(message) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!(plugin = %self.identifier, "No status subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PluginMessage> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
