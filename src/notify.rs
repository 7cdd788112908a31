//! Notification dispatch seam
//!
//! Pending-task reminders are fire-and-forget from the core's perspective:
//! a dispatch failure is logged and never fails the operation that
//! triggered it.

use crate::identifiers::ActorId;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Delivery channel for a reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyChannel {
    /// In-app system message
    System,

    /// Email
    Email,
}

/// Notification collaborator
pub trait NotificationDispatcher: Send + Sync {
    /// Deliver `message` to `actors` over `channel`
    fn notify(&self, actors: &[ActorId], message: &str, channel: NotifyChannel)
        -> Result<(), String>;
}

/// Send a reminder over several channels, swallowing per-channel failures
pub fn notify_best_effort(
    dispatcher: &dyn NotificationDispatcher,
    actors: &[ActorId],
    message: &str,
    channels: &[NotifyChannel],
) {
    if actors.is_empty() {
        return;
    }
    for channel in channels {
        if let Err(error) = dispatcher.notify(actors, message, *channel) {
            warn!(?channel, %error, "notification dispatch failed");
        }
    }
}

/// Dispatcher that records deliveries, for tests and headless embedding
#[derive(Default)]
pub struct RecordingDispatcher {
    deliveries: std::sync::RwLock<Vec<(Vec<ActorId>, String, NotifyChannel)>>,
}

impl RecordingDispatcher {
    /// Create an empty recording dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delivery so far
    pub fn deliveries(&self) -> Vec<(Vec<ActorId>, String, NotifyChannel)> {
        self.deliveries.read().unwrap().clone()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn notify(
        &self,
        actors: &[ActorId],
        message: &str,
        channel: NotifyChannel,
    ) -> Result<(), String> {
        self.deliveries
            .write()
            .unwrap()
            .push((actors.to_vec(), message.to_string(), channel));
        Ok(())
    }
}
