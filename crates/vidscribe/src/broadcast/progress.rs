//! Progress broadcaster fed by status checks and the poll scheduler.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::model::{ProgressSnapshot, TranscriptionStatus};

/// One observed progress state of a video's transcription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub video_id: String,
    pub snapshot: ProgressSnapshot,
    /// Set when polling stopped at its time ceiling without a terminal state.
    #[serde(default)]
    pub stale: bool,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(video_id: &str, snapshot: ProgressSnapshot) -> Self {
        Self {
            video_id: video_id.to_string(),
            snapshot,
            stale: false,
            timestamp: Utc::now(),
        }
    }

    pub fn stale(video_id: &str, job_name: Option<&str>) -> Self {
        Self {
            stale: true,
            ..Self::new(video_id, ProgressSnapshot::stale(job_name))
        }
    }

    pub fn status(&self) -> TranscriptionStatus {
        self.snapshot.status
    }

    pub fn is_terminal(&self) -> bool {
        self.snapshot.is_terminal()
    }
}

/// Fan-out of [`ProgressEvent`]s. Cloning shares the same channel.
#[derive(Clone)]
pub struct ProgressBroadcaster {
    sender: Arc<broadcast::Sender<ProgressEvent>>,
}

impl ProgressBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends to all current subscribers.
    pub fn send(&self, event: ProgressEvent) {
        // No active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn publish(&self, video_id: &str, snapshot: &ProgressSnapshot) {
        self.send(ProgressEvent::new(video_id, snapshot.clone()));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ProgressBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}
