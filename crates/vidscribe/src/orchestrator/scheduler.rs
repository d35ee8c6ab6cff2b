//! Background polling, one cancellable task per tracked video.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::poller::StatusPoller;
use crate::broadcast::{ProgressBroadcaster, ProgressEvent};
use crate::config::PollingConfig;
use crate::error::TranscriptionError;
use crate::model::TranscriptionStatus;

/// Why a polling task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollExit {
    /// A terminal state is stored, or there is no job to poll.
    Settled,
    Cancelled,
    /// The ceiling elapsed first; the video is still `in_progress`.
    TimedOut,
    VideoMissing,
}

struct PollTask {
    generation: u64,
    token: CancellationToken,
    handle: JoinHandle<PollExit>,
}

type TaskMap = Arc<Mutex<HashMap<String, PollTask>>>;

/// Drives [`StatusPoller::check_progress`] on a fixed interval for each
/// tracked video until it settles, is stopped, or hits the ceiling.
#[derive(Clone)]
pub struct PollScheduler {
    poller: StatusPoller,
    broadcaster: ProgressBroadcaster,
    interval: Duration,
    ceiling: Duration,
    root: CancellationToken,
    tasks: TaskMap,
    next_generation: Arc<AtomicU64>,
}

impl PollScheduler {
    pub fn new(poller: StatusPoller, broadcaster: ProgressBroadcaster, polling: &PollingConfig) -> Self {
        Self {
            poller,
            broadcaster,
            interval: polling.interval(),
            ceiling: polling.ceiling(),
            root: CancellationToken::new(),
            tasks: Arc::new(Mutex::new(HashMap::new())),
            next_generation: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Starts polling `video_id`. Returns false if it is already tracked
    /// or the scheduler has been shut down.
    pub fn track(&self, video_id: &str) -> bool {
        if self.root.is_cancelled() {
            warn!("Scheduler is shut down, not tracking video {}", video_id);
            return false;
        }

        let mut tasks = lock(&self.tasks);
        if tasks.get(video_id).is_some_and(|t| !t.handle.is_finished()) {
            debug!("Video {} is already being polled", video_id);
            return false;
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = self.root.child_token();
        let run = PollRun {
            poller: self.poller.clone(),
            broadcaster: self.broadcaster.clone(),
            video_id: video_id.to_string(),
            interval: self.interval,
            ceiling: self.ceiling,
            token: token.clone(),
        };

        // The map lock is held until the entry is in place, so the task's
        // own cleanup cannot run before the insert.
        let map = Arc::clone(&self.tasks);
        let handle = tokio::spawn(async move {
            let video_id = run.video_id.clone();
            let exit = run.run().await;
            let mut tasks = lock(&map);
            if tasks.get(&video_id).is_some_and(|t| t.generation == generation) {
                tasks.remove(&video_id);
            }
            exit
        });

        tasks.insert(
            video_id.to_string(),
            PollTask {
                generation,
                token,
                handle,
            },
        );
        info!("Polling video {} every {:?}", video_id, self.interval);
        true
    }

    /// Stops polling `video_id` and waits for the task to finish.
    /// Returns false if the video was not tracked.
    pub async fn stop(&self, video_id: &str) -> bool {
        let task = lock(&self.tasks).remove(video_id);
        let Some(task) = task else {
            return false;
        };

        task.token.cancel();
        if let Err(e) = task.handle.await {
            error!("Polling task for video {} panicked: {}", video_id, e);
        }
        debug!("Stopped polling video {}", video_id);
        true
    }

    pub fn is_tracking(&self, video_id: &str) -> bool {
        lock(&self.tasks)
            .get(video_id)
            .is_some_and(|t| !t.handle.is_finished())
    }

    pub fn tracked_count(&self) -> usize {
        lock(&self.tasks)
            .values()
            .filter(|t| !t.handle.is_finished())
            .count()
    }

    /// Cancels every task and waits for them. Later `track` calls are refused.
    pub async fn shutdown(&self) {
        self.root.cancel();
        let tasks: Vec<(String, PollTask)> = lock(&self.tasks).drain().collect();
        for (video_id, task) in tasks {
            if let Err(e) = task.handle.await {
                error!("Polling task for video {} panicked: {}", video_id, e);
            }
        }
        info!("Poll scheduler shut down");
    }
}

/// A poisoned map only means a task panicked mid-update; the map itself is intact.
fn lock(tasks: &TaskMap) -> MutexGuard<'_, HashMap<String, PollTask>> {
    tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct PollRun {
    poller: StatusPoller,
    broadcaster: ProgressBroadcaster,
    video_id: String,
    interval: Duration,
    ceiling: Duration,
    token: CancellationToken,
}

impl PollRun {
    async fn run(self) -> PollExit {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let deadline = tokio::time::sleep(self.ceiling);
        tokio::pin!(deadline);
        let mut job_name: Option<String> = None;

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => return PollExit::Cancelled,
                _ = &mut deadline => {
                    warn!(
                        "Polling video {} gave up after {:?} without a terminal state",
                        self.video_id, self.ceiling
                    );
                    self.broadcaster
                        .send(ProgressEvent::stale(&self.video_id, job_name.as_deref()));
                    return PollExit::TimedOut;
                }
                _ = ticker.tick() => {}
            }

            match self.poller.check_progress(&self.video_id).await {
                Ok(snapshot) => {
                    if snapshot.is_terminal() || snapshot.status == TranscriptionStatus::NotStarted {
                        debug!("Video {} settled as {}", self.video_id, snapshot.status);
                        return PollExit::Settled;
                    }
                    job_name = snapshot.job_name;
                }
                Err(TranscriptionError::VideoNotFound(_)) => {
                    warn!("Video {} disappeared, stopping its poll", self.video_id);
                    return PollExit::VideoMissing;
                }
                Err(e) if e.is_transient() => {
                    warn!("Status check for video {} failed, retrying: {}", self.video_id, e);
                }
                Err(e) => {
                    error!("Status check for video {} failed: {}", self.video_id, e);
                }
            }
        }
    }
}
