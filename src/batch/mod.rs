//! Per-user batch coordination
//!
//! Uploads from one user are grouped into a batch job. A job opens on the
//! first file, accepts more files while it is Open (each arrival resets the
//! inactivity window), and closes when the cap is reached, the window
//! expires, or the hard timeout fires. A closed job drains its entries
//! strictly in arrival order; a user has at most one job at a time.
//!
//! The coordinator only manages state. Draining (validation, conversion,
//! replies) is driven by the Telegram layer, which calls
//! [`BatchCoordinator::close_when_ready`] from a spawned task.

use std::collections::HashMap;
use std::time::Duration;
use teloxide::types::{ChatId, MessageId};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use crate::core::config;

/// One file queued for conversion
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Lifecycle of a batch job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Open,
    Closed,
    Processing,
}

/// Reasons an upload cannot join a batch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("batch is full ({0} files)")]
    Full(usize),

    #[error("previous batch is still processing")]
    Busy,
}

/// Result of pushing a file into the coordinator
#[derive(Debug, PartialEq, Eq)]
pub enum PushOutcome {
    /// A new job was opened; the caller owns spawning the drain task
    Started { job_id: String },
    /// The file joined an existing open job
    Added { count: usize },
}

struct BatchJob {
    id: String,
    state: BatchState,
    entries: Vec<BatchEntry>,
    opened_at: Instant,
    last_arrival: Instant,
    status_message: Option<MessageId>,
}

impl BatchJob {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            id: Uuid::new_v4().to_string(),
            state: BatchState::Open,
            entries: Vec::new(),
            opened_at: now,
            last_arrival: now,
            status_message: None,
        }
    }
}

/// Coordinates one batch job per user
pub struct BatchCoordinator {
    max_entries: usize,
    inactivity_window: Duration,
    check_interval: Duration,
    hard_timeout: Duration,
    jobs: Mutex<HashMap<i64, BatchJob>>,
}

impl BatchCoordinator {
    pub fn new() -> Self {
        Self::with_limits(
            config::batch::MAX_BATCH_SIZE,
            config::batch::inactivity_window(),
            config::batch::check_interval(),
            config::batch::hard_timeout(),
        )
    }

    /// Coordinator with explicit limits, used by tests
    pub fn with_limits(
        max_entries: usize,
        inactivity_window: Duration,
        check_interval: Duration,
        hard_timeout: Duration,
    ) -> Self {
        Self {
            max_entries,
            inactivity_window,
            check_interval,
            hard_timeout,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Add a file to the user's batch, opening a new job if none exists.
    ///
    /// Returns `Full` when the job already holds the maximum number of
    /// entries and `Busy` when the previous job is still draining.
    pub async fn push(&self, user_id: i64, chat_id: ChatId, entry: BatchEntry) -> Result<PushOutcome, BatchError> {
        let mut jobs = self.jobs.lock().await;

        match jobs.get_mut(&user_id) {
            None => {
                let mut job = BatchJob::new();
                job.entries.push(entry);
                let job_id = job.id.clone();
                log::info!("Opened batch {} for user {} in chat {}", job_id, user_id, chat_id);
                jobs.insert(user_id, job);
                Ok(PushOutcome::Started { job_id })
            }
            Some(job) if job.state != BatchState::Open => Err(BatchError::Busy),
            Some(job) if job.entries.len() >= self.max_entries => Err(BatchError::Full(self.max_entries)),
            Some(job) => {
                job.entries.push(entry);
                job.last_arrival = Instant::now();
                Ok(PushOutcome::Added {
                    count: job.entries.len(),
                })
            }
        }
    }

    /// Attach the status message the drain task will keep editing
    pub async fn set_status_message(&self, user_id: i64, message_id: MessageId) {
        if let Some(job) = self.jobs.lock().await.get_mut(&user_id) {
            job.status_message = Some(message_id);
        }
    }

    pub async fn status_message(&self, user_id: i64) -> Option<MessageId> {
        self.jobs.lock().await.get(&user_id).and_then(|job| job.status_message)
    }

    pub async fn entry_count(&self, user_id: i64) -> usize {
        self.jobs.lock().await.get(&user_id).map(|job| job.entries.len()).unwrap_or(0)
    }

    /// Wait until the user's open job is ready to drain, close it, and take
    /// its entries in arrival order.
    ///
    /// A job is ready when it reached the entry cap, the inactivity window
    /// elapsed since the last arrival, or the hard timeout elapsed since it
    /// opened. The mutex is released between checks so arrivals are never
    /// blocked.
    pub async fn close_when_ready(&self, user_id: i64) -> Vec<BatchEntry> {
        loop {
            {
                let mut jobs = self.jobs.lock().await;
                let Some(job) = jobs.get_mut(&user_id) else {
                    return Vec::new();
                };

                let ready = job.entries.len() >= self.max_entries
                    || job.last_arrival.elapsed() >= self.inactivity_window
                    || job.opened_at.elapsed() >= self.hard_timeout;

                if ready {
                    job.state = BatchState::Closed;
                    let entries = std::mem::take(&mut job.entries);
                    job.state = BatchState::Processing;
                    log::info!("Closed batch {} for user {} with {} file(s)", job.id, user_id, entries.len());
                    return entries;
                }
            }

            tokio::time::sleep(self.check_interval).await;
        }
    }

    /// Drop the user's job; the next upload starts a fresh batch
    pub async fn finish(&self, user_id: i64) {
        if let Some(job) = self.jobs.lock().await.remove(&user_id) {
            log::info!("Finished batch {} for user {}", job.id, user_id);
        }
    }
}

impl Default for BatchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: i64 = 42;
    const CHAT: ChatId = ChatId(42);

    fn entry(name: &str) -> BatchEntry {
        BatchEntry {
            filename: name.to_string(),
            data: b"<svg/>".to_vec(),
        }
    }

    fn coordinator(max: usize) -> BatchCoordinator {
        BatchCoordinator::with_limits(
            max,
            Duration::from_secs(3),
            Duration::from_millis(50),
            Duration::from_secs(300),
        )
    }

    #[tokio::test]
    async fn test_first_push_starts_a_job() {
        let coordinator = coordinator(15);
        let outcome = coordinator.push(USER, CHAT, entry("a.svg")).await.unwrap();
        assert!(matches!(outcome, PushOutcome::Started { .. }));
        assert_eq!(coordinator.entry_count(USER).await, 1);
    }

    #[tokio::test]
    async fn test_following_pushes_join_the_job() {
        let coordinator = coordinator(15);
        coordinator.push(USER, CHAT, entry("a.svg")).await.unwrap();
        let outcome = coordinator.push(USER, CHAT, entry("b.svg")).await.unwrap();
        assert_eq!(outcome, PushOutcome::Added { count: 2 });
    }

    #[tokio::test]
    async fn test_push_past_cap_is_rejected() {
        let coordinator = coordinator(3);
        for i in 0..3 {
            coordinator.push(USER, CHAT, entry(&format!("{}.svg", i))).await.unwrap();
        }
        let result = coordinator.push(USER, CHAT, entry("overflow.svg")).await;
        assert_eq!(result, Err(BatchError::Full(3)));
        assert_eq!(coordinator.entry_count(USER).await, 3);
    }

    #[tokio::test]
    async fn test_distinct_users_have_distinct_jobs() {
        let coordinator = coordinator(15);
        coordinator.push(USER, CHAT, entry("a.svg")).await.unwrap();
        let outcome = coordinator.push(USER + 1, ChatId(43), entry("b.svg")).await.unwrap();
        assert!(matches!(outcome, PushOutcome::Started { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_when_ready_waits_for_inactivity_window() {
        let coordinator = coordinator(15);
        coordinator.push(USER, CHAT, entry("a.svg")).await.unwrap();
        coordinator.push(USER, CHAT, entry("b.svg")).await.unwrap();

        let entries = coordinator.close_when_ready(USER).await;
        let names: Vec<&str> = entries.iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(names, vec!["a.svg", "b.svg"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_job_closes_without_waiting() {
        let coordinator = BatchCoordinator::with_limits(
            2,
            Duration::from_secs(3600),
            Duration::from_millis(50),
            Duration::from_secs(7200),
        );
        coordinator.push(USER, CHAT, entry("a.svg")).await.unwrap();
        coordinator.push(USER, CHAT, entry("b.svg")).await.unwrap();

        // The inactivity window is an hour; only the cap can close this job
        let entries = coordinator.close_when_ready(USER).await;
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_while_processing_is_busy() {
        let coordinator = coordinator(15);
        coordinator.push(USER, CHAT, entry("a.svg")).await.unwrap();
        let _entries = coordinator.close_when_ready(USER).await;

        let result = coordinator.push(USER, CHAT, entry("late.svg")).await;
        assert_eq!(result, Err(BatchError::Busy));
    }

    #[tokio::test(start_paused = true)]
    async fn test_finish_allows_a_new_batch() {
        let coordinator = coordinator(15);
        coordinator.push(USER, CHAT, entry("a.svg")).await.unwrap();
        let _entries = coordinator.close_when_ready(USER).await;
        coordinator.finish(USER).await;

        let outcome = coordinator.push(USER, CHAT, entry("b.svg")).await.unwrap();
        assert!(matches!(outcome, PushOutcome::Started { .. }));
    }

    #[tokio::test]
    async fn test_status_message_round_trip() {
        let coordinator = coordinator(15);
        coordinator.push(USER, CHAT, entry("a.svg")).await.unwrap();
        assert_eq!(coordinator.status_message(USER).await, None);

        coordinator.set_status_message(USER, MessageId(7)).await;
        assert_eq!(coordinator.status_message(USER).await, Some(MessageId(7)));
    }

    #[tokio::test]
    async fn test_close_with_no_job_returns_empty() {
        let coordinator = coordinator(15);
        assert!(coordinator.close_when_ready(USER).await.is_empty());
    }
}
