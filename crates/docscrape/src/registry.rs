//! In-memory run registry
//!
//! Tracks scrape runs launched by a driving process: id, target,
//! lifecycle status and the cancellation token for each. State is held
//! behind a mutex so status updates and cancellation requests may come
//! from any task.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Lifecycle of a tracked run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// One tracked run
#[derive(Debug, Clone)]
pub struct RunEntry {
    pub id: Uuid,
    pub base_url: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub cancel: CancellationToken,
}

/// Registry of runs keyed by id
#[derive(Default)]
pub struct RunRegistry {
    runs: Mutex<HashMap<Uuid, RunEntry>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new running entry and return it
    pub fn create(&self, base_url: &str, cancel: CancellationToken) -> RunEntry {
        let entry = RunEntry {
            id: Uuid::new_v4(),
            base_url: base_url.to_string(),
            status: RunStatus::Running,
            started_at: Utc::now(),
            ended_at: None,
            error: None,
            cancel,
        };
        self.lock().insert(entry.id, entry.clone());
        entry
    }

    pub fn get(&self, id: Uuid) -> Option<RunEntry> {
        self.lock().get(&id).cloned()
    }

    /// Mark a run finished without error
    ///
    /// A run whose token was cancelled ends as `Cancelled` even when
    /// its loop completed normally afterwards.
    pub fn mark_completed(&self, id: Uuid) {
        self.finish(id, None);
    }

    pub fn mark_failed(&self, id: Uuid, error: &str) {
        self.finish(id, Some(error.to_string()));
    }

    /// Request cooperative cancellation of a run; false if unknown
    pub fn cancel(&self, id: Uuid) -> bool {
        match self.lock().get(&id) {
            Some(entry) => {
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: Uuid) -> Option<RunEntry> {
        self.lock().remove(&id)
    }

    pub fn list(&self) -> Vec<RunEntry> {
        let mut entries: Vec<RunEntry> = self.lock().values().cloned().collect();
        entries.sort_by_key(|entry| entry.started_at);
        entries
    }

    fn finish(&self, id: Uuid, error: Option<String>) {
        if let Some(entry) = self.lock().get_mut(&id) {
            entry.status = match (&error, entry.cancel.is_cancelled()) {
                (Some(_), _) => RunStatus::Failed,
                (None, true) => RunStatus::Cancelled,
                (None, false) => RunStatus::Completed,
            };
            entry.error = error;
            entry.ended_at = Some(Utc::now());
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, RunEntry>> {
        self.runs.lock().unwrap_or_else(|e| e.into_inner())
    }
}
