//! Per-job status state machine.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{JobId, JobStatus, StatusEvent};

/// Outcome of applying a status event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Stale, duplicate, or arrived after a terminal state.
    Ignored,
    /// Accepted non-terminal change.
    Progressed,
    /// Terminal status reported. The state is left untouched until the
    /// outcome is confirmed and committed through [`JobState::settle`].
    Terminal,
}

fn rank(status: JobStatus) -> u8 {
    match status {
        JobStatus::Queued => 0,
        JobStatus::Running => 1,
        _ => 2,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobState {
    status: JobStatus,
    progress: u8,
    message: String,
    updated_at: DateTime<Utc>,
}

impl Default for JobState {
    fn default() -> Self {
        Self {
            status: JobStatus::Queued,
            progress: 0,
            message: "Job submitted".to_string(),
            updated_at: Utc::now(),
        }
    }
}

impl JobState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Current state as a status event.
    pub fn event(&self) -> StatusEvent {
        StatusEvent::new(self.status, self.progress, &self.message)
    }

    /// Applies an event from either channel.
    ///
    /// Non-terminal events must not lower progress or move the status
    /// backwards. Terminal events are only reported, whatever their
    /// progress, unless the job is already terminal.
    pub fn apply(&mut self, event: &StatusEvent) -> Transition {
        if self.is_terminal() {
            return Transition::Ignored;
        }
        if event.status.is_terminal() {
            return Transition::Terminal;
        }

        if event.progress < self.progress || rank(event.status) < rank(self.status) {
            return Transition::Ignored;
        }
        if event.status == self.status
            && event.progress == self.progress
            && event.message == self.message
        {
            return Transition::Ignored;
        }

        self.status = event.status;
        self.progress = event.progress;
        self.message = event.message.clone();
        self.updated_at = Utc::now();
        Transition::Progressed
    }

    /// Commits the terminal status. The first commit wins; returns false
    /// when the job was already terminal. Completed jobs report full
    /// progress, any other outcome keeps the progress reached.
    pub fn settle(&mut self, status: JobStatus, message: &str) -> bool {
        if self.is_terminal() || !status.is_terminal() {
            return false;
        }
        self.status = status;
        if status == JobStatus::Completed {
            self.progress = 100;
        }
        self.message = message.to_string();
        self.updated_at = Utc::now();
        true
    }

    /// Local cancellation. Returns false when the job was already terminal.
    pub fn cancel(&mut self) -> bool {
        self.settle(JobStatus::Cancelled, "Job cancelled")
    }

    pub fn snapshot(&self, job_id: &JobId) -> JobSnapshot {
        JobSnapshot {
            job_id: job_id.clone(),
            status: self.status,
            progress: self.progress,
            message: self.message.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Point-in-time view of a tracked job.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    pub updated_at: DateTime<Utc>,
}
