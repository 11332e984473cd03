//! Job records and status events exchanged with the analysis backend.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::analysis::{aggregate_with_topics, audit, AuditRecord, Hierarchy, NodeRef};
use crate::error::JobError;
use crate::model::item::{ClassifiedItem, TopicLabel};

/// Opaque, server-assigned job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[serde(alias = "pending")]
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Returns true for states from which no further transition occurs.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Accepts any non-negative integer and clamps it into `0..=100`.
fn deserialize_progress<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.clamp(0.0, 100.0) as u8)
}

/// Status payload carried by both the push and the pull channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub status: JobStatus,
    #[serde(default, deserialize_with = "deserialize_progress")]
    pub progress: u8,
    #[serde(default)]
    pub message: String,
}

impl StatusEvent {
    pub fn new(status: JobStatus, progress: u8, message: &str) -> Self {
        Self {
            status,
            progress: progress.min(100),
            message: message.to_string(),
        }
    }
}

/// Full job record as returned by the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    #[serde(default, alias = "job_id", skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    pub status: JobStatus,
    #[serde(default, deserialize_with = "deserialize_progress")]
    pub progress: u8,
    #[serde(default)]
    pub message: String,
    /// Present only when the job completed.
    #[serde(default, alias = "results", skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    /// Present only when the job failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobRecord {
    /// The status-only view of this record.
    pub fn status_event(&self) -> StatusEvent {
        StatusEvent::new(self.status, self.progress, &self.message)
    }

    /// Whether a terminal record carries its payload: the result set of a
    /// completed job, the error of a failed one.
    pub fn is_complete(&self) -> bool {
        match self.status {
            JobStatus::Completed => self.result.is_some(),
            JobStatus::Failed => self.error.as_deref().is_some_and(|e| !e.is_empty()),
            _ => true,
        }
    }
}

/// Flat classification result set of a completed job.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub items: Vec<ClassifiedItem>,
    /// Display names for level-1 topic ids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<TopicLabel>,
    /// Identifier of the generated report, usable with the download endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
}

impl JobResult {
    pub fn new(items: Vec<ClassifiedItem>) -> Self {
        Self {
            items,
            topics: vec![],
            report: None,
        }
    }

    /// Builds the two-level topic hierarchy of this result set.
    pub fn hierarchy(&self) -> Hierarchy {
        aggregate_with_topics(&self.items, &self.topics)
    }

    /// Resolves a hierarchy node back to the items it was computed from.
    pub fn audit(&self, node: &NodeRef) -> Vec<AuditRecord> {
        audit::query(&self.items, node)
    }
}

/// Final outcome of a tracked job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed(Arc<JobResult>),
    Failed(String),
    NotFound(JobId),
    Cancelled,
}

impl JobOutcome {
    pub fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Completed(_) => JobStatus::Completed,
            JobOutcome::Failed(_) | JobOutcome::NotFound(_) => JobStatus::Failed,
            JobOutcome::Cancelled => JobStatus::Cancelled,
        }
    }

    /// Converts the outcome into the shape handed to completion listeners.
    pub fn into_result(self) -> Result<Arc<JobResult>, JobError> {
        match self {
            JobOutcome::Completed(result) => Ok(result),
            JobOutcome::Failed(message) => Err(JobError::Failed(message)),
            JobOutcome::NotFound(id) => Err(JobError::NotFound(id)),
            JobOutcome::Cancelled => Err(JobError::Cancelled),
        }
    }
}
