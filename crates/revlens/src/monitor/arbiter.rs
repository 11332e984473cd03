//! Per-job arbitration between the push and the pull channel.

use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

use super::channels::{run_pull, ChannelMessage, RetryPolicy};
use super::state::Transition;
use super::tracked::TrackedJob;
use super::JobContext;
use crate::error::TransportError;
use crate::model::{JobOutcome, JobRecord, JobStatus};

/// Confirmation fetches of a terminal record still missing its result set
/// or error before the outcome is taken from what the record carries.
const MAX_INCOMPLETE_CONFIRMATIONS: u32 = 3;

const MISSING_RESULT_MESSAGE: &str = "Job completed without a result set";

/// Owns the arbitration for one job: takes messages from both adapters,
/// starts the pull channel when needed, and resolves the job once.
pub(crate) struct Arbiter {
    job: Arc<TrackedJob>,
    ctx: JobContext,
    rx: mpsc::Receiver<ChannelMessage>,
    tx: mpsc::Sender<ChannelMessage>,
    push_seen: bool,
    pull_started: bool,
}

impl Arbiter {
    pub(crate) fn new(
        job: Arc<TrackedJob>,
        ctx: JobContext,
        rx: mpsc::Receiver<ChannelMessage>,
        tx: mpsc::Sender<ChannelMessage>,
    ) -> Self {
        Self {
            job,
            ctx,
            rx,
            tx,
            push_seen: false,
            pull_started: false,
        }
    }

    pub(crate) async fn run(mut self) {
        let guard = time::sleep(self.ctx.channels.guard_window());
        tokio::pin!(guard);

        let outcome = loop {
            let guard_armed = !self.push_seen && !self.pull_started;
            tokio::select! {
                _ = &mut guard, if guard_armed => {
                    info!(
                        "No push event for job {} within {:?}, starting pull channel",
                        self.job.id(),
                        self.ctx.channels.guard_window()
                    );
                    self.start_pull();
                }
                message = self.rx.recv() => {
                    let Some(message) = message else {
                        return;
                    };
                    if let Some(outcome) = self.handle(message).await {
                        break outcome;
                    }
                }
            }
        };

        self.finish(outcome);
    }

    async fn handle(&mut self, message: ChannelMessage) -> Option<JobOutcome> {
        match message {
            ChannelMessage::Push(event) => {
                self.push_seen = true;
                if self.job.apply(&event) == Transition::Terminal {
                    debug!(
                        "Push channel reported {} for job {}, confirming",
                        event.status,
                        self.job.id()
                    );
                    return Some(self.confirm().await);
                }
                None
            }
            ChannelMessage::PushClosed(reason) => {
                if !self.pull_started && !self.job.status().is_terminal() {
                    match reason {
                        Some(e) => info!(
                            "Push channel for job {} lost ({}), falling back to pull",
                            self.job.id(),
                            e
                        ),
                        None => info!(
                            "Push channel for job {} closed early, falling back to pull",
                            self.job.id()
                        ),
                    }
                    self.start_pull();
                }
                None
            }
            ChannelMessage::Pull(record) => {
                if self.job.apply(&record.status_event()) == Transition::Terminal {
                    debug!(
                        "Pull channel reported {} for job {}, confirming",
                        record.status,
                        self.job.id()
                    );
                    return Some(self.confirm().await);
                }
                None
            }
            ChannelMessage::PullFatal(e) => Some(self.fatal(e)),
        }
    }

    fn start_pull(&mut self) {
        if self.pull_started {
            return;
        }
        self.pull_started = true;
        let handle = tokio::spawn(run_pull(
            Arc::clone(&self.ctx.backend),
            self.job.id().clone(),
            self.ctx.channels.poll_interval(),
            self.tx.clone(),
        ));
        self.job.attach_pull(handle);
    }

    /// Fetches the full record once either channel reported a terminal
    /// status. Lagging records, terminal records still missing their result
    /// set or error, and transport failures are retried at the polling
    /// cadence.
    async fn confirm(&self) -> JobOutcome {
        let mut ticker = time::interval(self.ctx.channels.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut policy = RetryPolicy::default();
        let mut incomplete = 0;

        loop {
            ticker.tick().await;
            let record = match self.ctx.backend.fetch_job(self.job.id()).await {
                Ok(record) => {
                    policy.succeeded();
                    record
                }
                Err(e) if policy.is_fatal(&e) => return self.fatal(e),
                Err(e) => {
                    warn!("Confirming job {} failed, retrying: {}", self.job.id(), e);
                    continue;
                }
            };

            if !record.status.is_terminal() {
                debug!(
                    "Record of job {} still {}, confirming again",
                    self.job.id(),
                    record.status
                );
                continue;
            }
            if record.is_complete() {
                return outcome_from_record(record);
            }
            incomplete += 1;
            if incomplete >= MAX_INCOMPLETE_CONFIRMATIONS {
                warn!(
                    "Record of job {} is {} but incomplete after {} confirmations",
                    self.job.id(),
                    record.status,
                    incomplete
                );
                return outcome_from_record(record);
            }
            debug!(
                "Record of job {} is {} without its payload, confirming again",
                self.job.id(),
                record.status
            );
        }
    }

    fn fatal(&self, err: TransportError) -> JobOutcome {
        error!("Job {} can no longer be tracked: {}", self.job.id(), err);
        match err {
            TransportError::NotFound(id) => JobOutcome::NotFound(id),
            other => JobOutcome::Failed(other.to_string()),
        }
    }

    fn finish(self, outcome: JobOutcome) {
        let message = match &outcome {
            JobOutcome::Completed(_) => "Analysis completed".to_string(),
            JobOutcome::Failed(message) => message.clone(),
            JobOutcome::NotFound(_) => "Job not found".to_string(),
            JobOutcome::Cancelled => "Job cancelled by the server".to_string(),
        };
        let status = outcome.status();
        if self.job.complete(outcome, &message) {
            info!("Job {} finished: {}", self.job.id(), status);
        }
        self.job.release();
    }
}

/// Builds the final outcome from a terminal job record. A completed
/// record without a result set is a failure: there is nothing to deliver.
pub(crate) fn outcome_from_record(record: JobRecord) -> JobOutcome {
    match record.status {
        JobStatus::Completed => match record.result {
            Some(result) => JobOutcome::Completed(Arc::new(result)),
            None => JobOutcome::Failed(MISSING_RESULT_MESSAGE.to_string()),
        },
        JobStatus::Cancelled => JobOutcome::Cancelled,
        _ => {
            let message = record
                .error
                .filter(|e| !e.is_empty())
                .or_else(|| Some(record.message).filter(|m| !m.is_empty()))
                .unwrap_or_else(|| "Job failed".to_string());
            JobOutcome::Failed(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassifiedItem, Sentiment};

    fn record(json: serde_json::Value) -> JobRecord {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_outcome_from_record() {
        let completed = record(serde_json::json!({
            "job_id": "j1",
            "status": "completed",
            "progress": 100,
            "results": { "items": [
                { "text": "Great", "sentiment": "positive", "sourceRef": "r1" }
            ]}
        }));
        match outcome_from_record(completed) {
            JobOutcome::Completed(result) => {
                assert_eq!(
                    result.items,
                    vec![ClassifiedItem::new("Great", Sentiment::Positive, "r1")]
                );
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let failed = record(serde_json::json!({
            "status": "failed",
            "progress": 30,
            "message": "Processing failed",
            "error": "Scraper blocked"
        }));
        assert_eq!(
            outcome_from_record(failed),
            JobOutcome::Failed("Scraper blocked".to_string())
        );

        let failed_without_error = record(serde_json::json!({
            "status": "failed",
            "message": "Rate limited"
        }));
        assert_eq!(
            outcome_from_record(failed_without_error),
            JobOutcome::Failed("Rate limited".to_string())
        );

        let cancelled = record(serde_json::json!({ "status": "cancelled" }));
        assert_eq!(outcome_from_record(cancelled), JobOutcome::Cancelled);
    }

    #[test]
    fn test_completed_without_result_is_not_a_success() {
        let completed = record(serde_json::json!({ "status": "completed", "progress": 100 }));
        assert_eq!(
            outcome_from_record(completed),
            JobOutcome::Failed(MISSING_RESULT_MESSAGE.to_string())
        );
    }
}
