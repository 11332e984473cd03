//! Push and pull adapter tasks feeding the per-job arbiter.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::error::TransportError;
use crate::model::{JobId, JobRecord, StatusEvent};
use crate::transport::{JobBackend, PushChannel};

/// Consecutive undecodable job records tolerated before tracking gives up.
pub(crate) const MAX_DECODE_FAILURES: u32 = 3;

/// Decides which failed record fetches end tracking.
///
/// Network and HTTP failures are retried at the polling cadence for as long
/// as the job is tracked. Not-found is fatal at once; a record that fails to
/// decode [`MAX_DECODE_FAILURES`] times in a row is fatal as well.
#[derive(Debug, Default)]
pub(crate) struct RetryPolicy {
    decode_failures: u32,
}

impl RetryPolicy {
    pub(crate) fn succeeded(&mut self) {
        self.decode_failures = 0;
    }

    pub(crate) fn is_fatal(&mut self, err: &TransportError) -> bool {
        match err {
            TransportError::Decode(_) => {
                self.decode_failures += 1;
                self.decode_failures >= MAX_DECODE_FAILURES
            }
            other => {
                self.decode_failures = 0;
                other.is_fatal()
            }
        }
    }
}

/// Message from an adapter task to the arbiter.
#[derive(Debug)]
pub(crate) enum ChannelMessage {
    /// Status event from the push stream.
    Push(StatusEvent),
    /// Push stream ended, with the error that ended it if any.
    PushClosed(Option<TransportError>),
    /// Full record from a pull-channel query.
    Pull(JobRecord),
    /// Pull channel hit an error it will not retry.
    PullFatal(TransportError),
}

/// Subscribes to the push channel and forwards its events until the stream
/// ends, errors, or reports a terminal status.
pub(crate) async fn run_push(
    push: Arc<dyn PushChannel>,
    job_id: JobId,
    tx: mpsc::Sender<ChannelMessage>,
) {
    let mut stream = match push.subscribe(&job_id).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Push channel for job {} failed to open: {}", job_id, e);
            let _ = tx.send(ChannelMessage::PushClosed(Some(e))).await;
            return;
        }
    };

    while let Some(item) = stream.next().await {
        match item {
            Ok(event) => {
                let terminal = event.status.is_terminal();
                if tx.send(ChannelMessage::Push(event)).await.is_err() || terminal {
                    return;
                }
            }
            Err(e) => {
                warn!("Push channel for job {} failed: {}", job_id, e);
                let _ = tx.send(ChannelMessage::PushClosed(Some(e))).await;
                return;
            }
        }
    }

    debug!("Push channel for job {} closed", job_id);
    let _ = tx.send(ChannelMessage::PushClosed(None)).await;
}

/// Queries the job record at a fixed interval until it turns terminal or
/// fails fatally, see [`RetryPolicy`].
pub(crate) async fn run_pull(
    backend: Arc<dyn JobBackend>,
    job_id: JobId,
    period: Duration,
    tx: mpsc::Sender<ChannelMessage>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut policy = RetryPolicy::default();

    loop {
        ticker.tick().await;
        match backend.fetch_job(&job_id).await {
            Ok(record) => {
                policy.succeeded();
                let terminal = record.status.is_terminal();
                if tx.send(ChannelMessage::Pull(record)).await.is_err() || terminal {
                    return;
                }
            }
            Err(e) if policy.is_fatal(&e) => {
                let _ = tx.send(ChannelMessage::PullFatal(e)).await;
                return;
            }
            Err(e) => {
                warn!("Status query for job {} failed, retrying: {}", job_id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_error() -> TransportError {
        TransportError::Decode("missing field `items`".to_string())
    }

    #[test]
    fn test_retry_policy() {
        let mut policy = RetryPolicy::default();
        assert!(!policy.is_fatal(&TransportError::Network("reset".to_string())));
        assert!(!policy.is_fatal(&TransportError::Http {
            status: 503,
            body: String::new(),
        }));
        assert!(policy.is_fatal(&TransportError::NotFound(JobId::new("gone"))));

        for _ in 1..MAX_DECODE_FAILURES {
            assert!(!policy.is_fatal(&decode_error()));
        }
        assert!(policy.is_fatal(&decode_error()));
    }

    #[test]
    fn test_decode_failures_must_be_consecutive() {
        let mut policy = RetryPolicy::default();
        for _ in 1..MAX_DECODE_FAILURES {
            assert!(!policy.is_fatal(&decode_error()));
        }
        policy.succeeded();
        assert!(!policy.is_fatal(&decode_error()));

        assert!(!policy.is_fatal(&TransportError::Network("reset".to_string())));
        assert!(!policy.is_fatal(&decode_error()));
    }
}
