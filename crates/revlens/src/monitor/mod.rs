//! Job progress monitor.
//!
//! Every submitted job is tracked through two channels: a push stream opened
//! right after submission and a fixed-interval pull channel that starts when
//! the push stream stays silent past the guard window, errors, or closes.
//! One arbiter task per job receives messages from both adapters over a
//! single queue, applies them to the job state and resolves the job's
//! completion latch exactly once.

mod arbiter;
mod channels;
pub mod latch;
pub mod state;
mod tracked;

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{info, warn};
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::config::{ChannelConfig, MonitorConfig};
use crate::error::{JobError, MonitorError, TransportError};
use crate::model::{AnalysisParams, AnalysisRequest, JobId, JobOutcome, JobResult, StatusEvent};
use crate::transport::{HttpBackend, JobBackend, PushChannel, WsPushChannel};

use arbiter::Arbiter;
use channels::run_push;
use tracked::TrackedJob;

pub use latch::{CompletionCallback, CompletionLatch};
pub use state::{JobSnapshot, JobState, Transition};
pub use tracked::UpdateCallback;

/// What an arbiter needs from the monitor.
#[derive(Clone)]
pub(crate) struct JobContext {
    pub(crate) backend: Arc<dyn JobBackend>,
    pub(crate) channels: ChannelConfig,
}

struct MonitorInner {
    backend: Arc<dyn JobBackend>,
    push: Arc<dyn PushChannel>,
    channels: ChannelConfig,
    defaults: AnalysisParams,
    jobs: RwLock<HashMap<JobId, Arc<TrackedJob>>>,
}

impl MonitorInner {
    fn jobs(&self) -> RwLockReadGuard<'_, HashMap<JobId, Arc<TrackedJob>>> {
        match self.jobs.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Job registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn jobs_mut(&self) -> RwLockWriteGuard<'_, HashMap<JobId, Arc<TrackedJob>>> {
        match self.jobs.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Job registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl Drop for MonitorInner {
    fn drop(&mut self) {
        let jobs = match self.jobs.get_mut() {
            Ok(jobs) => std::mem::take(jobs),
            Err(poisoned) => std::mem::take(poisoned.into_inner()),
        };
        for job in jobs.values() {
            job.forget();
        }
    }
}

/// Tracks analysis jobs from submission to their final outcome.
///
/// Cheap to clone; clones share the same registry. Dropping the last clone
/// releases the transports of every job still tracked.
#[derive(Clone)]
pub struct JobMonitor {
    inner: Arc<MonitorInner>,
}

impl JobMonitor {
    /// Creates a monitor over the given transports.
    pub fn new(
        config: &MonitorConfig,
        backend: Arc<dyn JobBackend>,
        push: Arc<dyn PushChannel>,
    ) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                backend,
                push,
                channels: config.channels.clone(),
                defaults: config.defaults,
                jobs: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Creates a monitor talking HTTP and WebSocket to the configured backend.
    pub fn from_config(config: &MonitorConfig) -> Result<Self, MonitorError> {
        let backend =
            HttpBackend::new(&config.server).map_err(|e| MonitorError::Client(e.to_string()))?;
        let push = WsPushChannel::new(&config.server, &config.channels)
            .map_err(|e| MonitorError::Client(e.to_string()))?;
        Ok(Self::new(config, Arc::new(backend), Arc::new(push)))
    }

    fn get(&self, job_id: &JobId) -> Result<Arc<TrackedJob>, MonitorError> {
        self.inner
            .jobs()
            .get(job_id)
            .cloned()
            .ok_or_else(|| MonitorError::UnknownJob(job_id.clone()))
    }

    /// Validates and submits a request, then starts tracking the new job.
    ///
    /// Invalid requests fail before any network call.
    pub async fn submit(&self, request: &AnalysisRequest) -> Result<JobId, MonitorError> {
        let submission = request.validate(&self.inner.defaults)?;
        let job_id = self
            .inner
            .backend
            .submit(submission)
            .await
            .map_err(MonitorError::Submit)?;

        self.track(job_id.clone());
        Ok(job_id)
    }

    fn track(&self, job_id: JobId) {
        let job = Arc::new(TrackedJob::new(job_id.clone()));
        let previous = self
            .inner
            .jobs_mut()
            .insert(job_id.clone(), Arc::clone(&job));
        if let Some(previous) = previous {
            warn!("Job {} was already tracked, replacing it", job_id);
            previous.forget();
        }
        let (tx, rx) = mpsc::channel(self.inner.channels.event_buffer.max(1));
        let span = tracing::info_span!("job", job_id = %job_id);
        let push = tokio::spawn(
            run_push(Arc::clone(&self.inner.push), job_id.clone(), tx.clone())
                .instrument(span.clone()),
        );
        let ctx = JobContext {
            backend: Arc::clone(&self.inner.backend),
            channels: self.inner.channels.clone(),
        };
        let arbiter = tokio::spawn(
            Arbiter::new(Arc::clone(&job), ctx, rx, tx)
                .run()
                .instrument(span),
        );
        job.attach(arbiter, push);

        info!("Tracking job {}", job_id);
    }

    /// Registers a listener for every accepted status change of a job.
    pub fn on_update<F>(&self, job_id: &JobId, callback: F) -> Result<(), MonitorError>
    where
        F: Fn(&StatusEvent) + Send + Sync + 'static,
    {
        self.get(job_id)?.add_listener(Arc::new(callback));
        Ok(())
    }

    /// Registers a completion listener. It runs exactly once with the final
    /// outcome, immediately if the job already finished. Listeners never run
    /// for a job cancelled locally.
    pub fn on_complete<F>(&self, job_id: &JobId, callback: F) -> Result<(), MonitorError>
    where
        F: FnOnce(Result<Arc<JobResult>, JobError>) + Send + 'static,
    {
        self.get(job_id)?.latch.register(Box::new(callback));
        Ok(())
    }

    /// Cancels a job locally and asks the backend to stop it.
    ///
    /// Local teardown happens before returning; the backend request runs in
    /// the background and its failure is only logged. No-op for jobs that
    /// already reached a terminal state.
    pub fn cancel(&self, job_id: &JobId) -> Result<(), MonitorError> {
        let job = self.get(job_id)?;
        if !job.cancel() {
            return Ok(());
        }
        job.release();
        info!("Job {} cancelled", job_id);

        let backend = Arc::clone(&self.inner.backend);
        let id = job_id.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = backend.cancel(&id).await {
                        warn!("Backend cancellation of job {} failed: {}", id, e);
                    }
                });
            }
            Err(_) => warn!(
                "No async runtime available, backend cancellation of job {} not sent",
                job_id
            ),
        }
        Ok(())
    }

    /// Releases all resources of a job and forgets it. Returns false if the
    /// job was not tracked.
    pub fn dispose(&self, job_id: &JobId) -> bool {
        let removed = self.inner.jobs_mut().remove(job_id);
        match removed {
            Some(job) => {
                job.forget();
                info!("Job {} disposed", job_id);
                true
            }
            None => false,
        }
    }

    /// Waits for the final outcome of a job.
    pub async fn wait(&self, job_id: &JobId) -> Result<JobOutcome, MonitorError> {
        let job = self.get(job_id)?;
        job.latch
            .wait()
            .await
            .ok_or_else(|| MonitorError::Disposed(job_id.clone()))
    }

    pub fn snapshot(&self, job_id: &JobId) -> Result<JobSnapshot, MonitorError> {
        Ok(self.get(job_id)?.snapshot())
    }

    /// The result set of a completed job, `None` while it is still running
    /// or when it did not complete.
    pub fn result(&self, job_id: &JobId) -> Result<Option<Arc<JobResult>>, MonitorError> {
        let job = self.get(job_id)?;
        Ok(match job.latch.outcome() {
            Some(JobOutcome::Completed(result)) => Some(result),
            _ => None,
        })
    }

    /// Snapshots of every tracked job, most recently updated first.
    pub fn jobs(&self) -> Vec<JobSnapshot> {
        let mut snapshots: Vec<JobSnapshot> =
            self.inner.jobs().values().map(|job| job.snapshot()).collect();
        snapshots.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        snapshots
    }

    /// Downloads a report produced by a completed job.
    pub async fn download(&self, report: &str) -> Result<Vec<u8>, TransportError> {
        self.inner.backend.download(report).await
    }
}
