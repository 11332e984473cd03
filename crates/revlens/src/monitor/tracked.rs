//! Per-job record held by the monitor registry.

use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;
use tokio::task::JoinHandle;

use super::latch::CompletionLatch;
use super::state::{JobSnapshot, JobState, Transition};
use crate::model::{JobId, JobOutcome, JobStatus, StatusEvent};

/// Status listener, invoked on every accepted change.
pub type UpdateCallback = Arc<dyn Fn(&StatusEvent) + Send + Sync>;

/// Background tasks serving one job.
#[derive(Default)]
struct TransportGuard {
    arbiter: Option<JoinHandle<()>>,
    push: Option<JoinHandle<()>>,
    pull: Option<JoinHandle<()>>,
}

impl TransportGuard {
    fn abort(self) {
        for handle in [self.push, self.pull, self.arbiter].into_iter().flatten() {
            handle.abort();
        }
    }
}

pub(crate) struct TrackedJob {
    id: JobId,
    state: Mutex<JobState>,
    listeners: Mutex<Vec<UpdateCallback>>,
    pub(crate) latch: CompletionLatch,
    /// `None` once released.
    transports: Mutex<Option<TransportGuard>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl TrackedJob {
    pub(crate) fn new(id: JobId) -> Self {
        Self {
            id,
            state: Mutex::new(JobState::new()),
            listeners: Mutex::new(Vec::new()),
            latch: CompletionLatch::new(),
            transports: Mutex::new(Some(TransportGuard::default())),
        }
    }

    pub(crate) fn id(&self) -> &JobId {
        &self.id
    }

    pub(crate) fn snapshot(&self) -> JobSnapshot {
        lock(&self.state).snapshot(&self.id)
    }

    pub(crate) fn status(&self) -> JobStatus {
        lock(&self.state).status()
    }

    pub(crate) fn add_listener(&self, callback: UpdateCallback) {
        if self.latch.is_resolved() && self.status() == JobStatus::Cancelled {
            return;
        }
        lock(&self.listeners).push(callback);
    }

    fn notify(&self, event: &StatusEvent) {
        let listeners: Vec<UpdateCallback> = lock(&self.listeners).clone();
        for listener in listeners {
            listener(event);
        }
    }

    /// Applies an event and notifies listeners if it was accepted.
    pub(crate) fn apply(&self, event: &StatusEvent) -> Transition {
        let (transition, current) = {
            let mut state = lock(&self.state);
            let transition = state.apply(event);
            (transition, state.event())
        };
        if transition == Transition::Progressed {
            self.notify(&current);
        }
        transition
    }

    /// Commits the confirmed outcome: settles the state and resolves the
    /// latch in one critical section, then notifies listeners. Returns
    /// false if the job already reached a terminal state, such as a local
    /// cancellation racing the confirmation.
    pub(crate) fn complete(&self, outcome: JobOutcome, message: &str) -> bool {
        let (event, resolution) = {
            let mut state = lock(&self.state);
            if !state.settle(outcome.status(), message) {
                return false;
            }
            let Some(resolution) = self.latch.commit(outcome) else {
                return false;
            };
            (state.event(), resolution)
        };
        self.notify(&event);
        resolution.notify();
        true
    }

    /// Local cancellation. Returns false if the job was already terminal.
    pub(crate) fn cancel(&self) -> bool {
        {
            let mut state = lock(&self.state);
            if !state.cancel() {
                return false;
            }
            self.latch.resolve_silently(JobOutcome::Cancelled);
        }
        lock(&self.listeners).clear();
        true
    }

    /// Installs the initial tasks. Aborts them right away if the job was
    /// released in the meantime.
    pub(crate) fn attach(&self, arbiter: JoinHandle<()>, push: JoinHandle<()>) {
        let mut transports = lock(&self.transports);
        match transports.as_mut() {
            Some(guard) => {
                guard.arbiter = Some(arbiter);
                guard.push = Some(push);
            }
            None => {
                arbiter.abort();
                push.abort();
            }
        }
    }

    pub(crate) fn attach_pull(&self, pull: JoinHandle<()>) {
        let mut transports = lock(&self.transports);
        match transports.as_mut() {
            Some(guard) => guard.pull = Some(pull),
            None => pull.abort(),
        }
    }

    /// Aborts every background task of this job. Only the first call has
    /// an effect.
    pub(crate) fn release(&self) -> bool {
        let guard = lock(&self.transports).take();
        match guard {
            Some(guard) => {
                guard.abort();
                debug!("Released transports of job {}", self.id);
                true
            }
            None => false,
        }
    }

    /// Forgets listeners and unblocks waiters of an unresolved job.
    pub(crate) fn forget(&self) {
        lock(&self.listeners).clear();
        self.latch.abandon();
        self.release();
    }
}
