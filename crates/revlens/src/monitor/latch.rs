//! Single-use completion latch.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::error::JobError;
use crate::model::{JobOutcome, JobResult};

/// Completion listener. Receives the outcome at most once.
pub type CompletionCallback = Box<dyn FnOnce(Result<Arc<JobResult>, JobError>) + Send>;

#[derive(Debug, Clone)]
enum Settled {
    Pending,
    Resolved(JobOutcome),
    Abandoned,
}

#[derive(Default)]
struct Inner {
    outcome: Option<JobOutcome>,
    /// Set when resolved without notifying listeners.
    silent: bool,
    callbacks: Vec<CompletionCallback>,
}

/// Callbacks due after a [`CompletionLatch::commit`].
#[must_use]
pub(crate) struct Resolution {
    outcome: JobOutcome,
    callbacks: Vec<CompletionCallback>,
}

impl Resolution {
    pub(crate) fn notify(self) {
        for callback in self.callbacks {
            callback(self.outcome.clone().into_result());
        }
    }
}

/// Holds the final outcome of one job and notifies listeners exactly once.
///
/// The first call to [`resolve`](Self::resolve) or
/// [`resolve_silently`](Self::resolve_silently) wins; every later call is a
/// no-op. Callbacks registered after a notifying resolution run
/// immediately with the stored outcome.
pub struct CompletionLatch {
    inner: Mutex<Inner>,
    signal: watch::Sender<Settled>,
}

impl Default for CompletionLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionLatch {
    pub fn new() -> Self {
        let (signal, _) = watch::channel(Settled::Pending);
        Self {
            inner: Mutex::new(Inner::default()),
            signal,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_resolved(&self) -> bool {
        self.lock().outcome.is_some()
    }

    pub fn outcome(&self) -> Option<JobOutcome> {
        self.lock().outcome.clone()
    }

    /// Stores the outcome and runs every registered callback.
    /// Returns false if the latch was already consumed.
    pub fn resolve(&self, outcome: JobOutcome) -> bool {
        match self.commit(outcome) {
            Some(resolution) => {
                resolution.notify();
                true
            }
            None => false,
        }
    }

    /// Stores the outcome and wakes waiters, handing back the callbacks to
    /// run once the caller has left its own critical section. `None` if the
    /// latch was already consumed.
    pub(crate) fn commit(&self, outcome: JobOutcome) -> Option<Resolution> {
        let callbacks = {
            let mut inner = self.lock();
            if inner.outcome.is_some() {
                return None;
            }
            inner.outcome = Some(outcome.clone());
            std::mem::take(&mut inner.callbacks)
        };

        self.signal.send_replace(Settled::Resolved(outcome.clone()));
        Some(Resolution { outcome, callbacks })
    }

    /// Stores the outcome and drops every registered callback unrun.
    pub fn resolve_silently(&self, outcome: JobOutcome) -> bool {
        {
            let mut inner = self.lock();
            if inner.outcome.is_some() {
                return false;
            }
            inner.outcome = Some(outcome.clone());
            inner.silent = true;
            inner.callbacks.clear();
        }

        self.signal.send_replace(Settled::Resolved(outcome));
        true
    }

    /// Releases waiters of a latch that will never resolve.
    pub fn abandon(&self) {
        let mut inner = self.lock();
        inner.callbacks.clear();
        if inner.outcome.is_none() {
            inner.silent = true;
            self.signal.send_replace(Settled::Abandoned);
        }
    }

    pub fn register(&self, callback: CompletionCallback) {
        let outcome = {
            let mut inner = self.lock();
            if inner.silent {
                return;
            }
            match inner.outcome.clone() {
                Some(outcome) => outcome,
                None => {
                    inner.callbacks.push(callback);
                    return;
                }
            }
        };
        callback(outcome.into_result());
    }

    /// Waits for the outcome. `None` means the latch was abandoned.
    pub async fn wait(&self) -> Option<JobOutcome> {
        let mut rx = self.signal.subscribe();
        let settled = rx
            .wait_for(|s| !matches!(s, Settled::Pending))
            .await
            .ok()?
            .clone();
        match settled {
            Settled::Resolved(outcome) => Some(outcome),
            _ => None,
        }
    }
}
