//! Scripted fake transports.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;

use revlens::error::TransportError;
use revlens::model::{JobId, JobRecord, StatusEvent, SubmitRequest};
use revlens::transport::{JobBackend, PushChannel, StatusStream};

/// Backend that answers status queries from a script.
///
/// Each query pops the next scripted reply; once the script is exhausted
/// the last reply repeats.
pub struct FakeBackend {
    job_id: JobId,
    replies: Mutex<VecDeque<Result<JobRecord, TransportError>>>,
    last: Mutex<Option<Result<JobRecord, TransportError>>>,
    submit_error: Mutex<Option<TransportError>>,
    reports: Mutex<HashMap<String, Vec<u8>>>,
    pub submit_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new(job_id: &str) -> Self {
        Self {
            job_id: JobId::new(job_id),
            replies: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            submit_error: Mutex::new(None),
            reports: Mutex::new(HashMap::new()),
            submit_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
        }
    }

    pub fn reply(self, reply: Result<JobRecord, TransportError>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn record(self, record: JobRecord) -> Self {
        self.reply(Ok(record))
    }

    pub fn failing_submit(self, err: TransportError) -> Self {
        *self.submit_error.lock().unwrap() = Some(err);
        self
    }

    pub fn report(self, name: &str, bytes: &[u8]) -> Self {
        self.reports
            .lock()
            .unwrap()
            .insert(name.to_string(), bytes.to_vec());
        self
    }

    pub fn submits(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobBackend for FakeBackend {
    async fn submit(&self, _request: SubmitRequest<'_>) -> Result<JobId, TransportError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        match self.submit_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(self.job_id.clone()),
        }
    }

    async fn fetch_job(&self, _job_id: &JobId) -> Result<JobRecord, TransportError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(reply) => {
                *self.last.lock().unwrap() = Some(reply.clone());
                reply
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err(TransportError::Network("nothing scripted".to_string()))),
        }
    }

    async fn cancel(&self, _job_id: &JobId) -> Result<(), TransportError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn download(&self, report: &str) -> Result<Vec<u8>, TransportError> {
        self.reports
            .lock()
            .unwrap()
            .get(report)
            .cloned()
            .ok_or(TransportError::Http {
                status: 404,
                body: "Report not found".to_string(),
            })
    }
}

/// Sending half of a scripted push stream. Dropping it closes the stream.
pub struct PushScript {
    tx: mpsc::UnboundedSender<Result<StatusEvent, TransportError>>,
}

impl PushScript {
    pub fn send(&self, event: StatusEvent) {
        let _ = self.tx.send(Ok(event));
    }
}

/// Push channel whose single stream is driven by a [`PushScript`].
pub struct ScriptedPush {
    rx: Mutex<Option<mpsc::UnboundedReceiver<Result<StatusEvent, TransportError>>>>,
    open_error: Option<TransportError>,
}

impl ScriptedPush {
    pub fn new() -> (Self, PushScript) {
        let (tx, rx) = mpsc::unbounded_channel();
        let push = Self {
            rx: Mutex::new(Some(rx)),
            open_error: None,
        };
        (push, PushScript { tx })
    }

    /// A push channel that cannot be opened at all.
    pub fn unavailable() -> Self {
        Self {
            rx: Mutex::new(None),
            open_error: Some(TransportError::Network("connection refused".to_string())),
        }
    }
}

#[async_trait]
impl PushChannel for ScriptedPush {
    async fn subscribe(&self, _job_id: &JobId) -> Result<StatusStream, TransportError> {
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        let mut rx = self.rx.lock().unwrap().take().ok_or(TransportError::Closed)?;

        let stream = async_stream::stream! {
            while let Some(item) = rx.recv().await {
                yield item;
            }
        };
        Ok(stream.boxed())
    }
}
