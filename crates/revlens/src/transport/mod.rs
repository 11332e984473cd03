//! Transport adapters for the analysis backend.
//!
//! The backend is reached through two seams: [`JobBackend`] covers the
//! request/response endpoints (submit, status query, cancel, download) and
//! doubles as the pull channel; [`PushChannel`] opens the server-to-client
//! status stream, served by [`WsPushChannel`] over a WebSocket. Both report
//! the same [`StatusEvent`] payload.

pub mod http;
pub mod ws;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::TransportError;
use crate::model::{JobId, JobRecord, StatusEvent, SubmitRequest};

pub use http::HttpBackend;
pub use ws::WsPushChannel;

/// Stream of status events from the push channel. The stream ending means
/// the channel closed.
pub type StatusStream = BoxStream<'static, Result<StatusEvent, TransportError>>;

#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Sends a validated submission and returns the server-assigned id.
    async fn submit(&self, request: SubmitRequest<'_>) -> Result<JobId, TransportError>;

    /// Fetches the full job record. Unknown ids yield [`TransportError::NotFound`].
    async fn fetch_job(&self, job_id: &JobId) -> Result<JobRecord, TransportError>;

    /// Asks the server to stop a job. Idempotent on the server side.
    async fn cancel(&self, job_id: &JobId) -> Result<(), TransportError>;

    /// Downloads a generated report artifact.
    async fn download(&self, report: &str) -> Result<Vec<u8>, TransportError>;
}

#[async_trait]
pub trait PushChannel: Send + Sync {
    async fn subscribe(&self, job_id: &JobId) -> Result<StatusStream, TransportError>;
}
